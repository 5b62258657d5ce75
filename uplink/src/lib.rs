//! Decode telemetry uplink messages from field-deployed asset-tracking loggers.
//!
//! Loggers publish each uplink as a line of text: a receipt timestamp, a
//! literal `Msg:` marker, and a hex-encoded protocol body. The body layout is
//! schema-versioned; a decoder walks the registered field schema over the
//! body, byte by byte, and produces an insertion-ordered record of rendered
//! field values.
//!
//! Decoding is a two-step process. First the outer envelope is matched:
//!
//! ```
//! use uplink::Envelope;
//! let envelope = Envelope::new(include_str!("../fixtures/v1-sleep.msg")).unwrap();
//! assert!(envelope.body().starts_with("484557474850"));
//! ```
//!
//! Then a `Decoder`, constructed against exactly one schema version and one
//! decompressor binding, turns the message into a `DecodedMessage`:
//!
//! ```
//! use uplink::{Decoder, Passthrough, Schema};
//! let decoder = Decoder::new(Schema::get(1).unwrap(), Box::new(Passthrough));
//! let record = decoder.decode(include_str!("../fixtures/v1-sleep.msg")).unwrap();
//! assert_eq!(Some("HEWGHP"), record.text("device_id"));
//! ```
//!
//! Per-field anomalies (unknown enum codes, bad bit values, truncated
//! payloads) are absorbed into the rendered text so stored records show the
//! problem; only an envelope mismatch is a hard error.

#![deny(missing_docs, missing_debug_implementations, unsafe_code)]

extern crate byteorder;
extern crate chrono;
#[macro_use]
extern crate failure;
extern crate hex;
#[macro_use]
extern crate lazy_static;
extern crate regex;
extern crate serde;
#[macro_use]
extern crate serde_derive;
#[cfg(test)]
extern crate serde_json;

pub mod bitfield;
pub mod decoder;
pub mod decompress;
pub mod envelope;
pub mod payload;
pub mod record;
pub mod schema;
pub mod timestamp;

pub use decoder::Decoder;
pub use decompress::{Passthrough, SampleDecompressor};
pub use envelope::Envelope;
pub use record::{DecodedMessage, Value};
pub use schema::Schema;
