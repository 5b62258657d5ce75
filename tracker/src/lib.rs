//! Ingest decoded uplink records into a device registry.
//!
//! The transport client appends every raw message it receives to a spool of
//! `.log` files, one message per line. This crate walks a spool, decodes
//! each message, and keeps the results organized by device: records keyed by
//! sequence number, the last time each device was heard from, and the
//! sequence gaps that point at lost uplinks. Messages that don't even match
//! the envelope are kept too, as rejects, so nothing is silently dropped.
//!
//! # Examples
//!
//! ```
//! use tracker::{Registry, Spool};
//! use uplink::{Decoder, Passthrough, Schema};
//!
//! let spool = Spool::open("fixtures/spool").unwrap();
//! let decoder = Decoder::new(Schema::latest(), Box::new(Passthrough));
//! let registry = Registry::from_spool(&spool, &decoder).unwrap();
//! let device = registry.device("HEWGHP").unwrap();
//! assert_eq!(3, device.len());
//! ```

#![deny(missing_docs, missing_debug_implementations, unsafe_code)]

extern crate chrono;
#[macro_use]
extern crate failure;
extern crate serde;
#[macro_use]
extern crate serde_derive;
extern crate uplink;
extern crate walkdir;

pub mod registry;
pub mod storage;

pub use registry::{Device, Registry, Reject};
pub use storage::Spool;
