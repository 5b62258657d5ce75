//! The schema-driven header decoder.
//!
//! A decoder is constructed against exactly one schema version and one
//! decompressor binding, then walks the schema's fields left to right over
//! the hex body, two characters per byte. The mode selector for the terminal
//! payload field accumulates along the way: a motion-detection state routes
//! the payload through decompression, and a lost link switches to link-lost
//! framing and masks the motion state.
//!
//! Decoding is a pure function of the message: the schema is shared
//! read-only data, the decompressor binding is never mutated, and all
//! per-message state lives on the decode call's stack, so independent
//! callers can decode concurrently without coordination.
//!
//! # Examples
//!
//! ```
//! use uplink::{Decoder, Passthrough, Schema};
//! let decoder = Decoder::new(Schema::latest(), Box::new(Passthrough));
//! let record = decoder.decode(include_str!("../fixtures/v2-plain.msg")).unwrap();
//! assert_eq!(Some("HEWGHP"), record.device_id());
//! assert_eq!(Some(256), record.seq_num());
//! ```

use bitfield;
use decompress::SampleDecompressor;
use envelope::Envelope;
use hex;
use payload::{self, Mode};
use record::{DecodedMessage, Value};
use schema::{self, FieldKind, Role, Schema};
use timestamp;

/// The temperature sentinel for "not available".
const TEMPERATURE_UNAVAILABLE: u64 = 255;

/// Decodes uplink messages against one schema version.
#[derive(Debug)]
pub struct Decoder {
    schema: &'static Schema,
    decompressor: Box<dyn SampleDecompressor>,
}

impl Decoder {
    /// Creates a decoder for the given schema and decompressor binding.
    ///
    /// The binding is fixed for the decoder's lifetime; deployments that
    /// need a different codec construct a different decoder.
    ///
    /// # Examples
    ///
    /// ```
    /// use uplink::{Decoder, Passthrough, Schema};
    /// let decoder = Decoder::new(Schema::latest(), Box::new(Passthrough));
    /// ```
    pub fn new(schema: &'static Schema, decompressor: Box<dyn SampleDecompressor>) -> Decoder {
        Decoder {
            schema: schema,
            decompressor: decompressor,
        }
    }

    /// Creates a decoder for a registered protocol version.
    ///
    /// # Examples
    ///
    /// ```
    /// use uplink::{Decoder, Passthrough};
    /// assert!(Decoder::for_version(1, Box::new(Passthrough)).is_ok());
    /// assert!(Decoder::for_version(42, Box::new(Passthrough)).is_err());
    /// ```
    pub fn for_version(
        version: u8,
        decompressor: Box<dyn SampleDecompressor>,
    ) -> Result<Decoder, schema::Error> {
        Ok(Decoder::new(Schema::get(version)?, decompressor))
    }

    /// Returns the schema this decoder was constructed against.
    pub fn schema(&self) -> &Schema {
        self.schema
    }

    /// Decodes one raw message into a record.
    ///
    /// The only hard error is an envelope mismatch; every anomaly inside the
    /// body is rendered into the record so a reviewer can see what the
    /// device sent. Every schema field is present in the output; fields
    /// the walk never reached (boot-info messages, truncated bodies) are
    /// empty text.
    ///
    /// # Examples
    ///
    /// ```
    /// use uplink::{Decoder, Passthrough, Schema};
    /// let decoder = Decoder::new(Schema::get(1).unwrap(), Box::new(Passthrough));
    /// let record = decoder.decode(include_str!("../fixtures/v1-sleep.msg")).unwrap();
    /// assert_eq!(Some("n/a"), record.text("actual_temp"));
    /// assert!(decoder.decode("not an uplink").is_err());
    /// ```
    pub fn decode(&self, message: &str) -> Result<DecodedMessage, ::failure::Error> {
        let envelope = Envelope::new(message)?;
        let bytes = envelope.body().as_bytes();
        let mut record = DecodedMessage::new();
        record.push("data_msg", Value::Text(envelope.body().to_string()));
        record.push("lgr_msg_ts", Value::Text(envelope.timestamp().to_string()));

        let mut mode = Mode::Plain;
        let mut offset = 0;
        for field in self.schema.fields() {
            if field.kind == FieldKind::Payload {
                let remainder = String::from_utf8_lossy(&bytes[offset..]);
                let framed = payload::frame(&remainder, mode, &*self.decompressor);
                record.push(field.name, Value::Text(framed.text));
                record.push("payload_hex", Value::Text(framed.hex));
                break;
            }

            let end = offset + field.size * 2;
            if end > bytes.len() {
                break;
            }
            let slice = String::from_utf8_lossy(&bytes[offset..end]);
            let value = decode_field(field.kind, field.role, &slice);

            match field.role {
                Some(Role::MotionState) => {
                    if value.as_text() == Some(schema::MOTION_DETECTION) {
                        mode = Mode::Compressed;
                    }
                }
                Some(Role::LinkQuality) => {
                    if value.as_text() == Some(schema::LINK_LOST) {
                        mode = Mode::LinkLost;
                        self.mask_motion_state(&mut record);
                    }
                }
                _ => {}
            }

            let boot = field.role == Some(Role::MsgType)
                && value.as_text() == Some(schema::BOOT_INFO);
            record.push(field.name, value);
            offset = end;

            if boot {
                let remainder = String::from_utf8_lossy(&bytes[offset..]).into_owned();
                record.push("payload", Value::Text(boot_text(&remainder)));
                record.push("payload_hex", Value::Text(remainder));
                break;
            }
        }

        for field in self.schema.fields() {
            if !record.contains(field.name) {
                record.push(field.name, Value::Text(String::new()));
            }
        }
        if !record.contains("payload_hex") {
            record.push("payload_hex", Value::Text(String::new()));
        }
        Ok(record)
    }

    /// Overrides the already-decoded motion state once the link is lost:
    /// each payload record then carries its own state code instead.
    fn mask_motion_state(&self, record: &mut DecodedMessage) {
        if let Some(motion) = self
            .schema
            .fields()
            .iter()
            .find(|field| field.role == Some(Role::MotionState))
        {
            if record.contains(motion.name) {
                record.set(motion.name, Value::Text("VARIOUS".to_string()));
            }
        }
    }
}

fn decode_field(kind: FieldKind, role: Option<Role>, slice: &str) -> Value {
    let parsed = u64::from_str_radix(slice, 16);
    match kind {
        FieldKind::Integer => match parsed {
            Ok(n) => {
                if role == Some(Role::Temperature) {
                    Value::Text(temperature(n))
                } else {
                    Value::Integer(n)
                }
            }
            Err(_) => invalid_hex(slice),
        },
        FieldKind::Hex => Value::Text(slice.to_string()),
        FieldKind::Ascii => match hex::decode(slice) {
            Ok(bytes) => Value::Text(String::from_utf8_lossy(&bytes).into_owned()),
            Err(_) => invalid_hex(slice),
        },
        FieldKind::Enum(table) => match parsed {
            Ok(n) => Value::Text(bitfield::resolve(n as i64, table)),
            Err(_) => invalid_hex(slice),
        },
        FieldKind::Bitfield(subfields) => match parsed {
            Ok(n) => Value::Text(bitfield::decode(n as u8, subfields)),
            Err(_) => invalid_hex(slice),
        },
        FieldKind::Timestamp => match parsed {
            Ok(n) => Value::Text(timestamp::render(n as u32)),
            Err(_) => invalid_hex(slice),
        },
        // Handled by the walk before dispatch.
        FieldKind::Payload => Value::Text(String::new()),
    }
}

fn invalid_hex(slice: &str) -> Value {
    Value::Text(format!("Invalid hex: {}", slice))
}

/// Renders the temperature byte: half degrees with a -40 offset, 255 when
/// the sensor reading is not available.
fn temperature(raw: u64) -> String {
    if raw == TEMPERATURE_UNAVAILABLE {
        "n/a".to_string()
    } else {
        format!("{:.1}", raw as f64 / 2.0 - 40.0)
    }
}

/// Filters unhexed boot bytes down to ASCII, the way the firmware's boot
/// banner is meant to be read.
fn boot_text(remainder: &str) -> String {
    match hex::decode(remainder) {
        Ok(bytes) => bytes
            .iter()
            .filter(|&&byte| byte < 128)
            .map(|&byte| byte as char)
            .collect(),
        Err(_) => format!("Invalid hex: {}", remainder),
    }
}
