//! Versioned field schemas for the uplink protocol body.
//!
//! The body layout changed release over release, and raw messages stored
//! under an old layout must stay decodable, so every historical layout is
//! kept registered here as a first-class value. A new protocol revision is
//! added by registering a new `Schema`, not by branching decoder code.
//!
//! # Examples
//!
//! ```
//! use uplink::Schema;
//! let schema = Schema::latest();
//! assert_eq!(2, schema.version());
//! assert_eq!(60, schema.fixed_size());
//! ```

/// Message type codes.
pub const MSG_TYPE: &[&str] = &[
    "SIGFOX_UPLINK",
    "FILE_ACTION",
    "DIAG_DEPRECATED",
    "BOOT_INFO",
    "IBEACON_SCAN",
    "MESSAGE_LIST",
    "CORE_MSG_UPLINK",
];

/// Motion-state codes reported by the tracking firmware.
pub const TRUMI_STATE: &[&str] = &[
    "TRUMI_STATE_UNKNOWN",
    "TRUMI_STATE_SLEEP",
    "TRUMI_STATE_MOTION_DETECTION",
    "TRUMI_STATE_RELOCATION",
];

/// Link quality codes.
pub const LINK_QUALITY: &[&str] = &["LINK_UNKNOWN", "LINK_GOOD", "LINK_DEGRADED", "LINK_LOST"];

/// Accelerometer sample rate codes, packed into the flags byte.
pub const SAMPLE_RATE: &[&str] = &[
    "RATE_OFF",
    "RATE_1_HZ",
    "RATE_10_HZ",
    "RATE_25_HZ",
    "RATE_50_HZ",
    "RATE_100_HZ",
];

/// Accelerometer mode codes, packed into the flags byte.
pub const ACCEL_MODE: &[&str] = &[
    "ACCEL_OFF",
    "ACCEL_LOW_POWER",
    "ACCEL_NORMAL",
    "ACCEL_HIGH_RES",
];

/// The label that short-circuits the field walk (boot text payload).
pub const BOOT_INFO: &str = "BOOT_INFO";

/// The motion-state label that routes the payload through decompression.
pub const MOTION_DETECTION: &str = "TRUMI_STATE_MOTION_DETECTION";

/// The link-quality label that switches the payload to link-lost framing.
pub const LINK_LOST: &str = "LINK_LOST";

/// How the bytes of one field are decoded.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FieldKind {
    /// An unsigned integer, read as base-16 from the hex slice.
    Integer,

    /// The raw hex slice, kept verbatim.
    Hex,

    /// Unhexed bytes decoded as text.
    Ascii,

    /// An integer code resolved against a fixed label table.
    Enum(&'static [&'static str]),

    /// One byte split into bit-packed sub-fields, least-significant first.
    Bitfield(&'static [BitSpec]),

    /// A seconds-since-2000 timestamp.
    Timestamp,

    /// The terminal field: consumes the remainder of the body.
    Payload,
}

/// One bit-packed sub-field of a `FieldKind::Bitfield` byte.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BitSpec {
    /// The sub-field name.
    pub name: &'static str,

    /// The width of the sub-field in bits.
    pub width: u8,

    /// The label table the sub-field value is resolved against.
    pub table: &'static [&'static str],
}

/// Special decode semantics attached to a field, beyond its kind.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Role {
    /// Resolving to `BOOT_INFO` ends the walk with an ASCII text payload.
    MsgType,

    /// Half-degrees-minus-forty encoding with a 255 "not available" sentinel.
    Temperature,

    /// Selects compressed payload framing when motion detection is active.
    MotionState,

    /// Selects link-lost payload framing and masks the motion state.
    LinkQuality,
}

/// One entry of a schema: a named, fixed-size slice of the body.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FieldSpec {
    /// The field name, unique within its schema.
    pub name: &'static str,

    /// The size of the field in bytes (two hex characters per byte).
    ///
    /// Zero only for the terminal `Payload` field, which consumes the
    /// remainder of the body.
    pub size: usize,

    /// How the field's bytes are decoded.
    pub kind: FieldKind,

    /// Special semantics, if any.
    pub role: Option<Role>,
}

/// A complete, immutable field layout for one protocol version.
#[derive(Clone, Debug, PartialEq)]
pub struct Schema {
    version: u8,
    fields: Vec<FieldSpec>,
}

/// An error returned when looking up a schema.
#[derive(Debug, Fail, PartialEq)]
pub enum Error {
    /// No schema is registered under the requested version.
    #[fail(display = "no registered schema for version: {}", _0)]
    UnknownVersion(u8),
}

lazy_static! {
    static ref REGISTRY: Vec<Schema> = vec![v1(), v2()];
}

impl Schema {
    /// Returns the registered schema for the given protocol version.
    ///
    /// # Examples
    ///
    /// ```
    /// use uplink::Schema;
    /// assert_eq!(1, Schema::get(1).unwrap().version());
    /// assert!(Schema::get(42).is_err());
    /// ```
    pub fn get(version: u8) -> Result<&'static Schema, Error> {
        REGISTRY
            .iter()
            .find(|schema| schema.version == version)
            .ok_or(Error::UnknownVersion(version))
    }

    /// Returns the most recent registered schema.
    ///
    /// # Examples
    ///
    /// ```
    /// use uplink::Schema;
    /// assert_eq!(2, Schema::latest().version());
    /// ```
    pub fn latest() -> &'static Schema {
        REGISTRY.last().unwrap()
    }

    /// Returns all registered protocol versions, oldest first.
    ///
    /// # Examples
    ///
    /// ```
    /// use uplink::Schema;
    /// assert_eq!(vec![1, 2], Schema::versions());
    /// ```
    pub fn versions() -> Vec<u8> {
        REGISTRY.iter().map(|schema| schema.version).collect()
    }

    /// Picks a schema by body length: the newest whose fixed header fits.
    ///
    /// This is a heuristic for callers with no out-of-band version signal;
    /// an old-layout message with a long payload is indistinguishable from a
    /// new-layout message by length alone, so prefer an explicit version
    /// where one is available.
    ///
    /// # Examples
    ///
    /// ```
    /// use uplink::Schema;
    /// assert_eq!(2, Schema::for_body_len(70).unwrap().version());
    /// assert_eq!(1, Schema::for_body_len(39).unwrap().version());
    /// assert!(Schema::for_body_len(10).is_none());
    /// ```
    pub fn for_body_len(bytes: usize) -> Option<&'static Schema> {
        REGISTRY
            .iter()
            .rev()
            .find(|schema| schema.fixed_size() <= bytes)
    }

    /// Returns this schema's protocol version.
    pub fn version(&self) -> u8 {
        self.version
    }

    /// Returns this schema's fields, in wire order.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Returns the field with the given name, if the schema has one.
    ///
    /// # Examples
    ///
    /// ```
    /// use uplink::Schema;
    /// let schema = Schema::latest();
    /// assert_eq!(6, schema.field("device_id").unwrap().size);
    /// assert_eq!(None, schema.field("not_a_field"));
    /// ```
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Returns the total size in bytes of all fixed-size fields.
    ///
    /// The terminal payload field is excluded; a body shorter than this
    /// cannot carry a complete header.
    pub fn fixed_size(&self) -> usize {
        self.fields.iter().map(|field| field.size).sum()
    }
}

fn field(name: &'static str, size: usize, kind: FieldKind) -> FieldSpec {
    FieldSpec {
        name: name,
        size: size,
        kind: kind,
        role: None,
    }
}

fn special(name: &'static str, size: usize, kind: FieldKind, role: Role) -> FieldSpec {
    FieldSpec {
        name: name,
        size: size,
        kind: kind,
        role: Some(role),
    }
}

/// The original field layout, in service until the flags byte was packed.
fn v1() -> Schema {
    Schema {
        version: 1,
        fields: vec![
            field("device_id", 6, FieldKind::Ascii),
            special("msg_type", 1, FieldKind::Enum(MSG_TYPE), Role::MsgType),
            field("flags", 1, FieldKind::Integer),
            field("seq_num", 4, FieldKind::Integer),
            field("msg_gen_ts", 4, FieldKind::Timestamp),
            field("cell_id", 4, FieldKind::Hex),
            field("cell_id_ts", 4, FieldKind::Timestamp),
            special("actual_temp", 1, FieldKind::Integer, Role::Temperature),
            special("trumi_st", 1, FieldKind::Enum(TRUMI_STATE), Role::MotionState),
            field("trumi_st_upd_count", 2, FieldKind::Integer),
            field("trumi_st_upd_ts", 4, FieldKind::Timestamp),
            field("payload", 0, FieldKind::Payload),
        ],
    }
}

/// The current layout: packed flags, extra counters, Wi-Fi scan results,
/// payload bookkeeping, and link quality.
fn v2() -> Schema {
    const FLAGS: &[BitSpec] = &[
        BitSpec {
            name: "sample_rate",
            width: 3,
            table: SAMPLE_RATE,
        },
        BitSpec {
            name: "accel_mode",
            width: 2,
            table: ACCEL_MODE,
        },
    ];
    Schema {
        version: 2,
        fields: vec![
            field("device_id", 6, FieldKind::Ascii),
            special("msg_type", 1, FieldKind::Enum(MSG_TYPE), Role::MsgType),
            field("flags", 1, FieldKind::Bitfield(FLAGS)),
            field("seq_num", 4, FieldKind::Integer),
            field("msg_gen_ts", 4, FieldKind::Timestamp),
            field("cell_id", 4, FieldKind::Hex),
            field("cell_id_ts", 4, FieldKind::Timestamp),
            special("actual_temp", 1, FieldKind::Integer, Role::Temperature),
            special("trumi_st", 1, FieldKind::Enum(TRUMI_STATE), Role::MotionState),
            field("trumi_st_upd_count", 2, FieldKind::Integer),
            field("motion_event_count", 2, FieldKind::Integer),
            field("uplink_count", 2, FieldKind::Integer),
            field("boot_count", 2, FieldKind::Integer),
            field("wifi_aps", 18, FieldKind::Hex),
            field("reserved", 2, FieldKind::Hex),
            field("payload_size", 2, FieldKind::Integer),
            field("payload_crc", 2, FieldKind::Hex),
            special("link_quality", 1, FieldKind::Enum(LINK_QUALITY), Role::LinkQuality),
            field("header_crc", 1, FieldKind::Hex),
            field("payload", 0, FieldKind::Payload),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_sizes() {
        assert_eq!(32, Schema::get(1).unwrap().fixed_size());
        assert_eq!(60, Schema::get(2).unwrap().fixed_size());
    }

    #[test]
    fn payload_is_terminal() {
        for version in Schema::versions() {
            let schema = Schema::get(version).unwrap();
            let last = schema.fields().last().unwrap();
            assert_eq!("payload", last.name);
            assert_eq!(FieldKind::Payload, last.kind);
            assert_eq!(
                1,
                schema
                    .fields()
                    .iter()
                    .filter(|field| field.kind == FieldKind::Payload)
                    .count()
            );
        }
    }

    #[test]
    fn field_names_unique() {
        for version in Schema::versions() {
            let schema = Schema::get(version).unwrap();
            for field in schema.fields() {
                assert_eq!(
                    1,
                    schema
                        .fields()
                        .iter()
                        .filter(|other| other.name == field.name)
                        .count(),
                    "duplicate field name in v{}: {}",
                    version,
                    field.name
                );
            }
        }
    }

    #[test]
    fn bitfields_fit_one_byte() {
        for version in Schema::versions() {
            for field in Schema::get(version).unwrap().fields() {
                if let FieldKind::Bitfield(subfields) = field.kind {
                    let total: u8 = subfields.iter().map(|sub| sub.width).sum();
                    assert!(total <= 8);
                    assert!(!subfields.is_empty());
                }
            }
        }
    }

    #[test]
    fn unknown_version() {
        assert_eq!(Error::UnknownVersion(0), Schema::get(0).unwrap_err());
    }

    #[test]
    fn for_body_len() {
        assert_eq!(None, Schema::for_body_len(0));
        assert_eq!(None, Schema::for_body_len(31));
        assert_eq!(1, Schema::for_body_len(32).unwrap().version());
        assert_eq!(1, Schema::for_body_len(59).unwrap().version());
        assert_eq!(2, Schema::for_body_len(60).unwrap().version());
    }
}
