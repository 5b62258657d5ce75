//! Coded enumerations and bit-packed status bytes.
//!
//! Both decoders here are total: an out-of-range code becomes diagnostic
//! text in the output, never an error, so a stored record always shows what
//! the device actually sent.

use schema::BitSpec;

/// Resolves an integer code against a label table.
///
/// Out-of-range codes (negative, or at least the table length) produce a
/// diagnostic label.
///
/// # Examples
///
/// ```
/// use uplink::bitfield;
/// use uplink::schema::TRUMI_STATE;
/// assert_eq!("TRUMI_STATE_SLEEP", bitfield::resolve(1, TRUMI_STATE));
/// assert_eq!("Unknown enum value: 9", bitfield::resolve(9, TRUMI_STATE));
/// assert_eq!("Unknown enum value: -2", bitfield::resolve(-2, TRUMI_STATE));
/// ```
pub fn resolve(code: i64, table: &[&str]) -> String {
    if code >= 0 && (code as usize) < table.len() {
        table[code as usize].to_string()
    } else {
        format!("Unknown enum value: {}", code)
    }
}

/// Decodes one byte into its bit-packed sub-fields.
///
/// Bits are consumed least-significant first; each sub-field claims the next
/// `width` bits and resolves them against its own table. The result is one
/// line per sub-field, in schema order. A sub-field value with no label
/// yields an error line instead of failing the message.
///
/// # Examples
///
/// ```
/// use uplink::bitfield;
/// use uplink::schema::Schema;
/// use uplink::schema::FieldKind;
///
/// let flags = match Schema::latest().field("flags").unwrap().kind {
///     FieldKind::Bitfield(subfields) => subfields,
///     _ => unreachable!(),
/// };
/// assert_eq!(
///     "sample_rate: RATE_50_HZ\naccel_mode: ACCEL_LOW_POWER",
///     bitfield::decode(0x0c, flags)
/// );
/// ```
pub fn decode(byte: u8, subfields: &[BitSpec]) -> String {
    let total: u32 = subfields.iter().map(|sub| u32::from(sub.width)).sum();
    if total == 0 || total > 8 {
        return format!("Error: cannot decompose bit value {}", byte);
    }
    let mut lines = Vec::with_capacity(subfields.len());
    let mut shift = 0;
    for sub in subfields {
        let mask = (1u16 << sub.width) - 1;
        let value = (u16::from(byte) >> shift) & mask;
        if (value as usize) < sub.table.len() {
            lines.push(format!("{}: {}", sub.name, sub.table[value as usize]));
        } else {
            lines.push(format!("{}: Error with bit value {}", sub.name, value));
        }
        shift += sub.width;
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use schema::{ACCEL_MODE, SAMPLE_RATE};

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

    #[test]
    fn resolve_in_range() {
        assert_eq!("RATE_OFF", resolve(0, SAMPLE_RATE));
        assert_eq!("RATE_100_HZ", resolve(5, SAMPLE_RATE));
    }

    #[test]
    fn resolve_out_of_range() {
        assert_eq!("Unknown enum value: 6", resolve(6, SAMPLE_RATE));
        assert_eq!("Unknown enum value: -1", resolve(-1, SAMPLE_RATE));
    }

    #[test]
    fn lsb_first() {
        // 0b01_100 -> sample_rate = 4, accel_mode = 1.
        assert_eq!(
            "sample_rate: RATE_50_HZ\naccel_mode: ACCEL_LOW_POWER",
            decode(0x0c, FLAGS)
        );
        // 0b00_000 -> both zero.
        assert_eq!(
            "sample_rate: RATE_OFF\naccel_mode: ACCEL_OFF",
            decode(0x00, FLAGS)
        );
    }

    #[test]
    fn unused_high_bits_ignored() {
        assert_eq!(decode(0x0c, FLAGS), decode(0x0c | 0xe0, FLAGS));
    }

    #[test]
    fn bad_bit_value() {
        // sample_rate = 7 has no label.
        assert_eq!(
            "sample_rate: Error with bit value 7\naccel_mode: ACCEL_OFF",
            decode(0x07, FLAGS)
        );
    }

    #[test]
    fn empty_layout() {
        assert_eq!("Error: cannot decompose bit value 42", decode(42, &[]));
    }

    #[test]
    fn oversized_layout() {
        const BAD: &[BitSpec] = &[BitSpec {
            name: "wide",
            width: 9,
            table: SAMPLE_RATE,
        }];
        assert_eq!("Error: cannot decompose bit value 1", decode(1, BAD));
    }
}
