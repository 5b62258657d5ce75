//! Framing of the payload bytes into motion samples.
//!
//! The payload is the variable-length tail of the body. Depending on the
//! device state reported earlier in the header it is framed one of three
//! ways, each a fixed stride per record:
//!
//! - *Plain*: `[timestamp u32][x i16][y i16][z i16]`, 10 bytes.
//! - *Compressed*: Rice-coded FIFO chunks, reassembled through the
//!   decompression boundary into `[timestamp u32][32 x 6-byte samples]`
//!   records, 196 bytes.
//! - *Link-lost*: `[timestamp u32][state i16][x i16][y i16][z i16]`,
//!   12 bytes, used while connectivity is degraded.
//!
//! All multi-byte payload values are little-endian; axis values are signed.
//! A trailing partial record is dropped silently.

use byteorder::{ByteOrder, LittleEndian};
use decompress::{SampleDecompressor, BLOCK_SIZE};
use hex;
use schema::TRUMI_STATE;
use timestamp;

/// How the payload bytes are framed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Mode {
    /// Uncompressed, one sample per record.
    Plain,

    /// Rice-coded FIFO chunks, 32 samples per decoded record.
    Compressed,

    /// Uncompressed with a per-record motion-state code.
    LinkLost,
}

/// One decoded motion-sensor observation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SampleRecord {
    /// Seconds since the device epoch at which the record was captured.
    pub timestamp: u32,

    /// The per-record motion-state code (link-lost framing only).
    pub state: Option<i16>,

    /// The X axis value.
    pub x: i16,

    /// The Y axis value.
    pub y: i16,

    /// The Z axis value.
    pub z: i16,
}

/// The framed payload, ready to merge into the decoded record.
#[derive(Clone, Debug, PartialEq)]
pub struct FramedPayload {
    /// The human-readable sample listing, prefixed with a sample count.
    pub text: String,

    /// The hex of the framed buffer, decompressed first where applicable.
    pub hex: String,

    /// The number of complete samples decoded.
    pub samples: usize,

    /// A data-integrity note, if framing stopped early.
    pub note: Option<String>,
}

impl Mode {
    /// Returns the record stride in bytes for this framing mode.
    ///
    /// # Examples
    ///
    /// ```
    /// use uplink::payload::Mode;
    /// assert_eq!(10, Mode::Plain.stride());
    /// assert_eq!(196, Mode::Compressed.stride());
    /// assert_eq!(12, Mode::LinkLost.stride());
    /// ```
    pub fn stride(&self) -> usize {
        match *self {
            Mode::Plain => 10,
            Mode::Compressed => 4 + BLOCK_SIZE,
            Mode::LinkLost => 12,
        }
    }
}

/// Frames a hex payload into motion samples.
///
/// Never fails: a payload that is not valid hex yields zero samples and an
/// explanatory note, and a reassembly problem in compressed mode keeps the
/// records decoded before the problem occurred.
///
/// # Examples
///
/// ```
/// use uplink::payload::{self, Mode};
/// use uplink::Passthrough;
/// let framed = payload::frame("01000000d0ff280022fc", Mode::Plain, &Passthrough);
/// assert_eq!(1, framed.samples);
/// assert_eq!(
///     "1 samples\n#0 Sat, January 01, 2000 12:00:01 AM: X: -48 Y: 40 Z: -990",
///     framed.text
/// );
/// ```
pub fn frame(body: &str, mode: Mode, decompressor: &dyn SampleDecompressor) -> FramedPayload {
    let bytes = match hex::decode(body) {
        Ok(bytes) => bytes,
        Err(_) => {
            let note = "invalid hex payload".to_string();
            return FramedPayload {
                text: format!("0 samples ({})", note),
                hex: body.to_string(),
                samples: 0,
                note: Some(note),
            };
        }
    };
    let (buffer, note) = match mode {
        Mode::Compressed => reassemble(&bytes, decompressor),
        _ => (bytes, None),
    };

    let mut lines = Vec::new();
    let mut samples = 0;
    for record in buffer.chunks(mode.stride()) {
        if record.len() < mode.stride() {
            break;
        }
        match mode {
            Mode::Plain => {
                let sample = read_plain(record);
                lines.push(format!(
                    "#{} {}: X: {} Y: {} Z: {}",
                    samples,
                    timestamp::render(sample.timestamp),
                    sample.x,
                    sample.y,
                    sample.z
                ));
                samples += 1;
            }
            Mode::LinkLost => {
                let sample = read_link_lost(record);
                lines.push(format!(
                    "#{} {} [{}]: X: {} Y: {} Z: {}",
                    samples,
                    timestamp::render(sample.timestamp),
                    state_label(sample.state.unwrap_or(-1)),
                    sample.x,
                    sample.y,
                    sample.z
                ));
                samples += 1;
            }
            Mode::Compressed => {
                lines.push(format!(
                    "{}:",
                    timestamp::render(LittleEndian::read_u32(&record[0..4]))
                ));
                for axes in record[4..].chunks(6) {
                    lines.push(format!(
                        "#{} X: {} Y: {} Z: {}",
                        samples,
                        LittleEndian::read_i16(&axes[0..2]),
                        LittleEndian::read_i16(&axes[2..4]),
                        LittleEndian::read_i16(&axes[4..6])
                    ));
                    samples += 1;
                }
            }
        }
    }

    let mut text = format!("{} samples", samples);
    if let Some(ref note) = note {
        text.push_str(&format!(" ({})", note));
    }
    for line in &lines {
        text.push('\n');
        text.push_str(line);
    }
    FramedPayload {
        text: text,
        hex: hex::encode(&buffer),
        samples: samples,
        note: note,
    }
}

/// Reassembles compressed FIFO chunks into `[timestamp][block]` records.
///
/// Each chunk on the wire is `[length u8][timestamp u32][length bytes]`.
/// A declared length that would read past the end of the buffer is a
/// data-integrity problem on the device side: the walk stops there, without
/// calling the decompressor, and the chunks decoded so far are kept.
fn reassemble(
    bytes: &[u8],
    decompressor: &dyn SampleDecompressor,
) -> (Vec<u8>, Option<String>) {
    let mut buffer = Vec::new();
    let mut pos = 0;
    let mut chunk = 0;
    while pos < bytes.len() {
        let length = bytes[pos] as usize;
        if pos + 5 + length > bytes.len() {
            return (buffer, Some(format!("fifo error at chunk {}", chunk)));
        }
        match decompressor.decompress(&bytes[pos + 5..pos + 5 + length]) {
            Some(ref block) if block.len() == BLOCK_SIZE => {
                buffer.extend_from_slice(&bytes[pos + 1..pos + 5]);
                buffer.extend_from_slice(block);
            }
            _ => {
                return (
                    buffer,
                    Some(format!("no decompressor output for chunk {}", chunk)),
                );
            }
        }
        pos += 5 + length;
        chunk += 1;
    }
    (buffer, None)
}

fn read_plain(record: &[u8]) -> SampleRecord {
    SampleRecord {
        timestamp: LittleEndian::read_u32(&record[0..4]),
        state: None,
        x: LittleEndian::read_i16(&record[4..6]),
        y: LittleEndian::read_i16(&record[6..8]),
        z: LittleEndian::read_i16(&record[8..10]),
    }
}

fn read_link_lost(record: &[u8]) -> SampleRecord {
    SampleRecord {
        timestamp: LittleEndian::read_u32(&record[0..4]),
        state: Some(LittleEndian::read_i16(&record[4..6])),
        x: LittleEndian::read_i16(&record[6..8]),
        y: LittleEndian::read_i16(&record[8..10]),
        z: LittleEndian::read_i16(&record[10..12]),
    }
}

fn state_label(code: i16) -> String {
    if code >= 0 && (code as usize) < TRUMI_STATE.len() {
        TRUMI_STATE[code as usize].to_string()
    } else {
        format!("Unknown state -> {}", code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use decompress::{Passthrough, SAMPLES_PER_BLOCK};

    // One plain record: timestamp 1, X -48, Y 40, Z -990.
    const PLAIN_RECORD: &str = "01000000d0ff280022fc";

    fn compressed_chunk(timestamp_hex: &str) -> String {
        let mut chunk = format!("c0{}", timestamp_hex);
        for _ in 0..SAMPLES_PER_BLOCK {
            chunk.push_str("d0ff280022fc");
        }
        chunk
    }

    #[test]
    fn plain_one_sample() {
        let framed = frame(PLAIN_RECORD, Mode::Plain, &Passthrough);
        assert_eq!(1, framed.samples);
        assert_eq!(None, framed.note);
        assert_eq!(PLAIN_RECORD, framed.hex);
        assert_eq!(
            "1 samples\n#0 Sat, January 01, 2000 12:00:01 AM: X: -48 Y: 40 Z: -990",
            framed.text
        );
    }

    #[test]
    fn plain_truncated_tail_dropped() {
        let mut body = String::from(PLAIN_RECORD);
        body.push_str("0100");
        let framed = frame(&body, Mode::Plain, &Passthrough);
        assert_eq!(1, framed.samples);
        assert_eq!(None, framed.note);
    }

    #[test]
    fn plain_empty() {
        let framed = frame("", Mode::Plain, &Passthrough);
        assert_eq!(0, framed.samples);
        assert_eq!("0 samples", framed.text);
        assert_eq!("", framed.hex);
    }

    #[test]
    fn invalid_hex() {
        let framed = frame("zz00", Mode::Plain, &Passthrough);
        assert_eq!(0, framed.samples);
        assert_eq!("0 samples (invalid hex payload)", framed.text);
        assert_eq!("zz00", framed.hex);

        let framed = frame("d0f", Mode::Plain, &Passthrough);
        assert_eq!(Some("invalid hex payload".to_string()), framed.note);
    }

    #[test]
    fn link_lost_records() {
        // timestamp 2, state 1 (sleep), then the usual axes.
        let body = "020000000100d0ff280022fc";
        let framed = frame(body, Mode::LinkLost, &Passthrough);
        assert_eq!(1, framed.samples);
        assert_eq!(
            "1 samples\n#0 Sat, January 01, 2000 12:00:02 AM [TRUMI_STATE_SLEEP]: \
             X: -48 Y: 40 Z: -990",
            framed.text
        );
    }

    #[test]
    fn link_lost_unknown_state() {
        // state 0x00ff = 255 has no label.
        let body = "02000000ff00d0ff280022fc";
        let framed = frame(body, Mode::LinkLost, &Passthrough);
        assert!(framed.text.contains("[Unknown state -> 255]"));

        // state 0xffff = -1.
        let body = "02000000ffffd0ff280022fc";
        let framed = frame(body, Mode::LinkLost, &Passthrough);
        assert!(framed.text.contains("[Unknown state -> -1]"));
    }

    #[test]
    fn compressed_block() {
        let framed = frame(&compressed_chunk("01000000"), Mode::Compressed, &Passthrough);
        assert_eq!(32, framed.samples);
        assert_eq!(None, framed.note);
        // 196-byte record: timestamp plus decoded block.
        assert_eq!(196 * 2, framed.hex.len());
        assert!(framed.hex.starts_with("01000000d0ff280022fc"));
        let mut lines = framed.text.lines();
        assert_eq!(Some("32 samples"), lines.next());
        assert_eq!(Some("Sat, January 01, 2000 12:00:01 AM:"), lines.next());
        assert_eq!(Some("#0 X: -48 Y: 40 Z: -990"), lines.next());
        assert_eq!("#31 X: -48 Y: 40 Z: -990", framed.text.lines().last().unwrap());
    }

    #[test]
    fn compressed_two_blocks() {
        let mut body = compressed_chunk("01000000");
        body.push_str(&compressed_chunk("3c000000"));
        let framed = frame(&body, Mode::Compressed, &Passthrough);
        assert_eq!(64, framed.samples);
        assert!(framed.text.starts_with("64 samples"));
        assert!(framed
            .text
            .contains("Sat, January 01, 2000 12:01:00 AM:"));
        assert!(framed.text.contains("#63 "));
    }

    #[test]
    fn fifo_overrun_keeps_decoded_blocks() {
        // A good chunk followed by one whose declared length runs past the
        // end of the buffer.
        let mut body = compressed_chunk("01000000");
        body.push_str("c002000000d0ff");
        let framed = frame(&body, Mode::Compressed, &Passthrough);
        assert_eq!(32, framed.samples);
        assert_eq!(Some("fifo error at chunk 1".to_string()), framed.note);
        assert!(framed.text.starts_with("32 samples (fifo error at chunk 1)"));
        assert_eq!(196 * 2, framed.hex.len());
    }

    #[test]
    fn fifo_overrun_first_chunk() {
        let framed = frame("ff01000000", Mode::Compressed, &Passthrough);
        assert_eq!(0, framed.samples);
        assert_eq!("0 samples (fifo error at chunk 0)", framed.text);
    }

    #[test]
    fn decompressor_refusal_noted() {
        // Declared length 8 is not a block the passthrough binding accepts.
        let framed = frame("080100000000112233445566778899", Mode::Compressed, &Passthrough);
        assert_eq!(0, framed.samples);
        assert_eq!(
            Some("no decompressor output for chunk 0".to_string()),
            framed.note
        );
    }

    #[test]
    fn strides() {
        assert_eq!(10, Mode::Plain.stride());
        assert_eq!(196, Mode::Compressed.stride());
        assert_eq!(12, Mode::LinkLost.stride());
    }
}
