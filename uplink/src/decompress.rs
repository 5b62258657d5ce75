//! The sample decompression boundary.
//!
//! Motion-detection uplinks carry Rice-coded accelerometer FIFO chunks. The
//! codec itself ships as a per-deployment native library; the decoder only
//! depends on the contract below, and the binding is injected when the
//! decoder is constructed, never swapped mid-lifetime.

use std::fmt;

/// The size in bytes of one decoded sample block.
pub const BLOCK_SIZE: usize = 192;

/// The number of 6-byte samples in one decoded block.
pub const SAMPLES_PER_BLOCK: usize = 32;

/// Decompresses one FIFO chunk into one fixed-size sample block.
///
/// Implementations take the chunk's compressed bytes (the length prefix and
/// timestamp have already been consumed by the framer) and return exactly
/// [`BLOCK_SIZE`](constant.BLOCK_SIZE.html) decoded bytes, or `None` if the
/// chunk cannot be decoded. Failure is absence of output, never a panic.
pub trait SampleDecompressor: fmt::Debug + Send + Sync {
    /// Decompresses one chunk, returning the decoded block.
    fn decompress(&self, input: &[u8]) -> Option<Vec<u8>>;
}

/// The test-deployment binding: chunks are already decoded.
///
/// Accepts only inputs that are exactly one block long and returns them
/// unchanged. Anything else is refused, which is how fixtures exercise the
/// framer's failure handling without a native codec.
///
/// # Examples
///
/// ```
/// use uplink::decompress::{Passthrough, SampleDecompressor, BLOCK_SIZE};
/// let binding = Passthrough;
/// assert_eq!(Some(vec![0; BLOCK_SIZE]), binding.decompress(&[0; BLOCK_SIZE]));
/// assert_eq!(None, binding.decompress(&[0; 7]));
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct Passthrough;

impl SampleDecompressor for Passthrough {
    fn decompress(&self, input: &[u8]) -> Option<Vec<u8>> {
        if input.len() == BLOCK_SIZE {
            Some(input.to_vec())
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passthrough_round_trip() {
        let block: Vec<u8> = (0..BLOCK_SIZE).map(|n| n as u8).collect();
        assert_eq!(Some(block.clone()), Passthrough.decompress(&block));
    }

    #[test]
    fn passthrough_refuses_wrong_sizes() {
        assert_eq!(None, Passthrough.decompress(&[]));
        assert_eq!(None, Passthrough.decompress(&[0; BLOCK_SIZE - 1]));
        assert_eq!(None, Passthrough.decompress(&[0; BLOCK_SIZE + 1]));
    }

    #[test]
    fn block_geometry() {
        assert_eq!(BLOCK_SIZE, SAMPLES_PER_BLOCK * 6);
    }
}
