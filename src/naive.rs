use crate::codec::BlockCodec;
use crate::error::{Error, FormatError, Result};

/// Stores blocks uncompressed. The size baseline other codecs are measured
/// against.
pub struct Verbatim;

impl BlockCodec for Verbatim {
    const NAME: &'static str = "Verbatim";

    fn max_compressed_len(len: usize) -> usize {
        len
    }

    fn compress(input: &[i32], out: &mut [i32]) -> Result<usize> {
        if out.len() < input.len() {
            return Err(Error::BufferTooSmall {
                needed: input.len(),
                available: out.len(),
            });
        }
        out[..input.len()].copy_from_slice(input);
        Ok(input.len())
    }

    fn expand(block: &[i32], out: &mut [i32]) -> Result<()> {
        if block.len() != out.len() {
            return Err(FormatError::LengthMismatch {
                expected: out.len(),
                actual: block.len(),
            }
            .into());
        }
        out.copy_from_slice(block);
        Ok(())
    }
}
