use crate::error::Result;
use crate::{compress, expand};

/// A word-oriented block codec. Implementations are stateless; every call
/// works on caller-owned buffers.
pub trait BlockCodec {
    const NAME: &'static str;

    /// Output buffer size guaranteed to fit any `len`-word input.
    fn max_compressed_len(len: usize) -> usize;

    fn compress(input: &[i32], out: &mut [i32]) -> Result<usize>;

    /// Expand `block` into exactly `out.len()` words.
    fn expand(block: &[i32], out: &mut [i32]) -> Result<()>;

    fn compress_to_vec(input: &[i32]) -> Result<Vec<i32>> {
        let mut out = vec![0; Self::max_compressed_len(input.len())];
        let len = Self::compress(input, &mut out)?;
        out.truncate(len);
        Ok(out)
    }
}

/// Int-aligned LZF.
pub struct Lzfi;

impl BlockCodec for Lzfi {
    const NAME: &'static str = "LZFI";

    fn max_compressed_len(len: usize) -> usize {
        compress::max_compressed_len(len)
    }

    fn compress(input: &[i32], out: &mut [i32]) -> Result<usize> {
        compress::compress(input, out)
    }

    fn expand(block: &[i32], out: &mut [i32]) -> Result<()> {
        expand::expand(block, out)
    }

    fn compress_to_vec(input: &[i32]) -> Result<Vec<i32>> {
        Ok(compress::compress_to_vec(input))
    }
}
