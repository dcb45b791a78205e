//! LZFI decompressor.

use crate::error::{FormatError, Result};
use crate::format::Control;

/// Expand `block` into `out`, which must end up exactly filled.
///
/// Any malformed instruction fails with [`crate::Error::Corrupt`]; `out` may
/// hold partial data afterwards.
pub fn expand(block: &[i32], out: &mut [i32]) -> Result<()> {
    let mut in_pos = 0;
    let mut out_pos = 0;

    while in_pos < block.len() {
        let at = in_pos;
        match Control::decode(block[in_pos]) {
            Control::Literals { count } => {
                in_pos += 1;
                if count > block.len() - in_pos {
                    return Err(FormatError::TruncatedBlock {
                        position: at,
                        count,
                    }
                    .into());
                }
                check_room(at, count, out_pos, out.len())?;
                out[out_pos..out_pos + count].copy_from_slice(&block[in_pos..in_pos + count]);
                in_pos += count;
                out_pos += count;
            }
            Control::BackRef { distance, length } => {
                in_pos += 1;
                if distance > out_pos {
                    return Err(FormatError::BadReference {
                        position: out_pos,
                        distance,
                    }
                    .into());
                }
                check_room(at, length, out_pos, out.len())?;
                // Source and destination may overlap; copy forwards one word
                // at a time so repeated patterns unroll.
                let mut src = out_pos - distance;
                for _ in 0..length {
                    out[out_pos] = out[src];
                    out_pos += 1;
                    src += 1;
                }
            }
        }
    }

    if out_pos != out.len() {
        return Err(FormatError::LengthMismatch {
            expected: out.len(),
            actual: out_pos,
        }
        .into());
    }
    Ok(())
}

fn check_room(position: usize, count: usize, out_pos: usize, capacity: usize) -> Result<()> {
    if count > capacity - out_pos {
        return Err(FormatError::OutputOverrun {
            position,
            count,
            capacity,
        }
        .into());
    }
    Ok(())
}
