//! Greedy LZFI compressor.
//!
//! The output is built in place: a control slot is reserved before each
//! literal run and filled in once the run's length is known. A run that ends
//! up empty gives its slot back, so back-references can follow each other
//! without a literal word in between.

use crate::error::{Error, Result};
use crate::format::{back_ref_word, literal_word, MAX_LITERALS};
use crate::index::ShingleIndex;

/// Worst-case compressed size of `len` input words.
pub fn max_compressed_len(len: usize) -> usize {
    bound(len, MAX_LITERALS)
}

fn bound(len: usize, max_literals: usize) -> usize {
    len + len.div_ceil(max_literals)
}

/// Compress `input` into `out`, returning the number of words written.
///
/// `out` must hold at least [`max_compressed_len`] words.
pub fn compress(input: &[i32], out: &mut [i32]) -> Result<usize> {
    compress_with(input, out, MAX_LITERALS)
}

/// Compress into a freshly allocated block trimmed to its final length.
pub fn compress_to_vec(input: &[i32]) -> Vec<i32> {
    let mut out = vec![0; max_compressed_len(input.len())];
    let len = encode(input, &mut out, MAX_LITERALS);
    out.truncate(len);
    out
}

pub(crate) fn compress_with(input: &[i32], out: &mut [i32], max_literals: usize) -> Result<usize> {
    let needed = bound(input.len(), max_literals);
    if out.len() < needed {
        return Err(Error::BufferTooSmall {
            needed,
            available: out.len(),
        });
    }
    Ok(encode(input, out, max_literals))
}

fn encode(input: &[i32], out: &mut [i32], max_literals: usize) -> usize {
    let index = ShingleIndex::build(input);
    let mut run = LiteralRun::default();
    let mut in_pos = 0;
    let mut out_pos = 1; // control slot for the first run

    while in_pos < input.len() {
        match index.best_match(in_pos) {
            Some(m) => {
                out_pos = run.flush(out, out_pos);
                out[out_pos] = back_ref_word(m.distance, m.length);
                out_pos += 2; // skip over the next run's control slot
                in_pos += m.length;
            }
            None => {
                out[out_pos] = input[in_pos];
                out_pos += 1;
                in_pos += 1;
                run.count += 1;
                if run.count == max_literals {
                    out_pos = run.flush(out, out_pos) + 1;
                }
            }
        }
    }
    run.flush(out, out_pos)
}

#[derive(Default)]
struct LiteralRun {
    count: usize,
}

impl LiteralRun {
    /// Close the run whose payload ends just before `out_pos`. Returns the
    /// position the next instruction goes to: `out_pos` itself, or the
    /// reclaimed control slot when the run is empty.
    fn flush(&mut self, out: &mut [i32], out_pos: usize) -> usize {
        if self.count == 0 {
            return out_pos - 1;
        }
        out[out_pos - self.count - 1] = literal_word(self.count);
        self.count = 0;
        out_pos
    }
}
