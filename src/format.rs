//! Bit layout of LZFI control words.
//!
//! ```text
//! literal run:     0 | count - 1                        (31 bits)
//! back-reference:  1 | distance - 1 (20 bits) | length - MIN_MATCH (11 bits)
//! ```
//!
//! Literal payload words follow their control word verbatim. A block is
//! delimited only by its total word count.

/// Bits of a back-reference reserved for the distance.
pub const OFFSET_BITS: u32 = 20;

/// Bits of a back-reference reserved for the length.
pub const LENGTH_BITS: u32 = 31 - OFFSET_BITS;

/// Shortest back-reference; also the shingle length of the match index.
pub const MIN_MATCH: usize = 3;

/// Longest back-reference the length field can hold.
pub const MAX_LENGTH: usize = (1 << LENGTH_BITS) + MIN_MATCH - 1;

/// Largest back-reference distance. Only half the range of the distance
/// field is used; persisted stores depend on this.
pub const MAX_OFFSET: usize = 1 << (OFFSET_BITS - 1);

/// Longest literal run a single control word can announce.
pub const MAX_LITERALS: usize = 1 << 31;

const BACK_REF_FLAG: u32 = 0x8000_0000;
const LENGTH_MASK: u32 = (1 << LENGTH_BITS) - 1;
const OFFSET_MASK: u32 = (1 << OFFSET_BITS) - 1;

/// A decoded control word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Literals { count: usize },
    BackRef { distance: usize, length: usize },
}

impl Control {
    pub fn decode(word: i32) -> Self {
        let word = word as u32;
        if word & BACK_REF_FLAG == 0 {
            Control::Literals {
                count: word as usize + 1,
            }
        } else {
            Control::BackRef {
                distance: ((word >> LENGTH_BITS) & OFFSET_MASK) as usize + 1,
                length: (word & LENGTH_MASK) as usize + MIN_MATCH,
            }
        }
    }
}

/// Control word announcing `count` literals, `1 ≤ count ≤ MAX_LITERALS`.
pub fn literal_word(count: usize) -> i32 {
    debug_assert!((1..=MAX_LITERALS).contains(&count));
    (count - 1) as u32 as i32
}

/// Control word for a back-reference within the window and length limits.
pub fn back_ref_word(distance: usize, length: usize) -> i32 {
    debug_assert!((1..=MAX_OFFSET).contains(&distance));
    debug_assert!((MIN_MATCH..=MAX_LENGTH).contains(&length));
    let offset = (distance - 1) as u32;
    let len = (length - MIN_MATCH) as u32;
    (BACK_REF_FLAG | (offset << LENGTH_BITS) | len) as i32
}
