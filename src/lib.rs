//! # LZFI
//!
//! Int-aligned LZF compression for streams of 32-bit integers, and the
//! compressed hand-value database built on it.
//!
//! Each starting hand owns one raw stream: the hand's value on every possible
//! board. Streams are compressed independently with a greedy dictionary
//! matcher ([`compress`]), stored together in one whole-file compressed
//! container ([`BlockStore`]), and expanded on demand into a caller-owned
//! buffer ([`BlockStore::expand`]).
//!
//! ```no_run
//! use lzfi::{BlockStore, Layout};
//!
//! let store: BlockStore = BlockStore::load_path("hand_values.lzfi.gz", Layout::hand_values())?;
//! let mut values = store.new_buffer();
//! store.expand(17, &mut values)?;
//! # Ok::<(), lzfi::Error>(())
//! ```

pub mod codec;
pub mod compress;
pub mod config;
pub mod container;
pub mod error;
pub mod expand;
pub mod format;
pub mod index;
pub mod naive;
pub mod raw;
pub mod store;

pub use codec::{BlockCodec, Lzfi};
pub use compress::{compress, compress_to_vec, max_compressed_len};
pub use config::{board_count, Layout, StoreConfig, HOLE_COUNT};
pub use container::Container;
pub use error::{Error, FormatError, Result};
pub use expand::expand;
pub use naive::Verbatim;
pub use raw::RawTable;
pub use store::{BlockStore, BlockWriter};
