//! In-memory database of independently compressed blocks.
//!
//! ## Persisted Format
//!
//! ```text
//! container(
//!   for each key in increasing order:
//!     word_count: u32 (big-endian)
//!     words:      [i32; word_count] (big-endian)
//! )
//! ```
//!
//! There is no index: the whole container is read once at startup and every
//! key shares the uncompressed length given by its [`Layout`].
//!
//! ## Lifecycle
//!
//! A store is either built offline from raw streams ([`BlockStore::build`]),
//! where every block is expanded again and compared before it is accepted, or
//! loaded from a persisted container ([`BlockStore::load`]). After that it is
//! read-only; [`BlockStore::expand`] takes `&self` and may be called from any
//! number of threads.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::marker::PhantomData;
use std::path::Path;
use std::time::Instant;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::codec::{BlockCodec, Lzfi};
use crate::config::{Layout, StoreConfig};
use crate::container::{Container, ContainerWriter};
use crate::error::{Error, FormatError, Result};
use crate::raw::RawTable;

pub struct BlockStore<C: BlockCodec = Lzfi> {
    blocks: Vec<Box<[i32]>>,
    block_len: usize,
    _codec: PhantomData<C>,
}

impl<C: BlockCodec> BlockStore<C> {
    /// Load a persisted store. The container type is detected from the data.
    pub fn load<R: std::io::BufRead>(reader: R, layout: Layout) -> Result<Self> {
        layout.validate()?;
        let start = Instant::now();

        let mut raw = Vec::new();
        Container::open(reader)?.read_to_end(&mut raw)?;
        let mut data = Bytes::from(raw);

        let mut blocks = Vec::with_capacity(layout.keys.unwrap_or(0));
        while data.has_remaining() {
            let key = blocks.len();
            if data.remaining() < 4 {
                return Err(FormatError::TruncatedContainer { key }.into());
            }
            let word_count = data.get_u32() as usize;
            if data.remaining() / 4 < word_count {
                return Err(FormatError::TruncatedContainer { key }.into());
            }
            let block: Box<[i32]> = (0..word_count).map(|_| data.get_i32()).collect();
            blocks.push(block);
        }

        if let Some(expected) = layout.keys {
            if blocks.len() != expected {
                return Err(FormatError::KeyCount {
                    expected,
                    actual: blocks.len(),
                }
                .into());
            }
        }

        let store = Self::from_blocks(blocks, layout.block_len);
        info!(
            codec = C::NAME,
            keys = store.len(),
            words = store.compressed_words(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "block store loaded"
        );
        Ok(store)
    }

    pub fn load_path(path: impl AsRef<Path>, layout: Layout) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::load(BufReader::new(file), layout)
    }

    pub fn open(config: &StoreConfig) -> Result<Self> {
        Self::load_path(&config.path, config.layout)
    }

    /// Compress every stream independently and in parallel. Each block is
    /// expanded again and compared with its input before it is accepted.
    pub fn build<S: AsRef<[i32]> + Sync>(streams: &[S]) -> Result<Self> {
        let block_len = streams.first().map_or(0, |s| s.as_ref().len());
        if let Some((key, _)) = streams
            .iter()
            .enumerate()
            .find(|(_, s)| s.as_ref().len() != block_len)
        {
            return Err(Error::Config(format!(
                "raw stream {key} has {} words, expected {block_len}",
                streams[key].as_ref().len()
            )));
        }

        let blocks = compress_verified_all::<C, S>(0, streams)?;
        Ok(Self::from_blocks(blocks, block_len))
    }

    fn from_blocks(blocks: Vec<Box<[i32]>>, block_len: usize) -> Self {
        Self {
            blocks,
            block_len,
            _codec: PhantomData,
        }
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Uncompressed length of block `key`.
    pub fn block_len(&self, key: usize) -> Result<usize> {
        self.block(key)?;
        Ok(self.block_len)
    }

    /// Compressed length of block `key` in words.
    pub fn compressed_len(&self, key: usize) -> Result<usize> {
        Ok(self.block(key)?.len())
    }

    /// Total compressed words over all keys.
    pub fn compressed_words(&self) -> usize {
        self.blocks.iter().map(|b| b.len()).sum()
    }

    /// A buffer large enough for any block of this store.
    pub fn new_buffer(&self) -> Vec<i32> {
        vec![0; self.block_len]
    }

    /// Expand block `key` into the first `block_len` words of `buffer`.
    pub fn expand(&self, key: usize, buffer: &mut [i32]) -> Result<()> {
        let block = self.block(key)?;
        if buffer.len() < self.block_len {
            return Err(Error::BufferTooSmall {
                needed: self.block_len,
                available: buffer.len(),
            });
        }
        C::expand(block, &mut buffer[..self.block_len])
    }

    fn block(&self, key: usize) -> Result<&[i32]> {
        self.blocks
            .get(key)
            .map(|b| &b[..])
            .ok_or(Error::KeyOutOfRange {
                key,
                count: self.blocks.len(),
            })
    }

    pub fn persist<W: Write>(&self, writer: W, container: Container, zstd_level: i32) -> Result<W> {
        let mut out = BlockWriter::new(container.writer(writer, zstd_level)?);
        for block in &self.blocks {
            out.write_block(block)?;
        }
        let keys = out.keys();
        let writer = out.finish()?;
        info!(codec = C::NAME, keys, %container, "block store persisted");
        Ok(writer)
    }

    pub fn persist_path(
        &self,
        path: impl AsRef<Path>,
        container: Container,
        zstd_level: i32,
    ) -> Result<()> {
        let file = File::create(path.as_ref())?;
        let mut writer = self.persist(BufWriter::new(file), container, zstd_level)?;
        writer.flush()?;
        Ok(())
    }
}

/// Compress `streams` in parallel, verifying each block. `first_key` is the
/// key of `streams[0]`, used in logs and verification errors.
pub fn compress_verified_all<C: BlockCodec, S: AsRef<[i32]> + Sync>(
    first_key: usize,
    streams: &[S],
) -> Result<Vec<Box<[i32]>>> {
    streams
        .par_iter()
        .enumerate()
        .map(|(i, stream)| compress_verified::<C>(first_key + i, stream.as_ref()))
        .collect()
}

/// Compress one stream and check that it expands back to itself.
pub fn compress_verified<C: BlockCodec>(key: usize, stream: &[i32]) -> Result<Box<[i32]>> {
    let start = Instant::now();
    let block = C::compress_to_vec(stream)?;
    let elapsed = start.elapsed();

    let mut check = vec![0; stream.len()];
    C::expand(&block, &mut check)?;
    verify(key, stream, &check)?;

    debug!(
        key,
        length = block.len(),
        compress_ms = elapsed.as_millis() as u64,
        "block compressed"
    );
    Ok(block.into_boxed_slice())
}

/// Convert the raw table at `raw` into the store described by `config`,
/// compressing `chunk` keys at a time. The store is written with the
/// container and zstd level of `config`. Returns the number of keys.
pub fn convert<C: BlockCodec>(
    raw: impl AsRef<Path>,
    config: &StoreConfig,
    chunk: usize,
) -> Result<usize> {
    let start = Instant::now();
    let mut table = RawTable::open_path(raw, config.layout.block_len)?;
    let file = BufWriter::new(File::create(&config.path)?);
    let mut writer = BlockWriter::new(config.container.writer(file, config.zstd_level)?);
    let mut words = 0;

    loop {
        let first_key = table.next_key();
        let streams = table.read_chunk(chunk.max(1))?;
        if streams.is_empty() {
            break;
        }
        for block in compress_verified_all::<C, _>(first_key, &streams[..])? {
            words += block.len();
            writer.write_block(&block)?;
        }
        info!(keys = writer.keys(), "converted");
    }

    let keys = writer.keys();
    if let Some(expected) = config.layout.keys {
        if keys != expected {
            return Err(FormatError::KeyCount {
                expected,
                actual: keys,
            }
            .into());
        }
    }
    writer.finish()?.flush()?;
    info!(
        codec = C::NAME,
        keys,
        words,
        container = %config.container,
        elapsed_s = start.elapsed().as_secs_f64(),
        "store built"
    );
    Ok(keys)
}

fn verify(key: usize, expected: &[i32], actual: &[i32]) -> Result<()> {
    match expected.iter().zip(actual).position(|(e, a)| e != a) {
        Some(position) => Err(Error::Verification {
            key,
            position,
            expected: expected[position],
            actual: actual[position],
        }),
        None => Ok(()),
    }
}

/// Appends blocks to a persisted store one key at a time.
pub struct BlockWriter<W: Write> {
    inner: ContainerWriter<W>,
    buf: BytesMut,
    keys: usize,
}

impl<W: Write> BlockWriter<W> {
    pub fn new(inner: ContainerWriter<W>) -> Self {
        Self {
            inner,
            buf: BytesMut::new(),
            keys: 0,
        }
    }

    pub fn write_block(&mut self, block: &[i32]) -> Result<()> {
        let word_count = u32::try_from(block.len())
            .map_err(|_| Error::Config(format!("block of {} words is too large", block.len())))?;
        self.buf.clear();
        self.buf.reserve(4 + block.len() * 4);
        self.buf.put_u32(word_count);
        for &word in block {
            self.buf.put_i32(word);
        }
        self.inner.write_all(&self.buf)?;
        self.keys += 1;
        Ok(())
    }

    /// Keys written so far.
    pub fn keys(&self) -> usize {
        self.keys
    }

    pub fn finish(self) -> Result<W> {
        Ok(self.inner.finish()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naive::Verbatim;

    fn streams() -> Vec<Vec<i32>> {
        vec![
            (0..600).map(|i| i % 7).collect(),
            (0..600).map(|i| if i % 50 < 3 { -1 } else { i / 10 }).collect(),
            (0..600).map(|i| 1000 - i).collect(),
        ]
    }

    #[test]
    fn test_build_expand() {
        let raw = streams();
        let store: BlockStore = BlockStore::build(&raw).unwrap();
        assert_eq!(store.len(), 3);

        let mut buf = store.new_buffer();
        for key in [2, 0, 1, 0] {
            store.expand(key, &mut buf).unwrap();
            assert_eq!(buf, raw[key]);
            assert_eq!(store.block_len(key).unwrap(), 600);
        }
        assert!(store.compressed_len(0).unwrap() < 600);
        assert_eq!(store.compressed_len(2).unwrap(), 601);
    }

    #[test]
    fn test_persist_load_every_container() {
        let raw = streams();
        let store: BlockStore = BlockStore::build(&raw).unwrap();
        for container in [Container::Plain, Container::Gzip, Container::Zstd] {
            let bytes = store.persist(Vec::new(), container, 3).unwrap();
            let loaded: BlockStore =
                BlockStore::load(bytes.as_slice(), Layout::new(600).with_keys(3)).unwrap();
            let mut buf = loaded.new_buffer();
            for (key, stream) in raw.iter().enumerate() {
                loaded.expand(key, &mut buf).unwrap();
                assert_eq!(&buf, stream, "{container} key {key}");
            }
        }
    }

    #[test]
    fn test_persisted_layout() {
        let store: BlockStore = BlockStore::build(&[vec![7, 7, 7, 7, 7]]).unwrap();
        let bytes = store.persist(Vec::new(), Container::Plain, 0).unwrap();
        let mut expected = Vec::new();
        expected.extend_from_slice(&3u32.to_be_bytes());
        expected.extend_from_slice(&0i32.to_be_bytes());
        expected.extend_from_slice(&7i32.to_be_bytes());
        expected.extend_from_slice(&0x8000_0001u32.to_be_bytes());
        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_key_and_buffer_errors() {
        let store: BlockStore = BlockStore::build(&streams()).unwrap();
        let mut buf = store.new_buffer();
        assert!(matches!(
            store.expand(3, &mut buf),
            Err(Error::KeyOutOfRange { key: 3, count: 3 })
        ));
        assert!(matches!(store.block_len(9), Err(Error::KeyOutOfRange { .. })));
        assert!(matches!(
            store.expand(0, &mut buf[..599]),
            Err(Error::BufferTooSmall {
                needed: 600,
                available: 599
            })
        ));

        // A larger buffer is fine; only the prefix is written.
        let mut big = vec![i32::MIN; 700];
        store.expand(1, &mut big).unwrap();
        assert_eq!(&big[..600], &streams()[1][..]);
        assert_eq!(big[600], i32::MIN);
    }

    #[test]
    fn test_mismatched_stream_lengths() {
        let raw = vec![vec![1, 2, 3], vec![1, 2]];
        assert!(matches!(BlockStore::<Lzfi>::build(&raw), Err(Error::Config(_))));
    }

    #[test]
    fn test_truncated_container() {
        let store: BlockStore = BlockStore::build(&streams()).unwrap();
        let bytes = store.persist(Vec::new(), Container::Plain, 0).unwrap();
        let cut = &bytes[..bytes.len() - 2];
        match BlockStore::<Lzfi>::load(cut, Layout::new(600)) {
            Err(Error::Corrupt(FormatError::TruncatedContainer { key })) => assert_eq!(key, 2),
            other => panic!("unexpected result: {:?}", other.map(|s| s.len())),
        }
    }

    #[test]
    fn test_key_count_mismatch() {
        let store: BlockStore = BlockStore::build(&streams()).unwrap();
        let bytes = store.persist(Vec::new(), Container::Gzip, 0).unwrap();
        let err = BlockStore::<Lzfi>::load(bytes.as_slice(), Layout::new(600).with_keys(1326))
            .err()
            .unwrap();
        assert!(err.is_corrupt());
    }

    #[test]
    fn test_wrong_block_len_is_corrupt() {
        let store: BlockStore = BlockStore::build(&streams()).unwrap();
        let bytes = store.persist(Vec::new(), Container::Plain, 0).unwrap();
        let loaded: BlockStore = BlockStore::load(bytes.as_slice(), Layout::new(500)).unwrap();
        let mut buf = loaded.new_buffer();
        assert!(loaded.expand(0, &mut buf).unwrap_err().is_corrupt());
    }

    #[test]
    fn test_verification_catches_bad_codec() {
        struct Lossy;
        impl BlockCodec for Lossy {
            const NAME: &'static str = "lossy";
            fn max_compressed_len(len: usize) -> usize {
                len
            }
            fn compress(input: &[i32], out: &mut [i32]) -> Result<usize> {
                out[..input.len()].copy_from_slice(input);
                Ok(input.len())
            }
            fn expand(block: &[i32], out: &mut [i32]) -> Result<()> {
                out.copy_from_slice(block);
                if let Some(last) = out.last_mut() {
                    *last ^= 1;
                }
                Ok(())
            }
        }

        match BlockStore::<Lossy>::build(&[vec![1, 2], vec![3, 4]]) {
            Err(Error::Verification {
                position, expected, ..
            }) => {
                assert_eq!(position, 1);
                assert!(expected == 2 || expected == 4);
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("lossy codec passed verification"),
        }
    }

    #[test]
    fn test_verbatim_store() {
        let raw = streams();
        let store = BlockStore::<Verbatim>::build(&raw).unwrap();
        assert_eq!(store.compressed_words(), 1800);
        let bytes = store.persist(Vec::new(), Container::Zstd, 3).unwrap();
        let loaded = BlockStore::<Verbatim>::load(bytes.as_slice(), Layout::new(600)).unwrap();
        let mut buf = loaded.new_buffer();
        loaded.expand(1, &mut buf).unwrap();
        assert_eq!(buf, raw[1]);
    }
}
