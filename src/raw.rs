//! Reader for raw hand-value tables: one stream of `block_len` big-endian
//! words per key, keys in increasing order, the whole file wrapped in a
//! [`Container`](crate::container::Container).

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use crate::container::Container;
use crate::error::{Error, FormatError, Result};

pub struct RawTable<'a> {
    reader: Box<dyn Read + 'a>,
    bytes: Vec<u8>,
    next_key: usize,
}

impl<'a> RawTable<'a> {
    /// Read streams of `block_len` words from an already decoded `reader`.
    pub fn new(reader: Box<dyn Read + 'a>, block_len: usize) -> Result<Self> {
        if block_len == 0 {
            return Err(Error::Config("block_len must be positive".into()));
        }
        Ok(Self {
            reader,
            bytes: vec![0; block_len * 4],
            next_key: 0,
        })
    }

    /// Open a raw table, detecting its container type.
    pub fn open<R: io::BufRead + 'a>(reader: R, block_len: usize) -> Result<Self> {
        Self::new(Container::open(reader)?, block_len)
    }

    /// Key of the next stream to be read.
    pub fn next_key(&self) -> usize {
        self.next_key
    }

    /// Read the next stream, or `None` at a clean end of input.
    pub fn read_stream(&mut self) -> Result<Option<Vec<i32>>> {
        let filled = read_full(&mut self.reader, &mut self.bytes)?;
        if filled == 0 {
            return Ok(None);
        }
        if filled < self.bytes.len() {
            return Err(FormatError::TruncatedContainer { key: self.next_key }.into());
        }
        self.next_key += 1;
        Ok(Some(
            self.bytes
                .chunks_exact(4)
                .map(|w| i32::from_be_bytes([w[0], w[1], w[2], w[3]]))
                .collect(),
        ))
    }

    /// Read up to `max` streams.
    pub fn read_chunk(&mut self, max: usize) -> Result<Vec<Vec<i32>>> {
        let mut chunk = Vec::with_capacity(max);
        while chunk.len() < max {
            match self.read_stream()? {
                Some(stream) => chunk.push(stream),
                None => break,
            }
        }
        Ok(chunk)
    }
}

impl RawTable<'static> {
    pub fn open_path(path: impl AsRef<Path>, block_len: usize) -> Result<Self> {
        let file = File::open(path)?;
        Self::open(BufReader::new(file), block_len)
    }
}

/// Like `read_exact`, but reports how much was read instead of failing on a
/// short read.
fn read_full<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
