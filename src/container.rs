//! Whole-file compression wrapper around persisted stores and raw tables.

use std::fmt;
use std::io::{self, BufRead, Read, Write};
use std::str::FromStr;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const ZSTD_MAGIC: [u8; 4] = [0x28, 0xb5, 0x2f, 0xfd];

pub const DEFAULT_ZSTD_LEVEL: i32 = 19;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Container {
    Plain,
    #[default]
    Gzip,
    Zstd,
}

impl Container {
    /// Sniff the container type from the leading bytes of `reader` without
    /// consuming them.
    pub fn detect<R: BufRead>(reader: &mut R) -> io::Result<Self> {
        let head = reader.fill_buf()?;
        Ok(if head.starts_with(&ZSTD_MAGIC) {
            Container::Zstd
        } else if head.starts_with(&GZIP_MAGIC) {
            Container::Gzip
        } else {
            Container::Plain
        })
    }

    /// Wrap `reader` in the matching decoder.
    pub fn reader<'a, R: BufRead + 'a>(self, reader: R) -> io::Result<Box<dyn Read + 'a>> {
        Ok(match self {
            Container::Plain => Box::new(reader),
            Container::Gzip => Box::new(GzDecoder::new(reader)),
            Container::Zstd => Box::new(zstd::stream::read::Decoder::with_buffer(reader)?),
        })
    }

    /// Detect the container type and wrap `reader` in its decoder.
    pub fn open<'a, R: BufRead + 'a>(mut reader: R) -> io::Result<Box<dyn Read + 'a>> {
        let container = Self::detect(&mut reader)?;
        container.reader(reader)
    }

    pub fn writer<W: Write>(self, writer: W, zstd_level: i32) -> io::Result<ContainerWriter<W>> {
        Ok(match self {
            Container::Plain => ContainerWriter::Plain(writer),
            Container::Gzip => {
                ContainerWriter::Gzip(GzEncoder::new(writer, flate2::Compression::default()))
            }
            Container::Zstd => {
                ContainerWriter::Zstd(zstd::stream::write::Encoder::new(writer, zstd_level)?)
            }
        })
    }
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Container::Plain => "plain",
            Container::Gzip => "gzip",
            Container::Zstd => "zstd",
        })
    }
}

impl FromStr for Container {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "plain" => Ok(Container::Plain),
            "gzip" | "gz" => Ok(Container::Gzip),
            "zstd" | "zst" => Ok(Container::Zstd),
            other => Err(Error::Config(format!("unknown container '{other}'"))),
        }
    }
}

/// Encoder for one of the container types. `finish` must be called to write
/// the compression trailer.
pub enum ContainerWriter<W: Write> {
    Plain(W),
    Gzip(GzEncoder<W>),
    Zstd(zstd::stream::write::Encoder<'static, W>),
}

impl<W: Write> ContainerWriter<W> {
    pub fn finish(self) -> io::Result<W> {
        match self {
            ContainerWriter::Plain(mut w) => {
                w.flush()?;
                Ok(w)
            }
            ContainerWriter::Gzip(e) => e.finish(),
            ContainerWriter::Zstd(e) => e.finish(),
        }
    }
}

impl<W: Write> Write for ContainerWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            ContainerWriter::Plain(w) => w.write(buf),
            ContainerWriter::Gzip(e) => e.write(buf),
            ContainerWriter::Zstd(e) => e.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            ContainerWriter::Plain(w) => w.flush(),
            ContainerWriter::Gzip(e) => e.flush(),
            ContainerWriter::Zstd(e) => e.flush(),
        }
    }
}
