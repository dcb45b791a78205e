//! Store configuration and the standard hold'em layouts.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::container::{Container, DEFAULT_ZSTD_LEVEL};
use crate::error::{Error, Result};

/// Number of distinct two-card starting hands.
pub const HOLE_COUNT: usize = 52 * 51 / 2;

/// Number of five-card boards left once `holes` two-card hands are dealt.
pub fn board_count(holes: usize) -> usize {
    let deck = 52usize.saturating_sub(2 * holes);
    if deck < 5 {
        return 0;
    }
    deck * (deck - 1) * (deck - 2) * (deck - 3) * (deck - 4) / 120
}

/// Shape of a store: the uncompressed length shared by every block and,
/// optionally, the number of keys it must contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layout {
    pub block_len: usize,
    #[serde(default)]
    pub keys: Option<usize>,
}

impl Layout {
    pub fn new(block_len: usize) -> Self {
        Self {
            block_len,
            keys: None,
        }
    }

    pub fn with_keys(mut self, keys: usize) -> Self {
        self.keys = Some(keys);
        self
    }

    /// The hold'em hand-value database: one block per starting hand, with a
    /// word for every five-card board of the full deck. Boards that collide
    /// with the hand hold the `-1` sentinel.
    pub fn hand_values() -> Self {
        Self::new(board_count(0)).with_keys(HOLE_COUNT)
    }

    pub fn validate(&self) -> Result<()> {
        if self.block_len == 0 {
            return Err(Error::Config("block_len must be positive".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    pub path: PathBuf,
    #[serde(flatten)]
    pub layout: Layout,
    #[serde(default)]
    pub container: Container,
    #[serde(default = "default_zstd_level")]
    pub zstd_level: i32,
}

fn default_zstd_level() -> i32 {
    DEFAULT_ZSTD_LEVEL
}

impl StoreConfig {
    pub fn new(path: impl Into<PathBuf>, layout: Layout) -> Self {
        Self {
            path: path.into(),
            layout,
            container: Container::default(),
            zstd_level: DEFAULT_ZSTD_LEVEL,
        }
    }

    /// Parse a JSON config file. A relative `path` is resolved against the
    /// config file's directory.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config: StoreConfig = serde_json::from_str(&fs::read_to_string(path)?)?;
        if config.path.is_relative() {
            if let Some(dir) = path.parent() {
                config.path = dir.join(&config.path);
            }
        }
        config.layout.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_board_counts() {
        assert_eq!(HOLE_COUNT, 1326);
        assert_eq!(board_count(0), 2_598_960);
        assert_eq!(board_count(1), 2_118_760);
        assert_eq!(board_count(2), 1_712_304);
        assert_eq!(board_count(24), 0);
    }

    #[test]
    fn test_hand_value_layout() {
        let layout = Layout::hand_values();
        assert_eq!(layout.block_len, 2_598_960);
        assert_eq!(layout.keys, Some(1326));
        assert!(Layout::new(0).validate().is_err());
    }

    #[test]
    fn test_from_file_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("store.json");
        fs::write(&config_path, r#"{ "path": "hand_values.lzfi.gz", "block_len": 1000 }"#).unwrap();

        let config = StoreConfig::from_file(&config_path).unwrap();
        assert_eq!(config.path, dir.path().join("hand_values.lzfi.gz"));
        assert_eq!(config.layout, Layout::new(1000));
        assert_eq!(config.container, Container::Gzip);
        assert_eq!(config.zstd_level, DEFAULT_ZSTD_LEVEL);
    }

    #[test]
    fn test_from_file_rejects_zero_block_len() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("store.json");
        fs::write(
            &config_path,
            r#"{ "path": "/data/db", "block_len": 0, "keys": 3, "container": "zstd" }"#,
        )
        .unwrap();
        assert!(matches!(StoreConfig::from_file(&config_path), Err(Error::Config(_))));
    }
}
