use std::error::Error;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Args, Parser, Subcommand};
use tracing::info;

use lzfi::store::convert;
use lzfi::{
    board_count, compress_to_vec, expand, BlockCodec, BlockStore, Container, Layout, Lzfi,
    StoreConfig, Verbatim,
};

#[derive(Parser)]
#[command(name = "lzfi")]
#[command(about = "Int-aligned LZF codec and compressed hand-value database tool")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compress a file of big-endian words into a single block.
    Compress { input: PathBuf, output: PathBuf },

    /// Expand a single block written by `compress`.
    Expand { input: PathBuf, output: PathBuf },

    /// Build a block store from a raw hand-value table.
    Build {
        raw: PathBuf,
        output: PathBuf,

        #[command(flatten)]
        layout: LayoutArgs,

        /// Container format [default: from --config, else gzip]
        #[arg(long, env = "LZFI_CONTAINER")]
        container: Option<Container>,

        /// Zstd compression level [default: from --config, else 19]
        #[arg(long)]
        level: Option<i32>,

        /// Keys compressed in parallel per batch.
        #[arg(long, default_value_t = 64)]
        chunk: usize,
    },

    /// Load a store and expand every key.
    Verify {
        store: Option<PathBuf>,

        #[command(flatten)]
        layout: LayoutArgs,
    },

    /// Print compressed sizes of a store.
    Stats {
        store: Option<PathBuf>,

        #[command(flatten)]
        layout: LayoutArgs,
    },
}

#[derive(Args)]
struct LayoutArgs {
    /// JSON store config; supplies the path and layout.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Uncompressed words per key.
    #[arg(long, env = "LZFI_BLOCK_LEN", conflicts_with = "holes")]
    block_len: Option<usize>,

    /// Derive the block length from the number of dealt holes.
    #[arg(long)]
    holes: Option<usize>,

    /// Expected number of keys.
    #[arg(long)]
    keys: Option<usize>,
}

impl LayoutArgs {
    fn resolve(&self, path: Option<PathBuf>) -> Result<StoreConfig, Box<dyn Error>> {
        let mut config = match &self.config {
            Some(file) => StoreConfig::from_file(file)?,
            None => StoreConfig::new(PathBuf::new(), Layout::new(0)),
        };
        if let Some(path) = path {
            config.path = path;
        }
        if let Some(block_len) = self.block_len {
            config.layout.block_len = block_len;
        }
        if let Some(holes) = self.holes {
            config.layout.block_len = board_count(holes);
        }
        if self.keys.is_some() {
            config.layout.keys = self.keys;
        }
        if config.path.as_os_str().is_empty() {
            return Err("no store path given".into());
        }
        config.layout.validate()?;
        Ok(config)
    }
}

fn read_words(bytes: &[u8]) -> Result<Vec<i32>, Box<dyn Error>> {
    if bytes.len() % 4 != 0 {
        return Err(format!("file must be a multiple of 4 bytes long, got {}", bytes.len()).into());
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|w| i32::from_be_bytes([w[0], w[1], w[2], w[3]]))
        .collect())
}

fn write_words(path: &Path, words: &[i32]) -> Result<(), Box<dyn Error>> {
    let mut out = BufWriter::new(File::create(path)?);
    for word in words {
        out.write_all(&word.to_be_bytes())?;
    }
    out.flush()?;
    Ok(())
}

fn compress_file(input: &Path, output: &Path) -> Result<(), Box<dyn Error>> {
    let words = read_words(&fs::read(input)?)?;
    info!(size = words.len(), "compressing");
    let block = compress_to_vec(&words);
    info!(compressed = block.len(), "compressed");

    let header = i32::try_from(words.len())?;
    let mut file = Vec::with_capacity(block.len() + 1);
    file.push(header);
    file.extend_from_slice(&block);
    write_words(output, &file)
}

fn expand_file(input: &Path, output: &Path) -> Result<(), Box<dyn Error>> {
    let words = read_words(&fs::read(input)?)?;
    let (&len, block) = words.split_first().ok_or("missing length header")?;
    let len = usize::try_from(len)?;
    let mut out = vec![0; len];
    expand(block, &mut out)?;
    write_words(output, &out)
}

fn verify(config: &StoreConfig) -> Result<(), Box<dyn Error>> {
    let store: BlockStore = BlockStore::open(config)?;
    let mut buf = store.new_buffer();
    let start = Instant::now();
    for key in 0..store.len() {
        store.expand(key, &mut buf)?;
    }
    info!(
        keys = store.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "all keys expanded"
    );
    println!("{} keys OK", store.len());
    Ok(())
}

fn format_bytes(bytes: usize) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;

    let bytes_f = bytes as f64;
    if bytes_f >= GB {
        format!("{:.2} GB", bytes_f / GB)
    } else if bytes_f >= MB {
        format!("{:.2} MB", bytes_f / MB)
    } else if bytes_f >= KB {
        format!("{:.2} KB", bytes_f / KB)
    } else {
        format!("{} B", bytes)
    }
}

fn print_row(name: &str, size: usize, baseline: usize) {
    let ratio = if baseline > 0 {
        format!("{:.1}%", size as f64 / baseline as f64 * 100.0)
    } else {
        "-".to_string()
    };

    println!("│ {:<22} │ {:>10} │ {:>10} │", name, format_bytes(size), ratio);
}

fn stats(config: &StoreConfig) -> Result<(), Box<dyn Error>> {
    let store: BlockStore = BlockStore::open(config)?;
    let baseline = Verbatim::max_compressed_len(config.layout.block_len) * store.len() * 4;
    let blocks = (store.compressed_words() + store.len()) * 4;
    let file = fs::metadata(&config.path)?.len() as usize;

    let (smallest, largest) = (0..store.len())
        .filter_map(|key| store.compressed_len(key).ok())
        .fold((usize::MAX, 0), |(lo, hi), len| (lo.min(len), hi.max(len)));

    println!("{} keys, {} words per key", store.len(), config.layout.block_len);
    if !store.is_empty() {
        println!("block words: min {smallest}, max {largest}");
    }
    println!("┌────────────────────────┬────────────┬────────────┐");
    println!("│ Layer                  │       Size │ vs {:<7} │", Verbatim::NAME);
    println!("├────────────────────────┼────────────┼────────────┤");
    print_row(Verbatim::NAME, baseline, baseline);
    print_row(Lzfi::NAME, blocks, baseline);
    print_row("LZFI + container", file, baseline);
    println!("└────────────────────────┴────────────┴────────────┘");
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("lzfi=info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Compress { input, output } => compress_file(&input, &output),
        Command::Expand { input, output } => expand_file(&input, &output),
        Command::Build {
            raw,
            output,
            layout,
            container,
            level,
            chunk,
        } => {
            let mut config = layout.resolve(Some(output))?;
            if let Some(container) = container {
                config.container = container;
            }
            if let Some(level) = level {
                config.zstd_level = level;
            }
            convert::<Lzfi>(&raw, &config, chunk)?;
            Ok(())
        }
        Command::Verify { store, layout } => verify(&layout.resolve(store)?),
        Command::Stats { store, layout } => stats(&layout.resolve(store)?),
    }
}
