use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{
    DEFAULT_CHUNK_SIZE, DEFAULT_MAX_ARCHIVE_SIZE, DEFAULT_MAX_ENTRY_SIZE, DEFAULT_MAX_TOTAL_SIZE,
    DEFAULT_PREVIEW_LIMIT, ViewerConfig,
};

#[derive(Parser, Debug)]
#[command(name = "zipview")]
#[command(version)]
#[command(about = "Inspect ZIP archives and convert images", long_about = None)]
#[command(after_help = "Examples:\n  \
  zipview list -l bundle.zip                  list entries with sizes and totals\n  \
  zipview cat bundle.zip docs/readme.txt      print one entry\n  \
  zipview list https://example.com/a.zip      list a remote archive\n  \
  zipview convert photo.png -f webp -o out.webp")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[command(flatten)]
    pub limits: Limits,

    /// Quiet mode, no progress output
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,

    /// Verbose logging (-vv for trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Args, Debug, Clone, Copy)]
pub struct Limits {
    /// Largest archive accepted, in bytes
    #[arg(long, global = true, env = "ZIPVIEW_MAX_SIZE", default_value_t = DEFAULT_MAX_ARCHIVE_SIZE)]
    pub max_size: u64,

    /// Bytes read per chunk
    #[arg(long, global = true, env = "ZIPVIEW_CHUNK_SIZE", default_value_t = DEFAULT_CHUNK_SIZE)]
    pub chunk_size: usize,

    /// Largest entry printed by `cat`, in bytes
    #[arg(long, global = true, env = "ZIPVIEW_PREVIEW_LIMIT", default_value_t = DEFAULT_PREVIEW_LIMIT)]
    pub preview_limit: u64,

    /// Largest decompressed size of one entry, in bytes
    #[arg(long, global = true, env = "ZIPVIEW_MAX_ENTRY_SIZE", default_value_t = DEFAULT_MAX_ENTRY_SIZE)]
    pub max_entry_size: u64,

    /// Largest decompressed size of a whole archive, in bytes
    #[arg(long, global = true, env = "ZIPVIEW_MAX_TOTAL_SIZE", default_value_t = DEFAULT_MAX_TOTAL_SIZE)]
    pub max_total_size: u64,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List archive entries, directories first
    List {
        /// ZIP file path or HTTP URL
        archive: String,

        /// Show sizes and a totals line
        #[arg(short = 'l', long)]
        long: bool,
    },

    /// Write one entry's content to stdout
    Cat {
        /// ZIP file path or HTTP URL
        archive: String,

        /// Entry path inside the archive
        path: String,
    },

    /// Extract file entries to disk
    Extract {
        /// ZIP file path or HTTP URL
        archive: String,

        /// Entry paths to extract (default: all)
        paths: Vec<String>,

        /// Extract files into exdir
        #[arg(short = 'd', value_name = "DIR", default_value = ".")]
        extract_dir: PathBuf,

        /// Overwrite existing files
        #[arg(short = 'o')]
        overwrite: bool,
    },

    /// Convert an image to another format
    Convert {
        /// Input image
        input: PathBuf,

        /// Target format: jpeg, jpg, png, webp or avif
        #[arg(short = 'f', long)]
        format: String,

        /// Output file
        #[arg(short = 'o', long)]
        output: PathBuf,

        /// Encoder quality, 1-100 (JPEG, AVIF)
        #[arg(long)]
        quality: Option<u8>,

        /// Shrink images wider than this many pixels
        #[arg(long)]
        max_width: Option<u32>,

        /// Drop source metadata
        #[arg(long)]
        strip_metadata: bool,

        /// Favor smaller output over encoding speed
        #[arg(long)]
        web_optimized: bool,
    },
}

impl Cli {
    pub fn config(&self) -> ViewerConfig {
        ViewerConfig::default()
            .with_max_archive_size(self.limits.max_size)
            .with_chunk_size(self.limits.chunk_size)
            .with_preview_limit(self.limits.preview_limit)
            .with_max_entry_size(self.limits.max_entry_size)
            .with_max_total_size(self.limits.max_total_size)
    }

    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        }
    }
}

pub fn is_http_url(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}
