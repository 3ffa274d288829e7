//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use orpha_scan::{MatcherOptions, ScanConfig, ScanError, ScanPaths, ScanResult, VerifyCommand};

/// Scan subreddit metadata archives for rare-disease communities.
#[derive(Parser, Debug)]
#[command(name = "find-candidates", version, about)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// Scan options (used when no subcommand is given).
    #[command(flatten)]
    pub scan: ScanArgs,

    /// Optional subcommand.
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compile the term catalog into an entity-matching model directory.
    BuildModel(BuildModelArgs),
}

/// Options for the default scan mode.
#[derive(Args, Debug, Clone)]
pub struct ScanArgs {
    /// TSV term catalog (orpha_id, term, is_preferred)
    #[arg(long, env = "ORPHA_CATALOG", default_value = "data/ordo_terms.tsv")]
    pub catalog: PathBuf,

    /// Entity-matching model directory
    #[arg(long, env = "ORPHA_MODEL", default_value = "models/model_rare_disease")]
    pub model: PathBuf,

    /// Directory searched recursively for .zst archives
    #[arg(long, env = "ORPHA_DUMP_DIR", default_value = "data/raw_subreddits")]
    pub dump_dir: PathBuf,

    /// Output CSV path
    #[arg(long, env = "ORPHA_OUT", default_value = "data/candidate_subreddits.csv")]
    pub out: PathBuf,

    /// Records processed between buffer flushes
    #[arg(long, env = "ORPHA_CHUNK_SIZE", default_value_t = 1_000_000)]
    pub chunk_size: usize,

    /// Minimum stripped-name length before fuzzy matching is tried
    #[arg(long, env = "ORPHA_MIN_FUZZY_LEN", default_value_t = 5)]
    pub min_fuzzy_len: usize,

    /// Fuzzy acceptance threshold (0-100)
    #[arg(long, env = "ORPHA_FUZZY_THRESHOLD", default_value_t = 85.0)]
    pub fuzzy_threshold: f64,

    /// Maximum zstd decompression window in bytes
    #[arg(long, env = "ORPHA_MAX_WINDOW_SIZE", default_value_t = 1 << 31)]
    pub max_window_size: u64,

    /// File-name marker identifying metadata-only archives
    #[arg(long, env = "ORPHA_META_MARKER", default_value = "meta_only")]
    pub meta_marker: String,

    /// Prefix stripped from names before fuzzy matching
    #[arg(long, env = "ORPHA_NAME_PREFIX", default_value = "r/")]
    pub name_prefix: String,

    /// Pipeline stages to disable when loading the model (comma-separated)
    #[arg(
        long,
        env = "ORPHA_DISABLE",
        value_delimiter = ',',
        default_value = "tagger,parser,lemmatizer"
    )]
    pub disable: Vec<String>,

    /// Append to an existing output and skip names already in it
    #[arg(long, env = "ORPHA_RESUME")]
    pub resume: bool,

    /// Run the verification command after a successful scan
    #[arg(long, env = "ORPHA_VERIFY", requires = "verify_cmd")]
    pub verify: bool,

    /// Verification command line; the output path is appended
    #[arg(long, env = "ORPHA_VERIFY_CMD")]
    pub verify_cmd: Option<String>,
}

impl ScanArgs {
    /// Tunables for the scanner.
    pub fn scan_config(&self) -> ScanConfig {
        ScanConfig {
            max_window_size: self.max_window_size,
            flush_chunk_size: self.chunk_size,
            min_fuzzy_name_len: self.min_fuzzy_len,
            fuzzy_threshold: self.fuzzy_threshold,
            name_prefix: self.name_prefix.clone(),
            meta_marker: self.meta_marker.clone(),
            ..Default::default()
        }
    }

    /// Input and output locations.
    pub fn paths(&self) -> ScanPaths {
        ScanPaths {
            catalog: self.catalog.clone(),
            model: self.model.clone(),
            dump_dir: self.dump_dir.clone(),
            output: self.out.clone(),
        }
    }

    /// Model loading options.
    pub fn matcher_options(&self) -> MatcherOptions {
        MatcherOptions {
            disable: self
                .disable
                .iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    /// The verification command, if requested.
    pub fn verify_command(&self) -> ScanResult<Option<VerifyCommand>> {
        match (&self.verify, &self.verify_cmd) {
            (false, _) => Ok(None),
            (true, Some(command_line)) => VerifyCommand::parse(command_line).map(Some),
            (true, None) => Err(ScanError::Config(
                "--verify needs a --verify-cmd".to_string(),
            )),
        }
    }
}

/// Options for `build-model`.
#[derive(Args, Debug, Clone)]
pub struct BuildModelArgs {
    /// TSV term catalog (orpha_id, term, is_preferred)
    #[arg(long, env = "ORPHA_CATALOG", default_value = "data/ordo_terms.tsv")]
    pub catalog: PathBuf,

    /// Model directory to write
    #[arg(long, env = "ORPHA_MODEL", default_value = "models/model_rare_disease")]
    pub model: PathBuf,
}
