//! # orpha-cli
//!
//! Command-line front end for the rare-disease subreddit scanner.
//!
//! The `find-candidates` binary scans subreddit metadata archives by default
//! and writes `subreddit,orpha_ids` rows. The `build-model` subcommand compiles
//! a term catalog into the entity-matching model directory the scan loads.
//! Every option can also be set through an `ORPHA_*` environment variable.

#![warn(missing_docs)]

pub mod args;
pub mod commands;

pub use args::{BuildModelArgs, Cli, Command, ScanArgs};
pub use commands::{run_build_model, run_scan};
