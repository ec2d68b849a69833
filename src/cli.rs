// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::defaults;

/// Command-line arguments for `distmake`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "distmake",
    version,
    about = "Run a Makefile's tasks across a fixed pool of worker nodes.",
    long_about = None
)]
pub struct CliArgs {
    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `DISTMAKE_LOG` or a default level will be used.
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Build the task graph and execute it on the node pool.
    Run(RunArgs),
    /// Serve remote execution requests.
    Worker(WorkerArgs),
    /// Split an input file into parts for the word-count workflow.
    Split(SplitArgs),
}

#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    /// Node list, e.g. "[localhost,worker-2:3001]". The first node is the
    /// master.
    #[arg(long, value_name = "NODES")]
    pub nodes: String,

    #[arg(long, value_name = "PATH", default_value = "Makefile")]
    pub makefile: PathBuf,

    /// Settings file (TOML). Default: `Distmake.toml` if it exists.
    #[arg(long, value_name = "PATH")]
    pub settings: Option<PathBuf>,

    /// Parse and validate, print the pool and graph, but run nothing.
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Clone, Args)]
pub struct WorkerArgs {
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, default_value_t = defaults::DEFAULT_PORT)]
    pub port: u16,
}

#[derive(Debug, Clone, Args)]
pub struct SplitArgs {
    pub input: PathBuf,

    #[arg(long)]
    pub parts: usize,

    #[arg(long, default_value = "part")]
    pub prefix: String,

    #[arg(long, value_name = "DIR", default_value = ".")]
    pub out_dir: PathBuf,

    /// Also write a word-count Makefile for the parts to this path.
    #[arg(long, value_name = "PATH")]
    pub emit_makefile: Option<PathBuf>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
