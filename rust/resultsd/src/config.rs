//! Startup configuration for the sidecar.

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Results data sidecar: JSON-lines requests on stdin, responses on stdout.
#[derive(Debug, Parser)]
#[command(name = "resultsd")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Workspace directory to open at startup
    #[arg(short, long, env = "RESULTSD_WORKSPACE")]
    pub workspace: Option<PathBuf>,

    /// Log filter directive (e.g. "info", "resultsd=debug")
    #[arg(long = "log", env = "RESULTSD_LOG", default_value = "info")]
    pub log_filter: String,

    /// Shorthand for --log debug
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    pub fn env_filter(&self) -> EnvFilter {
        if self.verbose {
            return EnvFilter::new("debug");
        }
        EnvFilter::try_new(&self.log_filter).unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

/// Logs go to stderr; stdout carries the protocol.
pub fn init_logging(config: &Config) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(config.env_filter())
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init();
}
