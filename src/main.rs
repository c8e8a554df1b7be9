use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Parser;

use githarvest::config::Config;
use githarvest::extractor::Git;

/// Extract git commit history as uniform, timestamped record envelopes
#[derive(Parser, Debug)]
#[command(name = "githarvest", version)]
struct Cli {
    /// URI of the repository to fetch (also the default record origin)
    uri: String,

    /// Directory for the local working copy (defaults under the data dir)
    #[arg(long, value_name = "DIR", env = "GITHARVEST_GIT_PATH")]
    git_path: Option<PathBuf>,

    /// Parse a pre-recorded `git log` output file instead of a live repository
    #[arg(long, value_name = "FILE", conflicts_with = "git_path")]
    git_log: Option<PathBuf>,

    /// Origin recorded in the envelopes (defaults to the URI)
    #[arg(long)]
    origin: Option<String>,

    /// Only yield commits committed strictly after this RFC 3339 date
    #[arg(long, value_name = "DATE")]
    from_date: Option<DateTime<Utc>>,

    /// Path to a TOML configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    tracing::info!(
        "githarvest {} ({}, built {})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_COMMIT_HASH"),
        env!("BUILD_TIMESTAMP")
    );

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load_or_default()?,
    };

    let gitpath = cli
        .git_log
        .clone()
        .or_else(|| cli.git_path.clone())
        .unwrap_or_else(|| config.repo_dir_for(&cli.uri));

    let git = Git::with_origin(&cli.uri, gitpath, cli.origin.clone());

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for record in git.fetch(cli.from_date)? {
        let record = record?;
        serde_json::to_writer(&mut out, &record)?;
        out.write_all(b"\n")?;
    }

    Ok(())
}
