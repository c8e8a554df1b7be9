//! # githarvest - Git History Extraction and Record Normalization
//!
//! Retrieves commit history from git repositories and normalizes every
//! commit into a uniform, timestamped record envelope for downstream
//! storage and analysis.
//!
//! ## Overview
//!
//! A fetch keeps a local working copy in step with its remote (clone on
//! first use, fast-forward reset afterwards - never a merge), streams the
//! raw history listing out of a `git log` process, and runs it through a
//! strict finite-state parser. Each parsed commit is wrapped in an envelope
//! carrying the source origin, a deterministic identifier, and the
//! committer timestamp in UTC epoch seconds. A pre-recorded history file
//! can stand in for a live repository.
//!
//! Data flows one way:
//!
//! ```text
//! GitRepository ──lines──> LogParser ──commits──> Git ──envelopes──> sink
//! ```
//!
//! Commit messages survive encoding corruption: bytes that are not valid
//! UTF-8 are escaped reversibly instead of dropping the commit, and a stray
//! carriage return inside a message is content, not a line terminator.
//!
//! ## Usage Example
//!
//! ```no_run
//! use githarvest::extractor::Git;
//!
//! fn main() -> anyhow::Result<()> {
//!     let git = Git::new("https://example.com/project.git", "/tmp/project");
//!     for record in git.fetch(None)? {
//!         let record = record?;
//!         println!("{} {}", record.uuid, record.data.hash);
//!     }
//!     Ok(())
//! }
//! ```

/// Configuration management with environment variable overrides
pub mod config;

/// Commit-header date parsing and epoch conversion
pub mod dates;

/// Reversible byte escaping and LF-only line splitting
pub mod encoding;

/// Error types and utilities
pub mod error;

/// Commit extraction into record envelopes
pub mod extractor;

/// Finite-state parser for raw history listings
pub mod parser;

/// Path normalization and utility functions
pub mod paths;

/// Working-copy synchronization and history streaming
pub mod repository;

/// Commit records, file changes, and the record envelope
pub mod types;
