//! Commit records, file-change entries, and the record envelope

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A single commit parsed from the history listing
///
/// Header fields (`Merge`, `Author`, `AuthorDate`, `Commit`, `CommitDate`,
/// plus anything else the listing emits) are kept in a map and serialized
/// flattened into the commit object. The message preserves embedded blank
/// lines and original line breaks; it carries no trailing newline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commit {
    /// Full commit hash (40 lowercase hex characters)
    #[serde(rename = "commit")]
    pub hash: String,
    /// Parent hashes in listed order: 0 for root commits, 2+ for merges
    pub parents: Vec<String>,
    /// Ref annotations from the decoration, possibly empty
    pub refs: Vec<String>,
    /// Header fields as emitted by the history command
    #[serde(flatten)]
    pub headers: BTreeMap<String, String>,
    /// Free-form commit message, possibly empty
    pub message: String,
    /// File changes in listed order
    pub files: Vec<FileChange>,
}

/// One changed file within a commit
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FileChange {
    /// File path
    pub file: String,
    /// New path, present only for detected renames and copies
    #[serde(skip_serializing_if = "Option::is_none")]
    pub newfile: Option<String>,
    /// Added line count; absent when not computable (binary files)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub added: Option<u64>,
    /// Removed line count; absent when not computable (binary files)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub removed: Option<u64>,
    /// File mode strings (old, new, ...) from the raw action line
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modes: Vec<String>,
    /// Blob index strings from the raw action line
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub indexes: Vec<String>,
    /// Action code (`M`, `A`, `D`, `R100`, `MR`, ...); absent for entries
    /// seen only on a line-count line
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

/// Uniform wrapper applied to every extracted commit
///
/// This is the shape the downstream replay cache consumes. It is created
/// once per commit and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordEnvelope {
    /// The commit record itself
    pub data: Commit,
    /// Name of the source repository
    pub origin: String,
    /// Deterministic identifier, a pure function of (origin, commit hash)
    pub uuid: String,
    /// Committer date as UTC epoch seconds
    pub updated_on: f64,
}

/// Deterministic envelope identifier for an (origin, commit hash) pair.
///
/// SHA-256 over `"{origin}:{hash}"`, lowercase hex. Stable across runs and
/// processes; no other record field influences it.
pub fn uuid(origin: &str, hash: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(origin.as_bytes());
    hasher.update(b":");
    hasher.update(hash.as_bytes());
    format!("{:x}", hasher.finalize())
}
