//! Commit extraction: synchronizer + parser orchestrated into envelopes
//!
//! A [`Git`] extractor names a source URI and a local path. When the path is
//! a repository location, fetching clones it on first use and fast-forwards
//! it afterwards; when it is a regular file, the file is read as a static
//! history listing instead. Either way the raw line stream runs through the
//! log parser and every commit is wrapped in a [`RecordEnvelope`].

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::dates;
use crate::error::HarvestError;
use crate::parser::{self, LogParser};
use crate::repository::GitRepository;
use crate::types::{uuid, Commit, RecordEnvelope};

/// Header carrying the committer date the envelope timestamp derives from.
const COMMIT_DATE_HEADER: &str = "CommitDate";

/// Extractor for one repository (or one static history file)
#[derive(Debug, Clone)]
pub struct Git {
    uri: String,
    gitpath: PathBuf,
    origin: String,
}

impl Git {
    /// Create an extractor whose records carry the URI as their origin.
    pub fn new(uri: impl Into<String>, gitpath: impl Into<PathBuf>) -> Self {
        Self::with_origin(uri, gitpath, None)
    }

    /// Create an extractor with an explicit origin.
    ///
    /// An empty or absent origin falls back to the URI.
    pub fn with_origin(
        uri: impl Into<String>,
        gitpath: impl Into<PathBuf>,
        origin: Option<String>,
    ) -> Self {
        let uri = uri.into();
        let origin = match origin {
            Some(origin) if !origin.is_empty() => origin,
            _ => uri.clone(),
        };
        Self {
            uri,
            gitpath: gitpath.into(),
            origin,
        }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn gitpath(&self) -> &Path {
        &self.gitpath
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Fetch commits as record envelopes, lazily.
    ///
    /// With `since`, only records whose committer timestamp is strictly
    /// greater than the bound are yielded. The bound is also forwarded to
    /// the history command as a server-side filter, but that filter's
    /// boundary behavior is not relied upon; this client-side re-filter is
    /// the tested semantic (exclusive lower bound, UTC-normalized).
    ///
    /// Live-fetch order is the history command's order (oldest first);
    /// static-file order is file order. Any synchronizer or parser failure
    /// propagates unmodified and ends the sequence; envelopes already
    /// yielded stay valid, and nothing is retried.
    pub fn fetch(
        &self,
        since: Option<DateTime<Utc>>,
    ) -> Result<impl Iterator<Item = Result<RecordEnvelope, HarvestError>> + use<'_>, HarvestError>
    {
        let commits: Box<dyn Iterator<Item = Result<Commit, HarvestError>>> =
            if self.gitpath.is_file() {
                tracing::info!("parsing static history file '{}'", self.gitpath.display());
                Box::new(parser::parse_file(&self.gitpath)?)
            } else {
                let repository = self.sync_repository()?;
                tracing::info!("fetching commits from '{}'", self.origin);
                Box::new(LogParser::new(repository.log(since)?))
            };

        let origin = self.origin.clone();
        let bound = since.map(|date| date.timestamp() as f64);
        Ok(commits.filter_map(move |item| match item {
            Err(err) => Some(Err(err)),
            Ok(commit) => match envelope(&origin, commit) {
                Err(err) => Some(Err(err)),
                Ok(record) => {
                    if let Some(bound) = bound {
                        if record.updated_on <= bound {
                            return None;
                        }
                    }
                    Some(Ok(record))
                }
            },
        }))
    }

    /// Ensure the working copy exists and matches the remote head.
    fn sync_repository(&self) -> Result<GitRepository, HarvestError> {
        let repository = if GitRepository::exists(&self.gitpath) {
            GitRepository::new(&self.uri, &self.gitpath)?
        } else {
            GitRepository::clone(&self.uri, &self.gitpath)?
        };
        repository.update()?;
        Ok(repository)
    }
}

/// Wrap one commit: identifier, origin, committer timestamp, payload.
fn envelope(origin: &str, commit: Commit) -> Result<RecordEnvelope, HarvestError> {
    let date = commit.headers.get(COMMIT_DATE_HEADER).ok_or_else(|| {
        HarvestError::InvalidDate(format!(
            "commit {} has no {} header",
            commit.hash, COMMIT_DATE_HEADER
        ))
    })?;
    let parsed = dates::parse_commit_date(date)?;
    Ok(RecordEnvelope {
        uuid: uuid(origin, &commit.hash),
        origin: origin.to_string(),
        updated_on: dates::epoch_seconds(&parsed),
        data: commit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn commit_with_date(hash: &str, date: &str) -> Commit {
        let mut headers = BTreeMap::new();
        headers.insert("CommitDate".to_string(), date.to_string());
        Commit {
            hash: hash.to_string(),
            parents: vec![],
            refs: vec![],
            headers,
            message: String::new(),
            files: vec![],
        }
    }

    #[test]
    fn test_origin_falls_back_to_uri() {
        let git = Git::new("http://example.com", "/tmp/repo");
        assert_eq!(git.origin(), "http://example.com");

        let git = Git::with_origin("http://example.com", "/tmp/repo", Some(String::new()));
        assert_eq!(git.origin(), "http://example.com");

        let git = Git::with_origin("http://example.com", "/tmp/repo", Some("test".to_string()));
        assert_eq!(git.origin(), "test");
    }

    #[test]
    fn test_envelope_fields() {
        let commit = commit_with_date(
            "456a68ee1407a77f3e804a30dff245bb6c6b872f",
            "Tue Feb 11 22:10:39 2014 -0800",
        );
        let record = envelope("http://example.com", commit).unwrap();
        assert_eq!(record.origin, "http://example.com");
        assert_eq!(record.updated_on, 1392185439.0);
        assert_eq!(
            record.uuid,
            uuid("http://example.com", "456a68ee1407a77f3e804a30dff245bb6c6b872f")
        );
    }

    #[test]
    fn test_envelope_requires_commit_date() {
        let mut commit = commit_with_date("456a68ee1407a77f3e804a30dff245bb6c6b872f", "x");
        commit.headers.clear();
        let err = envelope("o", commit).unwrap_err();
        assert!(matches!(err, HarvestError::InvalidDate(_)));
    }
}
