//! Streaming parser for `git log --raw --numstat --pretty=fuller` output
//!
//! A finite-state machine over decoded lines. It has no I/O of its own: feed
//! it any lazy line sequence (a [`crate::repository::LogStream`], a static
//! log file, an in-memory vector) and it yields [`Commit`] records in input
//! order. The grammar is held in precompiled pattern constants, one per line
//! form, so each can be tested on its own.
//!
//! The machine is strict: a line that matches no grammar for the current
//! state is a [`ParseError`] with its 1-based line number and content. The
//! two deliberate tolerances live upstream in [`crate::encoding`]: invalid
//! bytes are escaped rather than fatal, and only LF terminates a line.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::encoding::ByteLines;
use crate::error::{HarvestError, ParseError};
use crate::types::{Commit, FileChange};

/// `commit <hash> [<parent> ...] [(<ref>, ...)]`
static COMMIT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^commit[ \t](?P<commit>[0-9a-f]{40})(?:[ \t](?P<parents>[0-9a-f]{40}(?:[ \t][0-9a-f]{40})*))?(?:[ \t]\((?P<refs>.+)\))?$",
    )
    .unwrap()
});

/// `<Key>: <value>` with the value's alignment padding consumed
static HEADER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<header>[A-Za-z0-9]+):[ \t]+(?P<value>.+)$").unwrap());

/// Message line: exactly four leading spaces, arbitrary (possibly empty) rest
static MESSAGE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ {4}(?P<msg>.*)$").unwrap());

/// Raw file-action line, variable arity for merge commits
///
/// Older git pads abbreviated blob names with `...` for alignment; newer
/// versions emit them bare. Both forms are accepted.
static ACTION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^:+(?P<modes>(?:\d{6}[ \t])+)(?P<indexes>(?:[0-9a-f]+(?:\.{3})?[ \t])+)(?P<action>[^\t]+)\t+(?P<file>[^\t]+)(?:\t+(?P<newfile>.+))?$",
    )
    .unwrap()
});

/// Line-count line; `-` marks counts git could not compute
static STATS_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<added>\d+|-)[ \t]+(?P<removed>\d+|-)[ \t]+(?P<file>.+)$").unwrap()
});

/// Parser state: which line grammars are legal next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Between commits (start of stream, or after a file list closed on a
    /// blank line); only a commit line or another blank is legal
    ExpectingCommit,
    /// Header lines accumulate; a blank line opens the message
    InHeader,
    /// Four-space message lines accumulate; a blank line opens the file list
    InMessage,
    /// Raw action and line-count lines accumulate; a blank line or the next
    /// commit line finalizes the record
    InFileList,
}

/// A raw action line, kept until the record is finalized
struct RawAction {
    modes: Vec<String>,
    indexes: Vec<String>,
    action: String,
    file: String,
    newfile: Option<String>,
}

/// A line-count line, kept until the record is finalized
struct StatLine {
    added: Option<u64>,
    removed: Option<u64>,
    file: String,
}

/// Accumulation window for the commit currently being parsed
struct PartialCommit {
    hash: String,
    parents: Vec<String>,
    refs: Vec<String>,
    headers: BTreeMap<String, String>,
    message_lines: Vec<String>,
    // The raw-action and line-count streams describe renames in different
    // notations, so they correlate by position, never by path text.
    actions: Vec<RawAction>,
    stats: Vec<StatLine>,
}

impl PartialCommit {
    fn from_captures(caps: &regex::Captures<'_>) -> Self {
        let parents = caps
            .name("parents")
            .map(|m| m.as_str().split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();
        let refs = caps
            .name("refs")
            .map(|m| m.as_str().split(", ").map(str::to_string).collect())
            .unwrap_or_default();
        Self {
            hash: caps["commit"].to_string(),
            parents,
            refs,
            headers: BTreeMap::new(),
            message_lines: Vec::new(),
            actions: Vec::new(),
            stats: Vec::new(),
        }
    }

    fn finish(self) -> Commit {
        let mut files = Vec::with_capacity(self.actions.len().max(self.stats.len()));
        let mut actions = self.actions.into_iter();
        let mut stats = self.stats.into_iter();
        loop {
            match (actions.next(), stats.next()) {
                (Some(action), stat) => {
                    let mut change = FileChange {
                        file: action.file,
                        newfile: action.newfile,
                        modes: action.modes,
                        indexes: action.indexes,
                        action: Some(action.action),
                        ..Default::default()
                    };
                    if let Some(stat) = stat {
                        change.added = stat.added;
                        change.removed = stat.removed;
                    }
                    files.push(change);
                }
                (None, Some(stat)) => files.push(FileChange {
                    file: stat.file,
                    added: stat.added,
                    removed: stat.removed,
                    ..Default::default()
                }),
                (None, None) => break,
            }
        }

        Commit {
            hash: self.hash,
            parents: self.parents,
            refs: self.refs,
            headers: self.headers,
            message: self.message_lines.join("\n"),
            files,
        }
    }
}

/// Lazy commit iterator over a line sequence
///
/// Finite and not restartable: a fresh parse requires a fresh input stream.
/// The first error ends the sequence; records yielded before it stay valid.
pub struct LogParser<I> {
    lines: I,
    state: State,
    current: Option<PartialCommit>,
    nline: usize,
    done: bool,
}

impl<I> LogParser<I>
where
    I: Iterator<Item = Result<String, HarvestError>>,
{
    pub fn new(lines: I) -> Self {
        Self {
            lines,
            state: State::ExpectingCommit,
            current: None,
            nline: 0,
            done: false,
        }
    }

    fn error(&self, expected: &'static str, line: &str) -> ParseError {
        ParseError {
            line: self.nline,
            content: line.to_string(),
            expected,
        }
    }

    /// Start a new record, handing back the finished previous one, if any.
    fn start_commit(&mut self, caps: &regex::Captures<'_>) -> Option<Commit> {
        let finished = self.current.take().map(PartialCommit::finish);
        self.current = Some(PartialCommit::from_captures(caps));
        self.state = State::InHeader;
        finished
    }

    fn handle_line(&mut self, line: &str) -> Result<Option<Commit>, ParseError> {
        match self.state {
            State::ExpectingCommit => {
                if line.is_empty() {
                    Ok(None)
                } else if let Some(caps) = COMMIT_PATTERN.captures(line) {
                    Ok(self.start_commit(&caps))
                } else {
                    Err(self.error("commit", line))
                }
            }
            State::InHeader => {
                if line.is_empty() {
                    self.state = State::InMessage;
                    Ok(None)
                } else if let Some(caps) = HEADER_PATTERN.captures(line) {
                    if let Some(commit) = self.current.as_mut() {
                        commit
                            .headers
                            .insert(caps["header"].to_string(), caps["value"].to_string());
                    }
                    Ok(None)
                } else {
                    Err(self.error("header", line))
                }
            }
            State::InMessage => {
                if line.is_empty() {
                    self.state = State::InFileList;
                    Ok(None)
                } else if let Some(caps) = MESSAGE_PATTERN.captures(line) {
                    if let Some(commit) = self.current.as_mut() {
                        commit.message_lines.push(caps["msg"].to_string());
                    }
                    Ok(None)
                } else {
                    Err(self.error("message", line))
                }
            }
            State::InFileList => {
                if line.is_empty() {
                    self.state = State::ExpectingCommit;
                    Ok(None)
                } else if let Some(caps) = ACTION_PATTERN.captures(line) {
                    if let Some(commit) = self.current.as_mut() {
                        commit.actions.push(RawAction {
                            modes: caps["modes"].split_whitespace().map(str::to_string).collect(),
                            indexes: caps["indexes"]
                                .split_whitespace()
                                .map(str::to_string)
                                .collect(),
                            action: caps["action"].to_string(),
                            file: caps["file"].to_string(),
                            newfile: caps.name("newfile").map(|m| m.as_str().to_string()),
                        });
                    }
                    Ok(None)
                } else if let Some(caps) = STATS_PATTERN.captures(line) {
                    if let Some(commit) = self.current.as_mut() {
                        commit.stats.push(StatLine {
                            added: caps["added"].parse().ok(),
                            removed: caps["removed"].parse().ok(),
                            file: caps["file"].to_string(),
                        });
                    }
                    Ok(None)
                } else if let Some(caps) = COMMIT_PATTERN.captures(line) {
                    Ok(self.start_commit(&caps))
                } else {
                    Err(self.error("file or commit", line))
                }
            }
        }
    }
}

impl<I> Iterator for LogParser<I>
where
    I: Iterator<Item = Result<String, HarvestError>>,
{
    type Item = Result<Commit, HarvestError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            match self.lines.next() {
                None => {
                    self.done = true;
                    let commit = self.current.take().map(PartialCommit::finish);
                    if let Some(commit) = &commit {
                        tracing::debug!("parsed commit {}", commit.hash);
                    }
                    return commit.map(Ok);
                }
                Some(Err(err)) => {
                    self.done = true;
                    return Some(Err(err));
                }
                Some(Ok(line)) => {
                    self.nline += 1;
                    match self.handle_line(&line) {
                        Ok(Some(commit)) => {
                            tracing::debug!("parsed commit {}", commit.hash);
                            return Some(Ok(commit));
                        }
                        Ok(None) => {}
                        Err(err) => {
                            self.done = true;
                            return Some(Err(err.into()));
                        }
                    }
                }
            }
        }
    }
}

/// Parse a static history file, LF-split and escape-decoded.
pub fn parse_file(
    path: &Path,
) -> Result<LogParser<impl Iterator<Item = Result<String, HarvestError>>>, HarvestError> {
    let file = File::open(path)?;
    let lines = ByteLines::new(BufReader::new(file)).map(|line| line.map_err(HarvestError::from));
    Ok(LogParser::new(lines))
}
