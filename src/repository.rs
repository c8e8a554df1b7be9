//! Local working-copy synchronization and raw history streaming
//!
//! All history access goes through the `git` binary so that the diagnostics
//! of a failed command reach the caller verbatim. The working copy persists
//! on disk across invocations and is mutated only by [`GitRepository::clone`]
//! (creates) and [`GitRepository::update`] (fast-forward reset, never a
//! merge). Concurrent use of the same working-copy path is not supported;
//! callers serialize access per path.

use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, ExitStatus, Stdio};
use std::thread::JoinHandle;

use chrono::{DateTime, Utc};

use crate::encoding::ByteLines;
use crate::error::{HarvestError, RepositoryError};

const GIT_BIN: &str = "git";

/// Format for the server-side `--since` bound, always rendered in UTC.
const SINCE_FORMAT: &str = "%Y-%m-%d %H:%M:%S +0000";

/// A local working copy of a remote (or local) repository
#[derive(Debug)]
pub struct GitRepository {
    pub uri: String,
    pub dirpath: PathBuf,
}

impl GitRepository {
    /// Open an existing working copy.
    ///
    /// Fails when `dirpath` does not hold a valid git metadata directory.
    pub fn new(uri: impl Into<String>, dirpath: impl Into<PathBuf>) -> Result<Self, RepositoryError> {
        let dirpath = dirpath.into();
        if !Self::exists(&dirpath) {
            return Err(RepositoryError::NotFound {
                path: dirpath.display().to_string(),
            });
        }
        Ok(Self {
            uri: uri.into(),
            dirpath,
        })
    }

    /// Whether `dirpath` contains a valid repository.
    pub fn exists(dirpath: &Path) -> bool {
        git2::Repository::open(dirpath).is_ok()
    }

    /// Clone `uri` into `dirpath`.
    ///
    /// Fails when the source is unreachable, the destination already exists,
    /// or the clone process exits non-zero; the error embeds git's own
    /// diagnostics.
    pub fn clone(uri: &str, dirpath: &Path) -> Result<Self, RepositoryError> {
        run_git(
            None,
            &["clone".into(), uri.into(), dirpath.display().to_string()],
        )?;
        tracing::info!("cloned '{}' into '{}'", uri, dirpath.display());
        Self::new(uri, dirpath)
    }

    /// Bring the working copy to exactly match the remote's current head.
    ///
    /// Fetches and force-resets, never merges, so the result is
    /// deterministic and conflict-free regardless of local drift.
    pub fn update(&self) -> Result<(), RepositoryError> {
        run_git(Some(&self.dirpath), &["fetch".into(), "origin".into()])?;
        run_git(
            Some(&self.dirpath),
            &["reset".into(), "--hard".into(), "origin/HEAD".into()],
        )?;
        tracing::info!("'{}' reset to remote head", self.dirpath.display());
        Ok(())
    }

    /// Stream the commit history as decoded lines.
    ///
    /// The listing asks for full headers, a pinned date format, decorations,
    /// parent hashes, and both the raw per-file diff and the numeric stat
    /// summary in a single invocation, oldest commit first. `since` is
    /// passed as a server-side `--since` bound; its boundary semantics are
    /// not relied upon (the extractor re-filters client-side).
    pub fn log(&self, since: Option<DateTime<Utc>>) -> Result<LogStream, RepositoryError> {
        let mut args: Vec<String> = [
            "log",
            "--reverse",
            "--topo-order",
            "--parents",
            "--raw",
            "--numstat",
            "-M",
            "-C",
            "-c",
            "--pretty=fuller",
            "--decorate=full",
            "--date=default",
            "--all",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        if let Some(since) = since {
            args.push(format!("--since={}", since.format(SINCE_FORMAT)));
        }
        tracing::debug!("streaming history of '{}'", self.dirpath.display());
        LogStream::spawn(&self.dirpath, &args)
    }
}

/// Run a git command to completion, capturing its output.
fn run_git(cwd: Option<&Path>, args: &[String]) -> Result<Vec<u8>, RepositoryError> {
    let mut cmd = Command::new(GIT_BIN);
    cmd.args(args)
        .env("LANG", "C")
        .env("PAGER", "")
        .stdin(Stdio::null());
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }
    tracing::debug!("running git {}", args.join(" "));

    let output = cmd.output().map_err(RepositoryError::Spawn)?;
    if !output.status.success() {
        return Err(RepositoryError::CommandFailed {
            diagnostics: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(output.stdout)
}

/// Lazy line stream over a running history-listing process
///
/// The child runs concurrently with the consumer draining stdout; stderr is
/// drained by a dedicated thread so a slow consumer can never deadlock the
/// child on a full pipe. Reaching end of stream waits for the child and
/// surfaces a non-zero exit as [`RepositoryError::CommandFailed`] with the
/// captured diagnostics. Dropping the stream mid-iteration kills the child.
/// No timeout is enforced; callers wanting bounded latency impose their own.
pub struct LogStream {
    child: Child,
    lines: ByteLines<BufReader<ChildStdout>>,
    stderr: Option<JoinHandle<Vec<u8>>>,
    done: bool,
}

impl LogStream {
    fn spawn(cwd: &Path, args: &[String]) -> Result<Self, RepositoryError> {
        let mut child = Command::new(GIT_BIN)
            .args(args)
            .current_dir(cwd)
            .env("LANG", "C")
            .env("PAGER", "")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(RepositoryError::Spawn)?;

        // Both pipes were requested above, so the handles are present.
        let stdout = child.stdout.take().expect("stdout is piped");
        let mut stderr_pipe = child.stderr.take().expect("stderr is piped");
        let stderr = std::thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = stderr_pipe.read_to_end(&mut buf);
            buf
        });

        Ok(Self {
            child,
            lines: ByteLines::new(BufReader::new(stdout)),
            stderr: Some(stderr),
            done: false,
        })
    }

    /// Wait for the child after its output is exhausted.
    fn finish(&mut self) -> Result<ExitStatus, RepositoryError> {
        let status = self.child.wait().map_err(RepositoryError::Spawn)?;
        if !status.success() {
            let diagnostics = self
                .stderr
                .take()
                .and_then(|handle| handle.join().ok())
                .unwrap_or_default();
            return Err(RepositoryError::CommandFailed {
                diagnostics: String::from_utf8_lossy(&diagnostics).trim().to_string(),
            });
        }
        Ok(status)
    }
}

impl Iterator for LogStream {
    type Item = Result<String, HarvestError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.lines.next() {
            Some(Ok(line)) => Some(Ok(line)),
            Some(Err(err)) => {
                self.done = true;
                let _ = self.child.kill();
                Some(Err(err.into()))
            }
            None => {
                self.done = true;
                match self.finish() {
                    Ok(_) => None,
                    Err(err) => Some(Err(err.into())),
                }
            }
        }
    }
}

impl Drop for LogStream {
    fn drop(&mut self) {
        if !self.done {
            // Abandoned mid-iteration: terminate rather than leak.
            let _ = self.child.kill();
        }
        let _ = self.child.wait();
        if let Some(handle) = self.stderr.take() {
            let _ = handle.join();
        }
    }
}
