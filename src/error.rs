/// Centralized error types for githarvest using thiserror
///
/// Provides domain-specific error types for better error handling and user-facing messages.
use thiserror::Error;

/// Main error type for the extraction pipeline
#[derive(Error, Debug)]
pub enum HarvestError {
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while synchronizing or querying a local working copy
///
/// Always fatal to the in-progress fetch and never retried. Diagnostic
/// output from a failed git invocation is preserved verbatim.
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("git repository '{path}' does not exist")]
    NotFound { path: String },

    #[error("git command - {diagnostics}")]
    CommandFailed { diagnostics: String },

    #[error("failed to run git: {0}")]
    Spawn(#[source] std::io::Error),
}

/// Raised when a log line matches no grammar for the parser's current state
///
/// Carries the 1-based line number and the offending content; the parser
/// never skips or guesses.
#[derive(Error, Debug)]
#[error("{expected} expected on line {line}: '{content}'")]
pub struct ParseError {
    pub line: usize,
    pub content: String,
    pub expected: &'static str,
}

/// Errors related to configuration loading
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Result type alias using HarvestError
pub type Result<T> = std::result::Result<T, HarvestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_not_found() {
        let err = RepositoryError::NotFound {
            path: "/tmp/norepo".to_string(),
        };
        assert_eq!(err.to_string(), "git repository '/tmp/norepo' does not exist");
    }

    #[test]
    fn test_repository_error_command_failed() {
        let err = RepositoryError::CommandFailed {
            diagnostics: "fatal: repository '/tmp/src' does not exist".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "git command - fatal: repository '/tmp/src' does not exist"
        );
    }

    #[test]
    fn test_parse_error_display() {
        let err = ParseError {
            line: 10,
            content: "garbage".to_string(),
            expected: "commit",
        };
        assert_eq!(err.to_string(), "commit expected on line 10: 'garbage'");
    }

    #[test]
    fn test_error_chain() {
        let parse_err = ParseError {
            line: 1,
            content: "x".to_string(),
            expected: "commit",
        };
        let err: HarvestError = parse_err.into();
        assert!(matches!(err, HarvestError::Parse(_)));
        assert_eq!(err.to_string(), "Parse error: commit expected on line 1: 'x'");
    }
}
