use std::path::PathBuf;

/// Errors that can occur across the Quorum pipeline.
///
/// Library crates use this type directly; the binary crate converts to a
/// diagnostic at the boundary. Per-agent failures are deliberately not a
/// variant here: the dispatcher records them in `AnalysisResult` and never
/// lets them escape a request.
///
/// # Examples
///
/// ```
/// use quorum_core::QuorumError;
///
/// let err = QuorumError::Parse("bad hunk header".into());
/// assert!(err.to_string().contains("bad hunk header"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum QuorumError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Malformed diff input; fatal to the request.
    #[error("malformed diff: {0}")]
    Parse(String),

    /// Agent transport or response-schema failure. Caught by the
    /// dispatcher, never surfaced past it.
    #[error("agent error: {0}")]
    Agent(String),

    /// GitHub diff fetch failure.
    #[error("github error: {0}")]
    Git(String),

    /// Every agent failed and the config asks for an error instead of an
    /// empty outcome.
    #[error("degraded review: {0}")]
    Degraded(String),

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A required file was not found.
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),
}
