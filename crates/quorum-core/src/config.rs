use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::QuorumError;

/// Top-level configuration loaded from `.quorum.toml`.
///
/// # Examples
///
/// ```
/// use quorum_core::QuorumConfig;
///
/// let config = QuorumConfig::default();
/// assert_eq!(config.dispatch.agent_timeout_secs, 60);
/// assert_eq!(config.dedup.line_tolerance, 1);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuorumConfig {
    /// LLM provider settings shared by all agents.
    #[serde(default)]
    pub llm: LlmConfig,
    /// Concurrency, timeout, and retry settings.
    #[serde(default)]
    pub dispatch: DispatchConfig,
    /// Finding deduplication parameters.
    #[serde(default)]
    pub dedup: DedupConfig,
    /// Per-agent prompt template overrides.
    #[serde(default)]
    pub prompts: PromptsConfig,
    /// What to return when every agent fails.
    #[serde(default)]
    pub on_all_agents_failed: DegradedMode,
}

impl QuorumConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`QuorumError::Io`] if the file cannot be read, or
    /// [`QuorumError::Toml`] if the content is not valid TOML.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use quorum_core::QuorumConfig;
    /// use std::path::Path;
    ///
    /// let config = QuorumConfig::from_file(Path::new(".quorum.toml")).unwrap();
    /// ```
    pub fn from_file(path: &Path) -> Result<Self, QuorumError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`QuorumError::Toml`] if parsing fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use quorum_core::QuorumConfig;
    ///
    /// let toml = r#"
    /// [dispatch]
    /// agent_timeout_secs = 30
    /// "#;
    /// let config = QuorumConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.dispatch.agent_timeout_secs, 30);
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, QuorumError> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }
}

/// LLM provider configuration.
///
/// # Examples
///
/// ```
/// use quorum_core::LlmConfig;
///
/// let config = LlmConfig::default();
/// assert_eq!(config.model, "gpt-4o-mini");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider name (e.g. `"openai"`, `"ollama"`).
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Model identifier.
    #[serde(default = "default_model")]
    pub model: String,
    /// API key for the provider.
    pub api_key: Option<String>,
    /// Custom base URL for API requests.
    pub base_url: Option<String>,
}

fn default_provider() -> String {
    "openai".into()
}

fn default_model() -> String {
    "gpt-4o-mini".into()
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            api_key: None,
            base_url: None,
        }
    }
}

/// Dispatcher concurrency and failure-handling settings.
///
/// Set `max_retries = 0` to run each agent exactly once.
///
/// # Examples
///
/// ```
/// use quorum_core::DispatchConfig;
///
/// let config = DispatchConfig::default();
/// assert_eq!(config.max_retries, 1);
/// assert_eq!(config.retry_backoff_ms, 500);
/// assert!(config.request_timeout_secs.is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Per-agent timeout in seconds (default: 60).
    #[serde(default = "default_agent_timeout")]
    pub agent_timeout_secs: u64,
    /// Optional overall deadline for one review request.
    pub request_timeout_secs: Option<u64>,
    /// Retries for a failed agent invocation (default: 1).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Fixed backoff between retries in milliseconds (default: 500).
    #[serde(default = "default_retry_backoff")]
    pub retry_backoff_ms: u64,
}

fn default_agent_timeout() -> u64 {
    60
}

fn default_max_retries() -> u32 {
    1
}

fn default_retry_backoff() -> u64 {
    500
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            agent_timeout_secs: default_agent_timeout(),
            request_timeout_secs: None,
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff(),
        }
    }
}

/// Deduplication parameters.
///
/// Two findings are duplicates when they name the same file and category,
/// sit within `line_tolerance` lines of each other, and their messages
/// overlap by at least `similarity_threshold`.
///
/// # Examples
///
/// ```
/// use quorum_core::DedupConfig;
///
/// let config = DedupConfig::default();
/// assert_eq!(config.similarity_threshold, 0.8);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DedupConfig {
    /// Line distance treated as "same location" (default: 1).
    #[serde(default = "default_line_tolerance")]
    pub line_tolerance: u32,
    /// Token-overlap ratio above which messages match (default: 0.8).
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,
}

fn default_line_tolerance() -> u32 {
    1
}

fn default_similarity_threshold() -> f64 {
    0.8
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            line_tolerance: default_line_tolerance(),
            similarity_threshold: default_similarity_threshold(),
        }
    }
}

/// Optional per-agent prompt template overrides.
///
/// Loaded once at startup and passed into agents as immutable
/// configuration; a `None` field falls back to the built-in prompt.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptsConfig {
    /// Override for the logic agent's system prompt.
    pub logic: Option<String>,
    /// Override for the security agent's system prompt.
    pub security: Option<String>,
    /// Override for the performance agent's system prompt.
    pub performance: Option<String>,
    /// Override for the readability agent's system prompt.
    pub readability: Option<String>,
}

/// Behavior when every agent in a dispatch failed.
///
/// # Examples
///
/// ```
/// use quorum_core::DegradedMode;
///
/// assert_eq!(DegradedMode::default(), DegradedMode::Empty);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DegradedMode {
    /// Return a well-formed outcome with zero comments.
    #[default]
    Empty,
    /// Surface a request-level degraded-service error.
    Error,
}
