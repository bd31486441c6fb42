//! Core types, configuration, and error handling for the Quorum reviewer.
//!
//! This crate provides the shared foundation used by the other Quorum
//! crates:
//! - [`QuorumError`] — unified error type using `thiserror`
//! - [`QuorumConfig`] — configuration loaded from `.quorum.toml`
//! - The change model: [`FileChange`], [`DiffHunk`], [`DiffLine`]
//! - Review types: [`Finding`], [`AnalysisResult`], [`ReviewOutcome`]

mod config;
mod error;
mod types;

pub use config::{
    DedupConfig, DegradedMode, DispatchConfig, LlmConfig, PromptsConfig, QuorumConfig,
};
pub use error::QuorumError;
pub use types::{
    AnalysisResult, Category, ChangeType, DiffHunk, DiffLine, FileChange, Finding, LineKind,
    OutputFormat, ReviewOutcome, ReviewSummary, Severity,
};

/// A convenience `Result` type for Quorum operations.
pub type Result<T> = std::result::Result<T, QuorumError>;
