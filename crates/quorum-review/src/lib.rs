//! Multi-agent review orchestration.
//!
//! Provides the review pipeline: the shared LLM client, the four
//! category-focused agents, the concurrent dispatcher with per-agent
//! timeout and failure isolation, the finding aggregator, and the GitHub
//! PR diff fetcher.

pub mod agent;
pub mod aggregate;
pub mod dispatch;
pub mod github;
pub mod llm;
pub mod pipeline;
pub mod prompt;
