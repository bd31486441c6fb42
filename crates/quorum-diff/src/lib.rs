//! Unified diff parsing into the Quorum change model.
//!
//! Converts `git diff` / `git format-patch` style text into ordered
//! [`quorum_core::FileChange`] records with per-line old/new numbering,
//! ready to be fanned out to review agents.

pub mod parser;

pub use parser::parse_unified_diff;
