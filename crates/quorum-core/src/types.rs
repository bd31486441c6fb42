use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Classification of a single line inside a diff hunk.
///
/// # Examples
///
/// ```
/// use quorum_core::LineKind;
///
/// let kind: LineKind = serde_json::from_str("\"added\"").unwrap();
/// assert_eq!(kind, LineKind::Added);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineKind {
    /// Line present only in the new version.
    Added,
    /// Line present only in the old version.
    Removed,
    /// Line unchanged between versions.
    Context,
}

/// One line of a diff hunk with its position in both file versions.
///
/// Removed and context lines carry an old line number; added and context
/// lines carry a new line number.
///
/// # Examples
///
/// ```
/// use quorum_core::{DiffLine, LineKind};
///
/// let line = DiffLine {
///     kind: LineKind::Added,
///     content: "let x = 1;".into(),
///     old_line: None,
///     new_line: Some(12),
/// };
/// assert!(line.old_line.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffLine {
    /// Added, removed, or context.
    pub kind: LineKind,
    /// Line content without the leading `+`/`-`/space marker.
    pub content: String,
    /// Line number in the old version, if the line exists there.
    pub old_line: Option<u32>,
    /// Line number in the new version, if the line exists there.
    pub new_line: Option<u32>,
}

/// A single hunk from a unified diff.
///
/// Invariant: removed + context lines total `old_count`, and added +
/// context lines total `new_count`.
///
/// # Examples
///
/// ```
/// use quorum_core::DiffHunk;
///
/// let hunk = DiffHunk {
///     old_start: 10,
///     old_count: 5,
///     new_start: 10,
///     new_count: 8,
///     lines: vec![],
/// };
/// assert_eq!(hunk.new_count, 8);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffHunk {
    /// Starting line in the old version.
    pub old_start: u32,
    /// Number of old-side lines covered by the hunk.
    pub old_count: u32,
    /// Starting line in the new version.
    pub new_start: u32,
    /// Number of new-side lines covered by the hunk.
    pub new_count: u32,
    /// Lines in hunk order.
    pub lines: Vec<DiffLine>,
}

/// Classification of a file-level change.
///
/// # Examples
///
/// ```
/// use quorum_core::ChangeType;
///
/// assert_eq!(format!("{}", ChangeType::Renamed), "renamed");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    /// Newly created file.
    Added,
    /// Existing file edited in place.
    Modified,
    /// File removed.
    Deleted,
    /// File moved or renamed.
    Renamed,
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeType::Added => write!(f, "added"),
            ChangeType::Modified => write!(f, "modified"),
            ChangeType::Deleted => write!(f, "deleted"),
            ChangeType::Renamed => write!(f, "renamed"),
        }
    }
}

/// All changes to one file within a diff.
///
/// Binary files carry no hunks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    /// Path in the old version.
    pub old_path: PathBuf,
    /// Path in the new version.
    pub new_path: PathBuf,
    /// File-level classification.
    pub change_type: ChangeType,
    /// Parsed hunks in diff order.
    pub hunks: Vec<DiffHunk>,
    /// Whether the diff marked this file as binary.
    pub is_binary: bool,
}

impl FileChange {
    /// The path a finding should be reported against: the old path for a
    /// deletion, the new path otherwise.
    pub fn display_path(&self) -> &PathBuf {
        match self.change_type {
            ChangeType::Deleted => &self.old_path,
            _ => &self.new_path,
        }
    }
}

impl fmt::Display for FileChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}, {} hunks)",
            self.display_path().display(),
            self.change_type,
            self.hunks.len()
        )
    }
}

/// Finding severity level.
///
/// # Examples
///
/// ```
/// use quorum_core::Severity;
///
/// let s: Severity = serde_json::from_str("\"high\"").unwrap();
/// assert_eq!(s, Severity::High);
/// assert!(s.rank() < Severity::Low.rank());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Must-fix issue.
    High,
    /// Worth a close look before merging.
    Medium,
    /// Minor improvement.
    Low,
}

impl Severity {
    /// Ordinal rank: high sorts first.
    ///
    /// # Examples
    ///
    /// ```
    /// use quorum_core::Severity;
    ///
    /// assert_eq!(Severity::High.rank(), 0);
    /// assert_eq!(Severity::Low.rank(), 2);
    /// ```
    pub fn rank(self) -> u8 {
        match self {
            Severity::High => 0,
            Severity::Medium => 1,
            Severity::Low => 2,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::High => write!(f, "high"),
            Severity::Medium => write!(f, "medium"),
            Severity::Low => write!(f, "low"),
        }
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "high" => Ok(Severity::High),
            "medium" => Ok(Severity::Medium),
            "low" => Ok(Severity::Low),
            other => Err(format!("unknown severity: {other}")),
        }
    }
}

/// Review dimension an agent is responsible for.
///
/// Declaration order is the fixed agent-iteration order used everywhere a
/// deterministic sequence is required (dispatch result maps, dedup
/// tie-breaks).
///
/// # Examples
///
/// ```
/// use quorum_core::Category;
///
/// assert_eq!(Category::ALL[0], Category::Logic);
/// assert!(Category::Logic < Category::Readability);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Correctness and control-flow issues.
    Logic,
    /// Vulnerabilities, secrets, unsafe input handling.
    Security,
    /// Inefficient algorithms or resource usage.
    Performance,
    /// Naming, clarity, maintainability.
    Readability,
}

impl Category {
    /// Every category, in the canonical iteration order.
    pub const ALL: [Category; 4] = [
        Category::Logic,
        Category::Security,
        Category::Performance,
        Category::Readability,
    ];
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Logic => write!(f, "logic"),
            Category::Security => write!(f, "security"),
            Category::Performance => write!(f, "performance"),
            Category::Readability => write!(f, "readability"),
        }
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "logic" => Ok(Category::Logic),
            "security" => Ok(Category::Security),
            "performance" => Ok(Category::Performance),
            "readability" => Ok(Category::Readability),
            other => Err(format!("unknown category: {other}")),
        }
    }
}

/// A single review comment produced by one agent.
///
/// Immutable once created; aggregation copies rather than edits, except
/// for filling a missing suggestion from a discarded duplicate.
///
/// # Examples
///
/// ```
/// use quorum_core::{Category, Finding, Severity};
///
/// let finding = Finding {
///     file: "src/auth.rs".into(),
///     line: 42,
///     severity: Severity::High,
///     category: Category::Security,
///     message: "Hardcoded API key".into(),
///     suggestion: Some("Load it from the environment".into()),
///     source_agent: Category::Security,
/// };
/// assert_eq!(finding.severity, Severity::High);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    /// Path of the file being commented on.
    pub file: String,
    /// Line number in the new version of the file.
    pub line: u32,
    /// Severity of the issue.
    pub severity: Severity,
    /// Review dimension the issue falls under.
    pub category: Category,
    /// Explanation of the issue.
    pub message: String,
    /// Optional fix suggestion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// Agent that produced the finding.
    #[serde(skip_serializing)]
    pub source_agent: Category,
}

/// Terminal result of one agent invocation.
///
/// Written exactly once by the dispatcher; a failed invocation carries an
/// empty finding list and an error description.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    /// Agent category this result belongs to.
    pub category: Category,
    /// Findings from a successful invocation.
    pub findings: Vec<Finding>,
    /// Whether the invocation completed and validated.
    pub succeeded: bool,
    /// Failure description when `succeeded` is false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnalysisResult {
    /// A successful result with the given findings.
    pub fn ok(category: Category, findings: Vec<Finding>) -> Self {
        Self {
            category,
            findings,
            succeeded: true,
            error: None,
        }
    }

    /// A failed result with no findings.
    ///
    /// # Examples
    ///
    /// ```
    /// use quorum_core::{AnalysisResult, Category};
    ///
    /// let result = AnalysisResult::failed(Category::Logic, "timeout");
    /// assert!(!result.succeeded);
    /// assert!(result.findings.is_empty());
    /// ```
    pub fn failed(category: Category, error: impl Into<String>) -> Self {
        Self {
            category,
            findings: Vec::new(),
            succeeded: false,
            error: Some(error.into()),
        }
    }
}

/// Finding counts by severity, computed after deduplication.
///
/// # Examples
///
/// ```
/// use quorum_core::ReviewSummary;
///
/// let summary = ReviewSummary { total_comments: 3, high: 1, medium: 2, low: 0 };
/// assert_eq!(summary.total_comments, summary.high + summary.medium + summary.low);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewSummary {
    /// Total deduplicated findings.
    pub total_comments: usize,
    /// Findings at high severity.
    pub high: usize,
    /// Findings at medium severity.
    pub medium: usize,
    /// Findings at low severity.
    pub low: usize,
}

/// Final output of one review: summary counts plus the ranked findings.
///
/// Recomputed fresh per request; never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewOutcome {
    /// Counts by severity.
    pub summary: ReviewSummary,
    /// Findings sorted by severity, then file, then line.
    pub comments: Vec<Finding>,
}

impl fmt::Display for ReviewOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Review Summary")?;
        writeln!(f, "==============")?;
        writeln!(
            f,
            "Comments: {} (high: {}, medium: {}, low: {})\n",
            self.summary.total_comments, self.summary.high, self.summary.medium, self.summary.low,
        )?;

        if self.comments.is_empty() {
            writeln!(f, "No issues found.")?;
        } else {
            for c in &self.comments {
                writeln!(
                    f,
                    "[{}] [{}] {}:{}",
                    c.severity.to_string().to_uppercase(),
                    c.category,
                    c.file,
                    c.line,
                )?;
                writeln!(f, "  {}", c.message)?;
                if let Some(s) = &c.suggestion {
                    writeln!(f, "  Suggestion: {s}")?;
                }
                writeln!(f)?;
            }
        }

        Ok(())
    }
}

impl ReviewOutcome {
    /// Render the outcome as markdown.
    ///
    /// # Examples
    ///
    /// ```
    /// use quorum_core::{ReviewOutcome, ReviewSummary};
    ///
    /// let outcome = ReviewOutcome {
    ///     summary: ReviewSummary::default(),
    ///     comments: vec![],
    /// };
    /// let md = outcome.to_markdown();
    /// assert!(md.contains("# Review Summary"));
    /// ```
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str("# Review Summary\n\n");
        out.push_str(&format!(
            "**Comments:** {} | **High:** {} | **Medium:** {} | **Low:** {}\n\n",
            self.summary.total_comments, self.summary.high, self.summary.medium, self.summary.low,
        ));

        if self.comments.is_empty() {
            out.push_str("No issues found.\n");
        } else {
            for c in &self.comments {
                let emoji = match c.severity {
                    Severity::High => "\u{1f534}",
                    Severity::Medium => "\u{1f7e1}",
                    Severity::Low => "\u{1f7e2}",
                };
                out.push_str(&format!(
                    "## {emoji} {} ({}) — `{}:{}`\n\n",
                    c.severity, c.category, c.file, c.line,
                ));
                out.push_str(&format!("{}\n\n", c.message));
                if let Some(s) = &c.suggestion {
                    out.push_str(&format!("> **Suggestion:** {s}\n\n"));
                }
            }
        }
        out
    }
}

/// Output format for CLI subcommands.
///
/// Implements [`FromStr`] so it can be used directly with `clap` argument
/// parsing.
///
/// # Examples
///
/// ```
/// use quorum_core::OutputFormat;
///
/// let fmt: OutputFormat = "md".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Markdown);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable summary.
    #[default]
    Text,
    /// Machine-readable JSON.
    Json,
    /// Markdown-formatted output.
    Markdown,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}
