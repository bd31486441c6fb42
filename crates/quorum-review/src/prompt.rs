use std::fmt::Write;

use quorum_core::{
    Category, FileChange, Finding, LineKind, PromptsConfig, QuorumError, Severity,
};
use serde::Deserialize;

const LOGIC_PROMPT: &str = "\
You are a code review agent focused exclusively on LOGIC. Find genuine \
correctness problems in the changed lines: off-by-one errors, inverted \
conditions, unhandled branches, broken control flow, wrong operator usage. \
Do not comment on style, security, or performance.";

const SECURITY_PROMPT: &str = "\
You are a code review agent focused exclusively on SECURITY. Find genuine \
vulnerabilities in the changed lines: hardcoded secrets, injection risks, \
missing input validation, unsafe deserialization, weak crypto. Do not \
comment on style, logic, or performance.";

const PERFORMANCE_PROMPT: &str = "\
You are a code review agent focused exclusively on PERFORMANCE. Find \
genuine efficiency problems in the changed lines: accidental quadratic \
loops, repeated work that should be cached, blocking calls on hot paths, \
unbounded allocations. Do not comment on style, logic, or security.";

const READABILITY_PROMPT: &str = "\
You are a code review agent focused exclusively on READABILITY. Find \
genuine clarity problems in the changed lines: misleading names, dead \
code, deeply nested blocks, missing error context. Do not comment on \
logic, security, or performance.";

const RESPONSE_SCHEMA: &str = "\
Only report issues you are confident about, referencing line numbers from \
the annotated diff. Respond with a JSON object:
{
  \"findings\": [
    {
      \"file\": \"path/to/file\",
      \"line\": 42,
      \"severity\": \"high\" | \"medium\" | \"low\",
      \"message\": \"Clear explanation of the issue\",
      \"suggestion\": \"Optional fix suggestion\"
    }
  ]
}

If you find no issues, return: { \"findings\": [] }";

/// Build the system prompt for one agent category, honoring any override
/// from configuration. The response-schema contract is always appended so
/// overrides cannot break parsing.
///
/// # Examples
///
/// ```
/// use quorum_core::{Category, PromptsConfig};
/// use quorum_review::prompt::build_system_prompt;
///
/// let prompt = build_system_prompt(Category::Security, &PromptsConfig::default());
/// assert!(prompt.contains("SECURITY"));
/// assert!(prompt.contains("findings"));
/// ```
pub fn build_system_prompt(category: Category, overrides: &PromptsConfig) -> String {
    let base = match category {
        Category::Logic => overrides.logic.as_deref().unwrap_or(LOGIC_PROMPT),
        Category::Security => overrides.security.as_deref().unwrap_or(SECURITY_PROMPT),
        Category::Performance => overrides
            .performance
            .as_deref()
            .unwrap_or(PERFORMANCE_PROMPT),
        Category::Readability => overrides
            .readability
            .as_deref()
            .unwrap_or(READABILITY_PROMPT),
    };
    format!("{base}\n\n{RESPONSE_SCHEMA}")
}

/// Render the change model into the annotated text agents review.
///
/// One block per file, each hunk introduced with its new-side line range,
/// every line tagged with its marker and line number. Binary files get a
/// one-line note and no body.
///
/// # Examples
///
/// ```
/// use quorum_review::prompt::render_changes;
///
/// let text = render_changes(&[]);
/// assert!(text.is_empty());
/// ```
pub fn render_changes(changes: &[FileChange]) -> String {
    let mut out = String::new();
    for file in changes {
        let _ = writeln!(out, "=== File: {} ===", file.display_path().display());
        if file.is_binary {
            let _ = writeln!(out, "(binary file, contents not shown)");
            continue;
        }
        for hunk in &file.hunks {
            let _ = writeln!(
                out,
                "@@ Lines {}-{} @@",
                hunk.new_start,
                hunk.new_start + hunk.new_count
            );
            for line in &hunk.lines {
                match line.kind {
                    LineKind::Added => {
                        let _ = writeln!(
                            out,
                            "+ Line {}: {}",
                            line.new_line.unwrap_or_default(),
                            line.content
                        );
                    }
                    LineKind::Removed => {
                        let _ = writeln!(
                            out,
                            "- Line {}: {}",
                            line.old_line.unwrap_or_default(),
                            line.content
                        );
                    }
                    LineKind::Context => {
                        let _ = writeln!(
                            out,
                            "  Line {}: {}",
                            line.new_line.unwrap_or_default(),
                            line.content
                        );
                    }
                }
            }
        }
    }
    out
}

/// Build the user prompt containing the annotated diff.
pub fn build_review_prompt(diff_context: &str) -> String {
    format!("Review the following code changes:\n\n{diff_context}")
}

#[derive(Deserialize)]
struct AgentResponse {
    findings: Vec<FindingPayload>,
}

// Strict schema: a missing required field or an out-of-set severity fails
// deserialization, which fails the whole agent invocation. Never coerce.
#[derive(Deserialize)]
struct FindingPayload {
    file: String,
    line: u32,
    severity: Severity,
    message: String,
    #[serde(default)]
    suggestion: Option<String>,
    // Some models echo the category back; accept it but the agent's own
    // category always wins. An out-of-set value is still a schema failure.
    #[serde(default)]
    #[allow(dead_code)]
    category: Option<Category>,
}

/// Parse and validate one agent's JSON response into [`Finding`] entries.
///
/// Markdown code fences around the JSON body are stripped first. The whole
/// response is rejected if any entry violates the schema; a schema-invalid
/// response is a capability failure, not a partial success.
///
/// # Errors
///
/// Returns [`QuorumError::Agent`] when the response is not valid JSON, is
/// missing required fields, carries an empty file or message, a zero line
/// number, or an out-of-set severity/category.
///
/// # Examples
///
/// ```
/// use quorum_core::Category;
/// use quorum_review::prompt::parse_findings;
///
/// let findings = parse_findings(Category::Logic, r#"{"findings":[]}"#).unwrap();
/// assert!(findings.is_empty());
/// ```
pub fn parse_findings(category: Category, response: &str) -> Result<Vec<Finding>, QuorumError> {
    let cleaned = strip_code_fences(response);

    let parsed: AgentResponse = serde_json::from_str(cleaned)
        .map_err(|e| QuorumError::Agent(format!("{category} agent returned invalid JSON: {e}")))?;

    let mut findings = Vec::with_capacity(parsed.findings.len());
    for payload in parsed.findings {
        if payload.file.is_empty() {
            return Err(QuorumError::Agent(format!(
                "{category} agent returned a finding with an empty file"
            )));
        }
        if payload.line == 0 {
            return Err(QuorumError::Agent(format!(
                "{category} agent returned a finding with line 0"
            )));
        }
        if payload.message.is_empty() {
            return Err(QuorumError::Agent(format!(
                "{category} agent returned a finding with an empty message"
            )));
        }
        findings.push(Finding {
            file: payload.file,
            line: payload.line,
            severity: payload.severity,
            category,
            message: payload.message,
            suggestion: payload.suggestion.filter(|s| !s.is_empty()),
            source_agent: category,
        });
    }

    Ok(findings)
}

fn strip_code_fences(s: &str) -> &str {
    let trimmed = s.trim();
    if let Some(rest) = trimmed.strip_prefix("```json") {
        if let Some(inner) = rest.strip_suffix("```") {
            return inner.trim();
        }
    }
    if let Some(rest) = trimmed.strip_prefix("```") {
        if let Some(inner) = rest.strip_suffix("```") {
            return inner.trim();
        }
    }
    trimmed
}
