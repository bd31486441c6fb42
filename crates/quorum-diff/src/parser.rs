use std::path::PathBuf;

use quorum_core::{ChangeType, DiffHunk, DiffLine, FileChange, LineKind, QuorumError};

/// Parse a unified diff string (as produced by `git diff`) into structured
/// [`FileChange`] entries.
///
/// Handles new, deleted, renamed, and binary files. Binary files are kept
/// in the output with `is_binary` set and no hunks. Every line inside a
/// hunk is tagged with its old and/or new line number so agents can
/// reference exact positions.
///
/// # Errors
///
/// Returns [`QuorumError::Parse`] if a hunk header is malformed or a hunk
/// appears before any file header.
///
/// # Examples
///
/// ```
/// use quorum_diff::parse_unified_diff;
///
/// let files = parse_unified_diff("").unwrap();
/// assert!(files.is_empty());
/// ```
pub fn parse_unified_diff(input: &str) -> Result<Vec<FileChange>, QuorumError> {
    let mut parser = Parser::default();

    for line in input.lines() {
        parser.step(line)?;
    }

    parser.finish()
}

#[derive(Default)]
struct Parser {
    files: Vec<FileChange>,
    current: Option<FileChange>,
    current_hunk: Option<DiffHunk>,
    // Running counters while inside a hunk.
    old_line: u32,
    new_line: u32,
}

impl Parser {
    fn step(&mut self, line: &str) -> Result<(), QuorumError> {
        if let Some(marker) = line.strip_prefix("diff --git ") {
            self.flush_file();
            let (old_path, new_path) = parse_git_marker(marker);
            self.current = Some(FileChange {
                old_path,
                new_path,
                change_type: ChangeType::Modified,
                hunks: Vec::new(),
                is_binary: false,
            });
            return Ok(());
        }

        // Plain patches may lack the "diff --git" command line; a "---"
        // header then opens the file section implicitly.
        if line.starts_with("--- ") && self.current.is_none() {
            self.current = Some(FileChange {
                old_path: PathBuf::new(),
                new_path: PathBuf::new(),
                change_type: ChangeType::Modified,
                hunks: Vec::new(),
                is_binary: false,
            });
        }

        if line.starts_with("@@") && self.current.is_none() {
            return Err(QuorumError::Parse(format!(
                "hunk outside any file section: {line}"
            )));
        }

        let Some(file) = self.current.as_mut() else {
            return Ok(());
        };

        if line.starts_with("Binary files ") && line.ends_with(" differ")
            || line == "GIT binary patch"
        {
            file.is_binary = true;
            self.current_hunk = None;
            return Ok(());
        }

        if line.starts_with("new file mode") {
            file.change_type = ChangeType::Added;
            return Ok(());
        }

        if line.starts_with("deleted file mode") {
            file.change_type = ChangeType::Deleted;
            return Ok(());
        }

        if let Some(path) = line.strip_prefix("rename from ") {
            file.change_type = ChangeType::Renamed;
            file.old_path = PathBuf::from(path.trim());
            return Ok(());
        }

        if let Some(path) = line.strip_prefix("rename to ") {
            file.change_type = ChangeType::Renamed;
            file.new_path = PathBuf::from(path.trim());
            return Ok(());
        }

        if line.starts_with("index ")
            || line.starts_with("similarity index")
            || line.starts_with("old mode")
            || line.starts_with("new mode")
        {
            return Ok(());
        }

        if self.current_hunk.is_none() {
            if let Some(path) = line.strip_prefix("--- ") {
                if path != "/dev/null" {
                    file.old_path = parse_path(path);
                } else if file.change_type == ChangeType::Modified {
                    file.change_type = ChangeType::Added;
                }
                return Ok(());
            }

            if let Some(path) = line.strip_prefix("+++ ") {
                if path != "/dev/null" {
                    file.new_path = parse_path(path);
                } else {
                    file.change_type = ChangeType::Deleted;
                }
                return Ok(());
            }
        }

        if line.starts_with("@@") {
            self.flush_hunk();
            if self.current.as_ref().is_some_and(|f| f.is_binary) {
                return Err(QuorumError::Parse(format!(
                    "hunk in binary file section: {line}"
                )));
            }
            let (old_start, old_count, new_start, new_count) = parse_hunk_header(line)?;
            self.old_line = old_start;
            self.new_line = new_start;
            self.current_hunk = Some(DiffHunk {
                old_start,
                old_count,
                new_start,
                new_count,
                lines: Vec::new(),
            });
            return Ok(());
        }

        if line == "\\ No newline at end of file" {
            return Ok(());
        }

        if let Some(hunk) = self.current_hunk.as_mut() {
            let diff_line = if let Some(content) = line.strip_prefix('+') {
                let l = DiffLine {
                    kind: LineKind::Added,
                    content: content.to_string(),
                    old_line: None,
                    new_line: Some(self.new_line),
                };
                self.new_line += 1;
                l
            } else if let Some(content) = line.strip_prefix('-') {
                let l = DiffLine {
                    kind: LineKind::Removed,
                    content: content.to_string(),
                    old_line: Some(self.old_line),
                    new_line: None,
                };
                self.old_line += 1;
                l
            } else {
                // A space prefix marks a context line; a fully empty line
                // is a context line whose trailing space was stripped.
                let content = line.strip_prefix(' ').unwrap_or(line);
                let l = DiffLine {
                    kind: LineKind::Context,
                    content: content.to_string(),
                    old_line: Some(self.old_line),
                    new_line: Some(self.new_line),
                };
                self.old_line += 1;
                self.new_line += 1;
                l
            };
            hunk.lines.push(diff_line);
        }

        Ok(())
    }

    fn finish(mut self) -> Result<Vec<FileChange>, QuorumError> {
        self.flush_file();
        Ok(self.files)
    }

    fn flush_hunk(&mut self) {
        if let Some(h) = self.current_hunk.take() {
            if let Some(file) = self.current.as_mut() {
                file.hunks.push(h);
            }
        }
    }

    fn flush_file(&mut self) {
        self.flush_hunk();
        if let Some(file) = self.current.take() {
            self.files.push(file);
        }
    }
}

/// Extract old/new paths from the text after `diff --git `.
fn parse_git_marker(marker: &str) -> (PathBuf, PathBuf) {
    // "a/<old> b/<new>"; find the " b/" separator from the right so that
    // old paths containing " b/" do not split early.
    if let Some(idx) = marker.rfind(" b/") {
        let old = marker[..idx].trim_matches('"');
        let new = marker[idx + 1..].trim_matches('"');
        return (
            PathBuf::from(old.strip_prefix("a/").unwrap_or(old)),
            PathBuf::from(new.strip_prefix("b/").unwrap_or(new)),
        );
    }
    (PathBuf::new(), PathBuf::new())
}

fn parse_path(raw: &str) -> PathBuf {
    let normalized = raw.trim_matches('"');

    let stripped = normalized
        .strip_prefix("a/")
        .or_else(|| normalized.strip_prefix("b/"))
        .unwrap_or(normalized);

    PathBuf::from(stripped)
}

fn parse_hunk_header(line: &str) -> Result<(u32, u32, u32, u32), QuorumError> {
    let inner = line
        .strip_prefix("@@ ")
        .and_then(|s| {
            let end = s.find(" @@")?;
            Some(&s[..end])
        })
        .ok_or_else(|| QuorumError::Parse(format!("invalid hunk header: {line}")))?;

    let parts: Vec<&str> = inner.split(' ').collect();
    if parts.len() != 2 {
        return Err(QuorumError::Parse(format!("invalid hunk header: {line}")));
    }

    let old = parts[0]
        .strip_prefix('-')
        .ok_or_else(|| QuorumError::Parse(format!("invalid old range in hunk: {line}")))?;
    let new = parts[1]
        .strip_prefix('+')
        .ok_or_else(|| QuorumError::Parse(format!("invalid new range in hunk: {line}")))?;

    let (old_start, old_count) = parse_range(old, line)?;
    let (new_start, new_count) = parse_range(new, line)?;

    Ok((old_start, old_count, new_start, new_count))
}

fn parse_range(range: &str, context: &str) -> Result<(u32, u32), QuorumError> {
    if let Some((start, count)) = range.split_once(',') {
        let s = start
            .parse()
            .map_err(|_| QuorumError::Parse(format!("invalid range number in: {context}")))?;
        let c = count
            .parse()
            .map_err(|_| QuorumError::Parse(format!("invalid range count in: {context}")))?;
        Ok((s, c))
    } else {
        // A side with exactly one line omits the count.
        let s = range
            .parse()
            .map_err(|_| QuorumError::Parse(format!("invalid range number in: {context}")))?;
        Ok((s, 1))
    }
}
