use std::collections::BTreeMap;
use std::collections::BTreeSet;

use quorum_core::{
    AnalysisResult, Category, DedupConfig, Finding, ReviewOutcome, ReviewSummary, Severity,
};

/// Merge per-agent results into one deduplicated, ranked [`ReviewOutcome`].
///
/// Failed agents contribute nothing but never block aggregation. Findings
/// are walked in canonical category order (the `BTreeMap` key order), so
/// the "first encountered" duplicate winner is deterministic. Output order
/// is a total order: severity descending, then file, line, category,
/// message.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
/// use quorum_core::DedupConfig;
/// use quorum_review::aggregate::aggregate;
///
/// let outcome = aggregate(&BTreeMap::new(), &DedupConfig::default());
/// assert_eq!(outcome.summary.total_comments, 0);
/// assert!(outcome.comments.is_empty());
/// ```
pub fn aggregate(
    results: &BTreeMap<Category, AnalysisResult>,
    config: &DedupConfig,
) -> ReviewOutcome {
    let mut kept: Vec<Finding> = Vec::new();

    for result in results.values() {
        for candidate in &result.findings {
            match kept
                .iter()
                .position(|existing| is_duplicate(existing, candidate, config))
            {
                Some(idx) => {
                    if candidate.severity.rank() < kept[idx].severity.rank() {
                        // Higher-severity candidate wins; keep the loser's
                        // suggestion if the winner has none.
                        let mut winner = candidate.clone();
                        if winner.suggestion.is_none() {
                            winner.suggestion = kept[idx].suggestion.take();
                        }
                        kept[idx] = winner;
                    } else if kept[idx].suggestion.is_none() {
                        kept[idx].suggestion = candidate.suggestion.clone();
                    }
                }
                None => kept.push(candidate.clone()),
            }
        }
    }

    kept.sort_by(|a, b| {
        a.severity
            .rank()
            .cmp(&b.severity.rank())
            .then_with(|| a.file.cmp(&b.file))
            .then_with(|| a.line.cmp(&b.line))
            .then_with(|| a.category.cmp(&b.category))
            .then_with(|| a.message.cmp(&b.message))
    });

    let summary = summarize(&kept);
    ReviewOutcome {
        summary,
        comments: kept,
    }
}

/// True when every result in the map failed. An empty map counts as all
/// failed: no agent produced anything.
pub fn all_failed(results: &BTreeMap<Category, AnalysisResult>) -> bool {
    results.values().all(|r| !r.succeeded)
}

fn summarize(findings: &[Finding]) -> ReviewSummary {
    let mut summary = ReviewSummary {
        total_comments: findings.len(),
        ..ReviewSummary::default()
    };
    for finding in findings {
        match finding.severity {
            Severity::High => summary.high += 1,
            Severity::Medium => summary.medium += 1,
            Severity::Low => summary.low += 1,
        }
    }
    summary
}

fn is_duplicate(a: &Finding, b: &Finding, config: &DedupConfig) -> bool {
    a.file == b.file
        && a.category == b.category
        && a.line.abs_diff(b.line) <= config.line_tolerance
        && message_similarity(&a.message, &b.message) >= config.similarity_threshold
}

/// Case-insensitive token-overlap coefficient: shared tokens divided by
/// the smaller token set. A message that is a subset of another scores
/// 1.0, so "hardcoded secret" matches "hardcoded secret key".
fn message_similarity(a: &str, b: &str) -> f64 {
    let tokens_a = tokenize(a);
    let tokens_b = tokenize(b);
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return if tokens_a.is_empty() && tokens_b.is_empty() {
            1.0
        } else {
            0.0
        };
    }
    let shared = tokens_a.intersection(&tokens_b).count();
    shared as f64 / tokens_a.len().min(tokens_b.len()) as f64
}

fn tokenize(s: &str) -> BTreeSet<String> {
    s.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(
        file: &str,
        line: u32,
        severity: Severity,
        category: Category,
        message: &str,
    ) -> Finding {
        Finding {
            file: file.into(),
            line,
            severity,
            category,
            message: message.into(),
            suggestion: None,
            source_agent: category,
        }
    }

    fn results_from(entries: Vec<(Category, Vec<Finding>)>) -> BTreeMap<Category, AnalysisResult> {
        entries
            .into_iter()
            .map(|(c, f)| (c, AnalysisResult::ok(c, f)))
            .collect()
    }

    fn default_dedup() -> DedupConfig {
        DedupConfig::default()
    }

    #[test]
    fn near_identical_findings_across_agents_merge() {
        // Same issue reported one line apart with slightly different wording
        let results = results_from(vec![
            (
                Category::Security,
                vec![finding(
                    "a.py",
                    10,
                    Severity::High,
                    Category::Security,
                    "hardcoded secret",
                )],
            ),
            (
                Category::Logic,
                vec![finding(
                    "a.py",
                    11,
                    Severity::High,
                    Category::Security,
                    "hardcoded secret key",
                )],
            ),
        ]);
        let outcome = aggregate(&results, &default_dedup());
        assert_eq!(outcome.comments.len(), 1);
        assert_eq!(outcome.summary.total_comments, 1);
    }

    #[test]
    fn different_categories_never_merge() {
        let results = results_from(vec![
            (
                Category::Security,
                vec![finding(
                    "a.py",
                    10,
                    Severity::High,
                    Category::Security,
                    "unvalidated input",
                )],
            ),
            (
                Category::Logic,
                vec![finding(
                    "a.py",
                    10,
                    Severity::High,
                    Category::Logic,
                    "unvalidated input",
                )],
            ),
        ]);
        let outcome = aggregate(&results, &default_dedup());
        assert_eq!(outcome.comments.len(), 2);
    }

    #[test]
    fn lines_outside_tolerance_never_merge() {
        let results = results_from(vec![(
            Category::Logic,
            vec![
                finding("a.py", 10, Severity::Low, Category::Logic, "dead branch"),
                finding("a.py", 13, Severity::Low, Category::Logic, "dead branch"),
            ],
        )]);
        let outcome = aggregate(&results, &default_dedup());
        assert_eq!(outcome.comments.len(), 2);
    }

    #[test]
    fn higher_severity_duplicate_wins() {
        let results = results_from(vec![
            (
                Category::Logic,
                vec![finding(
                    "a.py",
                    5,
                    Severity::Low,
                    Category::Security,
                    "weak hash function used",
                )],
            ),
            (
                Category::Security,
                vec![finding(
                    "a.py",
                    5,
                    Severity::High,
                    Category::Security,
                    "weak hash function used",
                )],
            ),
        ]);
        let outcome = aggregate(&results, &default_dedup());
        assert_eq!(outcome.comments.len(), 1);
        assert_eq!(outcome.comments[0].severity, Severity::High);
    }

    #[test]
    fn equal_severity_keeps_first_and_merges_suggestion() {
        let mut second = finding(
            "a.py",
            5,
            Severity::Medium,
            Category::Logic,
            "loop bound off by one",
        );
        second.suggestion = Some("use ..= instead of ..".into());
        second.source_agent = Category::Security;

        let results = results_from(vec![
            (
                Category::Logic,
                vec![finding(
                    "a.py",
                    5,
                    Severity::Medium,
                    Category::Logic,
                    "loop bound off by one",
                )],
            ),
            (Category::Security, vec![second]),
        ]);
        let outcome = aggregate(&results, &default_dedup());
        assert_eq!(outcome.comments.len(), 1);
        // First encountered (logic agent's copy) retained, suggestion filled in
        assert_eq!(outcome.comments[0].source_agent, Category::Logic);
        assert_eq!(
            outcome.comments[0].suggestion.as_deref(),
            Some("use ..= instead of ..")
        );
    }

    #[test]
    fn ranking_is_severity_then_file_then_line() {
        let results = results_from(vec![(
            Category::Logic,
            vec![
                finding("b.py", 1, Severity::Low, Category::Logic, "m1"),
                finding("a.py", 20, Severity::High, Category::Logic, "m2"),
                finding("a.py", 3, Severity::High, Category::Logic, "m3"),
                finding("a.py", 3, Severity::Medium, Category::Logic, "m4"),
            ],
        )]);
        let outcome = aggregate(&results, &default_dedup());
        let order: Vec<(String, u32, Severity)> = outcome
            .comments
            .iter()
            .map(|f| (f.file.clone(), f.line, f.severity))
            .collect();
        assert_eq!(
            order,
            vec![
                ("a.py".into(), 3, Severity::High),
                ("a.py".into(), 20, Severity::High),
                ("a.py".into(), 3, Severity::Medium),
                ("b.py".into(), 1, Severity::Low),
            ]
        );
    }

    #[test]
    fn ranking_is_stable_under_permutation() {
        let a = finding("a.py", 1, Severity::High, Category::Logic, "first");
        let b = finding("a.py", 1, Severity::High, Category::Security, "second");
        let c = finding("z.py", 9, Severity::Low, Category::Logic, "third");

        let forward = results_from(vec![
            (Category::Logic, vec![a.clone(), c.clone()]),
            (Category::Security, vec![b.clone()]),
        ]);
        let reversed = results_from(vec![
            (Category::Logic, vec![c, a]),
            (Category::Security, vec![b]),
        ]);

        let out1 = aggregate(&forward, &default_dedup());
        let out2 = aggregate(&reversed, &default_dedup());
        assert_eq!(out1.comments, out2.comments);
    }

    #[test]
    fn aggregation_is_idempotent() {
        let results = results_from(vec![
            (
                Category::Security,
                vec![
                    finding("a.py", 10, Severity::High, Category::Security, "secret"),
                    finding("b.py", 2, Severity::Low, Category::Security, "other"),
                ],
            ),
            (
                Category::Logic,
                vec![finding("a.py", 11, Severity::High, Category::Security, "secret key")],
            ),
        ]);
        let once = aggregate(&results, &default_dedup());

        let again_input = results_from(vec![(
            Category::Logic,
            once.comments.clone(),
        )]);
        let twice = aggregate(&again_input, &default_dedup());
        assert_eq!(once.comments, twice.comments);
        assert_eq!(once.summary, twice.summary);
    }

    #[test]
    fn failed_agents_do_not_block_aggregation() {
        let mut results = results_from(vec![(
            Category::Logic,
            vec![finding("a.py", 1, Severity::Medium, Category::Logic, "issue")],
        )]);
        results.insert(
            Category::Security,
            AnalysisResult::failed(Category::Security, "timeout"),
        );

        let outcome = aggregate(&results, &default_dedup());
        assert_eq!(outcome.comments.len(), 1);
        assert_eq!(outcome.summary.medium, 1);
    }

    #[test]
    fn all_failed_yields_empty_outcome() {
        let results: BTreeMap<Category, AnalysisResult> = Category::ALL
            .iter()
            .map(|&c| (c, AnalysisResult::failed(c, "timeout")))
            .collect();

        assert!(all_failed(&results));
        let outcome = aggregate(&results, &default_dedup());
        assert_eq!(outcome.summary.total_comments, 0);
        assert!(outcome.comments.is_empty());
    }

    #[test]
    fn summary_counts_by_severity() {
        let results = results_from(vec![(
            Category::Logic,
            vec![
                finding("a.py", 1, Severity::High, Category::Logic, "m1"),
                finding("a.py", 5, Severity::Medium, Category::Logic, "m2"),
                finding("a.py", 9, Severity::Medium, Category::Logic, "m3"),
                finding("a.py", 12, Severity::Low, Category::Logic, "m4"),
            ],
        )]);
        let outcome = aggregate(&results, &default_dedup());
        assert_eq!(outcome.summary.total_comments, 4);
        assert_eq!(outcome.summary.high, 1);
        assert_eq!(outcome.summary.medium, 2);
        assert_eq!(outcome.summary.low, 1);
    }

    #[test]
    fn similarity_is_case_insensitive_subset_match() {
        assert_eq!(message_similarity("Hardcoded Secret", "hardcoded secret key"), 1.0);
        assert!(message_similarity("unused variable", "sql injection risk") < 0.5);
        assert_eq!(message_similarity("", ""), 1.0);
        assert_eq!(message_similarity("x", ""), 0.0);
    }
}
