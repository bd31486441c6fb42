use std::sync::Arc;
use std::time::Duration;

use quorum_core::{
    DegradedMode, QuorumConfig, QuorumError, ReviewOutcome, ReviewSummary,
};
use tracing::{debug, info, warn};

use quorum_diff::parse_unified_diff;

use crate::agent::{LlmAgent, ReviewAgent};
use crate::aggregate::{aggregate, all_failed};
use crate::dispatch::dispatch;
use crate::llm::LlmClient;

/// Review orchestrator driving the full pipeline: parse the diff, fan out
/// to the agents, aggregate their findings.
pub struct ReviewPipeline {
    agents: Vec<Arc<dyn ReviewAgent>>,
    config: QuorumConfig,
}

impl ReviewPipeline {
    /// Create a pipeline over an explicit agent set.
    pub fn new(agents: Vec<Arc<dyn ReviewAgent>>, config: QuorumConfig) -> Self {
        Self { agents, config }
    }

    /// Create a pipeline with the default four LLM agents.
    ///
    /// # Errors
    ///
    /// Returns [`QuorumError::Agent`] if the LLM client cannot be built.
    pub fn from_config(config: QuorumConfig) -> Result<Self, QuorumError> {
        let client = Arc::new(LlmClient::new(&config.llm)?);
        let agents = LlmAgent::default_set(client, &config.prompts);
        Ok(Self::new(agents, config))
    }

    /// Run a full review on raw diff text.
    ///
    /// Parse failures are fatal and returned immediately. Agent failures
    /// are absorbed: the outcome simply carries fewer findings. When every
    /// agent fails, the configured degraded mode decides between an empty
    /// outcome and [`QuorumError::Degraded`].
    ///
    /// # Errors
    ///
    /// [`QuorumError::Parse`] for malformed diff input, or
    /// [`QuorumError::Degraded`] per the above.
    pub async fn review(&self, diff_text: &str) -> Result<ReviewOutcome, QuorumError> {
        let changes = parse_unified_diff(diff_text)?;
        if changes.is_empty() {
            debug!("empty diff, skipping dispatch");
            return Ok(ReviewOutcome {
                summary: ReviewSummary::default(),
                comments: Vec::new(),
            });
        }

        let total_hunks: usize = changes.iter().map(|c| c.hunks.len()).sum();
        info!(files = changes.len(), hunks = total_hunks, "dispatching agents");

        let changes = Arc::new(changes);
        let dispatch_fut = dispatch(Arc::clone(&changes), &self.agents, &self.config.dispatch);

        let results = match self.config.dispatch.request_timeout_secs {
            Some(secs) => {
                match tokio::time::timeout(Duration::from_secs(secs), dispatch_fut).await {
                    Ok(results) => results,
                    Err(_) => {
                        // Request deadline hit: in-flight agents are dropped
                        // with the future and nothing partial is merged.
                        warn!("request timeout elapsed, discarding all agent work");
                        return self.degraded("request timed out before any agent finished");
                    }
                }
            }
            None => dispatch_fut.await,
        };

        let failed = results.values().filter(|r| !r.succeeded).count();
        if failed > 0 {
            warn!(failed, total = results.len(), "some agents failed");
        }

        if all_failed(&results) {
            let detail: Vec<String> = results
                .values()
                .map(|r| {
                    format!(
                        "{}: {}",
                        r.category,
                        r.error.as_deref().unwrap_or("unknown error")
                    )
                })
                .collect();
            return self.degraded(&detail.join("; "));
        }

        let outcome = aggregate(&results, &self.config.dedup);
        info!(
            comments = outcome.summary.total_comments,
            high = outcome.summary.high,
            "review complete"
        );
        Ok(outcome)
    }

    fn degraded(&self, detail: &str) -> Result<ReviewOutcome, QuorumError> {
        match self.config.on_all_agents_failed {
            DegradedMode::Empty => Ok(ReviewOutcome {
                summary: ReviewSummary::default(),
                comments: Vec::new(),
            }),
            DegradedMode::Error => Err(QuorumError::Degraded(detail.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use quorum_core::{Category, FileChange, Finding, Severity};

    const SAMPLE_DIFF: &str = "\
diff --git a/a.py b/a.py
--- a/a.py
+++ b/a.py
@@ -1,2 +1,3 @@
 import os
-key = None
+key = \"sk-live-1234\"
+print(key)
";

    struct CannedAgent {
        category: Category,
        findings: Vec<Finding>,
        fail: bool,
        delay: Duration,
    }

    impl CannedAgent {
        fn ok(category: Category, findings: Vec<Finding>) -> Arc<dyn ReviewAgent> {
            Arc::new(Self {
                category,
                findings,
                fail: false,
                delay: Duration::ZERO,
            })
        }

        fn failing(category: Category) -> Arc<dyn ReviewAgent> {
            Arc::new(Self {
                category,
                findings: vec![],
                fail: true,
                delay: Duration::ZERO,
            })
        }

        fn slow(category: Category, delay: Duration) -> Arc<dyn ReviewAgent> {
            Arc::new(Self {
                category,
                findings: vec![],
                fail: false,
                delay,
            })
        }
    }

    #[async_trait]
    impl ReviewAgent for CannedAgent {
        fn category(&self) -> Category {
            self.category
        }

        async fn analyze(&self, _: &[FileChange]) -> Result<Vec<Finding>, QuorumError> {
            tokio::time::sleep(self.delay).await;
            if self.fail {
                Err(QuorumError::Agent("upstream unavailable".into()))
            } else {
                Ok(self.findings.clone())
            }
        }
    }

    fn secret_finding() -> Finding {
        Finding {
            file: "a.py".into(),
            line: 2,
            severity: Severity::High,
            category: Category::Security,
            message: "hardcoded API key".into(),
            suggestion: Some("read it from the environment".into()),
            source_agent: Category::Security,
        }
    }

    fn no_retry_config() -> QuorumConfig {
        let mut config = QuorumConfig::default();
        config.dispatch.max_retries = 0;
        config.dispatch.agent_timeout_secs = 5;
        config
    }

    #[tokio::test]
    async fn malformed_diff_is_fatal() {
        let pipeline = ReviewPipeline::new(
            vec![CannedAgent::ok(Category::Logic, vec![])],
            no_retry_config(),
        );
        let err = pipeline
            .review("diff --git a/x b/x\n--- a/x\n+++ b/x\n@@ bogus @@\n")
            .await
            .unwrap_err();
        assert!(matches!(err, QuorumError::Parse(_)));
    }

    #[tokio::test]
    async fn empty_diff_returns_empty_outcome_without_dispatch() {
        // A failing agent would sabotage the outcome if it were invoked
        let pipeline = ReviewPipeline::new(
            vec![CannedAgent::failing(Category::Logic)],
            QuorumConfig {
                on_all_agents_failed: DegradedMode::Error,
                ..no_retry_config()
            },
        );
        let outcome = pipeline.review("").await.unwrap();
        assert_eq!(outcome.summary.total_comments, 0);
    }

    #[tokio::test]
    async fn partial_failure_still_produces_findings() {
        let pipeline = ReviewPipeline::new(
            vec![
                CannedAgent::ok(Category::Security, vec![secret_finding()]),
                CannedAgent::failing(Category::Logic),
            ],
            no_retry_config(),
        );
        let outcome = pipeline.review(SAMPLE_DIFF).await.unwrap();
        assert_eq!(outcome.summary.total_comments, 1);
        assert_eq!(outcome.comments[0].message, "hardcoded API key");
    }

    #[tokio::test]
    async fn all_failed_empty_mode_returns_success() {
        let pipeline = ReviewPipeline::new(
            vec![
                CannedAgent::failing(Category::Logic),
                CannedAgent::failing(Category::Security),
            ],
            no_retry_config(),
        );
        let outcome = pipeline.review(SAMPLE_DIFF).await.unwrap();
        assert_eq!(outcome.summary.total_comments, 0);
        assert!(outcome.comments.is_empty());
    }

    #[tokio::test]
    async fn all_failed_error_mode_surfaces_degraded() {
        let pipeline = ReviewPipeline::new(
            vec![CannedAgent::failing(Category::Logic)],
            QuorumConfig {
                on_all_agents_failed: DegradedMode::Error,
                ..no_retry_config()
            },
        );
        let err = pipeline.review(SAMPLE_DIFF).await.unwrap_err();
        assert!(matches!(err, QuorumError::Degraded(_)));
        assert!(err.to_string().contains("upstream unavailable"));
    }

    #[tokio::test(start_paused = true)]
    async fn request_timeout_discards_partial_results() {
        let mut config = no_retry_config();
        config.dispatch.agent_timeout_secs = 60;
        config.dispatch.request_timeout_secs = Some(1);

        let pipeline = ReviewPipeline::new(
            vec![
                CannedAgent::ok(Category::Security, vec![secret_finding()]),
                CannedAgent::slow(Category::Logic, Duration::from_secs(30)),
            ],
            config,
        );
        // The fast agent finished, but the request deadline discards it.
        let outcome = pipeline.review(SAMPLE_DIFF).await.unwrap();
        assert_eq!(outcome.summary.total_comments, 0);
    }

    #[tokio::test]
    async fn duplicate_findings_across_agents_are_merged() {
        let mut near_duplicate = secret_finding();
        near_duplicate.line = 3;
        near_duplicate.message = "hardcoded API key value".into();
        near_duplicate.suggestion = None;
        near_duplicate.source_agent = Category::Logic;

        let pipeline = ReviewPipeline::new(
            vec![
                CannedAgent::ok(Category::Security, vec![secret_finding()]),
                CannedAgent::ok(Category::Logic, vec![near_duplicate]),
            ],
            no_retry_config(),
        );
        let outcome = pipeline.review(SAMPLE_DIFF).await.unwrap();
        assert_eq!(outcome.summary.total_comments, 1);
        assert_eq!(outcome.summary.high, 1);
        assert!(outcome.comments[0].suggestion.is_some());
    }
}
