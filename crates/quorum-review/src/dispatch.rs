use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use quorum_core::{AnalysisResult, Category, DispatchConfig, FileChange};
use tracing::{info_span, warn, Instrument};

use crate::agent::ReviewAgent;

/// Run every agent concurrently against the shared change model and
/// collect one terminal [`AnalysisResult`] per category.
///
/// One task is spawned per agent into a `JoinSet`. Each task gets an
/// independent timeout; a timeout or error is recorded as a failed result
/// for that category and never cancels or delays the siblings. The call
/// returns only after every task has reached a terminal state (join-all,
/// never fail-fast). Dropping the returned future aborts all in-flight
/// tasks, which is how a request-level deadline propagates cancellation.
///
/// Results are keyed by [`Category`] in a `BTreeMap`, so iteration order
/// is the canonical category order regardless of completion order.
pub async fn dispatch(
    changes: Arc<Vec<FileChange>>,
    agents: &[Arc<dyn ReviewAgent>],
    config: &DispatchConfig,
) -> BTreeMap<Category, AnalysisResult> {
    let timeout = Duration::from_secs(config.agent_timeout_secs);
    let backoff = Duration::from_millis(config.retry_backoff_ms);
    let retries = config.max_retries;

    let mut tasks = tokio::task::JoinSet::new();
    for agent in agents {
        let category = agent.category();
        let agent = Arc::clone(agent);
        let changes = Arc::clone(&changes);
        let task = async move { run_agent(agent, &changes, timeout, retries, backoff).await }
            .instrument(info_span!("agent", category = %category));
        tasks.spawn(task);
    }

    let mut results = BTreeMap::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(result) => {
                if !result.succeeded {
                    warn!(
                        category = %result.category,
                        error = result.error.as_deref().unwrap_or("unknown"),
                        "agent failed"
                    );
                }
                results.insert(result.category, result);
            }
            Err(e) => warn!("agent task panicked: {e}"),
        }
    }

    // A panicked task never reported; record it against its category.
    for agent in agents {
        let category = agent.category();
        results
            .entry(category)
            .or_insert_with(|| AnalysisResult::failed(category, "task panicked"));
    }
    results
}

async fn run_agent(
    agent: Arc<dyn ReviewAgent>,
    changes: &[FileChange],
    timeout: Duration,
    retries: u32,
    backoff: Duration,
) -> AnalysisResult {
    let category = agent.category();
    let mut attempt = 0;
    loop {
        let error = match tokio::time::timeout(timeout, agent.analyze(changes)).await {
            Ok(Ok(findings)) => return AnalysisResult::ok(category, findings),
            Ok(Err(e)) => e.to_string(),
            Err(_) => "timeout".to_string(),
        };

        if attempt >= retries {
            return AnalysisResult::failed(category, error);
        }
        attempt += 1;
        warn!(category = %category, attempt, "agent attempt failed, retrying: {error}");
        tokio::time::sleep(backoff).await;
    }
}
