use std::sync::Arc;

use async_trait::async_trait;
use quorum_core::{Category, FileChange, Finding, PromptsConfig, QuorumError};

use crate::llm::{ChatMessage, LlmClient, Role};
use crate::prompt;

/// One review capability: an opaque function from the change model to a
/// list of findings.
///
/// Implementations must be `Send + Sync` so the dispatcher can run them
/// concurrently. The dispatcher owns timeouts and retries; `analyze`
/// should just do the call.
#[async_trait]
pub trait ReviewAgent: Send + Sync {
    /// Review dimension this agent covers.
    fn category(&self) -> Category;

    /// Inspect the change model and return validated findings.
    ///
    /// # Errors
    ///
    /// Any transport or response-schema failure. The dispatcher records it
    /// as a failed `AnalysisResult`; it never aborts sibling agents.
    async fn analyze(&self, changes: &[FileChange]) -> Result<Vec<Finding>, QuorumError>;
}

/// LLM-backed agent for one category. All four agents share one client;
/// only the system prompt and the category stamp differ.
pub struct LlmAgent {
    category: Category,
    client: Arc<LlmClient>,
    system_prompt: String,
}

impl LlmAgent {
    /// Create an agent for `category` using the shared `client`.
    pub fn new(category: Category, client: Arc<LlmClient>, prompts: &PromptsConfig) -> Self {
        Self {
            category,
            client,
            system_prompt: prompt::build_system_prompt(category, prompts),
        }
    }

    /// Build the default set of four agents in canonical order.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    /// use quorum_core::{Category, LlmConfig, PromptsConfig};
    /// use quorum_review::agent::{LlmAgent, ReviewAgent};
    /// use quorum_review::llm::LlmClient;
    ///
    /// let client = Arc::new(LlmClient::new(&LlmConfig::default()).unwrap());
    /// let agents = LlmAgent::default_set(client, &PromptsConfig::default());
    /// assert_eq!(agents.len(), 4);
    /// assert_eq!(agents[0].category(), Category::Logic);
    /// ```
    pub fn default_set(
        client: Arc<LlmClient>,
        prompts: &PromptsConfig,
    ) -> Vec<Arc<dyn ReviewAgent>> {
        Category::ALL
            .iter()
            .map(|&category| {
                Arc::new(LlmAgent::new(category, Arc::clone(&client), prompts))
                    as Arc<dyn ReviewAgent>
            })
            .collect()
    }
}

#[async_trait]
impl ReviewAgent for LlmAgent {
    fn category(&self) -> Category {
        self.category
    }

    async fn analyze(&self, changes: &[FileChange]) -> Result<Vec<Finding>, QuorumError> {
        let context = prompt::render_changes(changes);
        let messages = vec![
            ChatMessage {
                role: Role::System,
                content: self.system_prompt.clone(),
            },
            ChatMessage {
                role: Role::User,
                content: prompt::build_review_prompt(&context),
            },
        ];

        let response = self.client.chat(messages).await?;
        prompt::parse_findings(self.category, &response)
    }
}
