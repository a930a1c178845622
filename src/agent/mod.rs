//! The labeling agent.
//!
//! Supports:
//! - **Anthropic**: Direct API access via rig-core
//! - **OpenAI**: Direct API access via rig-core
//!
//! The dispatcher depends on the [`MessageAgent`] trait; the rig-core agent
//! built by [`create_agent`] is the production implementation. The agent is
//! stateless per invocation — no memory is carried between events.

pub mod tools;

use std::sync::Arc;

use async_trait::async_trait;
use rig::client::CompletionClient;
use rig::completion::{CompletionModel, Prompt};
use secrecy::ExposeSecret;

use crate::client::ComposioApi;
use crate::error::AgentError;

/// Upper bound on LLM→tool round-trips per invocation.
const MAX_AGENT_TURNS: usize = 5;

/// Supported LLM backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmBackend {
    Anthropic,
    OpenAi,
}

/// Configuration for creating the agent's LLM side.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub backend: LlmBackend,
    pub api_key: secrecy::SecretString,
    pub model: String,
}

/// A reasoning agent invoked once per event.
#[async_trait]
pub trait MessageAgent: Send + Sync {
    /// Run one instruction to completion and return the agent's answer.
    async fn invoke(&self, input: &str) -> Result<String, AgentError>;
}

/// Build the labeling agent for `user_id`.
///
/// The agent acts through `api` — its tools execute Gmail actions on the
/// tool-routing service on the user's behalf.
pub fn create_agent(
    user_id: &str,
    api: Arc<dyn ComposioApi>,
    config: &LlmConfig,
) -> Result<Arc<dyn MessageAgent>, AgentError> {
    match config.backend {
        LlmBackend::Anthropic => create_anthropic_agent(user_id, api, config),
        LlmBackend::OpenAi => create_openai_agent(user_id, api, config),
    }
}

fn create_anthropic_agent(
    user_id: &str,
    api: Arc<dyn ComposioApi>,
    config: &LlmConfig,
) -> Result<Arc<dyn MessageAgent>, AgentError> {
    use rig::providers::anthropic;

    let client: rig::client::Client<anthropic::client::AnthropicExt> =
        anthropic::Client::new(config.api_key.expose_secret()).map_err(|e| {
            AgentError::BuildFailed {
                backend: "anthropic".to_string(),
                reason: format!("Failed to create Anthropic client: {}", e),
            }
        })?;

    let agent = client
        .agent(&config.model)
        .preamble(&labeler_preamble(user_id))
        .tool(tools::ListLabelsTool::new(Arc::clone(&api), user_id))
        .tool(tools::AddLabelTool::new(api, user_id))
        .build();

    tracing::info!("Using Anthropic (model: {})", config.model);
    Ok(Arc::new(RigAgent { agent }))
}

fn create_openai_agent(
    user_id: &str,
    api: Arc<dyn ComposioApi>,
    config: &LlmConfig,
) -> Result<Arc<dyn MessageAgent>, AgentError> {
    use rig::providers::openai;

    let client: rig::client::Client<openai::client::OpenAIResponsesExt> =
        openai::Client::new(config.api_key.expose_secret()).map_err(|e| {
            AgentError::BuildFailed {
                backend: "openai".to_string(),
                reason: format!("Failed to create OpenAI client: {}", e),
            }
        })?;

    let agent = client
        .agent(&config.model)
        .preamble(&labeler_preamble(user_id))
        .tool(tools::ListLabelsTool::new(Arc::clone(&api), user_id))
        .tool(tools::AddLabelTool::new(api, user_id))
        .build();

    tracing::info!("Using OpenAI (model: {})", config.model);
    Ok(Arc::new(RigAgent { agent }))
}

fn labeler_preamble(user_id: &str) -> String {
    format!(
        "You are an email labeling assistant acting for user {user_id}. \
         For each message you are given, inspect the mailbox's existing labels \
         with gmail_list_labels, choose the one that fits best, and apply it \
         with gmail_add_label. Never create new labels and never change the \
         message in any other way. Answer with a single sentence naming the \
         label you applied and why."
    )
}

/// rig-core agent behind the [`MessageAgent`] seam.
struct RigAgent<M: CompletionModel> {
    agent: rig::agent::Agent<M>,
}

#[async_trait]
impl<M: CompletionModel> MessageAgent for RigAgent<M> {
    async fn invoke(&self, input: &str) -> Result<String, AgentError> {
        self.agent
            .prompt(input)
            .max_turns(MAX_AGENT_TURNS)
            .await
            .map_err(|e| AgentError::InvocationFailed(e.to_string()))
    }
}
