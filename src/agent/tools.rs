//! Gmail tools for the labeling agent.
//!
//! Thin wrappers over the tool-routing service's Gmail actions, exposed to
//! rig-core as callable tools. Each tool is bound to the user id it acts for.

use std::sync::Arc;

use rig::completion::ToolDefinition;
use rig::tool::Tool;
use serde::Deserialize;
use serde_json::json;

use crate::client::{ComposioApi, ToolExecuteResponse};

/// Gmail action slug for listing mailbox labels.
const LIST_LABELS_ACTION: &str = "GMAIL_LIST_LABELS";
/// Gmail action slug for adding a label to a message.
const ADD_LABEL_ACTION: &str = "GMAIL_ADD_LABEL_TO_EMAIL";

/// Error surfaced to the model when a Gmail action fails.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct GmailToolError(String);

fn unwrap_execution(response: ToolExecuteResponse) -> Result<serde_json::Value, GmailToolError> {
    if response.successful {
        Ok(response.data)
    } else {
        Err(GmailToolError(
            response
                .error
                .unwrap_or_else(|| "tool execution failed without a reason".into()),
        ))
    }
}

// ── gmail_list_labels ───────────────────────────────────────────────

/// Lists the labels available in the user's mailbox.
pub struct ListLabelsTool {
    api: Arc<dyn ComposioApi>,
    user_id: String,
}

impl ListLabelsTool {
    pub fn new(api: Arc<dyn ComposioApi>, user_id: &str) -> Self {
        Self {
            api,
            user_id: user_id.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListLabelsArgs {}

impl Tool for ListLabelsTool {
    const NAME: &'static str = "gmail_list_labels";

    type Error = GmailToolError;
    type Args = ListLabelsArgs;
    type Output = serde_json::Value;

    async fn definition(&self, _prompt: String) -> ToolDefinition {
        ToolDefinition {
            name: Self::NAME.to_string(),
            description: "List the labels that exist in the user's Gmail mailbox.".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
        }
    }

    async fn call(&self, _args: Self::Args) -> Result<Self::Output, Self::Error> {
        let response = self
            .api
            .execute_tool(LIST_LABELS_ACTION, &self.user_id, json!({}))
            .await
            .map_err(|e| GmailToolError(e.to_string()))?;
        unwrap_execution(response)
    }
}

// ── gmail_add_label ─────────────────────────────────────────────────

/// Applies an existing label to a message.
pub struct AddLabelTool {
    api: Arc<dyn ComposioApi>,
    user_id: String,
}

impl AddLabelTool {
    pub fn new(api: Arc<dyn ComposioApi>, user_id: &str) -> Self {
        Self {
            api,
            user_id: user_id.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AddLabelArgs {
    /// Id of the message to label.
    pub message_id: String,
    /// Name of the label to apply, exactly as listed by gmail_list_labels.
    pub label: String,
}

impl Tool for AddLabelTool {
    const NAME: &'static str = "gmail_add_label";

    type Error = GmailToolError;
    type Args = AddLabelArgs;
    type Output = serde_json::Value;

    async fn definition(&self, _prompt: String) -> ToolDefinition {
        ToolDefinition {
            name: Self::NAME.to_string(),
            description: "Apply an existing label to a Gmail message.".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "message_id": {
                        "type": "string",
                        "description": "Id of the message to label"
                    },
                    "label": {
                        "type": "string",
                        "description": "Name of the label to apply"
                    }
                },
                "required": ["message_id", "label"]
            }),
        }
    }

    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
        let response = self
            .api
            .execute_tool(
                ADD_LABEL_ACTION,
                &self.user_id,
                json!({
                    "message_id": args.message_id,
                    "label_ids": [args.label],
                }),
            )
            .await
            .map_err(|e| GmailToolError(e.to_string()))?;
        unwrap_execution(response)
    }
}
