//! Client for the tool-routing service.
//!
//! The service owns connected accounts, triggers, and tool execution; this
//! module is the boundary to it. Orchestration code depends on the
//! [`ComposioApi`] trait so tests can substitute the remote service, and the
//! binary wires in the reqwest-backed [`HttpClient`].

pub mod http;
mod ws;

pub use http::HttpClient;

use std::pin::Pin;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::Stream;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Toolkit slug for Gmail on the tool-routing service.
pub const GMAIL_TOOLKIT: &str = "GMAIL";

// ── DTOs ────────────────────────────────────────────────────────────

/// Lifecycle status of a connected account, as reported by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountStatus {
    Initiated,
    Active,
    Failed,
    Expired,
    #[serde(other)]
    Unknown,
}

impl AccountStatus {
    /// Statuses from which the account can never become usable.
    pub fn is_terminal_failure(self) -> bool {
        matches!(self, AccountStatus::Failed | AccountStatus::Expired)
    }
}

impl std::fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AccountStatus::Initiated => "INITIATED",
            AccountStatus::Active => "ACTIVE",
            AccountStatus::Failed => "FAILED",
            AccountStatus::Expired => "EXPIRED",
            AccountStatus::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

/// An authorized link between a user id and their mail account.
///
/// Lifecycle is owned by the remote service; this process only reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectedAccount {
    pub id: String,
    pub status: AccountStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Handle for an in-flight authorization flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionRequest {
    /// Id of the connected account being authorized.
    pub id: String,
    /// Link the user must follow to complete authorization out-of-band.
    #[serde(default)]
    pub redirect_url: Option<String>,
}

/// A standing event subscription registered with the service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerInstance {
    pub id: String,
    pub trigger_name: String,
    pub connected_account_id: String,
}

/// Result of executing a tool action on the service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolExecuteResponse {
    pub successful: bool,
    #[serde(default)]
    pub data: serde_json::Value,
    #[serde(default)]
    pub error: Option<String>,
}

/// One trigger event as delivered over the subscription socket.
///
/// The payload stays loosely typed here; the dispatcher extracts a
/// fixed-shape record from it at the boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerEvent {
    #[serde(alias = "triggerSlug")]
    pub trigger_slug: String,
    #[serde(default, alias = "triggerId")]
    pub trigger_id: Option<String>,
    #[serde(default)]
    pub payload: serde_json::Value,
}

/// Stream of trigger events from an open subscription.
pub type EventStream = Pin<Box<dyn Stream<Item = TriggerEvent> + Send>>;

// ── Service trait ───────────────────────────────────────────────────

/// Operations this process needs from the tool-routing service.
///
/// Passed explicitly through every component (no global client).
#[async_trait]
pub trait ComposioApi: Send + Sync {
    /// List connected accounts for a user, scoped to one toolkit.
    async fn list_connected_accounts(
        &self,
        user_id: &str,
        toolkit: &str,
    ) -> Result<Vec<ConnectedAccount>, ApiError>;

    /// Fetch a single connected account by id.
    async fn get_connected_account(&self, id: &str) -> Result<ConnectedAccount, ApiError>;

    /// Start a new authorization flow for a user.
    async fn initiate_connection(
        &self,
        user_id: &str,
        auth_config_id: Option<&str>,
    ) -> Result<ConnectionRequest, ApiError>;

    /// List active triggers of one kind for a connected account.
    async fn list_active_triggers(
        &self,
        trigger_name: &str,
        connected_account_id: &str,
    ) -> Result<Vec<TriggerInstance>, ApiError>;

    /// Register a trigger for a connected account; returns its id.
    async fn create_trigger(
        &self,
        trigger_name: &str,
        connected_account_id: &str,
        trigger_config: serde_json::Value,
    ) -> Result<String, ApiError>;

    /// Execute a tool action on behalf of a user.
    async fn execute_tool(
        &self,
        tool_slug: &str,
        user_id: &str,
        arguments: serde_json::Value,
    ) -> Result<ToolExecuteResponse, ApiError>;

    /// Open the event subscription socket.
    async fn subscribe(&self) -> Result<EventStream, ApiError>;
}
