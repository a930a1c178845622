//! Trigger manager — ensures a new-message trigger exists for an account.

use serde_json::json;
use tracing::info;

use crate::client::ComposioApi;
use crate::error::TriggerError;

/// Trigger kind this process subscribes to.
pub const GMAIL_NEW_MESSAGE_TRIGGER: &str = "GMAIL_NEW_GMAIL_MESSAGE";

/// Check whether a new-message trigger already exists for the account.
///
/// Returns the first match's id, or `None`.
pub async fn trigger_exists(
    api: &dyn ComposioApi,
    connected_account_id: &str,
) -> Result<Option<String>, TriggerError> {
    let triggers = api
        .list_active_triggers(GMAIL_NEW_MESSAGE_TRIGGER, connected_account_id)
        .await?;
    Ok(triggers.into_iter().next().map(|trigger| trigger.id))
}

/// Register a new-message trigger for the account with empty configuration.
pub async fn create_trigger(
    api: &dyn ComposioApi,
    connected_account_id: &str,
) -> Result<String, TriggerError> {
    let id = api
        .create_trigger(GMAIL_NEW_MESSAGE_TRIGGER, connected_account_id, json!({}))
        .await?;
    if id.is_empty() {
        return Err(TriggerError::MissingId {
            connected_account_id: connected_account_id.to_string(),
        });
    }
    Ok(id)
}

/// Ensure a new-message trigger exists for the account, returning its id.
pub async fn ensure_trigger(
    api: &dyn ComposioApi,
    connected_account_id: &str,
) -> Result<String, TriggerError> {
    if let Some(id) = trigger_exists(api, connected_account_id).await? {
        info!(trigger_id = %id, "Reusing existing trigger");
        return Ok(id);
    }

    let id = create_trigger(api, connected_account_id).await?;
    info!(trigger_id = %id, "Registered new-message trigger");
    Ok(id)
}
