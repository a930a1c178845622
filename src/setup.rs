//! Setup sequencing — account first, then trigger.

use tracing::info;

use crate::client::ComposioApi;
use crate::config::Config;
use crate::connection::ensure_connected_account;
use crate::error::Result;
use crate::triggers::ensure_trigger;

/// Remote resources the event loop depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Setup {
    pub connected_account_id: String,
    pub trigger_id: String,
}

/// Ensure the connected account and trigger exist, in that order.
///
/// The order is fixed regardless of which branch (exists vs. create) each
/// step takes: the trigger is always scoped to the account resolved first.
pub async fn prepare(api: &dyn ComposioApi, config: &Config, user_id: &str) -> Result<Setup> {
    let connected_account_id = ensure_connected_account(api, config, user_id).await?;
    let trigger_id = ensure_trigger(api, &connected_account_id).await?;

    info!(
        connected_account_id = %connected_account_id,
        trigger_id = %trigger_id,
        "Setup complete"
    );

    Ok(Setup {
        connected_account_id,
        trigger_id,
    })
}
