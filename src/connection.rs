//! Connection manager — ensures a connected Gmail account exists for a user.
//!
//! Setup is check-then-create: an existing active account is reused, and a
//! new authorization flow is only initiated when none exists. The check is
//! optimistic; two processes racing on the same user could still both
//! initiate, which the remote service tolerates.

use std::time::Duration;

use tracing::info;

use crate::client::{AccountStatus, ComposioApi, ConnectionRequest, GMAIL_TOOLKIT};
use crate::config::Config;
use crate::error::ConnectionError;

/// Look up an existing active connected account for `user_id`.
///
/// Returns the first active match's id, or `None`. Accounts still mid
/// authorization do not count as existing.
pub async fn connected_account_exists(
    api: &dyn ComposioApi,
    user_id: &str,
) -> Result<Option<String>, ConnectionError> {
    let accounts = api.list_connected_accounts(user_id, GMAIL_TOOLKIT).await?;
    Ok(accounts
        .into_iter()
        .find(|account| account.status == AccountStatus::Active)
        .map(|account| account.id))
}

/// Initiate a new authorization flow for `user_id`.
pub async fn create_connection(
    api: &dyn ComposioApi,
    user_id: &str,
    auth_config_id: Option<&str>,
) -> Result<ConnectionRequest, ConnectionError> {
    let request = api.initiate_connection(user_id, auth_config_id).await?;
    if request.redirect_url.is_none() {
        return Err(ConnectionError::NoRedirectUrl {
            user_id: user_id.to_string(),
        });
    }
    Ok(request)
}

/// Block until the user completes authorization out-of-band.
///
/// Polls the account status every `poll_interval`. Resolves with the
/// connection id once the account is active; FAILED and EXPIRED are terminal
/// errors. There is no timeout — if authorization is never completed this
/// waits indefinitely.
pub async fn wait_for_connection(
    api: &dyn ComposioApi,
    request: &ConnectionRequest,
    poll_interval: Duration,
) -> Result<String, ConnectionError> {
    let mut tick = tokio::time::interval(poll_interval);
    loop {
        tick.tick().await;

        let account = api.get_connected_account(&request.id).await?;
        if account.status == AccountStatus::Active {
            return Ok(account.id);
        }
        if account.status.is_terminal_failure() {
            return Err(ConnectionError::Terminal {
                id: account.id,
                status: account.status.to_string(),
            });
        }
    }
}

/// Ensure a connected account exists for `user_id`, returning its id.
///
/// Reuses an existing active account; otherwise initiates authorization,
/// prints the link for the user to follow, and waits for completion.
pub async fn ensure_connected_account(
    api: &dyn ComposioApi,
    config: &Config,
    user_id: &str,
) -> Result<String, ConnectionError> {
    if let Some(id) = connected_account_exists(api, user_id).await? {
        info!(connected_account_id = %id, "Reusing existing connected account");
        return Ok(id);
    }

    let request = create_connection(api, user_id, config.auth_config_id.as_deref()).await?;
    if let Some(ref url) = request.redirect_url {
        println!("Authenticate with the following link: {url}");
    }

    let id = wait_for_connection(api, &request, config.connect_poll_interval).await?;
    info!(connected_account_id = %id, "Connected account authorized");
    Ok(id)
}
