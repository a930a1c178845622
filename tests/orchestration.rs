//! Integration tests for the setup + dispatch orchestration.
//!
//! Each test runs the real orchestration code against a scripted in-memory
//! service and a stub agent, verifying the idempotent check-then-create
//! behavior, the fixed setup order, and the event-to-instruction path.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tokio::time::timeout;

use gmail_labeler::agent::{LlmBackend, LlmConfig, MessageAgent};
use gmail_labeler::client::{
    AccountStatus, ComposioApi, ConnectedAccount, ConnectionRequest, EventStream,
    ToolExecuteResponse, TriggerEvent, TriggerInstance,
};
use gmail_labeler::config::Config;
use gmail_labeler::error::{AgentError, ApiError, Error, EventError};
use gmail_labeler::events::Dispatcher;
use gmail_labeler::setup;
use gmail_labeler::triggers::GMAIL_NEW_MESSAGE_TRIGGER;

/// Maximum time any test is allowed to run before we consider it hung.
const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Scripted service fake: serves configured state and records every call in
/// order.
#[derive(Default)]
struct FakeService {
    existing_account: Option<String>,
    existing_trigger: Option<String>,
    calls: Mutex<Vec<String>>,
}

impl FakeService {
    fn with_account_and_trigger() -> Self {
        Self {
            existing_account: Some("ca_live".into()),
            existing_trigger: Some("ti_live".into()),
            ..Default::default()
        }
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    fn call_log(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ComposioApi for FakeService {
    async fn list_connected_accounts(
        &self,
        user_id: &str,
        toolkit: &str,
    ) -> Result<Vec<ConnectedAccount>, ApiError> {
        self.record(format!("list_accounts:{user_id}:{toolkit}"));
        Ok(self
            .existing_account
            .iter()
            .map(|id| ConnectedAccount {
                id: id.clone(),
                status: AccountStatus::Active,
                created_at: None,
            })
            .collect())
    }

    async fn get_connected_account(&self, id: &str) -> Result<ConnectedAccount, ApiError> {
        self.record(format!("get_account:{id}"));
        // Newly initiated accounts become active on the first poll.
        Ok(ConnectedAccount {
            id: id.to_string(),
            status: AccountStatus::Active,
            created_at: None,
        })
    }

    async fn initiate_connection(
        &self,
        user_id: &str,
        _auth_config_id: Option<&str>,
    ) -> Result<ConnectionRequest, ApiError> {
        self.record(format!("initiate:{user_id}"));
        Ok(ConnectionRequest {
            id: "ca_new".into(),
            redirect_url: Some("https://auth.example.com/flow".into()),
        })
    }

    async fn list_active_triggers(
        &self,
        trigger_name: &str,
        connected_account_id: &str,
    ) -> Result<Vec<TriggerInstance>, ApiError> {
        self.record(format!("list_triggers:{trigger_name}:{connected_account_id}"));
        Ok(self
            .existing_trigger
            .iter()
            .map(|id| TriggerInstance {
                id: id.clone(),
                trigger_name: trigger_name.to_string(),
                connected_account_id: connected_account_id.to_string(),
            })
            .collect())
    }

    async fn create_trigger(
        &self,
        trigger_name: &str,
        connected_account_id: &str,
        trigger_config: serde_json::Value,
    ) -> Result<String, ApiError> {
        assert_eq!(trigger_config, json!({}), "trigger config must stay empty");
        self.record(format!("create_trigger:{trigger_name}:{connected_account_id}"));
        Ok("ti_new".into())
    }

    async fn execute_tool(
        &self,
        tool_slug: &str,
        user_id: &str,
        _arguments: serde_json::Value,
    ) -> Result<ToolExecuteResponse, ApiError> {
        self.record(format!("execute:{tool_slug}:{user_id}"));
        Ok(ToolExecuteResponse {
            successful: true,
            data: serde_json::Value::Null,
            error: None,
        })
    }

    async fn subscribe(&self) -> Result<EventStream, ApiError> {
        self.record("subscribe");
        Ok(Box::pin(futures_util::stream::empty()))
    }
}

/// Stub agent recording each instruction it is invoked with.
struct StubAgent {
    inputs: Mutex<Vec<String>>,
}

impl StubAgent {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            inputs: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl MessageAgent for StubAgent {
    async fn invoke(&self, input: &str) -> Result<String, AgentError> {
        self.inputs.lock().unwrap().push(input.to_string());
        Ok("Applied label: Inbox-Triage".to_string())
    }
}

fn test_config() -> Config {
    Config {
        api_key: secrecy::SecretString::from("ck_test"),
        base_url: "https://service.test".into(),
        auth_config_id: None,
        llm: LlmConfig {
            backend: LlmBackend::Anthropic,
            api_key: secrecy::SecretString::from("sk-test"),
            model: "test-model".into(),
        },
        connect_poll_interval: Duration::from_millis(10),
    }
}

fn new_message_event(trigger_id: &str, payload: serde_json::Value) -> TriggerEvent {
    TriggerEvent {
        trigger_slug: GMAIL_NEW_MESSAGE_TRIGGER.into(),
        trigger_id: Some(trigger_id.into()),
        payload,
    }
}

// ── Idempotent setup ─────────────────────────────────────────────────

#[tokio::test]
async fn existing_account_and_trigger_are_reused_without_creates() {
    timeout(TEST_TIMEOUT, async {
        let service = FakeService::with_account_and_trigger();
        let setup = setup::prepare(&service, &test_config(), "alice")
            .await
            .unwrap();

        assert_eq!(setup.connected_account_id, "ca_live");
        assert_eq!(setup.trigger_id, "ti_live");

        let log = service.call_log();
        assert!(!log.iter().any(|c| c.starts_with("initiate:")));
        assert!(!log.iter().any(|c| c.starts_with("create_trigger:")));
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn fresh_user_gets_one_connection_and_one_trigger() {
    timeout(TEST_TIMEOUT, async {
        let service = FakeService::default();
        let setup = setup::prepare(&service, &test_config(), "alice")
            .await
            .unwrap();

        // The awaited connection id flows into trigger creation.
        assert_eq!(setup.connected_account_id, "ca_new");
        assert_eq!(setup.trigger_id, "ti_new");

        let log = service.call_log();
        let initiates = log.iter().filter(|c| c.starts_with("initiate:")).count();
        let creates = log
            .iter()
            .filter(|c| c.starts_with("create_trigger:"))
            .count();
        assert_eq!(initiates, 1);
        assert_eq!(creates, 1);
        assert!(log.contains(&format!(
            "create_trigger:{GMAIL_NEW_MESSAGE_TRIGGER}:ca_new"
        )));
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn setup_order_is_account_then_trigger_on_every_branch() {
    timeout(TEST_TIMEOUT, async {
        for (account, trigger) in [
            (None, None),
            (Some("ca_live".to_string()), None),
            (Some("ca_live".to_string()), Some("ti_live".to_string())),
        ] {
            let service = FakeService {
                existing_account: account,
                existing_trigger: trigger,
                ..Default::default()
            };
            setup::prepare(&service, &test_config(), "alice")
                .await
                .unwrap();

            let log = service.call_log();
            let account_pos = log
                .iter()
                .position(|c| c.starts_with("list_accounts:"))
                .expect("account check must happen");
            let trigger_pos = log
                .iter()
                .position(|c| c.starts_with("list_triggers:"))
                .expect("trigger check must happen");
            assert!(
                account_pos < trigger_pos,
                "account step must precede trigger step, got {log:?}"
            );
        }
    })
    .await
    .expect("test timed out");
}

// ── Event dispatch ───────────────────────────────────────────────────

#[tokio::test]
async fn event_is_formatted_into_the_instruction() {
    timeout(TEST_TIMEOUT, async {
        let dispatcher = Dispatcher::new(GMAIL_NEW_MESSAGE_TRIGGER, "ti_live");
        let agent = StubAgent::new();

        let output = dispatcher
            .handle_event(
                &new_message_event(
                    "ti_live",
                    json!({"id": "m1", "subject": "Hello", "message_text": "Hi there"}),
                ),
                agent.as_ref(),
            )
            .await
            .unwrap();

        assert_eq!(output, "Applied label: Inbox-Triage");

        let inputs = agent.inputs.lock().unwrap();
        assert_eq!(inputs.len(), 1);
        for expected in ["m1", "Hello", "Hi there"] {
            assert!(
                inputs[0].contains(expected),
                "instruction must contain {expected:?}"
            );
        }
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn run_dispatches_matching_events_and_skips_others() {
    timeout(TEST_TIMEOUT, async {
        let dispatcher = Dispatcher::new(GMAIL_NEW_MESSAGE_TRIGGER, "ti_live");
        let agent = StubAgent::new();

        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let events: EventStream =
            Box::pin(tokio_stream::wrappers::UnboundedReceiverStream::new(rx));

        tx.send(new_message_event(
            "ti_other",
            json!({"id": "skip", "subject": "Skip", "message_text": "other trigger"}),
        ))
        .unwrap();
        tx.send(new_message_event(
            "ti_live",
            json!({"id": "m1", "subject": "Hello", "message_text": "Hi there"}),
        ))
        .unwrap();
        // Malformed payload is logged and skipped, not fatal.
        tx.send(new_message_event("ti_live", json!({"subject": "broken"})))
            .unwrap();
        drop(tx);

        // Stream end surfaces as StreamClosed once queued events are drained.
        let result = dispatcher.run(events, agent.clone()).await;
        assert!(matches!(
            result,
            Err(Error::Event(EventError::StreamClosed))
        ));

        let inputs = agent.inputs.lock().unwrap();
        assert_eq!(inputs.len(), 1, "only the matching valid event is dispatched");
        assert!(inputs[0].contains("m1"));
    })
    .await
    .expect("test timed out");
}
