//! Event dispatcher — drives the agent from the trigger subscription.
//!
//! Payloads arrive as loosely typed JSON; [`MessagePayload`] pins down the
//! fields this process needs and rejects anything missing them at the
//! boundary, so handler logic never touches undefined keys.

use std::sync::Arc;

use futures::StreamExt;
use tracing::{debug, error, info};

use crate::agent::MessageAgent;
use crate::client::{EventStream, TriggerEvent};
use crate::error::{Error, EventError};
use crate::prompt::render_apply_label;

/// Fixed-shape record of one new-message event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessagePayload {
    /// Provider message id, used by the agent to act on the message.
    pub id: String,
    pub subject: String,
    pub message_text: String,
}

impl MessagePayload {
    /// Extract the record from a raw event payload.
    ///
    /// Fails with the offending field name on the first missing or
    /// non-string field.
    pub fn from_value(payload: &serde_json::Value) -> Result<Self, EventError> {
        Ok(Self {
            id: string_field(payload, "id")?,
            subject: string_field(payload, "subject")?,
            message_text: string_field(payload, "message_text")?,
        })
    }
}

fn string_field(payload: &serde_json::Value, field: &'static str) -> Result<String, EventError> {
    match payload.get(field) {
        None | Some(serde_json::Value::Null) => Err(EventError::MissingField { field }),
        Some(serde_json::Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(EventError::InvalidField { field }),
    }
}

/// Dispatches subscription events to the labeling agent.
pub struct Dispatcher {
    trigger_slug: String,
    trigger_id: String,
}

impl Dispatcher {
    /// Dispatcher for events of `trigger_slug` from the trigger instance
    /// `trigger_id`.
    pub fn new(trigger_slug: impl Into<String>, trigger_id: impl Into<String>) -> Self {
        Self {
            trigger_slug: trigger_slug.into(),
            trigger_id: trigger_id.into(),
        }
    }

    /// Whether an event belongs to this dispatcher's subscription.
    ///
    /// Events are scoped by slug and by the trigger id registered at setup.
    /// Events without a trigger id pass the slug check alone (older service
    /// deliveries omit it).
    pub fn matches(&self, event: &TriggerEvent) -> bool {
        if event.trigger_slug != self.trigger_slug {
            return false;
        }
        match event.trigger_id.as_deref() {
            Some(id) => id == self.trigger_id,
            None => true,
        }
    }

    /// Handle one event: validate the payload, announce the subject, invoke
    /// the agent with the rendered instruction, and report its output.
    pub async fn handle_event(
        &self,
        event: &TriggerEvent,
        agent: &dyn MessageAgent,
    ) -> Result<String, Error> {
        let payload = MessagePayload::from_value(&event.payload)?;

        println!("> Received email with subject: {}", payload.subject);

        let instruction = render_apply_label(&payload);
        let output = agent.invoke(&instruction).await?;

        println!("> Result: {output}");
        Ok(output)
    }

    /// Serve events until the process is stopped.
    ///
    /// Per-event failures (bad payloads, agent errors) are logged and do not
    /// end the loop; the loop only exits on Ctrl+C or when the service
    /// closes the stream, the latter being an error.
    pub async fn run(
        &self,
        mut events: EventStream,
        agent: Arc<dyn MessageAgent>,
    ) -> Result<(), Error> {
        loop {
            tokio::select! {
                biased;
                _ = tokio::signal::ctrl_c() => {
                    info!("Ctrl+C received, shutting down...");
                    return Ok(());
                }
                event = events.next() => {
                    match event {
                        Some(event) => {
                            if !self.matches(&event) {
                                debug!(
                                    slug = %event.trigger_slug,
                                    "Ignoring event outside this subscription"
                                );
                                continue;
                            }
                            if let Err(e) = self.handle_event(&event, agent.as_ref()).await {
                                error!("Event handling failed: {e}");
                            }
                        }
                        None => return Err(EventError::StreamClosed.into()),
                    }
                }
            }
        }
    }
}
