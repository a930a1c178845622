//! Instruction template for the labeling agent.

use crate::events::MessagePayload;

/// Instruction given to the agent for each new message.
///
/// Slots: `{message_id}`, `{message_subject}`, `{message_text}`.
pub const APPLY_NEW_LABEL: &str = "\
A new email has arrived and needs to be labeled.

Message id: {message_id}
Subject: {message_subject}
Body:
{message_text}

Read the message, look at the labels available in this mailbox, and pick the
single label that best describes it. Create no new labels; if none fits, use
the closest existing one. Then apply that label to the message with id
{message_id} and reply with one sentence naming the label you applied and why.";

/// Render the labeling instruction for one message.
pub fn render_apply_label(payload: &MessagePayload) -> String {
    APPLY_NEW_LABEL
        .replace("{message_id}", &payload.id)
        .replace("{message_subject}", &payload.subject)
        .replace("{message_text}", &payload.message_text)
}
