//! Gmail auto-labeler — an event-driven labeling agent.
//!
//! When a new Gmail message arrives, an LLM-backed agent decides which label
//! to apply and applies it through the tool-routing service. The library is
//! the orchestration core: connection setup, trigger registration, event
//! dispatch, and the agent seam. The binary in `main.rs` wires it together.

pub mod agent;
pub mod client;
pub mod config;
pub mod connection;
pub mod error;
pub mod events;
pub mod prompt;
pub mod setup;
pub mod triggers;
