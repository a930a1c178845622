//! Error types for the labeler.

/// Top-level error type for the labeler.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),

    #[error("Trigger error: {0}")]
    Trigger(#[from] TriggerError),

    #[error("Event error: {0}")]
    Event(#[from] EventError),

    #[error("Agent error: {0}")]
    Agent(#[from] AgentError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Errors from the tool-routing service client.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Request to {endpoint} failed: {reason}")]
    RequestFailed { endpoint: String, reason: String },

    #[error("Service returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Invalid response from {endpoint}: {reason}")]
    InvalidResponse { endpoint: String, reason: String },

    #[error("Invalid service URL: {0}")]
    InvalidUrl(String),

    #[error("WebSocket error: {0}")]
    WebSocket(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Connection setup errors.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Connection {id} entered terminal status {status}")]
    Terminal { id: String, status: String },

    #[error("Connection request for user {user_id} returned no redirect URL")]
    NoRedirectUrl { user_id: String },
}

/// Trigger registration errors.
#[derive(Debug, thiserror::Error)]
pub enum TriggerError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Trigger creation for account {connected_account_id} returned no id")]
    MissingId { connected_account_id: String },
}

/// Event payload and delivery errors.
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("Event payload missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("Event payload field {field} is not a string")]
    InvalidField { field: &'static str },

    #[error("Event stream closed by the service")]
    StreamClosed,
}

/// Agent construction and invocation errors.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("Failed to build agent for backend {backend}: {reason}")]
    BuildFailed { backend: String, reason: String },

    #[error("Agent invocation failed: {0}")]
    InvocationFailed(String),

    #[error("Tool {name} failed: {reason}")]
    ToolFailed { name: String, reason: String },
}

/// Result type alias for the labeler.
pub type Result<T> = std::result::Result<T, Error>;
