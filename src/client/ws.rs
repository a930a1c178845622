//! WebSocket event subscription.
//!
//! Opens the service's trigger socket and bridges incoming JSON frames into
//! an in-process event stream. A spawned reader task owns the socket; the
//! caller only sees a `Stream` of parsed [`TriggerEvent`]s. Malformed frames
//! are logged and skipped so one bad payload cannot stall the subscription.

use futures::{SinkExt, StreamExt};
use secrecy::{ExposeSecret, SecretString};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::protocol::Message;
use tracing::{debug, error, info, warn};

use crate::client::{EventStream, TriggerEvent};
use crate::error::ApiError;

/// Path of the trigger subscription socket on the service.
const SUBSCRIBE_PATH: &str = "/api/v3/triggers/subscribe";

/// Map an HTTP(S) base URL to the subscription socket URL.
fn derive_ws_url(base_url: &str) -> Result<url::Url, ApiError> {
    let mut url =
        url::Url::parse(base_url).map_err(|e| ApiError::InvalidUrl(format!("{base_url}: {e}")))?;
    let scheme = match url.scheme() {
        "https" | "wss" => "wss",
        "http" | "ws" => "ws",
        other => {
            return Err(ApiError::InvalidUrl(format!(
                "{base_url}: unsupported scheme {other}"
            )));
        }
    };
    url.set_scheme(scheme)
        .map_err(|_| ApiError::InvalidUrl(base_url.to_string()))?;
    url.set_path(SUBSCRIBE_PATH);
    Ok(url)
}

/// Connect the subscription socket and return the event stream.
pub(crate) async fn open_event_stream(
    base_url: &str,
    api_key: &SecretString,
) -> Result<EventStream, ApiError> {
    let ws_url = derive_ws_url(base_url)?;

    let mut request = ws_url
        .as_str()
        .into_client_request()
        .map_err(|e| ApiError::WebSocket(e.to_string()))?;
    let mut key_value = HeaderValue::from_str(api_key.expose_secret()).map_err(|_| {
        ApiError::WebSocket("API key contains characters invalid in an HTTP header".into())
    })?;
    key_value.set_sensitive(true);
    request.headers_mut().insert("x-api-key", key_value);

    let (socket, _response) = connect_async(request)
        .await
        .map_err(|e| ApiError::WebSocket(e.to_string()))?;
    info!(url = %ws_url, "Trigger subscription connected");

    let (mut write, mut read) = socket.split();
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Some(frame) = read.next().await {
            match frame {
                Ok(Message::Text(text)) => {
                    match serde_json::from_str::<TriggerEvent>(text.as_str()) {
                        Ok(event) => {
                            debug!(slug = %event.trigger_slug, "Received trigger event");
                            if tx.send(event).is_err() {
                                // Receiver dropped; stop reading.
                                break;
                            }
                        }
                        Err(e) => {
                            warn!("Skipping malformed event frame: {e}");
                        }
                    }
                }
                Ok(Message::Ping(data)) => {
                    if write.send(Message::Pong(data)).await.is_err() {
                        break;
                    }
                }
                Ok(Message::Close(_)) => {
                    info!("Trigger subscription closed by the service");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    error!("Trigger subscription read failed: {e}");
                    break;
                }
            }
        }
    });

    Ok(Box::pin(UnboundedReceiverStream::new(rx)))
}
