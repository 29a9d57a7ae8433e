//! Server-Sent Events (SSE) utilities

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};

use crate::events::GuardianEvent;

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);

/// Forward events from `rx` as an SSE stream with a 15 second heartbeat
///
/// Slow clients that fall behind the bus capacity skip the missed events
/// and keep streaming.
pub fn create_event_sse_stream(
    service_name: &'static str,
    mut rx: broadcast::Receiver<GuardianEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!("New SSE client connected to {} events", service_name);

    let stream = async_stream::stream! {
        yield Ok(Event::default()
            .event("ConnectionStatus")
            .data("connected"));

        loop {
            tokio::select! {
                _ = tokio::time::sleep(HEARTBEAT_INTERVAL) => {
                    debug!("SSE: Sending heartbeat");
                    yield Ok(Event::default().comment("heartbeat"));
                }
                received = rx.recv() => {
                    match received {
                        Ok(event) => {
                            let event_type = event.event_type();
                            match serde_json::to_string(&event) {
                                Ok(json) => {
                                    debug!("SSE: Broadcasting {}", event_type);
                                    yield Ok(Event::default().event(event_type).data(json));
                                }
                                Err(e) => {
                                    warn!("SSE: Failed to serialize event {}: {}", event_type, e);
                                }
                            }
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            warn!("SSE: client lagged, skipped {} events", skipped);
                        }
                        Err(RecvError::Closed) => {
                            info!("SSE: {} event bus closed", service_name);
                            break;
                        }
                    }
                }
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::new().interval(HEARTBEAT_INTERVAL).text("heartbeat"))
}
