use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::{
    broadcast::{self, error::RecvError},
    mpsc,
};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info};

use crate::{
    dto::sse::{Handshake, ServerEvent},
    state::SharedState,
};

/// Subscribe to catalog change notifications. The handshake is the first queued event.
pub fn subscribe_catalog(state: &SharedState) -> (ServerEvent, broadcast::Receiver<ServerEvent>) {
    let receiver = state.catalog_sse().subscribe();
    let handshake = Handshake {
        message: "subscribed to catalog updates".into(),
        degraded: state.is_degraded(),
    };
    let event = ServerEvent::json(Some("handshake".to_owned()), &handshake).unwrap_or_else(|_| {
        ServerEvent {
            event: Some("handshake".to_owned()),
            data: String::new(),
        }
    });
    (event, receiver)
}

/// Convert a broadcast receiver into an SSE response, sending `first` before any broadcast event.
pub fn to_sse_stream(
    first: ServerEvent,
    mut receiver: broadcast::Receiver<ServerEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);

    tokio::spawn(async move {
        if tx.send(Ok(into_event(first))).await.is_err() {
            return;
        }

        loop {
            tokio::select! {
                _ = tx.closed() => break,
                recv_result = receiver.recv() => {
                    match recv_result {
                        Ok(payload) => {
                            if tx.send(Ok(into_event(payload))).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Closed) => break,
                        Err(RecvError::Lagged(skipped)) => {
                            debug!(skipped, "catalog SSE subscriber lagged");
                            continue;
                        }
                    }
                }
            }
        }

        info!("catalog SSE stream disconnected");
    });

    Sse::new(ReceiverStream::new(rx)).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

fn into_event(payload: ServerEvent) -> Event {
    let event = Event::default().data(payload.data);
    match payload.event {
        Some(name) => event.event(name),
        None => event,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AppConfig, state::AppState};

    #[tokio::test]
    async fn handshake_reports_degraded_mode() {
        let state = AppState::new(AppConfig::default());
        let (handshake, _receiver) = subscribe_catalog(&state);
        assert_eq!(handshake.event.as_deref(), Some("handshake"));
        let body: serde_json::Value = serde_json::from_str(&handshake.data).unwrap();
        assert_eq!(body["degraded"], true);
        assert_eq!(state.catalog_sse().subscriber_count(), 1);
    }
}
