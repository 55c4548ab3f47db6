//! WebSocket entry point for tracking sessions.

use axum::{
    extract::{
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use serde::Deserialize;
use std::borrow::Cow;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::models::{ClientMessage, Role};
use crate::AppState;

/// Application close code for a connection that failed validation. Clients
/// treat it as "tracking unavailable" and fall back to REST polling.
pub const CLOSE_UNAUTHORIZED: u16 = 4003;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackQuery {
    pub session: String,
    pub role: Role,
    pub user_id: String,
}

/// WebSocket handler
pub async fn track_ws(
    Query(query): Query<TrackQuery>,
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    info!(
        "New tracking connection attempt for session {} as {} '{}'",
        query.session, query.role, query.user_id
    );
    ws.on_upgrade(move |socket| handle_socket(socket, query, state))
}

async fn handle_socket(socket: WebSocket, query: TrackQuery, state: Arc<AppState>) {
    let (sender, receiver) = socket.split();
    run_connection(sender, receiver, query, state).await;
}

/// Drive one tracking connection end to end. Generic over the socket halves
/// so tests can run the loop against in-memory channels.
async fn run_connection<S, R>(mut sender: S, mut receiver: R, query: TrackQuery, state: Arc<AppState>)
where
    S: Sink<Message> + Unpin + Send + 'static,
    S::Error: Send,
    R: Stream<Item = Result<Message, axum::Error>> + Unpin + Send + 'static,
{
    let TrackQuery {
        session,
        role,
        user_id,
    } = query;

    // The registry holds the tx side; the send task drains rx into the
    // socket. A clone is kept so disconnect can identify this handle.
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    if !state.service.connect(&session, role, &user_id, tx.clone()).await {
        warn!(
            "Refusing connection to session {} for {} '{}'",
            session, role, user_id
        );
        let _ = sender
            .send(Message::Close(Some(CloseFrame {
                code: CLOSE_UNAUTHORIZED,
                reason: Cow::from("unauthorized"),
            })))
            .await;
        return;
    }

    let mut send_task = tokio::spawn(async move {
        while let Some(payload) = rx.recv().await {
            if sender.send(Message::Text(payload)).await.is_err() {
                break;
            }
        }
    });

    let service = state.service.clone();
    let recv_session = session.clone();
    let recv_user = user_id.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            let message = match result {
                Ok(message) => message,
                Err(e) => {
                    info!("Socket error in session {}: {}", recv_session, e);
                    break;
                }
            };
            match message {
                Message::Text(text) => {
                    let parsed: ClientMessage = match serde_json::from_str(&text) {
                        Ok(parsed) => parsed,
                        Err(e) => {
                            // Malformed frames are dropped without a reply.
                            error!(
                                "Dropping malformed frame in session {}: {}",
                                recv_session, e
                            );
                            continue;
                        }
                    };
                    service
                        .handle_message(&recv_session, role, &recv_user, parsed)
                        .await;
                }
                Message::Close(_) => break,
                // Ping/pong is handled by the protocol layer; binary frames
                // are not part of the tracking protocol.
                _ => {}
            }
        }
    });

    // Wait for either task to finish (and finish the other)
    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    state.service.disconnect(&session, role, &user_id, &tx).await;
    info!(
        "Tracking connection closed for session {} ({} '{}')",
        session, role, user_id
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_channel::mpsc as socket_mpsc;

    use crate::collab::fixtures::{booking, user};
    use crate::collab::BookingStore;
    use crate::collab::memory::{InMemoryBookingStore, InMemoryUserStore};
    use crate::models::BookingStatus;
    use crate::tracking::lifecycle::TrackingService;
    use crate::tracking::registry::ConnectionRegistry;
    use crate::tracking::store::SessionStore;

    type SocketFrames = socket_mpsc::UnboundedReceiver<Message>;
    type FrameFeed = socket_mpsc::UnboundedSender<Result<Message, axum::Error>>;

    async fn setup() -> (Arc<AppState>, Arc<InMemoryBookingStore>) {
        let bookings = Arc::new(InMemoryBookingStore::new());
        bookings
            .insert(booking("B1", "P1", "C1", BookingStatus::Accepted))
            .await;
        let users = Arc::new(InMemoryUserStore::new());
        users.insert(user("P1", "Asha")).await;
        users.insert(user("C1", "Ravi")).await;
        let service = Arc::new(TrackingService::new(
            Arc::new(SessionStore::new()),
            Arc::new(ConnectionRegistry::new()),
            bookings.clone(),
            users,
        ));
        let state = Arc::new(AppState {
            service,
            ws_public_url: "ws://localhost:3000".to_string(),
        });
        (state, bookings)
    }

    fn driver_query(user_id: &str) -> TrackQuery {
        TrackQuery {
            session: "B1".to_string(),
            role: Role::Driver,
            user_id: user_id.to_string(),
        }
    }

    fn socket_halves() -> (
        socket_mpsc::UnboundedSender<Message>,
        SocketFrames,
        FrameFeed,
        socket_mpsc::UnboundedReceiver<Result<Message, axum::Error>>,
    ) {
        let (out_tx, out_rx) = socket_mpsc::unbounded();
        let (in_tx, in_rx) = socket_mpsc::unbounded();
        (out_tx, out_rx, in_tx, in_rx)
    }

    #[tokio::test]
    async fn refused_handshake_closes_with_unauthorized_code() {
        let (state, _) = setup().await;
        let (out_tx, mut out_rx, in_tx, in_rx) = socket_halves();
        drop(in_tx);

        // P9 is not the assigned provider of B1.
        run_connection(out_tx, in_rx, driver_query("P9"), state.clone()).await;

        match out_rx.try_next().unwrap().unwrap() {
            Message::Close(Some(frame)) => {
                assert_eq!(frame.code, CLOSE_UNAUTHORIZED);
                assert_eq!(frame.reason, "unauthorized");
            }
            other => panic!("expected a close frame, got {:?}", other),
        }
        // Refusal mutates no state.
        assert_eq!(state.service.stats().await, (0, 0));
    }

    #[tokio::test]
    async fn malformed_frames_are_dropped_and_the_loop_continues() {
        let (state, bookings) = setup().await;
        let (out_tx, _out_rx, in_tx, in_rx) = socket_halves();

        in_tx
            .unbounded_send(Ok(Message::Text("not json".to_string())))
            .unwrap();
        in_tx
            .unbounded_send(Ok(Message::Text(
                r#"{"type":"location_update","data":{"latitude":12.9,"longitude":77.6}}"#
                    .to_string(),
            )))
            .unwrap();
        in_tx.unbounded_send(Ok(Message::Close(None))).unwrap();
        drop(in_tx);

        run_connection(out_tx, in_rx, driver_query("P1"), state.clone()).await;

        // The frame after the malformed one was still processed, and the
        // close frame ran the normal teardown, flushing the last location.
        assert_eq!(state.service.stats().await, (0, 0));
        let stored = bookings.booking("B1").await.unwrap().unwrap();
        let location = stored.current_location.unwrap();
        assert_eq!(location.latitude, 12.9);
        assert_eq!(location.longitude, 77.6);
    }

    #[tokio::test]
    async fn closing_the_socket_tears_the_session_down() {
        let (state, _) = setup().await;
        let (out_tx, _out_rx, in_tx, in_rx) = socket_halves();

        let run = tokio::spawn(run_connection(
            out_tx,
            in_rx,
            driver_query("P1"),
            state.clone(),
        ));
        // Give the connection a moment to validate and register.
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert_eq!(state.service.stats().await, (1, 1));

        drop(in_tx);
        run.await.unwrap();
        assert_eq!(state.service.stats().await, (0, 0));
    }
}
