//! WebSocket session lifecycle: a single client from upgrade through
//! disconnect.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::ws::{CloseFrame, Message, Utf8Bytes, WebSocket, close_code};
use futures::{SinkExt, StreamExt};
use metrics::{counter, gauge, histogram};
use onboard_core::{ConnectionError, Envelope};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use super::connection::Session;
use super::handler::handle_message;
use super::presence;
use super::registry::ConnectionRegistry;
use crate::actions::{ActionContext, ActionRegistry, ServerContext};
use crate::metrics::{
    WS_CONNECTION_DURATION_SECONDS, WS_CONNECTIONS_ACTIVE, WS_CONNECTIONS_TOTAL,
    WS_DISCONNECTIONS_TOTAL, WS_PROTOCOL_ERRORS_TOTAL, WS_REJECTIONS_TOTAL,
};

/// How long the writer gets to flush a Close frame on shutdown.
const CLOSE_GRACE: Duration = Duration::from_secs(1);

/// State shared by every session task.
pub struct SessionShared {
    /// Live registry.
    pub registry: Arc<ConnectionRegistry>,
    /// Action handlers.
    pub actions: Arc<ActionRegistry>,
    /// Collaborators handed to handlers.
    pub services: ServerContext,
    /// Cancelled on server shutdown.
    pub shutdown: CancellationToken,
    /// Interval between server Ping frames. Two missed intervals disconnect.
    pub ping_interval: Duration,
}

/// Where a session is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// Upgraded but not registered.
    Pending,
    /// Registered and exchanging frames.
    Active,
    /// Unregistered.
    Closed,
}

/// Run a session for an upgraded socket.
///
/// 1. Registers the session; a duplicate ID or a full registry gets one
///    `error` envelope and a policy Close frame
/// 2. Broadcasts the new count to everyone, the newcomer included
/// 3. Forwards queued frames to the socket and pings periodically
/// 4. Validates and dispatches inbound frames; replies go to this session
/// 5. On close, or when the writer stops on a dead transport, unregisters
///    and broadcasts the new count to the rest
#[instrument(skip_all, fields(client_id = %session.id()))]
pub async fn run_client_session(
    socket: WebSocket,
    session: Arc<Session>,
    send_rx: mpsc::Receiver<Arc<String>>,
    shared: Arc<SessionShared>,
) -> SessionState {
    let client_id = session.id();
    let (mut ws_tx, mut ws_rx) = socket.split();

    if let Err(e) = shared.registry.connect(Arc::clone(&session)).await {
        reject(&mut ws_tx, &e).await;
        return SessionState::Pending;
    }

    let connection_start = Instant::now();
    info!(
        username = %session.identity().username,
        state = ?SessionState::Active,
        "client connected"
    );
    counter!(WS_CONNECTIONS_TOTAL).increment(1);
    gauge!(WS_CONNECTIONS_ACTIVE).increment(1.0);
    let _ = presence::notify(&shared.registry).await;

    let mut outbound = tokio::spawn(write_loop(
        ws_tx,
        send_rx,
        Arc::clone(&session),
        shared.shutdown.clone(),
        shared.ping_interval,
    ));

    let ctx = ActionContext {
        session: &session,
        registry: &shared.registry,
        services: &shared.services,
    };

    let mut writer_done = false;
    loop {
        let msg = tokio::select! {
            msg = ws_rx.next() => msg,
            _ = &mut outbound => {
                debug!("writer stopped, treating as disconnect");
                writer_done = true;
                break;
            }
            () = shared.shutdown.cancelled() => {
                debug!("server shutting down, leaving read loop");
                break;
            }
        };
        let Some(Ok(msg)) = msg else { break };
        session.mark_alive();

        let text = match msg {
            Message::Text(t) => t.to_string(),
            Message::Binary(data) => match String::from_utf8(data.to_vec()) {
                Ok(s) => s,
                Err(_) => {
                    debug!(len = data.len(), "non-UTF8 binary frame");
                    counter!(WS_PROTOCOL_ERRORS_TOTAL).increment(1);
                    let reply = Envelope::error("frame is not valid UTF-8 text");
                    if let Err(e) = shared.registry.send(client_id, &reply).await {
                        warn!(error = %e, "failed to enqueue reply");
                    }
                    continue;
                }
            },
            Message::Close(_) => {
                info!("client sent close frame");
                break;
            }
            Message::Ping(_) | Message::Pong(_) => continue,
        };

        if let Some(reply) = handle_message(&text, &ctx, &shared.actions).await {
            if let Err(e) = shared.registry.send(client_id, &reply).await {
                warn!(error = %e, action = %reply.action, "failed to enqueue reply");
            }
        }
    }

    match shared.registry.disconnect(client_id).await {
        Ok(_) | Err(ConnectionError::NotFound(_)) => {}
        Err(e) => warn!(error = %e, "unexpected disconnect failure"),
    }
    let _ = presence::notify(&shared.registry).await;

    info!(state = ?SessionState::Closed, "client disconnected");
    counter!(WS_DISCONNECTIONS_TOTAL).increment(1);
    gauge!(WS_CONNECTIONS_ACTIVE).decrement(1.0);
    histogram!(WS_CONNECTION_DURATION_SECONDS).record(connection_start.elapsed().as_secs_f64());

    if !writer_done {
        if shared.shutdown.is_cancelled() {
            let _ = tokio::time::timeout(CLOSE_GRACE, &mut outbound).await;
        }
        outbound.abort();
    }
    SessionState::Closed
}

async fn write_loop(
    mut ws_tx: futures::stream::SplitSink<WebSocket, Message>,
    mut send_rx: mpsc::Receiver<Arc<String>>,
    session: Arc<Session>,
    shutdown: CancellationToken,
    ping_every: Duration,
) {
    let pong_timeout = ping_every * 2;
    let mut ping_interval = tokio::time::interval(ping_every);
    let _ = ping_interval.tick().await;

    loop {
        tokio::select! {
            msg = send_rx.recv() => {
                let Some(text) = msg else { break };
                let text = Arc::unwrap_or_clone(text);
                if ws_tx.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
            _ = ping_interval.tick() => {
                if !session.check_alive() && session.last_pong_elapsed() > pong_timeout {
                    warn!("client unresponsive for {:?}, disconnecting", pong_timeout);
                    let _ = tokio::time::timeout(CLOSE_GRACE, ws_tx.close()).await;
                    break;
                }
                if ws_tx.send(Message::Ping(Vec::new().into())).await.is_err() {
                    break;
                }
            }
            () = shutdown.cancelled() => {
                let frame = CloseFrame {
                    code: close_code::AWAY,
                    reason: Utf8Bytes::from_static("server shutting down"),
                };
                let _ = ws_tx.send(Message::Close(Some(frame))).await;
                break;
            }
        }
    }
}

async fn reject(
    ws_tx: &mut futures::stream::SplitSink<WebSocket, Message>,
    err: &ConnectionError,
) {
    warn!(error = %err, "session refused");
    counter!(WS_REJECTIONS_TOTAL, "reason" => err.kind()).increment(1);

    match Envelope::error(err.to_string()).to_json() {
        Ok(json) => {
            let _ = ws_tx.send(Message::Text(json.into())).await;
        }
        Err(e) => error!(error = %e, "failed to serialize rejection"),
    }
    let frame = CloseFrame {
        code: close_code::POLICY,
        reason: Utf8Bytes::from_static("session refused"),
    };
    let _ = ws_tx.send(Message::Close(Some(frame))).await;
}
