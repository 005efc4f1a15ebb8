//! HTTP + WebSocket notification surface
//!
//! Endpoints:
//! - GET /health - Health check
//! - GET /status - Latest finger status (never debounced)
//! - WS  /ws     - `detection_event` messages, one per debounced edge

use std::future::Future;
use std::sync::Arc;

use axum::{
    extract::{State, WebSocketUpgrade, ws::{Message, WebSocket}},
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use crate::core::sink::json_line;
use crate::error::Result;
use crate::types::{overlay_text, ClassificationResult, GestureEvent, RenderUpdate};

/// Event name carried by every WebSocket notification
pub const DETECTION_EVENT: &str = "detection_event";

/// Queued notifications per subscriber before the oldest are skipped
const EVENT_CAPACITY: usize = 100;

/// Wire form of a debounced event
#[derive(Debug, Clone, Serialize)]
pub struct DetectionMessage {
    pub event: &'static str,
    #[serde(flatten)]
    pub detail: GestureEvent,
}

/// Shared hand-off point between the capture loop and network clients.
///
/// Publishing is synchronous and never waits on subscribers.
#[derive(Clone)]
pub struct NotifyHub {
    events: broadcast::Sender<DetectionMessage>,
    status: Arc<watch::Sender<Option<RenderUpdate>>>,
}

impl Default for NotifyHub {
    fn default() -> Self {
        Self::new()
    }
}

impl NotifyHub {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let (status, _) = watch::channel(None);
        Self {
            events,
            status: Arc::new(status),
        }
    }

    pub fn publish_event(&self, event: &GestureEvent) {
        let msg = DetectionMessage {
            event: DETECTION_EVENT,
            detail: event.clone(),
        };
        // No subscribers is not an error
        if self.events.send(msg).is_err() {
            debug!(channel = %event.channel, "no websocket subscribers");
        }
    }

    pub fn publish_status(&self, update: RenderUpdate) {
        self.status.send_replace(Some(update));
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DetectionMessage> {
        self.events.subscribe()
    }

    pub fn latest_status(&self) -> Option<RenderUpdate> {
        self.status.borrow().clone()
    }

    pub fn subscriber_count(&self) -> usize {
        self.events.receiver_count()
    }
}

/// App state
pub struct AppState {
    pub hub: NotifyHub,
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub subscribers: usize,
}

/// Status response
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub hand_detected: bool,
    pub overlay: String,
    pub frame_index: Option<u64>,
    pub timestamp: Option<f64>,
    pub result: Option<ClassificationResult>,
}

/// Create the API router
pub fn create_router(hub: NotifyHub) -> Router {
    let state = Arc::new(AppState { hub });

    Router::new()
        .route("/health", get(health))
        .route("/status", get(status))
        .route("/ws", get(websocket_handler))
        .with_state(state)
}

/// Health check endpoint
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: crate::VERSION.to_string(),
        subscribers: state.hub.subscriber_count(),
    })
}

/// Latest render status
async fn status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let response = match state.hub.latest_status() {
        Some(update) => StatusResponse {
            hand_detected: update.hand_detected(),
            overlay: update.overlay,
            frame_index: Some(update.frame_index),
            timestamp: Some(update.timestamp),
            result: update.result,
        },
        None => StatusResponse {
            hand_detected: false,
            overlay: overlay_text(None),
            frame_index: None,
            timestamp: None,
            result: None,
        },
    };
    Json(response)
}

/// WebSocket handler for live detection events
async fn websocket_handler(
    State(state): State<Arc<AppState>>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let rx = state.hub.subscribe();
    ws.on_upgrade(move |socket| handle_websocket(socket, rx))
}

/// Forward events until either side goes away
async fn handle_websocket(socket: WebSocket, mut rx: broadcast::Receiver<DetectionMessage>) {
    info!("websocket client connected");
    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            msg = rx.recv() => match msg {
                Ok(msg) => {
                    let Some(json) = json_line(&msg) else {
                        continue;
                    };
                    if sender.send(Message::Text(json)).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "websocket client lagging, events skipped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }
    info!("websocket client disconnected");
}

/// Run the API server until `shutdown` resolves
pub async fn run_server(
    addr: &str,
    hub: NotifyHub,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let router = create_router(hub);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "notification server listening");
    println!("  GET  /health - Health check");
    println!("  GET  /status - Latest finger status");
    println!("  WS   /ws     - Detection events");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}
