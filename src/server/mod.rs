// src/server/mod.rs

//! Development HTTP server with live reload.
//!
//! Serves the project's static files and a websocket at `/__livereload`
//! through which [`ReloadHub`] pushes reload and stylesheet-swap messages.
//! Pages opt in by including `/__livereload.js`.

pub mod reload;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use axum::Router;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tracing::{debug, info, warn};

use crate::engine::{Completion, TaskContext};
use crate::errors::TaskError;

pub use reload::{ReloadHub, ReloadMessage, ReloadSubscription};

pub const LIVERELOAD_PATH: &str = "/__livereload";
pub const CLIENT_SCRIPT_PATH: &str = "/__livereload.js";

const CLIENT_SCRIPT: &str = include_str!("client.js");

/// Bind the listening socket. Failure here is fatal for the run.
pub async fn bind(addr: SocketAddr) -> Result<TcpListener, TaskError> {
    TcpListener::bind(addr)
        .await
        .map_err(|source| TaskError::Bind { addr, source })
}

pub fn router(root: &Path, hub: ReloadHub) -> Router {
    Router::new()
        .route(LIVERELOAD_PATH, get(live_reload))
        .route(CLIENT_SCRIPT_PATH, get(client_script))
        .fallback_service(ServeDir::new(root))
        .with_state(hub)
}

/// Serve `root` on an already bound listener until the process ends.
pub async fn start(listener: TcpListener, root: PathBuf, hub: ReloadHub) -> Result<(), TaskError> {
    if let Ok(addr) = listener.local_addr() {
        info!(url = %format!("http://{addr}/"), root = %root.display(), "dev server listening");
    }

    axum::serve(listener, router(&root, hub))
        .await
        .map_err(|source| TaskError::io(root, source))
}

/// Body of a `serve` task: bind `addr`, then serve `root` forever.
pub fn serve_task(
    root: PathBuf,
    addr: SocketAddr,
) -> impl Fn(TaskContext) -> Completion + Send + Sync + 'static {
    move |ctx: TaskContext| {
        let root = root.clone();
        Completion::future(async move {
            let listener = bind(addr).await?;
            start(listener, root, ctx.reload().clone()).await
        })
    }
}

async fn client_script() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/javascript")], CLIENT_SCRIPT)
}

async fn live_reload(ws: WebSocketUpgrade, State(hub): State<ReloadHub>) -> Response {
    ws.on_upgrade(move |socket| push_messages(socket, hub))
}

async fn push_messages(socket: WebSocket, hub: ReloadHub) {
    let mut subscription = hub.subscribe();
    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            message = subscription.recv() => {
                let Some(message) = message else { break };
                let payload = match serde_json::to_string(&message) {
                    Ok(payload) => payload,
                    Err(err) => {
                        warn!(error = %err, "could not encode live-reload message");
                        continue;
                    }
                };
                if sender.send(Message::Text(payload.into())).await.is_err() {
                    break;
                }
            }
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }
    debug!("live-reload client disconnected");
}
