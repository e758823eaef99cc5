// src/server/reload.rs

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

const RELOAD_CAPACITY: usize = 64;

/// Message pushed to connected browsers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ReloadMessage {
    /// Full page reload.
    Reload,
    /// Swap the stylesheet at `path` without reloading.
    Css { path: String },
}

/// Fan-out to every open live-reload connection.
///
/// Cheap to clone; all clones share one channel. Sending with no browser
/// connected is not an error.
#[derive(Debug, Clone)]
pub struct ReloadHub {
    sender: broadcast::Sender<ReloadMessage>,
    clients: Arc<AtomicUsize>,
    /// Directory the dev server serves, relative to the project root.
    served: Arc<PathBuf>,
}

impl Default for ReloadHub {
    fn default() -> Self {
        Self::new()
    }
}

impl ReloadHub {
    pub fn new() -> Self {
        Self::serving(".")
    }

    /// Hub for a dev server whose document root is `served`, relative to
    /// the project root. Stylesheet paths are announced relative to it so
    /// they line up with the `href`s pages use.
    pub fn serving(served: impl AsRef<Path>) -> Self {
        let (sender, _) = broadcast::channel(RELOAD_CAPACITY);
        let served: PathBuf = served
            .as_ref()
            .components()
            .filter(|c| !matches!(c, Component::CurDir))
            .collect();
        Self {
            sender,
            clients: Arc::new(AtomicUsize::new(0)),
            served: Arc::new(served),
        }
    }

    pub fn subscribe(&self) -> ReloadSubscription {
        self.clients.fetch_add(1, Ordering::SeqCst);
        debug!(clients = self.client_count(), "live-reload client connected");
        ReloadSubscription {
            inner: self.sender.subscribe(),
            clients: Arc::clone(&self.clients),
        }
    }

    pub fn notify_reload(&self) {
        self.send(ReloadMessage::Reload);
    }

    /// Tell browsers that the stylesheet at `path` (relative to the project
    /// root) was rewritten.
    ///
    /// A sheet outside the served directory keeps its project-relative path;
    /// no page links it, so clients fall back to a full reload.
    pub fn notify_style_update(&self, path: &Path) {
        let path = path.strip_prefix(self.served.as_path()).unwrap_or(path);
        self.send(ReloadMessage::Css {
            path: path.to_string_lossy().replace('\\', "/"),
        });
    }

    pub fn client_count(&self) -> usize {
        self.clients.load(Ordering::SeqCst)
    }

    fn send(&self, message: ReloadMessage) {
        match self.sender.send(message) {
            Ok(receivers) => debug!(receivers, "live-reload message sent"),
            Err(broadcast::error::SendError(message)) => {
                debug!(?message, "no live-reload clients connected")
            }
        }
    }
}

/// Receiving side held by one browser connection.
#[derive(Debug)]
pub struct ReloadSubscription {
    inner: broadcast::Receiver<ReloadMessage>,
    clients: Arc<AtomicUsize>,
}

impl ReloadSubscription {
    /// Next message, skipping over any the connection was too slow to see.
    /// `None` once every hub handle is gone.
    pub async fn recv(&mut self) -> Option<ReloadMessage> {
        loop {
            match self.inner.recv().await {
                Ok(message) => return Some(message),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "live-reload client lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

impl Drop for ReloadSubscription {
    fn drop(&mut self) {
        self.clients.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_serialize_with_type_tag() {
        let css = ReloadMessage::Css {
            path: "assets/css/main.min.css".into(),
        };
        assert_eq!(
            serde_json::to_string(&css).unwrap(),
            r#"{"type":"css","path":"assets/css/main.min.css"}"#
        );
        assert_eq!(serde_json::to_string(&ReloadMessage::Reload).unwrap(), r#"{"type":"reload"}"#);
    }

    #[tokio::test]
    async fn subscribers_receive_and_are_counted() {
        let hub = ReloadHub::new();
        hub.notify_reload(); // no clients yet; dropped silently

        let mut sub = hub.subscribe();
        assert_eq!(hub.client_count(), 1);

        hub.notify_style_update(Path::new("assets/css/main.min.css"));
        assert_eq!(
            sub.recv().await,
            Some(ReloadMessage::Css {
                path: "assets/css/main.min.css".into()
            })
        );

        drop(sub);
        assert_eq!(hub.client_count(), 0);
    }

    #[tokio::test]
    async fn style_paths_are_relative_to_the_served_root() {
        let hub = ReloadHub::serving("./dist");
        let mut sub = hub.subscribe();

        hub.notify_style_update(Path::new("dist/css/main.min.css"));
        hub.notify_style_update(Path::new("assets/css/other.css"));

        assert_eq!(
            sub.recv().await,
            Some(ReloadMessage::Css {
                path: "css/main.min.css".into()
            })
        );
        assert_eq!(
            sub.recv().await,
            Some(ReloadMessage::Css {
                path: "assets/css/other.css".into()
            })
        );
    }
}
