use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::StreamExt;
use tokio::sync::oneshot;
use tokio::time::{interval_at, Instant};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

use super::channel::Feed;
use super::NotificationMessage;

/// How often the simulated transport produces a message.
pub const SIMULATED_INTERVAL: Duration = Duration::from_secs(5);

/// Texts the simulated transport cycles through, in order.
pub const SIMULATED_MESSAGES: [&str; 5] = [
    "New notice posted: Academic Calendar Updated",
    "Event reminder: Tech Fest tomorrow",
    "Lost item found: Blue backpack in library",
    "New user registered: John Doe",
    "Event cancelled: Workshop on AI",
];

/// Where live updates come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transport {
    /// A websocket endpoint pushing one message per frame.
    Push { url: String },
    /// A local timer producing canned messages.
    Simulated { interval: Duration },
}

impl Transport {
    /// Push if a live URL is configured, simulated otherwise.
    pub fn from_config(live_url: Option<&str>) -> Self {
        match live_url.map(str::trim).filter(|url| !url.is_empty()) {
            Some(url) => Transport::Push {
                url: url.to_string(),
            },
            None => Transport::Simulated {
                interval: SIMULATED_INTERVAL,
            },
        }
    }

    pub fn is_push(&self) -> bool {
        matches!(self, Transport::Push { .. })
    }

    /// Feed messages into `feed` until `shutdown` fires or the source ends.
    pub(crate) async fn run(self, feed: Arc<Feed>, shutdown: oneshot::Receiver<()>) {
        match self {
            Transport::Push { url } => run_push(url, feed, shutdown).await,
            Transport::Simulated { interval } => run_simulated(interval, feed, shutdown).await,
        }
    }
}

/// Connection lifecycle: open, messages, then close or error. Failures are
/// logged and not retried.
async fn run_push(url: String, feed: Arc<Feed>, mut shutdown: oneshot::Receiver<()>) {
    let (mut socket, _response) = match connect_async(url.as_str()).await {
        Ok(connected) => connected,
        Err(e) => {
            warn!(url = %url, error = %e, "Failed to connect live-update socket");
            return;
        }
    };
    info!(url = %url, "Live-update socket connected");

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                if let Err(e) = socket.close(None).await {
                    debug!(error = %e, "Error closing live-update socket");
                }
                info!(url = %url, "Live-update socket closed");
                break;
            }
            frame = socket.next() => match frame {
                Some(Ok(Message::Text(text))) => feed.deliver(NotificationMessage::decode(&text)),
                Some(Ok(Message::Binary(bytes))) => {
                    feed.deliver(NotificationMessage::decode(&String::from_utf8_lossy(&bytes)))
                }
                Some(Ok(Message::Close(frame))) => {
                    warn!(url = %url, frame = ?frame, "Live-update socket closed by server");
                    break;
                }
                // Pings are answered by tungstenite itself.
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(url = %url, error = %e, "Live-update socket error");
                    break;
                }
                None => {
                    warn!(url = %url, "Live-update socket ended");
                    break;
                }
            },
        }
    }
}

async fn run_simulated(interval: Duration, feed: Arc<Feed>, mut shutdown: oneshot::Receiver<()>) {
    info!(interval_secs = interval.as_secs(), "Starting simulated live feed");
    let mut ticker = interval_at(Instant::now() + interval, interval);
    let mut index = 0usize;

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Simulated live feed stopped");
                break;
            }
            _ = ticker.tick() => {
                let text = SIMULATED_MESSAGES[index % SIMULATED_MESSAGES.len()];
                feed.deliver(NotificationMessage::simulated(text, Utc::now()));
                index += 1;
            }
        }
    }
}
