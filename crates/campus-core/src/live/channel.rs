use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::{NotificationMessage, Transport};

/// Default number of messages shown in a notification list.
pub const DISPLAY_LIMIT: usize = 10;

/// Buffer for subscribers that fall behind.
const SUBSCRIBER_CAPACITY: usize = 64;

#[derive(Default)]
struct FeedState {
    // Newest first.
    messages: VecDeque<NotificationMessage>,
    unread: usize,
}

/// State shared between a channel and its transport task.
pub(crate) struct Feed {
    state: Mutex<FeedState>,
    sender: broadcast::Sender<NotificationMessage>,
}

impl Feed {
    fn new() -> Self {
        let (sender, _) = broadcast::channel(SUBSCRIBER_CAPACITY);
        Self {
            state: Mutex::new(FeedState::default()),
            sender,
        }
    }

    fn state(&self) -> MutexGuard<'_, FeedState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Prepend `message` and count it as unread. Both transports deliver
    /// through here.
    pub(crate) fn deliver(&self, message: NotificationMessage) {
        {
            let mut state = self.state();
            state.messages.push_front(message.clone());
            state.unread += 1;
        }
        debug!(text = %message.text, "Live update delivered");
        // No subscribers is fine.
        let _ = self.sender.send(message);
    }
}

/// A running live-update feed.
///
/// The transport runs as its own task from `start` until `shutdown` or
/// until the channel is dropped.
pub struct LiveChannel {
    feed: Arc<Feed>,
    push: bool,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl LiveChannel {
    /// Spawn `transport` on the current runtime.
    pub fn start(transport: Transport) -> Self {
        let feed = Arc::new(Feed::new());
        let push = transport.is_push();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        info!(push = push, "Starting live-update channel");
        let task = tokio::spawn(transport.run(Arc::clone(&feed), shutdown_rx));

        Self {
            feed,
            push,
            shutdown: Some(shutdown_tx),
            task: Some(task),
        }
    }

    pub fn is_push(&self) -> bool {
        self.push
    }

    pub fn unread_count(&self) -> usize {
        self.feed.state().unread
    }

    /// Every message received so far, newest first.
    pub fn messages(&self) -> Vec<NotificationMessage> {
        self.feed.state().messages.iter().cloned().collect()
    }

    /// The newest `limit` messages.
    pub fn recent(&self, limit: usize) -> Vec<NotificationMessage> {
        self.feed
            .state()
            .messages
            .iter()
            .take(limit)
            .cloned()
            .collect()
    }

    /// Reset the unread counter. Messages are kept.
    pub fn mark_all_read(&self) {
        self.feed.state().unread = 0;
    }

    /// Receive each message as it is delivered.
    pub fn subscribe(&self) -> broadcast::Receiver<NotificationMessage> {
        self.feed.sender.subscribe()
    }

    /// Stop the transport, closing the socket or cancelling the timer, and
    /// wait for it to finish.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            // The task may already have ended on its own.
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                debug!(error = %e, "Live-update task ended abnormally");
            }
        }
        info!("Live-update channel shut down");
    }
}

impl Drop for LiveChannel {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
