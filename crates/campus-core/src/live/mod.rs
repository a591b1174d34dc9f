//! Live-update notification feed.
//!
//! A `LiveChannel` runs one `Transport` for its whole lifetime:
//! - `Transport::Push` reads messages from a websocket endpoint
//! - `Transport::Simulated` produces a canned message every five seconds
//!
//! Both deliver into the same state, so subscribers cannot tell them apart.
//! Consumers read `unread_count()` and `messages()`, reset the counter with
//! `mark_all_read()`, or `subscribe()` to receive messages as they arrive.

pub mod channel;
pub mod message;
pub mod transport;

pub use channel::{LiveChannel, DISPLAY_LIMIT};
pub use message::NotificationMessage;
pub use transport::{Transport, SIMULATED_INTERVAL, SIMULATED_MESSAGES};
