//! Near-real-time notification view for authenticated client users
//!
//! Merges WebSocket push delivery with REST-fetched history and the
//! authoritative unread counter.

pub mod channel;
pub mod feed;

pub use channel::{FeedUpdate, NotificationChannel};
pub use feed::{NotificationFeed, VISIBLE_LIMIT};
