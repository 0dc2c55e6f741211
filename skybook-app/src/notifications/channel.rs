//! Push notification channel
//!
//! One WebSocket connection per authenticated client user, merged with the
//! REST-fetched history and unread counter. Socket and read-receipt failures
//! are logged and never escalate to the session.

use super::feed::NotificationFeed;
use crate::{AppError, AppResult};
use futures_util::StreamExt;
use serde::Deserialize;
use skybook_client::NotificationsApi;
use skybook_core::{Notification, Role, UserRecord, WebSocketConfig};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Inbound push frame: the notification rides in the `message` field
#[derive(Debug, Deserialize)]
struct PushEnvelope {
    message: Notification,
}

/// Updates published to feed subscribers
#[derive(Debug, Clone)]
pub enum FeedUpdate {
    /// Initial REST snapshot applied
    Seeded { unread: u64 },
    /// A push delivery arrived
    Received(Notification),
    /// The visible window was marked read and the counter reset
    MarkedAllRead,
}

/// Notification channel for one authenticated client user
pub struct NotificationChannel {
    user_id: Uuid,
    feed: Arc<RwLock<NotificationFeed>>,
    api: Arc<NotificationsApi>,
    updates: broadcast::Sender<FeedUpdate>,
    listener: Option<JoinHandle<()>>,
}

impl NotificationChannel {
    /// Open the channel for an authenticated client-role user.
    ///
    /// Opens the WebSocket and issues the two REST calls (history and unread
    /// count) concurrently; the initial state comes from REST and does not
    /// wait for the socket to connect. Administrators do not subscribe.
    pub async fn open(
        config: &WebSocketConfig,
        user: &UserRecord,
        access_token: &str,
        api: Arc<NotificationsApi>,
    ) -> AppResult<Self> {
        if user.role != Role::Client {
            return Err(AppError::channel(
                "notification channel is only available to client users",
            ));
        }

        let ws_url = format!(
            "{}/ws/notifications/{}/{}/",
            config.base_url.trim_end_matches('/'),
            user.id,
            urlencoding::encode(access_token)
        );

        let feed = Arc::new(RwLock::new(NotificationFeed::new()));
        let (updates, _) = broadcast::channel(32);

        // The socket task owns connection progress; seeding below proceeds
        // without waiting on it
        let listener = tokio::spawn(run_socket(ws_url, feed.clone(), updates.clone()));

        let (history, unread) = tokio::join!(api.recent(user.id), api.unread_count(user.id));
        let (seed_items, seed_unread) = match (history, unread) {
            (Ok(page), Ok(count)) => (page.results, count),
            (history, unread) => {
                if let Err(e) = history {
                    warn!("Failed to fetch notification history: {}", e);
                }
                if let Err(e) = unread {
                    warn!("Failed to fetch unread count: {}", e);
                }
                (Vec::new(), 0)
            }
        };

        {
            let mut feed = feed.write().await;
            feed.seed(seed_items, seed_unread);
        }
        let _ = updates.send(FeedUpdate::Seeded {
            unread: seed_unread,
        });

        info!("Notification channel opened for user {}", user.id);

        Ok(Self {
            user_id: user.id,
            feed,
            api,
            updates,
            listener: Some(listener),
        })
    }

    /// The user this channel is keyed to
    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    /// Observe feed updates
    pub fn subscribe(&self) -> broadcast::Receiver<FeedUpdate> {
        self.updates.subscribe()
    }

    /// Snapshot of the visible window and the unread counter
    pub async fn snapshot(&self) -> (Vec<Notification>, u64) {
        let feed = self.feed.read().await;
        (feed.visible().to_vec(), feed.unread_count())
    }

    /// User opened the notification tray.
    ///
    /// If anything is unread, every currently-unread visible entry gets its
    /// read receipt PATCHed concurrently; once all calls have settled the
    /// local counter is zeroed and the visible flags flipped, regardless of
    /// individual outcomes. Optimistic, not transactional.
    pub async fn open_tray(&self) -> AppResult<()> {
        let unread_ids = {
            let feed = self.feed.read().await;
            if feed.unread_count() == 0 {
                return Ok(());
            }
            feed.unread_visible_ids()
        };

        let results =
            futures::future::join_all(unread_ids.iter().map(|id| self.api.mark_read(id))).await;
        for result in results {
            if let Err(e) = result {
                warn!("Failed to mark notification read: {}", e);
            }
        }

        self.feed.write().await.mark_all_read_local();
        let _ = self.updates.send(FeedUpdate::MarkedAllRead);

        Ok(())
    }

    /// Re-fetch the authoritative unread count and overwrite the local
    /// counter. The server, not the optimistic local state, wins.
    pub async fn resync_unread(&self) -> AppResult<u64> {
        let count = self.api.unread_count(self.user_id).await?;
        self.feed.write().await.reset_unread(count);
        Ok(count)
    }

    /// Close the socket. There is no reconnection: after a close or a drop,
    /// deliveries stop until a new channel is opened.
    pub fn close(&mut self) {
        if let Some(listener) = self.listener.take() {
            listener.abort();
            debug!("Notification channel closed for user {}", self.user_id);
        }
    }
}

impl Drop for NotificationChannel {
    fn drop(&mut self) {
        self.close();
    }
}

/// Socket read loop: parse push frames and fold them into the feed.
/// Connection failures and drops are logged only; pushes silently stop until
/// the channel is reopened.
async fn run_socket(
    ws_url: String,
    feed: Arc<RwLock<NotificationFeed>>,
    updates: broadcast::Sender<FeedUpdate>,
) {
    let (stream, _) = match connect_async(ws_url.as_str()).await {
        Ok(connected) => connected,
        Err(e) => {
            warn!("Failed to connect notification socket: {}", e);
            return;
        }
    };

    info!("Notification socket connected");
    let (_write, mut read) = stream.split();

    while let Some(frame) = read.next().await {
        match frame {
            Ok(Message::Text(text)) => match serde_json::from_str::<PushEnvelope>(&text) {
                Ok(envelope) => {
                    {
                        let mut feed = feed.write().await;
                        feed.push(envelope.message.clone());
                    }
                    let _ = updates.send(FeedUpdate::Received(envelope.message));
                }
                Err(e) => warn!("Ignoring malformed push frame: {}", e),
            },
            Ok(Message::Close(_)) => {
                info!("Notification socket closed by server");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                warn!("Notification socket error: {}", e);
                break;
            }
        }
    }

    info!("Notification socket disconnected");
}
