//! In-memory notification feed state
//!
//! The visible list is bounded to the most recent entries, newest first.
//! The unread counter is tracked separately and may exceed the number of
//! unread entries in the visible window, because it also counts
//! notifications that were truncated out and duplicate deliveries.

use skybook_core::Notification;

/// Size of the visible window
pub const VISIBLE_LIMIT: usize = 10;

/// Bounded notification list plus the unread counter
#[derive(Debug, Clone, Default)]
pub struct NotificationFeed {
    items: Vec<Notification>,
    unread: u64,
}

impl NotificationFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply the initial REST snapshot: recent history (newest first) and
    /// the authoritative unread count
    pub fn seed(&mut self, recent: Vec<Notification>, unread: u64) {
        self.items = recent;
        self.items.truncate(VISIBLE_LIMIT);
        self.unread = unread;
    }

    /// Apply one push delivery: prepend, truncate, and count it as unread.
    /// The counter increments by exactly one per delivery, whether or not
    /// the notification survives truncation or is a duplicate.
    pub fn push(&mut self, notification: Notification) {
        self.items.insert(0, notification);
        self.items.truncate(VISIBLE_LIMIT);
        self.unread += 1;
    }

    /// Visible window, newest first
    pub fn visible(&self) -> &[Notification] {
        &self.items
    }

    pub fn unread_count(&self) -> u64 {
        self.unread
    }

    /// Ids of the visible entries that are still unread
    pub fn unread_visible_ids(&self) -> Vec<String> {
        self.items
            .iter()
            .filter(|n| !n.is_read)
            .map(|n| n.id.clone())
            .collect()
    }

    /// Zero the counter and flip every visible read flag. Called after the
    /// per-item read receipts have settled, regardless of their outcomes.
    pub fn mark_all_read_local(&mut self) {
        self.unread = 0;
        for item in &mut self.items {
            item.is_read = true;
        }
    }

    /// Overwrite the counter with a freshly fetched authoritative value
    pub fn reset_unread(&mut self, unread: u64) {
        self.unread = unread;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notification(id: &str) -> Notification {
        Notification {
            id: id.to_string(),
            user_id: "user-1".to_string(),
            message: format!("message {}", id),
            event_type: None,
            is_read: false,
            timestamp: "2025-03-01T10:00:00".to_string(),
        }
    }

    #[test]
    fn test_three_pushes_from_zero_count_three_unread() {
        let mut feed = NotificationFeed::new();
        for i in 0..3 {
            feed.push(notification(&i.to_string()));
        }

        assert_eq!(feed.unread_count(), 3);
        assert_eq!(feed.visible().len(), 3);
    }

    #[test]
    fn test_fifteen_pushes_keep_ten_most_recent_newest_first() {
        let mut feed = NotificationFeed::new();
        for i in 0..15 {
            feed.push(notification(&i.to_string()));
        }

        assert_eq!(feed.visible().len(), VISIBLE_LIMIT);
        // Newest first: ids 14 down to 5
        let ids: Vec<&str> = feed.visible().iter().map(|n| n.id.as_str()).collect();
        let expected: Vec<String> = (5..15).rev().map(|i| i.to_string()).collect();
        assert_eq!(
            ids,
            expected.iter().map(String::as_str).collect::<Vec<_>>()
        );
        // The counter keeps counting past the window
        assert_eq!(feed.unread_count(), 15);
    }

    #[test]
    fn test_mark_all_read_resets_counter_and_flips_flags() {
        let mut feed = NotificationFeed::new();
        for i in 0..3 {
            feed.push(notification(&i.to_string()));
        }

        feed.mark_all_read_local();

        assert_eq!(feed.unread_count(), 0);
        assert!(feed.visible().iter().all(|n| n.is_read));
        assert!(feed.unread_visible_ids().is_empty());
    }

    #[test]
    fn test_duplicate_deliveries_still_increment_the_counter() {
        let mut feed = NotificationFeed::new();
        feed.push(notification("same"));
        feed.push(notification("same"));

        // Approximate by design: no de-duplication
        assert_eq!(feed.unread_count(), 2);
        assert_eq!(feed.visible().len(), 2);
    }

    #[test]
    fn test_seed_truncates_and_adopts_authoritative_count() {
        let mut feed = NotificationFeed::new();
        let history: Vec<Notification> =
            (0..12).map(|i| notification(&i.to_string())).collect();

        feed.seed(history, 27);

        assert_eq!(feed.visible().len(), VISIBLE_LIMIT);
        assert_eq!(feed.unread_count(), 27);
    }

    #[test]
    fn test_unread_visible_ids_skips_read_entries() {
        let mut feed = NotificationFeed::new();
        let mut read = notification("read");
        read.is_read = true;
        feed.seed(vec![read, notification("unread")], 1);

        assert_eq!(feed.unread_visible_ids(), vec!["unread".to_string()]);
    }
}
