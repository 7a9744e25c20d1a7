//! Short-lived caches for activity logging.
//!
//! The gateway can deliver the same delete or edit twice. [`DedupCache`] remembers what was
//! logged for a few seconds so the second delivery is dropped. [`RecentMessages`] remembers the
//! last messages seen so a delete can still be logged with its author and content after the
//! message itself is gone. Both are process-local and start empty.

use moka::sync::Cache;
use std::time::Duration;

/// Default dedup window
pub const DEFAULT_DEDUP_WINDOW: Duration = Duration::from_secs(5);

/// Suppresses repeated delete and edit events.
#[derive(Clone)]
pub struct DedupCache {
    deletes: Cache<u64, ()>,
    edits: Cache<(u64, String), ()>,
}

impl Default for DedupCache {
    fn default() -> Self {
        Self::with_window(DEFAULT_DEDUP_WINDOW)
    }
}

impl DedupCache {
    /// Cache whose markers expire after `window`
    #[must_use]
    pub fn with_window(window: Duration) -> Self {
        Self {
            deletes: Cache::builder()
                .max_capacity(10_000)
                .time_to_live(window)
                .build(),
            edits: Cache::builder()
                .max_capacity(10_000)
                .time_to_live(window)
                .build(),
        }
    }

    /// Returns true the first time a delete of `message_id` is seen within the window.
    #[must_use]
    pub fn first_delete(&self, message_id: u64) -> bool {
        self.deletes
            .entry(message_id)
            .or_insert_with(|| ())
            .is_fresh()
    }

    /// Returns true the first time `message_id` is seen edited to `content` within the window.
    #[must_use]
    pub fn first_edit(&self, message_id: u64, content: &str) -> bool {
        self.edits
            .entry((message_id, content.to_string()))
            .or_insert_with(|| ())
            .is_fresh()
    }
}

/// A message as it was last seen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedMessage {
    /// Channel it was posted in
    pub channel_id: u64,
    /// Author id
    pub author_id: u64,
    /// Author display name
    pub author_name: String,
    /// Whether the author is a bot
    pub author_is_bot: bool,
    /// Latest known content
    pub content: String,
}

/// Bounded map of recently seen messages.
#[derive(Clone)]
pub struct RecentMessages {
    messages: Cache<u64, CachedMessage>,
}

impl RecentMessages {
    /// Remembers up to `capacity` messages for a day
    #[must_use]
    pub fn with_capacity(capacity: u64) -> Self {
        Self {
            messages: Cache::builder()
                .max_capacity(capacity)
                .time_to_live(Duration::from_secs(24 * 60 * 60))
                .build(),
        }
    }

    /// Records a new or edited message
    pub fn remember(&self, message_id: u64, message: CachedMessage) {
        self.messages.insert(message_id, message);
    }

    /// Last known state of `message_id`
    #[must_use]
    pub fn get(&self, message_id: u64) -> Option<CachedMessage> {
        self.messages.get(&message_id)
    }

    /// Removes and returns `message_id` (used when it is deleted)
    pub fn take(&self, message_id: u64) -> Option<CachedMessage> {
        self.messages.remove(&message_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_delete_suppressed_within_window() {
        let cache = DedupCache::default();
        assert!(cache.first_delete(1));
        assert!(!cache.first_delete(1), "second delivery is dropped");
        assert!(cache.first_delete(2), "other messages are independent");
    }

    #[test]
    fn test_delete_logged_again_after_window() {
        let cache = DedupCache::with_window(Duration::from_millis(50));
        assert!(cache.first_delete(1));
        std::thread::sleep(Duration::from_millis(120));
        assert!(cache.first_delete(1), "expired marker allows logging again");
    }

    #[test]
    fn test_edits_keyed_by_content() {
        let cache = DedupCache::default();
        assert!(cache.first_edit(1, "hello"));
        assert!(!cache.first_edit(1, "hello"));
        assert!(cache.first_edit(1, "hello again"), "a new edit is a new event");
    }

    #[test]
    fn test_recent_messages_take() {
        let recent = RecentMessages::with_capacity(10);
        let message = CachedMessage {
            channel_id: 5,
            author_id: 6,
            author_name: "someone".to_string(),
            author_is_bot: false,
            content: "hi".to_string(),
        };
        recent.remember(1, message.clone());

        assert_eq!(recent.get(1), Some(message.clone()));
        assert_eq!(recent.take(1), Some(message));
        assert_eq!(recent.get(1), None);
    }
}
