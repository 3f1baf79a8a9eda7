//! Fan-out of row change notifications to realtime subscribers.

use std::collections::HashMap;
use tokio::sync::broadcast;

use crate::models::{ChangeKind, Collection, FeedMessage};

/// Buffered frames per collection before a slow subscriber starts lagging.
const CHANNEL_CAPACITY: usize = 64;

/// One broadcast channel per collection.
pub struct ChangeHub {
    channels: HashMap<Collection, broadcast::Sender<FeedMessage>>,
}

impl ChangeHub {
    /// Creates a new change hub.
    pub fn new() -> Self {
        let channels = Collection::ALL
            .into_iter()
            .map(|collection| {
                let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
                (collection, sender)
            })
            .collect();
        Self { channels }
    }

    /// Subscribes to changes of one collection.
    pub fn subscribe(&self, collection: Collection) -> broadcast::Receiver<FeedMessage> {
        self.sender(collection).subscribe()
    }

    /// Notifies every subscriber of `collection`.
    pub fn publish(&self, collection: Collection, kind: ChangeKind) {
        let receivers = self
            .sender(collection)
            .send(FeedMessage::Change { collection, kind })
            // No subscribers
            .unwrap_or(0);
        tracing::debug!("Published {:?} on {} to {} subscriber(s)", kind, collection, receivers);
    }

    /// Number of live subscribers for `collection`.
    pub fn subscriber_count(&self, collection: Collection) -> usize {
        self.sender(collection).receiver_count()
    }

    fn sender(&self, collection: Collection) -> &broadcast::Sender<FeedMessage> {
        // Every collection gets a channel in `new`.
        &self.channels[&collection]
    }
}

impl Default for ChangeHub {
    fn default() -> Self {
        Self::new()
    }
}
