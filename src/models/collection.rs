use serde::{Deserialize, Serialize};
use std::fmt;

/// Collections held by the store service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Users,
    Nurses,
    Schedules,
}

impl Collection {
    pub const ALL: [Collection; 3] = [Collection::Users, Collection::Nurses, Collection::Schedules];

    /// Name used in URLs and table names.
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::Nurses => "nurses",
            Collection::Schedules => "schedules",
        }
    }

    /// Parse from a path segment.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "users" => Some(Collection::Users),
            "nurses" => Some(Collection::Nurses),
            "schedules" => Some(Collection::Schedules),
            _ => None,
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of row mutation reported on the change feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// A frame sent on a collection's realtime channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FeedMessage {
    /// Sent once, after the server has attached the channel to the hub.
    Subscribed { collection: Collection },
    /// Rows of `collection` were mutated.
    Change {
        collection: Collection,
        kind: ChangeKind,
    },
    /// The channel fell behind and dropped events; treat as a change.
    Resync { collection: Collection },
}

impl FeedMessage {
    pub fn encode(&self) -> String {
        // Plain enum of strings; serialization cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn decode(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}
