//! WebSocket client for the store's per-collection change channels.

use futures::StreamExt;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{header, HeaderValue};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use super::error::StoreError;
use crate::models::{Collection, FeedMessage};

type Channel = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Opens change channels for every collection.
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    base_url: String,
    api_key: Option<String>,
}

impl ChangeFeed {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn channel_url(&self, collection: Collection) -> String {
        let base = if let Some(rest) = self.base_url.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = self.base_url.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            self.base_url.clone()
        };
        format!("{}/realtime/{}", base, collection)
    }

    /// Connects one channel and waits for the server's `subscribed` frame.
    async fn open(&self, collection: Collection) -> Result<Channel, StoreError> {
        let fail = |e: &dyn std::fmt::Display| StoreError::ChangeFeed(format!("{}: {}", collection, e));

        let mut request = self
            .channel_url(collection)
            .into_client_request()
            .map_err(|e| fail(&e))?;
        if let Some(key) = &self.api_key {
            let value = HeaderValue::from_str(&format!("Bearer {}", key)).map_err(|e| fail(&e))?;
            request.headers_mut().insert(header::AUTHORIZATION, value);
        }

        let (mut channel, _) = connect_async(request).await.map_err(|e| fail(&e))?;

        while let Some(frame) = channel.next().await {
            match frame.map_err(|e| fail(&e))? {
                Message::Text(text) => match FeedMessage::decode(text.as_str()) {
                    Ok(FeedMessage::Subscribed { .. }) => {
                        tracing::debug!("Change feed subscribed to {}", collection);
                        return Ok(channel);
                    }
                    Ok(other) => tracing::debug!("Frame before ack on {}: {:?}", collection, other),
                    Err(e) => return Err(fail(&e)),
                },
                Message::Close(_) => break,
                _ => {}
            }
        }

        Err(fail(&"channel closed before subscription was acknowledged"))
    }

    /// Opens all channels and calls `on_change` once per change frame.
    ///
    /// Returns after every channel is acknowledged; anything published from
    /// then on reaches the callback.
    pub async fn subscribe<F>(&self, on_change: F) -> Result<Subscription, StoreError>
    where
        F: Fn() + Send + Sync + 'static,
    {
        let mut channels = Vec::with_capacity(Collection::ALL.len());
        for collection in Collection::ALL {
            channels.push((collection, self.open(collection).await?));
        }

        let on_change = Arc::new(on_change);
        let tasks = channels
            .into_iter()
            .map(|(collection, channel)| {
                tokio::spawn(read_channel(collection, channel, Arc::clone(&on_change)))
            })
            .collect();

        Ok(Subscription { tasks })
    }
}

async fn read_channel<F>(collection: Collection, mut channel: Channel, on_change: Arc<F>)
where
    F: Fn() + Send + Sync + 'static,
{
    while let Some(frame) = channel.next().await {
        match frame {
            Ok(Message::Text(text)) => match FeedMessage::decode(text.as_str()) {
                Ok(FeedMessage::Subscribed { .. }) => {}
                Ok(msg) => {
                    tracing::debug!("Change feed frame: {:?}", msg);
                    on_change();
                }
                Err(e) => tracing::warn!("Ignoring malformed frame on {}: {}", collection, e),
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::warn!("Change feed channel {} failed: {}", collection, e);
                return;
            }
        }
    }
    tracing::warn!("Change feed channel {} closed by the server", collection);
}

/// Live change channels. Dropping it closes them.
#[derive(Debug)]
pub struct Subscription {
    tasks: Vec<JoinHandle<()>>,
}

impl Subscription {
    pub fn is_active(&self) -> bool {
        !self.tasks.is_empty()
    }

    /// Closes every channel. Calling it again does nothing.
    pub fn unsubscribe(&mut self) {
        if self.tasks.is_empty() {
            return;
        }
        for task in self.tasks.drain(..) {
            task.abort();
        }
        tracing::debug!("Change feed unsubscribed");
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Nurse;
    use crate::test_support::{dead_endpoint, TestServer};
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tokio::time::timeout;

    #[test]
    fn test_channel_url() {
        let feed = ChangeFeed::new("https://store.example.org/", None);
        assert_eq!(
            feed.channel_url(Collection::Nurses),
            "wss://store.example.org/realtime/nurses"
        );

        let feed = ChangeFeed::new("http://127.0.0.1:8080", None);
        assert_eq!(
            feed.channel_url(Collection::Users),
            "ws://127.0.0.1:8080/realtime/users"
        );
    }

    #[tokio::test]
    async fn test_change_reaches_callback() {
        let server = TestServer::start().await;
        let client = server.client();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let _subscription = client
            .feed()
            .subscribe(move || {
                let _ = tx.send(());
            })
            .await
            .unwrap();

        client.insert(&[Nurse::new("1", "Zoe")]).await.unwrap();

        let received = timeout(Duration::from_secs(2), rx.recv()).await;
        assert!(matches!(received, Ok(Some(()))));
    }

    #[tokio::test]
    async fn test_unsubscribe_is_idempotent() {
        let server = TestServer::start().await;
        let client = server.client();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let mut subscription = client
            .feed()
            .subscribe(move || {
                let _ = tx.send(());
            })
            .await
            .unwrap();
        assert!(subscription.is_active());

        subscription.unsubscribe();
        subscription.unsubscribe();
        assert!(!subscription.is_active());

        client.insert(&[Nurse::new("1", "Zoe")]).await.unwrap();

        let received = timeout(Duration::from_millis(300), rx.recv()).await;
        assert!(!matches!(received, Ok(Some(()))));
    }

    #[tokio::test]
    async fn test_subscribe_fails_against_dead_endpoint() {
        let feed = ChangeFeed::new(dead_endpoint().await, None);
        let result = feed.subscribe(|| {}).await;
        assert!(matches!(result, Err(StoreError::ChangeFeed(_))));
    }

    #[tokio::test]
    async fn test_subscribe_requires_api_key() {
        let server = TestServer::with_keys(&["k1"]).await;

        let result = ChangeFeed::new(server.url(), None).subscribe(|| {}).await;
        assert!(result.is_err());

        let result = ChangeFeed::new(server.url(), Some("k1".to_string()))
            .subscribe(|| {})
            .await;
        assert!(result.is_ok());
    }
}
