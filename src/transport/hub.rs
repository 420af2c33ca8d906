use std::collections::HashMap;

use async_channel::{unbounded, Sender};
use async_trait::async_trait;
use tokio::sync::Mutex;

use super::Subscription;
use crate::api::PushTransport;
use crate::error::Error;

/// In-process topic hub. Stands in for the real broker client in the
/// runner and in tests; anything satisfying `PushTransport` replaces it.
#[derive(Default)]
pub struct LocalHub {
    topics: Mutex<HashMap<String, Vec<Sender<String>>>>,
}

impl LocalHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivers a payload to every live subscriber of `topic`. Subscribers
    /// whose receiving end has been dropped are pruned here.
    pub async fn publish(&self, topic: &str, payload: String) {
        let mut topics = self.topics.lock().await;

        let Some(senders) = topics.get_mut(topic) else {
            return;
        };

        senders.retain(|sender| sender.try_send(payload.clone()).is_ok());

        if senders.is_empty() {
            topics.remove(topic);
        }
    }
}

#[async_trait]
impl PushTransport for LocalHub {
    async fn subscribe(&self, topic: String) -> Result<Subscription, Error> {
        let (sender, receiver) = unbounded();

        self.topics
            .lock()
            .await
            .entry(topic.clone())
            .or_default()
            .push(sender);

        Ok(Subscription::new(topic, receiver))
    }
}
