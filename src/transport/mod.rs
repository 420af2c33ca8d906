mod hub;

pub use hub::LocalHub;

use async_channel::Receiver;

/// Live handle on a topic. Messages arrive in delivery order; dropping the
/// subscription closes the stream and stops delivery.
pub struct Subscription {
    topic: String,
    messages: Receiver<String>,
}

impl Subscription {
    pub fn new(topic: String, messages: Receiver<String>) -> Self {
        Self { topic, messages }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Next payload, or `None` once the transport side has closed the topic.
    pub async fn next_message(&self) -> Option<String> {
        self.messages.recv().await.ok()
    }
}
