//! InMemory Subscription Repository

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{ConnectionId, SubscriptionRepository, Topic};

/// topic → subscribed connections
#[derive(Default)]
pub struct InMemorySubscriptionRepository {
    topics: Mutex<HashMap<Topic, HashSet<ConnectionId>>>,
}

impl InMemorySubscriptionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SubscriptionRepository for InMemorySubscriptionRepository {
    async fn subscribe(&self, connection_id: ConnectionId, topic: Topic) -> bool {
        self.topics
            .lock()
            .await
            .entry(topic)
            .or_default()
            .insert(connection_id)
    }

    async fn unsubscribe(&self, connection_id: &ConnectionId, topic: &Topic) -> bool {
        let mut topics = self.topics.lock().await;
        let Some(members) = topics.get_mut(topic) else {
            return false;
        };
        let removed = members.remove(connection_id);
        if members.is_empty() {
            topics.remove(topic);
        }
        removed
    }

    async fn is_subscribed(&self, connection_id: &ConnectionId, topic: &Topic) -> bool {
        self.topics
            .lock()
            .await
            .get(topic)
            .is_some_and(|members| members.contains(connection_id))
    }

    async fn subscribers(&self, topic: &Topic) -> Vec<ConnectionId> {
        self.topics
            .lock()
            .await
            .get(topic)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default()
    }

    async fn remove_connection(&self, connection_id: &ConnectionId) -> Vec<Topic> {
        let mut topics = self.topics.lock().await;
        let mut left = Vec::new();
        topics.retain(|topic, members| {
            if members.remove(connection_id) {
                left.push(topic.clone());
            }
            !members.is_empty()
        });
        left
    }
}
