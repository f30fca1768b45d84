//! In-memory per-session topic broadcaster.
//!
//! Fan-out registry using DashMap for lock-free concurrent access. One topic
//! exists per execution request (`liveSession/{id}`); there are no wildcard
//! or global topics, so a subscriber can never observe sessions it did not
//! explicitly name.
//!
//! Delivery is best-effort: a disconnected subscriber misses the update and
//! nothing is replayed on (re)subscribe. Senders whose receiver has been
//! dropped are pruned during publish.

use std::sync::Arc;

use dashmap::DashMap;
use sqlgate_commons::protocol::ServerMessage;
use sqlgate_commons::{SubscriberId, TopicId};
use tokio::sync::mpsc;

/// Channel used to push session messages to one subscriber.
pub type SessionSender = mpsc::UnboundedSender<ServerMessage>;

/// One subscriber on a topic.
#[derive(Debug, Clone)]
struct SubscriberHandle {
    subscriber_id: SubscriberId,
    tx: Arc<SessionSender>,
}

/// In-memory registry of topic subscribers with best-effort fan-out.
///
/// Per-author ordering: `publish` is synchronous, so successive publishes
/// from a single caller enter each subscriber's channel in submission order.
/// Publishes from different callers are unordered relative to each other.
#[derive(Debug, Default)]
pub struct TopicBroadcaster {
    /// TopicId → subscribers. Vec keeps per-topic fan-out allocation-light;
    /// a session rarely has more than a handful of reviewers.
    subscribers: DashMap<TopicId, Vec<SubscriberHandle>>,
}

impl TopicBroadcaster {
    /// Create an empty broadcaster.
    pub fn new() -> Self {
        Self {
            subscribers: DashMap::new(),
        }
    }

    /// Subscribe to a topic, returning the receiving end of the channel.
    ///
    /// Subscribing twice with the same subscriber id replaces the previous
    /// subscription (the old receiver goes dead and is pruned on the next
    /// publish). Authorization of the subscriber happens in the transport
    /// layer before this call, with the same identity check as execute.
    pub fn subscribe(
        &self,
        topic: TopicId,
        subscriber_id: SubscriberId,
    ) -> mpsc::UnboundedReceiver<ServerMessage> {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = SubscriberHandle {
            subscriber_id: subscriber_id.clone(),
            tx: Arc::new(tx),
        };

        let mut entry = self.subscribers.entry(topic).or_default();
        entry.retain(|h| h.subscriber_id != subscriber_id);
        entry.push(handle);
        rx
    }

    /// Remove one subscriber from a topic.
    pub fn unsubscribe(&self, topic: &TopicId, subscriber_id: &SubscriberId) {
        if let Some(mut handles) = self.subscribers.get_mut(topic) {
            handles.retain(|h| &h.subscriber_id != subscriber_id);
        }
        self.subscribers
            .remove_if(topic, |_, handles| handles.is_empty());
    }

    /// Drop a topic and all of its subscribers, e.g. when the owning
    /// execution request is finalized.
    pub fn drop_topic(&self, topic: &TopicId) {
        self.subscribers.remove(topic);
    }

    /// Deliver a payload to every currently connected subscriber of `topic`.
    ///
    /// Returns the number of subscribers reached. Subscribers whose channel
    /// is closed are pruned; their loss is logged at debug level and not
    /// retried — only the final execute-time payload is security-relevant.
    pub fn publish(&self, topic: &TopicId, payload: ServerMessage) -> usize {
        let Some(mut handles) = self.subscribers.get_mut(topic) else {
            log::debug!("publish to {} with no subscribers", topic);
            return 0;
        };

        let mut delivered = 0;
        handles.retain(|handle| match handle.tx.send(payload.clone()) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(_) => {
                log::debug!(
                    "pruning disconnected subscriber {} from {}",
                    handle.subscriber_id,
                    topic
                );
                false
            }
        });
        delivered
    }

    /// Number of topics with at least one subscriber entry.
    pub fn topic_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Total subscribers across all topics.
    pub fn total_subscribers(&self) -> usize {
        self.subscribers.iter().map(|e| e.value().len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlgate_commons::ExecutionRequestId;

    fn topic(name: &str) -> TopicId {
        TopicId::for_session(&ExecutionRequestId::new(name))
    }

    fn status(name: &str, text: &str) -> ServerMessage {
        ServerMessage::status(name, text, None)
    }

    #[test]
    fn test_publish_reaches_all_subscribers() {
        let broadcaster = TopicBroadcaster::new();
        let mut rx1 = broadcaster.subscribe(topic("req_1"), SubscriberId::new("a"));
        let mut rx2 = broadcaster.subscribe(topic("req_1"), SubscriberId::new("b"));

        let delivered = broadcaster.publish(&topic("req_1"), status("req_1", "SELECT 1"));
        assert_eq!(delivered, 2);
        assert!(rx1.try_recv().is_ok());
        assert!(rx2.try_recv().is_ok());
    }

    #[test]
    fn test_publish_is_topic_scoped() {
        let broadcaster = TopicBroadcaster::new();
        let mut rx_other = broadcaster.subscribe(topic("req_2"), SubscriberId::new("a"));

        let delivered = broadcaster.publish(&topic("req_1"), status("req_1", "SELECT 1"));
        assert_eq!(delivered, 0);
        assert!(rx_other.try_recv().is_err());
    }

    #[test]
    fn test_dead_subscribers_are_pruned() {
        let broadcaster = TopicBroadcaster::new();
        let rx = broadcaster.subscribe(topic("req_1"), SubscriberId::new("a"));
        drop(rx);

        let delivered = broadcaster.publish(&topic("req_1"), status("req_1", "SELECT 1"));
        assert_eq!(delivered, 0);
        assert_eq!(broadcaster.total_subscribers(), 0);
    }

    #[test]
    fn test_resubscribe_replaces_previous_channel() {
        let broadcaster = TopicBroadcaster::new();
        let mut old_rx = broadcaster.subscribe(topic("req_1"), SubscriberId::new("a"));
        let mut new_rx = broadcaster.subscribe(topic("req_1"), SubscriberId::new("a"));

        let delivered = broadcaster.publish(&topic("req_1"), status("req_1", "SELECT 1"));
        assert_eq!(delivered, 1);
        assert!(old_rx.try_recv().is_err());
        assert!(new_rx.try_recv().is_ok());
    }

    #[test]
    fn test_no_replay_on_subscribe() {
        let broadcaster = TopicBroadcaster::new();
        broadcaster.publish(&topic("req_1"), status("req_1", "SELECT 1"));

        let mut late_rx = broadcaster.subscribe(topic("req_1"), SubscriberId::new("late"));
        assert!(late_rx.try_recv().is_err());
    }

    #[test]
    fn test_single_publisher_order_is_preserved() {
        let broadcaster = TopicBroadcaster::new();
        let mut rx = broadcaster.subscribe(topic("req_1"), SubscriberId::new("a"));

        for i in 0..5 {
            broadcaster.publish(&topic("req_1"), status("req_1", &format!("edit {}", i)));
        }

        for i in 0..5 {
            match rx.try_recv().unwrap() {
                ServerMessage::Status {
                    console_content, ..
                } => assert_eq!(console_content, format!("edit {}", i)),
                other => panic!("expected status, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_unsubscribe_and_drop_topic() {
        let broadcaster = TopicBroadcaster::new();
        let _rx1 = broadcaster.subscribe(topic("req_1"), SubscriberId::new("a"));
        let _rx2 = broadcaster.subscribe(topic("req_1"), SubscriberId::new("b"));

        broadcaster.unsubscribe(&topic("req_1"), &SubscriberId::new("a"));
        assert_eq!(broadcaster.total_subscribers(), 1);

        broadcaster.drop_topic(&topic("req_1"));
        assert_eq!(broadcaster.topic_count(), 0);
    }
}
