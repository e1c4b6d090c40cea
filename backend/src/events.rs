use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Typed notifications for UI pieces that need to refetch after a
/// lifecycle mutation. Replaces ambient window-level signals with an
/// explicit bus; senders never block and a bus with no listeners is fine.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum BreedingEvent {
    PairUpdated { pair_id: Uuid },
    LitterCollected { pair_id: Uuid, count: i64 },
}

#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<BreedingEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BreedingEvent> {
        self.sender.subscribe()
    }

    pub fn publish(&self, event: BreedingEvent) {
        // A send error only means nobody is listening right now.
        if self.sender.send(event).is_err() {
            tracing::debug!("breeding event dropped: no subscribers");
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscriber_receives_published_event() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();
        let pair_id = Uuid::new_v4();
        bus.publish(BreedingEvent::PairUpdated { pair_id });
        match rx.recv().await.unwrap() {
            BreedingEvent::PairUpdated { pair_id: got } => assert_eq!(got, pair_id),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_publish_without_subscribers_is_a_noop() {
        let bus = EventBus::default();
        bus.publish(BreedingEvent::LitterCollected {
            pair_id: Uuid::new_v4(),
            count: 3,
        });
    }

    #[test]
    fn test_event_serializes_with_kind_tag() {
        let event = BreedingEvent::LitterCollected {
            pair_id: Uuid::nil(),
            count: 2,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "litter-collected");
        assert_eq!(json["count"], 2);
    }
}
