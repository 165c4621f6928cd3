//! Topic-based publish/subscribe event bus.
//!
//! Uses [`tokio::sync::broadcast`] channels so every subscriber receives
//! every message without any single subscriber blocking the others.
//!
//! # Topics
//!
//! | Topic | Typical traffic |
//! |---|---|
//! | [`Topic::Inbound`] | Decoded sensor updates waiting for the gateway |
//! | [`Topic::Outbound`] | Applied / rejected updates and raised alerts, for transports to forward |
//! | [`Topic::Alerts`] | Alert diagnoses raised by post-write checks |

use smartpot_types::{Event, PotError, PotResult};
use tokio::sync::broadcast;

/// Number of buffered events before old ones are dropped for slow
/// subscribers.
pub const DEFAULT_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    Inbound,
    Outbound,
    Alerts,
}

/// Shared event bus.  Clones share the same underlying channels.
#[derive(Clone, Debug)]
pub struct EventBus {
    inbound: broadcast::Sender<Event>,
    outbound: broadcast::Sender<Event>,
    alerts: broadcast::Sender<Event>,
}

impl EventBus {
    /// Create a bus; `capacity` applies to every topic independently.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (inbound, _) = broadcast::channel(capacity);
        let (outbound, _) = broadcast::channel(capacity);
        let (alerts, _) = broadcast::channel(capacity);
        Self {
            inbound,
            outbound,
            alerts,
        }
    }

    /// Publish `event` on `topic`.
    ///
    /// Returns the number of receivers handed the event.
    ///
    /// # Errors
    ///
    /// [`PotError::Transport`] when nobody is subscribed to `topic`.
    pub fn publish_to(&self, topic: Topic, event: Event) -> PotResult<usize> {
        self.sender(topic)
            .send(event)
            .map_err(|_| PotError::Transport(format!("no subscribers for topic {topic:?}")))
    }

    pub fn subscribe_to(&self, topic: Topic) -> TopicReceiver {
        TopicReceiver {
            topic,
            receiver: self.sender(topic).subscribe(),
        }
    }

    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.sender(topic).receiver_count()
    }

    fn sender(&self, topic: Topic) -> &broadcast::Sender<Event> {
        match topic {
            Topic::Inbound => &self.inbound,
            Topic::Outbound => &self.outbound,
            Topic::Alerts => &self.alerts,
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// An async receiver bound to one [`Topic`].
pub struct TopicReceiver {
    topic: Topic,
    receiver: broadcast::Receiver<Event>,
}

impl TopicReceiver {
    /// Wait for the next event.
    ///
    /// `Err(RecvError::Lagged(n))` means `n` events were dropped because this
    /// subscriber fell behind; the caller decides whether to continue.
    /// `Err(RecvError::Closed)` means the bus is gone.
    pub async fn recv(&mut self) -> Result<Event, broadcast::error::RecvError> {
        self.receiver.recv().await
    }

    pub fn topic(&self) -> Topic {
        self.topic
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smartpot_types::{EventPayload, EventValue, InboundEvent};
    use std::time::Duration;

    fn make_event(sensor: &str) -> Event {
        Event::new(
            "smartpot-middleware::test",
            EventPayload::Inbound(InboundEvent::set(sensor, EventValue::Numeric(1.0))),
        )
    }

    #[tokio::test]
    async fn multiple_subscribers_receive_same_event() -> Result<(), Box<dyn std::error::Error>> {
        let bus = EventBus::default();
        let mut a = bus.subscribe_to(Topic::Outbound);
        let mut b = bus.subscribe_to(Topic::Outbound);

        let event = make_event("soilPh");
        assert_eq!(bus.publish_to(Topic::Outbound, event.clone())?, 2);

        assert_eq!(a.recv().await?.id, event.id);
        assert_eq!(b.recv().await?.id, event.id);
        Ok(())
    }

    #[tokio::test]
    async fn topics_are_isolated() -> Result<(), Box<dyn std::error::Error>> {
        let bus = EventBus::default();
        let mut alerts = bus.subscribe_to(Topic::Alerts);
        let _inbound = bus.subscribe_to(Topic::Inbound);

        bus.publish_to(Topic::Inbound, make_event("soilPh"))?;

        let result = tokio::time::timeout(Duration::from_millis(50), alerts.recv()).await;
        assert!(result.is_err(), "Alerts must not see Inbound traffic");
        assert_eq!(alerts.topic(), Topic::Alerts);
        Ok(())
    }

    #[test]
    fn publish_without_subscribers_is_transport_error() {
        let bus = EventBus::default();
        assert!(matches!(
            bus.publish_to(Topic::Outbound, make_event("x")),
            Err(PotError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn slow_subscriber_lags_instead_of_blocking() {
        let bus = EventBus::new(8);
        let mut slow = bus.subscribe_to(Topic::Inbound);
        for _ in 0..100 {
            let _ = bus.publish_to(Topic::Inbound, make_event("flood"));
        }
        assert!(matches!(
            slow.recv().await,
            Err(broadcast::error::RecvError::Lagged(_))
        ));
    }
}
