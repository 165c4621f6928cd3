//! [`PubSubIngress`] – applies inbound bus events to the gateway.
//!
//! Each `Topic::Inbound` event becomes its own task, bounded by a
//! [`Semaphore`] so a burst of updates cannot spawn unbounded work.  The
//! task makes exactly one gateway call and publishes the results:
//!
//! | Result | Topic(s) |
//! |---|---|
//! | `SettingChanged` / `Rejected` | `Outbound` |
//! | `Diagnostic` (alert) | `Alerts` and `Outbound` |

use std::sync::Arc;

use async_trait::async_trait;
use smartpot_gateway::Gateway;
use smartpot_types::{Event, EventPayload, InboundEvent, PotError, PotResult};
use tokio::sync::{broadcast, watch, Semaphore};
use tracing::{debug, info, warn};

use crate::adapter::{shutdown_requested, BusAdapter};
use crate::bus::{EventBus, Topic};

const SOURCE: &str = "smartpot-middleware::ingress";

/// Upper limit on concurrently processed inbound events.
pub const MAX_CONCURRENCY: usize = 1024;

pub struct PubSubIngress {
    gateway: Arc<Gateway>,
    permits: Arc<Semaphore>,
    concurrency: usize,
}

impl PubSubIngress {
    /// `concurrency` caps how many inbound events are processed at once,
    /// clamped to `1..=MAX_CONCURRENCY`.
    pub fn new(gateway: Arc<Gateway>, concurrency: usize) -> Self {
        let concurrency = concurrency.clamp(1, MAX_CONCURRENCY);
        Self {
            gateway,
            permits: Arc::new(Semaphore::new(concurrency)),
            concurrency,
        }
    }

    /// Events currently being processed.
    pub fn in_flight(&self) -> usize {
        self.concurrency - self.permits.available_permits()
    }

    async fn drain(&self) {
        // Holding every permit means every spawned task has finished.
        let Ok(total) = u32::try_from(self.concurrency) else {
            return;
        };
        if let Ok(all) = self.permits.acquire_many(total).await {
            drop(all);
        }
    }
}

/// Apply one inbound event and publish what it produced.
///
/// Returns the published payloads.
pub fn process(gateway: &Gateway, bus: &EventBus, inbound: &InboundEvent) -> Vec<EventPayload> {
    let payloads = gateway.apply_event(inbound);
    for payload in &payloads {
        if let EventPayload::Diagnostic { check, diagnosis } = payload {
            info!(check = %check, alert = %diagnosis, "alert raised by inbound update");
            publish(bus, Topic::Alerts, payload);
        }
        publish(bus, Topic::Outbound, payload);
    }
    payloads
}

fn publish(bus: &EventBus, topic: Topic, payload: &EventPayload) {
    if let Err(e) = bus.publish_to(topic, Event::new(SOURCE, payload.clone())) {
        // Nobody listening is a normal condition.
        debug!(?topic, error = %e, "event not delivered");
    }
}

#[async_trait]
impl BusAdapter for PubSubIngress {
    fn name(&self) -> &str {
        "pubsub-ingress"
    }

    async fn run(&self, bus: EventBus, mut shutdown: watch::Receiver<bool>) -> PotResult<()> {
        let mut inbound = bus.subscribe_to(Topic::Inbound);
        info!(concurrency = self.concurrency, "pub/sub ingress started");

        loop {
            if shutdown_requested(&shutdown) {
                break;
            }
            tokio::select! {
                _ = shutdown.changed() => continue,
                received = inbound.recv() => match received {
                    Ok(Event { payload: EventPayload::Inbound(update), .. }) => {
                        let permit = Arc::clone(&self.permits)
                            .acquire_owned()
                            .await
                            .map_err(|e| PotError::Transport(e.to_string()))?;
                        let gateway = Arc::clone(&self.gateway);
                        let bus = bus.clone();
                        tokio::spawn(async move {
                            let _permit = permit;
                            process(&gateway, &bus, &update);
                        });
                    }
                    Ok(other) => debug!(id = %other.id, "ignoring non-inbound event"),
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(dropped = n, "pub/sub ingress lagged; inbound events lost");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        return Err(PotError::Transport("inbound topic closed".into()));
                    }
                },
            }
        }

        self.drain().await;
        info!("pub/sub ingress stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smartpot_registry::RegistryBuilder;
    use smartpot_types::{CheckId, EventValue, PlantProfile, SensorValue};
    use std::time::Duration;

    fn gateway() -> Arc<Gateway> {
        Arc::new(Gateway::new(
            RegistryBuilder::factory_preset().build().unwrap(),
            PlantProfile::new("Cactus", "Green", 1.3, "Desert", "Red").unwrap(),
        ))
    }

    fn inbound(update: InboundEvent) -> Event {
        Event::new("test", EventPayload::Inbound(update))
    }

    #[test]
    fn process_publishes_alerts_on_both_topics() {
        let bus = EventBus::default();
        let gw = gateway();
        let mut outbound = bus.subscribe_to(Topic::Outbound);
        let mut alerts = bus.subscribe_to(Topic::Alerts);

        let payloads = process(&gw, &bus, &InboundEvent::set("temperature", EventValue::Numeric(40.0)));
        assert_eq!(payloads.len(), 2);

        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        rt.block_on(async {
            let first = outbound.recv().await.unwrap();
            assert!(matches!(first.payload, EventPayload::SettingChanged { .. }));
            let alert = alerts.recv().await.unwrap();
            assert!(matches!(
                alert.payload,
                EventPayload::Diagnostic { check: CheckId::Environment, .. }
            ));
        });
    }

    #[tokio::test]
    async fn run_applies_inbound_events_until_shutdown() -> Result<(), Box<dyn std::error::Error>> {
        let bus = EventBus::default();
        let gw = gateway();
        let ingress = Arc::new(PubSubIngress::new(Arc::clone(&gw), 4));
        let (stop, shutdown) = watch::channel(false);
        let mut outbound = bus.subscribe_to(Topic::Outbound);

        let task = {
            let ingress = Arc::clone(&ingress);
            let bus = bus.clone();
            tokio::spawn(async move { ingress.run(bus, shutdown).await })
        };

        // Wait until the ingress has subscribed.
        while bus.subscriber_count(Topic::Inbound) == 0 {
            tokio::task::yield_now().await;
        }
        bus.publish_to(
            Topic::Inbound,
            inbound(InboundEvent::set("soilPh", EventValue::Numeric(6.0))),
        )?;

        let reply = tokio::time::timeout(Duration::from_secs(2), outbound.recv()).await??;
        assert!(matches!(
            reply.payload,
            EventPayload::SettingChanged { ref sensor, value: SensorValue::Numeric(v), .. }
                if sensor == "soilPh" && v == 6.0
        ));
        assert_eq!(gw.read_setting("soilPh").unwrap().as_numeric(), Some(6.0));

        stop.send(true)?;
        tokio::time::timeout(Duration::from_secs(2), task).await???;
        assert_eq!(ingress.in_flight(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn unknown_sensor_is_rejected_on_outbound() -> Result<(), Box<dyn std::error::Error>> {
        let bus = EventBus::default();
        let ingress = PubSubIngress::new(gateway(), 1);
        let mut outbound = bus.subscribe_to(Topic::Outbound);
        let (stop, shutdown) = watch::channel(false);

        let bus2 = bus.clone();
        let run = tokio::spawn(async move { ingress.run(bus2, shutdown).await });
        while bus.subscriber_count(Topic::Inbound) == 0 {
            tokio::task::yield_now().await;
        }
        bus.publish_to(
            Topic::Inbound,
            inbound(InboundEvent::set("ghost", EventValue::Numeric(1.0))),
        )?;

        let reply = tokio::time::timeout(Duration::from_secs(2), outbound.recv()).await??;
        assert!(matches!(
            reply.payload,
            EventPayload::Rejected { error: PotError::NotFound(_), .. }
        ));

        drop(stop);
        tokio::time::timeout(Duration::from_secs(2), run).await???;
        Ok(())
    }

    #[test]
    fn concurrency_is_clamped() {
        let ingress = PubSubIngress::new(gateway(), 0);
        assert_eq!(ingress.in_flight(), 0);
        assert_eq!(ingress.permits.available_permits(), 1);

        let ingress = PubSubIngress::new(gateway(), usize::MAX);
        assert_eq!(ingress.permits.available_permits(), MAX_CONCURRENCY);
        assert_eq!(ingress.in_flight(), 0);
    }
}
