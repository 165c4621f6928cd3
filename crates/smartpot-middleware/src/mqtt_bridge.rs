//! [`MqttBridge`] – moves payloads between an MQTT broker and the bus.
//!
//! - Messages on the inbound MQTT topic are decoded with
//!   [`decode_inbound`][crate::codec::decode_inbound] and published on
//!   `Topic::Inbound`.  Undecodable payloads are logged and dropped.
//! - Every `Topic::Outbound` event is serialized as JSON and published on
//!   the outbound MQTT topic.
//!
//! The rumqttc event loop runs in its own task so that a broker outage can
//! never stall the outbound side: outbound publishes use the non-blocking
//! `try_publish`, and an event that does not fit in the client queue is
//! logged and dropped.  Both halves watch the shutdown signal, and the
//! connection task waits a fixed delay after each connection error.

use std::time::Duration;

use async_trait::async_trait;
use rumqttc::{AsyncClient, Event as MqttEvent, EventLoop, MqttOptions, Packet, QoS};
use smartpot_types::{Event, EventPayload, PotError, PotResult};
use tokio::sync::{broadcast, watch};
use tracing::{debug, error, info, warn};

use crate::adapter::{shutdown_requested, BusAdapter};
use crate::bus::{EventBus, Topic};
use crate::codec;

const SOURCE: &str = "smartpot-middleware::mqtt";

/// Pending requests buffered between the client handle and the event loop.
const CLIENT_CAPACITY: usize = 64;

/// How long the connection task gets to wind down after shutdown.
const DISCONNECT_GRACE: Duration = Duration::from_secs(1);

/// Broker connection parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct MqttSettings {
    pub host: String,
    pub port: u16,
    pub client_id: String,
    pub inbound_topic: String,
    pub outbound_topic: String,
    pub keep_alive: Duration,
    pub retry_delay: Duration,
}

impl Default for MqttSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 1883,
            client_id: "smartpot".to_string(),
            inbound_topic: "smartpot/in".to_string(),
            outbound_topic: "smartpot/out".to_string(),
            keep_alive: Duration::from_secs(30),
            retry_delay: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MqttBridge {
    settings: MqttSettings,
}

impl MqttBridge {
    pub fn new(settings: MqttSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &MqttSettings {
        &self.settings
    }

    /// Decode one broker message and hand it to the bus.
    ///
    /// Returns `false` when the message was dropped.
    pub fn forward_inbound(&self, bus: &EventBus, topic: &str, payload: &[u8]) -> bool {
        if topic != self.settings.inbound_topic {
            debug!(topic, "ignoring message on unexpected topic");
            return false;
        }
        let update = match codec::decode_inbound(payload) {
            Ok(update) => update,
            Err(e) => {
                warn!(topic, error = %e, "dropping undecodable payload");
                return false;
            }
        };
        match bus.publish_to(Topic::Inbound, Event::new(SOURCE, EventPayload::Inbound(update))) {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "inbound update not delivered");
                false
            }
        }
    }

    /// Queue one bus event for the broker without waiting.
    fn publish_outbound(&self, client: &AsyncClient, event: &Event) -> PotResult<()> {
        let payload = codec::encode_event(event)?;
        client
            .try_publish(self.settings.outbound_topic.as_str(), QoS::AtLeastOnce, false, payload)
            .map_err(|e| PotError::Transport(e.to_string()))
    }

    /// Drive the rumqttc event loop until shutdown.
    async fn drive_connection(
        self,
        client: AsyncClient,
        mut eventloop: EventLoop,
        bus: EventBus,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let s = &self.settings;
        loop {
            if shutdown_requested(&shutdown) {
                break;
            }
            tokio::select! {
                _ = shutdown.changed() => continue,
                polled = eventloop.poll() => match polled {
                    Ok(MqttEvent::Incoming(Packet::ConnAck(_))) => {
                        info!(topic = %s.inbound_topic, "mqtt connected; subscribing");
                        if let Err(e) = client.try_subscribe(s.inbound_topic.as_str(), QoS::AtLeastOnce) {
                            warn!(error = %e, "mqtt subscribe not queued");
                        }
                    }
                    Ok(MqttEvent::Incoming(Packet::Publish(p))) => {
                        self.forward_inbound(&bus, &p.topic, &p.payload);
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!(
                            error = %e,
                            retry_in_secs = s.retry_delay.as_secs_f64(),
                            "mqtt connection error"
                        );
                        tokio::select! {
                            _ = tokio::time::sleep(s.retry_delay) => {}
                            _ = shutdown.changed() => {}
                        }
                    }
                },
            }
        }
        debug!("mqtt connection task stopped");
    }
}

#[async_trait]
impl BusAdapter for MqttBridge {
    fn name(&self) -> &str {
        "mqtt-bridge"
    }

    async fn run(&self, bus: EventBus, mut shutdown: watch::Receiver<bool>) -> PotResult<()> {
        let s = &self.settings;
        let mut options = MqttOptions::new(s.client_id.as_str(), s.host.as_str(), s.port);
        options.set_keep_alive(s.keep_alive);
        let (client, eventloop) = AsyncClient::new(options, CLIENT_CAPACITY);
        let mut outbound = bus.subscribe_to(Topic::Outbound);
        info!(host = %s.host, port = s.port, "mqtt bridge connecting");

        let mut connection = tokio::spawn(self.clone().drive_connection(
            client.clone(),
            eventloop,
            bus.clone(),
            shutdown.clone(),
        ));

        let result = loop {
            if shutdown_requested(&shutdown) {
                break Ok(());
            }
            tokio::select! {
                _ = shutdown.changed() => continue,
                joined = &mut connection => {
                    break Err(PotError::Transport(match joined {
                        Ok(()) => "mqtt connection task ended".to_string(),
                        Err(e) => format!("mqtt connection task failed: {e}"),
                    }));
                }
                received = outbound.recv() => match received {
                    Ok(event) => {
                        if let Err(e) = self.publish_outbound(&client, &event) {
                            warn!(error = %e, "outbound event dropped");
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(dropped = n, "mqtt bridge lagged; outbound events lost");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        break Err(PotError::Transport("outbound topic closed".into()));
                    }
                },
            }
        };

        if let Err(e) = client.try_disconnect() {
            debug!(error = %e, "mqtt disconnect not queued");
        }
        if !connection.is_finished() {
            match tokio::time::timeout(DISCONNECT_GRACE, &mut connection).await {
                Ok(Err(e)) => error!(error = %e, "mqtt connection task failed"),
                Ok(Ok(())) => {}
                Err(_) => connection.abort(),
            }
        }
        info!("mqtt bridge stopped");
        result
    }
}
