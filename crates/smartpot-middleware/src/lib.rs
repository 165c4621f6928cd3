//! `smartpot-middleware` – publish/subscribe plumbing.
//!
//! Routes sensor updates between external transports and the gateway
//! without interpreting them beyond decoding.
//!
//! # Modules
//!
//! - [`bus`] – topic-based event bus on Tokio broadcast channels.
//! - [`codec`] – JSON payload decoding/encoding.
//! - [`adapter`] – the [`BusAdapter`] trait every long-running participant
//!   implements.
//! - [`ingress`] – [`PubSubIngress`], the bounded worker that applies
//!   inbound events through the gateway.
//! - [`mqtt_bridge`] – [`MqttBridge`], broker ⇄ bus forwarding via rumqttc.

pub mod adapter;
pub mod bus;
pub mod codec;
pub mod ingress;
pub mod mqtt_bridge;

pub use adapter::BusAdapter;
pub use bus::{EventBus, Topic, TopicReceiver};
pub use ingress::{PubSubIngress, MAX_CONCURRENCY};
pub use mqtt_bridge::{MqttBridge, MqttSettings};
