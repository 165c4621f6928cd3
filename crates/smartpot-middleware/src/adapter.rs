//! The bus adapter pattern.
//!
//! The controller never speaks a wire protocol directly.  Adapters attach to
//! the [`EventBus`][crate::bus::EventBus], translate between the outside
//! world and bus events, and run until shutdown is signalled.
//!
//! - [`PubSubIngress`][crate::ingress::PubSubIngress] – applies
//!   `Topic::Inbound` events to the gateway.
//! - [`MqttBridge`][crate::mqtt_bridge::MqttBridge] – moves payloads between
//!   an MQTT broker and the bus.

use async_trait::async_trait;
use smartpot_types::PotResult;
use tokio::sync::watch;

use crate::bus::EventBus;

/// Every long-running bus participant implements this trait.
///
/// # Contract
///
/// * `run` returns `Ok(())` once `shutdown` flips to `true` (or its sender
///   is dropped) and all in-flight work has finished.  Any `Err` is a fault
///   the caller may answer by restarting the adapter.
#[async_trait]
pub trait BusAdapter: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    async fn run(&self, bus: EventBus, shutdown: watch::Receiver<bool>) -> PotResult<()>;
}

/// `true` once shutdown has been requested or the sender is gone.
pub(crate) fn shutdown_requested(shutdown: &watch::Receiver<bool>) -> bool {
    *shutdown.borrow() || shutdown.has_changed().is_err()
}
