//! Pub/sub event envelope.
//!
//! Inbound traffic arrives as an [`InboundEvent`] already decoded from the
//! transport payload; everything the controller emits is wrapped in an
//! [`Event`] carrying an [`EventPayload`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::diagnosis::{CheckId, Diagnosis};
use crate::error::PotError;
use crate::value::{Bounds, SensorValue};

/// Unified wrapper for everything routed over the event bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// e.g. `"smartpot-middleware::mqtt"`
    pub source: String,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(source: impl Into<String>, payload: EventPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            source: source.into(),
            payload,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventPayload {
    /// A decoded update waiting to be applied.
    Inbound(InboundEvent),
    /// The state of a sensor after an inbound update was applied.
    SettingChanged {
        sensor: String,
        value: SensorValue,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        bounds: Option<Bounds>,
    },
    /// An inbound update that could not be applied.
    Rejected { sensor: String, error: PotError },
    Diagnostic { check: CheckId, diagnosis: Diagnosis },
}

/// Payload value as it appears on the wire.
///
/// Untagged, so `true`, `4.2` and `"Red"` all decode; variant order matters
/// because serde tries them top to bottom.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventValue {
    Bool(bool),
    Numeric(f64),
    Text(String),
}

impl From<EventValue> for SensorValue {
    /// Booleans become `1.0` / `0.0`; the gateway later rejects them for
    /// text sensors like any other kind mismatch.
    fn from(value: EventValue) -> Self {
        match value {
            EventValue::Bool(b) => SensorValue::Numeric(if b { 1.0 } else { 0.0 }),
            EventValue::Numeric(v) => SensorValue::Numeric(v),
            EventValue::Text(s) => SensorValue::Text(s),
        }
    }
}

/// A sensor update received over publish/subscribe.
///
/// `value` overwrites the reading, `min` + `max` adjust the bounds.  Both may
/// be present in one event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundEvent {
    pub sensor: String,
    /// Free-form tag such as `"nutrient"`; informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<EventValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl InboundEvent {
    pub fn set(sensor: impl Into<String>, value: EventValue) -> Self {
        Self {
            sensor: sensor.into(),
            category: None,
            value: Some(value),
            min: None,
            max: None,
        }
    }

    pub fn bounds(sensor: impl Into<String>, min: f64, max: f64) -> Self {
        Self {
            sensor: sensor.into(),
            category: None,
            value: None,
            min: Some(min),
            max: Some(max),
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_value_decodes_each_kind() {
        let b: EventValue = serde_json::from_str("true").unwrap();
        assert_eq!(b, EventValue::Bool(true));
        let n: EventValue = serde_json::from_str("3").unwrap();
        assert_eq!(n, EventValue::Numeric(3.0));
        let t: EventValue = serde_json::from_str("\"Black\"").unwrap();
        assert_eq!(t, EventValue::Text("Black".into()));
    }

    #[test]
    fn bool_maps_to_unit_numeric() {
        assert_eq!(SensorValue::from(EventValue::Bool(true)), SensorValue::Numeric(1.0));
        assert_eq!(SensorValue::from(EventValue::Bool(false)), SensorValue::Numeric(0.0));
    }

    #[test]
    fn inbound_event_with_category() {
        let raw = r#"{"sensor":"nitrogen","category":"nutrient","value":4.5}"#;
        let ev: InboundEvent = serde_json::from_str(raw).unwrap();
        assert_eq!(
            ev,
            InboundEvent::set("nitrogen", EventValue::Numeric(4.5)).with_category("nutrient")
        );
    }

    #[test]
    fn event_roundtrip() {
        let event = Event::new(
            "smartpot-middleware::test",
            EventPayload::Diagnostic {
                check: CheckId::Environment,
                diagnosis: Diagnosis::Alert("temperature under critical levels!".into()),
            },
        );
        let json = serde_json::to_string(&event).unwrap();
        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, event.id);
        assert_eq!(back.source, event.source);
    }
}
