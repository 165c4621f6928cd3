//! JSON payload codec for transports.
//!
//! Inbound: `{"sensor": "soilPh", "category": "nutrient", "value": 6.5,
//! "min": 5.5, "max": 7.0}`; every field but `sensor` is optional.
//! Outbound: the serialized [`Event`] envelope.

use smartpot_types::{Event, InboundEvent, PotError, PotResult};

/// Decode a raw inbound payload.
///
/// # Errors
///
/// [`PotError::Decode`] for anything that is not a JSON object with a
/// string `sensor` field.
pub fn decode_inbound(payload: &[u8]) -> PotResult<InboundEvent> {
    serde_json::from_slice(payload).map_err(|e| PotError::Decode(e.to_string()))
}

/// Encode an event for an outbound transport.
///
/// # Errors
///
/// [`PotError::Decode`] if serialization fails.
pub fn encode_event(event: &Event) -> PotResult<Vec<u8>> {
    serde_json::to_vec(event).map_err(|e| PotError::Decode(e.to_string()))
}
