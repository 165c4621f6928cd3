//! Transport-neutral entry points: [`Gateway::execute`] for request/response
//! ingress and [`Gateway::apply_event`] for publish/subscribe ingress.
//!
//! Both translate into exactly one gateway call, so an operation takes the
//! lock once and returns an owned result the adapter can render after the
//! lock is gone.

use smartpot_diagnostics::checks::NO_PLANT;
use smartpot_diagnostics::checks_watching;
use smartpot_types::{
    Bounds, CheckId, EventPayload, InboundEvent, Operation, PotError, Reply, ReplyStatus,
    ResultCode, SensorValue,
};
use tracing::{debug, warn};

use crate::gateway::Gateway;

impl Gateway {
    /// Run one [`Operation`] and describe its outcome.
    pub fn execute(&self, op: Operation) -> Reply {
        debug!(?op, "executing operation");
        match op {
            Operation::Ping => Reply::ok("OK"),

            Operation::ReadSetting { name } => match self.read_setting(&name) {
                Some(sensor) => Reply::ok(format!("{name} is {}", sensor.value)),
                None => Reply::not_found(format!("{name} was not found")),
            },

            Operation::ListSettings => {
                let lines: Vec<String> = self
                    .list_settings()
                    .into_iter()
                    .map(|(name, sensor)| match sensor.bounds {
                        Some(b) => format!("{name}: {} [{}, {}]", sensor.value, b.min(), b.max()),
                        None => format!("{name}: {}", sensor.value),
                    })
                    .collect();
                Reply::ok(lines.join("\n"))
            }

            Operation::WriteSetting { name, raw } => match self.write_raw(&name, &raw) {
                Ok(true) => Reply::ok(format!("{name} was set to {raw}")),
                Ok(false) => Reply::not_found(format!("{name} was not found")),
                Err(e) => Reply::from(&e),
            },

            Operation::AdjustBounds { name, min, max } => {
                match self.adjust_bounds(&name, min, max) {
                    Ok(true) => Reply::ok(format!("{name} bounds set to [{min}, {max}]")),
                    Ok(false) => Reply::not_found(format!("{name} was not found")),
                    Err(e) => Reply::from(&e),
                }
            }

            Operation::RunDiagnostic { check } => {
                let (diagnosis, provisioned) = self.run_diagnostic_in_context(check);
                Reply::from_diagnosis(&diagnosis, check.requires_profile() && !provisioned)
            }

            Operation::ApplyCorrection { check } => {
                let (diagnosis, provisioned) = self.apply_correction_in_context(check);
                Reply::from_diagnosis(&diagnosis, check.requires_profile() && !provisioned)
            }

            Operation::ReadProfile => {
                let (diagnosis, provisioned) = self.run_diagnostic_in_context(CheckId::PlantData);
                if provisioned {
                    Reply::from_diagnosis(&diagnosis, false)
                } else {
                    Reply {
                        status: ReplyStatus::MissingProfile,
                        code: ResultCode::Error,
                        message: NO_PLANT.to_string(),
                    }
                }
            }
        }
    }

    /// Apply one inbound pub/sub update.
    ///
    /// The value and bounds are written together, and the alerting checks
    /// that watch the touched sensor are evaluated against the state right
    /// after the write, all under one lock.  Returns the events to publish:
    /// a `SettingChanged` or `Rejected` first, then one `Diagnostic` per
    /// alert raised.
    pub fn apply_event(&self, event: &InboundEvent) -> Vec<EventPayload> {
        let sensor = event.sensor.clone();
        let rejected = |error: PotError| {
            warn!(sensor = %event.sensor, %error, "inbound event rejected");
            vec![EventPayload::Rejected {
                sensor: event.sensor.clone(),
                error,
            }]
        };

        if sensor.is_empty() {
            return rejected(PotError::invalid("", "sensor name must not be empty"));
        }
        let bounds = match (event.min, event.max) {
            (Some(min), Some(max)) => match Bounds::new(min, max) {
                Ok(b) => Some(b),
                Err(e) => return rejected(e),
            },
            (None, None) => None,
            _ => return rejected(PotError::invalid(&sensor, "min and max must be given together")),
        };
        let value: Option<SensorValue> = event.value.clone().map(Into::into);
        if value.is_none() && bounds.is_none() {
            return rejected(PotError::invalid(&sensor, "event carries neither a value nor bounds"));
        }

        match self.update_and_watch(&sensor, value, bounds, checks_watching(&sensor)) {
            Ok(Some((updated, findings))) => {
                let mut out = vec![EventPayload::SettingChanged {
                    sensor,
                    value: updated.value,
                    bounds: updated.bounds,
                }];
                out.extend(
                    findings
                        .into_iter()
                        .filter(|(_, d)| d.is_alert())
                        .map(|(check, diagnosis)| EventPayload::Diagnostic { check, diagnosis }),
                );
                out
            }
            Ok(None) => rejected(PotError::NotFound(sensor)),
            Err(e) => rejected(e),
        }
    }
}
