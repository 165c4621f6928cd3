//! Controller configuration – reads/writes `~/.smartpot/config.toml`.

use std::collections::HashSet;
use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use smartpot_endpoint::MAX_WORKERS;
use smartpot_middleware::{MqttSettings, MAX_CONCURRENCY};
use smartpot_registry::SensorRegistry;
use smartpot_types::{PlantProfile, PotError, PotResult, Sensor};

/// Persisted controller configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_http_port")]
    pub http_port: u16,

    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Requests handled concurrently by the HTTP endpoint.
    #[serde(default = "default_http_workers")]
    pub http_workers: usize,

    /// Inbound pub/sub events applied concurrently.
    #[serde(default = "default_ingress_concurrency")]
    pub ingress_concurrency: usize,

    #[serde(default = "default_bus_capacity")]
    pub bus_capacity: usize,

    #[serde(default)]
    pub mqtt: MqttConfig,

    #[serde(default = "default_sensors")]
    pub sensors: Vec<SensorConfig>,

    /// `None` or an empty species means no plant is housed yet.
    #[serde(default = "default_plant", skip_serializing_if = "Option::is_none")]
    pub plant: Option<PlantConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MqttConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_mqtt_host")]
    pub host: String,
    #[serde(default = "default_mqtt_port")]
    pub port: u16,
    #[serde(default = "default_client_id")]
    pub client_id: String,
    #[serde(default = "default_inbound_topic")]
    pub inbound_topic: String,
    #[serde(default = "default_outbound_topic")]
    pub outbound_topic: String,
    #[serde(default = "default_keep_alive_secs")]
    pub keep_alive_secs: u64,
    #[serde(default = "default_retry_secs")]
    pub retry_secs: u64,
}

/// One `[[sensors]]` entry.  Exactly one of `value` / `text` must be set;
/// `min` and `max` come together and only on numeric sensors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlantConfig {
    pub species: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub height: f64,
    #[serde(default)]
    pub plant_type: String,
    #[serde(default)]
    pub compatible_soil: String,
}

/// Largest accepted `bus_capacity`.
pub const MAX_BUS_CAPACITY: usize = 65_536;

fn default_http_port() -> u16 {
    8080
}
fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}
fn default_http_workers() -> usize {
    2
}
fn default_ingress_concurrency() -> usize {
    8
}
fn default_bus_capacity() -> usize {
    256
}
fn default_mqtt_host() -> String {
    "localhost".to_string()
}
fn default_mqtt_port() -> u16 {
    1883
}
fn default_client_id() -> String {
    "smartpot".to_string()
}
fn default_inbound_topic() -> String {
    "smartpot/in".to_string()
}
fn default_outbound_topic() -> String {
    "smartpot/out".to_string()
}
fn default_keep_alive_secs() -> u64 {
    30
}
fn default_retry_secs() -> u64 {
    5
}

fn numeric(name: &str, value: f64, min: f64, max: f64) -> SensorConfig {
    SensorConfig {
        name: name.to_string(),
        value: Some(value),
        text: None,
        min: Some(min),
        max: Some(max),
    }
}

/// The sensor set a freshly flashed pot ships with.
fn default_sensors() -> Vec<SensorConfig> {
    vec![
        numeric("soilHumidity", 2.0, 3.0, 6.0),
        numeric("luminosity", 2.0, 4.0, 5.0),
        numeric("temperature", 3.0, 3.0, 3.0),
        SensorConfig {
            name: "soilType".to_string(),
            value: None,
            text: Some("Red".to_string()),
            min: None,
            max: None,
        },
        numeric("humidity", 3.0, 3.0, 3.0),
        numeric("soilPh", 3.0, 3.0, 3.0),
        numeric("phosphorus", 2.0, 2.0, 5.0),
        numeric("nitrogen", 2.0, 2.0, 5.0),
        numeric("potassium", 2.0, 2.0, 5.0),
    ]
}

fn default_plant() -> Option<PlantConfig> {
    Some(PlantConfig {
        species: "Cactus".to_string(),
        color: "Green".to_string(),
        height: 1.3,
        plant_type: "Desert".to_string(),
        compatible_soil: "Red".to_string(),
    })
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: default_mqtt_host(),
            port: default_mqtt_port(),
            client_id: default_client_id(),
            inbound_topic: default_inbound_topic(),
            outbound_topic: default_outbound_topic(),
            keep_alive_secs: default_keep_alive_secs(),
            retry_secs: default_retry_secs(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_port: default_http_port(),
            bind_address: default_bind_address(),
            http_workers: default_http_workers(),
            ingress_concurrency: default_ingress_concurrency(),
            bus_capacity: default_bus_capacity(),
            mqtt: MqttConfig::default(),
            sensors: default_sensors(),
            plant: default_plant(),
        }
    }
}

impl SensorConfig {
    fn to_sensor(&self) -> PotResult<Sensor> {
        let invalid = |details: &str| {
            PotError::Config(format!("sensor '{}': {details}", self.name))
        };
        let bounded = |value: f64| match (self.min, self.max) {
            (Some(min), Some(max)) => Sensor::bounded(value, min, max)
                .map_err(|e| PotError::Config(format!("sensor '{}': {e}", self.name))),
            (None, None) => Ok(Sensor::numeric(value)),
            _ => Err(invalid("min and max must be given together")),
        };
        match (self.value, &self.text) {
            (Some(value), None) => bounded(value),
            (None, Some(text)) if self.min.is_none() && self.max.is_none() => Ok(Sensor::text(text)),
            (None, Some(_)) => Err(invalid("text sensors cannot have bounds")),
            (Some(_), Some(_)) => Err(invalid("set either value or text, not both")),
            (None, None) => Err(invalid("one of value or text is required")),
        }
    }
}

impl Config {
    /// Check the sizing knobs.
    ///
    /// # Errors
    ///
    /// [`PotError::Config`] when a worker count or the bus capacity is zero
    /// or above its limit.
    pub fn validate(&self) -> PotResult<()> {
        let limits = [
            ("http_workers", self.http_workers, MAX_WORKERS),
            ("ingress_concurrency", self.ingress_concurrency, MAX_CONCURRENCY),
            ("bus_capacity", self.bus_capacity, MAX_BUS_CAPACITY),
        ];
        for (field, value, max) in limits {
            if !(1..=max).contains(&value) {
                return Err(PotError::Config(format!(
                    "{field} must be between 1 and {max}, got {value}"
                )));
            }
        }
        Ok(())
    }

    /// Validate the config and turn the sensor list and plant table into
    /// the registry and profile the gateway starts from.
    ///
    /// # Errors
    ///
    /// [`PotError::Config`] naming the first offending entry.
    pub fn provisioning(&self) -> PotResult<(SensorRegistry, PlantProfile)> {
        self.validate()?;
        let mut registry = SensorRegistry::new();
        let mut seen = HashSet::new();
        for entry in &self.sensors {
            if !seen.insert(entry.name.as_str()) {
                return Err(PotError::Config(format!("sensor '{}' declared twice", entry.name)));
            }
            registry
                .provision(entry.name.as_str(), entry.to_sensor()?)
                .map_err(|e| PotError::Config(e.to_string()))?;
        }

        let profile = match &self.plant {
            Some(p) if !p.species.trim().is_empty() => PlantProfile::new(
                p.species.as_str(),
                p.color.as_str(),
                p.height,
                p.plant_type.as_str(),
                p.compatible_soil.as_str(),
            )
            .map_err(|e| PotError::Config(e.to_string()))?,
            _ => PlantProfile::empty(),
        };
        Ok((registry, profile))
    }

    /// # Errors
    ///
    /// [`PotError::Config`] when `bind_address` is not an IP address.
    pub fn http_addr(&self) -> PotResult<SocketAddr> {
        let ip: IpAddr = self.bind_address.parse().map_err(|_| {
            PotError::Config(format!("bind_address '{}' is not an IP address", self.bind_address))
        })?;
        Ok(SocketAddr::new(ip, self.http_port))
    }

    pub fn mqtt_settings(&self) -> MqttSettings {
        MqttSettings {
            host: self.mqtt.host.clone(),
            port: self.mqtt.port,
            client_id: self.mqtt.client_id.clone(),
            inbound_topic: self.mqtt.inbound_topic.clone(),
            outbound_topic: self.mqtt.outbound_topic.clone(),
            keep_alive: Duration::from_secs(self.mqtt.keep_alive_secs),
            retry_delay: Duration::from_secs(self.mqtt.retry_secs),
        }
    }
}

/// Return the path to `~/.smartpot/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".smartpot").join("config.toml")
}

/// Load the config from disk and apply environment overrides.  Returns
/// `None` if the file does not exist.
pub fn load() -> PotResult<Option<Config>> {
    let mut cfg = load_from(&config_path())?;
    if let Some(cfg) = cfg.as_mut() {
        apply_env_overrides(cfg);
    }
    Ok(cfg)
}

pub(crate) fn load_from(path: &Path) -> PotResult<Option<Config>> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| PotError::Config(format!("failed to read {}: {e}", path.display())))?;
    toml::from_str(&raw)
        .map(Some)
        .map_err(|e| PotError::Config(format!("failed to parse {}: {e}", path.display())))
}

/// Apply `SMARTPOT_*` environment overrides.  Unparsable values are ignored.
///
/// | Variable | Config field |
/// |---|---|
/// | `SMARTPOT_HTTP_PORT` | `http_port` |
/// | `SMARTPOT_BIND_ADDRESS` | `bind_address` |
/// | `SMARTPOT_MQTT_HOST` | `mqtt.host` |
/// | `SMARTPOT_MQTT_PORT` | `mqtt.port` |
pub fn apply_env_overrides(cfg: &mut Config) {
    apply_overrides(cfg, |key| std::env::var(key).ok());
}

pub(crate) fn apply_overrides(cfg: &mut Config, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("SMARTPOT_HTTP_PORT")
        && let Ok(port) = v.parse::<u16>()
    {
        cfg.http_port = port;
    }
    if let Some(v) = var("SMARTPOT_BIND_ADDRESS")
        && v.parse::<IpAddr>().is_ok()
    {
        cfg.bind_address = v;
    }
    if let Some(v) = var("SMARTPOT_MQTT_HOST")
        && !v.trim().is_empty()
    {
        cfg.mqtt.host = v;
    }
    if let Some(v) = var("SMARTPOT_MQTT_PORT")
        && let Ok(port) = v.parse::<u16>()
    {
        cfg.mqtt.port = port;
    }
}

/// Save the config, creating `~/.smartpot/` if necessary.
pub fn save(cfg: &Config) -> PotResult<()> {
    save_to(cfg, &config_path())
}

pub(crate) fn save_to(cfg: &Config, path: &Path) -> PotResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| PotError::Config(format!("failed to create config directory: {e}")))?;
    }
    let raw = toml::to_string_pretty(cfg)
        .map_err(|e| PotError::Config(format!("failed to serialize config: {e}")))?;
    fs::write(path, raw)
        .map_err(|e| PotError::Config(format!("failed to write {}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_match_factory_device() {
        let cfg = Config::default();
        assert_eq!(cfg.http_port, 8080);
        assert_eq!(cfg.http_workers, 2);
        assert!(!cfg.mqtt.enabled);
        assert_eq!(cfg.mqtt.inbound_topic, "smartpot/in");

        let (registry, profile) = cfg.provisioning().unwrap();
        assert_eq!(registry.len(), 9);
        assert_eq!(registry.get("soilType").unwrap().as_text(), Some("Red"));
        assert_eq!(profile.species, "Cactus");
    }

    #[test]
    fn roundtrip_default_config() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());

        let cfg = Config::default();
        save_to(&cfg, &path).expect("save");

        let loaded = load_from(&path).expect("load ok").expect("some");
        assert_eq!(loaded.sensors, cfg.sensors);
        assert_eq!(loaded.plant, cfg.plant);
        assert_eq!(loaded.mqtt, cfg.mqtt);
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
http_workers = 4

[mqtt]
enabled = true
host = "broker.local"

[[sensors]]
name = "soilPh"
value = 6.5
min = 5.5
max = 7.0

[plant]
species = ""
"#,
        )
        .unwrap();

        let cfg = load_from(&path).unwrap().unwrap();
        assert_eq!(cfg.http_workers, 4);
        assert_eq!(cfg.mqtt.port, 1883);
        assert_eq!(cfg.mqtt_settings().host, "broker.local");

        let (registry, profile) = cfg.provisioning().unwrap();
        assert_eq!(registry.len(), 1);
        assert!(!profile.is_provisioned());
    }

    #[test]
    fn config_path_points_to_smartpot_dir() {
        let p = config_path_for_home("/home/testuser");
        assert!(p.to_string_lossy().contains(".smartpot"));
        assert!(p.to_string_lossy().ends_with("config.toml"));
    }

    #[test]
    fn load_from_returns_none_when_missing() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());
        assert!(load_from(&path).expect("no error").is_none());
    }

    #[test]
    fn malformed_file_is_config_error() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "http_port = \"eighty\"").unwrap();
        assert!(matches!(load_from(&path), Err(PotError::Config(_))));
    }

    #[test]
    fn invalid_sensor_entries_abort_provisioning() {
        let cases = [
            SensorConfig { name: "a".into(), value: None, text: None, min: None, max: None },
            SensorConfig { name: "b".into(), value: Some(1.0), text: Some("x".into()), min: None, max: None },
            SensorConfig { name: "c".into(), value: Some(1.0), text: None, min: Some(1.0), max: None },
            SensorConfig { name: "d".into(), value: None, text: Some("x".into()), min: Some(1.0), max: Some(2.0) },
            numeric("e", 1.0, 5.0, 2.0),
        ];
        for entry in cases {
            let cfg = Config { sensors: vec![entry.clone()], ..Config::default() };
            assert!(
                matches!(cfg.provisioning(), Err(PotError::Config(_))),
                "{entry:?} must be rejected"
            );
        }
    }

    #[test]
    fn duplicate_sensor_names_are_rejected() {
        let cfg = Config {
            sensors: vec![numeric("soilPh", 1.0, 0.0, 2.0), numeric("soilPh", 2.0, 0.0, 2.0)],
            ..Config::default()
        };
        assert!(matches!(cfg.provisioning(), Err(PotError::Config(_))));
    }

    #[test]
    fn http_addr_requires_ip() {
        let mut cfg = Config::default();
        assert_eq!(cfg.http_addr().unwrap().to_string(), "0.0.0.0:8080");
        cfg.bind_address = "pot.local".into();
        assert!(cfg.http_addr().is_err());
    }

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn overrides_change_ports_and_host() {
        let mut cfg = Config::default();
        apply_overrides(
            &mut cfg,
            vars(&[
                ("SMARTPOT_HTTP_PORT", "9191"),
                ("SMARTPOT_MQTT_HOST", "greenhouse-broker"),
                ("SMARTPOT_MQTT_PORT", "8883"),
                ("SMARTPOT_BIND_ADDRESS", "127.0.0.1"),
            ]),
        );
        assert_eq!(cfg.http_port, 9191);
        assert_eq!(cfg.mqtt.host, "greenhouse-broker");
        assert_eq!(cfg.mqtt.port, 8883);
        assert_eq!(cfg.bind_address, "127.0.0.1");
    }

    #[test]
    fn overrides_ignore_invalid_values() {
        let mut cfg = Config::default();
        apply_overrides(
            &mut cfg,
            vars(&[
                ("SMARTPOT_HTTP_PORT", "99999"),
                ("SMARTPOT_MQTT_PORT", "not-a-port"),
                ("SMARTPOT_MQTT_HOST", "  "),
                ("SMARTPOT_BIND_ADDRESS", "everywhere"),
            ]),
        );
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn load_from_does_not_read_the_environment() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "http_port = 7000").unwrap();
        // Whatever SMARTPOT_HTTP_PORT holds, the file value wins here.
        assert_eq!(load_from(&path).unwrap().unwrap().http_port, 7000);
    }

    #[test]
    fn sizing_limits_are_enforced() {
        assert!(Config::default().validate().is_ok());
        let too_big = [
            Config { http_workers: MAX_WORKERS + 1, ..Config::default() },
            Config { ingress_concurrency: usize::MAX, ..Config::default() },
            Config { bus_capacity: MAX_BUS_CAPACITY + 1, ..Config::default() },
            Config { http_workers: 0, ..Config::default() },
        ];
        for cfg in too_big {
            assert!(matches!(cfg.provisioning(), Err(PotError::Config(_))), "{cfg:?}");
        }
    }
}
