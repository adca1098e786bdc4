use serde::Deserialize;
use std::env;
use std::net::IpAddr;

use crate::robovac::RoboVac;

#[derive(Debug, Clone)]
pub struct Config {
    pub mqtt: MqttConfig,
    pub tuya: TuyaConfig,
    pub devices: Vec<DeviceConfig>,
}

#[derive(Debug, Clone)]
pub struct MqttConfig {
    pub broker_host: String,
    pub broker_port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub topic_prefix: String,
    pub client_id: String,
}

#[derive(Debug, Clone)]
pub struct TuyaConfig {
    pub poll_interval_secs: u64,
}

#[derive(Debug, Clone)]
pub struct DeviceConfig {
    pub id: String,
    pub key: String,
    pub ip: IpAddr,
    pub name: String,
    /// Tuya protocol version, "3.3" for every RoboVac seen so far
    pub version: String,
    /// Sanitized name for use in MQTT topics (lowercase, spaces to underscores)
    pub topic_name: String,
    pub robovac: RoboVac,
}

#[derive(Deserialize)]
struct RawDevice {
    id: String,
    key: String,
    #[serde(default)]
    ip: Option<String>,
    model: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    version: Option<String>,
}

fn env_required(key: &str) -> Result<String, String> {
    env::var(key).map_err(|_| format!("{key} environment variable is required"))
}

fn env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.is_empty())
}

fn env_or_default<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let devices_file = env_or_default("DEVICES_FILE", "devices.json".to_string());
        let content = std::fs::read_to_string(&devices_file)
            .map_err(|e| format!("Failed to read {devices_file}: {e}"))?;
        let devices =
            parse_devices(&content).map_err(|e| format!("Failed to load {devices_file}: {e}"))?;

        let config = Self {
            mqtt: MqttConfig {
                broker_host: env_required("MQTT_BROKER_HOST")?,
                broker_port: env_or_default("MQTT_BROKER_PORT", 1883),
                username: env_optional("MQTT_USERNAME"),
                password: env_optional("MQTT_PASSWORD"),
                topic_prefix: env_or_default("MQTT_TOPIC_PREFIX", "robovac".to_string()),
                client_id: env_or_default("MQTT_CLIENT_ID", "robovac-to-mqtt".to_string()),
            },
            tuya: TuyaConfig {
                poll_interval_secs: env_or_default("TUYA_POLL_INTERVAL_SECS", 30),
            },
            devices,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), String> {
        if self.mqtt.broker_host.is_empty() {
            return Err("MQTT_BROKER_HOST must not be empty".into());
        }
        if self.devices.is_empty() {
            return Err("No devices found in devices file".into());
        }
        if self.tuya.poll_interval_secs == 0 {
            return Err("TUYA_POLL_INTERVAL_SECS must be > 0".into());
        }
        for (i, device) in self.devices.iter().enumerate() {
            if device.topic_name.is_empty() {
                return Err(format!(
                    "Device {} name '{}' has no characters usable in a topic",
                    device.id, device.name
                ));
            }
            if self.devices[..i]
                .iter()
                .any(|d| d.topic_name == device.topic_name)
            {
                return Err(format!(
                    "Devices share the topic name '{}'; give them distinct names",
                    device.topic_name
                ));
            }
        }
        Ok(())
    }

    pub fn bridge_status_topic(&self) -> String {
        format!("{}/bridge_status", self.mqtt.topic_prefix)
    }

    pub fn device_status_topic(&self, topic_name: &str) -> String {
        format!("{}/{}/bridge_status", self.mqtt.topic_prefix, topic_name)
    }

    pub fn device_command_topic(&self, topic_name: &str) -> String {
        format!("{}/{}/command/#", self.mqtt.topic_prefix, topic_name)
    }

    pub fn device_state_topic(&self, topic_name: &str, field: &str) -> String {
        format!("{}/{}/state/{}", self.mqtt.topic_prefix, topic_name, field)
    }

    pub fn fan_speed_list_topic(&self, topic_name: &str) -> String {
        format!("{}/{}/fan_speed_list", self.mqtt.topic_prefix, topic_name)
    }
}

pub(crate) fn parse_devices(content: &str) -> Result<Vec<DeviceConfig>, String> {
    let raw_devices: Vec<RawDevice> =
        serde_json::from_str(content).map_err(|e| format!("invalid JSON: {e}"))?;

    raw_devices
        .into_iter()
        .map(|raw| {
            let ip: IpAddr = raw
                .ip
                .as_deref()
                .ok_or_else(|| format!("Device {} missing 'ip' field", raw.id))?
                .parse()
                .map_err(|e| format!("Device {} invalid IP: {e}", raw.id))?;

            let robovac =
                RoboVac::new(&raw.model).map_err(|e| format!("Device {}: {e}", raw.id))?;

            let name = raw.name.unwrap_or_else(|| raw.id.clone());
            let topic_name = sanitize_topic_name(&name);

            Ok(DeviceConfig {
                name,
                id: raw.id,
                key: raw.key,
                ip,
                version: raw.version.unwrap_or_else(|| "3.3".to_string()),
                topic_name,
                robovac,
            })
        })
        .collect()
}

/// Convert a device name into a safe MQTT topic segment.
/// "Living Room Vac" → "living_room_vac"
fn sanitize_topic_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect::<String>()
        .trim_matches('_')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(devices: Vec<DeviceConfig>) -> Config {
        Config {
            mqtt: MqttConfig {
                broker_host: "broker".into(),
                broker_port: 1883,
                username: None,
                password: None,
                topic_prefix: "robovac".into(),
                client_id: "test".into(),
            },
            tuya: TuyaConfig {
                poll_interval_secs: 30,
            },
            devices,
        }
    }

    #[test]
    fn sanitizes_names() {
        assert_eq!(sanitize_topic_name("Living Room Vac"), "living_room_vac");
        assert_eq!(sanitize_topic_name("  L60 (upstairs)"), "l60__upstairs");
    }

    #[test]
    fn parses_devices() {
        let json = r#"[
            {"id": "abc123", "key": "k", "ip": "192.168.1.100", "model": "T2278", "name": "Hall Vac"},
            {"id": "def456", "key": "k", "ip": "192.168.1.101", "model": "T2278", "version": "3.4"}
        ]"#;
        let devices = parse_devices(json).unwrap();
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].topic_name, "hall_vac");
        assert_eq!(devices[0].version, "3.3");
        assert_eq!(devices[0].robovac.model_details().model, "T2278");
        assert_eq!(devices[1].name, "def456");
        assert_eq!(devices[1].version, "3.4");
    }

    #[test]
    fn rejects_unknown_model() {
        let json = r#"[{"id": "abc", "key": "k", "ip": "10.0.0.2", "model": "T1234"}]"#;
        let err = parse_devices(json).unwrap_err();
        assert_eq!(err, "Device abc: Model T1234 is not supported");
    }

    #[test]
    fn rejects_missing_ip() {
        let json = r#"[{"id": "abc", "key": "k", "model": "T2278"}]"#;
        assert_eq!(
            parse_devices(json).unwrap_err(),
            "Device abc missing 'ip' field"
        );
    }

    #[test]
    fn rejects_duplicate_topic_names() {
        let json = r#"[
            {"id": "a", "key": "k", "ip": "10.0.0.2", "model": "T2278", "name": "Vac"},
            {"id": "b", "key": "k", "ip": "10.0.0.3", "model": "T2278", "name": "vac"}
        ]"#;
        let config = config_with(parse_devices(json).unwrap());
        assert!(config.validate().unwrap_err().contains("'vac'"));
    }

    #[test]
    fn rejects_names_without_topic_characters() {
        let json = r#"[{"id": "a", "key": "k", "ip": "10.0.0.2", "model": "T2278", "name": "!!!"}]"#;
        let config = config_with(parse_devices(json).unwrap());
        assert_eq!(config.devices[0].topic_name, "");
        assert_eq!(
            config.validate().unwrap_err(),
            "Device a name '!!!' has no characters usable in a topic"
        );
    }

    #[test]
    fn topics() {
        let json = r#"[{"id": "a", "key": "k", "ip": "10.0.0.2", "model": "T2278", "name": "Vac"}]"#;
        let config = config_with(parse_devices(json).unwrap());
        assert!(config.validate().is_ok());
        assert_eq!(config.device_command_topic("vac"), "robovac/vac/command/#");
        assert_eq!(
            config.device_state_topic("vac", "activity"),
            "robovac/vac/state/activity"
        );
        assert_eq!(config.device_status_topic("vac"), "robovac/vac/bridge_status");
        assert_eq!(config.bridge_status_topic(), "robovac/bridge_status");
    }
}
