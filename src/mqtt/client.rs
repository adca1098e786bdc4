use std::collections::HashMap;
use std::time::Duration;

use rumqttc::{AsyncClient, Event, EventLoop, Incoming, LastWill, MqttOptions, Publish, QoS};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::tuya::StateUpdate;

pub struct MqttMessage {
    pub topic: String,
    pub payload: String,
}

impl From<&Publish> for MqttMessage {
    fn from(publish: &Publish) -> Self {
        Self {
            topic: publish.topic.clone(),
            payload: String::from_utf8_lossy(&publish.payload).to_string(),
        }
    }
}

pub struct MqttClient {
    client: AsyncClient,
    eventloop: EventLoop,
    config: Config,
}

impl MqttClient {
    pub fn new(config: &Config) -> Self {
        let mut mqttopts = MqttOptions::new(
            &config.mqtt.client_id,
            &config.mqtt.broker_host,
            config.mqtt.broker_port,
        );
        mqttopts.set_keep_alive(Duration::from_secs(30));

        if let (Some(user), Some(pass)) = (&config.mqtt.username, &config.mqtt.password) {
            mqttopts.set_credentials(user, pass);
        }

        mqttopts.set_last_will(LastWill::new(
            availability_topic(config),
            "offline".as_bytes().to_vec(),
            QoS::AtLeastOnce,
            true,
        ));

        let (client, eventloop) = AsyncClient::new(mqttopts, 100);

        Self {
            client,
            eventloop,
            config: config.clone(),
        }
    }

    /// Run the MQTT event loop. On connect, announces each vacuum and
    /// subscribes to its command topics; forwards incoming publishes through
    /// `command_tx` and publishes state updates received from `state_rx`.
    pub async fn run(
        mut self,
        command_tx: mpsc::Sender<MqttMessage>,
        mut state_rx: mpsc::Receiver<StateUpdate>,
    ) {
        let mut last_values: HashMap<String, String> = HashMap::new();

        loop {
            tokio::select! {
                event = self.eventloop.poll() => {
                    match event {
                        Ok(Event::Incoming(Incoming::ConnAck(_))) => {
                            info!("Connected to MQTT broker");
                            announce(&self.client, &self.config).await;
                            // Republish every field after a reconnect.
                            last_values.clear();
                        }
                        Ok(Event::Incoming(Incoming::Publish(publish))) => {
                            if command_tx.send(MqttMessage::from(&publish)).await.is_err() {
                                warn!("Command channel closed");
                            }
                        }
                        Ok(_) => {}
                        Err(e) => {
                            error!("MQTT connection error: {}. Reconnecting...", e);
                            tokio::time::sleep(Duration::from_secs(5)).await;
                        }
                    }
                }
                Some(update) = state_rx.recv() => {
                    let topic = self.config.device_state_topic(&update.topic_name, &update.field);
                    if last_values.get(&topic) == Some(&update.value) {
                        debug!("Unchanged {}: {}", topic, update.value);
                        continue;
                    }
                    info!("Publishing {}: {}", topic, update.value);
                    if let Err(e) = self
                        .client
                        .publish(&topic, QoS::AtMostOnce, true, update.value.as_bytes())
                        .await
                    {
                        warn!("Failed to publish {}: {}", topic, e);
                        continue;
                    }
                    last_values.insert(topic, update.value);
                }
            }
        }
    }
}

/// Topic carrying the bridge's online/offline marker. The last will and the
/// `online` announcement always go to the same topic: a single vacuum gets its
/// own, several share the bridge topic.
fn availability_topic(config: &Config) -> String {
    match config.devices.as_slice() {
        [only] => config.device_status_topic(&only.topic_name),
        _ => config.bridge_status_topic(),
    }
}

async fn announce(client: &AsyncClient, config: &Config) {
    let status_topic = availability_topic(config);
    if let Err(e) = client
        .publish(&status_topic, QoS::AtLeastOnce, true, "online")
        .await
    {
        error!("Failed to publish online status: {}", e);
    }

    for device in &config.devices {
        let fan_speeds = serde_json::to_string(&device.robovac.fan_speeds())
            .unwrap_or_else(|_| "[]".to_string());
        let fan_topic = config.fan_speed_list_topic(&device.topic_name);
        if let Err(e) = client
            .publish(&fan_topic, QoS::AtLeastOnce, true, fan_speeds)
            .await
        {
            error!("Failed to publish {}: {}", fan_topic, e);
        }

        let command_topic = config.device_command_topic(&device.topic_name);
        if let Err(e) = client.subscribe(&command_topic, QoS::AtLeastOnce).await {
            error!("Failed to subscribe to {}: {}", command_topic, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MqttConfig, TuyaConfig, parse_devices};

    fn config_for(names: &[&str]) -> Config {
        let raw: Vec<serde_json::Value> = names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                serde_json::json!({
                    "id": format!("dev{i}"),
                    "key": "k",
                    "ip": format!("10.0.0.{}", i + 2),
                    "model": "T2278",
                    "name": name,
                })
            })
            .collect();
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
            devices: parse_devices(&serde_json::Value::Array(raw).to_string()).unwrap(),
        }
    }

    #[test]
    fn single_vacuum_uses_its_own_status_topic() {
        let config = config_for(&["Hall Vac"]);
        assert_eq!(availability_topic(&config), "robovac/hall_vac/bridge_status");
    }

    #[test]
    fn several_vacuums_share_the_bridge_status_topic() {
        let config = config_for(&["Hall Vac", "Kitchen Vac"]);
        assert_eq!(availability_topic(&config), "robovac/bridge_status");
    }

    #[test]
    fn converts_publish_payload() {
        let publish = Publish::new("robovac/hall_vac/command/start", QoS::AtLeastOnce, "go");
        let msg = MqttMessage::from(&publish);
        assert_eq!(msg.topic, "robovac/hall_vac/command/start");
        assert_eq!(msg.payload, "go");
    }
}
