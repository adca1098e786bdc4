use std::collections::HashMap;
use std::time::Duration;

use robovac_to_mqtt::robovac::RoboVac;
use robovac_to_mqtt::{config, mqtt, tuya};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = match config::Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    info!(
        "Starting robovac-to-mqtt bridge (mqtt={}:{}, vacuums={})",
        config.mqtt.broker_host,
        config.mqtt.broker_port,
        config.devices.len(),
    );

    for device in &config.devices {
        let details = device.robovac.model_details();
        info!(
            "  {} ({}) at {}: {} [{}], features {:?}",
            device.name,
            device.id,
            device.ip,
            details.name,
            device.robovac.model_code(),
            device.robovac.homeassistant_features(),
        );
    }

    let (mqtt_cmd_tx, mut mqtt_cmd_rx) = mpsc::channel::<mqtt::client::MqttMessage>(100);
    let (state_tx, state_rx) = mpsc::channel::<tuya::StateUpdate>(200);

    let mqtt_client = mqtt::client::MqttClient::new(&config);
    let mqtt_handle = tokio::spawn(async move {
        mqtt_client.run(mqtt_cmd_tx, state_rx).await;
    });

    // Keyed by topic_name for command routing
    let mut routes: HashMap<String, (RoboVac, mpsc::Sender<tuya::DpCommand>)> = HashMap::new();

    let poll_interval = Duration::from_secs(config.tuya.poll_interval_secs);
    let mut device_handles = Vec::new();

    for device_config in &config.devices {
        let (cmd_tx, cmd_rx) = mpsc::channel::<tuya::DpCommand>(50);
        routes.insert(
            device_config.topic_name.clone(),
            (device_config.robovac.clone(), cmd_tx),
        );

        let client = tuya::client::TuyaClient::new(device_config.clone());
        let tx = state_tx.clone();

        let handle = tokio::spawn(async move {
            client.run(tx, cmd_rx, poll_interval).await;
        });
        device_handles.push(handle);
    }

    // Channel closes once every device task has finished
    drop(state_tx);

    let topic_prefix = config.mqtt.topic_prefix.clone();

    loop {
        tokio::select! {
            Some(msg) = mqtt_cmd_rx.recv() => {
                let Some((topic_name, action)) = parse_command_topic(&msg.topic, &topic_prefix) else {
                    continue;
                };
                let Some((robovac, cmd_tx)) = routes.get(topic_name) else {
                    warn!("Unknown vacuum in command topic: {}", topic_name);
                    continue;
                };
                let Some(cmd) = tuya::client::build_command(robovac, action, msg.payload.trim()) else {
                    warn!("Could not build command: action={}, payload={}", action, msg.payload);
                    continue;
                };
                if cmd_tx.send(cmd).await.is_err() {
                    warn!("Command channel closed for vacuum {}", topic_name);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Received SIGINT, shutting down");
                break;
            }
            _ = async {
                match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                    Ok(mut sigterm) => { sigterm.recv().await; }
                    Err(e) => {
                        warn!("Failed to register SIGTERM handler: {}", e);
                        std::future::pending::<()>().await;
                    }
                }
            } => {
                info!("Received SIGTERM, shutting down");
                break;
            }
        }
    }

    for handle in device_handles {
        handle.abort();
    }
    mqtt_handle.abort();
    info!("robovac-to-mqtt bridge stopped");
}

/// Split a command topic into (topic_name, action).
/// Expected format: {prefix}/{topic_name}/command/{action}
fn parse_command_topic<'a>(topic: &'a str, prefix: &str) -> Option<(&'a str, &'a str)> {
    let rest = topic.strip_prefix(prefix)?.strip_prefix('/')?;
    let (topic_name, rest) = rest.split_once('/')?;
    let action = rest.strip_prefix("command/")?;
    if topic_name.is_empty() || action.is_empty() {
        return None;
    }
    Some((topic_name, action))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_command_topics() {
        assert_eq!(
            parse_command_topic("robovac/hall_vac/command/start", "robovac"),
            Some(("hall_vac", "start"))
        );
        assert_eq!(
            parse_command_topic("robovac/hall_vac/command/set_fan_speed", "robovac"),
            Some(("hall_vac", "set_fan_speed"))
        );
    }

    #[test]
    fn rejects_foreign_topics() {
        assert_eq!(parse_command_topic("robovac/hall_vac/state/status", "robovac"), None);
        assert_eq!(parse_command_topic("tuya/hall_vac/command/start", "robovac"), None);
        assert_eq!(parse_command_topic("robovac//command/start", "robovac"), None);
        assert_eq!(parse_command_topic("robovac/hall_vac/command/", "robovac"), None);
    }
}
