use std::time::Duration;

use rust_async_tuyapi::mesparse::{CommandType, Message};
use rust_async_tuyapi::tuyadevice::TuyaDevice;
use rust_async_tuyapi::{Payload, PayloadStruct};
use serde_json::{Map, Value, json};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::config::DeviceConfig;
use crate::robovac::RoboVac;
use crate::vacuums::{RobovacCommand, VacuumEntityFeature};

use super::{DpCommand, StateUpdate};

pub struct TuyaClient {
    config: DeviceConfig,
}

impl TuyaClient {
    pub fn new(config: DeviceConfig) -> Self {
        Self { config }
    }

    /// Device loop. Connects, polls, handles commands, reconnects on failure.
    pub async fn run(
        &self,
        state_tx: mpsc::Sender<StateUpdate>,
        mut cmd_rx: mpsc::Receiver<DpCommand>,
        poll_interval: Duration,
    ) {
        let mut backoff = Duration::from_secs(5);
        let max_backoff = Duration::from_secs(60);

        loop {
            info!(
                "Connecting to {} {} ({}) at {}",
                self.config.robovac.model_details().model,
                self.config.name,
                self.config.id,
                self.config.ip
            );

            match self.run_session(&state_tx, &mut cmd_rx, poll_interval).await {
                Ok(()) => {
                    info!("Vacuum {} session ended cleanly", self.config.name);
                    backoff = Duration::from_secs(5);
                }
                Err(e) => {
                    error!(
                        "Vacuum {} session error: {}. Reconnecting in {:?}",
                        self.config.name, e, backoff
                    );
                    tokio::time::sleep(backoff).await;
                    backoff = (backoff * 2).min(max_backoff);
                }
            }
        }
    }

    async fn run_session(
        &self,
        state_tx: &mpsc::Sender<StateUpdate>,
        cmd_rx: &mut mpsc::Receiver<DpCommand>,
        poll_interval: Duration,
    ) -> Result<(), String> {
        let mut device = TuyaDevice::new(
            &self.config.version,
            &self.config.id,
            Some(&self.config.key),
            self.config.ip,
        )
        .map_err(|e| format!("Failed to create device: {e:?}"))?;

        let mut receiver = device
            .connect()
            .await
            .map_err(|e| format!("Failed to connect: {e:?}"))?;

        info!("Connected to vacuum {}", self.config.name);

        self.query_status(&mut device).await?;

        let mut heartbeat_interval = tokio::time::interval(Duration::from_secs(10));
        let mut poll_timer = tokio::time::interval(poll_interval);
        poll_timer.tick().await;

        loop {
            tokio::select! {
                _ = heartbeat_interval.tick() => {
                    device.heartbeat().await
                        .map_err(|e| format!("Heartbeat failed: {e:?}"))?;
                }
                _ = poll_timer.tick() => {
                    self.query_status(&mut device).await?;
                }
                msg = receiver.recv() => {
                    match msg {
                        Some(Ok(messages)) => {
                            for m in messages {
                                if m.command == Some(CommandType::HeartBeat) {
                                    continue;
                                }
                                self.forward_state(&m, state_tx).await;
                            }
                        }
                        Some(Err(e)) => {
                            return Err(format!("Device error: {e:?}"));
                        }
                        None => {
                            return Err("Device channel closed".into());
                        }
                    }
                }
                Some(cmd) = cmd_rx.recv() => {
                    info!("Sending to {}: {}", self.config.name, cmd.dps);
                    if let Err(e) = device.set_values(cmd.dps.clone()).await {
                        warn!("Failed to send command to {}: {:?}", self.config.name, e);
                    }
                }
            }
        }
    }

    async fn query_status(&self, device: &mut TuyaDevice) -> Result<(), String> {
        let payload = Payload::Struct(PayloadStruct {
            dev_id: self.config.id.clone(),
            gw_id: Some(self.config.id.clone()),
            uid: None,
            t: None,
            dp_id: None,
            dps: Some(json!({})),
        });

        device
            .get(payload)
            .await
            .map_err(|e| format!("DPS query failed: {e:?}"))
    }

    async fn forward_state(&self, msg: &Message, state_tx: &mpsc::Sender<StateUpdate>) {
        let Some(dps) = extract_dps(&msg.payload) else {
            debug!("No dps in message, skipping");
            return;
        };
        let Some(dps_map) = dps.as_object() else {
            debug!("dps is not a JSON object: {}", dps);
            return;
        };

        for (field, value) in decode_dps(&self.config.robovac, dps_map) {
            debug!("{} {} = {}", self.config.name, field, value);
            let update = StateUpdate {
                topic_name: self.config.topic_name.clone(),
                field,
                value,
            };
            if state_tx.send(update).await.is_err() {
                warn!("State update channel closed");
                return;
            }
        }
    }
}

/// Pull the dps object out of whichever payload variant the library returns.
/// Query responses sometimes arrive as `Payload::String` holding
/// `{"dps":{...}}` rather than `Payload::Struct`.
fn extract_dps(payload: &Payload) -> Option<Value> {
    match payload {
        Payload::Struct(ps) => ps.dps.clone(),
        Payload::String(s) => serde_json::from_str::<Value>(s)
            .ok()
            .and_then(|v| v.get("dps").cloned()),
        Payload::Raw(b) => {
            debug!("Payload::Raw ({} bytes), skipping", b.len());
            None
        }
        _ => None,
    }
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Translate raw DPS values into named state fields using the model table.
pub fn decode_dps(robovac: &RoboVac, dps: &Map<String, Value>) -> Vec<(String, String)> {
    let mut updates: Vec<(String, String)> = Vec::new();

    for (dp_id, value) in dps {
        let raw = value_to_string(value);
        let Some(kind) = robovac.command_for_dp(dp_id) else {
            updates.push((format!("dps_{dp_id}"), raw));
            continue;
        };

        match kind {
            RobovacCommand::Status => {
                let status = robovac.human_readable_value(kind, &raw);
                match robovac.activity(status) {
                    Some(activity) => updates.push(("activity".into(), activity.to_string())),
                    None => debug!("Status '{}' has no activity mapping", status),
                }
                updates.push(("status".into(), status.to_string()));
            }
            RobovacCommand::Mode => {
                updates.push(("mode".into(), robovac.human_readable_value(kind, &raw).into()));
            }
            RobovacCommand::FanSpeed => {
                updates.push(("fan_speed".into(), robovac.label_for_value(kind, &raw).into()));
            }
            RobovacCommand::Battery => updates.push(("battery_level".into(), raw)),
            RobovacCommand::Locate => updates.push(("locate".into(), raw)),
            other => {
                let name = other.dps_name().to_ascii_lowercase();
                updates.push((name, robovac.human_readable_value(kind, &raw).into()));
            }
        }
    }

    updates
}

/// Build a DPS write for an MQTT command action on `robovac`.
pub fn build_command(robovac: &RoboVac, action: &str, payload: &str) -> Option<DpCommand> {
    let (feature, kind, label) = match action {
        "start" => (VacuumEntityFeature::START, RobovacCommand::Mode, "auto"),
        "pause" => (VacuumEntityFeature::PAUSE, RobovacCommand::StartPause, "pause"),
        "stop" => (VacuumEntityFeature::STOP, RobovacCommand::Mode, "stop"),
        "return_to_base" => (
            VacuumEntityFeature::RETURN_HOME,
            RobovacCommand::ReturnHome,
            "return",
        ),
        "locate" => (VacuumEntityFeature::LOCATE, RobovacCommand::Locate, "locate"),
        "set_fan_speed" => (VacuumEntityFeature::FAN_SPEED, RobovacCommand::FanSpeed, payload),
        "send_command" => (VacuumEntityFeature::SEND_COMMAND, RobovacCommand::Mode, payload),
        _ => {
            warn!("Unknown vacuum action: {}", action);
            return None;
        }
    };

    if !robovac.homeassistant_features().contains(feature) {
        warn!(
            "{} does not support '{}'",
            robovac.model_details().model,
            action
        );
        return None;
    }
    let Some(code) = robovac.command_code(kind) else {
        warn!(
            "{} has no DPS code for {}",
            robovac.model_details().model,
            kind
        );
        return None;
    };
    if label.is_empty() {
        warn!("Action '{}' needs a payload", action);
        return None;
    }

    let value = match robovac.command_value(kind, label) {
        "true" => json!(true),
        "false" => json!(false),
        token => json!(token),
    };

    let mut dps = Map::new();
    dps.insert(code.to_string(), value);

    Some(DpCommand {
        dps: Value::Object(dps),
    })
}
