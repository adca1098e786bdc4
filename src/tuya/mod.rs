pub mod client;

/// A decoded state change from a vacuum, ready to publish to MQTT.
#[derive(Debug, Clone, PartialEq)]
pub struct StateUpdate {
    pub topic_name: String,
    pub field: String,
    pub value: String,
}

/// A DPS write to send to the vacuum (dp_id → JSON value).
#[derive(Debug, Clone)]
pub struct DpCommand {
    pub dps: serde_json::Value,
}
