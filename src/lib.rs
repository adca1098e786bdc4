//! Local control bridge between Eufy RoboVac vacuums and MQTT.
//!
//! [`vacuums`] holds the per-model DPS tables, [`robovac`] the accessors the
//! rest of the bridge uses to encode commands and decode status.

pub mod config;
pub mod mqtt;
pub mod robovac;
pub mod tuya;
pub mod vacuums;
