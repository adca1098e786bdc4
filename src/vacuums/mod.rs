//! Per-model descriptor tables for Eufy RoboVac devices.
//!
//! Each supported model exposes a [`RobovacModelDetails`] constant describing
//! which DPS code carries each [`RobovacCommand`], how human-readable values
//! are encoded on the wire, and how status strings project onto a coarse
//! [`VacuumActivity`].

mod features;
pub mod t2278;

pub use features::{RoboVacEntityFeature, VacuumEntityFeature};

/// Command kinds shared by all models. Not every model supplies every kind.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter, strum::IntoStaticStr,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum RobovacCommand {
    StartPause,
    Direction,
    Mode,
    Status,
    ReturnHome,
    FanSpeed,
    Locate,
    #[strum(serialize = "BATTERY_LEVEL")]
    Battery,
    Error,
    CleaningArea,
    CleaningTime,
    AutoReturn,
    DoNotDisturb,
    BoostIq,
    Consumables,
}

impl RobovacCommand {
    /// Name under which this command's DPS code is published.
    pub fn dps_name(self) -> &'static str {
        self.into()
    }
}

/// DPS code and optional value dictionary for a single command kind.
#[derive(Debug, Clone, Copy)]
pub struct CommandSpec {
    pub code: u16,
    pub values: Option<&'static [(&'static str, &'static str)]>,
}

impl CommandSpec {
    pub fn lookup(&self, key: &str) -> Option<&'static str> {
        self.values?
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| *v)
    }

    /// Reverse lookup: the first key whose value is `value`.
    pub fn key_for(&self, value: &str) -> Option<&'static str> {
        self.values?
            .iter()
            .find(|(_, v)| *v == value)
            .map(|(k, _)| *k)
    }
}

/// Coarse lifecycle state presented to the end-user layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum VacuumActivity {
    Cleaning,
    Docked,
    Paused,
    Returning,
    Idle,
}

#[derive(Debug)]
pub struct RobovacModelDetails {
    pub model: &'static str,
    pub name: &'static str,
    pub homeassistant_features: VacuumEntityFeature,
    pub robovac_features: RoboVacEntityFeature,
    pub commands: &'static [(RobovacCommand, CommandSpec)],
    pub activity_mapping: &'static [(&'static str, VacuumActivity)],
}

impl RobovacModelDetails {
    pub fn command(&self, kind: RobovacCommand) -> Option<&CommandSpec> {
        self.commands
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, spec)| spec)
    }

    pub fn activity(&self, status: &str) -> Option<VacuumActivity> {
        self.activity_mapping
            .iter()
            .find(|(s, _)| *s == status)
            .map(|(_, a)| *a)
    }
}

pub static ROBOVAC_MODELS: &[&RobovacModelDetails] = &[&t2278::T2278];

/// Resolve a descriptor by model code. Only the first five characters are
/// significant, so regional suffixes ("T2278-EU") resolve to the base model.
pub fn model_details(model_code: &str) -> Option<&'static RobovacModelDetails> {
    let prefix = model_code.get(..5)?;
    ROBOVAC_MODELS
        .iter()
        .copied()
        .find(|m| m.model.eq_ignore_ascii_case(prefix))
}
