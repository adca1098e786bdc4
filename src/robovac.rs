use std::collections::BTreeMap;

use thiserror::Error;

use crate::vacuums::{
    self, RoboVacEntityFeature, RobovacCommand, RobovacModelDetails, VacuumActivity,
    VacuumEntityFeature,
};

#[derive(Debug, Error)]
pub enum RoboVacError {
    #[error("Model {0} is not supported")]
    ModelNotSupported(String),
}

/// Command and status accessors for one vacuum, backed by its model table.
///
/// Every lookup falls back to returning its input unchanged, so values the
/// table doesn't know about are passed through rather than rejected.
#[derive(Debug, Clone)]
pub struct RoboVac {
    model_code: String,
    details: &'static RobovacModelDetails,
}

impl RoboVac {
    pub fn new(model_code: &str) -> Result<Self, RoboVacError> {
        let details = vacuums::model_details(model_code)
            .ok_or_else(|| RoboVacError::ModelNotSupported(model_code.to_string()))?;
        Ok(Self {
            model_code: model_code.to_string(),
            details,
        })
    }

    pub fn model_code(&self) -> &str {
        &self.model_code
    }

    pub fn model_details(&self) -> &'static RobovacModelDetails {
        self.details
    }

    pub fn homeassistant_features(&self) -> VacuumEntityFeature {
        self.details.homeassistant_features
    }

    pub fn robovac_features(&self) -> RoboVacEntityFeature {
        self.details.robovac_features
    }

    /// DPS code per command name, as the decimal strings Tuya uses for keys.
    pub fn dps_codes(&self) -> BTreeMap<&'static str, String> {
        self.details
            .commands
            .iter()
            .map(|(kind, spec)| (kind.dps_name(), spec.code.to_string()))
            .collect()
    }

    pub fn command_code(&self, kind: RobovacCommand) -> Option<u16> {
        self.details.command(kind).map(|spec| spec.code)
    }

    /// Encode a human-readable value for `kind`.
    pub fn command_value<'a>(&self, kind: RobovacCommand, value: &'a str) -> &'a str {
        self.details
            .command(kind)
            .and_then(|spec| spec.lookup(value))
            .unwrap_or(value)
    }

    /// Decode a value received from the device for `kind`.
    pub fn human_readable_value<'a>(&self, kind: RobovacCommand, value: &'a str) -> &'a str {
        // Encode and decode share one dictionary per command; bidirectional
        // commands list both directions explicitly.
        self.command_value(kind, value)
    }

    /// Map a reported value back to the label that encodes to it, for
    /// one-directional tables such as FAN_SPEED. Falls back to
    /// [`Self::human_readable_value`].
    pub fn label_for_value<'a>(&self, kind: RobovacCommand, value: &'a str) -> &'a str {
        self.details
            .command(kind)
            .and_then(|spec| spec.key_for(value))
            .unwrap_or_else(|| self.human_readable_value(kind, value))
    }

    pub fn activity(&self, status: &str) -> Option<VacuumActivity> {
        self.details.activity(status)
    }

    /// The command kind that owns a DPS id. Where several kinds share a code,
    /// the first declared wins.
    pub fn command_for_dp(&self, dp_id: &str) -> Option<RobovacCommand> {
        let code: u16 = dp_id.parse().ok()?;
        self.details
            .commands
            .iter()
            .find(|(_, spec)| spec.code == code)
            .map(|(kind, _)| *kind)
    }

    pub fn fan_speeds(&self) -> Vec<&'static str> {
        self.details
            .command(RobovacCommand::FanSpeed)
            .and_then(|spec| spec.values)
            .map(|values| values.iter().map(|(label, _)| *label).collect())
            .unwrap_or_default()
    }
}
