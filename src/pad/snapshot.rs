//! # Save-State Snapshot
//!
//! Mutable DualShock protocol state as stored in an emulator save-state.

use serde::{Deserialize, Serialize};

use crate::error::Result;

use super::protocol::{MotorSlot, PadMode, BUTTONS_RELEASED, STICK_CENTERED};

/// Field-by-field copy of a DualShock's protocol state
///
/// Field order is the serialised order and must stay stable within a release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSnapshot {
    pub buttons: u16,
    pub buttons_digital: u16,
    pub analog_left: u16,
    pub analog_right: u16,
    pub mode: PadMode,
    pub config_active: bool,
    pub mode_locked: bool,
    pub motor_small: MotorSlot,
    pub motor_large: MotorSlot,
    pub trigger_left: u8,
    pub trigger_right: u8,
}

impl Default for DeviceSnapshot {
    fn default() -> Self {
        Self {
            buttons: BUTTONS_RELEASED,
            buttons_digital: BUTTONS_RELEASED,
            analog_left: STICK_CENTERED,
            analog_right: STICK_CENTERED,
            mode: PadMode::Digital,
            config_active: false,
            mode_locked: false,
            motor_small: MotorSlot::Unmapped,
            motor_large: MotorSlot::Unmapped,
            trigger_left: 0,
            trigger_right: 0,
        }
    }
}

impl DeviceSnapshot {
    /// Encode for an external save-state container
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode a snapshot written by [`DeviceSnapshot::to_json`]
    ///
    /// # Errors
    ///
    /// Returns `Snapshot` if the text is not a valid snapshot
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DualShockBridgeError;

    #[test]
    fn test_default_matches_reset_values() {
        let snapshot = DeviceSnapshot::default();
        assert_eq!(snapshot.buttons, 0xFFFF);
        assert_eq!(snapshot.analog_left, 0x7F7F);
        assert_eq!(snapshot.motor_small, MotorSlot::Unmapped);
        assert!(!snapshot.config_active);
    }

    #[test]
    fn test_json_preserves_every_field() {
        let snapshot = DeviceSnapshot {
            buttons: 0xFFBF,
            buttons_digital: 0xFFF7,
            analog_left: 0x10F0,
            analog_right: 0x8000,
            mode: PadMode::AnalogGreen,
            config_active: true,
            mode_locked: true,
            motor_small: MotorSlot::Offset(0),
            motor_large: MotorSlot::Offset(5),
            trigger_left: 0x40,
            trigger_right: 0xC0,
        };

        let text = snapshot.to_json().unwrap();
        assert_eq!(DeviceSnapshot::from_json(&text).unwrap(), snapshot);
    }

    #[test]
    fn test_field_order_is_stable() {
        let text = DeviceSnapshot::default().to_json().unwrap();
        let buttons = text.find("\"buttons\"").unwrap();
        let mode = text.find("\"mode\"").unwrap();
        let trigger_right = text.find("\"trigger_right\"").unwrap();
        assert!(buttons < mode && mode < trigger_right);
    }

    #[test]
    fn test_invalid_snapshot_rejected() {
        match DeviceSnapshot::from_json("{\"buttons\": 1}") {
            Err(DualShockBridgeError::Snapshot(_)) => {}
            other => panic!("Expected Snapshot error, got: {:?}", other),
        }
    }
}
