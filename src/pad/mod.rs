//! # Pad Module
//!
//! Emulated PlayStation controller port devices.
//!
//! This module handles:
//! - Port device base state (settings, plug detection, frame buffers)
//! - DualShock command/response emulation, including config mode
//! - Analog/digital mode switching and rumble motor mapping
//! - Save-state snapshots of the protocol state

pub mod protocol;
pub mod device;
pub mod dualshock;
pub mod snapshot;

pub use device::{PadDevice, PlayStationDevice};
pub use dualshock::DualShock;
pub use snapshot::DeviceSnapshot;
