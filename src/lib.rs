//! # DualShock Bridge Library
//!
//! Drive an emulated PlayStation DualShock controller port from a modern
//! XInput-style gamepad.
//!
//! This library provides the DualShock serial protocol engine a console
//! emulator calls once per bus byte, together with the configuration,
//! input backend interface and host utilities around it.

pub mod config;
pub mod error;
pub mod input;
pub mod keep_awake;
pub mod pad;
