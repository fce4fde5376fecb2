//! # Input Backend Module
//!
//! Narrow interface between the DualShock protocol engine and the physical
//! gamepad layer (XInput polling, rumble, LED).
//!
//! This module handles:
//! - The [`InputBackend`] collaborator trait the engine calls into
//! - The [`PadPoll`] snapshot returned by a poll
//! - Per-device analog button edge detection ([`ToggleLatch`])
//! - A virtual [`IdleBackend`] that is always connected and at rest

use tracing::trace;

use crate::pad::protocol::{BUTTONS_RELEASED, STICK_CENTERED};

/// One live input reading, already in PlayStation wire layout
///
/// Button masks are active-low. Sticks pack X in the low byte and Y in the
/// high byte. `triggers` packs right pressure low and left pressure high.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PadPoll {
    /// Full button mask (analog modes, includes L3/R3)
    pub buttons: u16,
    /// Button mask reported in digital mode
    pub buttons_digital: u16,
    /// Left stick
    pub stick_left: u16,
    /// Right stick
    pub stick_right: u16,
    /// Trigger pressures
    pub triggers: u16,
}

impl Default for PadPoll {
    fn default() -> Self {
        Self {
            buttons: BUTTONS_RELEASED,
            buttons_digital: BUTTONS_RELEASED,
            stick_left: STICK_CENTERED,
            stick_right: STICK_CENTERED,
            triggers: 0,
        }
    }
}

impl PadPoll {
    pub fn trigger_right(&self) -> u8 {
        (self.triggers & 0xFF) as u8
    }

    pub fn trigger_left(&self) -> u8 {
        (self.triggers >> 8) as u8
    }
}

/// Services the protocol engine needs from the physical input layer
///
/// `host_port` is the gamepad slot on the host (XInput 0-3); `port` is the
/// emulated controller slot the console sees.
#[cfg_attr(test, mockall::automock)]
pub trait InputBackend {
    /// Whether a physical pad is present on `host_port`
    fn refresh_plugged(&mut self, host_port: u8) -> bool;

    /// Read the pad; `None` means it disappeared since the last refresh
    fn poll(&mut self, host_port: u8, plugged: bool, digital_only: bool) -> Option<PadPoll>;

    /// Drive the rumble motors (best effort)
    fn rumble(&mut self, small: u8, large: u8, host_port: u8, plugged: bool);

    /// Update the analog/attached indicator for an emulated port
    fn set_mode_indicator(&mut self, port: u8, lit: bool);

    /// Current state of the analog mode button
    fn analog_toggle_pressed(&mut self, host_port: u8) -> bool;
}

impl<B: InputBackend + ?Sized> InputBackend for Box<B> {
    fn refresh_plugged(&mut self, host_port: u8) -> bool {
        (**self).refresh_plugged(host_port)
    }

    fn poll(&mut self, host_port: u8, plugged: bool, digital_only: bool) -> Option<PadPoll> {
        (**self).poll(host_port, plugged, digital_only)
    }

    fn rumble(&mut self, small: u8, large: u8, host_port: u8, plugged: bool) {
        (**self).rumble(small, large, host_port, plugged)
    }

    fn set_mode_indicator(&mut self, port: u8, lit: bool) {
        (**self).set_mode_indicator(port, lit)
    }

    fn analog_toggle_pressed(&mut self, host_port: u8) -> bool {
        (**self).analog_toggle_pressed(host_port)
    }
}

/// Rising-edge detector for the analog mode button
///
/// Each device owns one, so emulated ports never share press state. Works for
/// backends reporting the button level as well as one-frame pulses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ToggleLatch {
    held: bool,
}

impl ToggleLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the current button state; returns `true` on a press edge
    pub fn update(&mut self, pressed: bool) -> bool {
        let edge = pressed && !self.held;
        self.held = pressed;
        edge
    }

    pub fn is_held(&self) -> bool {
        self.held
    }

    pub fn release(&mut self) {
        self.held = false;
    }
}

/// Virtual pad: always connected, no buttons pressed, sticks centred
///
/// Used by the bench binary and as a stand-in when no physical backend is
/// wired up.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdleBackend;

impl InputBackend for IdleBackend {
    fn refresh_plugged(&mut self, _host_port: u8) -> bool {
        true
    }

    fn poll(&mut self, _host_port: u8, _plugged: bool, _digital_only: bool) -> Option<PadPoll> {
        Some(PadPoll::default())
    }

    fn rumble(&mut self, small: u8, large: u8, host_port: u8, _plugged: bool) {
        trace!("[{}] rumble small={:#04x} large={:#04x}", host_port, small, large);
    }

    fn set_mode_indicator(&mut self, _port: u8, _lit: bool) {}

    fn analog_toggle_pressed(&mut self, _host_port: u8) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_poll_is_at_rest() {
        let poll = PadPoll::default();
        assert_eq!(poll.buttons, 0xFFFF);
        assert_eq!(poll.buttons_digital, 0xFFFF);
        assert_eq!(poll.stick_left, 0x7F7F);
        assert_eq!(poll.stick_right, 0x7F7F);
        assert_eq!(poll.triggers, 0);
    }

    #[test]
    fn test_trigger_split() {
        let poll = PadPoll { triggers: 0xA05F, ..PadPoll::default() };
        assert_eq!(poll.trigger_right(), 0x5F);
        assert_eq!(poll.trigger_left(), 0xA0);
    }

    #[test]
    fn test_latch_fires_once_per_press() {
        let mut latch = ToggleLatch::new();
        assert!(latch.update(true), "first press should fire");
        assert!(!latch.update(true), "holding should not fire again");
        assert!(latch.is_held());
        assert!(!latch.update(false));
        assert!(latch.update(true), "second press should fire");
    }

    #[test]
    fn test_latch_handles_pulses() {
        let mut latch = ToggleLatch::new();
        let fired: Vec<bool> = [true, false, false, true, false]
            .into_iter()
            .map(|pressed| latch.update(pressed))
            .collect();
        assert_eq!(fired, vec![true, false, false, true, false]);
    }

    #[test]
    fn test_latch_release() {
        let mut latch = ToggleLatch::new();
        latch.update(true);
        latch.release();
        assert!(latch.update(true));
    }

    #[test]
    fn test_idle_backend() {
        let mut backend = IdleBackend;
        assert!(backend.refresh_plugged(3));
        assert_eq!(backend.poll(0, true, false), Some(PadPoll::default()));
        assert!(!backend.analog_toggle_pressed(0));
    }

    #[test]
    fn test_boxed_backend_forwards() {
        let mut mock = MockInputBackend::new();
        mock.expect_refresh_plugged()
            .withf(|port| *port == 2)
            .times(1)
            .return_const(true);

        let mut boxed: Box<dyn InputBackend> = Box::new(mock);
        assert!(boxed.refresh_plugged(2));
    }
}
