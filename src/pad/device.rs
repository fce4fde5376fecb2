//! # PlayStation Device Base
//!
//! Shared state for anything plugged into an emulated controller port: the
//! port settings, plug detection and the raw frame buffers.

use tracing::debug;

use crate::config::PortSettings;
use crate::error::{DualShockBridgeError, Result};
use crate::input::InputBackend;

use super::snapshot::DeviceSnapshot;

/// Host-facing contract of an emulated controller port device
pub trait PlayStationDevice {
    /// Exchange one byte of the current frame
    ///
    /// `counter` is the 0-based position within the frame, `data` the byte the
    /// console sends. Returns the byte the pad shifts back.
    fn command(&mut self, counter: u32, data: u8) -> u8;

    /// Reinitialise all protocol state
    fn reset(&mut self);

    /// Copy the mutable protocol state out
    fn save_state(&self) -> DeviceSnapshot;

    /// Restore protocol state from a snapshot
    fn load_state(&mut self, state: &DeviceSnapshot);

    /// Whether a physical pad was detected
    fn is_plugged(&self) -> bool;

    /// Assign the emulated controller slot
    fn set_port(&mut self, port: u8);

    /// Run a whole frame, one `command` call per byte
    fn transfer(&mut self, frame: &[u8]) -> Vec<u8> {
        frame
            .iter()
            .enumerate()
            .map(|(counter, &data)| self.command(counter as u32, data))
            .collect()
    }
}

/// Port settings, plug state and frame buffers
#[derive(Debug, Clone)]
pub struct PadDevice {
    settings: PortSettings,
    command: Box<[u8]>,
    response: Box<[u8]>,
    plugged: bool,
    port: u8,
}

impl PadDevice {
    /// Create a device with `buffer_size` bytes per frame buffer
    ///
    /// # Errors
    ///
    /// Returns `BufferSize` if `buffer_size` is zero
    pub fn new(settings: PortSettings, buffer_size: usize) -> Result<Self> {
        if buffer_size == 0 {
            return Err(DualShockBridgeError::BufferSize { size: buffer_size, minimum: 1 });
        }

        Ok(Self {
            settings,
            command: vec![0u8; buffer_size].into_boxed_slice(),
            response: vec![0u8; buffer_size].into_boxed_slice(),
            plugged: false,
            port: 0,
        })
    }

    /// Re-query the backend for a physical pad on the configured host port
    pub fn recheck<B: InputBackend + ?Sized>(&mut self, backend: &mut B) {
        self.plugged = backend.refresh_plugged(self.settings.host_port);
    }

    pub fn settings(&self) -> &PortSettings {
        &self.settings
    }

    pub fn host_port(&self) -> u8 {
        self.settings.host_port
    }

    pub fn port(&self) -> u8 {
        self.port
    }

    pub fn set_port(&mut self, port: u8) {
        self.port = port;
        debug!("[{}] -> host port [{}]", port, self.settings.host_port);
    }

    pub fn is_plugged(&self) -> bool {
        self.plugged
    }

    pub fn set_plugged(&mut self, plugged: bool) {
        self.plugged = plugged;
    }

    pub fn buffer_len(&self) -> usize {
        self.command.len()
    }

    /// Map a frame counter to a buffer index
    ///
    /// # Errors
    ///
    /// Returns `Protocol` if the counter runs past the buffers
    pub fn index(&self, counter: u32) -> Result<usize> {
        let index = counter as usize;
        if index >= self.buffer_len() {
            return Err(DualShockBridgeError::Protocol(format!(
                "out of bound buffer [{:02}:{:02}]",
                self.buffer_len(),
                counter
            )));
        }
        Ok(index)
    }

    pub fn command_buffer(&self) -> &[u8] {
        &self.command
    }

    pub fn command_buffer_mut(&mut self) -> &mut [u8] {
        &mut self.command
    }

    pub fn response_buffer(&self) -> &[u8] {
        &self.response
    }

    pub fn response_buffer_mut(&mut self) -> &mut [u8] {
        &mut self.response
    }
}
