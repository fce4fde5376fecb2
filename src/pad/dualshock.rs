//! # DualShock Protocol Engine
//!
//! Byte-level emulation of a DualShock pad on the controller bus.
//!
//! The console clocks one byte in and one byte out per call. Work happens at
//! fixed positions of the frame, keyed by the opcode received at byte 1:
//!
//! | Stage | Byte | Work |
//! |-------|------|------|
//! | Mode | 0 | analog button edge, mode indicator |
//! | Setup | 1 | ID byte, reply payload (live input or config data) |
//! | Header | 2 | `0x5A` |
//! | Execute | 4 | config enter/exit, mode and lock, constant tables |
//! | Finish | 8 | rumble, motor byte mapping |
//!
//! ## Example
//!
//! ```
//! use dualshock_bridge::config::PortSettings;
//! use dualshock_bridge::input::IdleBackend;
//! use dualshock_bridge::pad::{DualShock, PlayStationDevice};
//!
//! let mut pad = DualShock::new(PortSettings::default(), 9, IdleBackend)?;
//! let reply = pad.transfer(&[0x01, 0x42, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]);
//! assert_eq!(&reply[1..3], &[0x73, 0x5A]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use tracing::{debug, info, trace, warn};

use crate::config::PortSettings;
use crate::error::{DualShockBridgeError, Result};
use crate::input::{InputBackend, ToggleLatch};

use super::device::{PadDevice, PlayStationDevice};
use super::protocol::{
    Command, FrameStage, MotorSlot, PadMode, BUSY_BYTE, BUTTONS_RELEASED, DUALSHOCK2_ID,
    DUALSHOCK2_MODEL, FILLER_BYTE, FRAME_LEN, HEADER_BYTE, MODEL_LED_INDEX, MOTOR_LARGE_TAG,
    MOTOR_SMALL_TAG, NOT_READY_BYTE, PAYLOAD_START, STICK_CENTERED,
};
use super::snapshot::DeviceSnapshot;

/// Emulated DualShock on one controller port
pub struct DualShock<B: InputBackend> {
    device: PadDevice,
    backend: B,

    mode: PadMode,
    default_mode: PadMode,
    config_active: bool,
    mode_locked: bool,

    buttons: u16,
    buttons_digital: u16,
    analog_left: u16,
    analog_right: u16,
    trigger_left: u8,
    trigger_right: u8,

    motor_small: MotorSlot,
    motor_large: MotorSlot,

    toggle: ToggleLatch,
    // Busy byte already sent for the current unplugged stretch
    busy_sent: bool,
    // Plug detected this frame, indicator not yet signalled
    attached: bool,
}

impl<B: InputBackend> std::fmt::Debug for DualShock<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DualShock")
            .field("port", &self.device.port())
            .field("host_port", &self.device.host_port())
            .field("plugged", &self.device.is_plugged())
            .field("mode", &self.mode)
            .field("config_active", &self.config_active)
            .field("mode_locked", &self.mode_locked)
            .finish_non_exhaustive()
    }
}

impl<B: InputBackend> DualShock<B> {
    /// Create a pad for one port and put it in its reset state
    ///
    /// # Arguments
    ///
    /// * `settings` - Port settings (host slot, default mode, analog colour)
    /// * `buffer_size` - Frame buffer capacity, at least one full frame
    /// * `backend` - Physical input layer
    ///
    /// # Errors
    ///
    /// Returns `BufferSize` if `buffer_size` is smaller than a frame
    pub fn new(settings: PortSettings, buffer_size: usize, backend: B) -> Result<Self> {
        if buffer_size < FRAME_LEN {
            return Err(DualShockBridgeError::BufferSize { size: buffer_size, minimum: FRAME_LEN });
        }

        let device = PadDevice::new(settings, buffer_size)?;
        let default_mode = settings.default_mode();

        let mut pad = Self {
            device,
            backend,
            mode: default_mode,
            default_mode,
            config_active: false,
            mode_locked: false,
            buttons: BUTTONS_RELEASED,
            buttons_digital: BUTTONS_RELEASED,
            analog_left: STICK_CENTERED,
            analog_right: STICK_CENTERED,
            trigger_left: 0,
            trigger_right: 0,
            motor_small: MotorSlot::Unmapped,
            motor_large: MotorSlot::Unmapped,
            toggle: ToggleLatch::new(),
            busy_sent: false,
            attached: false,
        };
        pad.reset();

        debug!("DualShock created on host port [{}]", settings.host_port);
        Ok(pad)
    }

    /// Mode ID reported at byte 1 (config overrides the pad mode)
    pub fn reported_mode(&self) -> PadMode {
        if self.config_active {
            PadMode::Config
        } else {
            self.mode
        }
    }

    pub fn mode(&self) -> PadMode {
        self.mode
    }

    pub fn default_mode(&self) -> PadMode {
        self.default_mode
    }

    pub fn config_active(&self) -> bool {
        self.config_active
    }

    pub fn mode_locked(&self) -> bool {
        self.mode_locked
    }

    /// Current (small, large) motor byte mapping
    pub fn motor_slots(&self) -> (MotorSlot, MotorSlot) {
        (self.motor_small, self.motor_large)
    }

    pub fn device(&self) -> &PadDevice {
        &self.device
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    fn command_byte(&self, index: usize) -> u8 {
        self.device.command_buffer()[index]
    }

    fn opcode(&self) -> Option<Command> {
        Command::from_byte(self.command_byte(1))
    }

    /// Reply while no pad is present: busy once per probe stretch, then not ready
    fn not_ready(&mut self, counter: u32) -> u8 {
        if counter == 0 && !self.busy_sent {
            self.busy_sent = true;
            BUSY_BYTE
        } else {
            NOT_READY_BYTE
        }
    }

    /// Byte 0: analog button handling and mode indicator
    fn mode_stage(&mut self) {
        let port = self.device.port();

        if self.attached {
            self.attached = false;
            self.backend.set_mode_indicator(port, true);
            return;
        }

        if !self.mode_locked {
            let pressed = self.backend.analog_toggle_pressed(self.device.host_port());
            if self.toggle.update(pressed) {
                self.mode = if self.mode.is_digital() {
                    self.device.settings().analog_mode()
                } else {
                    PadMode::Digital
                };
                info!("[{}] Switched to {:?} mode ({:#04x})", port, self.mode, self.mode.id());
            }
        }

        self.backend.set_mode_indicator(port, self.mode.is_digital());
    }

    /// Byte 1: prepare the reply payload
    fn setup_stage(&mut self, command: Command) {
        match command {
            Command::ReadData => {
                if self.config_active {
                    self.fill_payload(0xFF);
                } else {
                    self.read_input();
                }
            }
            Command::ConfigMode => {
                if self.config_active {
                    self.fill_payload(0x00);
                } else {
                    self.read_input();
                }
            }
            Command::SetModeAndLock => self.fill_payload(0x00),
            Command::QueryModel => {
                if self.config_active {
                    let led = if self.mode.is_digital() { 0x00 } else { 0x01 };
                    let response = self.device.response_buffer_mut();
                    response[PAYLOAD_START..FRAME_LEN].copy_from_slice(&DUALSHOCK2_MODEL);
                    response[MODEL_LED_INDEX] = led;
                }
            }
            Command::ConstantA | Command::ConstantB | Command::ConstantC => {
                if self.config_active {
                    self.device.response_buffer_mut()[PAYLOAD_START] = 0x00;
                }
            }
            Command::VibrationMap => {
                if self.config_active {
                    let small = self.motor_small.to_byte();
                    let large = self.motor_large.to_byte();
                    let response = self.device.response_buffer_mut();
                    response[3] = small;
                    response[4] = large;
                    response[5..FRAME_LEN].fill(0xFF);
                }
            }
        }
    }

    /// Byte 4: mode and config changes
    fn execute_stage(&mut self, command: Command) {
        let port = self.device.port();

        match command {
            // Only digital pads rumble this early; motor bytes past 4 are still
            // last frame's values here
            Command::ReadData => {
                if self.mode.is_digital() {
                    self.actuate();
                }
            }
            Command::ConfigMode => {
                let enter = self.command_byte(3) == 0x01;
                if enter != self.config_active {
                    info!("[{}] {} config mode", port, if enter { "Entered" } else { "Left" });
                }
                self.config_active = enter;
            }
            Command::SetModeAndLock => {
                if self.config_active {
                    self.mode = if self.command_byte(3) == 0x01 {
                        PadMode::AnalogRed
                    } else {
                        PadMode::Digital
                    };
                    // Some games send 0x01 here and expect the button to stay live
                    self.mode_locked = self.command_byte(4) == 0x03;
                    info!("[{}] Mode set to {:?} (locked: {})", port, self.mode, self.mode_locked);
                }
            }
            Command::ConstantA => {
                if self.config_active {
                    let table = if self.command_byte(3) == 0x00 { 0 } else { 1 };
                    self.write_table(table);
                }
            }
            Command::ConstantB => {
                if self.config_active {
                    self.write_table(2);
                }
            }
            Command::ConstantC => {
                if self.config_active {
                    let table = if self.command_byte(3) == 0x00 { 3 } else { 4 };
                    self.write_table(table);
                }
            }
            Command::QueryModel | Command::VibrationMap => {}
        }
    }

    /// Byte 8: rumble and motor mapping
    fn finish_stage(&mut self, command: Command) {
        match command {
            Command::ReadData => self.actuate(),
            Command::VibrationMap => self.set_vibration(),
            _ => {}
        }
    }

    fn fill_payload(&mut self, value: u8) {
        self.device.response_buffer_mut()[PAYLOAD_START..FRAME_LEN].fill(value);
    }

    fn write_table(&mut self, table: usize) {
        self.device.response_buffer_mut()[4..FRAME_LEN].copy_from_slice(&DUALSHOCK2_ID[table]);
    }

    /// Poll the backend and lay the reading out at reply offsets 3-8
    fn read_input(&mut self) {
        self.poll();

        let digital = self.mode.is_digital();
        let buttons = if digital { self.buttons_digital } else { self.buttons };
        let (right, left) = (self.analog_right, self.analog_left);

        let response = self.device.response_buffer_mut();
        response[3..5].copy_from_slice(&buttons.to_le_bytes());
        if digital {
            response[5..FRAME_LEN].fill(0xFF);
        } else {
            response[5..7].copy_from_slice(&right.to_le_bytes());
            response[7..FRAME_LEN].copy_from_slice(&left.to_le_bytes());
        }
    }

    fn poll(&mut self) {
        let host_port = self.device.host_port();
        let plugged = self.device.is_plugged();

        match self.backend.poll(host_port, plugged, self.mode.is_digital()) {
            Some(reading) => {
                self.buttons = reading.buttons;
                self.buttons_digital = reading.buttons_digital;
                self.analog_left = reading.stick_left;
                self.analog_right = reading.stick_right;
                self.trigger_right = reading.trigger_right();
                self.trigger_left = reading.trigger_left();
            }
            None => {
                debug!("[{}] Pad lost on host port [{}]", self.device.port(), host_port);
                self.device.set_plugged(false);
                self.buttons = BUTTONS_RELEASED;
                self.buttons_digital = BUTTONS_RELEASED;
                self.analog_left = STICK_CENTERED;
                self.analog_right = STICK_CENTERED;
                self.trigger_left = 0;
                self.trigger_right = 0;
            }
        }
    }

    /// Rebuild the motor mapping from frame bytes 3-8
    fn set_vibration(&mut self) {
        let mut small = MotorSlot::Unmapped;
        let mut large = MotorSlot::Unmapped;

        let args = &self.device.command_buffer()[PAYLOAD_START..FRAME_LEN];
        for (offset, &byte) in args.iter().enumerate() {
            match byte {
                MOTOR_SMALL_TAG => small = MotorSlot::Offset(offset as u8),
                MOTOR_LARGE_TAG => large = MotorSlot::Offset(offset as u8),
                _ => {}
            }
        }

        self.motor_small = small;
        self.motor_large = large;
        debug!("[{}] Motor map small={:?} large={:?}", self.device.port(), small, large);
    }

    fn motor_intensity(&self, slot: MotorSlot) -> u8 {
        slot.frame_index()
            .and_then(|index| self.device.command_buffer().get(index).copied())
            .unwrap_or(0)
    }

    fn actuate(&mut self) {
        let small = self.motor_intensity(self.motor_small);
        let large = self.motor_intensity(self.motor_large);
        let host_port = self.device.host_port();
        let plugged = self.device.is_plugged();
        self.backend.rumble(small, large, host_port, plugged);
    }
}

impl<B: InputBackend> PlayStationDevice for DualShock<B> {
    fn command(&mut self, counter: u32, data: u8) -> u8 {
        if !self.device.is_plugged() {
            if counter == 0 {
                self.device.recheck(&mut self.backend);
                if self.device.is_plugged() {
                    info!("[{}] Pad attached on host port [{}]", self.device.port(), self.device.host_port());
                    self.attached = true;
                }
            }

            if !self.device.is_plugged() {
                return self.not_ready(counter);
            }

            self.mode = self.default_mode;
        }
        self.busy_sent = false;

        let index = match self.device.index(counter) {
            Ok(index) => index,
            Err(e) => {
                warn!("[{}] {}", self.device.port(), e);
                return FILLER_BYTE;
            }
        };

        self.device.command_buffer_mut()[index] = data;

        match FrameStage::at(index) {
            FrameStage::Mode => self.mode_stage(),
            FrameStage::Setup => {
                let id = self.reported_mode().id();
                self.device.response_buffer_mut()[1] = id;
                if let Some(command) = self.opcode() {
                    self.setup_stage(command);
                }
            }
            FrameStage::Header => self.device.response_buffer_mut()[2] = HEADER_BYTE,
            FrameStage::Execute => {
                if let Some(command) = self.opcode() {
                    self.execute_stage(command);
                }
            }
            FrameStage::Finish => {
                if let Some(command) = self.opcode() {
                    self.finish_stage(command);
                }
            }
            FrameStage::Data => {}
        }

        let reply = self.device.response_buffer()[index];
        trace!("[{}] {:02}: {:#04x} -> {:#04x}", self.device.port(), counter, data, reply);
        reply
    }

    fn reset(&mut self) {
        let response = self.device.response_buffer_mut();
        response.fill(0xFF);
        response[2] = HEADER_BYTE;
        self.device.command_buffer_mut().fill(0x00);

        self.default_mode = self.device.settings().default_mode();
        self.mode = self.default_mode;

        self.buttons = BUTTONS_RELEASED;
        self.buttons_digital = BUTTONS_RELEASED;
        self.analog_left = STICK_CENTERED;
        self.analog_right = STICK_CENTERED;
        self.trigger_left = 0;
        self.trigger_right = 0;

        self.motor_small = MotorSlot::Unmapped;
        self.motor_large = MotorSlot::Unmapped;

        self.device.set_plugged(false);
        self.config_active = false;
        self.mode_locked = false;

        self.toggle.release();
        self.busy_sent = false;
        self.attached = false;
    }

    fn save_state(&self) -> DeviceSnapshot {
        DeviceSnapshot {
            buttons: self.buttons,
            buttons_digital: self.buttons_digital,
            analog_left: self.analog_left,
            analog_right: self.analog_right,
            mode: self.mode,
            config_active: self.config_active,
            mode_locked: self.mode_locked,
            motor_small: self.motor_small,
            motor_large: self.motor_large,
            trigger_left: self.trigger_left,
            trigger_right: self.trigger_right,
        }
    }

    fn load_state(&mut self, state: &DeviceSnapshot) {
        self.buttons = state.buttons;
        self.buttons_digital = state.buttons_digital;
        self.analog_left = state.analog_left;
        self.analog_right = state.analog_right;
        self.mode = state.mode;
        self.config_active = state.config_active;
        self.mode_locked = state.mode_locked;
        self.motor_small = state.motor_small;
        self.motor_large = state.motor_large;
        self.trigger_left = state.trigger_left;
        self.trigger_right = state.trigger_right;
    }

    fn is_plugged(&self) -> bool {
        self.device.is_plugged()
    }

    fn set_port(&mut self, port: u8) {
        self.device.set_port(port);
    }
}
