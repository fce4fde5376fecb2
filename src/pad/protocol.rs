//! # DualShock Protocol Constants and Types
//!
//! Core definitions for the PlayStation controller bus as spoken by a
//! DualShock-class pad.
//!
//! ## Frame Layout
//!
//! | Byte | Console sends | Pad replies |
//! |------|---------------|-------------|
//! | 0 | 0x01 (address) | filler |
//! | 1 | opcode | mode ID (0x41, 0x73, 0x53, 0xF3) |
//! | 2 | 0x00 | 0x5A header |
//! | 3-8 | opcode arguments | opcode payload |

use serde::{Deserialize, Serialize};

/// Number of bytes in a full DualShock frame
pub const FRAME_LEN: usize = 9;

/// Default device buffer capacity (one full frame)
pub const DEFAULT_BUFFER_SIZE: usize = FRAME_LEN;

/// Header byte always sent at frame offset 2
pub const HEADER_BYTE: u8 = 0x5A;

/// Reply returned for out-of-range counters
pub const FILLER_BYTE: u8 = 0x00;

/// Reply for the first probe after the pad went away
pub const BUSY_BYTE: u8 = 0x00;

/// Reply while the pad stays unplugged
pub const NOT_READY_BYTE: u8 = 0xFF;

/// First payload offset within a frame
pub const PAYLOAD_START: usize = 3;

/// Payload length following the header
pub const PAYLOAD_LEN: usize = FRAME_LEN - PAYLOAD_START;

/// Frame byte value tagging the small motor in a 0x4D mapping frame
pub const MOTOR_SMALL_TAG: u8 = 0x00;

/// Frame byte value tagging the large motor in a 0x4D mapping frame
pub const MOTOR_LARGE_TAG: u8 = 0x01;

/// Wire value of an unmapped motor slot
pub const MOTOR_UNMAPPED: u8 = 0xFF;

/// All buttons released (active-low mask)
pub const BUTTONS_RELEASED: u16 = 0xFFFF;

/// Both stick axes centred (X in the low byte, Y in the high byte)
pub const STICK_CENTERED: u16 = 0x7F7F;

/// Model identity returned by 0x45 (DualShock 2 layout)
pub const DUALSHOCK2_MODEL: [u8; PAYLOAD_LEN] = [0x03, 0x02, 0x00, 0x02, 0x01, 0x00];

/// Frame index of the LED (digital/analog) byte inside the 0x45 reply
pub const MODEL_LED_INDEX: usize = 5;

/// Constant tables written at reply offsets 4-8 by 0x46, 0x47 and 0x4C
pub const DUALSHOCK2_ID: [[u8; 5]; 5] = [
    [0x00, 0x01, 0x02, 0x00, 0x0A], // 0x46, argument 0x00
    [0x00, 0x01, 0x01, 0x01, 0x14], // 0x46, argument 0x01
    [0x00, 0x02, 0x00, 0x01, 0x00], // 0x47
    [0x00, 0x00, 0x04, 0x00, 0x00], // 0x4C, argument 0x00
    [0x00, 0x00, 0x07, 0x00, 0x00], // 0x4C, argument 0x01
];

/// Controller reporting mode, encoded on the wire by its ID byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PadMode {
    /// Digital pad (LED off)
    #[default]
    Digital,
    /// Analog pad, red LED
    AnalogRed,
    /// Analog pad, green LED (flight stick layout)
    AnalogGreen,
    /// Configuration sub-protocol
    Config,
}

impl PadMode {
    /// Wire ID byte reported at frame offset 1
    pub fn id(self) -> u8 {
        match self {
            PadMode::Digital => 0x41,
            PadMode::AnalogRed => 0x73,
            PadMode::AnalogGreen => 0x53,
            PadMode::Config => 0xF3,
        }
    }

    /// Decode a wire ID byte
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            0x41 => Some(PadMode::Digital),
            0x73 => Some(PadMode::AnalogRed),
            0x53 => Some(PadMode::AnalogGreen),
            0xF3 => Some(PadMode::Config),
            _ => None,
        }
    }

    /// Analog variant selected by the colour preference
    pub fn analog(green: bool) -> Self {
        if green {
            PadMode::AnalogGreen
        } else {
            PadMode::AnalogRed
        }
    }

    pub fn is_digital(self) -> bool {
        self == PadMode::Digital
    }
}

/// Sub-command opcodes carried in frame byte 1
///
/// Opcodes 0x40, 0x41, 0x48-0x4B, 0x4E and 0x4F are reserved and decode to
/// `None`; the pad ignores them at every stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// 0x42: poll buttons and sticks, drive rumble
    ReadData,
    /// 0x43: enter or leave config mode
    ConfigMode,
    /// 0x44: force digital/analog and lock the mode button
    SetModeAndLock,
    /// 0x45: model identity and LED state
    QueryModel,
    /// 0x46: constant table A (two variants)
    ConstantA,
    /// 0x47: constant table B
    ConstantB,
    /// 0x4C: constant table C (two variants)
    ConstantC,
    /// 0x4D: report or remap rumble motor bytes
    VibrationMap,
}

impl Command {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x42 => Some(Command::ReadData),
            0x43 => Some(Command::ConfigMode),
            0x44 => Some(Command::SetModeAndLock),
            0x45 => Some(Command::QueryModel),
            0x46 => Some(Command::ConstantA),
            0x47 => Some(Command::ConstantB),
            0x4C => Some(Command::ConstantC),
            0x4D => Some(Command::VibrationMap),
            _ => None,
        }
    }

    pub fn opcode(self) -> u8 {
        match self {
            Command::ReadData => 0x42,
            Command::ConfigMode => 0x43,
            Command::SetModeAndLock => 0x44,
            Command::QueryModel => 0x45,
            Command::ConstantA => 0x46,
            Command::ConstantB => 0x47,
            Command::ConstantC => 0x4C,
            Command::VibrationMap => 0x4D,
        }
    }
}

/// Position-keyed stage of a frame
///
/// The console repeats the opcode's effect at fixed offsets, so dispatch is by
/// byte position first and opcode second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStage {
    /// Byte 0: analog button and mode indicator
    Mode,
    /// Byte 1: ID byte and reply setup
    Setup,
    /// Byte 2: header
    Header,
    /// Byte 4: mode and config changes
    Execute,
    /// Byte 8: vibration and mapping
    Finish,
    /// Any other byte: echo the prepared reply
    Data,
}

impl FrameStage {
    pub fn at(counter: usize) -> Self {
        match counter {
            0 => FrameStage::Mode,
            1 => FrameStage::Setup,
            2 => FrameStage::Header,
            4 => FrameStage::Execute,
            8 => FrameStage::Finish,
            _ => FrameStage::Data,
        }
    }
}

/// Frame offset (relative to byte 3) carrying a rumble motor's intensity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum MotorSlot {
    #[default]
    Unmapped,
    Offset(u8),
}

impl MotorSlot {
    /// Decode the wire byte (0xFF or anything past the payload is unmapped)
    pub fn from_byte(byte: u8) -> Self {
        if (byte as usize) < PAYLOAD_LEN {
            MotorSlot::Offset(byte)
        } else {
            MotorSlot::Unmapped
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            MotorSlot::Unmapped => MOTOR_UNMAPPED,
            MotorSlot::Offset(offset) => offset,
        }
    }

    /// Absolute frame index of the intensity byte
    pub fn frame_index(self) -> Option<usize> {
        match self {
            MotorSlot::Unmapped => None,
            MotorSlot::Offset(offset) => Some(PAYLOAD_START + offset as usize),
        }
    }
}
