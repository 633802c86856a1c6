//! Report structures for Blamcon lightgun devices. Field offsets were
//! confirmed against hidraw captures from P1 revision hardware.
use packed_struct::prelude::*;
use thiserror::Error;

use super::driver::*;

/// Errors decoding a raw input report
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Report too short: expected at least {expected} bytes, got {size}")]
    TooShort { expected: usize, size: usize },
    #[error("Malformed report: {0}")]
    Malformed(#[from] PackingError),
}

/// Raw wire input report. The gun emits one of these per state change with a
/// report id of 1-5 depending on the player slot and report mode.
#[derive(PackedStruct, Debug, Copy, Clone, PartialEq)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "22")]
pub struct PackedInputDataReport {
    // byte 0
    #[packed_field(bytes = "0")]
    pub report_id: u8,

    // byte 1-4, only the low 12 bits carry buttons
    #[packed_field(bytes = "1..=4", endian = "lsb")]
    pub buttons: Integer<u32, packed_bits::Bits<32>>,

    // byte 5, hat switch: 0 neutral, 1/3/5/7 = up/right/down/left
    #[packed_field(bytes = "5")]
    pub hat: u8,

    // byte 6-13, absolute axis pairs in raw device units
    #[packed_field(bytes = "6..=7", endian = "lsb")]
    pub left_stick_x: Integer<i16, packed_bits::Bits<16>>,
    #[packed_field(bytes = "8..=9", endian = "lsb")]
    pub left_stick_y: Integer<i16, packed_bits::Bits<16>>,
    #[packed_field(bytes = "10..=11", endian = "lsb")]
    pub right_stick_x: Integer<i16, packed_bits::Bits<16>>,
    #[packed_field(bytes = "12..=13", endian = "lsb")]
    pub right_stick_y: Integer<i16, packed_bits::Bits<16>>,
    // byte 14-21 reserved
}

impl Default for PackedInputDataReport {
    fn default() -> Self {
        Self {
            report_id: 1,
            buttons: Integer::from_primitive(0),
            hat: 0,
            left_stick_x: Integer::from_primitive(0),
            left_stick_y: Integer::from_primitive(0),
            right_stick_x: Integer::from_primitive(0),
            right_stick_y: Integer::from_primitive(0),
        }
    }
}

/// 2D coordinate in raw device units
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Vector2 {
    pub x: f32,
    pub y: f32,
}

/// Hat switch direction decoded from the 4-bit discrete-button convention
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Direction {
    Up,
    Right,
    Down,
    Left,
    #[default]
    None,
}

impl Direction {
    /// Decode a raw hat byte. Codes outside the known set are neutral.
    pub fn from_hat(hat: u8) -> Self {
        match hat {
            1 => Self::Up,
            3 => Self::Right,
            5 => Self::Down,
            7 => Self::Left,
            _ => Self::None,
        }
    }
}

/// Logical buttons addressed by bit index within [LightgunState] buttons
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LightgunButton {
    West = 0,
    South = 1,
    East = 2,
    North = 3,
    LeftShoulder = 4,
    RightShoulder = 5,
    LeftTrigger = 6,
    RightTrigger = 7,
    Select = 8,
    Start = 9,
    LeftStickPress = 10,
    RightStickPress = 11,
}

/// Canonical decoded lightgun state. This is the device-agnostic record the
/// rest of the input stack consumes; axis values are raw device units and
/// normalization happens downstream in the position remap stage.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LightgunState {
    pub report_id: u8,
    /// Bit-packed button set, bits 0-11
    pub buttons: u32,
    /// Raw hat code, interpreted through [Direction::from_hat]
    pub hat: u8,
    /// Primary aim pointer
    pub position: Vector2,
    /// Secondary pointer/motion channel
    pub secondary_motion: Vector2,
}

impl LightgunState {
    /// The fixed state produced for unrecognized report ids. Button bit 0
    /// doubles as the device-inactive sentinel downstream consumers key on,
    /// so these exact values are part of the wire contract.
    pub fn empty() -> Self {
        Self {
            report_id: 5,
            buttons: 0x01,
            hat: 0,
            position: Vector2::default(),
            secondary_motion: Vector2::default(),
        }
    }

    /// Decode a raw input report buffer of `size` bytes.
    ///
    /// Report ids 1-5 are reinterpreted field by field; any other id decodes
    /// to [LightgunState::empty] so corrupted frames never propagate garbage
    /// coordinates. Buffers shorter than [INPUT_REPORT_SIZE] are refused.
    pub fn decode(buf: &[u8], size: usize) -> Result<Self, ReportError> {
        let size = size.min(buf.len());
        if size < INPUT_REPORT_SIZE {
            return Err(ReportError::TooShort {
                expected: INPUT_REPORT_SIZE,
                size,
            });
        }

        let report_id = buf[0];
        match report_id {
            1..=5 => {
                let buffer: &[u8; INPUT_REPORT_SIZE] = buf[..INPUT_REPORT_SIZE]
                    .try_into()
                    .map_err(|_| ReportError::TooShort {
                        expected: INPUT_REPORT_SIZE,
                        size,
                    })?;
                let report = PackedInputDataReport::unpack(buffer)?;
                Ok(Self::from(&report))
            }
            _ => {
                log::trace!("Unrecognized report id {report_id}, decoding to neutral state");
                Ok(Self::empty())
            }
        }
    }

    /// Set or clear the bit for the given button, builder style.
    pub fn with_button(mut self, button: LightgunButton, pressed: bool) -> Self {
        debug_assert!(
            (button as u32) < 16,
            "button bit index must fit the 16-bit wide mask"
        );
        let bit = 1u32 << (button as u32);
        if pressed {
            self.buttons |= bit;
        } else {
            self.buttons &= !bit;
        }
        self
    }

    pub fn button(&self, button: LightgunButton) -> bool {
        self.buttons & (1u32 << (button as u32)) != 0
    }

    pub fn dpad(&self) -> Direction {
        Direction::from_hat(self.hat)
    }

    /// Serialize into the canonical 22-byte state layout used when a raw
    /// event payload is rewritten in place.
    pub fn pack(&self) -> [u8; CANONICAL_STATE_SIZE] {
        let mut buf = [0u8; CANONICAL_STATE_SIZE];
        buf[0] = self.report_id;
        buf[1..5].copy_from_slice(&self.buttons.to_le_bytes());
        buf[5] = self.hat;
        buf[6..10].copy_from_slice(&self.position.x.to_le_bytes());
        buf[10..14].copy_from_slice(&self.position.y.to_le_bytes());
        buf[14..18].copy_from_slice(&self.secondary_motion.x.to_le_bytes());
        buf[18..22].copy_from_slice(&self.secondary_motion.y.to_le_bytes());
        buf
    }

    /// Deserialize the canonical 22-byte state layout.
    pub fn unpack(buf: &[u8; CANONICAL_STATE_SIZE]) -> Self {
        let read_f32 = |offset: usize| {
            let bytes: [u8; 4] = buf[offset..offset + 4].try_into().unwrap_or([0; 4]);
            f32::from_le_bytes(bytes)
        };
        Self {
            report_id: buf[0],
            buttons: u32::from_le_bytes(buf[1..5].try_into().unwrap_or([0; 4])),
            hat: buf[5],
            position: Vector2 {
                x: read_f32(6),
                y: read_f32(10),
            },
            secondary_motion: Vector2 {
                x: read_f32(14),
                y: read_f32(18),
            },
        }
    }
}

impl Default for LightgunState {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<&PackedInputDataReport> for LightgunState {
    fn from(report: &PackedInputDataReport) -> Self {
        Self {
            report_id: report.report_id,
            buttons: report.buttons.to_primitive(),
            hat: report.hat,
            position: Vector2 {
                x: report.left_stick_x.to_primitive() as f32,
                y: report.left_stick_y.to_primitive() as f32,
            },
            secondary_motion: Vector2 {
                x: report.right_stick_x.to_primitive() as f32,
                y: report.right_stick_y.to_primitive() as f32,
            },
        }
    }
}

/// Normalized RGB color intent. Channels outside [0, 1] encode as the
/// nearest boundary byte.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    fn scale(channel: f32) -> u8 {
        (channel * 255.0).clamp(0.0, 255.0).round() as u8
    }

    pub fn to_rgb8(self) -> (u8, u8, u8) {
        (Self::scale(self.r), Self::scale(self.g), Self::scale(self.b))
    }
}

/// Combined feedback output report. Carries the application-control flags for
/// every feedback feature plus the rumble, LED, and recoil payload fields in
/// a single report. Update flags mark which fields apply this cycle.
#[derive(PackedStruct, Debug, Copy, Clone, PartialEq)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "40")]
pub struct PackedFeedbackReport {
    // byte 0
    #[packed_field(bytes = "0")]
    pub report_id: u8, // Always 16

    // byte 1-6, update flags are 1 when the paired field carries a fresh
    // value; control values are 0 (device autonomous), 2 (forced off),
    // 3 (application controlled)
    #[packed_field(bytes = "1")]
    pub enable_rumble_update: u8,
    #[packed_field(bytes = "2")]
    pub enable_rumble_ffb_control: u8,
    #[packed_field(bytes = "3")]
    pub enable_led_update: u8,
    #[packed_field(bytes = "4")]
    pub enable_led_ffb_control: u8,
    #[packed_field(bytes = "5")]
    pub enable_recoil_update: u8,
    #[packed_field(bytes = "6")]
    pub enable_recoil_ffb_control: u8,

    // byte 7-14 reserved

    // byte 15-19
    #[packed_field(bytes = "15")]
    pub rumble: u8,
    #[packed_field(bytes = "16..=17", endian = "lsb")]
    pub rumble_on_period: Integer<i16, packed_bits::Bits<16>>,
    #[packed_field(bytes = "18..=19", endian = "lsb")]
    pub rumble_off_period: Integer<i16, packed_bits::Bits<16>>,

    // byte 20-28
    #[packed_field(bytes = "20")]
    pub led_red: u8,
    #[packed_field(bytes = "21")]
    pub led_green: u8,
    #[packed_field(bytes = "22")]
    pub led_blue: u8,
    #[packed_field(bytes = "23")]
    pub led_index: u8,
    #[packed_field(bytes = "24")]
    pub led_flash: u8,
    #[packed_field(bytes = "25..=26", endian = "lsb")]
    pub led_flash_off_period: Integer<i16, packed_bits::Bits<16>>,
    #[packed_field(bytes = "27..=28", endian = "lsb")]
    pub led_flash_on_period: Integer<i16, packed_bits::Bits<16>>,

    // byte 29-31
    #[packed_field(bytes = "29")]
    pub recoil: u8,
    #[packed_field(bytes = "30")]
    pub recoil_on_period: u8,
    #[packed_field(bytes = "31")]
    pub recoil_off_period: u8,
    // byte 32-39 reserved
}

impl PackedFeedbackReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a report that takes or releases application control of all
    /// three feedback features at once.
    pub fn with_ffb_control(recoil: bool, rumble: bool, led: bool) -> Self {
        let mut report = Self::new();
        report.set_ffb_control(recoil, rumble, led);
        report
    }

    pub fn set_ffb_control(&mut self, recoil: bool, rumble: bool, led: bool) {
        self.enable_recoil_update = 1;
        self.enable_recoil_ffb_control = if recoil { 3 } else { 2 };
        self.enable_rumble_update = 1;
        self.enable_rumble_ffb_control = if rumble { 3 } else { 2 };
        self.enable_led_update = 1;
        self.enable_led_ffb_control = if led { 3 } else { 2 };
    }

    pub fn set_rumble(&mut self, pulse: i32) {
        self.enable_rumble_update = 1;
        self.rumble = pulse.clamp(0, PULSE_MAX) as u8;
    }

    pub fn set_rumble_periods(&mut self, pulse: i32, on: i32, off: i32) {
        self.set_rumble(pulse);
        self.rumble_on_period =
            Integer::from_primitive(on.clamp(RUMBLE_PERIOD_MIN_MS, RUMBLE_PERIOD_MAX_MS) as i16);
        self.rumble_off_period =
            Integer::from_primitive(off.clamp(RUMBLE_PERIOD_MIN_MS, RUMBLE_PERIOD_MAX_MS) as i16);
    }

    /// Set the LED color fields. The index is written through unclamped on
    /// this path; the standalone LED command clamps it instead.
    pub fn set_color(&mut self, index: i32, color: Color) {
        let (red, green, blue) = color.to_rgb8();
        self.enable_led_update = 1;
        self.led_red = red;
        self.led_green = green;
        self.led_blue = blue;
        self.led_index = index as u8;
    }

    pub fn set_color_flash(&mut self, index: i32, color: Color, flash: i32) {
        self.set_color(index, color);
        self.led_flash = flash.clamp(0, LED_FLASH_MAX) as u8;
    }

    pub fn set_color_flash_periods(
        &mut self,
        index: i32,
        color: Color,
        flash: i32,
        on: i32,
        off: i32,
    ) {
        self.set_color_flash(index, color, flash);
        self.led_flash_on_period = Integer::from_primitive(
            on.clamp(LED_FLASH_PERIOD_MIN_MS, LED_FLASH_PERIOD_MAX_MS) as i16,
        );
        self.led_flash_off_period = Integer::from_primitive(
            off.clamp(LED_FLASH_PERIOD_MIN_MS, LED_FLASH_PERIOD_MAX_MS) as i16,
        );
    }

    pub fn set_recoil(&mut self, pulse: i32) {
        self.enable_recoil_update = 1;
        self.recoil = pulse.clamp(0, PULSE_MAX) as u8;
    }

    pub fn set_recoil_periods(&mut self, pulse: i32, on: i32, off: i32) {
        self.set_recoil(pulse);
        self.recoil_on_period = on.clamp(RECOIL_PERIOD_MIN_MS, RECOIL_PERIOD_MAX_MS) as u8;
        self.recoil_off_period = off.clamp(RECOIL_PERIOD_MIN_MS, RECOIL_PERIOD_MAX_MS) as u8;
    }
}

impl Default for PackedFeedbackReport {
    fn default() -> Self {
        Self {
            report_id: OUTPUT_REPORT_FEEDBACK,
            enable_rumble_update: 0,
            enable_rumble_ffb_control: 0,
            enable_led_update: 0,
            enable_led_ffb_control: 0,
            enable_recoil_update: 0,
            enable_recoil_ffb_control: 0,
            rumble: 0,
            rumble_on_period: Integer::from_primitive(0),
            rumble_off_period: Integer::from_primitive(0),
            led_red: 0,
            led_green: 0,
            led_blue: 0,
            led_index: 0,
            led_flash: 0,
            led_flash_off_period: Integer::from_primitive(0),
            led_flash_on_period: Integer::from_primitive(0),
            recoil: 0,
            recoil_on_period: 0,
            recoil_off_period: 0,
        }
    }
}

/// Standalone rumble command report
#[derive(PackedStruct, Debug, Copy, Clone, PartialEq)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "40")]
pub struct PackedRumbleReport {
    #[packed_field(bytes = "0")]
    pub report_id: u8, // Always 0x21
    #[packed_field(bytes = "1")]
    pub enable_ffb_control: u8,
    #[packed_field(bytes = "2")]
    pub rumble: u8,
    #[packed_field(bytes = "3..=4", endian = "lsb")]
    pub rumble_on_period: Integer<i16, packed_bits::Bits<16>>,
    #[packed_field(bytes = "5..=6", endian = "lsb")]
    pub rumble_off_period: Integer<i16, packed_bits::Bits<16>>,
}

impl PackedRumbleReport {
    pub fn new(pulse: i32) -> Self {
        Self {
            rumble: pulse.clamp(0, PULSE_MAX) as u8,
            ..Self::default()
        }
    }

    pub fn with_periods(pulse: i32, on: i32, off: i32) -> Self {
        Self {
            rumble_on_period: Integer::from_primitive(
                on.clamp(RUMBLE_PERIOD_MIN_MS, RUMBLE_PERIOD_MAX_MS) as i16,
            ),
            rumble_off_period: Integer::from_primitive(
                off.clamp(RUMBLE_PERIOD_MIN_MS, RUMBLE_PERIOD_MAX_MS) as i16,
            ),
            ..Self::new(pulse)
        }
    }

    pub fn set_ffb_control(&mut self, enable: bool) {
        self.enable_ffb_control = if enable { 3 } else { 2 };
    }
}

impl Default for PackedRumbleReport {
    fn default() -> Self {
        Self {
            report_id: OUTPUT_REPORT_RUMBLE,
            enable_ffb_control: 0,
            rumble: 0,
            rumble_on_period: Integer::from_primitive(0),
            rumble_off_period: Integer::from_primitive(0),
        }
    }
}

/// Standalone recoil command report. Unlike rumble, the solenoid cycle
/// periods are single bytes.
#[derive(PackedStruct, Debug, Copy, Clone, PartialEq)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "40")]
pub struct PackedRecoilReport {
    #[packed_field(bytes = "0")]
    pub report_id: u8, // Always 0x20
    #[packed_field(bytes = "1")]
    pub enable_ffb_control: u8,
    #[packed_field(bytes = "2")]
    pub recoil: u8,
    #[packed_field(bytes = "3")]
    pub recoil_on_period: u8,
    #[packed_field(bytes = "4")]
    pub recoil_off_period: u8,
}

impl PackedRecoilReport {
    pub fn new(pulse: i32) -> Self {
        Self {
            recoil: pulse.clamp(0, PULSE_MAX) as u8,
            ..Self::default()
        }
    }

    pub fn with_periods(pulse: i32, on: i32, off: i32) -> Self {
        Self {
            recoil_on_period: on.clamp(RECOIL_PERIOD_MIN_MS, RECOIL_PERIOD_MAX_MS) as u8,
            recoil_off_period: off.clamp(RECOIL_PERIOD_MIN_MS, RECOIL_PERIOD_MAX_MS) as u8,
            ..Self::new(pulse)
        }
    }

    pub fn set_ffb_control(&mut self, enable: bool) {
        self.enable_ffb_control = if enable { 3 } else { 2 };
    }
}

impl Default for PackedRecoilReport {
    fn default() -> Self {
        Self {
            report_id: OUTPUT_REPORT_RECOIL,
            enable_ffb_control: 0,
            recoil: 0,
            recoil_on_period: 0,
            recoil_off_period: 0,
        }
    }
}

/// Standalone LED command report. Clamp bounds on this path differ from the
/// combined feedback report and both sets match the firmware's validation.
#[derive(PackedStruct, Debug, Copy, Clone, PartialEq)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "40")]
pub struct PackedLedReport {
    #[packed_field(bytes = "0")]
    pub report_id: u8, // Always 0x22
    #[packed_field(bytes = "1")]
    pub enable_ffb_control: u8,
    #[packed_field(bytes = "2")]
    pub led_red: u8,
    #[packed_field(bytes = "3")]
    pub led_green: u8,
    #[packed_field(bytes = "4")]
    pub led_blue: u8,
    #[packed_field(bytes = "5")]
    pub led_index: u8,
    #[packed_field(bytes = "6")]
    pub led_flash: u8,
    #[packed_field(bytes = "7..=8", endian = "lsb")]
    pub led_flash_off_period: Integer<i16, packed_bits::Bits<16>>,
    #[packed_field(bytes = "9..=10", endian = "lsb")]
    pub led_flash_on_period: Integer<i16, packed_bits::Bits<16>>,
}

impl PackedLedReport {
    pub fn new(index: i32, color: Color) -> Self {
        let (red, green, blue) = color.to_rgb8();
        Self {
            led_red: red,
            led_green: green,
            led_blue: blue,
            led_index: index.clamp(0, LED_INDEX_MAX) as u8,
            ..Self::default()
        }
    }

    pub fn with_flash(index: i32, color: Color, flash: i32) -> Self {
        Self {
            led_flash: flash.clamp(0, LED_COMMAND_FLASH_MAX) as u8,
            ..Self::new(index, color)
        }
    }

    pub fn with_flash_periods(index: i32, color: Color, flash: i32, on: i32, off: i32) -> Self {
        Self {
            led_flash_on_period: Integer::from_primitive(
                on.clamp(LED_COMMAND_PERIOD_MIN_MS, LED_COMMAND_PERIOD_MAX_MS) as i16,
            ),
            led_flash_off_period: Integer::from_primitive(
                off.clamp(LED_COMMAND_PERIOD_MIN_MS, LED_COMMAND_PERIOD_MAX_MS) as i16,
            ),
            ..Self::with_flash(index, color, flash)
        }
    }

    pub fn set_ffb_control(&mut self, enable: bool) {
        self.enable_ffb_control = if enable { 3 } else { 2 };
    }
}

impl Default for PackedLedReport {
    fn default() -> Self {
        Self {
            report_id: OUTPUT_REPORT_LED,
            enable_ffb_control: 0,
            led_red: 0,
            led_green: 0,
            led_blue: 0,
            led_index: 0,
            led_flash: 0,
            led_flash_off_period: Integer::from_primitive(0),
            led_flash_on_period: Integer::from_primitive(0),
        }
    }
}
