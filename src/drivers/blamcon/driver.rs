use std::{error::Error, ffi::CString};

use hidapi::HidDevice;
use packed_struct::prelude::*;

use super::{
    event::{AxisEvent, AxisInput, BinaryInput, ButtonEvent, Event},
    hid_report::{
        Color, Direction, LightgunButton, LightgunState, PackedFeedbackReport, PackedLedReport,
        PackedRecoilReport, PackedRumbleReport, ReportError,
    },
};

/// Vendor ID
pub const VID: u16 = 0x3673;
/// Product IDs, one per player slot
pub const PIDS: [u16; 4] = [0x0100, 0x0101, 0x0102, 0x0103];

/// Size of a raw wire input report
pub const INPUT_REPORT_SIZE: usize = 22;
/// Size of the canonical packed state, identical to the wire report so the
/// event payload can be rewritten in place
pub const CANONICAL_STATE_SIZE: usize = 22;
/// All output reports share one oversized buffer; trailing bytes are zero
pub const OUTPUT_REPORT_SIZE: usize = 40;

pub const OUTPUT_REPORT_FEEDBACK: u8 = 16;
pub const OUTPUT_REPORT_RECOIL: u8 = 0x20;
pub const OUTPUT_REPORT_RUMBLE: u8 = 0x21;
pub const OUTPUT_REPORT_LED: u8 = 0x22;

// Feedback parameter bounds. Out-of-range intents clamp to these instead of
// failing; the firmware rejects whole reports otherwise.
pub const PULSE_MAX: i32 = 10;
pub const RUMBLE_PERIOD_MIN_MS: i32 = 100;
pub const RUMBLE_PERIOD_MAX_MS: i32 = 2000;
pub const RECOIL_PERIOD_MIN_MS: i32 = 15;
pub const RECOIL_PERIOD_MAX_MS: i32 = 255;
pub const LED_INDEX_MAX: i32 = 1;
// Combined feedback report LED bounds
pub const LED_FLASH_MAX: i32 = 100;
pub const LED_FLASH_PERIOD_MIN_MS: i32 = 40;
pub const LED_FLASH_PERIOD_MAX_MS: i32 = 2000;
// Standalone LED command bounds
pub const LED_COMMAND_FLASH_MAX: i32 = 10;
pub const LED_COMMAND_PERIOD_MIN_MS: i32 = 100;
pub const LED_COMMAND_PERIOD_MAX_MS: i32 = 2000;

/// Transport used to deliver output reports to the device. Sends are
/// fire-and-forget; a negative return code indicates failure and no retry is
/// performed by the driver.
pub trait CommandTransport {
    fn execute(&mut self, buf: &[u8]) -> i64;
}

impl CommandTransport for HidDevice {
    fn execute(&mut self, buf: &[u8]) -> i64 {
        match HidDevice::write(self, buf) {
            Ok(written) => written as i64,
            Err(err) => {
                log::trace!("HID write failed: {err:?}");
                -1
            }
        }
    }
}

/// Blamcon lightgun driver for reading gun input and actuating the rumble
/// motor, recoil solenoid, and addressable LEDs.
pub struct Driver<T: CommandTransport> {
    state: Option<LightgunState>,
    transport: T,
}

impl Driver<HidDevice> {
    pub fn new(path: String) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let c_path = CString::new(path.clone())?;
        let api = hidapi::HidApi::new()?;
        let device = api.open_path(&c_path)?;
        let info = device.get_device_info()?;
        let vid = info.vendor_id();
        let pid = info.product_id();
        if vid != VID || !PIDS.contains(&pid) {
            return Err(
                format!("Device '{path}' is not a Blamcon lightgun: {vid:04x}:{pid:04x}").into(),
            );
        }

        Ok(Self::with_transport(device))
    }

    /// Open the first attached lightgun found on the HID bus
    pub fn open_first() -> Result<Self, Box<dyn Error + Send + Sync>> {
        let api = hidapi::HidApi::new()?;
        let info = api
            .device_list()
            .find(|info| info.vendor_id() == VID && PIDS.contains(&info.product_id()))
            .ok_or("No Blamcon lightgun found")?;
        let device = info.open_device(&api)?;
        Ok(Self::with_transport(device))
    }

    /// Read one raw input report from the device without decoding it
    pub fn poll_raw(
        &mut self,
    ) -> Result<(usize, [u8; INPUT_REPORT_SIZE]), Box<dyn Error + Send + Sync>> {
        let mut buf = [0; INPUT_REPORT_SIZE];
        let bytes_read = self.transport.read(&mut buf[..])?;
        Ok((bytes_read, buf))
    }

    /// Poll the device and translate input reports into events
    pub fn poll(&mut self) -> Result<Vec<Event>, Box<dyn Error + Send + Sync>> {
        let (bytes_read, buf) = self.poll_raw()?;
        self.handle_input_report(&buf[..bytes_read], bytes_read)
    }
}

impl<T: CommandTransport> Driver<T> {
    pub fn with_transport(transport: T) -> Self {
        Self {
            state: None,
            transport,
        }
    }

    /// Decode one raw input report and translate it into a stream of input
    /// events. Reports shorter than [INPUT_REPORT_SIZE] are dropped without
    /// touching the previous state.
    pub fn handle_input_report(
        &mut self,
        buf: &[u8],
        size: usize,
    ) -> Result<Vec<Event>, Box<dyn Error + Send + Sync>> {
        let state = match LightgunState::decode(buf, size) {
            Ok(state) => state,
            Err(err @ ReportError::TooShort { .. }) => {
                log::trace!("Dropping input report: {err}");
                return Ok(Vec::new());
            }
            Err(err) => return Err(err.into()),
        };

        // Update the state
        let old_state = self.update_state(state);

        // Translate the state into a stream of input events
        Ok(self.translate(old_state))
    }

    /// Update the internal state and return the old state
    fn update_state(&mut self, state: LightgunState) -> Option<LightgunState> {
        let old_state = self.state;
        self.state = Some(state);
        old_state
    }

    /// Translate the current state into events
    fn translate(&self, old_state: Option<LightgunState>) -> Vec<Event> {
        let mut events = Vec::new();
        let Some(state) = self.state else {
            return events;
        };
        let Some(old_state) = old_state else {
            return events;
        };

        // Button events
        let mut diff_button = |button: LightgunButton, event: fn(BinaryInput) -> ButtonEvent| {
            let pressed = state.button(button);
            if pressed != old_state.button(button) {
                events.push(Event::Button(event(BinaryInput { pressed })));
            }
        };
        diff_button(LightgunButton::West, ButtonEvent::West);
        diff_button(LightgunButton::South, ButtonEvent::South);
        diff_button(LightgunButton::East, ButtonEvent::East);
        diff_button(LightgunButton::North, ButtonEvent::North);
        diff_button(LightgunButton::LeftShoulder, ButtonEvent::LeftShoulder);
        diff_button(LightgunButton::RightShoulder, ButtonEvent::RightShoulder);
        diff_button(LightgunButton::LeftTrigger, ButtonEvent::LeftTrigger);
        diff_button(LightgunButton::RightTrigger, ButtonEvent::RightTrigger);
        diff_button(LightgunButton::Select, ButtonEvent::Select);
        diff_button(LightgunButton::Start, ButtonEvent::Start);
        diff_button(LightgunButton::LeftStickPress, ButtonEvent::LeftStickPress);
        diff_button(LightgunButton::RightStickPress, ButtonEvent::RightStickPress);

        // Dpad events. The hat is 4-way, so a direction change is a release
        // of the old direction followed by a press of the new one.
        if state.hat != old_state.hat {
            if let Some(event) = dpad_event(old_state.dpad(), false) {
                events.push(event);
            }
            if let Some(event) = dpad_event(state.dpad(), true) {
                events.push(event);
            }
        }

        // Axis events
        if state.position != old_state.position {
            events.push(Event::Axis(AxisEvent::Aim(AxisInput {
                x: state.position.x,
                y: state.position.y,
            })));
        }
        if state.secondary_motion != old_state.secondary_motion {
            events.push(Event::Axis(AxisEvent::SecondaryMotion(AxisInput {
                x: state.secondary_motion.x,
                y: state.secondary_motion.y,
            })));
        }

        events
    }

    /// Send the given packed output report to the device. Returns false and
    /// logs the result code if the transport reports a failure.
    fn send_report<R>(&mut self, report: R) -> bool
    where
        R: PackedStruct<ByteArray = [u8; OUTPUT_REPORT_SIZE]>,
    {
        let buf = match report.pack() {
            Ok(buf) => buf,
            Err(err) => {
                log::error!("Failed to pack output report: {err}");
                return false;
            }
        };
        let result = self.transport.execute(&buf);
        if result < 0 {
            log::error!("Failed to send command to device. Error: {result}");
            return false;
        }
        true
    }

    /// Send a pre-built command report to the device
    pub fn send_command<R>(&mut self, report: R) -> bool
    where
        R: PackedStruct<ByteArray = [u8; OUTPUT_REPORT_SIZE]>,
    {
        self.send_report(report)
    }

    /// Take or release application control of the feedback hardware. While
    /// control is held the device stops firing effects on its own; e.g. the
    /// recoil solenoid no longer kicks on trigger pull.
    pub fn enable_ffb_control(&mut self, recoil: bool, rumble: bool, led: bool) -> bool {
        self.send_report(PackedFeedbackReport::with_ffb_control(recoil, rumble, led))
    }

    /// Pulse the vibration motor
    pub fn rumble(&mut self, pulse: i32) -> bool {
        let mut report = PackedFeedbackReport::new();
        report.set_rumble(pulse);
        self.send_report(report)
    }

    /// Pulse the vibration motor with explicit cycle timing in milliseconds
    pub fn rumble_timed(&mut self, pulse: i32, on: i32, off: i32) -> bool {
        let mut report = PackedFeedbackReport::new();
        report.set_rumble_periods(pulse, on, off);
        self.send_report(report)
    }

    /// Fire the recoil solenoid
    pub fn recoil(&mut self, pulse: i32) -> bool {
        let mut report = PackedFeedbackReport::new();
        report.set_recoil(pulse);
        self.send_report(report)
    }

    /// Fire the recoil solenoid with explicit cycle timing in milliseconds
    pub fn recoil_timed(&mut self, pulse: i32, on: i32, off: i32) -> bool {
        let mut report = PackedFeedbackReport::new();
        report.set_recoil_periods(pulse, on, off);
        self.send_report(report)
    }

    /// Set the color of the given LED
    pub fn set_led(&mut self, index: i32, color: Color) -> bool {
        let mut report = PackedFeedbackReport::new();
        report.set_color(index, color);
        self.send_report(report)
    }

    /// Set the color of the given LED and flash it
    pub fn set_led_flash(&mut self, index: i32, color: Color, flash: i32) -> bool {
        let mut report = PackedFeedbackReport::new();
        report.set_color_flash(index, color, flash);
        self.send_report(report)
    }

    /// Set the color of the given LED and flash it with explicit cycle
    /// timing in milliseconds
    pub fn set_led_flash_timed(
        &mut self,
        index: i32,
        color: Color,
        flash: i32,
        on: i32,
        off: i32,
    ) -> bool {
        let mut report = PackedFeedbackReport::new();
        report.set_color_flash_periods(index, color, flash, on, off);
        self.send_report(report)
    }

    /// Pulse the vibration motor through the standalone rumble command
    pub fn send_rumble_command(&mut self, pulse: i32) -> bool {
        self.send_report(PackedRumbleReport::new(pulse))
    }

    /// Fire the recoil solenoid through the standalone recoil command
    pub fn send_recoil_command(&mut self, pulse: i32) -> bool {
        self.send_report(PackedRecoilReport::new(pulse))
    }

    /// Set an LED through the standalone LED command
    pub fn send_led_command(&mut self, index: i32, color: Color) -> bool {
        self.send_report(PackedLedReport::new(index, color))
    }
}

/// Map a dpad direction edge onto the matching button event
fn dpad_event(direction: Direction, pressed: bool) -> Option<Event> {
    let input = BinaryInput { pressed };
    match direction {
        Direction::Up => Some(Event::Button(ButtonEvent::DPadUp(input))),
        Direction::Right => Some(Event::Button(ButtonEvent::DPadRight(input))),
        Direction::Down => Some(Event::Button(ButtonEvent::DPadDown(input))),
        Direction::Left => Some(Event::Button(ButtonEvent::DPadLeft(input))),
        Direction::None => None,
    }
}
