use std::cell::RefCell;
use std::rc::Rc;

use packed_struct::prelude::*;

use super::driver::{CommandTransport, Driver, INPUT_REPORT_SIZE, OUTPUT_REPORT_SIZE};
use super::event::{AxisEvent, ButtonEvent, Event};
use super::hid_report::{Color, PackedInputDataReport};

/// Transport double that records every sent buffer and returns a canned
/// result code.
#[derive(Clone)]
struct MockTransport {
    sent: Rc<RefCell<Vec<Vec<u8>>>>,
    result: i64,
}

impl MockTransport {
    fn new(result: i64) -> Self {
        Self {
            sent: Rc::new(RefCell::new(Vec::new())),
            result,
        }
    }

    fn sent(&self) -> Vec<Vec<u8>> {
        self.sent.borrow().clone()
    }
}

impl CommandTransport for MockTransport {
    fn execute(&mut self, buf: &[u8]) -> i64 {
        self.sent.borrow_mut().push(buf.to_vec());
        self.result
    }
}

fn report_with(buttons: u32, hat: u8, aim: (i16, i16)) -> [u8; INPUT_REPORT_SIZE] {
    let report = PackedInputDataReport {
        report_id: 1,
        buttons: Integer::from_primitive(buttons),
        hat,
        left_stick_x: Integer::from_primitive(aim.0),
        left_stick_y: Integer::from_primitive(aim.1),
        right_stick_x: Integer::from_primitive(0),
        right_stick_y: Integer::from_primitive(0),
    };
    report.pack().unwrap()
}

fn feed(
    driver: &mut Driver<MockTransport>,
    buf: &[u8; INPUT_REPORT_SIZE],
) -> Vec<Event> {
    driver
        .handle_input_report(&buf[..], INPUT_REPORT_SIZE)
        .unwrap()
}

#[test]
fn test_rumble_sends_combined_report() {
    let transport = MockTransport::new(OUTPUT_REPORT_SIZE as i64);
    let mut driver = Driver::with_transport(transport.clone());

    assert!(driver.rumble(15));

    let sent = transport.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].len(), OUTPUT_REPORT_SIZE);
    assert_eq!(sent[0][0], 16);
    assert_eq!(sent[0][1], 1); // rumble update flag
    assert_eq!(sent[0][15], 10); // clamped pulse
}

#[test]
fn test_transport_failure_returns_false() {
    let transport = MockTransport::new(-1);
    let mut driver = Driver::with_transport(transport.clone());

    assert!(!driver.rumble(1));
    assert!(!driver.recoil(1));
    assert!(!driver.set_led(0, Color::new(1.0, 1.0, 1.0)));
    assert!(!driver.enable_ffb_control(true, true, true));
    // Every command was still handed to the transport exactly once
    assert_eq!(transport.sent().len(), 4);
}

#[test]
fn test_standalone_commands_use_their_report_ids() {
    let transport = MockTransport::new(1);
    let mut driver = Driver::with_transport(transport.clone());

    assert!(driver.send_recoil_command(1));
    assert!(driver.send_rumble_command(1));
    assert!(driver.send_led_command(0, Color::new(0.0, 0.0, 0.0)));

    let sent = transport.sent();
    assert_eq!(sent[0][0], 0x20);
    assert_eq!(sent[1][0], 0x21);
    assert_eq!(sent[2][0], 0x22);
}

#[test]
fn test_short_report_is_dropped() {
    let transport = MockTransport::new(1);
    let mut driver = Driver::with_transport(transport);

    let buf = [0x01u8; 10];
    let events = driver.handle_input_report(&buf, buf.len()).unwrap();
    assert!(events.is_empty());

    // The dropped report must not have become the baseline state: the first
    // full report still emits no events
    let events = feed(&mut driver, &report_with(0x01, 0, (0, 0)));
    assert!(events.is_empty());
}

#[test]
fn test_translate_emits_button_edges() {
    let transport = MockTransport::new(1);
    let mut driver = Driver::with_transport(transport);

    assert!(feed(&mut driver, &report_with(0, 0, (0, 0))).is_empty());

    let events = feed(&mut driver, &report_with(0x01, 0, (0, 0)));
    assert_eq!(events.len(), 1);
    assert!(matches!(
        events[0],
        Event::Button(ButtonEvent::West(ref input)) if input.pressed
    ));

    let events = feed(&mut driver, &report_with(0, 0, (0, 0)));
    assert_eq!(events.len(), 1);
    assert!(matches!(
        events[0],
        Event::Button(ButtonEvent::West(ref input)) if !input.pressed
    ));
}

#[test]
fn test_translate_emits_dpad_edges() {
    let transport = MockTransport::new(1);
    let mut driver = Driver::with_transport(transport);

    feed(&mut driver, &report_with(0, 0, (0, 0)));

    let events = feed(&mut driver, &report_with(0, 1, (0, 0)));
    assert_eq!(events.len(), 1);
    assert!(matches!(
        events[0],
        Event::Button(ButtonEvent::DPadUp(ref input)) if input.pressed
    ));

    // Direction change releases the old direction before pressing the new one
    let events = feed(&mut driver, &report_with(0, 5, (0, 0)));
    assert_eq!(events.len(), 2);
    assert!(matches!(
        events[0],
        Event::Button(ButtonEvent::DPadUp(ref input)) if !input.pressed
    ));
    assert!(matches!(
        events[1],
        Event::Button(ButtonEvent::DPadDown(ref input)) if input.pressed
    ));
}

#[test]
fn test_translate_emits_axis_events() {
    let transport = MockTransport::new(1);
    let mut driver = Driver::with_transport(transport);

    feed(&mut driver, &report_with(0, 0, (0, 0)));

    let events = feed(&mut driver, &report_with(0, 0, (120, -45)));
    assert_eq!(events.len(), 1);
    let Event::Axis(AxisEvent::Aim(ref input)) = events[0] else {
        panic!("expected aim event, got {:?}", events[0]);
    };
    assert_eq!(input.x, 120.0);
    assert_eq!(input.y, -45.0);

    // Unchanged position emits nothing
    assert!(feed(&mut driver, &report_with(0, 0, (120, -45))).is_empty());
}

#[test]
fn test_garbage_report_decodes_to_neutral_state() {
    let transport = MockTransport::new(1);
    let mut driver = Driver::with_transport(transport);

    feed(&mut driver, &report_with(0, 0, (0, 0)));

    // Unrecognized ids collapse to the neutral state, whose sentinel bit is
    // button west
    let events = feed(&mut driver, &[0x42; INPUT_REPORT_SIZE]);
    assert_eq!(events.len(), 1);
    assert!(matches!(
        events[0],
        Event::Button(ButtonEvent::West(ref input)) if input.pressed
    ));
}
