use super::event::{EventKind, FormatTag, InputEvent, FORMAT_HID, FORMAT_LGS};
use super::gate::{handle_state_event, preprocess, StateChangeSink};
use crate::drivers::blamcon::hid_report::{LightgunState, Vector2};

#[derive(Default)]
struct RecordingSink {
    received: Vec<InputEvent>,
}

impl StateChangeSink for RecordingSink {
    fn change(&mut self, event: &InputEvent) {
        self.received.push(event.clone());
    }
}

fn raw_report() -> Vec<u8> {
    let mut payload = vec![0u8; 22];
    payload[0] = 0x01; // report id
    payload[1] = 0x01; // button west
    payload[6] = 0x0A; // aim x = 10
    payload[8] = 0x14; // aim y = 20
    payload
}

fn canonical_state(event: &InputEvent) -> LightgunState {
    let buf: &[u8; 22] = event.payload[..22].try_into().unwrap();
    LightgunState::unpack(buf)
}

#[test]
fn test_rewrites_raw_state_event() {
    let mut event = InputEvent::state(FORMAT_HID, raw_report());

    assert!(preprocess(&mut event));
    assert_eq!(event.format, FORMAT_LGS);
    assert_eq!(event.kind, EventKind::State);

    let state = canonical_state(&event);
    assert_eq!(state.report_id, 1);
    assert_eq!(state.buttons, 0x01);
    assert_eq!(state.position, Vector2 { x: 10.0, y: 20.0 });
    assert_eq!(state.secondary_motion, Vector2 { x: 0.0, y: 0.0 });
}

#[test]
fn test_drops_short_raw_event() {
    let mut event = InputEvent::state(FORMAT_HID, vec![0x01; 10]);

    assert!(!preprocess(&mut event));
    // The event is left untouched so the caller can discard it whole
    assert_eq!(event.format, FORMAT_HID);
    assert_eq!(event.payload, vec![0x01; 10]);

    let mut sink = RecordingSink::default();
    handle_state_event(&mut event, &mut sink);
    assert!(sink.received.is_empty());
}

#[test]
fn test_passes_delta_events_through() {
    let mut event = InputEvent::delta(FORMAT_HID, vec![0xEE; 4]);

    assert!(preprocess(&mut event));
    assert_eq!(event.format, FORMAT_HID);
    assert_eq!(event.payload, vec![0xEE; 4]);
}

#[test]
fn test_passes_foreign_formats_through() {
    let payload = vec![0x55; 30];
    let mut event = InputEvent::state(FormatTag(*b"KEY"), payload.clone());

    assert!(preprocess(&mut event));
    assert_eq!(event.format, FormatTag(*b"KEY"));
    assert_eq!(event.payload, payload);
}

#[test]
fn test_forwards_canonical_event_to_sink() {
    let mut event = InputEvent::state(FORMAT_HID, raw_report());
    let mut sink = RecordingSink::default();

    handle_state_event(&mut event, &mut sink);

    assert_eq!(sink.received.len(), 1);
    assert_eq!(sink.received[0].format, FORMAT_LGS);
    let state = canonical_state(&sink.received[0]);
    assert_eq!(state.position, Vector2 { x: 10.0, y: 20.0 });
}

#[test]
fn test_unrecognized_report_rewrites_to_neutral() {
    let mut event = InputEvent::state(FORMAT_HID, vec![0x42; 22]);

    assert!(preprocess(&mut event));
    assert_eq!(event.format, FORMAT_LGS);
    assert_eq!(canonical_state(&event), LightgunState::empty());
}

#[test]
fn test_rewrite_preserves_payload_tail() {
    let mut payload = raw_report();
    payload.extend_from_slice(&[0xBB; 8]);
    let mut event = InputEvent::state(FORMAT_HID, payload);

    assert!(preprocess(&mut event));
    assert_eq!(event.payload.len(), 30);
    assert_eq!(&event.payload[22..], &[0xBB; 8]);
}
