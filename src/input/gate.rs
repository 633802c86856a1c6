//! Pre-processing gate for inbound lightgun events.
//!
//! Raw state events arrive tagged [FORMAT_HID] and carrying wire report
//! bytes. Before generic state-change machinery sees them, the gate decodes
//! the report, rewrites the payload in place to the canonical packed state,
//! and relabels the event [FORMAT_LGS]. Events the codec does not own pass
//! through untouched, and undecodable ones are suppressed so they cannot
//! corrupt downstream control state.

use crate::drivers::blamcon::driver::CANONICAL_STATE_SIZE;
use crate::drivers::blamcon::hid_report::LightgunState;

use super::event::{EventKind, InputEvent, FORMAT_HID, FORMAT_LGS};

/// Consumer of gated input events; the generic state-change machinery.
pub trait StateChangeSink {
    fn change(&mut self, event: &InputEvent);
}

/// Rewrite a raw lightgun state event into canonical form in place.
///
/// Returns true if the event should be forwarded. Delta-state events and
/// state events in formats other than [FORMAT_HID] are forwarded unmodified;
/// raw events too short to decode are suppressed.
pub fn preprocess(event: &mut InputEvent) -> bool {
    if event.kind != EventKind::State {
        // Partial updates never carry a full report to reinterpret
        return true;
    }
    if event.format != FORMAT_HID {
        return true;
    }

    let size = event.payload.len();
    let state = match LightgunState::decode(&event.payload, size) {
        Ok(state) => state,
        Err(err) => {
            log::trace!("Suppressing undecodable state event: {err}");
            return false;
        }
    };

    event.payload[..CANONICAL_STATE_SIZE].copy_from_slice(&state.pack());
    event.format = FORMAT_LGS;
    true
}

/// Gate one inbound event and forward it to the sink if it survives.
pub fn handle_state_event(event: &mut InputEvent, sink: &mut dyn StateChangeSink) {
    if !preprocess(event) {
        return;
    }
    sink.change(event);
}
