use std::fmt;

/// 3-character format identifier carried by every input event. The tag tells
/// consumers how to interpret the payload bytes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FormatTag(pub [u8; 3]);

/// Raw vendor HID report payload
pub const FORMAT_HID: FormatTag = FormatTag(*b"HID");
/// Canonical lightgun state payload, produced by the pre-processing gate
pub const FORMAT_LGS: FormatTag = FormatTag(*b"LGS");

impl fmt::Display for FormatTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

/// Kind of inbound event. Delta-state events carry partial updates and never
/// hold a full wire report.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EventKind {
    State,
    DeltaState,
}

/// A tagged input event as delivered by the host input layer
#[derive(Debug, Clone)]
pub struct InputEvent {
    pub kind: EventKind,
    pub format: FormatTag,
    pub payload: Vec<u8>,
}

impl InputEvent {
    pub fn state(format: FormatTag, payload: Vec<u8>) -> Self {
        Self {
            kind: EventKind::State,
            format,
            payload,
        }
    }

    pub fn delta(format: FormatTag, payload: Vec<u8>) -> Self {
        Self {
            kind: EventKind::DeltaState,
            format,
            payload,
        }
    }
}
