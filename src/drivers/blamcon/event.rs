/// Events that can be emitted by a Blamcon lightgun
#[derive(Clone, Debug)]
pub enum Event {
    Button(ButtonEvent),
    Axis(AxisEvent),
}

/// Binary input contain either pressed or unpressed
#[derive(Clone, Debug)]
pub struct BinaryInput {
    pub pressed: bool,
}

/// Button events represent binary inputs
#[derive(Clone, Debug)]
pub enum ButtonEvent {
    West(BinaryInput),
    South(BinaryInput),
    East(BinaryInput),
    North(BinaryInput),
    LeftShoulder(BinaryInput),
    RightShoulder(BinaryInput),
    LeftTrigger(BinaryInput),
    RightTrigger(BinaryInput),
    Select(BinaryInput),
    Start(BinaryInput),
    LeftStickPress(BinaryInput),
    RightStickPress(BinaryInput),
    DPadUp(BinaryInput),
    DPadDown(BinaryInput),
    DPadLeft(BinaryInput),
    DPadRight(BinaryInput),
}

/// Axis input contain (x, y) coordinates in raw device units
#[derive(Clone, Debug)]
pub struct AxisInput {
    pub x: f32,
    pub y: f32,
}

/// Axis events are emitted for the two pointer channels
#[derive(Clone, Debug)]
pub enum AxisEvent {
    /// Primary aim pointer
    Aim(AxisInput),
    /// Secondary pointer/motion channel
    SecondaryMotion(AxisInput),
}
