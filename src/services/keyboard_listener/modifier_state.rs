use crate::events::Modifiers;

/// Маски модификаторов из CGEventFlags (kCGEventFlagMask*)
pub mod flags {
    pub const SHIFT: u64 = 0x0002_0000;
    pub const CONTROL: u64 = 0x0004_0000;
    pub const ALTERNATE: u64 = 0x0008_0000;
    pub const COMMAND: u64 = 0x0010_0000;
}

#[derive(Debug, Default)]
pub struct ModifierState {
    ctrl: bool,
    alt: bool,
    shift: bool,
    command: bool,
}

impl ModifierState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_flags(bits: u64) -> Self {
        let mut state = Self::new();
        state.update_flags(bits);
        state
    }

    pub fn to_modifiers(&self) -> Modifiers {
        Modifiers {
            ctrl: self.ctrl,
            alt: self.alt,
            shift: self.shift,
            command: self.command,
        }
    }

    /// CGEvent несёт полное состояние модификаторов в каждом событии клавиши
    pub fn update_flags(&mut self, bits: u64) {
        self.ctrl = bits & flags::CONTROL != 0;
        self.alt = bits & flags::ALTERNATE != 0;
        self.shift = bits & flags::SHIFT != 0;
        self.command = bits & flags::COMMAND != 0;
    }
}
