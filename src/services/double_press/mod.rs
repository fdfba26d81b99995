mod detector;
mod shortcut;

pub use self::detector::{Detection, DoublePressDetector, HotkeyTarget};
pub use self::shortcut::ShortcutMatcher;
