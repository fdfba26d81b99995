use super::detector::{Detection, HotkeyTarget};
use crate::events::KeyEvent;

/// Прямой шорткат активации: срабатывает на каждое одиночное нажатие.
/// Повторяет эквивалент клавиши пункта меню "Activate" (по умолчанию Cmd+Shift+I).
#[derive(Debug, Clone, Copy)]
pub struct ShortcutMatcher {
    target: HotkeyTarget,
}

impl ShortcutMatcher {
    pub fn new(target: HotkeyTarget) -> Self {
        Self { target }
    }

    pub fn handle_event(&self, event: &KeyEvent) -> Detection {
        if self.target.matches(event) {
            Detection::Activate
        } else {
            Detection::None
        }
    }

    pub fn target(&self) -> HotkeyTarget {
        self.target
    }
}
