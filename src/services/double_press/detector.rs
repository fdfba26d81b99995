//! Детектор двойного нажатия.
//!
//! Хранит только время последнего подходящего нажатия. Каждое подходящее
//! нажатие перезаписывает его, поэтому окно "скользит": третье нажатие в
//! пределах окна от второго снова даёт активацию.

use std::fmt;
use std::time::{Duration, Instant};

use crate::activator_error;
use crate::error::Result;
use crate::events::{KeyCode, KeyEvent, Modifiers};

/// Окно по умолчанию между двумя нажатиями
pub const DEFAULT_DOUBLE_PRESS_WINDOW: Duration = Duration::from_millis(500);

/// Целевая комбинация: код клавиши и обязательные модификаторы
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HotkeyTarget {
    pub key_code: KeyCode,
    pub modifiers: Modifiers,
}

impl HotkeyTarget {
    pub fn new(key_code: KeyCode, modifiers: Modifiers) -> Self {
        Self { key_code, modifiers }
    }

    /// Код совпадает и зажаты как минимум требуемые модификаторы
    pub fn matches(&self, event: &KeyEvent) -> bool {
        event.key_code == self.key_code && event.modifiers.contains(&self.modifiers)
    }
}

impl fmt::Display for HotkeyTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifiers.is_empty() {
            write!(f, "{}", self.key_code)
        } else {
            write!(f, "{}+{}", self.modifiers, self.key_code)
        }
    }
}

/// Результат обработки события
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detection {
    Activate,
    None,
}

pub struct DoublePressDetector {
    target: HotkeyTarget,
    window: Duration,
    last_qualifying: Option<Instant>,
}

impl DoublePressDetector {
    pub fn new(target: HotkeyTarget, window: Duration) -> Result<Self> {
        let mut detector = Self {
            target,
            window: DEFAULT_DOUBLE_PRESS_WINDOW,
            last_qualifying: None,
        };
        detector.configure(target, window)?;
        Ok(detector)
    }

    /// Задать целевую комбинацию и окно.
    ///
    /// Нулевое окно отклоняется, прежняя конфигурация при этом сохраняется.
    /// Время последнего нажатия не сбрасывается.
    pub fn configure(&mut self, target: HotkeyTarget, window: Duration) -> Result<()> {
        if window.is_zero() {
            return Err(activator_error!(
                config,
                "Окно двойного нажатия для {} должно быть больше 0",
                target
            ));
        }

        self.target = target;
        self.window = window;
        Ok(())
    }

    pub fn handle_event(&mut self, event: &KeyEvent) -> Detection {
        if !self.target.matches(event) {
            return Detection::None;
        }

        // checked_duration_since == None: часы ушли назад, это не двойное нажатие
        let within_window = self
            .last_qualifying
            .and_then(|last| event.timestamp.checked_duration_since(last))
            .is_some_and(|delta| delta < self.window);

        self.last_qualifying = Some(event.timestamp);

        if within_window {
            Detection::Activate
        } else {
            Detection::None
        }
    }

    #[allow(dead_code)]
    pub fn target(&self) -> HotkeyTarget {
        self.target
    }

    #[allow(dead_code)]
    pub fn window(&self) -> Duration {
        self.window
    }

    #[allow(dead_code)]
    pub fn last_qualifying(&self) -> Option<Instant> {
        self.last_qualifying
    }
}
