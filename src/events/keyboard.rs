use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

/// Состояние клавиши
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyState {
    Pressed,
    Released,
    Repeat,
}

/// Код клавиши (виртуальные коды macOS, kVK_*)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyCode(pub u16);

impl KeyCode {
    pub fn new(code: u16) -> Self {
        Self(code)
    }

    pub fn value(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KEY_{}", self.0)
    }
}

/// Модификаторы клавиш
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub command: bool,
}

impl Modifiers {
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(dead_code)]
    pub fn with_ctrl(mut self, ctrl: bool) -> Self {
        self.ctrl = ctrl;
        self
    }

    #[allow(dead_code)]
    pub fn with_alt(mut self, alt: bool) -> Self {
        self.alt = alt;
        self
    }

    #[allow(dead_code)]
    pub fn with_shift(mut self, shift: bool) -> Self {
        self.shift = shift;
        self
    }

    #[allow(dead_code)]
    pub fn with_command(mut self, command: bool) -> Self {
        self.command = command;
        self
    }

    pub fn is_empty(&self) -> bool {
        !self.ctrl && !self.alt && !self.shift && !self.command
    }

    /// Все модификаторы из `required` зажаты (лишние допускаются)
    pub fn contains(&self, required: &Modifiers) -> bool {
        (!required.ctrl || self.ctrl)
            && (!required.alt || self.alt)
            && (!required.shift || self.shift)
            && (!required.command || self.command)
    }

    pub fn to_vec(&self) -> Vec<String> {
        let mut result = Vec::new();
        if self.ctrl { result.push("ctrl".to_string()); }
        if self.alt { result.push("alt".to_string()); }
        if self.shift { result.push("shift".to_string()); }
        if self.command { result.push("cmd".to_string()); }
        result
    }

    /// Разобрать имена модификаторов из конфигурации
    pub fn parse(modifiers: &[String]) -> Result<Self, String> {
        let mut result = Self::new();
        for modifier in modifiers {
            match modifier.to_lowercase().as_str() {
                "ctrl" | "control" => result.ctrl = true,
                "alt" | "option" => result.alt = true,
                "shift" => result.shift = true,
                "cmd" | "command" | "super" => result.command = true,
                other => return Err(format!("Неизвестный модификатор: {}", other)),
            }
        }
        Ok(result)
    }
}

impl fmt::Display for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let modifiers = self.to_vec();
        if modifiers.is_empty() {
            write!(f, "none")
        } else {
            write!(f, "{}", modifiers.join("+"))
        }
    }
}

/// Событие клавиатуры
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    pub key_code: KeyCode,
    pub state: KeyState,
    pub modifiers: Modifiers,
    pub timestamp: Instant,
    pub source: String,
}

impl KeyEvent {
    #[allow(dead_code)]
    pub fn new(key_code: KeyCode, state: KeyState, modifiers: Modifiers, source: String) -> Self {
        Self::at(key_code, state, modifiers, Instant::now(), source)
    }

    pub fn at(
        key_code: KeyCode,
        state: KeyState,
        modifiers: Modifiers,
        timestamp: Instant,
        source: String,
    ) -> Self {
        Self {
            key_code,
            state,
            modifiers,
            timestamp,
            source,
        }
    }

    /// Получить уникальный идентификатор комбинации клавиш
    pub fn combination_id(&self) -> String {
        if self.modifiers.is_empty() {
            format!("{}", self.key_code.value())
        } else {
            format!("{}+{}", self.modifiers, self.key_code.value())
        }
    }
}

impl fmt::Display for KeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{}] {:?} ({})",
            self.combination_id(),
            self.source,
            self.state,
            self.timestamp.elapsed().as_millis()
        )
    }
}
