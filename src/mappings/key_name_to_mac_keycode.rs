use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Виртуальные коды клавиш macOS (kVK_* из HIToolbox/Events.h, раскладка ANSI).
/// Первое имя для кода считается каноническим, остальные - псевдонимы.
const KEY_TABLE: &[(&str, u16)] = &[
    // Буквенные клавиши
    ("a", 0),
    ("s", 1),
    ("d", 2),
    ("f", 3),
    ("h", 4),
    ("g", 5),
    ("z", 6),
    ("x", 7),
    ("c", 8),
    ("v", 9),
    ("b", 11),
    ("q", 12),
    ("w", 13),
    ("e", 14),
    ("r", 15),
    ("y", 16),
    ("t", 17),
    ("o", 31),
    ("u", 32),
    ("i", 34),
    ("p", 35),
    ("l", 37),
    ("j", 38),
    ("k", 40),
    ("n", 45),
    ("m", 46),

    // Цифровые клавиши (верхний ряд)
    ("1", 18),
    ("2", 19),
    ("3", 20),
    ("4", 21),
    ("6", 22),
    ("5", 23),
    ("9", 25),
    ("7", 26),
    ("8", 28),
    ("0", 29),

    // Знаки пунктуации
    ("equal", 24),
    ("minus", 27),
    ("rightbracket", 30),
    ("leftbracket", 33),
    ("quote", 39),
    ("semicolon", 41),
    ("backslash", 42),
    ("comma", 43),
    ("slash", 44),
    ("period", 47),
    ("grave", 50),

    // Специальные клавиши
    ("return", 36),
    ("enter", 36),
    ("tab", 48),
    ("space", 49),
    ("backspace", 51),
    ("escape", 53),
    ("esc", 53),
    ("forwarddelete", 117),
    ("delete", 117),

    // Навигация
    ("home", 115),
    ("pageup", 116),
    ("end", 119),
    ("pagedown", 121),
    ("left", 123),
    ("right", 124),
    ("down", 125),
    ("up", 126),

    // Функциональные клавиши
    ("f1", 122),
    ("f2", 120),
    ("f3", 99),
    ("f4", 118),
    ("f5", 96),
    ("f6", 97),
    ("f7", 98),
    ("f8", 100),
    ("f9", 101),
    ("f10", 109),
    ("f11", 103),
    ("f12", 111),
];

static NAME_TO_CODE: Lazy<HashMap<&'static str, u16>> =
    Lazy::new(|| KEY_TABLE.iter().copied().collect());

static CODE_TO_NAME: Lazy<HashMap<u16, &'static str>> = Lazy::new(|| {
    let mut map = HashMap::new();
    for (name, code) in KEY_TABLE {
        map.entry(*code).or_insert(*name);
    }
    map
});

/// Преобразование имён клавиш в виртуальные коды macOS
pub struct KeyNameToMacKeyCode;

impl KeyNameToMacKeyCode {
    /// Получить код клавиши по её имени
    pub fn translate(key_name: &str) -> Result<u16, String> {
        let normalized = key_name.trim().to_lowercase();
        NAME_TO_CODE
            .get(normalized.as_str())
            .copied()
            .ok_or_else(|| format!("Неизвестная клавиша: {}", key_name))
    }

    /// Получить каноническое имя клавиши по коду
    #[allow(dead_code)]
    pub fn reverse_translate(code: u16) -> Option<&'static str> {
        CODE_TO_NAME.get(&code).copied()
    }
}
