use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Метод, вызываемый в UI-слое при активации
pub const ACTIVATE_METHOD: &str = "activate";

/// Что вызвало активацию
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationSource {
    /// Двойное нажатие целевой комбинации
    DoublePress,
    /// Прямой шорткат (эквивалент пункта меню "Activate")
    Shortcut,
}

impl fmt::Display for ActivationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActivationSource::DoublePress => write!(f, "double_press"),
            ActivationSource::Shortcut => write!(f, "shortcut"),
        }
    }
}

/// Вызов метода в именованном канале UI-слоя
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activation {
    pub channel: String,
    pub method: String,
    pub source: ActivationSource,
    pub timestamp: SystemTime,
}

impl Activation {
    pub fn new(channel: impl Into<String>, source: ActivationSource) -> Self {
        Self {
            channel: channel.into(),
            method: ACTIVATE_METHOD.to_string(),
            source,
            timestamp: SystemTime::now(),
        }
    }

    /// Имя канала по соглашению `<app-id>/activate`
    pub fn channel_name(app_id: &str) -> String {
        format!("{}/{}", app_id, ACTIVATE_METHOD)
    }

    pub fn to_message(&self) -> ActivationMessage {
        let timestamp_ms = self
            .timestamp
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);

        ActivationMessage {
            channel: self.channel.clone(),
            method: self.method.clone(),
            arguments: None,
            source: self.source,
            timestamp_ms,
        }
    }
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{} ({})", self.channel, self.method, self.source)
    }
}

/// Сообщение, отправляемое в сокет UI-слоя (одна JSON-строка)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationMessage {
    pub channel: String,
    pub method: String,
    pub arguments: Option<serde_json::Value>,
    pub source: ActivationSource,
    pub timestamp_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_name_convention() {
        assert_eq!(
            Activation::channel_name("com.example.deep_gptl"),
            "com.example.deep_gptl/activate"
        );
    }

    #[test]
    fn test_message_has_no_arguments() {
        let activation = Activation::new("app/activate", ActivationSource::DoublePress);
        let message = activation.to_message();

        assert_eq!(message.method, "activate");
        assert_eq!(message.arguments, None);

        let json = serde_json::to_string(&message).unwrap();
        assert!(json.contains("\"arguments\":null"));
        assert!(json.contains("\"source\":\"double_press\""));
    }
}
