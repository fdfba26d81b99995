use thiserror::Error;

#[derive(Error, Debug)]
pub enum ActivatorError {
    #[error("Ошибка конфигурации: {0}")]
    Config(String),

    #[error("Ошибка ввода-вывода: {0}")]
    Io(#[from] std::io::Error),

    #[error("Ошибка сериализации: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Недостаточно прав доступа: {0}")]
    #[cfg_attr(not(target_os = "macos"), allow(dead_code))]
    Permission(String),

    #[error("Сервис недоступен: {0}")]
    ServiceUnavailable(String),

    #[error("Компонент уже запущен: {0}")]
    AlreadyRunning(String),

    #[error("Ошибка источника событий клавиатуры: {0}")]
    #[cfg_attr(not(target_os = "macos"), allow(dead_code))]
    EventSource(String),

    #[error("Ошибка канала активации: {0}")]
    Sink(String),

    #[error("Внутренняя ошибка: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, ActivatorError>;

// Удобные макросы для создания ошибок
#[macro_export]
macro_rules! activator_error {
    (config, $($arg:tt)*) => {
        $crate::error::ActivatorError::Config(format!($($arg)*))
    };
    (permission, $($arg:tt)*) => {
        $crate::error::ActivatorError::Permission(format!($($arg)*))
    };
    (service_unavailable, $($arg:tt)*) => {
        $crate::error::ActivatorError::ServiceUnavailable(format!($($arg)*))
    };
    (event_source, $($arg:tt)*) => {
        $crate::error::ActivatorError::EventSource(format!($($arg)*))
    };
    (sink, $($arg:tt)*) => {
        $crate::error::ActivatorError::Sink(format!($($arg)*))
    };
    (internal, $($arg:tt)*) => {
        $crate::error::ActivatorError::Internal(format!($($arg)*))
    };
}
