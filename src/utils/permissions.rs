use crate::error::Result;
use tracing::{info, warn};

/// Результат проверки доступа к глобальному вводу
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(not(target_os = "macos"), allow(dead_code))]
pub enum PermissionStatus {
    Granted,
    Denied,
    /// На платформе нет отдельного разрешения (dry-run, не macOS)
    NotRequired,
}

/// Проверить права доступа к глобальному вводу.
///
/// Отказ не прерывает запуск: перехватчик просто не получит событий,
/// пока пользователь не выдаст доступ.
pub fn check_permissions(prompt: bool) -> Result<PermissionStatus> {
    info!("Проверка прав доступа...");

    let status = platform::is_process_trusted(prompt);

    match status {
        PermissionStatus::Granted => info!("Доступ к Accessibility подтвержден"),
        PermissionStatus::NotRequired => info!("Отдельное разрешение на перехват не требуется"),
        PermissionStatus::Denied => {
            warn!("⚠️  Нужен доступ к Accessibility");
            warn!("   Приложению требуется доступ для отслеживания нажатий клавиш.");
            for line in setup_instructions() {
                warn!("   {}", line);
            }
        }
    }

    Ok(status)
}

/// Инструкции для выдачи доступа
pub fn setup_instructions() -> Vec<String> {
    vec![
        "1. Откройте System Settings > Privacy & Security > Accessibility".to_string(),
        "2. Включите переключатель для этого приложения (или терминала, из которого оно запущено)".to_string(),
        "3. Перезапустите приложение".to_string(),
        "".to_string(),
        "# Открыть нужную панель из терминала:".to_string(),
        "open \"x-apple.systempreferences:com.apple.preference.security?Privacy_Accessibility\"".to_string(),
    ]
}

#[cfg(target_os = "macos")]
mod platform {
    use super::PermissionStatus;
    use core_foundation::base::TCFType;
    use core_foundation::boolean::CFBoolean;
    use core_foundation::dictionary::{CFDictionary, CFDictionaryRef};
    use core_foundation::string::{CFString, CFStringRef};

    #[link(name = "ApplicationServices", kind = "framework")]
    extern "C" {
        static kAXTrustedCheckOptionPrompt: CFStringRef;
        fn AXIsProcessTrustedWithOptions(options: CFDictionaryRef) -> bool;
    }

    pub fn is_process_trusted(prompt: bool) -> PermissionStatus {
        // SAFETY: kAXTrustedCheckOptionPrompt - константа фреймворка, живёт всё время процесса
        let key = unsafe { CFString::wrap_under_get_rule(kAXTrustedCheckOptionPrompt) };
        let options = CFDictionary::from_CFType_pairs(&[(
            key.as_CFType(),
            CFBoolean::from(prompt).as_CFType(),
        )]);

        // SAFETY: словарь удерживается до конца вызова
        let trusted = unsafe { AXIsProcessTrustedWithOptions(options.as_concrete_TypeRef()) };

        if trusted {
            PermissionStatus::Granted
        } else {
            PermissionStatus::Denied
        }
    }
}

#[cfg(not(target_os = "macos"))]
mod platform {
    use super::PermissionStatus;

    pub fn is_process_trusted(_prompt: bool) -> PermissionStatus {
        PermissionStatus::NotRequired
    }
}
