use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::events::{Activation, KeyCode, Modifiers};
use crate::mappings::KeyNameToMacKeyCode;
use crate::services::double_press::HotkeyTarget;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub logging: LoggingConfig,
    pub hotkey: HotkeyConfig,
    pub shortcut: ShortcutConfig,
    pub activation: ActivationConfig,
    pub permissions: PermissionsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

/// Комбинация, двойное нажатие которой активирует приложение
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HotkeyConfig {
    pub key: String,
    pub modifiers: Vec<String>,
    pub window_ms: u64,
}

/// Прямой шорткат активации (одно нажатие)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ShortcutConfig {
    pub enabled: bool,
    pub key: String,
    pub modifiers: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ActivationConfig {
    pub app_id: String,
    /// "log" | "socket"
    pub sink: String,
    pub socket_path: PathBuf,
    pub connect_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PermissionsConfig {
    /// Показывать системный запрос доступа, если его ещё нет
    pub prompt: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "compact".to_string(),
            },
            hotkey: HotkeyConfig {
                key: "c".to_string(),
                modifiers: vec!["cmd".to_string()],
                window_ms: 500,
            },
            shortcut: ShortcutConfig {
                enabled: true,
                key: "i".to_string(),
                modifiers: vec!["cmd".to_string(), "shift".to_string()],
            },
            activation: ActivationConfig {
                app_id: "com.example.deep_gptl".to_string(),
                sink: "log".to_string(),
                socket_path: std::env::temp_dir().join("deep_gptl.sock"),
                connect_timeout_ms: 250,
            },
            permissions: PermissionsConfig { prompt: true },
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_path = config_path.as_ref();

        let figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("ACTIVATOR_").split("__"));

        let config: Config = figment
            .extract()
            .with_context(|| format!("Не удалось загрузить конфигурацию из {:?}", config_path))?;

        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        // Валидация настроек логирования
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!("Неверный уровень логирования: {}", self.logging.level),
        }

        match self.logging.format.as_str() {
            "compact" | "full" => {}
            _ => anyhow::bail!("Неверный формат логирования: {}", self.logging.format),
        }

        // Валидация горячей клавиши
        if self.hotkey.window_ms == 0 {
            anyhow::bail!("window_ms должно быть больше 0");
        }
        self.hotkey_target()?;

        if self.shortcut.enabled {
            self.shortcut_target()?;
        }

        // Валидация канала активации
        if self.activation.app_id.trim().is_empty() {
            anyhow::bail!("app_id не может быть пустым");
        }

        match self.activation.sink.as_str() {
            "log" | "socket" => {}
            _ => anyhow::bail!("Неверный тип канала активации: {}", self.activation.sink),
        }

        if self.activation.sink == "socket" && self.activation.connect_timeout_ms == 0 {
            anyhow::bail!("connect_timeout_ms должно быть больше 0");
        }

        Ok(())
    }

    pub fn hotkey_target(&self) -> Result<HotkeyTarget> {
        parse_target(&self.hotkey.key, &self.hotkey.modifiers)
            .context("Неверная комбинация в секции [hotkey]")
    }

    pub fn shortcut_target(&self) -> Result<HotkeyTarget> {
        parse_target(&self.shortcut.key, &self.shortcut.modifiers)
            .context("Неверная комбинация в секции [shortcut]")
    }

    pub fn double_press_window(&self) -> Duration {
        Duration::from_millis(self.hotkey.window_ms)
    }

    pub fn channel_name(&self) -> String {
        Activation::channel_name(&self.activation.app_id)
    }
}

fn parse_target(key: &str, modifiers: &[String]) -> Result<HotkeyTarget> {
    let code = KeyNameToMacKeyCode::translate(key).map_err(anyhow::Error::msg)?;
    let modifiers = Modifiers::parse(modifiers).map_err(anyhow::Error::msg)?;
    Ok(HotkeyTarget::new(KeyCode::new(code), modifiers))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_hotkey_is_cmd_c() {
        let config = Config::default();
        let target = config.hotkey_target().unwrap();

        assert_eq!(target.key_code, KeyCode::new(8));
        assert_eq!(target.modifiers, Modifiers::new().with_command(true));
        assert_eq!(config.double_press_window(), Duration::from_millis(500));
    }

    #[test]
    fn test_default_shortcut_is_cmd_shift_i() {
        let config = Config::default();
        let target = config.shortcut_target().unwrap();

        assert_eq!(target.key_code, KeyCode::new(34));
        assert_eq!(
            target.modifiers,
            Modifiers::new().with_command(true).with_shift(true)
        );
    }

    #[test]
    fn test_channel_name() {
        let config = Config::default();
        assert_eq!(config.channel_name(), "com.example.deep_gptl/activate");
    }

    #[test]
    fn test_zero_window_rejected() {
        let mut config = Config::default();
        config.hotkey.window_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = Config::default();
        config.hotkey.modifiers = vec!["hyper".to_string()];
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.hotkey.key = "not-a-key".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.activation.sink = "carrier-pigeon".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.logging.format = "json".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_disabled_shortcut_is_not_validated() {
        let mut config = Config::default();
        config.shortcut.enabled = false;
        config.shortcut.key = "not-a-key".to_string();
        assert!(config.validate().is_ok());
    }

    fn load_in_jail(jail: &figment::Jail) -> figment::error::Result<Config> {
        Config::load(jail.directory().join("activator.toml"))
            .map_err(|e| figment::Error::from(format!("{:#}", e)))
    }

    #[test]
    fn test_load_merges_toml_over_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "activator.toml",
                "[hotkey]\nkey = \"v\"\nmodifiers = [\"ctrl\"]\nwindow_ms = 300\n",
            )?;

            let config = load_in_jail(jail)?;

            assert_eq!(config.hotkey.key, "v");
            assert_eq!(config.hotkey.window_ms, 300);
            assert_eq!(config.activation.app_id, "com.example.deep_gptl");
            assert!(config.shortcut.enabled);
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_toml() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "activator.toml",
                "[hotkey]\nwindow_ms = 700\n\n[activation]\nsink = \"log\"\n",
            )?;
            jail.set_env("ACTIVATOR_HOTKEY__WINDOW_MS", "300");
            jail.set_env("ACTIVATOR_ACTIVATION__SINK", "socket");

            let config = load_in_jail(jail)?;

            assert_eq!(config.hotkey.window_ms, 300);
            assert_eq!(config.activation.sink, "socket");
            assert_eq!(config.hotkey.key, "c");
            Ok(())
        });
    }

    #[test]
    fn test_invalid_env_override_rejected() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("activator.toml", "")?;
            jail.set_env("ACTIVATOR_HOTKEY__WINDOW_MS", "0");

            assert!(load_in_jail(jail).is_err());
            Ok(())
        });
    }
}
