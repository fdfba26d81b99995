use crate::config::Config;
use crate::error::Result;
use crate::events::KeyEvent;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Trait for keyboard listeners that can run in different modes
#[async_trait::async_trait]
pub trait KeyboardListenerTrait: Send {
    /// Subscribe: start delivering key-down events into `events`
    fn start(&mut self, events: mpsc::Sender<KeyEvent>) -> Result<()>;

    /// Unsubscribe. Once this returns, no further events are sent
    async fn stop(&mut self);

    fn is_running(&self) -> bool;
}

/// Factory function to create an appropriate keyboard listener based on the dry_run flag
pub fn create_keyboard_listener(
    config: Arc<Config>,
    dry_run: bool,
) -> Result<Box<dyn KeyboardListenerTrait>> {
    if dry_run {
        return Ok(Box::new(
            super::dry_keyboard_listener::DryRunKeyboardListener::new(config)?,
        ));
    }

    #[cfg(target_os = "macos")]
    {
        Ok(Box::new(super::keyboard_listener::MacKeyboardListener::new(config)))
    }

    #[cfg(not(target_os = "macos"))]
    {
        let _ = config;
        Err(crate::activator_error!(
            service_unavailable,
            "Глобальный перехват клавиатуры поддерживается только на macOS, используйте --dry-run"
        ))
    }
}
