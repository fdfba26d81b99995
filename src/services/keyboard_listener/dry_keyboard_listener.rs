use crate::config::Config;
use crate::error::{ActivatorError, Result};
use crate::events::{KeyCode, KeyEvent, KeyState, Modifiers};
use crate::services::double_press::HotkeyTarget;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep};
use tracing::{debug, info};

use super::r#trait::KeyboardListenerTrait;

const SOURCE: &str = "dry-run";
const SCENARIO_INTERVAL: Duration = Duration::from_secs(5);

/// Эмулируемые сценарии, повторяются по кругу
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scenario {
    /// Два нажатия внутри окна - должна быть активация
    FastDoublePress,
    /// Два нажатия с паузой больше окна - активации нет
    SlowDoublePress,
    /// Посторонняя клавиша
    OtherKey,
    /// Прямой шорткат
    Shortcut,
}

const SCENARIOS: [Scenario; 4] = [
    Scenario::FastDoublePress,
    Scenario::SlowDoublePress,
    Scenario::OtherKey,
    Scenario::Shortcut,
];

pub struct DryRunKeyboardListener {
    hotkey: HotkeyTarget,
    shortcut: Option<HotkeyTarget>,
    window: Duration,
    task: Option<JoinHandle<()>>,
}

impl DryRunKeyboardListener {
    pub fn new(config: Arc<Config>) -> Result<Self> {
        info!("Инициализация DryRunKeyboardListener");

        let hotkey = config
            .hotkey_target()
            .map_err(|e| ActivatorError::Config(format!("{:#}", e)))?;
        let shortcut = if config.shortcut.enabled {
            Some(
                config
                    .shortcut_target()
                    .map_err(|e| ActivatorError::Config(format!("{:#}", e)))?,
            )
        } else {
            None
        };

        Ok(Self {
            hotkey,
            shortcut,
            window: config.double_press_window(),
            task: None,
        })
    }

    async fn run_impl(
        hotkey: HotkeyTarget,
        shortcut: Option<HotkeyTarget>,
        window: Duration,
        events: mpsc::Sender<KeyEvent>,
    ) {
        info!("Dry-run режим - KeyboardListener работает в режиме эмуляции");

        let mut ticker = interval(SCENARIO_INTERVAL);
        // Первый тик срабатывает сразу
        ticker.tick().await;

        for scenario in SCENARIOS.iter().cycle() {
            ticker.tick().await;
            debug!("Dry-run: эмулируем сценарий {:?}", scenario);

            let delivered = match scenario {
                Scenario::FastDoublePress => {
                    Self::emit_twice(&events, hotkey, window / 2).await
                }
                Scenario::SlowDoublePress => {
                    Self::emit_twice(&events, hotkey, window + Duration::from_millis(100)).await
                }
                Scenario::OtherKey => {
                    let other = KeyCode::new(hotkey.key_code.value().wrapping_add(1));
                    Self::emit(&events, other, hotkey.modifiers).await
                }
                Scenario::Shortcut => match shortcut {
                    Some(target) => Self::emit(&events, target.key_code, target.modifiers).await,
                    None => true,
                },
            };

            if !delivered {
                debug!("Получатель событий закрыт, эмуляция остановлена");
                break;
            }
        }
    }

    async fn emit_twice(events: &mpsc::Sender<KeyEvent>, target: HotkeyTarget, gap: Duration) -> bool {
        if !Self::emit(events, target.key_code, target.modifiers).await {
            return false;
        }
        sleep(gap).await;
        Self::emit(events, target.key_code, target.modifiers).await
    }

    async fn emit(events: &mpsc::Sender<KeyEvent>, key_code: KeyCode, modifiers: Modifiers) -> bool {
        // Часы tokio, чтобы эмуляция подчинялась паузе времени в тестах
        let timestamp = tokio::time::Instant::now().into_std();
        let event = KeyEvent::at(key_code, KeyState::Pressed, modifiers, timestamp, SOURCE.to_string());
        events.send(event).await.is_ok()
    }
}

#[async_trait::async_trait]
impl KeyboardListenerTrait for DryRunKeyboardListener {
    fn start(&mut self, events: mpsc::Sender<KeyEvent>) -> Result<()> {
        if self.is_running() {
            return Err(ActivatorError::AlreadyRunning(
                "DryRunKeyboardListener".to_string(),
            ));
        }

        self.task = Some(tokio::spawn(Self::run_impl(
            self.hotkey,
            self.shortcut,
            self.window,
            events,
        )));
        Ok(())
    }

    async fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            // Дожидаемся отмены, чтобы после выхода не осталось отправителей
            let _ = task.await;
            info!("DryRunKeyboardListener остановлен");
        }
    }

    fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_first_scenario_is_double_press_within_window() {
        let config = Arc::new(Config::default());
        let target = config.hotkey_target().unwrap();
        let mut listener = DryRunKeyboardListener::new(config.clone()).unwrap();
        let (tx, mut rx) = mpsc::channel(8);

        listener.start(tx).unwrap();
        assert!(listener.is_running());

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();

        assert!(target.matches(&first));
        assert!(target.matches(&second));
        assert!(second.timestamp.duration_since(first.timestamp) < config.double_press_window());

        listener.stop().await;
        assert!(!listener.is_running());
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_double_start_rejected() {
        let mut listener = DryRunKeyboardListener::new(Arc::new(Config::default())).unwrap();
        let (tx, _rx) = mpsc::channel(8);

        listener.start(tx.clone()).unwrap();
        assert!(matches!(
            listener.start(tx),
            Err(ActivatorError::AlreadyRunning(_))
        ));
        listener.stop().await;
    }
}
