use crate::config::Config;
use crate::debug_if_enabled;
use crate::error::{ActivatorError, Result};
use crate::events::{Activation, ActivationSource, KeyEvent, KeyState};
use crate::services::activation_sink::ActivationSinkTrait;
use crate::services::double_press::{Detection, DoublePressDetector, ShortcutMatcher};
use crate::services::keyboard_listener::KeyboardListenerTrait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

const EVENT_QUEUE_CAPACITY: usize = 64;
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Состояние, разделяемое с задачей-потребителем событий
struct Dispatcher {
    channel: String,
    detector: Mutex<DoublePressDetector>,
    shortcut: Option<ShortcutMatcher>,
    sink: Box<dyn ActivationSinkTrait>,
    activations: AtomicU64,
}

impl Dispatcher {
    fn process_event(&self, event: &KeyEvent) -> Option<Activation> {
        // Автоповтор удерживаемой клавиши не считается нажатием:
        // зажатый Cmd+C не активирует, нужны два отдельных нажатия
        if event.state != KeyState::Pressed {
            return None;
        }

        // Детектор видит каждое нажатие, даже если сработал шорткат
        let detection = self.detector.lock().handle_event(event);
        let shortcut = self
            .shortcut
            .as_ref()
            .map_or(Detection::None, |matcher| matcher.handle_event(event));

        let source = match (shortcut, detection) {
            (Detection::Activate, _) => ActivationSource::Shortcut,
            (Detection::None, Detection::Activate) => ActivationSource::DoublePress,
            (Detection::None, Detection::None) => return None,
        };

        Some(Activation::new(self.channel.clone(), source))
    }

    async fn dispatch(&self, activation: Activation) {
        info!("Активация: {}", activation);

        // Без повторов: сбой канала только логируется
        match self.sink.invoke(&activation).await {
            Ok(()) => {
                self.activations.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                error!("Канал '{}' не принял вызов {}: {}", self.sink.name(), activation, e);
            }
        }
    }

    async fn consume(self: Arc<Self>, mut events: mpsc::Receiver<KeyEvent>) {
        while let Some(event) = events.recv().await {
            debug_if_enabled!("Обработка события клавиши: {}", event);
            if let Some(activation) = self.process_event(&event) {
                self.dispatch(activation).await;
            }
        }
        info!("Поток событий клавиатуры закрыт");
    }
}

/// Связывает источник событий, детектор и канал активации.
/// Владелец вызывает `start` при запуске и `stop` при завершении.
pub struct HotkeyService {
    dispatcher: Arc<Dispatcher>,
    listener: Box<dyn KeyboardListenerTrait>,
    consumer: Option<JoinHandle<()>>,
}

impl HotkeyService {
    pub fn new(
        config: Arc<Config>,
        listener: Box<dyn KeyboardListenerTrait>,
        sink: Box<dyn ActivationSinkTrait>,
    ) -> Result<Self> {
        let target = config
            .hotkey_target()
            .map_err(|e| ActivatorError::Config(format!("{:#}", e)))?;
        let detector = DoublePressDetector::new(target, config.double_press_window())?;

        let shortcut = if config.shortcut.enabled {
            let target = config
                .shortcut_target()
                .map_err(|e| ActivatorError::Config(format!("{:#}", e)))?;
            Some(ShortcutMatcher::new(target))
        } else {
            None
        };

        info!(
            "Инициализация HotkeyService: двойное {} за {}мс, шорткат {}, канал '{}' ({})",
            target,
            config.hotkey.window_ms,
            shortcut
                .map(|s| s.target().to_string())
                .unwrap_or_else(|| "выключен".to_string()),
            config.channel_name(),
            sink.name()
        );

        Ok(Self {
            dispatcher: Arc::new(Dispatcher {
                channel: config.channel_name(),
                detector: Mutex::new(detector),
                shortcut,
                sink,
                activations: AtomicU64::new(0),
            }),
            listener,
            consumer: None,
        })
    }

    pub fn start(&mut self) -> Result<()> {
        if self.consumer.is_some() {
            return Err(ActivatorError::AlreadyRunning("HotkeyService".to_string()));
        }

        let (tx, rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);
        self.listener.start(tx)?;
        self.consumer = Some(tokio::spawn(self.dispatcher.clone().consume(rx)));

        info!("HotkeyService запущен");
        Ok(())
    }

    /// После возврата канал активации больше не вызывается
    pub async fn stop(&mut self) {
        let Some(mut consumer) = self.consumer.take() else {
            return;
        };

        self.listener.stop().await;

        // Все отправители закрыты: потребитель дочитывает очередь и завершается
        match tokio::time::timeout(SHUTDOWN_TIMEOUT, &mut consumer).await {
            Ok(_) => info!("HotkeyService остановлен"),
            Err(_) => {
                warn!("Таймаут при остановке HotkeyService, прерываем обработку");
                consumer.abort();
                let _ = consumer.await;
            }
        }
    }

    #[allow(dead_code)]
    pub fn is_running(&self) -> bool {
        self.consumer.is_some()
    }

    #[allow(dead_code)]
    pub fn process_event(&self, event: &KeyEvent) -> Option<Activation> {
        self.dispatcher.process_event(event)
    }

    pub fn activations(&self) -> u64 {
        self.dispatcher.activations.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{KeyCode, Modifiers};
    use std::time::Instant;

    /// Канал, запоминающий все вызовы
    #[derive(Clone, Default)]
    struct RecordingSink {
        calls: Arc<Mutex<Vec<Activation>>>,
    }

    #[async_trait::async_trait]
    impl ActivationSinkTrait for RecordingSink {
        async fn invoke(&self, activation: &Activation) -> Result<()> {
            self.calls.lock().push(activation.clone());
            Ok(())
        }

        fn name(&self) -> &'static str {
            "recording"
        }
    }

    /// Канал, который запоминает вызов и всегда возвращает ошибку
    #[derive(Clone, Default)]
    struct FailingSink {
        calls: Arc<Mutex<Vec<Activation>>>,
    }

    #[async_trait::async_trait]
    impl ActivationSinkTrait for FailingSink {
        async fn invoke(&self, activation: &Activation) -> Result<()> {
            self.calls.lock().push(activation.clone());
            Err(ActivatorError::Sink("нет соединения".to_string()))
        }

        fn name(&self) -> &'static str {
            "failing"
        }
    }

    /// Источник, отдающий отправитель тесту: события подаются по ходу теста
    struct ManualListener {
        sender: Arc<Mutex<Option<mpsc::Sender<KeyEvent>>>>,
    }

    #[async_trait::async_trait]
    impl KeyboardListenerTrait for ManualListener {
        fn start(&mut self, events: mpsc::Sender<KeyEvent>) -> Result<()> {
            *self.sender.lock() = Some(events);
            Ok(())
        }

        async fn stop(&mut self) {
            self.sender.lock().take();
        }

        fn is_running(&self) -> bool {
            self.sender.lock().is_some()
        }
    }

    /// Источник, отдающий заранее заданные события
    struct ScriptedListener {
        events: Vec<KeyEvent>,
        running: bool,
    }

    #[async_trait::async_trait]
    impl KeyboardListenerTrait for ScriptedListener {
        fn start(&mut self, events: mpsc::Sender<KeyEvent>) -> Result<()> {
            for event in self.events.drain(..) {
                events.try_send(event).unwrap();
            }
            self.running = true;
            Ok(())
        }

        async fn stop(&mut self) {
            self.running = false;
        }

        fn is_running(&self) -> bool {
            self.running
        }
    }

    fn cmd() -> Modifiers {
        Modifiers::new().with_command(true)
    }

    fn key(base: Instant, at_ms: u64, code: u16, modifiers: Modifiers, state: KeyState) -> KeyEvent {
        KeyEvent::at(
            KeyCode::new(code),
            state,
            modifiers,
            base + Duration::from_millis(at_ms),
            "test".to_string(),
        )
    }

    fn service(events: Vec<KeyEvent>, sink: RecordingSink) -> HotkeyService {
        HotkeyService::new(
            Arc::new(Config::default()),
            Box::new(ScriptedListener { events, running: false }),
            Box::new(sink),
        )
        .unwrap()
    }

    #[test]
    fn test_double_press_produces_activation() {
        let base = Instant::now();
        let service = service(Vec::new(), RecordingSink::default());

        assert_eq!(service.process_event(&key(base, 0, 8, cmd(), KeyState::Pressed)), None);
        let activation = service
            .process_event(&key(base, 300, 8, cmd(), KeyState::Pressed))
            .unwrap();

        assert_eq!(activation.channel, "com.example.deep_gptl/activate");
        assert_eq!(activation.method, "activate");
        assert_eq!(activation.source, ActivationSource::DoublePress);
    }

    #[test]
    fn test_shortcut_activates_on_single_press() {
        let base = Instant::now();
        let service = service(Vec::new(), RecordingSink::default());
        let cmd_shift = cmd().with_shift(true);

        let activation = service
            .process_event(&key(base, 0, 34, cmd_shift, KeyState::Pressed))
            .unwrap();
        assert_eq!(activation.source, ActivationSource::Shortcut);
    }

    #[test]
    fn test_repeat_and_release_are_ignored() {
        let base = Instant::now();
        let service = service(Vec::new(), RecordingSink::default());

        assert_eq!(service.process_event(&key(base, 0, 8, cmd(), KeyState::Pressed)), None);
        assert_eq!(service.process_event(&key(base, 50, 8, cmd(), KeyState::Repeat)), None);
        assert_eq!(service.process_event(&key(base, 80, 8, cmd(), KeyState::Released)), None);
        assert!(service
            .process_event(&key(base, 100, 8, cmd(), KeyState::Pressed))
            .is_some());
    }

    #[test]
    fn test_disabled_shortcut_does_nothing() {
        let base = Instant::now();
        let mut config = Config::default();
        config.shortcut.enabled = false;
        let service = HotkeyService::new(
            Arc::new(config),
            Box::new(ScriptedListener { events: Vec::new(), running: false }),
            Box::new(RecordingSink::default()),
        )
        .unwrap();

        let cmd_shift = cmd().with_shift(true);
        assert_eq!(service.process_event(&key(base, 0, 34, cmd_shift, KeyState::Pressed)), None);
    }

    #[tokio::test]
    async fn test_start_stop_delivers_to_sink() {
        let base = Instant::now();
        let sink = RecordingSink::default();
        let events = vec![
            key(base, 0, 8, cmd(), KeyState::Pressed),
            key(base, 200, 8, cmd(), KeyState::Pressed),
            key(base, 300, 8, cmd(), KeyState::Pressed),
            key(base, 400, 9, cmd(), KeyState::Pressed),
            key(base, 2_000, 8, cmd(), KeyState::Pressed),
        ];
        let mut service = service(events, sink.clone());

        service.start().unwrap();
        assert!(service.is_running());
        service.stop().await;
        assert!(!service.is_running());

        let calls = sink.calls.lock();
        assert_eq!(calls.len(), 2);
        assert!(calls.iter().all(|a| a.source == ActivationSource::DoublePress));
        assert_eq!(service.activations(), 2);
    }

    #[tokio::test]
    async fn test_double_start_rejected_and_stop_idempotent() {
        let mut service = service(Vec::new(), RecordingSink::default());

        service.start().unwrap();
        assert!(matches!(service.start(), Err(ActivatorError::AlreadyRunning(_))));

        service.stop().await;
        service.stop().await;
        assert!(!service.is_running());
    }

    #[tokio::test]
    async fn test_sink_failure_is_logged_and_processing_continues() {
        let base = Instant::now();
        let sink = FailingSink::default();
        let sender = Arc::new(Mutex::new(None));
        let mut service = HotkeyService::new(
            Arc::new(Config::default()),
            Box::new(ManualListener { sender: sender.clone() }),
            Box::new(sink.clone()),
        )
        .unwrap();

        service.start().unwrap();
        let tx = sender.lock().clone().unwrap();

        tx.send(key(base, 0, 8, cmd(), KeyState::Pressed)).await.unwrap();
        tx.send(key(base, 100, 8, cmd(), KeyState::Pressed)).await.unwrap();

        tokio::time::timeout(Duration::from_secs(1), async {
            while sink.calls.lock().len() < 1 {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();

        // После ошибки канала потребитель продолжает работать
        assert!(service.consumer.as_ref().is_some_and(|c| !c.is_finished()));
        assert_eq!(service.activations(), 0);

        tx.send(key(base, 1_000, 8, cmd(), KeyState::Pressed)).await.unwrap();
        tx.send(key(base, 1_100, 8, cmd(), KeyState::Pressed)).await.unwrap();
        drop(tx);

        service.stop().await;

        assert_eq!(sink.calls.lock().len(), 2);
        assert_eq!(service.activations(), 0);
    }

    #[tokio::test]
    async fn test_activations_count_only_delivered_calls() {
        let base = Instant::now();
        let sink = RecordingSink::default();
        let events = vec![
            key(base, 0, 8, cmd(), KeyState::Pressed),
            key(base, 100, 8, cmd(), KeyState::Pressed),
        ];
        let mut service = service(events, sink.clone());

        service.start().unwrap();
        service.stop().await;

        assert_eq!(sink.calls.lock().len(), 1);
        assert_eq!(service.activations(), 1);
    }
}
