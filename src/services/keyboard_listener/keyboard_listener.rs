//! Глобальный перехват нажатий через CGEventTap.
//!
//! Tap живёт на отдельном потоке со своим CFRunLoop и только слушает
//! (ListenOnly): события не изменяются и не поглощаются.

use crate::activator_error;
use crate::config::Config;
use crate::error::{ActivatorError, Result};
use crate::events::{KeyCode, KeyEvent, KeyState};
use crate::mappings::KeyNameToMacKeyCode;
use crate::debug_if_enabled;
use core_foundation::runloop::{kCFRunLoopCommonModes, kCFRunLoopDefaultMode, CFRunLoop};
use core_graphics::event::{
    CGEvent, CGEventTap, CGEventTapLocation, CGEventTapOptions, CGEventTapPlacement,
    CGEventTapProxy, CGEventType, EventField,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tokio::runtime::RuntimeFlavor;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use super::modifier_state::ModifierState;
use super::r#trait::KeyboardListenerTrait;

const SOURCE: &str = "cg-event-tap";
const RUN_LOOP_SLICE: Duration = Duration::from_millis(100);

pub struct MacKeyboardListener {
    config: Arc<Config>,
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl MacKeyboardListener {
    pub fn new(config: Arc<Config>) -> Self {
        info!("Инициализация MacKeyboardListener");
        Self {
            config,
            running: Arc::new(AtomicBool::new(false)),
            thread: None,
        }
    }

    fn run_event_loop(
        events: mpsc::Sender<KeyEvent>,
        running: Arc<AtomicBool>,
        ready: std::sync::mpsc::Sender<Result<()>>,
    ) {
        // Tap выключается системой при долгом callback или вводе пароля
        let tap_disabled = Arc::new(AtomicBool::new(false));
        let tap_disabled_cb = tap_disabled.clone();

        let callback = move |_proxy: CGEventTapProxy, event_type: CGEventType, event: &CGEvent| {
            match event_type {
                CGEventType::KeyDown => {
                    let key_event = Self::to_key_event(event);
                    debug_if_enabled!("Событие клавиши: {}", key_event);
                    if let Err(e) = events.try_send(key_event) {
                        warn!("Событие клавиши потеряно: {}", e);
                    }
                }
                CGEventType::TapDisabledByTimeout | CGEventType::TapDisabledByUserInput => {
                    tap_disabled_cb.store(true, Ordering::SeqCst);
                }
                _ => {}
            }
            Some(event.clone())
        };

        let tap = match CGEventTap::new(
            CGEventTapLocation::Session,
            CGEventTapPlacement::HeadInsertEventTap,
            CGEventTapOptions::ListenOnly,
            vec![CGEventType::KeyDown],
            callback,
        ) {
            Ok(tap) => tap,
            Err(()) => {
                let _ = ready.send(Err(activator_error!(
                    permission,
                    "Не удалось создать CGEventTap - проверьте доступ в Privacy & Security > Accessibility"
                )));
                return;
            }
        };

        let source = match tap.mach_port.create_runloop_source(0) {
            Ok(source) => source,
            Err(()) => {
                let _ = ready.send(Err(activator_error!(
                    event_source,
                    "Не удалось создать источник CFRunLoop для CGEventTap"
                )));
                return;
            }
        };

        let run_loop = CFRunLoop::get_current();
        unsafe {
            run_loop.add_source(&source, kCFRunLoopCommonModes);
        }
        tap.enable();
        let _ = ready.send(Ok(()));
        info!("CGEventTap создан и включён");

        while running.load(Ordering::SeqCst) {
            CFRunLoop::run_in_mode(unsafe { kCFRunLoopDefaultMode }, RUN_LOOP_SLICE, true);

            if tap_disabled.swap(false, Ordering::SeqCst) {
                warn!("CGEventTap отключён системой, включаем повторно");
                tap.enable();
            }
        }

        unsafe {
            run_loop.remove_source(&source, kCFRunLoopCommonModes);
        }
        info!("CGEventTap остановлен");
    }

    fn to_key_event(event: &CGEvent) -> KeyEvent {
        let key_code = event.get_integer_value_field(EventField::KEYBOARD_EVENT_KEYCODE) as u16;
        let autorepeat = event.get_integer_value_field(EventField::KEYBOARD_EVENT_AUTOREPEAT) != 0;
        let modifiers = ModifierState::from_flags(event.get_flags().bits()).to_modifiers();
        // Автоповтор помечается отдельно, детектор считает только отдельные нажатия
        let state = if autorepeat { KeyState::Repeat } else { KeyState::Pressed };

        debug_if_enabled!(
            "Клавиша {} ({})",
            KeyNameToMacKeyCode::reverse_translate(key_code).unwrap_or("unknown"),
            key_code
        );

        KeyEvent::new(KeyCode::new(key_code), state, modifiers, SOURCE.to_string())
    }
}

#[async_trait::async_trait]
impl KeyboardListenerTrait for MacKeyboardListener {
    fn start(&mut self, events: mpsc::Sender<KeyEvent>) -> Result<()> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(ActivatorError::AlreadyRunning(
                "MacKeyboardListener".to_string(),
            ));
        }

        info!(
            "Запуск глобального перехвата клавиатуры (цель: {} + {:?})",
            self.config.hotkey.key, self.config.hotkey.modifiers
        );

        let running = self.running.clone();
        let (ready_tx, ready_rx) = std::sync::mpsc::channel();

        let handle = thread::Builder::new()
            .name("keyboard-listener".to_string())
            .spawn(move || Self::run_event_loop(events, running, ready_tx))
            .map_err(|e| {
                self.running.store(false, Ordering::SeqCst);
                activator_error!(internal, "Не удалось запустить поток перехвата: {}", e)
            })?;

        // Ожидание создания tap не должно занимать рабочий поток tokio
        let ready = match tokio::runtime::Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| ready_rx.recv())
            }
            _ => ready_rx.recv(),
        };

        match ready {
            Ok(Ok(())) => {
                self.thread = Some(handle);
                Ok(())
            }
            Ok(Err(e)) => {
                self.running.store(false, Ordering::SeqCst);
                let _ = handle.join();
                Err(e)
            }
            Err(_) => {
                self.running.store(false, Ordering::SeqCst);
                let _ = handle.join();
                Err(activator_error!(
                    event_source,
                    "Поток перехвата завершился до создания CGEventTap"
                ))
            }
        }
    }

    async fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);

        if let Some(handle) = self.thread.take() {
            // Поток выходит после текущего среза run loop; после join отправителей нет
            match tokio::task::spawn_blocking(move || handle.join()).await {
                Ok(Ok(())) => info!("MacKeyboardListener остановлен"),
                Ok(Err(_)) => error!("Поток перехвата клавиатуры завершился с паникой"),
                Err(e) => error!("Не удалось дождаться потока перехвата: {}", e),
            }
        }
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Drop for MacKeyboardListener {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }
}
