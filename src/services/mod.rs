pub mod activation_sink;
pub mod double_press;
pub mod hotkey_service;
pub mod keyboard_listener;

pub use activation_sink::create_activation_sink;
pub use hotkey_service::HotkeyService;
pub use keyboard_listener::create_keyboard_listener;
