mod dry_keyboard_listener;
#[cfg(target_os = "macos")]
mod keyboard_listener;
#[cfg_attr(not(target_os = "macos"), allow(dead_code))]
mod modifier_state;
mod r#trait;

pub use self::r#trait::{create_keyboard_listener, KeyboardListenerTrait};
