pub mod key_name_to_mac_keycode;

pub use key_name_to_mac_keycode::KeyNameToMacKeyCode;
