pub mod activation;
pub mod keyboard;

pub use activation::{Activation, ActivationMessage, ActivationSource};
pub use keyboard::{KeyCode, KeyEvent, KeyState, Modifiers};
