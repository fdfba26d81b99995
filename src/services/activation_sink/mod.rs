//! Канал активации: доставка вызова `activate` в UI-слой.
//!
//! Гарантии доставки (порядок, at-most-once) принадлежат принимающей стороне,
//! здесь только одна попытка отправки без повторов.

mod log_sink;
#[cfg(unix)]
mod socket_sink;
mod r#trait;

pub use self::r#trait::{create_activation_sink, ActivationSinkTrait};
