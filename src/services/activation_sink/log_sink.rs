use crate::error::Result;
use crate::events::Activation;
use tracing::info;

use super::r#trait::ActivationSinkTrait;

/// Канал без доставки: только пишет вызов в лог
#[derive(Debug, Default)]
pub struct LogSink;

impl LogSink {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl ActivationSinkTrait for LogSink {
    async fn invoke(&self, activation: &Activation) -> Result<()> {
        info!("[LOG SINK] Вызов {}", activation);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
