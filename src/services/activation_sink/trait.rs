use crate::config::Config;
use crate::error::Result;
use crate::events::Activation;

/// Trait for the channel that carries `activate` calls to the UI layer
#[async_trait::async_trait]
pub trait ActivationSinkTrait: Send + Sync {
    /// Fire-and-forget: the caller logs the error and moves on
    async fn invoke(&self, activation: &Activation) -> Result<()>;

    fn name(&self) -> &'static str;
}

/// Factory function to create the configured sink; dry-run always logs
pub fn create_activation_sink(
    config: &Config,
    dry_run: bool,
) -> Result<Box<dyn ActivationSinkTrait>> {
    if dry_run || config.activation.sink == "log" {
        return Ok(Box::new(super::log_sink::LogSink::new()));
    }

    #[cfg(unix)]
    {
        Ok(Box::new(super::socket_sink::SocketSink::new(
            config.activation.socket_path.clone(),
            std::time::Duration::from_millis(config.activation.connect_timeout_ms),
        )))
    }

    #[cfg(not(unix))]
    {
        Err(crate::activator_error!(
            service_unavailable,
            "Канал активации '{}' недоступен на этой платформе",
            config.activation.sink
        ))
    }
}
