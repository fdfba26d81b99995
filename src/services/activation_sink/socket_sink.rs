use crate::activator_error;
use crate::error::Result;
use crate::events::Activation;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::UnixStream;
use tokio::time::timeout;
use tracing::debug;

use super::r#trait::ActivationSinkTrait;

/// Доставляет вызов в UI-слой через Unix-сокет: одно соединение на вызов,
/// одна JSON-строка, ответ не читается.
pub struct SocketSink {
    socket_path: PathBuf,
    connect_timeout: Duration,
}

impl SocketSink {
    pub fn new(socket_path: PathBuf, connect_timeout: Duration) -> Self {
        Self {
            socket_path,
            connect_timeout,
        }
    }

    async fn connect(&self) -> Result<UnixStream> {
        match timeout(self.connect_timeout, UnixStream::connect(&self.socket_path)).await {
            Ok(Ok(stream)) => Ok(stream),
            Ok(Err(e)) => Err(activator_error!(
                sink,
                "Не удалось подключиться к {}: {}",
                self.socket_path.display(),
                e
            )),
            Err(_) => Err(activator_error!(
                sink,
                "Таймаут подключения к {} ({}мс)",
                self.socket_path.display(),
                self.connect_timeout.as_millis()
            )),
        }
    }
}

#[async_trait::async_trait]
impl ActivationSinkTrait for SocketSink {
    async fn invoke(&self, activation: &Activation) -> Result<()> {
        let mut line = serde_json::to_vec(&activation.to_message())?;
        line.push(b'\n');

        let mut stream = self.connect().await?;
        stream.write_all(&line).await?;
        stream.shutdown().await?;

        debug!("Вызов {} отправлен в {}", activation, self.socket_path.display());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "socket"
    }
}
