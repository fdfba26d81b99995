use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
mod config;
mod error;
mod events;
mod mappings;
mod services;
mod utils;

use config::Config;
use services::{create_activation_sink, create_keyboard_listener, HotkeyService};
use utils::permissions::{check_permissions, PermissionStatus};

#[derive(Parser, Debug)]
#[command(name = "gptl-activator")]
#[command(about = "Активирует UI приложения по двойному нажатию Cmd+C")]
struct Args {
    /// Путь к файлу конфигурации
    #[arg(short, long, default_value = "activator.toml")]
    config: String,

    /// Режим сухого запуска (эмуляция нажатий, вызовы только в лог)
    #[arg(long)]
    dry_run: bool,

    /// Уровень логирования (по умолчанию из конфигурации)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Загрузка конфигурации до логирования: уровень и формат берутся из неё
    let config = Arc::new(Config::load(&args.config)?);

    // Инициализация системы логирования
    let level = args.log_level.as_deref().unwrap_or(&config.logging.level);
    init_tracing(level, &config.logging.format)?;

    info!("Запуск GPTL Activator v{}", env!("CARGO_PKG_VERSION"));
    info!("Конфигурация загружена из: {}", args.config);

    if args.dry_run {
        warn!("Режим сухого запуска - нажатия эмулируются, вызовы только пишутся в лог");
    } else {
        // Проверка прав доступа: без них события просто не приходят
        if check_permissions(config.permissions.prompt)? == PermissionStatus::Denied {
            warn!("Перехватчик будет запущен, но не получит событий до выдачи доступа");
        }
    }

    // Инициализация компонентов
    let listener = create_keyboard_listener(config.clone(), args.dry_run)?;
    let sink = create_activation_sink(&config, args.dry_run)?;
    let mut service = HotkeyService::new(config.clone(), listener, sink)?;

    service.start()?;
    info!("Все сервисы запущены");

    // Ожидание сигнала завершения
    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Получен сигнал завершения (Ctrl+C)");
        }
        Err(err) => {
            error!("Ошибка при ожидании сигнала завершения: {}", err);
        }
    }

    info!("Завершение работы...");
    service.stop().await;

    info!(
        "GPTL Activator завершил работу, активаций: {}",
        service.activations()
    );
    Ok(())
}

fn init_tracing(level: &str, format: &str) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))?;

    let registry = tracing_subscriber::registry().with(filter);

    if format == "compact" {
        registry.with(tracing_subscriber::fmt::layer().compact()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    Ok(())
}
