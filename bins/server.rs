use std::path::PathBuf;

use common::utils::logging::{default_directive, LogOptions};
use configs::{AppConfig, LogFormat};
use dotenvy::dotenv;
use tracing::{error, info};
use uuid::Uuid;

fn init_logging(cfg: &AppConfig) -> std::io::Result<()> {
    let opts = LogOptions {
        filter: default_directive(&cfg.logger.level),
        json: cfg.logger.format == LogFormat::Json,
        colors: cfg.logger.colors,
        log_dir: cfg.logger.log_to_file.then(|| PathBuf::from(&cfg.logger.log_dir)),
    };
    common::utils::logging::init_logging(&opts)?;
    info!(
        service = "server",
        event = "logger_init",
        level = %cfg.logger.level,
        to_file = cfg.logger.log_to_file,
        "tracing subscriber initialized"
    );
    Ok(())
}

fn main() -> std::process::ExitCode {
    // load .env before reading config so overrides apply
    dotenv().ok();

    let cfg = match AppConfig::load_and_validate() {
        Ok(cfg) => cfg,
        Err(e) => {
            common::utils::logging::init_logging_default("warn");
            error!(service = "server", event = "config_invalid", error = %e, "cannot load configuration");
            return std::process::ExitCode::FAILURE;
        }
    };
    if let Err(e) = init_logging(&cfg) {
        common::utils::logging::init_logging_default("warn");
        error!(service = "server", event = "logger_init_failed", dir = %cfg.logger.log_dir, error = %e, "cannot open log files");
        return std::process::ExitCode::FAILURE;
    }

    let service_id = Uuid::new_v4();
    let pid = std::process::id();
    let version = env!("CARGO_PKG_VERSION");

    std::panic::set_hook(Box::new(move |info| {
        error!(
            service = "server",
            event = "panic",
            %service_id,
            pid,
            message = %info,
            "unhandled panic occurred"
        );
    }));

    let worker_threads = cfg.server.worker_threads;
    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();
    if let Some(w) = worker_threads { builder.worker_threads(w); }

    let rt = match builder.build() {
        Ok(rt) => rt,
        Err(e) => {
            error!(service = "server", event = "runtime_build_failed", error = %e, "failed to build tokio runtime");
            return std::process::ExitCode::FAILURE;
        }
    };

    info!(
        service = "server",
        event = "start",
        %service_id,
        pid,
        version,
        threads = worker_threads.unwrap_or_default(),
        storage = cfg.storage.source.as_str(),
        "server service starting"
    );

    // server::run returns after a shutdown signal, once storage has been disposed
    rt.block_on(async move {
        match server::run(cfg).await {
            Ok(()) => {
                info!(service = "server", event = "stop", %service_id, pid, "server stopped normally");
                std::process::ExitCode::SUCCESS
            }
            Err(e) => {
                error!(service = "server", event = "run_failed", error = %e, "server::run returned error");
                std::process::ExitCode::FAILURE
            }
        }
    })
}
