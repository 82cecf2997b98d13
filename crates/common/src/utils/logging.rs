use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::Level;
use tracing_subscriber::fmt::{self, writer::MakeWriterExt, MakeWriter};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Layer, Registry};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// Receives `INFO` events when file output is on.
pub const INFO_LOG_FILE: &str = "info.log";
/// Receives `WARN` and `ERROR` events when file output is on.
pub const ERROR_LOG_FILE: &str = "errors.log";

/// Console and file output, usually filled from the `[logger]` config section.
#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    /// Filter used when `RUST_LOG` is unset.
    pub filter: String,
    pub json: bool,
    /// ANSI colours on compact console output.
    pub colors: bool,
    /// Directory for [`INFO_LOG_FILE`] and [`ERROR_LOG_FILE`]; `None` keeps logs on stdout only.
    pub log_dir: Option<PathBuf>,
}

/// Initialize tracing subscriber with compact human-readable output.
/// - Respects `RUST_LOG` if set
/// - Falls back to `default_filter` (usually the configured `logger.level`)
/// - Writes to stdout to improve visibility in environments that hide stderr
pub fn init_logging_default(default_filter: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .with_writer(io::stdout)
        .try_init();
}

/// Initialize tracing with console output plus the optional log files.
///
/// Fails only when the log directory or files cannot be opened. A subscriber
/// that is already installed is left in place.
pub fn init_logging(opts: &LogOptions) -> io::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&opts.filter));

    let mut layers: Vec<BoxedLayer> = Vec::new();
    if opts.json {
        layers.push(fmt::layer().with_target(true).json().with_writer(io::stdout).boxed());
    } else {
        layers.push(compact_layer(opts.colors, io::stdout));
    }
    if let Some(dir) = opts.log_dir.as_deref() {
        layers.push(file_layer(dir)?);
    }

    let _ = tracing_subscriber::registry().with(layers).with(env_filter).try_init();
    Ok(())
}

fn compact_layer<W>(colors: bool, writer: W) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    fmt::layer().with_target(false).compact().with_ansi(colors).with_writer(writer).boxed()
}

/// Appends plain-text lines: `INFO` to [`INFO_LOG_FILE`], `WARN`/`ERROR` to [`ERROR_LOG_FILE`].
fn file_layer(dir: &Path) -> io::Result<BoxedLayer> {
    std::fs::create_dir_all(dir)?;
    let open = |name: &str| OpenOptions::new().create(true).append(true).open(dir.join(name));
    let info = Mutex::new(open(INFO_LOG_FILE)?);
    let errors = Mutex::new(open(ERROR_LOG_FILE)?);

    let writer = info
        .with_min_level(Level::INFO)
        .with_max_level(Level::INFO)
        .and(errors.with_max_level(Level::WARN));
    Ok(fmt::layer().with_ansi(false).with_target(false).with_writer(writer).boxed())
}

/// Build the default filter directive for a bare level such as `warn`.
///
/// HTTP request tracing stays at `info` so access lines survive a quiet level.
pub fn default_directive(level: &str) -> String {
    format!("{level},tower_http=info")
}
