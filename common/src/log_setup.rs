use std::path::PathBuf;
use std::sync::OnceLock;

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

#[derive(Debug, thiserror::Error)]
pub enum LogSetupError {
    #[error("Invalid log filter: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),
    #[error("Failed to create log directory {path:?}: {source}")]
    Directory {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to create log file appender: {0}")]
    Appender(#[from] tracing_appender::rolling::InitError),
    #[error("Logging already initialized")]
    AlreadyInitialized,
}

/// Where log lines go. Console output is limited to warnings and errors;
/// the rolling file, when enabled, receives everything the filter lets through.
#[derive(Clone, Debug)]
pub struct LogOptions {
    pub base_level: String,
    pub file: Option<LogFile>,
}

#[derive(Clone, Debug)]
pub struct LogFile {
    pub directory: PathBuf,
    pub prefix: String,
    pub max_files: usize,
}

impl LogOptions {
    pub fn console(base_level: &str) -> Self {
        Self {
            base_level: base_level.to_string(),
            file: None,
        }
    }

    pub fn with_file(mut self, directory: impl Into<PathBuf>, prefix: &str) -> Self {
        self.file = Some(LogFile {
            directory: directory.into(),
            prefix: prefix.to_string(),
            max_files: 5,
        });
        self
    }
}

/// Installs the global subscriber. `RUST_LOG` takes precedence over `base_level`.
pub fn setup_logging(options: &LogOptions) -> Result<(), LogSetupError> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&options.base_level)?,
    };

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(true)
        .with_writer(std::io::stderr.with_max_level(Level::WARN));

    let file_layer = match &options.file {
        Some(file) => {
            std::fs::create_dir_all(&file.directory).map_err(|source| {
                LogSetupError::Directory {
                    path: file.directory.clone(),
                    source,
                }
            })?;

            let appender = tracing_appender::rolling::Builder::new()
                .rotation(tracing_appender::rolling::Rotation::DAILY)
                .filename_prefix(&file.prefix)
                .filename_suffix("log")
                .max_log_files(file.max_files)
                .build(&file.directory)?;

            let (writer, guard) = tracing_appender::non_blocking(appender);
            LOG_GUARD
                .set(guard)
                .map_err(|_| LogSetupError::AlreadyInitialized)?;

            Some(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_line_number(true)
                    .with_file(true)
                    .with_ansi(false)
                    .with_writer(writer)
                    .boxed(),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|_| LogSetupError::AlreadyInitialized)
}
