use std::{path::Path, sync::LazyLock};

use anyhow::Result;
use tracing::level_filters::LevelFilter;
use tracing_appender::rolling::Rotation;
use tracing_subscriber::{
    fmt::{format::FmtSpan, writer::MakeWriterExt},
    EnvFilter,
};

pub const LOG_FILE_PREFIX: &str = "daybrief";
const DEFAULT_LEVEL: &str = "info";

/// How much the dashboard logs and whether log lines also reach the terminal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogSettings {
    /// Takes precedence over `RUST_LOG`.
    pub level: Option<LevelFilter>,
    /// Copies log lines to stderr. Stdout is left to the dashboard and `export`.
    pub echo: bool,
}

impl LogSettings {
    /// Everything, mirrored to stderr. Used by `--log`.
    pub fn verbose() -> Self {
        Self {
            level: Some(LevelFilter::TRACE),
            echo: true,
        }
    }

    /// Filter scoped to this crate. A `RUST_LOG` value that already names targets is kept whole.
    fn directive(&self, env_value: Option<&str>) -> String {
        let crate_target = env!("CARGO_PKG_NAME").replace('-', "_");
        match (self.level, env_value.map(str::trim)) {
            (Some(level), _) => format!("{crate_target}={level}"),
            (None, Some(value)) if value.contains('=') => value.to_owned(),
            (None, Some(value)) if !value.is_empty() => format!("{crate_target}={value}"),
            (None, _) => format!("{crate_target}={DEFAULT_LEVEL}"),
        }
    }
}

/// Writes daily rotated files under `application_data_path/logs`, keeping the last week.
pub fn enable_logging(application_data_path: &Path, settings: &LogSettings) -> Result<()> {
    let files = tracing_appender::rolling::Builder::new()
        .rotation(Rotation::DAILY)
        .max_log_files(7)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix("log")
        .build(application_data_path.join("logs"))?;

    let echo = settings.echo;
    let stderr = std::io::stderr.with_filter(move |_| echo);

    let directive = settings.directive(std::env::var("RUST_LOG").ok().as_deref());

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(directive)?)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(stderr.and(files))
        .pretty()
        .init();
    Ok(())
}

pub static TEST_LOGGING: LazyLock<()> = LazyLock::new(|| {
    tracing_subscriber::fmt()
        .with_max_level(LevelFilter::TRACE)
        .with_test_writer()
        .pretty()
        .init()
});
