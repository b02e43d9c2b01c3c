//! Tracing subscriber setup shared by ProTherm binaries
//!
//! Console output goes to stderr so stdout stays free for command results.
//! File output rolls daily under [`LogConfig::dir`].
//!
//! Environment overrides, applied by [`LogConfig::merge_env`]:
//!
//! | Variable | Values |
//! |---|---|
//! | `LOG_LEVEL` | trace, debug, info, warn, error |
//! | `LOG_OUTPUT` | console (or stderr), file, both |
//! | `LOG_FORMAT` | text, json |
//! | `LOG_DIR` | directory for rolling log files |
//! | `LOG_FILE_PREFIX` | log file name prefix |
//! | `LOG_FILTER` | extra directives, e.g. `reqwest=warn,hyper=off` |
//!
//! `RUST_LOG`, when set, replaces the base level.
//!
//! # Example
//!
//! ```no_run
//! use protherm_common::logging::{init_logging, LogConfig};
//! use tracing::Level;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = LogConfig::new(Level::DEBUG).with_file_prefix("my-tool").merge_env()?;
//!     let _guard = init_logging(&config)?;
//!     tracing::info!("ready");
//!     Ok(())
//! }
//! ```

use anyhow::{bail, Context, Result};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    filter::LevelFilter,
    fmt::{self, MakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Where log lines are written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogOutput {
    #[default]
    Console,
    File,
    Both,
}

impl LogOutput {
    fn console(self) -> bool {
        matches!(self, LogOutput::Console | LogOutput::Both)
    }

    fn file(self) -> bool {
        matches!(self, LogOutput::File | LogOutput::Both)
    }
}

impl FromStr for LogOutput {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "console" | "stderr" => LogOutput::Console,
            "file" => LogOutput::File,
            "both" => LogOutput::Both,
            other => bail!("unknown log output '{}'", other),
        })
    }
}

/// Line format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    /// One JSON object per event, fields flattened
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "text" => LogFormat::Text,
            "json" => LogFormat::Json,
            other => bail!("unknown log format '{}'", other),
        })
    }
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: Level,
    pub output: LogOutput,
    pub format: LogFormat,
    pub dir: PathBuf,
    pub file_prefix: String,
    /// Extra comma-separated `EnvFilter` directives
    pub directives: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::new(Level::INFO)
    }
}

impl LogConfig {
    /// Console text logging at `level`
    pub fn new(level: Level) -> Self {
        Self {
            level,
            output: LogOutput::Console,
            format: LogFormat::Text,
            dir: PathBuf::from("logs"),
            file_prefix: "protherm".to_string(),
            directives: None,
        }
    }

    pub fn with_output(mut self, output: LogOutput) -> Self {
        self.output = output;
        self
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = dir.into();
        self
    }

    pub fn with_file_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.file_prefix = prefix.into();
        self
    }

    pub fn with_directives(mut self, directives: impl Into<String>) -> Self {
        self.directives = Some(directives.into());
        self
    }

    /// Defaults overridden by the `LOG_*` environment
    pub fn from_env() -> Result<Self> {
        Self::default().merge_env()
    }

    /// Override fields with any `LOG_*` variables that are set and non-blank
    pub fn merge_env(mut self) -> Result<Self> {
        if let Some(level) = env("LOG_LEVEL") {
            self.level = level.parse().with_context(|| format!("LOG_LEVEL={}", level))?;
        }
        if let Some(output) = env("LOG_OUTPUT") {
            self.output = output.parse()?;
        }
        if let Some(format) = env("LOG_FORMAT") {
            self.format = format.parse()?;
        }
        if let Some(dir) = env("LOG_DIR") {
            self.dir = PathBuf::from(dir);
        }
        if let Some(prefix) = env("LOG_FILE_PREFIX") {
            self.file_prefix = prefix;
        }
        if let Some(directives) = env("LOG_FILTER") {
            self.directives = Some(directives);
        }
        Ok(self)
    }

    fn filter(&self) -> Result<EnvFilter> {
        let mut filter = EnvFilter::builder()
            .with_default_directive(LevelFilter::from_level(self.level).into())
            .from_env_lossy();

        let extra = self.directives.iter().flat_map(|d| d.split(','));
        for directive in extra.map(str::trim).filter(|d| !d.is_empty()) {
            filter = filter.add_directive(
                directive
                    .parse()
                    .with_context(|| format!("invalid log filter directive '{}'", directive))?,
            );
        }
        Ok(filter)
    }

    fn layer<W>(&self, writer: W, ansi: bool) -> BoxedLayer
    where
        W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    {
        let layer = fmt::layer().with_writer(writer).with_ansi(ansi).with_target(true);
        match self.format {
            LogFormat::Text => layer.boxed(),
            LogFormat::Json => layer.json().flatten_event(true).boxed(),
        }
    }
}

fn env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Flushes buffered file output when dropped
#[must_use = "dropping the guard stops file logging"]
pub struct LoggingGuard {
    _worker: Option<WorkerGuard>,
}

/// Install the global subscriber described by `config`
///
/// Fails if a subscriber is already installed.
pub fn init_logging(config: &LogConfig) -> Result<LoggingGuard> {
    let mut layers: Vec<BoxedLayer> = Vec::new();
    let mut worker = None;

    if config.output.console() {
        layers.push(config.layer(std::io::stderr, std::io::stderr().is_terminal()));
    }

    if config.output.file() {
        std::fs::create_dir_all(&config.dir)
            .with_context(|| format!("Failed to create log directory {}", config.dir.display()))?;
        let appender = tracing_appender::rolling::daily(&config.dir, &config.file_prefix);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        layers.push(config.layer(writer, false));
        worker = Some(guard);
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(config.filter()?)
        .try_init()
        .context("A global tracing subscriber is already installed")?;

    Ok(LoggingGuard { _worker: worker })
}
