use colorful::Colorful;
use indenter::indented;

use std::fmt::Write;
use std::{
    fs::create_dir_all,
    path::{Path, PathBuf},
};
use tracing_subscriber::layer::SubscriberExt;

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: tracing::Level,
    pub logging_enabled: bool,
    pub logger_name: String,
    /// When set, logs are also written here, rotated hourly.
    pub log_dir: Option<PathBuf>,
    pub _tracing_guard: Option<std::sync::Arc<tracing::subscriber::DefaultGuard>>,
}

impl LoggingConfig {
    pub fn new() -> Self {
        Default::default()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: tracing::Level::INFO,
            logging_enabled: true,
            logger_name: "llm_gpu_discovery".to_string(),
            log_dir: None,
            _tracing_guard: None,
        }
    }
}

impl LoggingConfig {
    /// Installs the subscriber for the current thread. Does nothing when
    /// logging is disabled or a logger is already loaded.
    pub fn load_logger(&mut self) -> crate::Result<()> {
        if !self.logging_enabled || self._tracing_guard.is_some() {
            return Ok(());
        }
        self._tracing_guard = Some(std::sync::Arc::new(self.create_logger()?));

        eprintln!(
            "{}",
            format!("Starting {} Logger", self.logger_name)
                .color(colorful::RGB::new(0, 139, 248))
                .bold()
        );

        Ok(())
    }

    fn create_logger(&mut self) -> crate::Result<tracing::subscriber::DefaultGuard> {
        let file_layer = match &self.log_dir {
            Some(log_dir) => {
                if !Path::new(log_dir).exists() {
                    create_dir_all(log_dir)?;
                }
                let file_appender = tracing_appender::rolling::RollingFileAppender::builder()
                    .rotation(tracing_appender::rolling::Rotation::HOURLY)
                    .max_log_files(6)
                    .filename_prefix(&self.logger_name)
                    .filename_suffix("log")
                    .build(log_dir)?;
                Some(
                    tracing_subscriber::fmt::layer()
                        .pretty()
                        .with_ansi(false)
                        .with_writer(file_appender),
                )
            }
            None => None,
        };

        let filter = tracing_subscriber::EnvFilter::builder()
            .with_default_directive(self.level.into())
            .parse_lossy("");

        let terminal_layer = tracing_subscriber::fmt::layer()
            .compact()
            .with_ansi(false)
            .with_writer(std::io::stderr);

        let subscriber = tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .with(terminal_layer);

        Ok(tracing::subscriber::set_default(subscriber))
    }
}

pub trait LoggingConfigTrait {
    fn logging_config_mut(&mut self) -> &mut LoggingConfig;

    fn logging_enabled(mut self, enabled: bool) -> Self
    where
        Self: Sized,
    {
        self.logging_config_mut().logging_enabled = enabled;
        self
    }

    fn logger_name<S: Into<String>>(mut self, logger_name: S) -> Self
    where
        Self: Sized,
    {
        self.logging_config_mut().logger_name = logger_name.into();
        self
    }

    /// Also write logs to hourly rotated files under `log_dir`.
    fn log_dir<P: Into<PathBuf>>(mut self, log_dir: P) -> Self
    where
        Self: Sized,
    {
        self.logging_config_mut().log_dir = Some(log_dir.into());
        self
    }

    /// Sets the log level to TRACE.
    ///
    /// Every vendor call is logged at TRACE unless the probe is verbose.
    fn log_level_trace(mut self) -> Self
    where
        Self: Sized,
    {
        self.logging_config_mut().level = tracing::Level::TRACE;
        self
    }

    /// Sets the log level to DEBUG.
    ///
    /// Use DEBUG to log variables or decisions, such as the classified status
    /// of each call on a verbose handle.
    fn log_level_debug(mut self) -> Self
    where
        Self: Sized,
    {
        self.logging_config_mut().level = tracing::Level::DEBUG;
        self
    }

    /// Sets the log level to INFO.
    ///
    /// Use INFO for milestones: a runtime loaded, a vendor probed.
    fn log_level_info(mut self) -> Self
    where
        Self: Sized,
    {
        self.logging_config_mut().level = tracing::Level::INFO;
        self
    }

    /// Sets the log level to WARN.
    ///
    /// Use WARN for failures the probe recovers from, such as a vendor runtime
    /// that is not installed.
    fn log_level_warn(mut self) -> Self
    where
        Self: Sized,
    {
        self.logging_config_mut().level = tracing::Level::WARN;
        self
    }

    /// Sets the log level to ERROR.
    fn log_level_error(mut self) -> Self
    where
        Self: Sized,
    {
        self.logging_config_mut().level = tracing::Level::ERROR;
        self
    }
}

pub fn i_ln(f: &mut std::fmt::Formatter<'_>, arg: std::fmt::Arguments<'_>) -> std::fmt::Result {
    write!(indented(f), "{}", arg)?;
    Ok(())
}

pub fn i_nln(f: &mut std::fmt::Formatter<'_>, arg: std::fmt::Arguments<'_>) -> std::fmt::Result {
    writeln!(indented(f), "{}", arg)?;
    Ok(())
}

pub fn i_nlns(
    f: &mut std::fmt::Formatter<'_>,
    args: &[std::fmt::Arguments<'_>],
) -> std::fmt::Result {
    for arg in args {
        writeln!(indented(f), "{}", arg)?;
    }
    Ok(())
}
