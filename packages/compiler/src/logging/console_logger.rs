// Console Logger
//
// Logger that writes `[LEVEL] source: message` lines to the console.
// Info goes to stdout, everything else to stderr.

use super::logger::{LogLevel, Logger};
use crate::config::CompilerConfig;

/// Console logger.
#[derive(Debug, Clone, Default)]
pub struct ConsoleLogger {
    level: LogLevel,
    /// Prepended to every line, e.g. the tool or template name.
    source: Option<String>,
}

impl ConsoleLogger {
    pub fn new(level: LogLevel) -> Self {
        Self {
            level,
            source: None,
        }
    }

    /// Debug level when the compiler traces its walk, warnings otherwise.
    pub fn for_config(config: &CompilerConfig) -> Self {
        Self::new(if config.verbose {
            LogLevel::Debug
        } else {
            LogLevel::Warn
        })
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    fn format_line(&self, level: LogLevel, msg: &str) -> String {
        match &self.source {
            Some(source) => format!("[{}] {}: {}", level.label(), source, msg),
            None => format!("[{}] {}", level.label(), msg),
        }
    }

    fn write(&self, level: LogLevel, msg: &str) {
        if !self.is_enabled(level) {
            return;
        }
        let line = self.format_line(level, msg);
        if level == LogLevel::Info {
            println!("{}", line);
        } else {
            eprintln!("{}", line);
        }
    }
}

impl Logger for ConsoleLogger {
    fn level(&self) -> LogLevel {
        self.level
    }

    fn debug(&self, msg: &str) {
        self.write(LogLevel::Debug, msg);
    }

    fn info(&self, msg: &str) {
        self.write(LogLevel::Info, msg);
    }

    fn warn(&self, msg: &str) {
        self.write(LogLevel::Warn, msg);
    }

    fn error(&self, msg: &str) {
        self.write(LogLevel::Error, msg);
    }
}
