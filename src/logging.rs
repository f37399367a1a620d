use chrono::Local;
use log::{LevelFilter, Metadata, Record, SetLoggerError};
use std::collections::HashSet;
use std::io::{self, Write};
use std::sync::OnceLock;

// Custom logger structure
#[derive(Debug)]
struct SkillsimLogger {
    level: LevelFilter,
    debug_filters: Option<HashSet<String>>,
}

/// Pulls the number following `prefix` out of a log message, if any.
fn extract_number(message: &str, prefix: &str) -> Option<u32> {
    let start = message.find(prefix)? + prefix.len();
    let digits: String = message[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse::<u32>().ok()
}

impl log::Log for SkillsimLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        if metadata.level() <= self.level {
            // Debug filters only narrow the chatty levels
            if let Some(filters) = &self.debug_filters {
                if metadata.level() == log::Level::Debug || metadata.level() == log::Level::Trace {
                    return filters.contains(metadata.target())
                        || filters.iter().any(|f| metadata.target().starts_with(f));
                }
            }
            return true;
        }
        false
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let level_color = match record.level() {
            log::Level::Error => "\x1B[31m", // Red
            log::Level::Warn => "\x1B[33m",  // Yellow
            log::Level::Info => "\x1B[32m",  // Green
            log::Level::Debug => "\x1B[36m", // Cyan
            log::Level::Trace => "\x1B[35m", // Magenta
        };
        let reset = "\x1B[0m";
        let timestamp = Local::now().format("%H:%M:%S%.3f");

        // The topic macros already prefix "[E..]", only decorate free-form messages
        let message = record.args().to_string();
        let mut context = String::new();
        if !message.starts_with("[E") {
            if let Some(id) = extract_number(&message, "Enemy ") {
                context.push_str(&format!("[E{:05}]", id));
            }
            if let Some(turn) = extract_number(&message, "Turn ") {
                context.push_str(&format!("[T{:02}]", turn));
            }
            if !context.is_empty() {
                context.push(' ');
            }
        }

        let mut output = format!(
            "{timestamp} {level_color}{level:5}{reset} {context}{target}: {message}",
            level = record.level(),
            target = record.target(),
        );

        if let Some(module_path) = record.module_path() {
            if module_path != record.target() {
                output.push_str(&format!(" [{}]", module_path));
            }
        }

        // Summaries go to stdout, so the log stream lives on stderr
        let mut stderr = io::stderr();
        let _ = writeln!(stderr, "{}", output);
    }

    fn flush(&self) {
        let _ = io::stderr().flush();
    }
}

static LOGGER: OnceLock<SkillsimLogger> = OnceLock::new();

/// Parses a textual log level, falling back to `Info` for anything unrecognized.
pub fn parse_level(level: &str) -> LevelFilter {
    match level.to_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

/// Parses a comma separated topic list ("interp,summary") into a filter set.
pub fn parse_filters(debug_filter: Option<String>) -> Option<HashSet<String>> {
    debug_filter.map(|filter_str| {
        filter_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<HashSet<String>>()
    })
}

// Initialize the logger with optional debug filters
pub fn init_logger(level: LevelFilter, debug_filter: Option<String>) -> Result<(), SetLoggerError> {
    let logger = LOGGER.get_or_init(|| SkillsimLogger {
        level,
        debug_filters: parse_filters(debug_filter),
    });
    log::set_logger(logger).map(|()| log::set_max_level(level))
}

// Helper macros for specific debug topics
#[macro_export]
macro_rules! debug_interp {
    ($($arg:tt)*) => {
        log::debug!(target: "interp", "{}", format_args!($($arg)*))
    }
}

#[macro_export]
macro_rules! debug_summary {
    ($enemy_id:expr, $($arg:tt)*) => {
        log::debug!(target: "summary", "[E{:05}] {}", $enemy_id, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! debug_decode {
    ($($arg:tt)*) => {
        log::debug!(target: "decode", "{}", format_args!($($arg)*))
    }
}

#[macro_export]
macro_rules! debug_batch {
    ($($arg:tt)*) => {
        log::debug!(target: "batch", "{}", format_args!($($arg)*))
    }
}
