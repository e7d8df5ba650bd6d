use crate::console::{ConsoleSink, TracingConsole};
use crate::log_entry::{LogEntry, LogLevel};
use crate::metadata::MetaData;
use chrono::{DateTime, Local, SecondsFormat, TimeZone, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use pandora_core::config::EnvironmentConfig;
use serde_json::Value;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;

/// A named stopwatch. Discarded once stopped.
#[derive(Debug)]
struct PerformanceTimer {
    start: Instant,
}

impl PerformanceTimer {
    fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Elapsed whole milliseconds since the timer started.
    fn stop(self) -> u128 {
        self.start.elapsed().as_millis()
    }
}

/// Session log history with optional console mirroring and performance timers.
///
/// * In production, entries are only kept in memory.
/// * In development, every entry is also rendered to the console sink.
///
/// Built once by the composition root and shared as `Arc<Logger>`.
/// No method panics or returns an error.
pub struct Logger {
    console_enabled: bool,
    console: Arc<dyn ConsoleSink>,
    history: RwLock<Vec<LogEntry>>,
    timers: DashMap<String, PerformanceTimer>,
}

impl Logger {
    /// Logger mirroring to `console` unless `production` is set.
    pub fn new(production: bool, console: Arc<dyn ConsoleSink>) -> Self {
        Self {
            console_enabled: !production,
            console,
            history: RwLock::new(Vec::new()),
            timers: DashMap::new(),
        }
    }

    /// Logger for the given environment, mirroring through `tracing`.
    pub fn from_config(env: &EnvironmentConfig) -> Self {
        Self::new(env.production, Arc::new(TracingConsole::new()))
    }

    pub fn is_console_enabled(&self) -> bool {
        self.console_enabled
    }

    /// Logs a regular message.
    pub fn log(&self, message: impl Into<String>, meta: Option<MetaData>) {
        self.internal_log(LogLevel::Info, message.into(), meta);
    }

    /// Logs an http call.
    pub fn http(&self, message: impl Into<String>, meta: Option<MetaData>) {
        self.internal_log(LogLevel::Http, message.into(), meta);
    }

    pub fn warn(&self, message: impl Into<String>, meta: Option<MetaData>) {
        self.internal_log(LogLevel::Warn, message.into(), meta);
    }

    pub fn error(&self, message: impl Into<String>, meta: Option<MetaData>) {
        self.internal_log(LogLevel::Error, message.into(), meta);
    }

    /// Starts a timer for the action with the given name.
    ///
    /// A second start for a name that is still running logs an error and
    /// leaves the running timer untouched.
    pub fn start_performance_log(&self, name: &str) {
        match self.timers.entry(name.to_string()) {
            Entry::Occupied(occupied) => {
                drop(occupied);
                self.error(format!("There is already a running timer for {name}"), None);
            }
            Entry::Vacant(vacant) => {
                self.internal_log(
                    LogLevel::Perf,
                    format!("Performance timer started for {name}"),
                    None,
                );
                vacant.insert(PerformanceTimer::start());
            }
        }
    }

    /// Stops a running timer and logs the elapsed time.
    pub fn stop_performance_log(&self, name: &str) {
        let Some((_, timer)) = self.timers.remove(name) else {
            self.error(format!("There is no running timer for {name}"), None);
            return;
        };

        let elapsed_ms = timer.stop();
        let elapsed_secs = elapsed_ms as f64 / 1000.0;
        self.internal_log(
            LogLevel::Perf,
            format!("{name} completed in {elapsed_ms}ms ({elapsed_secs}s)"),
            None,
        );
    }

    /// Names of the currently running timers, sorted.
    pub fn running_timers(&self) -> Vec<String> {
        let mut names: Vec<String> = self.timers.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Every entry logged in this session, oldest first.
    pub fn history(&self) -> Vec<LogEntry> {
        self.history
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// `[dd.MM.yyyy hh:mm] LEVEL: message`, with a 12-hour clock and no AM/PM marker.
    pub fn format_message<Tz: TimeZone>(
        level: LogLevel,
        message: &str,
        timestamp: &DateTime<Tz>,
    ) -> String
    where
        Tz::Offset: std::fmt::Display,
    {
        let formatted_time = timestamp.format("%d.%m.%Y %I:%M");
        format!("[{formatted_time}] {level}: {message}")
    }

    fn internal_log(&self, level: LogLevel, message: String, meta: Option<MetaData>) {
        let now = Utc::now();
        // Copy once so history and console see the same value.
        let meta_data = meta.map(|m| m.snapshot_or_sentinel());

        if self.console_enabled {
            self.log_to_console(level, &message, &now.with_timezone(&Local), meta_data.as_ref());
        }
        self.log_to_memory(level, message, now, meta_data);
    }

    fn log_to_memory(
        &self,
        level: LogLevel,
        message: String,
        time: DateTime<Utc>,
        meta_data: Option<Value>,
    ) {
        let entry = LogEntry {
            level,
            message,
            timestamp: time.to_rfc3339_opts(SecondsFormat::Millis, true),
            meta_data,
        };
        self.history
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
    }

    fn log_to_console(
        &self,
        level: LogLevel,
        message: &str,
        time: &DateTime<Local>,
        meta_data: Option<&Value>,
    ) {
        let formatted = Self::format_message(level, message, time);
        match meta_data {
            Some(data) => {
                self.console.group_collapsed(&formatted);
                if data.is_array() {
                    self.console.table(data);
                } else {
                    self.console_at(level, data);
                }
                self.console.group_end();
            }
            None => self.console_at(level, &Value::String(formatted)),
        }
    }

    fn console_at(&self, level: LogLevel, value: &Value) {
        match level {
            LogLevel::Info | LogLevel::Http | LogLevel::Perf => self.console.log(value),
            LogLevel::Warn => self.console.warn(value),
            LogLevel::Error => self.console.error(value),
        }
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("console_enabled", &self.console_enabled)
            .field("entries", &self.history.read().map(|h| h.len()).unwrap_or(0))
            .field("running_timers", &self.timers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::{ConsoleCall, RecordingConsole};
    use serde_json::json;

    fn dev_logger() -> (Logger, Arc<RecordingConsole>) {
        let console = Arc::new(RecordingConsole::new());
        (Logger::new(false, console.clone()), console)
    }

    #[test]
    fn format_message_uses_day_month_year_and_minutes() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 5, 9, 7, 42).unwrap();
        assert_eq!(
            Logger::format_message(LogLevel::Info, "hello", &ts),
            "[05.03.2024 09:07] INFO: hello"
        );
    }

    #[test]
    fn format_message_uses_twelve_hour_clock_without_marker() {
        let evening = Utc.with_ymd_and_hms(2024, 3, 5, 21, 7, 0).unwrap();
        assert_eq!(
            Logger::format_message(LogLevel::Warn, "late", &evening),
            "[05.03.2024 09:07] WARN: late"
        );
        let midnight = Utc.with_ymd_and_hms(2024, 12, 31, 0, 30, 0).unwrap();
        assert_eq!(
            Logger::format_message(LogLevel::Perf, "x", &midnight),
            "[31.12.2024 12:30] PERF: x"
        );
    }

    #[test]
    fn timestamp_is_iso_utc_with_millis() {
        let (logger, _) = dev_logger();
        logger.log("hello", None);
        let ts = &logger.history()[0].timestamp;
        assert!(ts.ends_with('Z'), "{ts}");
        assert!(DateTime::parse_from_rfc3339(ts).is_ok());
        // yyyy-mm-ddThh:mm:ss.mmmZ
        assert_eq!(ts.len(), 24);
    }

    #[test]
    fn console_severity_follows_level() {
        let (logger, console) = dev_logger();
        logger.log("i", None);
        logger.http("h", None);
        logger.warn("w", None);
        logger.error("e", None);
        let calls = console.calls();
        assert!(matches!(&calls[0], ConsoleCall::Log(Value::String(s)) if s.ends_with("INFO: i")));
        assert!(matches!(&calls[1], ConsoleCall::Log(Value::String(s)) if s.ends_with("HTTP: h")));
        assert!(matches!(&calls[2], ConsoleCall::Warn(Value::String(s)) if s.ends_with("WARN: w")));
        assert!(matches!(&calls[3], ConsoleCall::Error(Value::String(s)) if s.ends_with("ERROR: e")));
    }

    #[test]
    fn meta_is_printed_inside_a_group() {
        let (logger, console) = dev_logger();
        logger.warn("with meta", Some(json!({"a": 1}).into()));
        let calls = console.calls();
        assert_eq!(calls.len(), 3);
        assert!(matches!(&calls[0], ConsoleCall::GroupCollapsed(label) if label.ends_with("WARN: with meta")));
        assert_eq!(calls[1], ConsoleCall::Warn(json!({"a": 1})));
        assert_eq!(calls[2], ConsoleCall::GroupEnd);
    }

    #[test]
    fn sequence_meta_is_printed_as_table() {
        let (logger, console) = dev_logger();
        logger.log("rows", Some(json!([{"name": "Dark"}]).into()));
        assert_eq!(console.calls()[1], ConsoleCall::Table(json!([{"name": "Dark"}])));
    }

    #[test]
    fn production_never_touches_console() {
        let console = Arc::new(RecordingConsole::new());
        let logger = Logger::new(true, console.clone());
        logger.log("a", None);
        logger.error("b", Some(json!({"x": 1}).into()));
        logger.start_performance_log("t");
        logger.stop_performance_log("t");
        assert!(console.calls().is_empty());
        assert_eq!(logger.history().len(), 4);
        assert!(!logger.is_console_enabled());
    }

    #[test]
    fn history_is_a_copy() {
        let (logger, _) = dev_logger();
        logger.log("one", None);
        let mut snapshot = logger.history();
        snapshot.clear();
        assert_eq!(logger.history().len(), 1);
    }
}
