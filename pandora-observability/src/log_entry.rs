use serde::{Deserialize, Serialize};

/// Severity of a log entry. Display order only; the logger never filters by level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Info,
    Http,
    Warn,
    Error,
    Perf,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Info => "INFO",
            LogLevel::Http => "HTTP",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Perf => "PERF",
        }
    }

    pub fn all() -> &'static [LogLevel] {
        &[
            LogLevel::Info,
            LogLevel::Http,
            LogLevel::Warn,
            LogLevel::Error,
            LogLevel::Perf,
        ]
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One immutable record in the log history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    /// ISO-8601 UTC timestamp with millisecond precision.
    pub timestamp: String,
    /// JSON-safe copy of the payload taken when the entry was logged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_data: Option<serde_json::Value>,
}

impl LogEntry {
    /// Serialise to a compact JSON line.
    pub fn to_json_line(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}
