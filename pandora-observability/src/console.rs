//! Console-like sinks the logger mirrors to in development mode.

use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

/// Best-effort output surface. Implementations must never panic.
pub trait ConsoleSink: Send + Sync {
    fn log(&self, value: &Value);
    fn warn(&self, value: &Value);
    fn error(&self, value: &Value);
    fn group_collapsed(&self, label: &str);
    fn group_end(&self);

    /// Tabular rendering of a sequence. Sinks without one fall back to `log`.
    fn table(&self, rows: &Value) {
        self.log(rows);
    }
}

/// Mirrors console output into `tracing` under the `pandora::console` target.
///
/// Grouped output is indented by two spaces per open group.
#[derive(Debug, Default)]
pub struct TracingConsole {
    depth: AtomicUsize,
}

impl TracingConsole {
    pub fn new() -> Self {
        Self::default()
    }

    fn indent(&self, text: &str) -> String {
        let depth = self.depth.load(Ordering::Relaxed);
        if depth == 0 {
            return text.to_string();
        }
        let pad = "  ".repeat(depth);
        text.lines()
            .map(|line| format!("{pad}{line}"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl ConsoleSink for TracingConsole {
    fn log(&self, value: &Value) {
        tracing::info!(target: "pandora::console", "{}", self.indent(&render(value)));
    }

    fn warn(&self, value: &Value) {
        tracing::warn!(target: "pandora::console", "{}", self.indent(&render(value)));
    }

    fn error(&self, value: &Value) {
        tracing::error!(target: "pandora::console", "{}", self.indent(&render(value)));
    }

    fn group_collapsed(&self, label: &str) {
        tracing::info!(target: "pandora::console", "{}", self.indent(&format!("▸ {label}")));
        self.depth.fetch_add(1, Ordering::Relaxed);
    }

    fn group_end(&self) {
        // Saturating: an unbalanced end must not wrap around.
        let _ = self
            .depth
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |d| d.checked_sub(1));
    }

    fn table(&self, rows: &Value) {
        match rows {
            Value::Array(items) => {
                tracing::info!(target: "pandora::console", "\n{}", self.indent(&render_table(items)));
            }
            other => self.log(other),
        }
    }
}

/// One call received by a [`RecordingConsole`].
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCall {
    Log(Value),
    Warn(Value),
    Error(Value),
    GroupCollapsed(String),
    GroupEnd,
    Table(Value),
}

/// Captures every call in order. Used to assert on console mirroring.
#[derive(Debug, Default)]
pub struct RecordingConsole {
    calls: Mutex<Vec<ConsoleCall>>,
}

impl RecordingConsole {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<ConsoleCall> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }

    fn record(&self, call: ConsoleCall) {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).push(call);
    }
}

impl ConsoleSink for RecordingConsole {
    fn log(&self, value: &Value) {
        self.record(ConsoleCall::Log(value.clone()));
    }

    fn warn(&self, value: &Value) {
        self.record(ConsoleCall::Warn(value.clone()));
    }

    fn error(&self, value: &Value) {
        self.record(ConsoleCall::Error(value.clone()));
    }

    fn group_collapsed(&self, label: &str) {
        self.record(ConsoleCall::GroupCollapsed(label.to_string()));
    }

    fn group_end(&self) {
        self.record(ConsoleCall::GroupEnd);
    }

    fn table(&self, rows: &Value) {
        self.record(ConsoleCall::Table(rows.clone()));
    }
}

/// Strings print as-is, everything else as pretty JSON.
pub fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}

fn render_cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Render a sequence as a text table: an `(index)` column, one column per
/// object key in first-seen order, and a `Values` column for non-object rows.
pub fn render_table(rows: &[Value]) -> String {
    const INDEX: &str = "(index)";
    const VALUES: &str = "Values";

    let mut columns: Vec<String> = Vec::new();
    let mut has_values = false;
    for row in rows {
        match row {
            Value::Object(map) => {
                for key in map.keys() {
                    if !columns.iter().any(|c| c == key) {
                        columns.push(key.clone());
                    }
                }
            }
            _ => has_values = true,
        }
    }

    let mut header = vec![INDEX.to_string()];
    header.extend(columns.iter().cloned());
    if has_values {
        header.push(VALUES.to_string());
    }

    let body: Vec<Vec<String>> = rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let mut cells = vec![i.to_string()];
            for column in &columns {
                let cell = match row {
                    Value::Object(map) => map.get(column).map(render_cell).unwrap_or_default(),
                    _ => String::new(),
                };
                cells.push(cell);
            }
            if has_values {
                cells.push(match row {
                    Value::Object(_) => String::new(),
                    other => render_cell(other),
                });
            }
            cells
        })
        .collect();

    let widths: Vec<usize> = (0..header.len())
        .map(|col| {
            body.iter()
                .map(|cells| cells[col].chars().count())
                .chain(std::iter::once(header[col].chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let format_row = |cells: &[String]| -> String {
        cells
            .iter()
            .zip(widths.iter().copied())
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };

    let separator = widths
        .iter()
        .map(|w| "-".repeat(*w))
        .collect::<Vec<_>>()
        .join("-+-");

    let mut lines = vec![format_row(header.as_slice()), separator];
    lines.extend(body.iter().map(|cells| format_row(cells.as_slice())));
    lines.join("\n")
}
