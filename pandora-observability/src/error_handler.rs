use crate::http_logging::HttpFailure;
use crate::logger::Logger;
use crate::metadata::MetaData;
use serde_json::Value;
use std::any::Any;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::panic::PanicHookInfo;
use std::sync::Arc;

/// An error that reached the application boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientError {
    /// A failed HTTP call. Server errors carry no meaningful client stack.
    Network {
        status: u16,
        status_text: String,
        message: String,
        error: Value,
    },
    /// Anything raised in-process.
    Runtime {
        name: String,
        message: String,
        stack: Option<String>,
    },
}

impl ClientError {
    pub fn runtime(message: impl Into<String>) -> Self {
        ClientError::Runtime {
            name: "Error".to_string(),
            message: message.into(),
            stack: None,
        }
    }

    /// Runtime error from any `std` error; the source chain becomes the stack.
    pub fn from_error(err: &(dyn std::error::Error + 'static)) -> Self {
        let mut causes = Vec::new();
        let mut source = err.source();
        while let Some(cause) = source {
            causes.push(format!("Caused by: {cause}"));
            source = cause.source();
        }
        ClientError::Runtime {
            name: "Error".to_string(),
            message: err.to_string(),
            stack: (!causes.is_empty()).then(|| causes.join("\n")),
        }
    }

    /// Runtime error describing a panic: payload text, location and backtrace.
    pub fn from_panic(info: &PanicHookInfo<'_>) -> Self {
        let mut stack = Vec::new();
        if let Some(location) = info.location() {
            stack.push(format!("at {location}"));
        }
        let backtrace = Backtrace::capture();
        if backtrace.status() == BacktraceStatus::Captured {
            stack.push(backtrace.to_string());
        }
        ClientError::Runtime {
            name: "panic".to_string(),
            message: panic_message(info.payload()),
            stack: (!stack.is_empty()).then(|| stack.join("\n")),
        }
    }

    /// Message to log, falling back to the error's rendering when empty.
    pub fn log_message(&self) -> String {
        match self {
            ClientError::Network { message, .. } => message.clone(),
            ClientError::Runtime { message, .. } if !message.is_empty() => message.clone(),
            runtime => runtime.to_string(),
        }
    }
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::Network { message, .. } => f.write_str(message),
            ClientError::Runtime { name, message, .. } if message.is_empty() => f.write_str(name),
            ClientError::Runtime { name, message, .. } => write!(f, "{name}: {message}"),
        }
    }
}

impl From<HttpFailure> for ClientError {
    fn from(failure: HttpFailure) -> Self {
        ClientError::Network {
            message: failure.message(),
            status: failure.status,
            status_text: failure.status_text,
            error: failure.error,
        }
    }
}

impl From<anyhow::Error> for ClientError {
    fn from(err: anyhow::Error) -> Self {
        // A failed HTTP call keeps its network shape even behind anyhow.
        if let Some(failure) = err.downcast_ref::<HttpFailure>() {
            return failure.clone().into();
        }
        let causes: Vec<String> = err.chain().skip(1).map(|c| format!("Caused by: {c}")).collect();
        ClientError::Runtime {
            name: "Error".to_string(),
            message: err.to_string(),
            stack: (!causes.is_empty()).then(|| causes.join("\n")),
        }
    }
}

/// Text of a panic payload (`&str` or `String`), or a placeholder.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Box<dyn Any>".to_string()
    }
}

/// Last line of defense: formats boundary errors into the log history.
#[derive(Debug, Clone)]
pub struct GlobalErrorHandler {
    logger: Arc<Logger>,
}

impl GlobalErrorHandler {
    pub fn new(logger: Arc<Logger>) -> Self {
        Self { logger }
    }

    pub fn handle(&self, error: &ClientError) {
        match error {
            ClientError::Network { .. } => {
                self.logger.error(error.log_message(), None);
            }
            ClientError::Runtime { stack, .. } => {
                let stack = stack.as_ref().map(|s| MetaData::from(s.as_str()));
                self.logger.error(error.log_message(), stack);
            }
        }
    }

    /// Route every panic through `handler` before the previously installed hook runs.
    pub fn install_panic_hook(handler: Arc<GlobalErrorHandler>) {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            handler.handle(&ClientError::from_panic(info));
            previous(info);
        }));
    }
}
