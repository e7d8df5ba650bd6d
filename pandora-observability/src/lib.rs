pub mod console;
pub mod error_handler;
pub mod http_logging;
pub mod log_entry;
pub mod logger;
pub mod metadata;

#[cfg(feature = "http-client")]
pub mod transport;

pub use console::{ConsoleSink, RecordingConsole, TracingConsole};
pub use error_handler::{ClientError, GlobalErrorHandler};
pub use http_logging::{HttpEvent, HttpFailure, HttpHandler, HttpLoggingInterceptor, HttpRequest, HttpResponse};
pub use log_entry::{LogEntry, LogLevel};
pub use logger::Logger;
pub use metadata::{MetaData, MetaValue};

#[cfg(feature = "http-client")]
pub use transport::ReqwestHandler;
