//! Logging interceptor for outbound HTTP calls.
//!
//! The transport behind [`HttpHandler`] reports each call as a stream of
//! events ending in either a response or a failure. The interceptor watches
//! that stream without altering it and writes exactly one HTTP-level entry
//! per call: when the call settles, or when the caller drops the call early.

use crate::logger::Logger;
use crate::metadata::MetaData;
use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::mpsc;
use url::Url;

/// Event stream for one call. The last item is a `Response` or an `Err`.
pub type HttpEvents = mpsc::UnboundedReceiver<Result<HttpEvent, HttpFailure>>;

/// Outbound request description.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub params: Vec<(String, String)>,
    pub headers: HeaderMap,
    pub body: Option<Value>,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            params: Vec::new(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>, body: Value) -> Self {
        Self::new(Method::POST, url).with_body(body)
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// The URL with query parameters appended, percent-encoded.
    ///
    /// Parameters are added after any query already present on `url`. A URL
    /// that does not parse is returned as given.
    pub fn url_with_params(&self) -> String {
        if self.params.is_empty() {
            return self.url.clone();
        }
        let mut url = match Url::parse(&self.url) {
            Ok(url) => url,
            Err(e) => {
                tracing::debug!(error = %e, url = %self.url, "http: url does not parse, params dropped");
                return self.url.clone();
            }
        };
        let query = url
            .query()
            .filter(|q| !q.is_empty())
            .into_iter()
            .map(|q| q.trim_end_matches('&').to_string())
            .chain(
                self.params
                    .iter()
                    .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v))),
            )
            .collect::<Vec<_>>()
            .join("&");
        url.set_query(Some(&query));
        url.into()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub status_text: String,
    pub body: Value,
}

impl HttpResponse {
    pub fn new(status: StatusCode, body: Value) -> Self {
        Self {
            status,
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            body,
        }
    }

    pub fn ok(body: Value) -> Self {
        Self::new(StatusCode::OK, body)
    }
}

/// Progress reported by the transport while a call is in flight.
#[derive(Debug, Clone, PartialEq)]
pub enum HttpEvent {
    Sent,
    ResponseHeader { status: StatusCode },
    Progress { loaded: u64, total: Option<u64> },
    Response(HttpResponse),
}

/// A call that ended without a successful response.
///
/// `status` is 0 when no response was received at all.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Http failure response for {url}: {status} {status_text}")]
pub struct HttpFailure {
    pub url: String,
    pub status: u16,
    pub status_text: String,
    pub error: Value,
}

impl HttpFailure {
    /// Failure carrying an HTTP error response.
    pub fn from_status(url: impl Into<String>, status: StatusCode, error: Value) -> Self {
        Self {
            url: url.into(),
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            error,
        }
    }

    /// Failure without any response (connection refused, DNS, ...).
    pub fn unknown(url: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status: 0,
            status_text: "Unknown Error".to_string(),
            error: Value::String(error.into()),
        }
    }

    pub fn message(&self) -> String {
        self.to_string()
    }

    /// `{error, status, statusText}` as recorded in the log entry.
    pub fn payload(&self) -> Value {
        json!({
            "error": self.error,
            "status": self.status,
            "statusText": self.status_text,
        })
    }
}

/// The transport seam. Implementations issue the request and report events.
pub trait HttpHandler: Send + Sync {
    fn handle(&self, request: HttpRequest) -> HttpEvents;
}

/// Records one call's outcome and writes the log entry when dropped.
struct CallLog {
    logger: Arc<Logger>,
    method: Method,
    url: String,
    start: Instant,
    status: &'static str,
    payload: Option<MetaData>,
}

impl CallLog {
    fn begin(logger: Arc<Logger>, request: &HttpRequest) -> Self {
        Self {
            logger,
            method: request.method.clone(),
            url: request.url_with_params(),
            start: Instant::now(),
            status: "",
            payload: None,
        }
    }

    fn pending(&mut self) {
        self.status = "";
    }

    fn succeeded(&mut self, response: &HttpResponse) {
        self.status = "succeeded";
        self.payload = match &response.body {
            Value::Null => None,
            body => Some(MetaData::from(body.clone())),
        };
    }

    fn failed(&mut self, failure: &HttpFailure) {
        self.status = "failed";
        self.payload = Some(MetaData::from(failure.payload()));
    }
}

impl Drop for CallLog {
    fn drop(&mut self) {
        let elapsed_ms = self.start.elapsed().as_millis();
        let message = format!(
            "{} {} {} in {}ms",
            self.method, self.url, self.status, elapsed_ms
        );
        self.logger.http(message, self.payload.take());
    }
}

/// Wraps outbound calls and logs each one at HTTP level.
#[derive(Debug, Clone)]
pub struct HttpLoggingInterceptor {
    logger: Arc<Logger>,
}

impl HttpLoggingInterceptor {
    pub fn new(logger: Arc<Logger>) -> Self {
        Self { logger }
    }

    /// Issue `request` through `next`, log the outcome, and hand it back unchanged.
    ///
    /// A stream that ends without a terminal event is reported as a failure
    /// with status 0.
    pub async fn intercept(
        &self,
        request: HttpRequest,
        next: &dyn HttpHandler,
    ) -> Result<HttpResponse, HttpFailure> {
        let mut call = CallLog::begin(Arc::clone(&self.logger), &request);
        let url = call.url.clone();
        let mut events = next.handle(request);

        while let Some(event) = events.recv().await {
            match event {
                Ok(HttpEvent::Response(response)) => {
                    call.succeeded(&response);
                    return Ok(response);
                }
                Ok(_) => call.pending(),
                Err(failure) => {
                    call.failed(&failure);
                    return Err(failure);
                }
            }
        }

        let failure = HttpFailure::unknown(url, "transport closed without a response");
        call.failed(&failure);
        Err(failure)
    }
}
