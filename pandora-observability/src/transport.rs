use crate::http_logging::{HttpEvent, HttpEvents, HttpFailure, HttpHandler, HttpRequest, HttpResponse};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::debug;

/// [`HttpHandler`] backed by `reqwest`.
///
/// Emits `Sent`, then `ResponseHeader` once headers arrive, then the terminal
/// event. Non-2xx responses become failures carrying the decoded body.
/// Must be called from within a tokio runtime.
#[derive(Debug, Clone, Default)]
pub struct ReqwestHandler {
    client: reqwest::Client,
}

impl ReqwestHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl HttpHandler for ReqwestHandler {
    fn handle(&self, request: HttpRequest) -> HttpEvents {
        let (tx, rx) = mpsc::unbounded_channel();
        let client = self.client.clone();

        tokio::spawn(async move {
            let url = request.url_with_params();
            let mut builder = client
                .request(request.method.clone(), &url)
                .headers(request.headers.clone());
            if let Some(body) = &request.body {
                builder = builder.json(body);
            }

            let _ = tx.send(Ok(HttpEvent::Sent));
            let terminal = match builder.send().await {
                Ok(response) => {
                    let status = response.status();
                    let _ = tx.send(Ok(HttpEvent::ResponseHeader { status }));
                    let body = match response.bytes().await {
                        Ok(bytes) => decode_body(&bytes),
                        Err(e) => Value::String(e.to_string()),
                    };
                    if status.is_success() {
                        Ok(HttpEvent::Response(HttpResponse::new(status, body)))
                    } else {
                        Err(HttpFailure::from_status(url, status, body))
                    }
                }
                Err(e) => {
                    debug!(error = %e, url = %url, "transport: request failed before a response");
                    Err(HttpFailure::unknown(url, e.to_string()))
                }
            };
            // The receiver may already be gone if the caller gave up.
            let _ = tx.send(terminal);
        });

        rx
    }
}

/// JSON when the body parses, text otherwise, `Null` when empty.
fn decode_body(bytes: &[u8]) -> Value {
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decode_body_prefers_json() {
        assert_eq!(decode_body(br#"{"a":1}"#), json!({"a": 1}));
        assert_eq!(decode_body(b"plain text"), json!("plain text"));
        assert_eq!(decode_body(b""), Value::Null);
    }
}
