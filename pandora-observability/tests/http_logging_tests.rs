use http::StatusCode;
use pandora_observability::http_logging::HttpEvents;
use pandora_observability::{
    HttpEvent, HttpFailure, HttpHandler, HttpLoggingInterceptor, HttpRequest, HttpResponse,
    LogLevel, Logger, RecordingConsole,
};
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

/// Replays a fixed list of events, then closes the stream.
struct ScriptedHandler {
    events: Vec<Result<HttpEvent, HttpFailure>>,
}

impl HttpHandler for ScriptedHandler {
    fn handle(&self, _request: HttpRequest) -> HttpEvents {
        let (tx, rx) = mpsc::unbounded_channel();
        for event in self.events.clone() {
            tx.send(event).unwrap();
        }
        rx
    }
}

/// Emits `Sent` and then never settles.
#[derive(Default)]
struct HangingHandler {
    senders: Mutex<Vec<mpsc::UnboundedSender<Result<HttpEvent, HttpFailure>>>>,
}

impl HttpHandler for HangingHandler {
    fn handle(&self, _request: HttpRequest) -> HttpEvents {
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(Ok(HttpEvent::Sent)).unwrap();
        self.senders.lock().unwrap().push(tx);
        rx
    }
}

fn setup() -> (Arc<Logger>, HttpLoggingInterceptor) {
    let logger = Arc::new(Logger::new(true, Arc::new(RecordingConsole::new())));
    let interceptor = HttpLoggingInterceptor::new(Arc::clone(&logger));
    (logger, interceptor)
}

fn http_entries(logger: &Logger) -> Vec<pandora_observability::LogEntry> {
    logger
        .history()
        .into_iter()
        .filter(|e| e.level == LogLevel::Http)
        .collect()
}

// =============================================================================
// Success
// =============================================================================

#[tokio::test]
async fn test_success_logs_succeeded_with_body() {
    let (logger, interceptor) = setup();
    let handler = ScriptedHandler {
        events: vec![
            Ok(HttpEvent::Sent),
            Ok(HttpEvent::Response(HttpResponse::ok(json!({"sessionToken": "abcd"})))),
        ],
    };

    let response = interceptor
        .intercept(HttpRequest::get("http://api/login"), &handler)
        .await
        .unwrap();
    assert_eq!(response.body, json!({"sessionToken": "abcd"}));

    let entries = http_entries(&logger);
    assert_eq!(entries.len(), 1);
    assert!(entries[0].message.starts_with("GET http://api/login succeeded in "));
    assert!(entries[0].message.ends_with("ms"));
    assert_eq!(entries[0].meta_data, Some(json!({"sessionToken": "abcd"})));
}

#[tokio::test]
async fn test_message_uses_url_with_params() {
    let (logger, interceptor) = setup();
    let handler = ScriptedHandler {
        events: vec![Ok(HttpEvent::Response(HttpResponse::ok(json!([]))))],
    };
    let request = HttpRequest::get("http://api/shows").with_param("q", "the wire");

    interceptor.intercept(request, &handler).await.unwrap();

    let entries = http_entries(&logger);
    assert!(
        entries[0].message.starts_with("GET http://api/shows?q=the%20wire succeeded in "),
        "{}",
        entries[0].message
    );
}

#[tokio::test]
async fn test_null_body_logs_without_meta() {
    let (logger, interceptor) = setup();
    let handler = ScriptedHandler {
        events: vec![Ok(HttpEvent::Response(HttpResponse::new(
            StatusCode::NO_CONTENT,
            serde_json::Value::Null,
        )))],
    };
    interceptor
        .intercept(HttpRequest::new(http::Method::DELETE, "http://api/shows/1"), &handler)
        .await
        .unwrap();

    let entries = http_entries(&logger);
    assert!(entries[0].message.starts_with("DELETE http://api/shows/1 succeeded"));
    assert!(entries[0].meta_data.is_none());
}

// =============================================================================
// Failure
// =============================================================================

#[tokio::test]
async fn test_failure_500_logs_exactly_once_despite_intermediate_events() {
    let (logger, interceptor) = setup();
    let failure = HttpFailure::from_status(
        "http://api/shows",
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({"reason": "boom"}),
    );
    let handler = ScriptedHandler {
        events: vec![
            Ok(HttpEvent::Sent),
            Ok(HttpEvent::Progress { loaded: 10, total: Some(100) }),
            Ok(HttpEvent::ResponseHeader { status: StatusCode::INTERNAL_SERVER_ERROR }),
            Ok(HttpEvent::Progress { loaded: 100, total: Some(100) }),
            Err(failure.clone()),
        ],
    };

    let err = interceptor
        .intercept(HttpRequest::get("http://api/shows"), &handler)
        .await
        .unwrap_err();
    // The failure is handed back to the caller unchanged
    assert_eq!(err, failure);

    let entries = http_entries(&logger);
    assert_eq!(entries.len(), 1);
    assert!(entries[0].message.contains("failed"));
    assert!(entries[0].message.starts_with("GET http://api/shows failed in "));
    assert_eq!(
        entries[0].meta_data,
        Some(json!({
            "error": {"reason": "boom"},
            "status": 500,
            "statusText": "Internal Server Error"
        }))
    );
    assert_eq!(entries[0].meta_data.as_ref().unwrap()["status"], 500);
}

#[tokio::test]
async fn test_stream_closed_without_terminal_event_is_a_failure() {
    let (logger, interceptor) = setup();
    let handler = ScriptedHandler {
        events: vec![Ok(HttpEvent::Sent)],
    };

    let err = interceptor
        .intercept(HttpRequest::get("http://api/shows"), &handler)
        .await
        .unwrap_err();
    assert_eq!(err.status, 0);

    let entries = http_entries(&logger);
    assert_eq!(entries.len(), 1);
    assert!(entries[0].message.starts_with("GET http://api/shows failed in "));
}

#[tokio::test]
async fn test_events_after_terminal_are_ignored() {
    let (logger, interceptor) = setup();
    let handler = ScriptedHandler {
        events: vec![
            Ok(HttpEvent::Response(HttpResponse::ok(json!(1)))),
            Err(HttpFailure::unknown("http://api/x", "late")),
        ],
    };
    interceptor
        .intercept(HttpRequest::get("http://api/x"), &handler)
        .await
        .unwrap();
    let entries = http_entries(&logger);
    assert_eq!(entries.len(), 1);
    assert!(entries[0].message.contains("succeeded"));
}

// =============================================================================
// Cancellation
// =============================================================================

#[tokio::test]
async fn test_dropped_call_still_logs_once() {
    let (logger, interceptor) = setup();
    let handler = HangingHandler::default();

    let outcome = tokio::time::timeout(
        Duration::from_millis(20),
        interceptor.intercept(HttpRequest::get("http://api/slow"), &handler),
    )
    .await;
    assert!(outcome.is_err(), "call should not have settled");

    let entries = http_entries(&logger);
    assert_eq!(entries.len(), 1);
    // No outcome was observed, so the status slot is empty
    assert!(entries[0].message.starts_with("GET http://api/slow  in "), "{}", entries[0].message);
    assert!(entries[0].meta_data.is_none());
}

#[tokio::test]
async fn test_sequential_calls_log_once_each() {
    let (logger, interceptor) = setup();
    let ok = ScriptedHandler {
        events: vec![Ok(HttpEvent::Response(HttpResponse::ok(json!("ok"))))],
    };
    let bad = ScriptedHandler {
        events: vec![Err(HttpFailure::unknown("http://api/b", "refused"))],
    };

    interceptor.intercept(HttpRequest::get("http://api/a"), &ok).await.unwrap();
    interceptor.intercept(HttpRequest::get("http://api/b"), &bad).await.unwrap_err();
    interceptor.intercept(HttpRequest::get("http://api/c"), &ok).await.unwrap();

    let entries = http_entries(&logger);
    assert_eq!(entries.len(), 3);
    assert!(entries[1].message.starts_with("GET http://api/b failed"));
}
