use axum::body::Body;
use axum::http::{Request, header};
use axum::response::Response;
use std::time::Duration;
use tracing::Level;
use tracing::span::Span;

use crate::util::get_header;

// NOTE: The `tower_http::trace::TraceLayer` installed in `server/mod.rs` calls the hooks below.
// They define *what* goes into a request's span and emit one event per response. *Where* it's
// logged to is up to the tracing subscriber installed in `Server::serve`.

const SPAN_NAME: &str = "http_span";
const EVENT_NAME: &str = "http_event";
pub(crate) const EVENT_TARGET: &str = "http_target";
pub(crate) const LEVEL: Level = Level::INFO;

pub(super) fn http_logger_make_span(request: &Request<Body>) -> Span {
  let headers = request.headers();

  // NOTE: "%" means print using fmt::Display, and "?" means fmt::Debug.
  return tracing::span!(
      target: EVENT_TARGET,
      LEVEL,
      SPAN_NAME,
      method = %request.method(),
      uri = %request.uri(),
      version = ?request.version(),
      host = get_header(headers, "host"),
      user_agent = get_header(headers, "user-agent"),
      // Reserve placeholders that are recorded once the response is ready.
      latency_ms = tracing::field::Empty,
      status = tracing::field::Empty,
      length = tracing::field::Empty,
  );
}

pub(super) fn http_logger_on_request(_req: &Request<Body>, _span: &Span) {
  // Nothing to record, the request was unpacked during span creation above.
}

pub(super) fn http_logger_on_response(response: &Response<Body>, latency: Duration, span: &Span) {
  span.record("latency_ms", as_millis_f64(&latency));
  span.record("status", response.status().as_u16());

  if let Some(header) = get_header(response.headers(), header::CONTENT_LENGTH) {
    span.record("length", header.parse::<i64>().ok());
  }

  tracing::event!(
    name: EVENT_NAME,
    target: EVENT_TARGET,
    parent: span,
    LEVEL,
    {}
  );
}

fn as_millis_f64(d: &Duration) -> f64 {
  const NANOS_PER_MILLI: f64 = 1_000_000.0;
  const MILLIS_PER_SEC: u64 = 1_000;

  return (d.as_secs() as f64) * (MILLIS_PER_SEC as f64)
    + (d.subsec_nanos() as f64) / (NANOS_PER_MILLI);
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_as_millis() {
    assert_eq!(as_millis_f64(&Duration::from_secs(2)), 2000.0);
    assert_eq!(as_millis_f64(&Duration::from_micros(1500)), 1.5);
  }
}
