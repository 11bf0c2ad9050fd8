use axum::http::HeaderMap;
use axum::http::header::AsHeaderName;

/// Header value as string. Missing and non-ASCII values yield `None`.
#[inline]
pub(crate) fn get_header<K: AsHeaderName>(headers: &HeaderMap, key: K) -> Option<&str> {
  return headers.get(key).and_then(|value| value.to_str().ok());
}
