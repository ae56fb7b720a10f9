use axum::{
    body::Body,
    extract::Request,
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

/// HTTP header name for request ID
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request ID stored in request extensions so handlers can log it
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RequestId(pub Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Reads the id from the `x-request-id` header, if it carries a valid UUID
    pub fn from_header(value: Option<&HeaderValue>) -> Option<Self> {
        value
            .and_then(|h| h.to_str().ok())
            .and_then(|s| Uuid::parse_str(s.trim()).ok())
            .map(RequestId)
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reuses the caller's `x-request-id` or generates one, exposes it to handlers and
/// echoes it on the response.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = RequestId::from_header(request.headers().get(REQUEST_ID_HEADER))
        .unwrap_or_default();

    request.extensions_mut().insert(request_id);

    let mut response = next.run(request).await;

    if let Ok(header_value) = HeaderValue::from_str(&request_id.to_string()) {
        response
            .headers_mut()
            .insert(REQUEST_ID_HEADER, header_value);
    }

    response
}

/// Span for the HTTP trace layer. The webhook path embeds the bot token, so only
/// the route prefix is recorded.
pub fn make_span_with_request_id(request: &Request<Body>) -> tracing::Span {
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map(|id| id.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    tracing::info_span!(
        "http_request",
        method = %request.method(),
        path = %redacted_path(request.uri().path()),
        request_id = %request_id,
    )
}

fn redacted_path(path: &str) -> &str {
    if path.starts_with("/webhook/") {
        "/webhook/:token"
    } else {
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_header_accepts_uuid() {
        let id = Uuid::new_v4();
        let header = HeaderValue::from_str(&id.to_string()).unwrap();

        assert_eq!(RequestId::from_header(Some(&header)), Some(RequestId(id)));
    }

    #[test]
    fn test_from_header_rejects_garbage() {
        let header = HeaderValue::from_static("not-a-uuid");

        assert_eq!(RequestId::from_header(Some(&header)), None);
        assert_eq!(RequestId::from_header(None), None);
    }

    #[test]
    fn test_webhook_path_is_redacted() {
        assert_eq!(redacted_path("/webhook/123:secret"), "/webhook/:token");
        assert_eq!(redacted_path("/health"), "/health");
    }
}
