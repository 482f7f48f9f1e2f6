use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use uuid::Uuid;

/// Axum middleware that propagates or generates a request ID.
///
/// If the incoming request has an `x-request-id` header, that value is
/// echoed back; otherwise a new `UUIDv4` is generated. Either way the ID is
/// set on the response as the `x-request-id` header so upstream failures can
/// be correlated across logs.
pub async fn request_id(req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    let mut res = next.run(req).await;

    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert("x-request-id", val);
    }

    res
}
