// File: src/adapter.rs
// Purpose: Serve an App through axum (transport layer only)

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::extract::{Request as HttpRequest, State};
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response as HttpResponse};
use axum::Router;
use tracing::warn;

use crate::app::App;
use crate::request::Request;
use crate::response::Response;

/// Largest request body read into memory (2 MiB).
pub const BODY_LIMIT: usize = 2 * 1024 * 1024;

/// An axum router that sends every request through `app`.
pub fn router(app: Arc<App>) -> Router {
    Router::new().fallback(handle).with_state(app)
}

async fn handle(State(app): State<Arc<App>>, request: HttpRequest) -> HttpResponse {
    match into_request(request).await {
        Ok(request) => into_http_response(app.call(request)),
        Err(err) => {
            warn!("Failed to read request body: {}", err);
            (StatusCode::BAD_REQUEST, "Bad Request").into_response()
        }
    }
}

/// Converts an axum request into a dispatch request.
///
/// Header values that are not visible ASCII are skipped.
pub async fn into_request(request: HttpRequest) -> Result<Request, axum::Error> {
    let (parts, body) = request.into_parts();
    let body = to_bytes(body, BODY_LIMIT).await?;

    let mut req = Request::new(parts.method.as_str(), parts.uri.path());
    if let Some(query) = parts.uri.query() {
        req = req.with_query(query);
    }
    for (name, value) in &parts.headers {
        if let Ok(value) = value.to_str() {
            req = req.with_header(name.as_str(), value);
        }
    }

    Ok(req.with_body(body.to_vec()))
}

/// Converts a finished dispatch response into an axum response.
pub fn into_http_response(response: Response) -> HttpResponse {
    let (status, headers, body) = response.finish();

    let mut http = HttpResponse::new(Body::from(body.concat()));
    *http.status_mut() =
        StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    for (name, value) in headers {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(&value),
        ) {
            (Ok(header_name), Ok(header_value)) => {
                http.headers_mut().insert(header_name, header_value);
            }
            _ => warn!(header = %name, "dropping invalid response header"),
        }
    }

    http
}
