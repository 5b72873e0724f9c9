//! HTTP routes for hrm
//!
//! [`dispatch`] takes a request whose body has already been collected, so
//! handlers can be driven directly in tests without a socket.

pub mod cases;
pub mod evidence;
pub mod health;
pub mod reports;
pub mod victims;

pub use health::{health_check, readiness_check, version_info};

use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Method, Request, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::server::AppState;
use crate::types::HrmError;

/// Resolved resource for a request path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route<'a> {
    Health,
    Ready,
    Version,
    Cases,
    Case(&'a str),
    CaseHistory(&'a str),
    Reports,
    Report(&'a str),
    Victims,
    Victim(&'a str),
    VictimsForCase(&'a str),
    Evidence(&'a str),
}

impl<'a> Route<'a> {
    fn resolve(path: &'a str) -> Option<Self> {
        let trimmed = path.trim_matches('/');
        let segments: Vec<&str> = if trimmed.is_empty() {
            Vec::new()
        } else {
            trimmed.split('/').collect()
        };

        let route = match segments.as_slice() {
            ["health"] | ["healthz"] => Route::Health,
            ["ready"] | ["readyz"] => Route::Ready,
            ["version"] => Route::Version,
            ["cases"] => Route::Cases,
            ["cases", id] => Route::Case(id),
            ["cases", id, "history"] => Route::CaseHistory(id),
            ["reports"] => Route::Reports,
            ["reports", id] => Route::Report(id),
            ["victims"] => Route::Victims,
            ["victims", "case", id] => Route::VictimsForCase(id),
            ["victims", id] => Route::Victim(id),
            ["evidence", key] => Route::Evidence(key),
            _ => return None,
        };
        Some(route)
    }

    /// Methods served on this resource, for 405 responses
    fn allow(&self) -> &'static str {
        match self {
            Route::Health | Route::Ready | Route::Version => "GET, OPTIONS",
            Route::Cases | Route::Reports => "GET, POST, OPTIONS",
            Route::Case(_) => "GET, PATCH, DELETE, OPTIONS",
            Route::CaseHistory(_) | Route::VictimsForCase(_) | Route::Evidence(_) => "GET, OPTIONS",
            Route::Report(_) => "PATCH, OPTIONS",
            Route::Victims => "POST, OPTIONS",
            Route::Victim(_) => "GET, PATCH, OPTIONS",
        }
    }
}

/// Route a collected request to its handler
pub async fn dispatch(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Bytes>,
) -> Response<Full<Bytes>> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let Some(route) = Route::resolve(&path) else {
        return match method {
            Method::OPTIONS => preflight_response("GET, POST, PATCH, DELETE, OPTIONS"),
            _ => not_found_response(&path),
        };
    };

    let result = match (&method, route) {
        (&Method::OPTIONS, route) => Ok(preflight_response(route.allow())),

        (&Method::GET, Route::Health) => Ok(health_check(&state)),
        (&Method::GET, Route::Ready) => Ok(readiness_check(&state).await),
        (&Method::GET, Route::Version) => Ok(version_info()),

        (&Method::POST, Route::Cases) => cases::create_case(&state, addr, req).await,
        (&Method::GET, Route::Cases) => cases::list_cases(&state, &req).await,
        (&Method::GET, Route::Case(id)) => cases::get_case(&state, id).await,
        (&Method::PATCH, Route::Case(id)) => cases::update_case_status(&state, addr, id, &req).await,
        (&Method::DELETE, Route::Case(id)) => cases::delete_case(&state, addr, id).await,
        (&Method::GET, Route::CaseHistory(id)) => cases::case_history(&state, id).await,

        (&Method::POST, Route::Reports) => reports::create_report(&state, addr, req).await,
        (&Method::GET, Route::Reports) => reports::list_reports(&state, &req).await,
        (&Method::PATCH, Route::Report(id)) => {
            reports::update_report_status(&state, addr, id, &req).await
        }

        (&Method::POST, Route::Victims) => victims::add_victim(&state, addr, &req).await,
        (&Method::GET, Route::Victim(id)) => victims::get_victim(&state, id).await,
        (&Method::PATCH, Route::Victim(id)) => victims::update_risk_level(&state, addr, id, &req).await,
        (&Method::GET, Route::VictimsForCase(id)) => victims::list_victims_by_case(&state, id).await,

        (&Method::GET, Route::Evidence(key)) => evidence::serve_evidence(&state, key).await,

        (_, route) => Ok(method_not_allowed_response(&path, route.allow())),
    };

    result.unwrap_or_else(HrmError::into_response)
}

/// Serialize `data` as a JSON response with CORS headers
pub fn json_response<T: Serialize>(status: StatusCode, data: &T) -> Response<Full<Bytes>> {
    let body = serde_json::to_string(data)
        .unwrap_or_else(|_| r#"{"error":"Serialization failed"}"#.to_string());

    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(Full::new(Bytes::from(body)))
        .unwrap_or_else(|_| Response::new(Full::new(Bytes::new())))
}

/// CORS preflight response
fn preflight_response(allow: &'static str) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = StatusCode::NO_CONTENT;
    let headers = response.headers_mut();
    headers.insert("Access-Control-Allow-Origin", HeaderValue::from_static("*"));
    headers.insert("Access-Control-Allow-Headers", HeaderValue::from_static("*"));
    headers.insert("Access-Control-Allow-Methods", HeaderValue::from_static(allow));
    response
}

fn not_found_response(path: &str) -> Response<Full<Bytes>> {
    json_response(
        StatusCode::NOT_FOUND,
        &serde_json::json!({ "error": "Not Found", "path": path }),
    )
}

fn method_not_allowed_response(path: &str, allow: &'static str) -> Response<Full<Bytes>> {
    let mut response = json_response(
        StatusCode::METHOD_NOT_ALLOWED,
        &serde_json::json!({ "error": "Method Not Allowed", "path": path }),
    );
    response
        .headers_mut()
        .insert("Allow", HeaderValue::from_static(allow));
    response
}

/// Decode the query string into `T`; a missing query decodes as empty
pub(crate) fn parse_query<T: DeserializeOwned>(req: &Request<Bytes>) -> Result<T, HrmError> {
    let query = req.uri().query().unwrap_or_default();
    serde_urlencoded::from_str(query)
        .map_err(|e| HrmError::BadRequest(format!("Invalid query string: {}", e)))
}

/// Decode a JSON request body
pub(crate) fn parse_json<T: DeserializeOwned>(req: &Request<Bytes>) -> Result<T, HrmError> {
    if req.body().is_empty() {
        return Err(HrmError::BadRequest("Request body is required".to_string()));
    }
    Ok(serde_json::from_slice(req.body())?)
}

pub(crate) fn content_type(req: &Request<Bytes>) -> Option<&str> {
    req.headers().get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_resolution() {
        assert_eq!(Route::resolve("/healthz"), Some(Route::Health));
        assert_eq!(Route::resolve("/reports/"), Some(Route::Reports));
        assert_eq!(Route::resolve("/cases/abc"), Some(Route::Case("abc")));
        assert_eq!(Route::resolve("/cases/abc/history"), Some(Route::CaseHistory("abc")));
        assert_eq!(Route::resolve("/victims/case/abc"), Some(Route::VictimsForCase("abc")));
        assert_eq!(Route::resolve("/victims/abc"), Some(Route::Victim("abc")));
        assert_eq!(Route::resolve("/"), None);
        assert_eq!(Route::resolve("/cases/a/b/c"), None);
    }

    #[test]
    fn test_json_response_headers() {
        let response = json_response(StatusCode::CREATED, &serde_json::json!({ "id": "x" }));
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()["Content-Type"], "application/json");
        assert_eq!(response.headers()["Access-Control-Allow-Origin"], "*");
    }
}
