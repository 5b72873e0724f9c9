//! Analytics dashboard
//!
//! Read-only view over `incident_reports`. The `hrm-dashboard` binary either
//! serves it over HTTP or writes a static copy with all exports.
//!
//! - `GET /` - the page for the query-string filter
//! - `GET /export/{violations|countries|timeline}.{csv|xlsx}` - downloads

pub mod charts;
pub mod export;
pub mod page;

pub use export::{parse_export_name, write_all, ExportFormat, ExportKind};
pub use page::{render_page, ExportLinks, NO_DATA};

use bytes::Bytes;
use http_body_util::Full;
use hyper::header::HeaderValue;
use hyper::{Method, Request, Response, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::analytics::AnalyticsFilter;
use crate::routes::json_response;
use crate::store::Stores;
use crate::types::HrmError;

/// Query string accepted by every dashboard route
#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    pub from: Option<String>,
    pub to: Option<String>,
    pub violation_type: Option<String>,
    pub country: Option<String>,
}

impl DashboardQuery {
    pub fn into_filter(self) -> Result<AnalyticsFilter, HrmError> {
        AnalyticsFilter::parse(
            self.from.as_deref(),
            self.to.as_deref(),
            self.violation_type.as_deref(),
            self.country.as_deref(),
        )
    }
}

/// Route a dashboard request
pub async fn dispatch(stores: Arc<Stores>, req: Request<Bytes>) -> Response<Full<Bytes>> {
    let path = req.uri().path().to_string();

    if req.method() != Method::GET {
        let mut response = json_response(
            StatusCode::METHOD_NOT_ALLOWED,
            &serde_json::json!({ "error": "Method Not Allowed", "path": path }),
        );
        response
            .headers_mut()
            .insert("Allow", HeaderValue::from_static("GET"));
        return response;
    }
    let result = match path.as_str() {
        "/" => show_page(&stores, &req).await,
        _ => match path.strip_prefix("/export/").and_then(parse_export_name) {
            Some((kind, format)) => download(&stores, &req, kind, format).await,
            None => Err(HrmError::NotFound(format!("No dashboard resource at {}", path))),
        },
    };

    result.unwrap_or_else(HrmError::into_response)
}

fn filter_from(req: &Request<Bytes>) -> Result<AnalyticsFilter, HrmError> {
    let query: DashboardQuery = serde_urlencoded::from_str(req.uri().query().unwrap_or_default())
        .map_err(|e| HrmError::BadRequest(format!("Invalid query string: {}", e)))?;
    query.into_filter()
}

async fn show_page(stores: &Stores, req: &Request<Bytes>) -> Result<Response<Full<Bytes>>, HrmError> {
    let filter = filter_from(req)?;
    let data = stores.dashboard(&filter).await?;
    let html = render_page(&filter, &data, ExportLinks::Served);

    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "text/html; charset=utf-8")
        .header("Cache-Control", "no-store")
        .body(Full::new(Bytes::from(html)))
        .map_err(|e| HrmError::Internal(format!("Failed to build response: {}", e)))
}

async fn download(
    stores: &Stores,
    req: &Request<Bytes>,
    kind: ExportKind,
    format: ExportFormat,
) -> Result<Response<Full<Bytes>>, HrmError> {
    let filter = filter_from(req)?;
    let data = stores.dashboard(&filter).await?;
    let body = export::render(kind, format, &data)?;
    let name = export::file_name(kind, format);
    info!(file = %name, rows = kind.rows(&data).len(), "Dashboard export");

    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", format.content_type())
        .header("Content-Disposition", format!("attachment; filename=\"{}\"", name))
        .body(Full::new(Bytes::from(body)))
        .map_err(|e| HrmError::Internal(format!("Failed to build response: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    fn get(uri: &str) -> Request<Bytes> {
        Request::builder().uri(uri).body(Bytes::new()).unwrap()
    }

    async fn body_text(response: Response<Full<Bytes>>) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_empty_page() {
        let stores = Arc::new(Stores::memory());
        let response = dispatch(stores, get("/?from=2024-01-01&to=2024-01-31")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains(NO_DATA));
    }

    #[tokio::test]
    async fn test_export_headers() {
        let stores = Arc::new(Stores::memory());
        let response = dispatch(stores, get("/export/countries.csv")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()["Content-Disposition"],
            "attachment; filename=\"countries.csv\""
        );
        assert_eq!(body_text(response).await, "Country,Count\n");
    }

    #[tokio::test]
    async fn test_bad_routes() {
        let stores = Arc::new(Stores::memory());
        let response = dispatch(stores.clone(), get("/export/victims.csv")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = dispatch(stores.clone(), get("/?from=2024-05-01&to=2024-01-01")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let post = Request::builder()
            .method(Method::POST)
            .uri("/")
            .body(Bytes::new())
            .unwrap();
        let response = dispatch(stores, post).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
