//! End-to-end handler tests over the in-memory store

use bytes::Bytes;
use clap::Parser;
use http_body_util::{BodyExt, Full};
use hyper::{Method, Request, Response, StatusCode};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use hrm::analytics::AnalyticsFilter;
use hrm::config::Args;
use hrm::evidence::EvidenceVault;
use hrm::logging::AuditLogger;
use hrm::routes;
use hrm::server::{self, AppState};
use hrm::store::{MemoryStore, ReportFilter, ReportStore, Stores};

const BOUNDARY: &str = "hrm-test-boundary";

struct TestApp {
    state: Arc<AppState>,
    memory: Arc<MemoryStore>,
    _uploads: tempfile::TempDir,
}

impl TestApp {
    async fn new() -> Self {
        Self::with_args(&[]).await
    }

    async fn with_args(extra: &[&str]) -> Self {
        let uploads = tempfile::tempdir().unwrap();
        let mut argv = vec!["hrm"];
        argv.extend_from_slice(extra);
        let args = Args::parse_from(argv);

        let memory = Arc::new(MemoryStore::new());
        let stores = Stores::from_memory(memory.clone());
        let evidence = EvidenceVault::open(uploads.path()).await.unwrap();
        let state = Arc::new(AppState::new(args, stores, evidence, AuditLogger::disabled()));

        Self {
            state,
            memory,
            _uploads: uploads,
        }
    }

    async fn send(&self, req: Request<Bytes>) -> Response<Full<Bytes>> {
        let addr: SocketAddr = "127.0.0.1:40000".parse().unwrap();
        routes::dispatch(Arc::clone(&self.state), addr, req).await
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        let req = Request::builder().uri(uri).body(Bytes::new()).unwrap();
        into_json(self.send(req).await).await
    }

    async fn json(&self, method: Method, uri: &str, body: Value) -> (StatusCode, Value) {
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .header("Content-Type", "application/json")
            .body(Bytes::from(body.to_string()))
            .unwrap();
        into_json(self.send(req).await).await
    }

    async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        let req = Request::builder()
            .method(Method::DELETE)
            .uri(uri)
            .body(Bytes::new())
            .unwrap();
        into_json(self.send(req).await).await
    }

    async fn form(&self, uri: &str, fields: &[(&str, &str)]) -> (StatusCode, Value) {
        let body = serde_urlencoded::to_string(fields).unwrap();
        let req = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(Bytes::from(body))
            .unwrap();
        into_json(self.send(req).await).await
    }

    async fn multipart(
        &self,
        uri: &str,
        fields: &[(&str, &str)],
        file: (&str, &str, &[u8]),
    ) -> (StatusCode, Value) {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                    BOUNDARY, name, value
                )
                .as_bytes(),
            );
        }
        let (filename, content_type, data) = file;
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                BOUNDARY, filename, content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

        let req = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(
                "Content-Type",
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Bytes::from(body))
            .unwrap();
        into_json(self.send(req).await).await
    }

    async fn create_case(&self, title: &str, country: &str, occurred: &str) -> String {
        let (status, body) = self
            .form(
                "/cases",
                &[
                    ("title", title),
                    ("description", "Detained without charge"),
                    ("violation_types", "Arbitrary Arrest,torture"),
                    ("country", country),
                    ("region", "North"),
                    ("date_occurred", occurred),
                    ("date_reported", "2024-06-01"),
                ],
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["id"].as_str().unwrap().to_string()
    }

    async fn submit_report(&self, country: &str, city: &str, date: &str, violations: &str) -> String {
        let (status, body) = self
            .form("/reports", &report_fields(country, city, date, violations, false))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["id"].as_str().unwrap().to_string()
    }
}

fn report_fields<'a>(
    country: &'a str,
    city: &'a str,
    date: &'a str,
    violations: &'a str,
    anonymous: bool,
) -> Vec<(&'a str, &'a str)> {
    vec![
        ("reporter_type", "individual"),
        ("anonymous", if anonymous { "true" } else { "false" }),
        ("email", "witness@example.org"),
        ("phone", "+961000000"),
        ("preferred_contact", "email"),
        ("date", date),
        ("country", country),
        ("city", city),
        ("latitude", "33.89"),
        ("longitude", "35.50"),
        ("description", "Shelling of a residential block"),
        ("violation_types", violations),
    ]
}

async fn into_json(response: Response<Full<Bytes>>) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn victim_body(cases: &[&str]) -> Value {
    json!({
        "type": "victim",
        "anonymous": false,
        "gender": "female",
        "age": 29,
        "risk_assessment": { "level": "medium", "threats": ["intimidation"], "protection_needed": true },
        "support_services": [{ "type": "legal", "provider": "Legal Aid Network", "status": "active" }],
        "cases_involved": cases,
    })
}

// ---- health ----

#[tokio::test]
async fn health_reports_memory_store() {
    let app = TestApp::new().await;
    let (status, body) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["healthy"], true);
    assert_eq!(body["store"], "memory");

    let (status, body) = app.get("/readyz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ready"], true);
}

#[tokio::test]
async fn unknown_route_and_wrong_method() {
    let app = TestApp::new().await;
    let (status, body) = app.get("/nowhere").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["path"], "/nowhere");

    let (status, _) = app.delete("/reports").await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

// ---- cases ----

#[tokio::test]
async fn new_case_defaults_to_status_new() {
    let app = TestApp::new().await;
    let id = app.create_case("Detention in Aleppo", "Syria", "2024-03-10").await;

    let (status, body) = app.get(&format!("/cases/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "new");
    assert_eq!(body["priority"], "medium");
    assert_eq!(body["date_occurred"], "2024-03-10");
    assert_eq!(body["violation_types"], json!(["arbitrary_arrest", "torture"]));
}

#[tokio::test]
async fn case_create_rejects_bad_input() {
    let app = TestApp::new().await;

    let (status, body) = app
        .form("/cases", &[("title", "Missing everything else")])
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Missing required field"));

    let (status, body) = app
        .form(
            "/cases",
            &[
                ("title", "t"),
                ("description", "d"),
                ("violation_types", "torture"),
                ("country", "Iraq"),
                ("region", "Baghdad"),
                ("date_occurred", "10/03/2024"),
                ("date_reported", "2024-03-11"),
            ],
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid date format. Use YYYY-MM-DD");
}

#[tokio::test]
async fn case_list_excludes_dates_outside_range() {
    let app = TestApp::new().await;
    app.create_case("January", "Syria", "2024-01-15").await;
    app.create_case("March", "Syria", "2024-03-01").await;
    app.create_case("May", "Iraq", "2024-05-20").await;

    let (status, body) = app.get("/cases?from_date=2024-02-01&to_date=2024-03-01").await;
    assert_eq!(status, StatusCode::OK);
    let titles: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["March"]);

    let (_, body) = app.get("/cases?country=Syria").await;
    let titles: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["March", "January"]);

    let (status, _) = app.get("/cases?from_date=March").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn status_update_appends_one_history_entry() {
    let app = TestApp::new().await;
    let id = app.create_case("Raid", "Lebanon", "2024-02-02").await;

    let (status, body) = app
        .json(Method::PATCH, &format!("/cases/{}", id), json!({ "status": "under_review" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["new_status"], "under_review");

    let (_, case) = app.get(&format!("/cases/{}", id)).await;
    assert_eq!(case["status"], "under_review");

    let (status, history) = app.get(&format!("/cases/{}/history", id)).await;
    assert_eq!(status, StatusCode::OK);
    let entries = history.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["new_status"], "under_review");

    let (status, _) = app
        .json(Method::PATCH, &format!("/cases/{}", id), json!({ "status": "escalated" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (_, history) = app.get(&format!("/cases/{}/history", id)).await;
    assert_eq!(history.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn status_update_on_missing_case_is_404() {
    let app = TestApp::new().await;
    let (status, body) = app
        .json(
            Method::PATCH,
            "/cases/65f0c0ffee0000000000beef",
            json!({ "status": "closed" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Case not found");
}

#[tokio::test]
async fn delete_case_then_404() {
    let app = TestApp::new().await;
    let id = app.create_case("Temporary", "Yemen", "2024-04-04").await;

    let (status, body) = app.delete(&format!("/cases/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Case deleted successfully");

    let (status, _) = app.get(&format!("/cases/{}", id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.delete(&format!("/cases/{}", id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.delete("/cases/not-an-id").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn case_evidence_upload_is_served_back() {
    let app = TestApp::new().await;
    let photo: &[u8] = b"\x89PNG fake image bytes";
    let (status, body) = app
        .multipart(
            "/cases",
            &[
                ("title", "Photographed damage"),
                ("description", "Photo of the site"),
                ("violation_types", "forced_displacement"),
                ("country", "Palestine"),
                ("region", "Gaza"),
                ("date_occurred", "2024-02-14"),
                ("date_reported", "2024-02-15"),
            ],
            ("site.png", "image/png", photo),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);

    let id = body["id"].as_str().unwrap();
    let (_, case) = app.get(&format!("/cases/{}", id)).await;
    let url = case["evidence"][0]["url"].as_str().unwrap().to_string();
    assert!(url.starts_with("/evidence/sha256-"));
    assert!(url.ends_with(".png"));

    let req = Request::builder().uri(url.as_str()).body(Bytes::new()).unwrap();
    let response = app.send(req).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["Content-Type"], "image/png");
    let served = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&served[..], photo);

    let (status, _) = app.get("/evidence/not-a-key").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ---- reports ----

#[tokio::test]
async fn anonymous_report_keeps_no_contact() {
    let app = TestApp::new().await;
    let (status, _) = app
        .form(
            "/reports",
            &report_fields("Lebanon", "Beirut", "2024-02-20", "unlawful_killing", true),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    app.submit_report("Lebanon", "Beirut", "2024-02-21", "torture").await;

    let reports = app.memory.find_reports(&ReportFilter::default()).await.unwrap();
    assert_eq!(reports.len(), 2);
    for report in reports {
        if report.anonymous {
            assert!(report.contact_info.email.is_none());
            assert!(report.contact_info.phone.is_none());
            assert!(report.contact_info.preferred_contact.is_none());
        } else {
            assert_eq!(report.contact_info.email.as_deref(), Some("witness@example.org"));
        }
    }
}

#[tokio::test]
async fn report_defaults_and_filters() {
    let app = TestApp::new().await;
    let id = app.submit_report("Syria", "Aleppo", "2024-01-10", "torture").await;
    app.submit_report("Iraq", "Baghdad", "2024-04-10", "arbitrary_arrest").await;

    let (status, body) = app.get("/reports/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);
    assert!(body.as_array().unwrap().iter().all(|r| r["status"] == "new"));

    let (_, body) = app.get("/reports?from_date=2024-04-01&to_date=2024-04-30").await;
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["city"], "Baghdad");

    let (_, body) = app.get("/reports?city=Aleppo").await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, body) = app
        .json(Method::PATCH, &format!("/reports/{}", id), json!({ "status": "resolved" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["changed"], true);

    let (status, body) = app
        .json(Method::PATCH, &format!("/reports/{}", id), json!({ "status": "resolved" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["changed"], false);

    let (_, body) = app.get("/reports?status=resolved").await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, _) = app
        .json(Method::PATCH, "/reports/65f0c0ffee0000000000beef", json!({ "status": "resolved" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn report_rejects_bad_coordinates_and_types() {
    let app = TestApp::new().await;
    let mut fields = report_fields("Syria", "Aleppo", "2024-01-10", "torture", false);
    fields.retain(|(k, _)| *k != "latitude");
    fields.push(("latitude", "95"));
    let (status, _) = app.form("/reports", &fields).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .form("/reports", &report_fields("Syria", "Aleppo", "2024-01-10", "looting", false))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.get("/reports?status=archived").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut fields = report_fields("Syria", "Aleppo", "2024-01-10", "torture", false);
    fields.retain(|(k, _)| *k != "anonymous");
    let (status, body) = app.form("/reports", &fields).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing required field: anonymous");
}

#[tokio::test]
async fn out_of_shape_dates_are_rejected() {
    let app = TestApp::new().await;
    app.create_case("Raid", "Syria", "2024-01-15").await;
    app.submit_report("Syria", "Aleppo", "2024-01-10", "torture").await;

    for uri in [
        "/cases?to=%2B262142-12-31",
        "/cases?to_date=%2B262142-12-31",
        "/reports?to_date=%2B262142-12-31",
        "/reports?from=2024-1-5",
    ] {
        let (status, body) = app.get(uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["error"], "Invalid date format. Use YYYY-MM-DD", "{uri}");
    }

    let (status, body) = app.get("/cases?to=9999-12-31").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn oversized_body_is_413() {
    let app = TestApp::with_args(&["--max-upload-bytes", "1024"]).await;
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let local = listener.local_addr().unwrap();

    let state = Arc::clone(&app.state);
    let handler = move |addr: SocketAddr, req: Request<Bytes>| {
        routes::dispatch(Arc::clone(&state), addr, req)
    };
    let (stop, stopped) = tokio::sync::oneshot::channel::<()>();
    let server = tokio::spawn(server::serve(listener, 1024, handler, async {
        let _ = stopped.await;
    }));

    let mut stream = TcpStream::connect(local).await.unwrap();
    stream
        .write_all(
            b"POST /reports HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/x-www-form-urlencoded\r\nContent-Length: 4096\r\nConnection: close\r\n\r\n",
        )
        .await
        .unwrap();
    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    let response = String::from_utf8_lossy(&response);
    assert!(response.starts_with("HTTP/1.1 413"), "{}", response);

    let _ = stop.send(());
    server.await.unwrap().unwrap();
}

// ---- victims ----

#[tokio::test]
async fn victim_ids_malformed_vs_missing() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/victims/not-an-id").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid ID format");

    let (status, body) = app.get("/victims/65f0c0ffee0000000000beef").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Victim not found");

    let (status, _) = app
        .json(Method::PATCH, "/victims/xyz", json!({ "level": "high" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .json(Method::PATCH, "/victims/65f0c0ffee0000000000beef", json!({ "level": "high" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn victims_listed_by_case() {
    let app = TestApp::new().await;
    let case_a = app.create_case("A", "Syria", "2024-01-01").await;
    let case_b = app.create_case("B", "Iraq", "2024-01-02").await;

    let (status, first) = app.json(Method::POST, "/victims", victim_body(&[case_a.as_str()])).await;
    assert_eq!(status, StatusCode::CREATED);
    let (_, _) = app
        .json(Method::POST, "/victims/", victim_body(&[case_a.as_str(), case_b.as_str()]))
        .await;
    let (_, _) = app.json(Method::POST, "/victims", victim_body(&[case_b.as_str()])).await;

    let (status, rows) = app.get(&format!("/victims/case/{}", case_a)).await;
    assert_eq!(status, StatusCode::OK);
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().any(|r| r["_id"] == first["id"]));
    assert!(rows.iter().all(|r| r["risk"] == "medium" && r["type"] == "victim"));

    let (status, rows) = app.get("/victims/case/65f0c0ffee0000000000beef").await;
    assert_eq!(status, StatusCode::OK);
    assert!(rows.as_array().unwrap().is_empty());

    let (status, _) = app.get("/victims/case/bad").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn victim_risk_level_update() {
    let app = TestApp::new().await;
    let (_, created) = app.json(Method::POST, "/victims", victim_body(&[])).await;
    let id = created["id"].as_str().unwrap();

    let (status, body) = app
        .json(Method::PATCH, &format!("/victims/{}", id), json!({ "level": "high" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["changed"], true);

    let (status, body) = app
        .json(Method::PATCH, &format!("/victims/{}", id), json!({ "level": "high" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["changed"], false);

    let (_, victim) = app.get(&format!("/victims/{}", id)).await;
    assert_eq!(victim["risk_assessment"]["level"], "high");
    assert_eq!(victim["demographics"]["age"], 29);

    let (status, _) = app
        .json(Method::PATCH, &format!("/victims/{}", id), json!({ "level": "severe" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn case_references_checked_when_enabled() {
    let unchecked = TestApp::new().await;
    let (status, _) = unchecked
        .json(Method::POST, "/victims", victim_body(&["65f0c0ffee0000000000beef"]))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let checked = TestApp::with_args(&["--verify-case-references"]).await;
    let (status, _) = checked
        .json(Method::POST, "/victims", victim_body(&["65f0c0ffee0000000000beef"]))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let case = checked.create_case("Real", "Yemen", "2024-02-02").await;
    let (status, _) = checked.json(Method::POST, "/victims", victim_body(&[case.as_str()])).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = checked.json(Method::POST, "/victims", victim_body(&["nope"])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid case ID format");
}

// ---- analytics ----

#[tokio::test]
async fn dashboard_aggregates_submitted_reports() {
    let app = TestApp::new().await;
    app.submit_report("Syria", "Aleppo", "2024-01-10", "torture,arbitrary_arrest").await;
    app.submit_report("Syria", "Aleppo", "2024-01-10", "torture").await;
    app.submit_report("Iraq", "Baghdad", "2024-02-03", "unlawful_killing").await;
    app.submit_report("Iraq", "Baghdad", "2023-12-31", "torture").await;

    let filter = AnalyticsFilter::parse(Some("2024-01-01"), Some("2024-05-31"), None, None).unwrap();
    let data = app.state.stores.dashboard(&filter).await.unwrap();

    let violations: Vec<(&str, u64)> = data
        .violations
        .iter()
        .map(|b| (b.key.as_str(), b.count))
        .collect();
    assert_eq!(
        violations,
        vec![("torture", 2), ("arbitrary_arrest", 1), ("unlawful_killing", 1)]
    );

    let countries: Vec<(&str, u64)> = data
        .countries
        .iter()
        .map(|b| (b.key.as_str(), b.count))
        .collect();
    assert_eq!(countries, vec![("Syria", 2), ("Iraq", 1)]);

    let days: Vec<(&str, u64)> = data
        .timeline
        .iter()
        .map(|b| (b.key.as_str(), b.count))
        .collect();
    assert_eq!(days, vec![("2024-01-10", 2), ("2024-02-03", 1)]);

    let filter =
        AnalyticsFilter::parse(Some("2024-01-01"), Some("2024-05-31"), Some("torture"), Some("Iraq"))
            .unwrap();
    assert!(app.state.stores.dashboard(&filter).await.unwrap().is_empty());
}
