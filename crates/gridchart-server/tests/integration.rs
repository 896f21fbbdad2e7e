// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of gridchart.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

use std::fmt::Write as _;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use chrono::{Duration, NaiveDate};
use serde_json::{Value, json};
use tower::ServiceExt;

use gridchart_core::{CompositionRules, DatasetSnapshot, load_csv_reader};
use gridchart_server::config::ServerConfig;
use gridchart_server::{AppState, build_router};

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

const HEADER: &str = "time,generation_solar,generation_wind,generation_load_difference,total_generation,total_load";

/// Hourly rows for `days` days starting 2015-01-01, offset-aware like the
/// cleaned ENTSO-E export
fn hourly_csv(days: i64) -> String {
    let origin = NaiveDate::from_ymd_opt(2015, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let mut csv = format!("{HEADER}\n");
    for h in 0..days * 24 {
        let ts = origin + Duration::hours(h);
        let solar = if h % 24 == 12 && h < 24 {
            String::new()
        } else {
            (h % 24).to_string()
        };
        writeln!(
            csv,
            "{}+01:00,{solar},5,1,10,{}",
            ts.format("%Y-%m-%d %H:%M:%S"),
            100 + h % 24
        )
        .unwrap();
    }
    csv
}

fn test_state(csv: &str) -> AppState {
    let table = load_csv_reader(csv.as_bytes()).expect("Failed to parse test dataset");
    let snapshot = DatasetSnapshot::build(table, &CompositionRules::default());
    AppState::new(snapshot, ServerConfig::default())
}

struct TestServer {
    port: u16,
    client: reqwest::Client,
}

impl TestServer {
    async fn start() -> Self {
        Self::start_with(test_state(&hourly_csv(5))).await
    }

    async fn start_with(state: AppState) -> Self {
        let app = build_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let port = listener.local_addr().expect("No local addr").port();

        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Test server error");
        });

        Self {
            port,
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://127.0.0.1:{}{path}", self.port)
    }

    async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET")
    }

    async fn post_form(&self, path: &str, fields: &[(&str, &str)]) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .form(fields)
            .send()
            .await
            .expect("Failed to send form")
    }

    async fn post_json(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to send JSON")
    }
}

// ---------------------------------------------------------------------------
// Pages
// ---------------------------------------------------------------------------

#[tokio::test]
async fn index_links_all_forms() {
    let server = TestServer::start().await;
    let resp = server.get("/").await;
    assert_eq!(resp.status(), 200);

    let html = resp.text().await.unwrap();
    assert!(html.contains("href=\"/days_form\""));
    assert!(html.contains("href=\"/avg_form\""));
    assert!(html.contains("href=\"/composition_form\""));
    assert!(html.contains("120 rows"));
}

#[tokio::test]
async fn days_form_defaults_to_full_span() {
    let server = TestServer::start().await;
    let html = server.get("/days_form").await.text().await.unwrap();

    assert!(html.contains("<option value=\"total_load\">"));
    assert!(html.contains("value=\"5\" min=\"1\" max=\"5\""));
}

#[tokio::test]
async fn composition_form_preselects_whitelist_only() {
    let server = TestServer::start().await;
    let html = server.get("/composition_form").await.text().await.unwrap();

    assert!(html.contains("<option value=\"generation_solar\" selected>"));
    assert!(html.contains("<option value=\"generation_wind\" selected>"));
    assert!(!html.contains("generation_load_difference"));
    assert!(!html.contains("total_generation"));
    // configured default of 10 clamped to the 5-day span
    assert!(html.contains("value=\"5\" min=\"1\""));
}

#[tokio::test]
async fn avg_form_lists_time_features() {
    let server = TestServer::start().await;
    let html = server.get("/avg_form").await.text().await.unwrap();

    assert!(html.contains("<option value=\"hour_of_day\">Hour Of Day</option>"));
    assert!(html.contains("<option value=\"day_of_week\">Day Of Week</option>"));
    assert!(html.contains("<option value=\"month\">Month</option>"));
}

#[tokio::test]
async fn plot_renders_chart_page() {
    let server = TestServer::start().await;
    let resp = server
        .post_form(
            "/plot",
            &[
                ("columns", "generation_solar"),
                ("columns", "total_load"),
                ("days", "3"),
                ("stacked", "on"),
            ],
        )
        .await;
    assert_eq!(resp.status(), 200);

    let html = resp.text().await.unwrap();
    assert!(html.contains("new Chart("));
    assert!(html.contains("<title>generation_solar, total_load</title>"));
    assert!(html.contains("72 rows"));
    assert!(html.contains("\"stacked\":true"));
}

#[tokio::test]
async fn plot_without_columns_is_bad_request() {
    let server = TestServer::start().await;
    let resp = server.post_form("/plot", &[("days", "3")]).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(resp.text().await.unwrap().contains("Select at least one column"));
}

#[tokio::test]
async fn plot_with_malformed_days_is_bad_request() {
    let server = TestServer::start().await;
    let resp = server
        .post_form("/plot", &[("columns", "total_load"), ("days", "many")])
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn plot_with_only_unknown_columns_shows_message() {
    let server = TestServer::start().await;
    let resp = server
        .post_form("/plot", &[("columns", "hour_of_day")])
        .await;
    assert_eq!(resp.status(), 200);
    assert!(resp.text().await.unwrap().contains("No valid columns selected."));
}

#[tokio::test]
async fn single_day_plot() {
    let server = TestServer::start().await;
    let resp = server
        .post_form(
            "/plot",
            &[("columns", "generation_wind"), ("date", "2015-01-03")],
        )
        .await;
    assert_eq!(resp.status(), 200);
    assert!(resp.text().await.unwrap().contains("24 rows"));
}

#[tokio::test]
async fn plot_for_day_outside_dataset_reports_no_data() {
    let server = TestServer::start().await;
    let resp = server
        .post_form(
            "/plot",
            &[("columns", "generation_wind"), ("date", "2020-06-01")],
        )
        .await;
    assert_eq!(resp.status(), 200);
    assert!(resp.text().await.unwrap().contains("No data in the selected range."));
}

#[tokio::test]
async fn avg_plot_uses_feature_axis() {
    let server = TestServer::start().await;
    let resp = server
        .post_form(
            "/avg_plot",
            &[("columns_avg", "total_load"), ("time_feature", "hour_of_day")],
        )
        .await;
    assert_eq!(resp.status(), 200);

    let html = resp.text().await.unwrap();
    assert!(html.contains("Hour Of Day"));
    assert!(html.contains("120 rows"));
}

#[tokio::test]
async fn avg_plot_with_unknown_feature_is_bad_request() {
    let server = TestServer::start().await;
    let resp = server
        .post_form(
            "/avg_plot",
            &[("columns_avg", "total_load"), ("time_feature", "week_of_year")],
        )
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn composition_plot_drops_non_generation_columns() {
    let server = TestServer::start().await;
    let resp = server
        .post_form(
            "/composition_plot",
            &[
                ("columns_comp", "generation_solar"),
                ("columns_comp", "generation_wind"),
                ("columns_comp", "not_a_real_column"),
                ("days", "2"),
            ],
        )
        .await;
    assert_eq!(resp.status(), 200);

    let html = resp.text().await.unwrap();
    assert!(html.contains("Generation Composition"));
    assert!(html.contains("\"label\":\"generation_wind\""));
    assert!(!html.contains("not_a_real_column"));
    assert!(html.contains("25 rows"));
}

#[tokio::test]
async fn composition_plot_without_generation_columns() {
    let server = TestServer::start().await;
    let resp = server
        .post_form(
            "/composition_plot",
            &[
                ("columns_comp", "total_generation"),
                ("columns_comp", "generation_load_difference"),
            ],
        )
        .await;
    assert_eq!(resp.status(), 200);
    assert!(
        resp.text()
            .await
            .unwrap()
            .contains("No valid generation columns selected.")
    );
}

// ---------------------------------------------------------------------------
// JSON API
// ---------------------------------------------------------------------------

#[tokio::test]
async fn api_columns_describes_dataset() {
    let server = TestServer::start().await;
    let body: Value = server.get("/api/columns").await.json().await.unwrap();

    assert_eq!(body["rows"], 120);
    assert_eq!(body["span_days"], 5);
    assert_eq!(
        body["composition_columns"],
        json!(["generation_solar", "generation_wind"])
    );
    assert_eq!(body["columns"].as_array().unwrap().len(), 5);
    assert_eq!(body["first_timestamp"], "2015-01-01T00:00:00");
    assert_eq!(body["time_features"][2]["domain"], json!([1, 12]));
}

#[tokio::test]
async fn api_plot_sliding_window() {
    let server = TestServer::start().await;
    let resp = server
        .post_json(
            "/api/plot",
            &json!({
                "columns": ["total_load", "bogus"],
                "labels": {"total_load": "Load"},
                "days": 3
            }),
        )
        .await;
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["rows"], 72);
    assert_eq!(body["day_count"], 3);
    assert_eq!(body["stacked"], false);
    assert_eq!(body["series"].as_array().unwrap().len(), 1);
    assert_eq!(body["series"][0]["label"], "Load");
    assert_eq!(body["series"][0]["x"][0], "2015-01-03T00:00:00");
}

#[tokio::test]
async fn api_plot_clamps_day_count() {
    let server = TestServer::start().await;
    let body: Value = server
        .post_json("/api/plot", &json!({"columns": ["total_load"], "days": 0}))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["day_count"], 1);
    assert_eq!(body["rows"], 24);

    let body: Value = server
        .post_json(
            "/api/plot",
            &json!({"columns": ["total_load"], "days": 100_000}),
        )
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["day_count"], 5);
    assert_eq!(body["rows"], 120);
}

#[tokio::test]
async fn api_avg_plot_excludes_missing_values() {
    let server = TestServer::start().await;
    let body: Value = server
        .post_json(
            "/api/avg_plot",
            &json!({"columns": ["generation_solar"], "time_feature": "hour_of_day"}),
        )
        .await
        .json()
        .await
        .unwrap();

    let series = &body["series"][0];
    assert_eq!(series["x"].as_array().unwrap().len(), 24);
    // hour 12 has one missing cell out of five; the mean is still 12
    assert_eq!(series["y"][12], 12.0);
}

#[tokio::test]
async fn api_composition_zero_fills_and_stacks() {
    let server = TestServer::start().await;
    let body: Value = server
        .post_json(
            "/api/composition_plot",
            &json!({"columns": ["generation_solar"], "days": 5}),
        )
        .await
        .json()
        .await
        .unwrap();

    assert_eq!(body["stacked"], true);
    assert_eq!(body["title"], "Generation Composition");
    assert_eq!(body["series"][0]["y"][12], 0.0);
}

#[tokio::test]
async fn api_no_valid_columns_is_unprocessable() {
    let server = TestServer::start().await;
    let resp = server
        .post_json(
            "/api/composition_plot",
            &json!({"columns": ["total_load"]}),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "No valid columns selected.");
}

#[tokio::test]
async fn api_rejects_empty_column_list() {
    let server = TestServer::start().await;
    let resp = server
        .post_json("/api/plot", &json!({"columns": []}))
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn api_export_returns_csv_attachment() {
    let server = TestServer::start().await;
    let resp = server
        .get("/api/export?columns=generation_wind&columns=nope&columns=total_load&days=1")
        .await;
    assert_eq!(resp.status(), 200);
    assert!(
        resp.headers()[header::CONTENT_TYPE.as_str()]
            .to_str()
            .unwrap()
            .starts_with("text/csv")
    );
    assert_eq!(
        resp.headers()[header::CONTENT_DISPOSITION.as_str()],
        "attachment; filename=\"gridchart_export_20150105_230000.csv\""
    );

    let text = resp.text().await.unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 25);
    assert_eq!(lines[0], "timestamp,generation_wind,total_load");
    assert_eq!(lines[1], "2015-01-05 00:00:00,5,100");
}

// ---------------------------------------------------------------------------
// Health, reload and CORS
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_reports_ok_and_empty() {
    let server = TestServer::start().await;
    let resp = server.get("/health").await;
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "OK");

    let empty = TestServer::start_with(test_state(&format!("{HEADER}\n"))).await;
    let resp = empty.get("/health").await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(resp.text().await.unwrap(), "EMPTY");
}

#[tokio::test]
async fn reload_publishes_new_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("energy_clean.csv");
    std::fs::write(&path, hourly_csv(2)).unwrap();

    let mut config = ServerConfig::default();
    config.dataset.path.clone_from(&path);
    let state = AppState::load(config).unwrap();
    let server = TestServer::start_with(state.clone()).await;

    let body: Value = server.get("/api/columns").await.json().await.unwrap();
    assert_eq!(body["rows"], 48);

    std::fs::write(&path, hourly_csv(3)).unwrap();
    assert_eq!(state.reload().unwrap(), 72);
    let body: Value = server.get("/api/columns").await.json().await.unwrap();
    assert_eq!(body["rows"], 72);

    // a broken file keeps the previous snapshot
    std::fs::write(&path, "time,a\nnot-a-date,1\n").unwrap();
    assert!(state.reload().is_err());
    let body: Value = server.get("/api/columns").await.json().await.unwrap();
    assert_eq!(body["rows"], 72);
}

#[tokio::test]
async fn cors_allows_localhost_on_any_port() {
    let app = build_router(test_state(&hourly_csv(1)));

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .header(header::ORIGIN, "http://localhost:5173")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:5173"
    );
    assert_eq!(
        resp.headers()[header::ACCESS_CONTROL_ALLOW_CREDENTIALS],
        "true"
    );

    let resp = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .header(header::ORIGIN, "http://evil.example")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert!(
        !resp
            .headers()
            .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN)
    );
}

#[tokio::test]
async fn form_post_via_router() {
    let app = build_router(test_state(&hourly_csv(2)));
    let resp = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/composition_plot")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("columns_comp=generation_solar&days=1"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("1 rows"));
}
