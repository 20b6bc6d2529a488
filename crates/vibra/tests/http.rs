use std::env;
use std::time::Duration;

use anyhow::Result;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;
use uuid::Uuid;
use vibra::routes::router;
use vibra::state::AppState;
use vibra_core::db;

const BOUNDARY: &str = "vibra-test-boundary";

fn multipart_upload(filename: Option<&str>, content: &str) -> Request<Body> {
    let disposition = match filename {
        Some(name) => format!("form-data; name=\"file\"; filename=\"{name}\""),
        None => "form-data; name=\"file\"".to_string(),
    };
    let body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: {disposition}\r\n\r\n{content}\r\n--{BOUNDARY}--\r\n"
    );
    Request::builder()
        .method("POST")
        .uri("/upload-signal-data")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .expect("build upload request")
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("build get request")
}

async fn json_body(response: axum::response::Response) -> Result<serde_json::Value> {
    let bytes = response.into_body().collect().await?.to_bytes();
    Ok(serde_json::from_slice(&bytes)?)
}

#[tokio::test]
async fn upload_without_filename_is_rejected() {
    // A lazy pool never connects; the filename check happens first.
    let pool = sqlx::postgres::PgPoolOptions::new()
        .connect_lazy("postgres://localhost/vibra_unreachable")
        .expect("lazy pool");
    let app = router(AppState::new(pool));

    let response = app
        .oneshot(multipart_upload(None, "hello"))
        .await
        .expect("request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn upload_roundtrip_over_http() -> Result<()> {
    let database_url = match env::var("VIBRA_TEST_DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("Skipping HTTP integration test because VIBRA_TEST_DATABASE_URL is not set");
            return Ok(());
        }
    };

    let pool = db::connect(&database_url).await?;
    db::run_migrations(&pool).await?;
    let app = router(AppState::new(pool));

    let csv = "measured_at,rotating_speed,signal\n2024-01-01T00:00:00,1500,\"[1,2,3]\"\n";
    let response = app
        .clone()
        .oneshot(multipart_upload(Some("spin.csv"), csv))
        .await
        .expect("upload request");
    assert_eq!(response.status(), StatusCode::OK);

    let upload = json_body(response).await?;
    let id = upload["id"].as_str().expect("upload id").to_string();
    assert_eq!(upload["filename"], "spin.csv");
    assert_eq!(upload["file_type"], "text");
    assert_eq!(upload["status"], "processing");

    // Ingestion runs in a spawned task; poll until the status turns
    // terminal.
    let mut status = String::new();
    for _ in 0..50 {
        let response = app
            .clone()
            .oneshot(get_request(&format!("/uploaded-files/{id}")))
            .await
            .expect("status request");
        assert_eq!(response.status(), StatusCode::OK);
        status = json_body(response).await?["status"]
            .as_str()
            .expect("status field")
            .to_string();
        if status != "pending" && status != "processing" {
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert_eq!(status, "completed");

    let response = app
        .clone()
        .oneshot(get_request(&format!("/uploaded-files/{id}/measurements")))
        .await
        .expect("measurements request");
    assert_eq!(response.status(), StatusCode::OK);
    let measurements = json_body(response).await?;
    let rows = measurements.as_array().expect("measurement array");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["uploaded_file_id"].as_str(), Some(id.as_str()));
    assert_eq!(rows[0]["signal"], serde_json::json!([1.0, 2.0, 3.0]));

    let response = app
        .clone()
        .oneshot(get_request("/uploaded-files"))
        .await
        .expect("listing request");
    assert_eq!(response.status(), StatusCode::OK);
    let listing = json_body(response).await?;
    assert!(listing
        .as_array()
        .expect("upload array")
        .iter()
        .any(|u| u["id"].as_str() == Some(id.as_str())));

    let response = app
        .clone()
        .oneshot(get_request(&format!("/uploaded-files/{}", Uuid::new_v4())))
        .await
        .expect("missing upload request");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    Ok(())
}
