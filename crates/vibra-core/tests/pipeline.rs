use std::env;

use anyhow::Result;
use vibra_core::types::{DeclaredType, UploadStatus};
use vibra_core::{db, repository, status};

#[tokio::test]
async fn upload_lifecycle_roundtrip() -> Result<()> {
    let database_url = match env::var("VIBRA_TEST_DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping pipeline integration test because VIBRA_TEST_DATABASE_URL is not set"
            );
            return Ok(());
        }
    };

    let pool = db::connect(&database_url).await?;
    db::run_migrations(&pool).await?;

    // A text upload with one good and one bad row completes with data.
    let file_type = DeclaredType::from_filename("overhaul.csv");
    let upload = repository::create_upload(&pool, "overhaul.csv", file_type.as_str()).await?;
    assert_eq!(upload.status, UploadStatus::Pending);

    repository::set_upload_status(&pool, upload.id, UploadStatus::Processing).await?;

    let content = "measured_at,rotating_speed,signal\n\
                   2024-01-01T00:00:00,1500,\"[1,2]\"\n\
                   broken,1500,\"[9]\"\n";
    let outcome = status::process_upload(&pool, upload.id, content.as_bytes(), "text").await?;
    assert_eq!(outcome, UploadStatus::Completed);

    let stored = repository::get_upload(&pool, upload.id)
        .await?
        .expect("upload row present");
    assert_eq!(stored.status, UploadStatus::Completed);

    let measurements = repository::list_measurements(&pool, upload.id).await?;
    assert_eq!(measurements.len(), 1);
    assert_eq!(measurements[0].uploaded_file_id, upload.id);
    assert_eq!(measurements[0].signal, vec![1.0, 2.0]);
    assert_eq!(measurements[0].rotating_speed, 1500.0);

    // A header-only upload finishes with no data, not a failure.
    let empty = repository::create_upload(&pool, "quiet.csv", "text").await?;
    repository::set_upload_status(&pool, empty.id, UploadStatus::Processing).await?;
    let outcome =
        status::process_upload(&pool, empty.id, b"measured_at,signal\n", "text").await?;
    assert_eq!(outcome, UploadStatus::CompletedNoData);
    let stored = repository::get_upload(&pool, empty.id)
        .await?
        .expect("upload row present");
    assert_eq!(stored.status, UploadStatus::CompletedNoData);
    assert!(repository::list_measurements(&pool, empty.id)
        .await?
        .is_empty());

    // An unsupported declared type fails the upload and persists nothing.
    let odd = repository::create_upload(&pool, "mystery.xml", "xml").await?;
    repository::set_upload_status(&pool, odd.id, UploadStatus::Processing).await?;
    let outcome = status::process_upload(&pool, odd.id, b"<data/>", "xml").await?;
    assert_eq!(outcome, UploadStatus::Failed);
    let stored = repository::get_upload(&pool, odd.id)
        .await?
        .expect("upload row present");
    assert_eq!(stored.status, UploadStatus::Failed);
    assert!(repository::list_measurements(&pool, odd.id)
        .await?
        .is_empty());

    // Uploads show up in the listing.
    let uploads = repository::list_uploads(&pool).await?;
    assert!(uploads.iter().any(|u| u.id == upload.id));
    assert!(uploads.iter().any(|u| u.id == empty.id));

    Ok(())
}
