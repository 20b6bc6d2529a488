use tracing::error;
use uuid::Uuid;

use crate::db::DbPool;
use crate::error::Result;
use crate::ingestion::{self, IngestionReport};
use crate::repository;
use crate::types::UploadStatus;

/// Terminal status for an ingestion outcome.
///
/// An empty report means `completed_no_data`, whether the file was
/// legitimately empty or every record was rejected; that is not a system
/// failure. Only an error that escaped per-record isolation (unsupported
/// declared type, non-UTF-8 text upload) marks the upload `failed`.
pub fn terminal_status(outcome: &Result<IngestionReport>) -> UploadStatus {
    match outcome {
        Ok(report) if !report.measurements.is_empty() => UploadStatus::Completed,
        Ok(_) => UploadStatus::CompletedNoData,
        Err(_) => UploadStatus::Failed,
    }
}

/// Persist an ingestion outcome and write the upload's terminal status.
/// This is the only place that mutates upload state after ingestion.
///
/// Measurements and the `completed` status are committed in one
/// transaction, so a failed insert never leaves an upload marked done.
/// Persistence errors propagate to the caller; they are never swallowed.
pub async fn finalize_upload(
    pool: &DbPool,
    upload_id: Uuid,
    outcome: Result<IngestionReport>,
) -> Result<UploadStatus> {
    let status = terminal_status(&outcome);

    match outcome {
        Ok(report) if !report.measurements.is_empty() => {
            let mut tx = pool.begin().await?;
            repository::insert_measurements(&mut tx, &report.measurements).await?;
            repository::set_upload_status_in_transaction(&mut tx, upload_id, status).await?;
            tx.commit().await?;
        }
        Ok(_) => {
            repository::set_upload_status(pool, upload_id, status).await?;
        }
        Err(err) => {
            error!(upload_id = %upload_id, error = %err, "ingestion failed");
            repository::set_upload_status(pool, upload_id, status).await?;
        }
    }

    Ok(status)
}

/// Run one upload end to end: dispatch to the right parser, aggregate,
/// persist, and write the terminal status.
pub async fn process_upload(
    pool: &DbPool,
    upload_id: Uuid,
    content: &[u8],
    declared_type: &str,
) -> Result<UploadStatus> {
    let outcome = ingestion::ingest(content, declared_type, upload_id);
    finalize_upload(pool, upload_id, outcome).await
}
