// crates/vibra-core/src/repository.rs

use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::db::DbPool;
use crate::error::Result;
use crate::types::{NewMeasurement, SignalMeasurement, UploadStatus, UploadedFile};

const UPLOAD_COLUMNS: &str = "id, filename, upload_timestamp, status, file_type";

/// Register a new upload with status `pending`. The id assigned here is
/// the handle every later pipeline step uses.
pub async fn create_upload(pool: &DbPool, filename: &str, file_type: &str) -> Result<UploadedFile> {
    let upload = sqlx::query_as::<_, UploadedFile>(
        "INSERT INTO uploaded_files (id, filename, upload_timestamp, status, file_type)
         VALUES ($1, $2, now(), 'pending', $3)
         RETURNING id, filename, upload_timestamp, status, file_type",
    )
    .bind(Uuid::new_v4())
    .bind(filename)
    .bind(file_type)
    .fetch_one(pool)
    .await?;
    Ok(upload)
}

pub async fn get_upload(pool: &DbPool, id: Uuid) -> Result<Option<UploadedFile>> {
    let upload = sqlx::query_as::<_, UploadedFile>(&format!(
        "SELECT {UPLOAD_COLUMNS} FROM uploaded_files WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(upload)
}

pub async fn list_uploads(pool: &DbPool) -> Result<Vec<UploadedFile>> {
    let uploads = sqlx::query_as::<_, UploadedFile>(&format!(
        "SELECT {UPLOAD_COLUMNS} FROM uploaded_files ORDER BY upload_timestamp DESC"
    ))
    .fetch_all(pool)
    .await?;
    Ok(uploads)
}

/// Single-field status update, visible to subsequent reads of the upload.
pub async fn set_upload_status(pool: &DbPool, id: Uuid, status: UploadStatus) -> Result<()> {
    sqlx::query("UPDATE uploaded_files SET status = $1 WHERE id = $2")
        .bind(status)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Status update participating in an existing transaction, so measurement
/// inserts and the `completed` write commit or roll back together.
pub async fn set_upload_status_in_transaction(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
    status: UploadStatus,
) -> Result<()> {
    sqlx::query("UPDATE uploaded_files SET status = $1 WHERE id = $2")
        .bind(status)
        .bind(id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

/// Bulk insert within the caller's transaction; all rows land or none do.
pub async fn insert_measurements(
    tx: &mut Transaction<'_, Postgres>,
    measurements: &[NewMeasurement],
) -> Result<()> {
    for measurement in measurements {
        sqlx::query(
            "INSERT INTO signal_measurements (
                 id, uploaded_file_id, facility_name, facility_section_name,
                 machine_name, measurement_point_name, measured_at,
                 rotating_speed, signal_unit, sampling_rate_hz, signal
             )
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(Uuid::new_v4())
        .bind(measurement.uploaded_file_id)
        .bind(&measurement.facility_name)
        .bind(&measurement.facility_section_name)
        .bind(&measurement.machine_name)
        .bind(&measurement.measurement_point_name)
        .bind(measurement.measured_at)
        .bind(measurement.rotating_speed)
        .bind(&measurement.signal_unit)
        .bind(measurement.sampling_rate_hz)
        .bind(&measurement.signal)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

pub async fn list_measurements(
    pool: &DbPool,
    uploaded_file_id: Uuid,
) -> Result<Vec<SignalMeasurement>> {
    let measurements = sqlx::query_as::<_, SignalMeasurement>(
        "SELECT id, uploaded_file_id, facility_name, facility_section_name,
                machine_name, measurement_point_name, measured_at,
                rotating_speed, signal_unit, sampling_rate_hz, signal
         FROM signal_measurements
         WHERE uploaded_file_id = $1
         ORDER BY measured_at, id",
    )
    .bind(uploaded_file_id)
    .fetch_all(pool)
    .await?;
    Ok(measurements)
}
