use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use uuid::Uuid;
use vibra_core::error::PipelineError;
use vibra_core::types::{DeclaredType, SignalMeasurement, UploadStatus, UploadedFile};
use vibra_core::{repository, status};

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/upload-signal-data", post(upload_signal_data))
        .route("/uploaded-files", get(list_uploaded_files))
        .route("/uploaded-files/{id}", get(get_uploaded_file))
        .route(
            "/uploaded-files/{id}/measurements",
            get(list_upload_measurements),
        )
        .with_state(state)
}

/// Accept a signal data file and schedule its ingestion. The response
/// carries the upload row; callers poll its status for the outcome.
async fn upload_signal_data(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadedFile>, StatusCode> {
    let mut file: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| StatusCode::BAD_REQUEST)?
    {
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        let bytes = field.bytes().await.map_err(|_| StatusCode::BAD_REQUEST)?;
        file = Some((filename, bytes.to_vec()));
        break;
    }

    let Some((filename, content)) = file else {
        return Err(StatusCode::BAD_REQUEST);
    };
    if filename.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let file_type = DeclaredType::from_filename(&filename);
    let mut upload = repository::create_upload(&state.pool, &filename, file_type.as_str())
        .await
        .map_err(internal_error)?;

    // Scheduling owns the pending -> processing transition; everything
    // after that belongs to the pipeline.
    repository::set_upload_status(&state.pool, upload.id, UploadStatus::Processing)
        .await
        .map_err(internal_error)?;
    upload.status = UploadStatus::Processing;

    let pool = state.pool.clone();
    let upload_id = upload.id;
    let declared = upload.file_type.clone();
    tokio::spawn(async move {
        if let Err(err) = status::process_upload(&pool, upload_id, &content, &declared).await {
            tracing::error!(upload_id = %upload_id, error = %err, "upload processing failed");
        }
    });

    Ok(Json(upload))
}

async fn list_uploaded_files(
    State(state): State<AppState>,
) -> Result<Json<Vec<UploadedFile>>, StatusCode> {
    repository::list_uploads(&state.pool)
        .await
        .map(Json)
        .map_err(internal_error)
}

async fn get_uploaded_file(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<UploadedFile>, StatusCode> {
    repository::get_upload(&state.pool, id)
        .await
        .map_err(internal_error)?
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn list_upload_measurements(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<SignalMeasurement>>, StatusCode> {
    let upload = repository::get_upload(&state.pool, id)
        .await
        .map_err(internal_error)?;
    if upload.is_none() {
        return Err(StatusCode::NOT_FOUND);
    }

    repository::list_measurements(&state.pool, id)
        .await
        .map(Json)
        .map_err(internal_error)
}

fn internal_error(err: PipelineError) -> StatusCode {
    tracing::error!(error = %err, "request failed");
    StatusCode::INTERNAL_SERVER_ERROR
}
