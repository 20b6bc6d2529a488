// crates/vibra-core/src/types.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{
    decode::Decode,
    encode::{Encode, IsNull},
    postgres::{PgArgumentBuffer, PgTypeInfo, PgValueRef},
    types::Type,
    FromRow, Postgres,
};
use std::error::Error as StdError;
use uuid::Uuid;
use vibra_parser::MeasurementCandidate;

use crate::error::PipelineError;

/// Lifecycle of an upload. The terminal states (`Completed`,
/// `CompletedNoData`, `Failed`) are written exactly once per upload and
/// never reopened by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadStatus {
    Pending,
    Processing,
    Completed,
    CompletedNoData,
    Failed,
}

impl UploadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadStatus::Pending => "pending",
            UploadStatus::Processing => "processing",
            UploadStatus::Completed => "completed",
            UploadStatus::CompletedNoData => "completed_no_data",
            UploadStatus::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        match s {
            "pending" => Ok(UploadStatus::Pending),
            "processing" => Ok(UploadStatus::Processing),
            "completed" => Ok(UploadStatus::Completed),
            "completed_no_data" => Ok(UploadStatus::CompletedNoData),
            "failed" => Ok(UploadStatus::Failed),
            _ => Err(format!("Invalid UploadStatus variant: {}", s).into()),
        }
    }
}

impl Type<Postgres> for UploadStatus {
    fn type_info() -> PgTypeInfo {
        PgTypeInfo::with_name("TEXT")
    }
}

impl Encode<'_, Postgres> for UploadStatus {
    fn encode_by_ref(
        &self,
        buf: &mut PgArgumentBuffer,
    ) -> Result<IsNull, Box<dyn StdError + Send + Sync + 'static>> {
        let s = self.as_str();
        <String as Encode<Postgres>>::encode(s.to_string(), buf)
    }
}

impl Decode<'_, Postgres> for UploadStatus {
    fn decode(value: PgValueRef<'_>) -> Result<Self, Box<dyn StdError + Send + Sync + 'static>> {
        let s = <&str as Decode<Postgres>>::decode(value)?;
        UploadStatus::from_str(s)
    }
}

/// The format tag chosen when an upload is created. It drives dispatch and
/// is never re-derived from content mid-pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclaredType {
    Text,
    Binary,
}

impl DeclaredType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeclaredType::Text => "text",
            DeclaredType::Binary => "binary",
        }
    }

    /// Interpret a stored type tag. Anything outside the closed set is a
    /// configuration error and fails the ingestion call before any content
    /// is touched.
    pub fn parse(s: &str) -> Result<Self, PipelineError> {
        match s {
            "text" => Ok(DeclaredType::Text),
            "binary" => Ok(DeclaredType::Binary),
            other => Err(PipelineError::UnsupportedFormat(other.to_string())),
        }
    }

    /// Upload-time convention: a `.csv` extension means delimited text,
    /// everything else is treated as the fixed binary layout.
    pub fn from_filename(filename: &str) -> Self {
        if filename.to_ascii_lowercase().ends_with(".csv") {
            DeclaredType::Text
        } else {
            DeclaredType::Binary
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UploadedFile {
    pub id: Uuid,
    pub filename: String,
    pub upload_timestamp: DateTime<Utc>,
    pub status: UploadStatus,
    pub file_type: String,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SignalMeasurement {
    pub id: Uuid,
    pub uploaded_file_id: Uuid,
    pub facility_name: String,
    pub facility_section_name: String,
    pub machine_name: String,
    pub measurement_point_name: String,
    pub measured_at: DateTime<Utc>,
    pub rotating_speed: f64,
    pub signal_unit: String,
    pub sampling_rate_hz: f64,
    pub signal: Vec<f64>,
}

/// A measurement accepted by ingestion, stamped with its owning upload and
/// awaiting insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMeasurement {
    pub uploaded_file_id: Uuid,
    pub facility_name: String,
    pub facility_section_name: String,
    pub machine_name: String,
    pub measurement_point_name: String,
    pub measured_at: DateTime<Utc>,
    pub rotating_speed: f64,
    pub signal_unit: String,
    pub sampling_rate_hz: f64,
    pub signal: Vec<f64>,
}

impl NewMeasurement {
    pub fn from_candidate(uploaded_file_id: Uuid, candidate: MeasurementCandidate) -> Self {
        Self {
            uploaded_file_id,
            facility_name: candidate.facility_name,
            facility_section_name: candidate.facility_section_name,
            machine_name: candidate.machine_name,
            measurement_point_name: candidate.measurement_point_name,
            measured_at: candidate.measured_at,
            rotating_speed: candidate.rotating_speed,
            signal_unit: candidate.signal_unit,
            sampling_rate_hz: candidate.sampling_rate_hz,
            signal: candidate.signal,
        }
    }
}
