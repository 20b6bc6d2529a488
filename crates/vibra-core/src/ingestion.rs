use tracing::{info, warn};
use uuid::Uuid;
use vibra_parser::{decode_binary_records, parse_text_records, DroppedRecord, RecordResult};

use crate::error::Result;
use crate::types::{DeclaredType, NewMeasurement};

/// What one ingestion call produced: measurements ready to persist, plus
/// the records that were rejected along the way. Drops are data here so
/// callers and tests can inspect them without scraping logs.
#[derive(Debug)]
pub struct IngestionReport {
    pub measurements: Vec<NewMeasurement>,
    pub dropped: Vec<DroppedRecord>,
}

/// Dispatch raw upload content to the parser for its declared type and
/// stamp the owning upload onto every accepted record.
///
/// The declared type is interpreted before any content is touched; an
/// unknown tag fails the whole call. A text upload whose bytes are not
/// UTF-8 also fails the call, since that is a structural problem rather
/// than a bad row. Everything else is per-record: the parsers report
/// drops, this function logs them and carries on.
pub fn ingest(content: &[u8], declared_type: &str, upload_id: Uuid) -> Result<IngestionReport> {
    let declared = DeclaredType::parse(declared_type)?;

    let results = match declared {
        DeclaredType::Text => parse_text_records(std::str::from_utf8(content)?),
        DeclaredType::Binary => decode_binary_records(content),
    };

    let mut measurements = Vec::new();
    let mut dropped = Vec::new();
    for result in results {
        match result {
            RecordResult::Accepted(candidate) => {
                measurements.push(NewMeasurement::from_candidate(upload_id, candidate));
            }
            RecordResult::Dropped(record) => {
                warn!(
                    upload_id = %upload_id,
                    location = %record.location,
                    reason = %record.reason,
                    raw = record.raw.as_deref().unwrap_or_default(),
                    "dropped record"
                );
                dropped.push(record);
            }
        }
    }

    info!(
        upload_id = %upload_id,
        format = declared.as_str(),
        accepted = measurements.len(),
        dropped = dropped.len(),
        "ingestion finished"
    );

    Ok(IngestionReport {
        measurements,
        dropped,
    })
}
