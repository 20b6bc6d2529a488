use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::errors::DropReason;
use crate::fields::{normalize_record, CanonicalField, FieldValue};
use crate::model::{DroppedRecord, MeasurementCandidate, RecordLocation, RecordResult};

/// Parse delimited text content with a header line into measurement
/// candidates, one result per data row.
///
/// A bad row is reported and skipped; parsing never aborts the file. Rows
/// come back in input order, and header-only input yields an empty vec.
pub fn parse_text_records(content: &str) -> Vec<RecordResult> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers = match reader.headers() {
        Ok(headers) => headers.clone(),
        Err(_) => return Vec::new(),
    };

    let mut results = Vec::new();
    for (row_idx, record) in reader.records().enumerate() {
        // Header occupies line 1.
        let line = row_idx + 2;

        let record = match record {
            Ok(record) => record,
            Err(err) => {
                results.push(RecordResult::Dropped(DroppedRecord {
                    location: RecordLocation::Line(line),
                    reason: DropReason::MalformedRow(err.to_string()),
                    raw: None,
                }));
                continue;
            }
        };

        let mut raw: HashMap<String, FieldValue> = HashMap::with_capacity(record.len());
        for (header, cell) in headers.iter().zip(record.iter()) {
            raw.insert(header.to_string(), FieldValue::Text(cell.to_string()));
        }

        let fields = normalize_record(&raw);
        match candidate_from_fields(&fields) {
            Ok(candidate) => results.push(RecordResult::Accepted(candidate)),
            Err(reason) => results.push(RecordResult::Dropped(DroppedRecord {
                location: RecordLocation::Line(line),
                reason,
                raw: Some(record.iter().collect::<Vec<_>>().join(",")),
            })),
        }
    }

    results
}

/// Build a candidate from normalized fields, applying the per-field
/// defaults for the text path. Exposed within the crate so sequence-valued
/// sources can reuse the same coercion rules.
pub(crate) fn candidate_from_fields(
    fields: &HashMap<CanonicalField, FieldValue>,
) -> Result<MeasurementCandidate, DropReason> {
    let measured_at = match fields.get(&CanonicalField::MeasuredAt) {
        Some(value) => match value.as_text() {
            Some(text) => parse_measured_at(text)?,
            None => {
                return Err(DropReason::InvalidTimestamp {
                    value: "<samples>".to_string(),
                    message: "expected a textual timestamp".to_string(),
                })
            }
        },
        None => return Err(DropReason::MissingField(CanonicalField::MeasuredAt.as_str())),
    };

    let signal = match fields.get(&CanonicalField::Signal) {
        Some(FieldValue::Text(value)) => parse_signal_text(value)?,
        Some(FieldValue::Samples(samples)) => samples.clone(),
        None => Vec::new(),
    };

    Ok(MeasurementCandidate {
        facility_name: text_or_default(fields, CanonicalField::FacilityName),
        facility_section_name: text_or_default(fields, CanonicalField::FacilitySectionName),
        machine_name: text_or_default(fields, CanonicalField::MachineName),
        measurement_point_name: text_or_default(fields, CanonicalField::MeasurementPointName),
        measured_at,
        rotating_speed: float_or_default(fields, CanonicalField::RotatingSpeed)?,
        signal_unit: text_or_default(fields, CanonicalField::SignalUnit),
        sampling_rate_hz: float_or_default(fields, CanonicalField::SamplingRateHz)?,
        signal,
    })
}

pub(crate) fn parse_measured_at(value: &str) -> Result<DateTime<Utc>, DropReason> {
    let trimmed = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }

    static FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];
    for fmt in FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Ok(dt.and_utc());
        }
    }

    // Bare dates count as midnight UTC.
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        if let Some(dt) = date.and_hms_opt(0, 0, 0) {
            return Ok(dt.and_utc());
        }
    }

    Err(DropReason::InvalidTimestamp {
        value: trimmed.to_string(),
        message: "not an ISO-8601 timestamp".to_string(),
    })
}

/// Parse the string form of a waveform: bracket characters are stripped,
/// the remainder splits on commas, and blank tokens are skipped rather
/// than read as zero. Any non-numeric token rejects the whole row.
pub(crate) fn parse_signal_text(value: &str) -> Result<Vec<f64>, DropReason> {
    let stripped: String = value.chars().filter(|c| !matches!(c, '[' | ']')).collect();

    let mut samples = Vec::new();
    for token in stripped.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        match token.parse::<f64>() {
            Ok(sample) => samples.push(sample),
            Err(_) => {
                return Err(DropReason::InvalidSignalSample {
                    token: token.to_string(),
                })
            }
        }
    }
    Ok(samples)
}

fn text_or_default(fields: &HashMap<CanonicalField, FieldValue>, field: CanonicalField) -> String {
    fields
        .get(&field)
        .and_then(FieldValue::as_text)
        .unwrap_or_default()
        .to_string()
}

fn float_or_default(
    fields: &HashMap<CanonicalField, FieldValue>,
    field: CanonicalField,
) -> Result<f64, DropReason> {
    let Some(value) = fields.get(&field) else {
        return Ok(0.0);
    };
    let text = value.as_text().ok_or_else(|| DropReason::InvalidNumber {
        field: field.as_str(),
        value: "<samples>".to_string(),
    })?;
    text.trim()
        .parse::<f64>()
        .map_err(|_| DropReason::InvalidNumber {
            field: field.as_str(),
            value: text.to_string(),
        })
}
