use std::fmt;

use chrono::{DateTime, Utc};

use crate::errors::DropReason;

/// One decoded signal measurement, not yet tied to an upload. The owning
/// upload id is stamped on by the ingestion layer, never by the parsers.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementCandidate {
    pub facility_name: String,
    pub facility_section_name: String,
    pub machine_name: String,
    pub measurement_point_name: String,
    pub measured_at: DateTime<Utc>,
    pub rotating_speed: f64,
    pub signal_unit: String,
    pub sampling_rate_hz: f64,
    /// Waveform samples in source order.
    pub signal: Vec<f64>,
}

/// Where in the source a record came from: a 1-indexed data line for the
/// text format, a byte offset for the binary format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordLocation {
    Line(usize),
    ByteOffset(usize),
}

impl fmt::Display for RecordLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordLocation::Line(line) => write!(f, "line {line}"),
            RecordLocation::ByteOffset(offset) => write!(f, "byte offset {offset}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DroppedRecord {
    pub location: RecordLocation,
    pub reason: DropReason,
    /// Raw row content, kept for the text path so operators can see what
    /// was rejected. Binary records are identified by offset alone.
    pub raw: Option<String>,
}

/// Outcome of one row or record. Parsers emit one of these per input
/// record; dropping is data, not control flow, so callers decide what to
/// log and what to keep.
#[derive(Debug, Clone)]
pub enum RecordResult {
    Accepted(MeasurementCandidate),
    Dropped(DroppedRecord),
}

impl RecordResult {
    pub fn accepted(&self) -> Option<&MeasurementCandidate> {
        match self {
            RecordResult::Accepted(candidate) => Some(candidate),
            RecordResult::Dropped(_) => None,
        }
    }
}
