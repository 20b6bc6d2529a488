use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::errors::DropReason;
use crate::fields::CanonicalField;
use crate::model::{DroppedRecord, MeasurementCandidate, RecordLocation, RecordResult};

/// Fixed size of one binary measurement record.
pub const RECORD_LEN: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SlotDecoder {
    /// UTF-8 text, NUL-padded; trailing NULs are stripped.
    Utf8Text,
    /// IEEE-754 double, little-endian, seconds since the Unix epoch (UTC).
    EpochSecondsF64,
    /// IEEE-754 single, little-endian.
    FloatF32,
    /// Consecutive IEEE-754 singles, little-endian, order preserved.
    SampleArrayF32,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct FieldSlot {
    pub field: CanonicalField,
    pub offset: usize,
    pub len: usize,
    pub decoder: SlotDecoder,
}

/// The record shape as data: field, offset, width, decoder. Decoding is
/// purely offset-based; there is no length prefix, checksum, or version
/// byte. A format change means a new table, not a parameter.
pub(crate) const RECORD_LAYOUT: [FieldSlot; 9] = [
    FieldSlot {
        field: CanonicalField::FacilityName,
        offset: 0,
        len: 64,
        decoder: SlotDecoder::Utf8Text,
    },
    FieldSlot {
        field: CanonicalField::FacilitySectionName,
        offset: 64,
        len: 64,
        decoder: SlotDecoder::Utf8Text,
    },
    FieldSlot {
        field: CanonicalField::MachineName,
        offset: 128,
        len: 32,
        decoder: SlotDecoder::Utf8Text,
    },
    FieldSlot {
        field: CanonicalField::MeasurementPointName,
        offset: 160,
        len: 32,
        decoder: SlotDecoder::Utf8Text,
    },
    FieldSlot {
        field: CanonicalField::MeasuredAt,
        offset: 192,
        len: 8,
        decoder: SlotDecoder::EpochSecondsF64,
    },
    FieldSlot {
        field: CanonicalField::RotatingSpeed,
        offset: 200,
        len: 4,
        decoder: SlotDecoder::FloatF32,
    },
    FieldSlot {
        field: CanonicalField::SignalUnit,
        offset: 204,
        len: 4,
        decoder: SlotDecoder::Utf8Text,
    },
    FieldSlot {
        field: CanonicalField::SamplingRateHz,
        offset: 208,
        len: 4,
        decoder: SlotDecoder::FloatF32,
    },
    FieldSlot {
        field: CanonicalField::Signal,
        offset: 212,
        len: 44,
        decoder: SlotDecoder::SampleArrayF32,
    },
];

/// Decode a concatenation of fixed-size records. Trailing bytes that do
/// not complete a record are ignored, not an error. A record that fails to
/// decode is reported by offset and scanning resumes at the next record
/// boundary; there is no resynchronization inside a bad record.
pub fn decode_binary_records(content: &[u8]) -> Vec<RecordResult> {
    let record_count = content.len() / RECORD_LEN;
    let mut results = Vec::with_capacity(record_count);

    for index in 0..record_count {
        let offset = index * RECORD_LEN;
        let record = &content[offset..offset + RECORD_LEN];
        match decode_record(record) {
            Ok(candidate) => results.push(RecordResult::Accepted(candidate)),
            Err(reason) => results.push(RecordResult::Dropped(DroppedRecord {
                location: RecordLocation::ByteOffset(offset),
                reason,
                raw: None,
            })),
        }
    }

    results
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SlotValue {
    Text(String),
    Timestamp(DateTime<Utc>),
    Float(f64),
    Samples(Vec<f64>),
}

/// Slice one field out of a record according to its layout slot.
pub(crate) fn decode_slot(slot: &FieldSlot, record: &[u8]) -> Result<SlotValue, DropReason> {
    let bytes = &record[slot.offset..slot.offset + slot.len];
    match slot.decoder {
        SlotDecoder::Utf8Text => {
            let text = std::str::from_utf8(bytes).map_err(|err| DropReason::InvalidText {
                field: slot.field.as_str(),
                message: err.to_string(),
            })?;
            Ok(SlotValue::Text(text.trim_end_matches('\0').to_string()))
        }
        SlotDecoder::EpochSecondsF64 => {
            let mut buf = [0u8; 8];
            buf.copy_from_slice(bytes);
            epoch_seconds_to_utc(f64::from_le_bytes(buf)).map(SlotValue::Timestamp)
        }
        SlotDecoder::FloatF32 => {
            let mut buf = [0u8; 4];
            buf.copy_from_slice(bytes);
            Ok(SlotValue::Float(f32::from_le_bytes(buf) as f64))
        }
        SlotDecoder::SampleArrayF32 => {
            let samples = bytes
                .chunks_exact(4)
                .map(|chunk| {
                    let mut buf = [0u8; 4];
                    buf.copy_from_slice(chunk);
                    f32::from_le_bytes(buf) as f64
                })
                .collect();
            Ok(SlotValue::Samples(samples))
        }
    }
}

fn decode_record(record: &[u8]) -> Result<MeasurementCandidate, DropReason> {
    let mut values: HashMap<CanonicalField, SlotValue> = HashMap::with_capacity(RECORD_LAYOUT.len());
    for slot in &RECORD_LAYOUT {
        values.insert(slot.field, decode_slot(slot, record)?);
    }

    let measured_at = match values.remove(&CanonicalField::MeasuredAt) {
        Some(SlotValue::Timestamp(ts)) => ts,
        _ => return Err(DropReason::MissingField(CanonicalField::MeasuredAt.as_str())),
    };

    Ok(MeasurementCandidate {
        facility_name: take_text(&mut values, CanonicalField::FacilityName),
        facility_section_name: take_text(&mut values, CanonicalField::FacilitySectionName),
        machine_name: take_text(&mut values, CanonicalField::MachineName),
        measurement_point_name: take_text(&mut values, CanonicalField::MeasurementPointName),
        measured_at,
        rotating_speed: take_float(&mut values, CanonicalField::RotatingSpeed),
        signal_unit: take_text(&mut values, CanonicalField::SignalUnit),
        sampling_rate_hz: take_float(&mut values, CanonicalField::SamplingRateHz),
        signal: take_samples(&mut values, CanonicalField::Signal),
    })
}

fn epoch_seconds_to_utc(seconds: f64) -> Result<DateTime<Utc>, DropReason> {
    let invalid = || DropReason::InvalidTimestamp {
        value: seconds.to_string(),
        message: "not a representable epoch timestamp".to_string(),
    };

    if !seconds.is_finite() {
        return Err(invalid());
    }
    let whole = seconds.floor();
    if whole < i64::MIN as f64 || whole > i64::MAX as f64 {
        return Err(invalid());
    }
    let nanos = ((seconds - whole) * 1e9) as u32;
    DateTime::from_timestamp(whole as i64, nanos).ok_or_else(invalid)
}

fn take_text(values: &mut HashMap<CanonicalField, SlotValue>, field: CanonicalField) -> String {
    match values.remove(&field) {
        Some(SlotValue::Text(value)) => value,
        _ => String::new(),
    }
}

fn take_float(values: &mut HashMap<CanonicalField, SlotValue>, field: CanonicalField) -> f64 {
    match values.remove(&field) {
        Some(SlotValue::Float(value)) => value,
        _ => 0.0,
    }
}

fn take_samples(values: &mut HashMap<CanonicalField, SlotValue>, field: CanonicalField) -> Vec<f64> {
    match values.remove(&field) {
        Some(SlotValue::Samples(samples)) => samples,
        _ => Vec::new(),
    }
}
