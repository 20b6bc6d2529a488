use std::collections::HashMap;

/// The normalized field names a measurement record is built from,
/// regardless of how the source file spelled them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CanonicalField {
    FacilityName,
    FacilitySectionName,
    MachineName,
    MeasurementPointName,
    MeasuredAt,
    RotatingSpeed,
    Signal,
    SignalUnit,
    SamplingRateHz,
}

impl CanonicalField {
    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalField::FacilityName => "facility_name",
            CanonicalField::FacilitySectionName => "facility_section_name",
            CanonicalField::MachineName => "machine_name",
            CanonicalField::MeasurementPointName => "measurement_point_name",
            CanonicalField::MeasuredAt => "measured_at",
            CanonicalField::RotatingSpeed => "rotating_speed",
            CanonicalField::Signal => "signal",
            CanonicalField::SignalUnit => "signal_unit",
            CanonicalField::SamplingRateHz => "sampling_rate_hz",
        }
    }

    /// Accepted spellings, most specific first. The first alias present in
    /// a row wins; the order here is the tie-break when a row carries more
    /// than one recognized spelling.
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            CanonicalField::FacilityName => &["facility_name", "facility", "plant_name"],
            CanonicalField::FacilitySectionName => {
                &["facility_section_name", "section", "section_name"]
            }
            CanonicalField::MachineName => &["machine_name", "asset_name", "equipment_name"],
            CanonicalField::MeasurementPointName => {
                &["measurement_point_name", "sensor_location", "point_name"]
            }
            CanonicalField::MeasuredAt => &["measured_at", "timestamp", "datetime", "time"],
            CanonicalField::RotatingSpeed => &["rotating_speed", "speed", "rpm", "frequency"],
            CanonicalField::Signal => &["signal", "signal_data", "values"],
            CanonicalField::SignalUnit => &["signal_unit", "unit"],
            CanonicalField::SamplingRateHz => &["sampling_rate_hz", "sampling_rate", "fs"],
        }
    }
}

pub const ALL_FIELDS: &[CanonicalField] = &[
    CanonicalField::FacilityName,
    CanonicalField::FacilitySectionName,
    CanonicalField::MachineName,
    CanonicalField::MeasurementPointName,
    CanonicalField::MeasuredAt,
    CanonicalField::RotatingSpeed,
    CanonicalField::Signal,
    CanonicalField::SignalUnit,
    CanonicalField::SamplingRateHz,
];

/// A raw field value before coercion. Delimited sources only ever produce
/// `Text`; sources that already carry a decoded waveform hand over
/// `Samples` and skip string parsing entirely.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Samples(Vec<f64>),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(value) => Some(value.as_str()),
            FieldValue::Samples(_) => None,
        }
    }
}

/// Map a raw record (source spelling -> value) onto canonical field names.
///
/// For each canonical field the alias list is scanned in declared order and
/// the first alias present in the record wins, independent of the column
/// order of the source. Fields with no recognized alias are absent from the
/// output; defaults are applied later, when the candidate is built.
pub fn normalize_record(raw: &HashMap<String, FieldValue>) -> HashMap<CanonicalField, FieldValue> {
    let mut normalized = HashMap::new();
    for field in ALL_FIELDS {
        for alias in field.aliases() {
            if let Some(value) = raw.get(*alias) {
                normalized.insert(*field, value.clone());
                break;
            }
        }
    }
    normalized
}
