pub mod binary;
pub mod errors;
pub mod fields;
pub mod model;
pub mod text;

pub use binary::{decode_binary_records, RECORD_LEN};
pub use errors::DropReason;
pub use fields::{normalize_record, CanonicalField, FieldValue};
pub use model::{DroppedRecord, MeasurementCandidate, RecordLocation, RecordResult};
pub use text::parse_text_records;
