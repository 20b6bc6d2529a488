// crates/vibra-core/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Database query failed: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Database migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),

    #[error("Text upload is not valid UTF-8: {0}")]
    InvalidText(#[from] std::str::Utf8Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
