use thiserror::Error;

/// Errors that abort an operation.
///
/// Data-quality problems found while importing rows are not errors; they are
/// counted as [`crate::rows::SkipReason`]s in the import report instead.
#[derive(Error, Debug)]
pub enum AttrError {
    #[error("Got empty uuid")]
    EmptyUuid,

    #[error("Could not find attribute {id} (uuid: {uuid})")]
    UnknownAttribute { id: u32, uuid: String },

    #[error("Could not find option {id} (uuid: {uuid})")]
    UnknownOption { id: u32, uuid: String },

    #[error("Could not find rule for category {0}")]
    UnknownCategoryRule(u32),

    #[error("Unimplemented: {0}")]
    Unimplemented(String),

    #[error("Invalid condition: {0}")]
    InvalidCondition(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, AttrError>;
