use thiserror::Error;

/// The query date could not be read as `<day> <full month name> <year>`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid date format: {input}")]
pub struct DateFormatError {
    pub input: String,
}

impl DateFormatError {
    pub fn new(input: impl Into<String>) -> Self {
        Self { input: input.into() }
    }
}

pub type Result<T> = std::result::Result<T, DateFormatError>;
