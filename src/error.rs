
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StaylensError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("Invalid facet: {0}")]
    InvalidFacet(String),
    #[error("Empty template: {0}")]
    EmptyTemplate(String),
    #[error("Missing column: {0}")]
    MissingColumn(String),
    #[error("Non-numeric aggregate: {0}")]
    NonNumericAggregate(String),
    #[error("Data store error: {0}")]
    DataStore(String),
}

pub type Result<T> = std::result::Result<T, StaylensError>;

// Helper conversions
impl From<rusqlite::Error> for StaylensError {
    fn from(e: rusqlite::Error) -> Self { Self::DataStore(e.to_string()) }
}
impl From<config::ConfigError> for StaylensError {
    fn from(e: config::ConfigError) -> Self { Self::Config(e.to_string()) }
}
