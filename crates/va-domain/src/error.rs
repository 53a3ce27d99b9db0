use thiserror::Error;
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("{0}")]
    ValidationError(String),
    #[error("invalid WKT: {0}")]
    InvalidWkt(String),
    #[error("invalid WKB: {0}")]
    InvalidWkb(String),
}
