use thiserror::Error;

/// Typed failures for update operations that reference an entity missing
/// from the document. Read operations never produce these.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("member not found: {0}")]
    MemberNotFound(String),
    #[error("item not found: {0}")]
    ItemNotFound(String),
    #[error("fee not found: {0}")]
    FeeNotFound(String),
    #[error("unknown currency code: {0}")]
    UnknownCurrency(String),
}
