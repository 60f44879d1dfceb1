//! Errors raised when parsing or editing rules.

use thiserror::Error;

use super::RuleCategory;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RuleError {
    #[error("pattern must not be empty")]
    EmptyPattern,

    #[error("site rules need a site pattern")]
    MissingSitePattern,

    #[error("rule id must not be empty")]
    EmptyId,

    #[error("rule already exists: {0}")]
    DuplicateId(String),

    #[error("rule not found: {0}")]
    NotFound(String),

    #[error("position {index} is out of range for {category} rules (have {len})")]
    PositionOutOfRange {
        category: RuleCategory,
        index: usize,
        len: usize,
    },

    #[error("unknown rule category: {0} (expected site or general)")]
    InvalidCategory(String),

    #[error("unknown rule condition: {0} (expected extension, filename or url)")]
    InvalidCondition(String),
}
