//! Domain error types.
//!
//! These errors represent field validation failures when constructing
//! registry entities. They are distinct from scheduling and storage errors.

use super::StationId;

/// Domain-level errors for entity validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// A field is out of range or malformed
    #[error("invalid {field}: {reason}")]
    InvalidField {
        field: &'static str,
        reason: &'static str,
    },

    /// A track segment must join two different stations
    #[error("track segment must connect two different stations (both are {0})")]
    SameStation(StationId),
}

impl DomainError {
    pub(crate) fn invalid(field: &'static str, reason: &'static str) -> Self {
        DomainError::InvalidField { field, reason }
    }
}
