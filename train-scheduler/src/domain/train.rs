//! Train types.

use std::fmt;

use super::{DomainError, TrainId};

const MAX_CODE_CHARS: usize = 50;
const MAX_DESCRIPTION_CHARS: usize = 500;

/// A unique train code such as `SM101`.
///
/// # Examples
///
/// ```
/// use train_scheduler::domain::TrainCode;
///
/// let code = TrainCode::parse("EXP101").unwrap();
/// assert_eq!(code.as_str(), "EXP101");
/// assert!(TrainCode::parse("").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct TrainCode(String);

impl TrainCode {
    /// Parse a train code: 1 to 50 characters.
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        let len = s.chars().count();
        if len == 0 {
            return Err(DomainError::invalid("train code", "must not be empty"));
        }
        if len > MAX_CODE_CHARS {
            return Err(DomainError::invalid(
                "train code",
                "must be at most 50 characters",
            ));
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for TrainCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TrainCode({})", self.0)
    }
}

impl fmt::Display for TrainCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Check an optional free-text train description.
pub fn validate_description(description: Option<&str>) -> Result<(), DomainError> {
    match description {
        Some(d) if d.chars().count() > MAX_DESCRIPTION_CHARS => Err(DomainError::invalid(
            "description",
            "must be at most 500 characters",
        )),
        _ => Ok(()),
    }
}

/// A train (rolling stock).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Train {
    pub id: TrainId,
    pub code: TrainCode,
    pub description: Option<String>,
}
