//! Namespaced entity id format.
//!
//! Ids take one of two shapes: `PREFIX-NNN` (zero-padded, at least three
//! digits) or `PREFIX-xxxxxxxx` (exactly eight lowercase hex characters).
//! The prefix is fixed per `EntityKind`.

use crate::model::entity::EntityKind;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

static ID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<prefix>[A-Z]+)-(?P<suffix>[0-9]{3,}|[0-9a-f]{8})$").expect("valid id regex")
});

/// Reasons an id string is not a well-formed id for a kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdFormatError {
    Empty,
    /// Does not match `PREFIX-NNN` or `PREFIX-xxxxxxxx`.
    InvalidShape(String),
    /// Well-shaped, but namespaced for another kind.
    WrongPrefix {
        expected: &'static str,
        actual: String,
    },
}

impl Display for IdFormatError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "id must not be empty"),
            Self::InvalidShape(value) => write!(
                f,
                "id `{value}` must look like PREFIX-NNN or PREFIX-xxxxxxxx"
            ),
            Self::WrongPrefix { expected, actual } => {
                write!(f, "id prefix `{actual}` does not match expected `{expected}`")
            }
        }
    }
}

impl Error for IdFormatError {}

/// Validates that `id` is a well-formed id of `kind`.
pub fn validate_id(kind: EntityKind, id: &str) -> Result<(), IdFormatError> {
    if id.is_empty() {
        return Err(IdFormatError::Empty);
    }

    let captures = ID_RE
        .captures(id)
        .ok_or_else(|| IdFormatError::InvalidShape(id.to_string()))?;
    let prefix = &captures["prefix"];
    if prefix != kind.id_prefix() {
        return Err(IdFormatError::WrongPrefix {
            expected: kind.id_prefix(),
            actual: prefix.to_string(),
        });
    }

    Ok(())
}
