//! Control errors of the integrity engine.
//!
//! Only failures that make a report untrustworthy live here: cancellation and
//! storage failures. Broken references and cycles are report content, never
//! errors.

use crate::integrity::context::ContextError;
use crate::model::entity::EntityKind;
use crate::model::id::IdFormatError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type AccessResult<T> = Result<T, AccessError>;

/// Errors returned by entity accessor collaborators.
#[derive(Debug)]
pub enum AccessError {
    /// The id is well-formed but no such entity exists.
    NotFound { kind: EntityKind, id: String },
    /// The id is not a valid id for `kind`.
    MalformedId {
        kind: EntityKind,
        id: String,
        reason: IdFormatError,
    },
    /// The accessor observed a done context.
    Context(ContextError),
    /// Backing store failure.
    Storage(Box<dyn Error + Send + Sync + 'static>),
}

impl AccessError {
    pub fn storage(err: impl Error + Send + Sync + 'static) -> Self {
        Self::Storage(Box::new(err))
    }
}

impl Display for AccessError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { kind, id } => write!(f, "{kind} not found: {id}"),
            Self::MalformedId { kind, id, reason } => {
                write!(f, "malformed {kind} id `{id}`: {reason}")
            }
            Self::Context(err) => write!(f, "{err}"),
            Self::Storage(err) => write!(f, "storage failure: {err}"),
        }
    }
}

impl Error for AccessError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NotFound { .. } => None,
            Self::MalformedId { reason, .. } => Some(reason),
            Self::Context(err) => Some(err),
            Self::Storage(err) => Some(err.as_ref()),
        }
    }
}

impl From<ContextError> for AccessError {
    fn from(value: ContextError) -> Self {
        Self::Context(value)
    }
}

/// Top-level scan phase, used to label aborted checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckPhase {
    References,
    Cycles,
    Warnings,
}

impl CheckPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::References => "references",
            Self::Cycles => "cycles",
            Self::Warnings => "warnings",
        }
    }
}

impl Display for CheckPhase {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that abort an integrity check.
#[derive(Debug)]
pub enum IntegrityError {
    /// The caller's context was done at a checkpoint.
    Context(ContextError),
    /// An accessor failed with something other than not-found/malformed.
    Access {
        phase: CheckPhase,
        kind: EntityKind,
        source: AccessError,
    },
}

impl IntegrityError {
    pub(crate) fn access(phase: CheckPhase, kind: EntityKind, source: AccessError) -> Self {
        Self::Access {
            phase,
            kind,
            source,
        }
    }

    /// Returns the context error when the check stopped because of the
    /// caller's context, directly or from inside an accessor.
    pub fn context_error(&self) -> Option<ContextError> {
        match self {
            Self::Context(err) => Some(*err),
            Self::Access {
                source: AccessError::Context(err),
                ..
            } => Some(*err),
            Self::Access { .. } => None,
        }
    }
}

impl Display for IntegrityError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Context(err) => write!(f, "{err}"),
            Self::Access {
                phase,
                kind,
                source,
            } => write!(f, "{phase} check failed loading {kind}: {source}"),
        }
    }
}

impl Error for IntegrityError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Context(err) => Some(err),
            Self::Access { source, .. } => Some(source),
        }
    }
}

impl From<ContextError> for IntegrityError {
    fn from(value: ContextError) -> Self {
        Self::Context(value)
    }
}

#[cfg(test)]
mod tests {
    use super::{AccessError, CheckPhase, IntegrityError};
    use crate::integrity::context::ContextError;
    use crate::model::entity::EntityKind;
    use std::error::Error;

    #[test]
    fn access_failure_is_labelled_with_phase_and_kind() {
        let err = IntegrityError::access(
            CheckPhase::Cycles,
            EntityKind::Activity,
            AccessError::storage(std::io::Error::other("disk unplugged")),
        );
        assert_eq!(
            err.to_string(),
            "cycles check failed loading activity: storage failure: disk unplugged"
        );
        assert!(err.source().is_some());
        assert_eq!(err.context_error(), None);
    }

    #[test]
    fn context_error_is_found_inside_access_failures() {
        let err = IntegrityError::access(
            CheckPhase::References,
            EntityKind::Decision,
            AccessError::from(ContextError::DeadlineExceeded),
        );
        assert_eq!(err.context_error(), Some(ContextError::DeadlineExceeded));
    }
}
