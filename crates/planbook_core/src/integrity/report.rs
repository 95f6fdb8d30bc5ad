//! Integrity report types and their line formats.
//!
//! # Invariants
//! - Line formats are consumed by downstream tooling and must not change:
//!   `{source_type} {source_id} → {target_type} {target_id}: {message}` for
//!   reference errors and warnings, and
//!   `{entity_type} cycle detected: [A B A] - {message}` for cycles.

use crate::model::entity::EntityKind;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// A required relation that is missing or does not resolve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceError {
    pub source_type: EntityKind,
    pub source_id: String,
    pub target_type: EntityKind,
    /// Empty when the relation was not set at all.
    pub target_id: String,
    pub message: String,
}

impl Display for ReferenceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} → {} {}: {}",
            self.source_type, self.source_id, self.target_type, self.target_id, self.message
        )
    }
}

impl Error for ReferenceError {}

/// An optional relation that does not resolve, or any malformed id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceWarning {
    pub source_type: EntityKind,
    pub source_id: String,
    pub target_type: EntityKind,
    pub target_id: String,
    pub message: String,
}

impl ReferenceWarning {
    /// Renders the warning line.
    pub fn warning(&self) -> String {
        self.to_string()
    }
}

impl Display for ReferenceWarning {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} → {} {}: {}",
            self.source_type, self.source_id, self.target_type, self.target_id, self.message
        )
    }
}

/// A closed walk through parent pointers or dependency edges.
///
/// `cycle` starts and ends with the same id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleError {
    pub entity_type: EntityKind,
    pub cycle: Vec<String>,
    pub message: String,
}

impl Display for CycleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} cycle detected: [{}] - {}",
            self.entity_type,
            self.cycle.join(" "),
            self.message
        )
    }
}

impl Error for CycleError {}

/// Outcome of one full integrity scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityResult {
    /// `true` when there are no reference errors and no cycles.
    pub valid: bool,
    pub reference_errors: Vec<ReferenceError>,
    pub cycle_errors: Vec<CycleError>,
    /// Never affects `valid`.
    pub warnings: Vec<ReferenceWarning>,
}

impl IntegrityResult {
    pub fn new(
        reference_errors: Vec<ReferenceError>,
        cycle_errors: Vec<CycleError>,
        warnings: Vec<ReferenceWarning>,
    ) -> Self {
        Self {
            valid: reference_errors.is_empty() && cycle_errors.is_empty(),
            reference_errors,
            cycle_errors,
            warnings,
        }
    }

    /// Report lines in section order: reference errors, cycles, warnings.
    pub fn lines(&self) -> Vec<String> {
        self.reference_errors
            .iter()
            .map(ToString::to_string)
            .chain(self.cycle_errors.iter().map(ToString::to_string))
            .chain(self.warnings.iter().map(ReferenceWarning::warning))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{CycleError, IntegrityResult, ReferenceError, ReferenceWarning};
    use crate::model::entity::EntityKind;

    fn dangling_deliverable() -> ReferenceError {
        ReferenceError {
            source_type: EntityKind::Deliverable,
            source_id: "DEL-001".to_string(),
            target_type: EntityKind::Objective,
            target_id: "OBJ-404".to_string(),
            message: "objective_id references non-existent objective".to_string(),
        }
    }

    #[test]
    fn reference_error_line_format() {
        assert_eq!(
            dangling_deliverable().to_string(),
            "deliverable DEL-001 → objective OBJ-404: objective_id references non-existent objective"
        );
    }

    #[test]
    fn missing_required_reference_keeps_empty_target_slot() {
        let err = ReferenceError {
            source_type: EntityKind::Decision,
            source_id: "DEC-001".to_string(),
            target_type: EntityKind::Consideration,
            target_id: String::new(),
            message: "consideration_id is required but missing".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "decision DEC-001 → consideration : consideration_id is required but missing"
        );
    }

    #[test]
    fn cycle_error_renders_bracketed_members() {
        let err = CycleError {
            entity_type: EntityKind::Objective,
            cycle: vec!["OBJ-001".into(), "OBJ-002".into(), "OBJ-001".into()],
            message: "circular parent reference".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "objective cycle detected: [OBJ-001 OBJ-002 OBJ-001] - circular parent reference"
        );
    }

    #[test]
    fn warnings_do_not_affect_validity() {
        let warning = ReferenceWarning {
            source_type: EntityKind::UseCase,
            source_id: "UC-001".to_string(),
            target_type: EntityKind::Subsystem,
            target_id: "SUB-009".to_string(),
            message: "subsystem_id references non-existent subsystem".to_string(),
        };
        let result = IntegrityResult::new(Vec::new(), Vec::new(), vec![warning.clone()]);
        assert!(result.valid);
        assert_eq!(result.lines(), vec![warning.warning()]);

        let result = IntegrityResult::new(vec![dangling_deliverable()], Vec::new(), Vec::new());
        assert!(!result.valid);
    }

    #[test]
    fn report_serializes_snake_case_kinds() {
        let result = IntegrityResult::new(vec![dangling_deliverable()], Vec::new(), Vec::new());
        let json = serde_json::to_value(&result).expect("serialize report");
        assert_eq!(json["valid"], false);
        assert_eq!(json["reference_errors"][0]["source_type"], "deliverable");
        assert_eq!(json["reference_errors"][0]["target_id"], "OBJ-404");
    }
}
