//! Cross-entity reference validation.
//!
//! # Responsibility
//! - Resolve every declared relation of every configured entity kind.
//! - Classify failures as reference errors or warnings.
//!
//! # Invariants
//! - Source kinds are scanned in `SCAN_ORDER`; entities in ascending id order;
//!   relations in declaration order.
//! - A relation whose source or target kind has no accessor is skipped.
//! - Required + empty => error. Required or required-if-set + not found =>
//!   error. Optional + not found => warning. Malformed id => warning.
//! - Any other accessor failure aborts the scan.

use crate::integrity::accessor::EntityAccessor;
use crate::integrity::checker::{Handlers, IntegrityChecker};
use crate::integrity::context::CheckContext;
use crate::integrity::error::{AccessError, AccessResult, CheckPhase, IntegrityError};
use crate::integrity::report::{ReferenceError, ReferenceWarning};
use crate::model::entity::{Entity, EntityKind, Relation};
use log::debug;

/// Source kinds in scan order.
const SCAN_ORDER: [EntityKind; 10] = [
    EntityKind::Objective,
    EntityKind::Deliverable,
    EntityKind::Decision,
    EntityKind::Quality,
    EntityKind::UseCase,
    EntityKind::Consideration,
    EntityKind::Problem,
    EntityKind::Risk,
    EntityKind::Assumption,
    EntityKind::Activity,
];

/// Errors and warnings collected by one reference scan.
#[derive(Debug, Default)]
pub(crate) struct ReferenceFindings {
    pub(crate) errors: Vec<ReferenceError>,
    pub(crate) warnings: Vec<ReferenceWarning>,
}

impl ReferenceFindings {
    fn error(&mut self, source: (EntityKind, &str), relation: &Relation<'_>, message: String) {
        self.errors.push(ReferenceError {
            source_type: source.0,
            source_id: source.1.to_string(),
            target_type: relation.target,
            target_id: relation.target_id.to_string(),
            message,
        });
    }

    fn warning(&mut self, source: (EntityKind, &str), relation: &Relation<'_>, message: String) {
        self.warnings.push(ReferenceWarning {
            source_type: source.0,
            source_id: source.1.to_string(),
            target_type: relation.target,
            target_id: relation.target_id.to_string(),
            message,
        });
    }
}

impl Handlers<'_> {
    /// Resolves `id` through the accessor of `kind`.
    ///
    /// Returns `None` when `kind` has no accessor.
    fn resolve(&self, ctx: &CheckContext, kind: EntityKind, id: &str) -> Option<AccessResult<()>> {
        fn exists<E: Entity>(
            accessor: &(dyn EntityAccessor<E> + '_),
            ctx: &CheckContext,
            id: &str,
        ) -> AccessResult<()> {
            accessor.get(ctx, id).map(|_| ())
        }

        match kind {
            EntityKind::Objective => self.objectives.as_deref().map(|h| exists(h, ctx, id)),
            EntityKind::Deliverable => self.deliverables.as_deref().map(|h| exists(h, ctx, id)),
            EntityKind::Decision => self.decisions.as_deref().map(|h| exists(h, ctx, id)),
            EntityKind::Consideration => {
                self.considerations.as_deref().map(|h| exists(h, ctx, id))
            }
            EntityKind::Quality => self.qualities.as_deref().map(|h| exists(h, ctx, id)),
            EntityKind::UseCase => self.use_cases.as_deref().map(|h| exists(h, ctx, id)),
            EntityKind::Subsystem => self.subsystems.as_deref().map(|h| exists(h, ctx, id)),
            EntityKind::Actor => self.actors.as_deref().map(|h| exists(h, ctx, id)),
            EntityKind::Problem => self.problems.as_deref().map(|h| exists(h, ctx, id)),
            EntityKind::Risk => self.risks.as_deref().map(|h| exists(h, ctx, id)),
            EntityKind::Assumption => self.assumptions.as_deref().map(|h| exists(h, ctx, id)),
            EntityKind::Activity => self.activities.as_deref().map(|h| exists(h, ctx, id)),
        }
    }

    fn scan_kind(
        &self,
        ctx: &CheckContext,
        phase: CheckPhase,
        kind: EntityKind,
        findings: &mut ReferenceFindings,
    ) -> Result<(), IntegrityError> {
        match kind {
            EntityKind::Objective => self.scan(ctx, phase, self.objectives.as_deref(), findings),
            EntityKind::Deliverable => {
                self.scan(ctx, phase, self.deliverables.as_deref(), findings)
            }
            EntityKind::Decision => self.scan(ctx, phase, self.decisions.as_deref(), findings),
            EntityKind::Consideration => {
                self.scan(ctx, phase, self.considerations.as_deref(), findings)
            }
            EntityKind::Quality => self.scan(ctx, phase, self.qualities.as_deref(), findings),
            EntityKind::UseCase => self.scan(ctx, phase, self.use_cases.as_deref(), findings),
            EntityKind::Subsystem => self.scan(ctx, phase, self.subsystems.as_deref(), findings),
            EntityKind::Actor => self.scan(ctx, phase, self.actors.as_deref(), findings),
            EntityKind::Problem => self.scan(ctx, phase, self.problems.as_deref(), findings),
            EntityKind::Risk => self.scan(ctx, phase, self.risks.as_deref(), findings),
            EntityKind::Assumption => {
                self.scan(ctx, phase, self.assumptions.as_deref(), findings)
            }
            EntityKind::Activity => self.scan(ctx, phase, self.activities.as_deref(), findings),
        }
    }

    fn scan<E: Entity>(
        &self,
        ctx: &CheckContext,
        phase: CheckPhase,
        accessor: Option<&(dyn EntityAccessor<E> + '_)>,
        findings: &mut ReferenceFindings,
    ) -> Result<(), IntegrityError> {
        let Some(accessor) = accessor else {
            return Ok(());
        };
        ctx.check()?;

        let mut entities = accessor
            .get_all(ctx)
            .map_err(|source| IntegrityError::access(phase, E::KIND, source))?;
        entities.sort_by(|left, right| left.id().cmp(right.id()));

        for entity in &entities {
            for relation in entity.relations() {
                self.classify(ctx, phase, (E::KIND, entity.id()), &relation, findings)?;
            }
        }

        debug!(
            "event=reference_scan module=integrity status=ok phase={} kind={} entities={}",
            phase,
            E::KIND,
            entities.len()
        );
        Ok(())
    }

    fn classify(
        &self,
        ctx: &CheckContext,
        phase: CheckPhase,
        source: (EntityKind, &str),
        relation: &Relation<'_>,
        findings: &mut ReferenceFindings,
    ) -> Result<(), IntegrityError> {
        if !self.is_configured(relation.target) {
            return Ok(());
        }

        if relation.is_empty() {
            if relation.is_required() {
                findings.error(
                    source,
                    relation,
                    format!("{} is required but missing", relation.field),
                );
            }
            return Ok(());
        }

        let Some(outcome) = self.resolve(ctx, relation.target, relation.target_id) else {
            return Ok(());
        };

        match outcome {
            Ok(()) => {}
            Err(AccessError::NotFound { .. }) => {
                let message = format!(
                    "{} references non-existent {}",
                    relation.field, relation.target
                );
                if relation.dangling_is_error() {
                    findings.error(source, relation, message);
                } else {
                    findings.warning(source, relation, message);
                }
            }
            Err(AccessError::MalformedId { reason, .. }) => {
                findings.warning(
                    source,
                    relation,
                    format!("{} has malformed id: {reason}", relation.field),
                );
            }
            Err(other) => return Err(IntegrityError::access(phase, relation.target, other)),
        }
        Ok(())
    }
}

impl IntegrityChecker<'_> {
    /// Reports required relations that are missing or do not resolve.
    pub fn check_references(
        &self,
        ctx: &CheckContext,
    ) -> Result<Vec<ReferenceError>, IntegrityError> {
        Ok(self.scan_references(ctx, CheckPhase::References)?.errors)
    }

    /// Reports optional relations that do not resolve and malformed ids.
    pub fn check_warnings(
        &self,
        ctx: &CheckContext,
    ) -> Result<Vec<ReferenceWarning>, IntegrityError> {
        Ok(self.scan_references(ctx, CheckPhase::Warnings)?.warnings)
    }

    pub(crate) fn scan_references(
        &self,
        ctx: &CheckContext,
        phase: CheckPhase,
    ) -> Result<ReferenceFindings, IntegrityError> {
        ctx.check()?;
        let mut findings = ReferenceFindings::default();
        for kind in SCAN_ORDER {
            self.handlers.scan_kind(ctx, phase, kind, &mut findings)?;
        }
        Ok(findings)
    }
}
