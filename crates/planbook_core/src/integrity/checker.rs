//! Integrity checker facade.
//!
//! # Responsibility
//! - Hold one optional accessor per entity kind.
//! - Run reference, cycle and warning scans and fold them into one report.
//!
//! # Invariants
//! - The checker never writes through its accessors.
//! - An unconfigured kind is indistinguishable from a kind with no entities.
//! - `check_all` checks the context before every phase and returns no partial
//!   report once the context is done.

use crate::integrity::accessor::EntityAccessor;
use crate::integrity::context::CheckContext;
use crate::integrity::cycles::{
    find_dependency_cycles, find_parent_cycles, DependencyGraph, HierarchyGraph,
};
use crate::integrity::error::{CheckPhase, IntegrityError};
use crate::integrity::options::IntegrityOptions;
use crate::integrity::report::{CycleError, IntegrityResult};
use crate::model::entity::{Entity, EntityKind};
use crate::model::records::{
    Activity, Actor, Assumption, Consideration, Decision, Deliverable, Objective, Problem, Quality,
    Risk, Subsystem, UseCase,
};
use crate::repo::entity_repo::{EntityRepoResult, SqliteEntityRepository};
use log::{debug, error, info};
use rusqlite::Connection;
use std::time::Instant;

const PARENT_CYCLE_MESSAGE: &str = "circular parent reference";
const DEPENDENCY_CYCLE_MESSAGE: &str = "circular dependency";

type Handler<'a, E> = Option<Box<dyn EntityAccessor<E> + 'a>>;

/// Optional per-kind collaborators.
#[derive(Default)]
pub(crate) struct Handlers<'a> {
    pub(crate) objectives: Handler<'a, Objective>,
    pub(crate) deliverables: Handler<'a, Deliverable>,
    pub(crate) decisions: Handler<'a, Decision>,
    pub(crate) considerations: Handler<'a, Consideration>,
    pub(crate) qualities: Handler<'a, Quality>,
    pub(crate) use_cases: Handler<'a, UseCase>,
    pub(crate) subsystems: Handler<'a, Subsystem>,
    pub(crate) actors: Handler<'a, Actor>,
    pub(crate) problems: Handler<'a, Problem>,
    pub(crate) risks: Handler<'a, Risk>,
    pub(crate) assumptions: Handler<'a, Assumption>,
    pub(crate) activities: Handler<'a, Activity>,
}

impl Handlers<'_> {
    pub(crate) fn is_configured(&self, kind: EntityKind) -> bool {
        match kind {
            EntityKind::Objective => self.objectives.is_some(),
            EntityKind::Deliverable => self.deliverables.is_some(),
            EntityKind::Decision => self.decisions.is_some(),
            EntityKind::Consideration => self.considerations.is_some(),
            EntityKind::Quality => self.qualities.is_some(),
            EntityKind::UseCase => self.use_cases.is_some(),
            EntityKind::Subsystem => self.subsystems.is_some(),
            EntityKind::Actor => self.actors.is_some(),
            EntityKind::Problem => self.problems.is_some(),
            EntityKind::Risk => self.risks.is_some(),
            EntityKind::Assumption => self.assumptions.is_some(),
            EntityKind::Activity => self.activities.is_some(),
        }
    }

    fn configured_count(&self) -> usize {
        EntityKind::ALL
            .into_iter()
            .filter(|kind| self.is_configured(*kind))
            .count()
    }
}

/// Scans the entity graph for broken references and cycles.
///
/// Every accessor starts unconfigured; wire them with the `set_*_handler`
/// methods or build a fully wired checker with [`IntegrityChecker::with_store`].
#[derive(Default)]
pub struct IntegrityChecker<'a> {
    pub(crate) handlers: Handlers<'a>,
    options: IntegrityOptions,
}

impl<'a> IntegrityChecker<'a> {
    /// Creates a checker with no accessors configured.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a checker with every kind wired to SQLite repositories over
    /// one migrated connection.
    pub fn with_store(conn: &'a Connection) -> EntityRepoResult<Self> {
        let mut checker = Self::new();
        checker.set_objective_handler(SqliteEntityRepository::<Objective>::try_new(conn)?);
        checker.set_deliverable_handler(SqliteEntityRepository::<Deliverable>::try_new(conn)?);
        checker.set_decision_handler(SqliteEntityRepository::<Decision>::try_new(conn)?);
        checker.set_consideration_handler(SqliteEntityRepository::<Consideration>::try_new(conn)?);
        checker.set_quality_handler(SqliteEntityRepository::<Quality>::try_new(conn)?);
        checker.set_use_case_handler(SqliteEntityRepository::<UseCase>::try_new(conn)?);
        checker.set_subsystem_handler(SqliteEntityRepository::<Subsystem>::try_new(conn)?);
        checker.set_actor_handler(SqliteEntityRepository::<Actor>::try_new(conn)?);
        checker.set_problem_handler(SqliteEntityRepository::<Problem>::try_new(conn)?);
        checker.set_risk_handler(SqliteEntityRepository::<Risk>::try_new(conn)?);
        checker.set_assumption_handler(SqliteEntityRepository::<Assumption>::try_new(conn)?);
        checker.set_activity_handler(SqliteEntityRepository::<Activity>::try_new(conn)?);
        Ok(checker)
    }

    pub fn options(&self) -> IntegrityOptions {
        self.options
    }

    pub fn set_options(&mut self, options: IntegrityOptions) {
        self.options = options;
    }

    pub fn set_objective_handler(&mut self, handler: impl EntityAccessor<Objective> + 'a) {
        self.handlers.objectives = Some(Box::new(handler));
    }

    pub fn set_deliverable_handler(&mut self, handler: impl EntityAccessor<Deliverable> + 'a) {
        self.handlers.deliverables = Some(Box::new(handler));
    }

    pub fn set_decision_handler(&mut self, handler: impl EntityAccessor<Decision> + 'a) {
        self.handlers.decisions = Some(Box::new(handler));
    }

    pub fn set_consideration_handler(
        &mut self,
        handler: impl EntityAccessor<Consideration> + 'a,
    ) {
        self.handlers.considerations = Some(Box::new(handler));
    }

    pub fn set_quality_handler(&mut self, handler: impl EntityAccessor<Quality> + 'a) {
        self.handlers.qualities = Some(Box::new(handler));
    }

    pub fn set_use_case_handler(&mut self, handler: impl EntityAccessor<UseCase> + 'a) {
        self.handlers.use_cases = Some(Box::new(handler));
    }

    pub fn set_subsystem_handler(&mut self, handler: impl EntityAccessor<Subsystem> + 'a) {
        self.handlers.subsystems = Some(Box::new(handler));
    }

    pub fn set_actor_handler(&mut self, handler: impl EntityAccessor<Actor> + 'a) {
        self.handlers.actors = Some(Box::new(handler));
    }

    pub fn set_problem_handler(&mut self, handler: impl EntityAccessor<Problem> + 'a) {
        self.handlers.problems = Some(Box::new(handler));
    }

    pub fn set_risk_handler(&mut self, handler: impl EntityAccessor<Risk> + 'a) {
        self.handlers.risks = Some(Box::new(handler));
    }

    pub fn set_assumption_handler(&mut self, handler: impl EntityAccessor<Assumption> + 'a) {
        self.handlers.assumptions = Some(Box::new(handler));
    }

    pub fn set_activity_handler(&mut self, handler: impl EntityAccessor<Activity> + 'a) {
        self.handlers.activities = Some(Box::new(handler));
    }

    /// Reports cycles in objective parents, activity parents and activity
    /// dependencies, in that order.
    pub fn check_cycles(&self, ctx: &CheckContext) -> Result<Vec<CycleError>, IntegrityError> {
        ctx.check()?;
        let mut cycles = Vec::new();

        if let Some(objectives) = self.handlers.objectives.as_deref() {
            let objectives = load_all(ctx, objectives)?;
            cycles.extend(parent_cycles(&objectives));
        }

        if let Some(activities) = self.handlers.activities.as_deref() {
            let activities = load_all(ctx, activities)?;
            cycles.extend(parent_cycles(&activities));
            ctx.check()?;
            cycles.extend(dependency_cycles(
                &activities,
                self.options.fold_activity_parent_edges,
            ));
        }

        debug!(
            "event=cycle_scan module=integrity status=ok cycles={}",
            cycles.len()
        );
        Ok(cycles)
    }

    /// Runs every check and folds the findings into one report.
    ///
    /// # Errors
    /// - Returns the context error when `ctx` is done at a phase boundary.
    /// - Returns `IntegrityError::Access` when an accessor fails with a
    ///   storage error.
    pub fn check_all(&self, ctx: &CheckContext) -> Result<IntegrityResult, IntegrityError> {
        let started_at = Instant::now();
        info!(
            "event=integrity_check module=integrity status=start configured_kinds={}",
            self.handlers.configured_count()
        );

        match self.run_phases(ctx) {
            Ok(result) => {
                info!(
                    "event=integrity_check module=integrity status=ok valid={} reference_errors={} cycle_errors={} warnings={} duration_ms={}",
                    result.valid,
                    result.reference_errors.len(),
                    result.cycle_errors.len(),
                    result.warnings.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(result)
            }
            Err(err) => {
                error!(
                    "event=integrity_check module=integrity status=error duration_ms={} error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }

    fn run_phases(&self, ctx: &CheckContext) -> Result<IntegrityResult, IntegrityError> {
        ctx.check()?;
        let reference_errors = self.scan_references(ctx, CheckPhase::References)?.errors;

        ctx.check()?;
        let cycle_errors = self.check_cycles(ctx)?;

        ctx.check()?;
        let warnings = self.scan_references(ctx, CheckPhase::Warnings)?.warnings;

        Ok(IntegrityResult::new(reference_errors, cycle_errors, warnings))
    }
}

fn load_all<E: Entity>(
    ctx: &CheckContext,
    accessor: &(dyn EntityAccessor<E> + '_),
) -> Result<Vec<E>, IntegrityError> {
    ctx.check()?;
    accessor
        .get_all(ctx)
        .map_err(|source| IntegrityError::access(CheckPhase::Cycles, E::KIND, source))
}

fn parent_cycles<E: Entity>(entities: &[E]) -> Vec<CycleError> {
    let graph = HierarchyGraph::build(
        entities
            .iter()
            .map(|entity| (entity.id(), entity.parent_id())),
    );
    find_parent_cycles(&graph)
        .into_iter()
        .map(|cycle| CycleError {
            entity_type: E::KIND,
            cycle,
            message: PARENT_CYCLE_MESSAGE.to_string(),
        })
        .collect()
}

fn dependency_cycles<E: Entity>(entities: &[E], fold_parent_edges: bool) -> Vec<CycleError> {
    let graph = DependencyGraph::build(entities.iter().map(|entity| {
        let mut edges: Vec<&str> = entity.dependency_ids().iter().map(String::as_str).collect();
        if fold_parent_edges {
            edges.extend(entity.parent_id());
        }
        (entity.id(), edges)
    }));
    find_dependency_cycles(&graph)
        .into_iter()
        .map(|cycle| CycleError {
            entity_type: E::KIND,
            cycle,
            message: DEPENDENCY_CYCLE_MESSAGE.to_string(),
        })
        .collect()
}
