//! Project entity records.
//!
//! Records are plain data. Reference fields hold raw ids and are never
//! resolved on construction or write; the integrity engine is the only place
//! references are checked.

use crate::model::entity::{Entity, EntityKind, Relation};
use serde::{Deserialize, Serialize};

/// A goal. Objectives may nest under a parent objective.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Objective {
    pub id: String,
    pub title: String,
    pub parent_id: Option<String>,
}

/// A tangible output, optionally contributing to one objective.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Deliverable {
    pub id: String,
    pub title: String,
    pub objective_id: Option<String>,
}

/// A recorded decision. Always settles exactly one consideration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Decision {
    pub id: String,
    pub title: String,
    /// Required. Empty means the decision was recorded without its source.
    pub consideration_id: String,
}

/// An open question or trade-off under discussion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Consideration {
    pub id: String,
    pub title: String,
    pub objective_id: Option<String>,
    pub deliverable_id: Option<String>,
    pub decision_id: Option<String>,
}

/// A quality attribute attached to one deliverable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Quality {
    pub id: String,
    pub title: String,
    /// Required.
    pub deliverable_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UseCase {
    pub id: String,
    pub title: String,
    /// Required.
    pub objective_id: String,
    pub subsystem_id: Option<String>,
    pub actor_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Subsystem {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Actor {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Problem {
    pub id: String,
    pub title: String,
    pub objective_id: Option<String>,
    pub deliverable_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Risk {
    pub id: String,
    pub title: String,
    pub objective_id: Option<String>,
    pub deliverable_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Assumption {
    pub id: String,
    pub title: String,
    pub objective_id: Option<String>,
    pub deliverable_id: Option<String>,
}

/// A unit of work in the breakdown structure.
///
/// `parent_id` forms the breakdown hierarchy; `dependencies` lists sibling
/// activities that must finish first and is expected to form a DAG.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Activity {
    pub id: String,
    pub title: String,
    pub parent_id: Option<String>,
    pub dependencies: Vec<String>,
    pub use_case_id: Option<String>,
    pub deliverable_id: Option<String>,
    /// Deliverables produced by this node of the breakdown.
    pub deliverables: Vec<String>,
}

macro_rules! impl_new {
    ($($record:ident),+ $(,)?) => {
        $(
            impl $record {
                /// Creates a record with every reference field unset.
                pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
                    Self {
                        id: id.into(),
                        title: title.into(),
                        ..Self::default()
                    }
                }
            }
        )+
    };
}

impl_new!(
    Objective,
    Deliverable,
    Decision,
    Consideration,
    Quality,
    UseCase,
    Subsystem,
    Actor,
    Problem,
    Risk,
    Assumption,
    Activity,
);

impl Entity for Objective {
    const KIND: EntityKind = EntityKind::Objective;

    fn id(&self) -> &str {
        &self.id
    }

    fn relations(&self) -> Vec<Relation<'_>> {
        vec![Relation::optional(
            "parent_id",
            EntityKind::Objective,
            self.parent_id.as_deref(),
        )]
    }

    fn parent_id(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }
}

impl Entity for Deliverable {
    const KIND: EntityKind = EntityKind::Deliverable;

    fn id(&self) -> &str {
        &self.id
    }

    fn relations(&self) -> Vec<Relation<'_>> {
        vec![Relation::required_if_set(
            "objective_id",
            EntityKind::Objective,
            self.objective_id.as_deref(),
        )]
    }
}

impl Entity for Decision {
    const KIND: EntityKind = EntityKind::Decision;

    fn id(&self) -> &str {
        &self.id
    }

    fn relations(&self) -> Vec<Relation<'_>> {
        vec![Relation::required(
            "consideration_id",
            EntityKind::Consideration,
            &self.consideration_id,
        )]
    }
}

impl Entity for Consideration {
    const KIND: EntityKind = EntityKind::Consideration;

    fn id(&self) -> &str {
        &self.id
    }

    fn relations(&self) -> Vec<Relation<'_>> {
        vec![
            Relation::optional(
                "objective_id",
                EntityKind::Objective,
                self.objective_id.as_deref(),
            ),
            Relation::optional(
                "deliverable_id",
                EntityKind::Deliverable,
                self.deliverable_id.as_deref(),
            ),
            Relation::optional(
                "decision_id",
                EntityKind::Decision,
                self.decision_id.as_deref(),
            ),
        ]
    }
}

impl Entity for Quality {
    const KIND: EntityKind = EntityKind::Quality;

    fn id(&self) -> &str {
        &self.id
    }

    fn relations(&self) -> Vec<Relation<'_>> {
        vec![Relation::required(
            "deliverable_id",
            EntityKind::Deliverable,
            &self.deliverable_id,
        )]
    }
}

impl Entity for UseCase {
    const KIND: EntityKind = EntityKind::UseCase;

    fn id(&self) -> &str {
        &self.id
    }

    fn relations(&self) -> Vec<Relation<'_>> {
        let mut relations = vec![
            Relation::required("objective_id", EntityKind::Objective, &self.objective_id),
            Relation::optional(
                "subsystem_id",
                EntityKind::Subsystem,
                self.subsystem_id.as_deref(),
            ),
        ];
        relations.extend(Relation::optional_list(
            "actor_ids",
            EntityKind::Actor,
            &self.actor_ids,
        ));
        relations
    }
}

impl Entity for Subsystem {
    const KIND: EntityKind = EntityKind::Subsystem;

    fn id(&self) -> &str {
        &self.id
    }

    fn relations(&self) -> Vec<Relation<'_>> {
        Vec::new()
    }
}

impl Entity for Actor {
    const KIND: EntityKind = EntityKind::Actor;

    fn id(&self) -> &str {
        &self.id
    }

    fn relations(&self) -> Vec<Relation<'_>> {
        Vec::new()
    }
}

// Problems, risks and assumptions share one relation shape.
fn scoped_relations<'a>(
    objective_id: &'a Option<String>,
    deliverable_id: &'a Option<String>,
) -> Vec<Relation<'a>> {
    vec![
        Relation::optional("objective_id", EntityKind::Objective, objective_id.as_deref()),
        Relation::optional(
            "deliverable_id",
            EntityKind::Deliverable,
            deliverable_id.as_deref(),
        ),
    ]
}

impl Entity for Problem {
    const KIND: EntityKind = EntityKind::Problem;

    fn id(&self) -> &str {
        &self.id
    }

    fn relations(&self) -> Vec<Relation<'_>> {
        scoped_relations(&self.objective_id, &self.deliverable_id)
    }
}

impl Entity for Risk {
    const KIND: EntityKind = EntityKind::Risk;

    fn id(&self) -> &str {
        &self.id
    }

    fn relations(&self) -> Vec<Relation<'_>> {
        scoped_relations(&self.objective_id, &self.deliverable_id)
    }
}

impl Entity for Assumption {
    const KIND: EntityKind = EntityKind::Assumption;

    fn id(&self) -> &str {
        &self.id
    }

    fn relations(&self) -> Vec<Relation<'_>> {
        scoped_relations(&self.objective_id, &self.deliverable_id)
    }
}

impl Entity for Activity {
    const KIND: EntityKind = EntityKind::Activity;

    fn id(&self) -> &str {
        &self.id
    }

    fn relations(&self) -> Vec<Relation<'_>> {
        let mut relations = vec![Relation::optional(
            "parent_id",
            EntityKind::Activity,
            self.parent_id.as_deref(),
        )];
        relations.extend(Relation::optional_list(
            "dependencies",
            EntityKind::Activity,
            &self.dependencies,
        ));
        relations.push(Relation::optional(
            "use_case_id",
            EntityKind::UseCase,
            self.use_case_id.as_deref(),
        ));
        relations.push(Relation::optional(
            "deliverable_id",
            EntityKind::Deliverable,
            self.deliverable_id.as_deref(),
        ));
        relations.extend(Relation::optional_list(
            "deliverables",
            EntityKind::Deliverable,
            &self.deliverables,
        ));
        relations
    }

    fn parent_id(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }

    fn dependency_ids(&self) -> &[String] {
        &self.dependencies
    }
}

#[cfg(test)]
mod tests {
    use super::{Activity, Decision, Deliverable, UseCase};
    use crate::model::entity::{Entity, EntityKind, Requirement};

    #[test]
    fn decision_declares_required_consideration() {
        let decision = Decision::new("DEC-001", "Use SQLite");
        let relations = decision.relations();
        assert_eq!(relations.len(), 1);
        assert!(relations[0].is_required());
        assert!(relations[0].is_empty());
        assert_eq!(relations[0].target, EntityKind::Consideration);
    }

    #[test]
    fn deliverable_objective_must_resolve_when_set() {
        let deliverable = Deliverable::new("DEL-001", "Report");
        let relations = deliverable.relations();
        assert_eq!(relations[0].requirement, Requirement::RequiredIfSet);
        assert!(relations[0].is_empty());
    }

    #[test]
    fn use_case_relations_follow_declaration_order() {
        let mut use_case = UseCase::new("UC-001", "Check out");
        use_case.objective_id = "OBJ-001".to_string();
        use_case.actor_ids = vec!["ACTOR-001".to_string()];

        let fields: Vec<_> = use_case
            .relations()
            .iter()
            .map(|relation| relation.field)
            .collect();
        assert_eq!(fields, vec!["objective_id", "subsystem_id", "actor_ids"]);
    }

    #[test]
    fn activity_exposes_parent_and_dependencies() {
        let mut activity = Activity::new("ACT-002", "Build");
        activity.parent_id = Some("ACT-001".to_string());
        activity.dependencies = vec!["ACT-003".to_string()];

        assert_eq!(activity.parent_id(), Some("ACT-001"));
        assert_eq!(activity.dependency_ids(), ["ACT-003".to_string()]);
    }

    #[test]
    fn missing_fields_deserialize_to_defaults() {
        let activity: Activity =
            serde_json::from_str(r#"{"id":"ACT-001","title":"Plan"}"#).expect("decode");
        assert_eq!(activity.parent_id, None);
        assert!(activity.dependencies.is_empty());
    }
}
