//! Entity kinds, relation declarations and the shared `Entity` contract.
//!
//! # Invariants
//! - `EntityKind::as_str` values are stable; they are persisted in the
//!   `entities.kind` column and rendered in every integrity report line.
//! - `Entity::relations` yields relations in declaration order, so reports
//!   built from it are reproducible for a given data state.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Every entity kind known to the project model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
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
}

impl EntityKind {
    /// All kinds in declaration order.
    pub const ALL: [EntityKind; 12] = [
        Self::Objective,
        Self::Deliverable,
        Self::Decision,
        Self::Consideration,
        Self::Quality,
        Self::UseCase,
        Self::Subsystem,
        Self::Actor,
        Self::Problem,
        Self::Risk,
        Self::Assumption,
        Self::Activity,
    ];

    /// Stable lowercase name used in storage and report lines.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Objective => "objective",
            Self::Deliverable => "deliverable",
            Self::Decision => "decision",
            Self::Consideration => "consideration",
            Self::Quality => "quality",
            Self::UseCase => "use_case",
            Self::Subsystem => "subsystem",
            Self::Actor => "actor",
            Self::Problem => "problem",
            Self::Risk => "risk",
            Self::Assumption => "assumption",
            Self::Activity => "activity",
        }
    }

    /// Namespace prefix every id of this kind starts with.
    pub fn id_prefix(self) -> &'static str {
        match self {
            Self::Objective => "OBJ",
            Self::Deliverable => "DEL",
            Self::Decision => "DEC",
            Self::Consideration => "CON",
            Self::Quality => "QUAL",
            Self::UseCase => "UC",
            Self::Subsystem => "SUB",
            Self::Actor => "ACTOR",
            Self::Problem => "PROB",
            Self::Risk => "RISK",
            Self::Assumption => "ASM",
            Self::Activity => "ACT",
        }
    }

    /// Parses a stored kind name.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == value)
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a relation must be present and resolvable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// Empty or dangling values are reference errors.
    Required,
    /// Empty is fine; dangling values are reference errors.
    RequiredIfSet,
    /// Empty is fine; dangling values are warnings.
    Optional,
}

/// One declared outgoing reference of an entity instance.
///
/// List-valued fields expand into one `Relation` per element, all sharing the
/// same `field` name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relation<'a> {
    /// Field name as written in report messages.
    pub field: &'static str,
    /// Kind the referenced id must resolve to.
    pub target: EntityKind,
    /// Referenced id. Empty means "not set".
    pub target_id: &'a str,
    pub requirement: Requirement,
}

impl<'a> Relation<'a> {
    pub fn required(field: &'static str, target: EntityKind, target_id: &'a str) -> Self {
        Self {
            field,
            target,
            target_id,
            requirement: Requirement::Required,
        }
    }

    pub fn optional(field: &'static str, target: EntityKind, target_id: Option<&'a str>) -> Self {
        Self {
            field,
            target,
            target_id: target_id.unwrap_or_default(),
            requirement: Requirement::Optional,
        }
    }

    pub fn required_if_set(
        field: &'static str,
        target: EntityKind,
        target_id: Option<&'a str>,
    ) -> Self {
        Self {
            requirement: Requirement::RequiredIfSet,
            ..Self::optional(field, target, target_id)
        }
    }

    /// Expands a list field into optional relations, one per element.
    pub fn optional_list(
        field: &'static str,
        target: EntityKind,
        target_ids: &'a [String],
    ) -> impl Iterator<Item = Relation<'a>> + 'a {
        target_ids
            .iter()
            .map(move |target_id| Self::optional(field, target, Some(target_id.as_str())))
    }

    /// Whether an empty value is a reference error.
    pub fn is_required(&self) -> bool {
        self.requirement == Requirement::Required
    }

    /// Whether a value that does not resolve is a reference error.
    pub fn dangling_is_error(&self) -> bool {
        matches!(
            self.requirement,
            Requirement::Required | Requirement::RequiredIfSet
        )
    }

    /// Only a zero-length id is unset; whitespace ids are resolved and
    /// fail as malformed.
    pub fn is_empty(&self) -> bool {
        self.target_id.is_empty()
    }
}

/// Contract shared by every persisted project entity.
pub trait Entity: Clone + Serialize + DeserializeOwned {
    /// Kind of every instance of this type.
    const KIND: EntityKind;

    /// Stable namespaced id.
    fn id(&self) -> &str;

    /// Outgoing references in declaration order.
    fn relations(&self) -> Vec<Relation<'_>>;

    /// Parent pointer used for hierarchy cycle detection.
    fn parent_id(&self) -> Option<&str> {
        None
    }

    /// Same-kind dependency edges used for DAG cycle detection.
    fn dependency_ids(&self) -> &[String] {
        &[]
    }
}

#[cfg(test)]
mod tests {
    use super::{EntityKind, Relation, Requirement};

    #[test]
    fn kind_names_round_trip() {
        for kind in EntityKind::ALL {
            assert_eq!(EntityKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(EntityKind::parse("milestone"), None);
    }

    #[test]
    fn kind_prefixes_are_unique() {
        let mut prefixes = EntityKind::ALL.map(EntityKind::id_prefix).to_vec();
        prefixes.sort_unstable();
        prefixes.dedup();
        assert_eq!(prefixes.len(), EntityKind::ALL.len());
    }

    #[test]
    fn optional_relation_treats_none_as_empty() {
        let relation = Relation::optional("subsystem_id", EntityKind::Subsystem, None);
        assert!(relation.is_empty());
        assert_eq!(relation.requirement, Requirement::Optional);
    }

    #[test]
    fn whitespace_id_is_not_empty() {
        let relation = Relation::required("consideration_id", EntityKind::Consideration, "   ");
        assert!(!relation.is_empty());
        let relation = Relation::optional("objective_id", EntityKind::Objective, Some(" "));
        assert!(!relation.is_empty());
    }

    #[test]
    fn required_if_set_allows_empty_but_not_dangling() {
        let relation = Relation::required_if_set("objective_id", EntityKind::Objective, None);
        assert!(relation.is_empty());
        assert!(!relation.is_required());
        assert!(relation.dangling_is_error());
        assert!(!Relation::optional("objective_id", EntityKind::Objective, None).dangling_is_error());
    }

    #[test]
    fn optional_list_expands_in_order() {
        let ids = vec!["ACTOR-001".to_string(), "ACTOR-002".to_string()];
        let relations: Vec<_> = Relation::optional_list("actor_ids", EntityKind::Actor, &ids).collect();
        assert_eq!(relations.len(), 2);
        assert_eq!(relations[0].target_id, "ACTOR-001");
        assert_eq!(relations[1].target_id, "ACTOR-002");
        assert!(relations.iter().all(|relation| relation.field == "actor_ids"));
    }
}
