//! Tunable integrity-check behavior.

use serde::{Deserialize, Serialize};

/// Options applied to every check run by one `IntegrityChecker`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegrityOptions {
    /// Adds each activity's parent pointer as an extra edge of the dependency
    /// graph, so mixed parent/dependency loops are reported as dependency
    /// cycles. Pure parent loops are then reported by both passes.
    pub fold_activity_parent_edges: bool,
}
