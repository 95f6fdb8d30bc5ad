//! Cycle detection over parent pointers and dependency lists.
//!
//! # Responsibility
//! - Flatten an entity snapshot into an index arena once per scan.
//! - Report every node that sits on a cycle at least once.
//!
//! # Invariants
//! - Nodes are indexed in ascending id order, so walks and reports are
//!   deterministic for a given snapshot.
//! - Edges to ids missing from the snapshot are dropped; dangling references
//!   are reported by the reference scan, not here.
//! - Every reported cycle starts and ends with the same id.
//! - Cycles sharing members are not deduplicated.

use std::collections::{HashMap, HashSet};

/// Ids of one snapshot, indexed in ascending order.
#[derive(Debug, Clone, Default)]
struct NodeArena {
    ids: Vec<String>,
    index: HashMap<String, usize>,
}

impl NodeArena {
    fn from_ids<'e>(ids: impl IntoIterator<Item = &'e str>) -> Self {
        let mut ids: Vec<String> = ids.into_iter().map(str::to_string).collect();
        ids.sort_unstable();
        ids.dedup();
        let index = ids
            .iter()
            .enumerate()
            .map(|(position, id)| (id.clone(), position))
            .collect();
        Self { ids, index }
    }

    fn lookup(&self, id: &str) -> Option<usize> {
        if id.is_empty() {
            return None;
        }
        self.index.get(id).copied()
    }

    fn len(&self) -> usize {
        self.ids.len()
    }

    /// Closes the cycle that re-enters `path` at `at`.
    fn close_cycle(&self, path: impl IntoIterator<Item = usize>, at: usize) -> Vec<String> {
        let path: Vec<usize> = path.into_iter().collect();
        let start = path.iter().position(|&node| node == at).unwrap_or(0);
        let mut cycle: Vec<String> = path[start..]
            .iter()
            .map(|&node| self.ids[node].clone())
            .collect();
        cycle.push(self.ids[at].clone());
        cycle
    }
}

/// Single-parent hierarchy: node -> optional parent.
#[derive(Debug, Clone, Default)]
pub struct HierarchyGraph {
    arena: NodeArena,
    parents: Vec<Option<usize>>,
}

impl HierarchyGraph {
    /// Builds the graph from `(id, parent_id)` pairs.
    pub fn build<'e>(nodes: impl IntoIterator<Item = (&'e str, Option<&'e str>)>) -> Self {
        let nodes: Vec<(&str, Option<&str>)> = nodes.into_iter().collect();
        let arena = NodeArena::from_ids(nodes.iter().map(|(id, _)| *id));
        let mut parents = vec![None; arena.len()];
        for (id, parent_id) in &nodes {
            if let Some(node) = arena.lookup(id) {
                parents[node] = parent_id.and_then(|parent_id| arena.lookup(parent_id));
            }
        }
        Self { arena, parents }
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.len() == 0
    }
}

/// Walks parent pointers from `start` and returns the cycle it closes, if any.
///
/// The walk stops at a root, at a node already in `global_visited` (its chain
/// was settled by an earlier walk), or at a node seen earlier in this walk. All
/// nodes touched are merged into `global_visited` before returning.
///
/// Returns `None` without walking when `start` is not a node of `graph` or
/// `global_visited` has fewer slots than `graph` has nodes.
pub(crate) fn detect_cycle(
    start: usize,
    graph: &HierarchyGraph,
    global_visited: &mut [bool],
) -> Option<Vec<String>> {
    if start >= graph.len() || global_visited.len() < graph.len() {
        return None;
    }
    let mut path = Vec::new();
    let mut local_visited = HashSet::new();
    let mut current = Some(start);
    let mut cycle = None;

    while let Some(node) = current {
        if global_visited[node] {
            break;
        }
        if !local_visited.insert(node) {
            cycle = Some(graph.arena.close_cycle(path.iter().copied(), node));
            break;
        }
        path.push(node);
        current = graph.parents[node];
    }

    for node in local_visited {
        global_visited[node] = true;
    }
    cycle
}

/// Runs `detect_cycle` from every node in ascending id order.
pub fn find_parent_cycles(graph: &HierarchyGraph) -> Vec<Vec<String>> {
    let mut global_visited = vec![false; graph.len()];
    (0..graph.len())
        .filter_map(|start| detect_cycle(start, graph, &mut global_visited))
        .collect()
}

/// Multi-edge graph: node -> ordered out-edges.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    arena: NodeArena,
    edges: Vec<Vec<usize>>,
}

impl DependencyGraph {
    /// Builds the graph from `(id, out-edge ids)` pairs. Edge order is kept.
    pub fn build<'e, I>(nodes: I) -> Self
    where
        I: IntoIterator<Item = (&'e str, Vec<&'e str>)>,
    {
        let nodes: Vec<(&str, Vec<&str>)> = nodes.into_iter().collect();
        let arena = NodeArena::from_ids(nodes.iter().map(|(id, _)| *id));
        let mut edges = vec![Vec::new(); arena.len()];
        for (id, targets) in &nodes {
            if let Some(node) = arena.lookup(id) {
                edges[node].extend(targets.iter().filter_map(|target| arena.lookup(target)));
            }
        }
        Self { arena, edges }
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.len() == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

/// Three-color DFS over every node; records a cycle on each gray revisit and
/// keeps searching, so disjoint cycles are all reported.
pub fn find_dependency_cycles(graph: &DependencyGraph) -> Vec<Vec<String>> {
    let mut color = vec![Color::White; graph.len()];
    let mut cycles = Vec::new();
    // (node, index of the next out-edge to follow)
    let mut stack: Vec<(usize, usize)> = Vec::new();

    for root in 0..graph.len() {
        if color[root] != Color::White {
            continue;
        }
        color[root] = Color::Gray;
        stack.push((root, 0));

        while let Some(&(node, next_edge)) = stack.last() {
            let Some(&target) = graph.edges[node].get(next_edge) else {
                color[node] = Color::Black;
                stack.pop();
                continue;
            };

            let top = stack.len() - 1;
            stack[top].1 += 1;
            match color[target] {
                Color::White => {
                    color[target] = Color::Gray;
                    stack.push((target, 0));
                }
                Color::Gray => {
                    let path = stack.iter().map(|&(node, _)| node);
                    cycles.push(graph.arena.close_cycle(path, target));
                }
                Color::Black => {}
            }
        }
    }

    cycles
}

#[cfg(test)]
mod tests {
    use super::{
        detect_cycle, find_dependency_cycles, find_parent_cycles, DependencyGraph, HierarchyGraph,
    };

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn parent_dag_has_no_cycles() {
        let graph = HierarchyGraph::build([
            ("A", None),
            ("B", Some("A")),
            ("C", Some("A")),
            ("D", Some("C")),
        ]);
        assert!(find_parent_cycles(&graph).is_empty());
    }

    #[test]
    fn three_node_parent_cycle_is_reported_once() {
        let graph = HierarchyGraph::build([("A", Some("B")), ("B", Some("C")), ("C", Some("A"))]);
        let cycles = find_parent_cycles(&graph);
        assert_eq!(cycles, vec![ids(&["A", "B", "C", "A"])]);
    }

    #[test]
    fn self_parent_is_minimal_cycle() {
        let graph = HierarchyGraph::build([("A", Some("A"))]);
        assert_eq!(find_parent_cycles(&graph), vec![ids(&["A", "A"])]);
    }

    #[test]
    fn tail_leading_into_cycle_is_excluded_from_report() {
        let graph = HierarchyGraph::build([
            ("A", Some("B")),
            ("B", Some("C")),
            ("C", Some("B")),
        ]);
        assert_eq!(find_parent_cycles(&graph), vec![ids(&["B", "C", "B"])]);
    }

    #[test]
    fn dangling_parent_terminates_walk() {
        let graph = HierarchyGraph::build([("A", Some("Z")), ("B", Some("A"))]);
        assert!(find_parent_cycles(&graph).is_empty());
    }

    #[test]
    fn global_visited_short_circuits_settled_chains() {
        let graph = HierarchyGraph::build([("A", None), ("B", Some("A")), ("C", Some("B"))]);
        let mut global_visited = vec![false; graph.len()];

        assert_eq!(detect_cycle(1, &graph, &mut global_visited), None);
        assert_eq!(global_visited, vec![true, true, false]);

        assert_eq!(detect_cycle(2, &graph, &mut global_visited), None);
        assert!(global_visited.iter().all(|visited| *visited));
    }

    #[test]
    fn out_of_range_walk_returns_none() {
        let graph = HierarchyGraph::build([("A", Some("A")), ("B", None)]);

        let mut global_visited = vec![false; graph.len()];
        assert_eq!(detect_cycle(2, &graph, &mut global_visited), None);
        assert_eq!(global_visited, vec![false, false]);

        let mut short = vec![false; 1];
        assert_eq!(detect_cycle(0, &graph, &mut short), None);
        assert_eq!(short, vec![false]);
    }

    #[test]
    fn disjoint_parent_cycles_are_all_reported() {
        let graph = HierarchyGraph::build([
            ("A", Some("B")),
            ("B", Some("A")),
            ("X", Some("Y")),
            ("Y", Some("X")),
        ]);
        assert_eq!(
            find_parent_cycles(&graph),
            vec![ids(&["A", "B", "A"]), ids(&["X", "Y", "X"])]
        );
    }

    #[test]
    fn dependency_dag_has_no_cycles() {
        let graph = DependencyGraph::build([
            ("A", vec!["B", "C"]),
            ("B", vec!["C"]),
            ("C", vec![]),
        ]);
        assert!(find_dependency_cycles(&graph).is_empty());
    }

    #[test]
    fn dependency_cycle_is_closed_on_first_member() {
        let graph = DependencyGraph::build([
            ("A", vec!["B"]),
            ("B", vec!["C"]),
            ("C", vec!["A"]),
        ]);
        assert_eq!(
            find_dependency_cycles(&graph),
            vec![ids(&["A", "B", "C", "A"])]
        );
    }

    #[test]
    fn self_dependency_is_minimal_cycle() {
        let graph = DependencyGraph::build([("A", vec!["A"])]);
        assert_eq!(find_dependency_cycles(&graph), vec![ids(&["A", "A"])]);
    }

    #[test]
    fn search_continues_past_first_cycle() {
        let graph = DependencyGraph::build([
            ("A", vec!["B"]),
            ("B", vec!["A"]),
            ("C", vec!["D"]),
            ("D", vec!["C"]),
        ]);
        assert_eq!(
            find_dependency_cycles(&graph),
            vec![ids(&["A", "B", "A"]), ids(&["C", "D", "C"])]
        );
    }

    #[test]
    fn overlapping_cycles_are_not_deduplicated() {
        let graph = DependencyGraph::build([
            ("A", vec!["B", "C"]),
            ("B", vec!["A"]),
            ("C", vec!["A"]),
        ]);
        assert_eq!(
            find_dependency_cycles(&graph),
            vec![ids(&["A", "B", "A"]), ids(&["A", "C", "A"])]
        );
    }

    #[test]
    fn dangling_dependency_does_not_block_detection() {
        let graph = DependencyGraph::build([
            ("A", vec!["MISSING", "B"]),
            ("B", vec!["A"]),
        ]);
        assert_eq!(find_dependency_cycles(&graph), vec![ids(&["A", "B", "A"])]);
    }
}
