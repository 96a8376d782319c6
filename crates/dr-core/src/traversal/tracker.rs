//! Dependency Tracker.
//!
//! Arena graph over every element in the store. Nodes are indices into
//! `nodes`, in store order (layer order, then insertion order); edges are
//! index pairs read off resolvable link fields, in field declaration order
//! and then target order. Cycles are plain index cycles.
//!
//! The graph is rebuilt from scratch after every committed mutation.

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::errors::{DrError, Result};
use crate::ops::ElementStore;
use crate::registry::{LinkRegistry, PredicateCategory, Strength};

/// Traversal direction. `Forward` follows link fields from source to
/// target; `Backward` walks them in reverse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Forward,
    Backward,
}

/// A resolved link between two arena nodes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    /// Node index of the element holding the link
    pub source: usize,
    /// Node index of the referenced element
    pub target: usize,
    /// Link field on the source element
    pub field: String,
    pub predicate: String,
    pub category: PredicateCategory,
    pub strength: Strength,
}

/// A cycle found by depth-first search: `nodes[0] -> nodes[1] -> .. -> nodes[0]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cycle {
    pub nodes: Vec<String>,
    /// Predicate with the highest strength on the cycle, and that strength
    pub strongest: (String, Strength),
}

/// Link graph over one store: node arena, edge list and per-node
/// adjacency (edge indices) in both directions
#[derive(Debug, Clone, Default)]
pub struct DependencyTracker {
    nodes: Vec<String>,
    index: HashMap<String, usize>,
    edges: Vec<Edge>,
    forward: Vec<Vec<usize>>,
    backward: Vec<Vec<usize>>,
}

/// Depth-first colouring used by cycle detection
#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    /// Not reached yet
    Unvisited,
    /// On the current path; reaching it again closes a cycle
    OnStack,
    /// Fully explored
    Done,
}

impl DependencyTracker {
    /// Build the graph from every link that resolves: registered field,
    /// known predicate, existing target of an accepted (layer, type).
    pub fn build(store: &ElementStore, links: &LinkRegistry) -> Self {
        let nodes: Vec<String> = store.ids();
        let index: HashMap<String, usize> = nodes
            .iter()
            .enumerate()
            .map(|(i, id)| (id.clone(), i))
            .collect();

        let mut tracker = Self {
            forward: vec![Vec::new(); nodes.len()],
            backward: vec![Vec::new(); nodes.len()],
            nodes,
            index,
            edges: Vec::new(),
        };

        for element in store.iter() {
            let Some(&source) = tracker.index.get(&element.id) else {
                continue;
            };
            for link in &element.links {
                let Some(rule) = links.field_rule(element.layer, &element.element_type, &link.field)
                else {
                    continue;
                };
                let Some(category) = links.category_of(&rule.predicate) else {
                    continue;
                };
                for target_id in &link.targets {
                    let Some(target) = store.get(target_id) else {
                        continue;
                    };
                    if !rule.accepts_target(target.layer, &target.element_type) {
                        continue;
                    }
                    let Some(&target) = tracker.index.get(target_id) else {
                        continue;
                    };
                    tracker.push_edge(Edge {
                        source,
                        target,
                        field: link.field.clone(),
                        predicate: rule.predicate.clone(),
                        category,
                        strength: rule.strength,
                    });
                }
            }
        }

        tracker
    }

    fn push_edge(&mut self, edge: Edge) {
        let slot = self.edges.len();
        self.forward[edge.source].push(slot);
        self.backward[edge.target].push(slot);
        self.edges.push(edge);
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Element id of an arena node
    pub fn node_id(&self, node: usize) -> Option<&str> {
        self.nodes.get(node).map(String::as_str)
    }

    fn node(&self, id: &str) -> Result<usize> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| DrError::ElementNotFound {
                element_id: id.to_string(),
            })
    }

    fn adjacency(&self, direction: Direction) -> &[Vec<usize>] {
        match direction {
            Direction::Forward => &self.forward,
            Direction::Backward => &self.backward,
        }
    }

    fn far_end(&self, edge: &Edge, direction: Direction) -> usize {
        match direction {
            Direction::Forward => edge.target,
            Direction::Backward => edge.source,
        }
    }

    /// Edges leaving (`Forward`) or entering (`Backward`) an element
    ///
    /// # Errors
    ///
    /// Returns `ElementNotFound` for an unknown id.
    pub fn incident(&self, id: &str, direction: Direction) -> Result<Vec<&Edge>> {
        let node = self.node(id)?;
        Ok(self.adjacency(direction)[node]
            .iter()
            .map(|e| &self.edges[*e])
            .collect())
    }

    /// True if any cycle exists
    pub fn has_cycle(&self) -> bool {
        self.search_cycles(true).into_iter().next().is_some()
    }

    /// Every cycle closed by a back-edge during one depth-first pass.
    ///
    /// Nodes are visited in arena order, so the result is deterministic.
    pub fn cycles(&self) -> Vec<Cycle> {
        self.search_cycles(false)
    }

    /// Iterative DFS keeping an explicit recursion stack. A back-edge to a
    /// node still on the stack closes a cycle.
    fn search_cycles(&self, first_only: bool) -> Vec<Cycle> {
        let mut marks = vec![Mark::Unvisited; self.nodes.len()];
        let mut found = Vec::new();

        for root in 0..self.nodes.len() {
            if marks[root] != Mark::Unvisited {
                continue;
            }
            // (node, next position in its forward edge list)
            let mut stack: Vec<(usize, usize)> = vec![(root, 0)];
            // edge taken to reach stack[i + 1]
            let mut via: Vec<usize> = Vec::new();
            marks[root] = Mark::OnStack;

            while let Some(&mut (node, ref mut cursor)) = stack.last_mut() {
                let Some(&edge_slot) = self.forward[node].get(*cursor) else {
                    marks[node] = Mark::Done;
                    stack.pop();
                    via.pop();
                    continue;
                };
                *cursor += 1;

                let next = self.edges[edge_slot].target;
                match marks[next] {
                    Mark::Unvisited => {
                        marks[next] = Mark::OnStack;
                        stack.push((next, 0));
                        via.push(edge_slot);
                    }
                    Mark::OnStack => {
                        found.push(self.close_cycle(&stack, &via, next, edge_slot));
                        if first_only {
                            return found;
                        }
                    }
                    Mark::Done => {}
                }
            }
        }

        found
    }

    fn close_cycle(
        &self,
        stack: &[(usize, usize)],
        via: &[usize],
        start: usize,
        closing_edge: usize,
    ) -> Cycle {
        let from = stack.iter().position(|(n, _)| *n == start).unwrap_or(0);
        let nodes = stack[from..]
            .iter()
            .map(|(n, _)| self.nodes[*n].clone())
            .collect();

        let strongest = via[from..]
            .iter()
            .chain(std::iter::once(&closing_edge))
            .map(|e| &self.edges[*e])
            .fold(None::<&Edge>, |best, e| match best {
                Some(b) if b.strength >= e.strength => Some(b),
                _ => Some(e),
            })
            .map(|e| (e.predicate.clone(), e.strength))
            .unwrap_or_else(|| (String::new(), Strength::Low));

        Cycle { nodes, strongest }
    }

    /// Elements reachable from `id`, excluding `id` itself, in breadth-first
    /// discovery order. `max_depth` is an inclusive bound on edge count.
    ///
    /// # Errors
    ///
    /// Returns `ElementNotFound` for an unknown id.
    pub fn reachable_from(
        &self,
        id: &str,
        direction: Direction,
        max_depth: Option<usize>,
    ) -> Result<Vec<String>> {
        let seed = self.node(id)?;
        let adjacency = self.adjacency(direction);
        let mut visited = vec![false; self.nodes.len()];
        let mut queue = VecDeque::new();
        let mut reached = Vec::new();

        visited[seed] = true;
        queue.push_back((seed, 0usize));

        while let Some((node, depth)) = queue.pop_front() {
            if max_depth.is_some_and(|max| depth >= max) {
                continue;
            }
            for edge_slot in &adjacency[node] {
                let next = self.far_end(&self.edges[*edge_slot], direction);
                if !visited[next] {
                    visited[next] = true;
                    reached.push(self.nodes[next].clone());
                    queue.push_back((next, depth + 1));
                }
            }
        }

        Ok(reached)
    }

    /// Fewest-edge forward path from `from` to `to`, both ends included.
    /// Ties go to the first-discovered route.
    ///
    /// # Errors
    ///
    /// Returns `ElementNotFound` if either id is unknown.
    pub fn shortest_path(&self, from: &str, to: &str) -> Result<Option<Vec<String>>> {
        self.shortest_path_in(from, to, Direction::Forward)
    }

    /// Shortest path following edges in the given direction.
    ///
    /// # Errors
    ///
    /// Returns `ElementNotFound` if either id is unknown.
    pub fn shortest_path_in(
        &self,
        from: &str,
        to: &str,
        direction: Direction,
    ) -> Result<Option<Vec<String>>> {
        let start = self.node(from)?;
        let goal = self.node(to)?;
        if start == goal {
            return Ok(Some(vec![self.nodes[start].clone()]));
        }

        let adjacency = self.adjacency(direction);
        let mut parent: Vec<Option<usize>> = vec![None; self.nodes.len()];
        let mut visited = vec![false; self.nodes.len()];
        let mut queue = VecDeque::new();
        visited[start] = true;
        queue.push_back(start);

        while let Some(node) = queue.pop_front() {
            for edge_slot in &adjacency[node] {
                let next = self.far_end(&self.edges[*edge_slot], direction);
                if visited[next] {
                    continue;
                }
                visited[next] = true;
                parent[next] = Some(node);
                if next == goal {
                    let mut path = vec![self.nodes[goal].clone()];
                    let mut cursor = node;
                    path.push(self.nodes[cursor].clone());
                    while let Some(p) = parent[cursor] {
                        path.push(self.nodes[p].clone());
                        cursor = p;
                    }
                    path.reverse();
                    return Ok(Some(path));
                }
                queue.push_back(next);
            }
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Element, LayerName};

    fn components(chain: &[(&str, &[&str])]) -> ElementStore {
        let mut store = ElementStore::new(&[LayerName::Application]);
        for (id, deps) in chain {
            let mut element = Element::new(*id, LayerName::Application, "component", *id);
            if !deps.is_empty() {
                element = element.with_link("depends-on", deps.iter().copied());
            }
            store.insert(element).unwrap();
        }
        store
    }

    #[test]
    fn test_cycle_detected() {
        let store = components(&[("a", &["b"]), ("b", &["c"]), ("c", &["a"])]);
        let tracker = DependencyTracker::build(&store, &LinkRegistry::builtin());

        assert!(tracker.has_cycle());
        let cycles = tracker.cycles();
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].nodes, vec!["a", "b", "c"]);
        assert_eq!(cycles[0].strongest, ("depends-on".to_string(), Strength::Medium));
    }

    #[test]
    fn test_chain_has_no_cycle() {
        let store = components(&[("a", &["b"]), ("b", &["c"]), ("c", &[])]);
        let tracker = DependencyTracker::build(&store, &LinkRegistry::builtin());
        assert!(!tracker.has_cycle());
    }

    #[test]
    fn test_self_loop_is_cycle() {
        let store = components(&[("a", &["a"])]);
        let tracker = DependencyTracker::build(&store, &LinkRegistry::builtin());
        assert!(tracker.has_cycle());
    }

    #[test]
    fn test_reachable_respects_depth() {
        let store = components(&[("a", &["b"]), ("b", &["c"]), ("c", &["d"]), ("d", &[])]);
        let tracker = DependencyTracker::build(&store, &LinkRegistry::builtin());

        let all = tracker.reachable_from("a", Direction::Forward, None).unwrap();
        assert_eq!(all, vec!["b", "c", "d"]);

        let one = tracker.reachable_from("a", Direction::Forward, Some(1)).unwrap();
        assert_eq!(one, vec!["b"]);

        let zero = tracker.reachable_from("a", Direction::Forward, Some(0)).unwrap();
        assert!(zero.is_empty());

        let back = tracker.reachable_from("d", Direction::Backward, None).unwrap();
        assert_eq!(back, vec!["c", "b", "a"]);
    }

    #[test]
    fn test_reachable_terminates_on_cycle() {
        let store = components(&[("a", &["b"]), ("b", &["a"])]);
        let tracker = DependencyTracker::build(&store, &LinkRegistry::builtin());
        let reached = tracker.reachable_from("a", Direction::Forward, None).unwrap();
        assert_eq!(reached, vec!["b"]);
    }

    #[test]
    fn test_unknown_seed_fails() {
        let tracker = DependencyTracker::build(&components(&[]), &LinkRegistry::builtin());
        assert!(matches!(
            tracker.reachable_from("ghost", Direction::Forward, None),
            Err(DrError::ElementNotFound { .. })
        ));
    }

    #[test]
    fn test_shortest_path_tie_break() {
        // a -> b -> d and a -> c -> d: b is declared first
        let store = components(&[("a", &["b", "c"]), ("b", &["d"]), ("c", &["d"]), ("d", &[])]);
        let tracker = DependencyTracker::build(&store, &LinkRegistry::builtin());

        let path = tracker.shortest_path("a", "d").unwrap().unwrap();
        assert_eq!(path, vec!["a", "b", "d"]);

        assert_eq!(tracker.shortest_path("d", "a").unwrap(), None);
        assert_eq!(
            tracker.shortest_path_in("d", "a", Direction::Backward).unwrap().unwrap().len(),
            3
        );
        assert_eq!(tracker.shortest_path("a", "a").unwrap().unwrap(), vec!["a"]);
    }

    #[test]
    fn test_dangling_and_mistyped_links_are_not_edges() {
        let mut store = ElementStore::new(&[LayerName::Motivation, LayerName::Business]);
        store
            .insert(Element::new("driver-1", LayerName::Motivation, "driver", "D"))
            .unwrap();
        store
            .insert(
                Element::new("service-1", LayerName::Business, "service", "S")
                    .with_link("supports-goals", ["driver-1", "goal-missing"]),
            )
            .unwrap();

        let tracker = DependencyTracker::build(&store, &LinkRegistry::builtin());
        assert_eq!(tracker.edge_count(), 0);
        assert_eq!(tracker.node_count(), 2);
    }
}
