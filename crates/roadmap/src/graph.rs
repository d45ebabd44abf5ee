//! In-memory adjacency index over dependency edges, built with petgraph.
//!
//! The service builds one of these per check from a single edge query, then
//! answers reachability without touching the store again:
//! - Path search (BFS with predecessor links)
//! - Cycle prediction for a candidate edge
//! - Whole-graph cycle scan via strongly connected components
//!
//! Edges point from predecessor to successor (`from` must happen before
//! `to`). Parallel edges of different kinds collapse into one structural
//! edge, since kind has no bearing on reachability.

use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::types::{Cycle, EntityRef};

/// Directed graph of entity references.
#[derive(Debug, Default, Clone)]
pub struct DependencyGraph {
    graph: DiGraph<EntityRef, ()>,
    node_map: HashMap<EntityRef, NodeIndex>,
}

impl DependencyGraph {
    /// Create an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from `(from, to)` pairs.
    pub fn from_edges<I>(edges: I) -> Self
    where
        I: IntoIterator<Item = (EntityRef, EntityRef)>,
    {
        let mut graph = Self::new();
        for (from, to) in edges {
            graph.add_edge(from, to);
        }
        graph
    }

    fn node(&mut self, entity: EntityRef) -> NodeIndex {
        if let Some(&index) = self.node_map.get(&entity) {
            return index;
        }
        let index = self.graph.add_node(entity.clone());
        self.node_map.insert(entity, index);
        index
    }

    /// Add a structural edge. Adding an existing edge again is a no-op.
    pub fn add_edge(&mut self, from: EntityRef, to: EntityRef) {
        let from = self.node(from);
        let to = self.node(to);
        self.graph.update_edge(from, to, ());
    }

    /// Number of distinct entities.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of structural edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Shortest path `start ⇝ goal` following edge direction, inclusive of
    /// both ends. `None` when `goal` is unreachable.
    ///
    /// Each node is visited at most once, so the search is linear in the size
    /// of the graph and terminates even if stored data already has a loop.
    #[must_use]
    pub fn find_path(&self, start: &EntityRef, goal: &EntityRef) -> Option<Vec<EntityRef>> {
        let &start_node = self.node_map.get(start)?;
        let &goal_node = self.node_map.get(goal)?;

        if start_node == goal_node {
            return Some(vec![start.clone()]);
        }

        let mut predecessor: HashMap<NodeIndex, NodeIndex> = HashMap::new();
        let mut visited: HashSet<NodeIndex> = HashSet::from([start_node]);
        let mut queue: VecDeque<NodeIndex> = VecDeque::from([start_node]);

        while let Some(current) = queue.pop_front() {
            for next in self.graph.neighbors(current) {
                if !visited.insert(next) {
                    continue;
                }
                predecessor.insert(next, current);

                if next == goal_node {
                    return Some(self.unwind(&predecessor, start_node, goal_node));
                }
                queue.push_back(next);
            }
        }

        None
    }

    fn unwind(
        &self,
        predecessor: &HashMap<NodeIndex, NodeIndex>,
        start: NodeIndex,
        goal: NodeIndex,
    ) -> Vec<EntityRef> {
        let mut path = vec![self.graph[goal].clone()];
        let mut current = goal;
        while current != start {
            let Some(&previous) = predecessor.get(&current) else {
                break;
            };
            path.push(self.graph[previous].clone());
            current = previous;
        }
        path.reverse();
        path
    }

    /// The loop that adding `from → to` would close, if any.
    ///
    /// A loop exists iff `to ⇝ from` is already reachable. The returned path
    /// starts and ends at `from`: `[from, to, …, from]`.
    #[must_use]
    pub fn would_create_cycle(&self, from: &EntityRef, to: &EntityRef) -> Option<Vec<EntityRef>> {
        if from == to {
            return Some(vec![from.clone(), to.clone()]);
        }

        let existing = self.find_path(to, from)?;
        let mut path = Vec::with_capacity(existing.len() + 1);
        path.push(from.clone());
        path.extend(existing);
        Some(path)
    }

    /// One cycle per strongly connected component that has one.
    ///
    /// Each cycle is rotated to start at its smallest entity so the output is
    /// stable across runs. Cycles are sorted by that first entity.
    #[must_use]
    pub fn cycles(&self) -> Vec<Cycle> {
        let components = tarjan_scc(&self.graph);

        let mut cycles: Vec<Cycle> = components
            .into_iter()
            .filter_map(|component| self.component_cycle(&component))
            .collect();

        cycles.sort_by(|a, b| a.entities.first().cmp(&b.entities.first()));

        tracing::debug!(
            node_count = self.node_count(),
            edge_count = self.edge_count(),
            cycle_count = cycles.len(),
            "Strongly connected component scan complete"
        );

        cycles
    }

    /// Concrete cycle through the smallest member of `component`.
    fn component_cycle(&self, component: &[NodeIndex]) -> Option<Cycle> {
        let &anchor = component
            .iter()
            .min_by(|a, b| self.graph[**a].cmp(&self.graph[**b]))?;

        if component.len() == 1 {
            // A singleton is only cyclic through a self-edge
            return self
                .graph
                .contains_edge(anchor, anchor)
                .then(|| Cycle {
                    entities: vec![self.graph[anchor].clone()],
                });
        }

        // Any successor inside the component leads back to the anchor
        let members: HashSet<NodeIndex> = component.iter().copied().collect();
        let anchor_ref = &self.graph[anchor];
        let mut best: Option<Vec<EntityRef>> = None;
        for next in self.graph.neighbors(anchor).filter(|n| members.contains(n)) {
            if let Some(path) = self.find_path(&self.graph[next], anchor_ref) {
                if best.as_ref().is_none_or(|b| path.len() < b.len()) {
                    best = Some(path);
                }
            }
        }

        best.map(|back_to_anchor| {
            let mut entities = Vec::with_capacity(back_to_anchor.len());
            entities.push(anchor_ref.clone());
            // Drop the trailing anchor; `Cycle` closes the loop implicitly
            entities.extend(
                back_to_anchor
                    .into_iter()
                    .take_while(|entity| entity != anchor_ref),
            );
            Cycle { entities }
        })
    }
}
