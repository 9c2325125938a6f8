//! Dependency graph and cycle resolver.
//!
//! ## Guarantees
//!
//! - **Determinism**: nodes and neighbours are visited in lexicographic
//!   order, so SCC discovery and the topological order are identical across
//!   runs.
//! - **Leaves first**: in [`DependencyGraph::topological_groups`] every
//!   group's external dependencies sit in earlier groups.
//! - **Cycles collapse**: mutually reachable keys always share one group.

use crate::aggregate::AggregateIndex;
use serde::Serialize;
use std::collections::btree_set;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// Directed graph over type-class keys, without self-loops.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    edges: BTreeMap<String, BTreeSet<String>>,
    self_referencing: BTreeSet<String>,
}

/// One strongly connected component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SccGroup {
    /// Discovery index assigned by Tarjan's algorithm
    pub index: usize,
    /// Members, sorted
    pub members: Vec<String>,
    /// More than one member, or a self-referencing singleton
    pub is_cycle: bool,
}

impl SccGroup {
    pub fn contains(&self, key: &str) -> bool {
        self.members.binary_search_by(|m| m.as_str().cmp(key)).is_ok()
    }
}

impl DependencyGraph {
    /// Edges A→d for every dependency d of A that names a known aggregate.
    pub fn from_index(index: &AggregateIndex) -> Self {
        let mut graph = DependencyGraph::default();
        for aggregate in index.iter() {
            graph.edges.entry(aggregate.key.clone()).or_default();
            if aggregate.self_reference {
                graph.self_referencing.insert(aggregate.key.clone());
            }
        }
        for aggregate in index.iter() {
            for dep in &aggregate.depends_on {
                graph.add_edge(&aggregate.key, dep);
            }
        }
        graph
    }

    /// Build from explicit edges; every endpoint becomes a node.
    ///
    /// An edge from a key to itself marks the key self-referencing.
    pub fn from_edges<'a>(edges: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut graph = DependencyGraph::default();
        let edges: Vec<_> = edges.into_iter().collect();
        for (from, to) in &edges {
            graph.add_node(from);
            graph.add_node(to);
        }
        for (from, to) in edges {
            graph.add_edge(from, to);
        }
        graph
    }

    pub fn add_node(&mut self, key: &str) {
        self.edges.entry(key.to_string()).or_default();
    }

    /// Add `from`→`to`. Unknown targets are ignored; a self-loop only marks
    /// `from` as self-referencing.
    pub fn add_edge(&mut self, from: &str, to: &str) {
        if from == to {
            self.self_referencing.insert(from.to_string());
            return;
        }
        if !self.edges.contains_key(to) {
            return;
        }
        if let Some(deps) = self.edges.get_mut(from) {
            deps.insert(to.to_string());
        }
    }

    pub fn node_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(BTreeSet::len).sum()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.edges.contains_key(key)
    }

    pub fn dependencies(&self, key: &str) -> impl Iterator<Item = &str> {
        self.edges
            .get(key)
            .into_iter()
            .flat_map(|deps| deps.iter().map(String::as_str))
    }

    pub fn is_self_referencing(&self, key: &str) -> bool {
        self.self_referencing.contains(key)
    }

    /// Strongly connected components in Tarjan discovery order.
    ///
    /// Discovery order is already leaves first: a component is emitted only
    /// after every component it can reach.
    pub fn strongly_connected_components(&self) -> Vec<SccGroup> {
        let mut visitor = TarjanVisitor::new(self);
        for node in self.edges.keys() {
            if !visitor.index.contains_key(node.as_str()) {
                visitor.visit(node);
            }
        }
        visitor
            .components
            .into_iter()
            .enumerate()
            .map(|(index, mut members)| {
                members.sort_unstable();
                let is_cycle = members.len() > 1
                    || members.first().is_some_and(|m| self.is_self_referencing(m));
                SccGroup {
                    index,
                    members: members.into_iter().map(str::to_string).collect(),
                    is_cycle,
                }
            })
            .collect()
    }

    /// SCC groups in topological order, leaves first.
    ///
    /// Builds the condensed DAG over component indices and runs a post-order
    /// DFS, taking components and their dependencies in ascending index
    /// order.
    pub fn topological_groups(&self) -> Vec<SccGroup> {
        let groups = self.strongly_connected_components();

        let mut owner: HashMap<&str, usize> = HashMap::new();
        for group in &groups {
            for member in &group.members {
                owner.insert(member.as_str(), group.index);
            }
        }

        let mut condensed: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); groups.len()];
        for group in &groups {
            for member in &group.members {
                for dep in self.dependencies(member) {
                    if let Some(&target) = owner.get(dep) {
                        if target != group.index {
                            condensed[group.index].insert(target);
                        }
                    }
                }
            }
        }

        let mut visited = vec![false; groups.len()];
        let mut order = Vec::with_capacity(groups.len());
        for root in 0..groups.len() {
            if visited[root] {
                continue;
            }
            visited[root] = true;
            let mut stack: Vec<(usize, btree_set::Iter<'_, usize>)> =
                vec![(root, condensed[root].iter())];
            while let Some((node, deps)) = stack.last_mut() {
                let node = *node;
                match deps.next() {
                    Some(&dep) if !visited[dep] => {
                        visited[dep] = true;
                        stack.push((dep, condensed[dep].iter()));
                    }
                    Some(_) => {}
                    None => {
                        stack.pop();
                        order.push(node);
                    }
                }
            }
        }

        let mut slots: Vec<Option<SccGroup>> = groups.into_iter().map(Some).collect();
        order
            .into_iter()
            .filter_map(|idx| slots.get_mut(idx).and_then(Option::take))
            .collect()
    }

    /// Groups that are true cycles, in topological order.
    pub fn cycles(&self) -> Vec<SccGroup> {
        self.topological_groups()
            .into_iter()
            .filter(|g| g.is_cycle)
            .collect()
    }
}

/// Caller-owned Tarjan state, threaded through an iterative traversal.
struct TarjanVisitor<'g> {
    graph: &'g DependencyGraph,
    next_index: usize,
    index: HashMap<&'g str, usize>,
    lowlink: HashMap<&'g str, usize>,
    stack: Vec<&'g str>,
    on_stack: HashSet<&'g str>,
    components: Vec<Vec<&'g str>>,
}

impl<'g> TarjanVisitor<'g> {
    fn new(graph: &'g DependencyGraph) -> Self {
        Self {
            graph,
            next_index: 0,
            index: HashMap::new(),
            lowlink: HashMap::new(),
            stack: Vec::new(),
            on_stack: HashSet::new(),
            components: Vec::new(),
        }
    }

    fn neighbours(&self, node: &str) -> btree_set::Iter<'g, String> {
        let graph: &'g DependencyGraph = self.graph;
        match graph.edges.get(node) {
            Some(deps) => deps.iter(),
            None => EMPTY.iter(),
        }
    }

    fn enter(&mut self, node: &'g str) {
        self.index.insert(node, self.next_index);
        self.lowlink.insert(node, self.next_index);
        self.next_index += 1;
        self.stack.push(node);
        self.on_stack.insert(node);
    }

    fn lower(&mut self, node: &str, candidate: usize) {
        if let Some(low) = self.lowlink.get_mut(node) {
            if candidate < *low {
                *low = candidate;
            }
        }
    }

    fn visit(&mut self, root: &'g str) {
        self.enter(root);
        let mut frames: Vec<(&'g str, btree_set::Iter<'g, String>)> =
            vec![(root, self.neighbours(root))];

        while let Some((node, neighbours)) = frames.last_mut() {
            let node = *node;
            match neighbours.next() {
                Some(next) => {
                    let next = next.as_str();
                    match self.index.get(next).copied() {
                        None => {
                            self.enter(next);
                            frames.push((next, self.neighbours(next)));
                        }
                        Some(next_index) if self.on_stack.contains(next) => {
                            self.lower(node, next_index);
                        }
                        Some(_) => {}
                    }
                }
                None => {
                    frames.pop();
                    let low = self.lowlink.get(node).copied().unwrap_or(0);
                    if let Some((parent, _)) = frames.last() {
                        self.lower(parent, low);
                    }
                    if Some(low) == self.index.get(node).copied() {
                        self.pop_component(node);
                    }
                }
            }
        }
    }

    fn pop_component(&mut self, root: &'g str) {
        let mut component = Vec::new();
        while let Some(member) = self.stack.pop() {
            self.on_stack.remove(member);
            component.push(member);
            if member == root {
                break;
            }
        }
        self.components.push(component);
    }
}

static EMPTY: BTreeSet<String> = BTreeSet::new();

#[cfg(test)]
mod tests {
    use super::*;

    fn members(groups: &[SccGroup]) -> Vec<Vec<&str>> {
        groups
            .iter()
            .map(|g| g.members.iter().map(String::as_str).collect())
            .collect()
    }

    #[test]
    fn test_chain_orders_leaves_first() {
        let graph = DependencyGraph::from_edges([("Party", "Address"), ("Address", "Country")]);
        let order = graph.topological_groups();
        assert_eq!(
            members(&order),
            vec![vec!["Country"], vec!["Address"], vec!["Party"]]
        );
        assert!(order.iter().all(|g| !g.is_cycle));
    }

    #[test]
    fn test_two_cycle_is_one_group() {
        let graph = DependencyGraph::from_edges([
            ("OrderLine", "OrderLine.SubLine"),
            ("OrderLine.SubLine", "OrderLine"),
        ]);
        let groups = graph.topological_groups();
        assert_eq!(groups.len(), 1);
        assert!(groups[0].is_cycle);
        assert_eq!(members(&groups), vec![vec!["OrderLine", "OrderLine.SubLine"]]);
    }

    #[test]
    fn test_self_reference_marks_singleton_cyclic() {
        let graph = DependencyGraph::from_edges([("Node", "Node"), ("Tree", "Node")]);
        let groups = graph.topological_groups();
        assert_eq!(members(&groups), vec![vec!["Node"], vec!["Tree"]]);
        assert!(groups[0].is_cycle);
        assert!(!groups[1].is_cycle);
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_unknown_target_is_dropped() {
        let mut graph = DependencyGraph::default();
        graph.add_node("A");
        graph.add_edge("A", "Missing");
        assert_eq!(graph.edge_count(), 0);
        assert!(!graph.contains("Missing"));
    }

    #[test]
    fn test_cycle_with_external_dependency() {
        // C depends on the A<->B cycle, which depends on D.
        let graph = DependencyGraph::from_edges([
            ("A", "B"),
            ("B", "A"),
            ("B", "D"),
            ("C", "A"),
        ]);
        let order = graph.topological_groups();
        assert_eq!(members(&order), vec![vec!["D"], vec!["A", "B"], vec!["C"]]);
        assert_eq!(graph.cycles().len(), 1);
    }
}
