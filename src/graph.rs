use std::collections::HashSet;
use std::collections::VecDeque;

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

/// Directed graph of plan-declared references between resource ids.
///
/// Built once by the plan loader and read-only for the whole pipeline.
/// Adjacency lists keep insertion order so that traversal order, and with it
/// the closest-candidate tie-break, is deterministic across runs.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct DependencyGraph {
    nodes: IndexSet<String>,
    adjacency: IndexMap<String, Vec<String>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, id: &str) {
        self.nodes.insert(id.to_string());
    }

    pub fn add_edge(&mut self, source: &str, target: &str) {
        self.add_node(source);
        self.add_node(target);
        let successors = self.adjacency.entry(source.to_string()).or_default();
        if !successors.iter().any(|s| s == target) {
            successors.push(target.to_string());
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains(id)
    }

    pub fn successors(&self, id: &str) -> &[String] {
        self.adjacency.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_edge(&self, source: &str, target: &str) -> bool {
        self.successors(source).iter().any(|s| s == target)
    }

    /// All edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.adjacency.iter().flat_map(|(source, targets)| {
            targets.iter().map(move |t| (source.as_str(), t.as_str()))
        })
    }

    /// Ids adjacent to `id` in either direction.
    pub fn neighbors(&self, id: &str) -> Vec<&str> {
        let mut result: Vec<&str> = self.successors(id).iter().map(String::as_str).collect();
        for (source, targets) in &self.adjacency {
            if targets.iter().any(|t| t == id) && !result.contains(&source.as_str()) {
                result.push(source);
            }
        }
        result
    }

    /// Edge-reversed copy. The original stays untouched so the parent and
    /// child passes never alias a mutated graph.
    pub fn reversed(&self) -> DependencyGraph {
        let mut reversed = DependencyGraph {
            nodes: self.nodes.clone(),
            adjacency: IndexMap::new(),
        };
        for (source, target) in self.edges() {
            reversed.add_edge(target, source);
        }
        reversed
    }

    /// Breadth-first search from `start` for the nearest id in `candidates`.
    ///
    /// Among candidates at equal minimal hop distance the first one discovered
    /// wins. That order follows adjacency insertion order and is a fixed,
    /// deterministic policy rather than a meaningful preference.
    pub fn closest(&self, start: &str, candidates: &IndexSet<String>) -> Option<String> {
        if !self.contains(start) {
            return None;
        }
        let mut visited: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::new();
        visited.insert(start);
        queue.push_back(start);

        while let Some(current) = queue.pop_front() {
            if current != start && candidates.contains(current) {
                return Some(current.to_string());
            }
            for next in self.successors(current) {
                if visited.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        None
    }
}
