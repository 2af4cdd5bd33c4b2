use std::collections::{HashMap, HashSet};

use crate::types::PipelineSnapshot;

/// A step placed in display order with its indentation depth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaidOutStep {
    pub name: String,
    pub depth: usize,
}

/// Index over a pipeline's step dependency graph.
///
/// Edges pointing at names that are not part of the snapshot are dropped.
#[derive(Debug, Clone, Default)]
pub struct StepGraph {
    names: Vec<String>,
    index: HashMap<String, usize>,
    upstream: Vec<Vec<usize>>,
    downstream: Vec<Vec<usize>>,
}

impl StepGraph {
    pub fn from_snapshot(snapshot: &PipelineSnapshot) -> Self {
        let mut graph = StepGraph::default();
        for step in &snapshot.steps {
            if graph.index.contains_key(&step.name) {
                continue;
            }
            graph.index.insert(step.name.clone(), graph.names.len());
            graph.names.push(step.name.clone());
        }
        graph.upstream = vec![Vec::new(); graph.names.len()];
        graph.downstream = vec![Vec::new(); graph.names.len()];

        let mut edges = Vec::new();
        for step in &snapshot.steps {
            let Some(&me) = graph.index.get(&step.name) else {
                continue;
            };
            edges.extend(
                step.depends_on
                    .iter()
                    .filter_map(|dep| graph.index.get(dep))
                    .map(|&from| (from, me)),
            );
            edges.extend(
                step.depended_by
                    .iter()
                    .filter_map(|dep| graph.index.get(dep))
                    .map(|&to| (me, to)),
            );
        }
        for (from, to) in edges {
            if from != to && !graph.downstream[from].contains(&to) {
                graph.downstream[from].push(to);
                graph.upstream[to].push(from);
            }
        }
        graph
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub(crate) fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub(crate) fn name_at(&self, idx: usize) -> &str {
        &self.names[idx]
    }

    pub(crate) fn upstream_of(&self, idx: usize) -> &[usize] {
        &self.upstream[idx]
    }

    pub(crate) fn downstream_of(&self, idx: usize) -> &[usize] {
        &self.downstream[idx]
    }

    /// Topological display order of the `selected` steps.
    ///
    /// Ties are broken by snapshot order. `depth` is the longest upstream
    /// path in the full graph, so a step keeps its indentation when its
    /// parents are filtered out.
    pub fn layout(&self, selected: &HashSet<String>) -> Vec<LaidOutStep> {
        let n = self.names.len();
        let mut in_degree: Vec<usize> = self.upstream.iter().map(Vec::len).collect();
        let mut depth = vec![0usize; n];
        let mut placed = vec![false; n];
        let mut order = Vec::with_capacity(n);

        // Kahn's algorithm, always taking the lowest snapshot index that is ready.
        loop {
            let Some(next) = (0..n).find(|&i| !placed[i] && in_degree[i] == 0) else {
                break;
            };
            placed[next] = true;
            order.push(next);
            for &child in &self.downstream[next] {
                in_degree[child] -= 1;
                depth[child] = depth[child].max(depth[next] + 1);
            }
        }

        if order.len() < n {
            let stuck: Vec<&str> = (0..n)
                .filter(|&i| !placed[i])
                .map(|i| self.names[i].as_str())
                .collect();
            tracing::warn!(steps = ?stuck, "step graph has a cycle; appending unordered");
            for i in 0..n {
                if !placed[i] {
                    depth[i] = 0;
                    order.push(i);
                }
            }
        }

        order
            .into_iter()
            .filter(|&i| selected.contains(&self.names[i]))
            .map(|i| LaidOutStep {
                name: self.names[i].clone(),
                depth: depth[i],
            })
            .collect()
    }

    /// Layout of every step in the graph.
    pub fn layout_all(&self) -> Vec<LaidOutStep> {
        let all: HashSet<String> = self.names.iter().cloned().collect();
        self.layout(&all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StepHandle;

    fn step(name: &str, deps: &[&str]) -> StepHandle {
        StepHandle {
            name: name.to_owned(),
            depends_on: deps.iter().map(|d| (*d).to_owned()).collect(),
            depended_by: vec![],
        }
    }

    fn names(layout: &[LaidOutStep]) -> Vec<(&str, usize)> {
        layout.iter().map(|s| (s.name.as_str(), s.depth)).collect()
    }

    #[test]
    fn diamond_is_ordered_and_indented() {
        let snapshot = PipelineSnapshot {
            steps: vec![
                step("join", &["left", "right"]),
                step("right", &["source"]),
                step("left", &["source"]),
                step("source", &[]),
            ],
        };
        let graph = StepGraph::from_snapshot(&snapshot);
        assert_eq!(
            names(&graph.layout_all()),
            vec![("source", 0), ("right", 1), ("left", 1), ("join", 2)]
        );
    }

    #[test]
    fn filtered_layout_keeps_depth() {
        let snapshot = PipelineSnapshot {
            steps: vec![step("a", &[]), step("b", &["a"]), step("c", &["b"])],
        };
        let graph = StepGraph::from_snapshot(&snapshot);
        let selected: HashSet<String> = ["c".to_owned()].into_iter().collect();
        assert_eq!(names(&graph.layout(&selected)), vec![("c", 2)]);
    }

    #[test]
    fn cycle_is_appended_not_fatal() {
        let snapshot = PipelineSnapshot {
            steps: vec![step("x", &["y"]), step("y", &["x"]), step("z", &[])],
        };
        let graph = StepGraph::from_snapshot(&snapshot);
        assert_eq!(
            names(&graph.layout_all()),
            vec![("z", 0), ("x", 0), ("y", 0)]
        );
    }

    #[test]
    fn unknown_dependencies_are_ignored() {
        let snapshot = PipelineSnapshot {
            steps: vec![step("a", &["ghost"])],
        };
        let graph = StepGraph::from_snapshot(&snapshot);
        assert_eq!(names(&graph.layout_all()), vec![("a", 0)]);
    }
}
