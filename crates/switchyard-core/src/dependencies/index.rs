//! Transitive closure and inverse index over feature dependencies.

use std::collections::{BTreeMap, BTreeSet};

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::debug;

use crate::errors::ConfigError;
use crate::types::collections::{FxHashMap, FxHashSet};

/// Immutable dependency index.
///
/// `forward[f]` holds every feature `f` transitively requires, direct
/// dependencies first, without duplicates. `inverse[f]` holds every feature
/// that transitively requires `f`, sorted. Both maps derive from the same
/// direct definitions, so `b ∈ forward[a]` iff `a ∈ inverse[b]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyIndex {
    forward: FxHashMap<String, Vec<String>>,
    inverse: FxHashMap<String, Vec<String>>,
}

impl DependencyIndex {
    /// An index with no dependencies configured.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from direct definitions. Fails with `DependencyCycle` if any
    /// feature (transitively) requires itself.
    pub fn from_direct(direct: BTreeMap<String, Vec<String>>) -> Result<Self, ConfigError> {
        let graph = DependencyGraph::build(&direct);
        if let Some(path) = graph.find_cycle() {
            return Err(ConfigError::DependencyCycle { path });
        }

        let mut memo: FxHashMap<&str, Vec<String>> = FxHashMap::default();
        let mut forward = FxHashMap::default();
        for feature in direct.keys() {
            let closure = closure_of(feature, &direct, &mut memo);
            forward.insert(feature.clone(), closure);
        }

        let mut inverse_sets: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        for (feature, closure) in &forward {
            for required in closure {
                inverse_sets
                    .entry(required.as_str())
                    .or_default()
                    .insert(feature.as_str());
            }
        }
        let inverse = inverse_sets
            .into_iter()
            .map(|(required, dependents)| {
                (
                    required.to_string(),
                    dependents.into_iter().map(str::to_string).collect(),
                )
            })
            .collect();

        debug!(features = forward.len(), "built feature dependency index");
        Ok(Self { forward, inverse })
    }

    /// Every feature `identifier` transitively requires. Empty when none are
    /// configured.
    pub fn dependencies_for(&self, identifier: &str) -> &[String] {
        self.forward.get(identifier).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every feature that transitively requires `identifier`. Empty when
    /// nothing depends on it.
    pub fn dependents_of(&self, identifier: &str) -> &[String] {
        self.inverse.get(identifier).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_dependencies(&self, identifier: &str) -> bool {
        !self.dependencies_for(identifier).is_empty()
    }

    /// Number of features with a dependency definition.
    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// Configured features, sorted.
    pub fn features(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.forward.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}

/// Ordered, de-duplicated closure: direct dependencies, then each
/// dependency's own closure. Callers guarantee the input is acyclic.
fn closure_of<'a>(
    feature: &'a str,
    direct: &'a BTreeMap<String, Vec<String>>,
    memo: &mut FxHashMap<&'a str, Vec<String>>,
) -> Vec<String> {
    if let Some(done) = memo.get(feature) {
        return done.clone();
    }
    let Some(deps) = direct.get(feature) else {
        return Vec::new();
    };

    let mut seen: FxHashSet<String> = FxHashSet::default();
    let mut closure = Vec::new();
    for dep in deps {
        if seen.insert(dep.clone()) {
            closure.push(dep.clone());
        }
    }
    for dep in deps {
        for inherited in closure_of(dep, direct, memo) {
            if seen.insert(inherited.clone()) {
                closure.push(inherited);
            }
        }
    }

    memo.insert(feature, closure.clone());
    closure
}

/// Directed graph with an edge from each feature to each direct dependency.
struct DependencyGraph<'a> {
    graph: DiGraph<&'a str, ()>,
}

impl<'a> DependencyGraph<'a> {
    fn build(direct: &'a BTreeMap<String, Vec<String>>) -> Self {
        let mut graph = DiGraph::new();
        let mut nodes: FxHashMap<&'a str, NodeIndex> = FxHashMap::default();
        let mut node = |graph: &mut DiGraph<&'a str, ()>, name: &'a str| {
            *nodes.entry(name).or_insert_with(|| graph.add_node(name))
        };

        for (feature, deps) in direct {
            let from = node(&mut graph, feature.as_str());
            for dep in deps {
                let to = node(&mut graph, dep.as_str());
                graph.update_edge(from, to, ());
            }
        }
        Self { graph }
    }

    /// A closed path (`a -> b -> a`) through the first strongly connected
    /// component that contains a cycle, if any.
    fn find_cycle(&self) -> Option<Vec<String>> {
        let mut components = tarjan_scc(&self.graph);
        // Deterministic error: report the component with the smallest name.
        components.iter_mut().for_each(|c| c.sort_by_key(|&n| self.graph[n]));
        components.sort_by_key(|c| c.first().map(|&n| self.graph[n]));

        components.into_iter().find_map(|component| {
            let start = *component.first()?;
            if component.len() == 1 {
                if self.graph.contains_edge(start, start) {
                    let name = self.graph[start].to_string();
                    return Some(vec![name.clone(), name]);
                }
                return None;
            }
            let members: FxHashSet<NodeIndex> = component.iter().copied().collect();
            self.path_back_to(start, &members)
        })
    }

    /// Depth-first search within one component for a path that returns to
    /// `start`.
    fn path_back_to(&self, start: NodeIndex, members: &FxHashSet<NodeIndex>) -> Option<Vec<String>> {
        let mut stack = vec![(start, self.sorted_successors(start, members))];
        let mut visited = FxHashSet::default();
        visited.insert(start);

        while let Some((_, next)) = stack.last_mut() {
            let Some(succ) = next.pop() else {
                stack.pop();
                continue;
            };
            if succ == start {
                let mut path: Vec<String> =
                    stack.iter().map(|(n, _)| self.graph[*n].to_string()).collect();
                path.push(self.graph[start].to_string());
                return Some(path);
            }
            if visited.insert(succ) {
                let successors = self.sorted_successors(succ, members);
                stack.push((succ, successors));
            }
        }
        None
    }

    /// Successors inside the component, reversed so `pop` yields them in
    /// name order.
    fn sorted_successors(&self, node: NodeIndex, members: &FxHashSet<NodeIndex>) -> Vec<NodeIndex> {
        let mut succ: Vec<NodeIndex> = self
            .graph
            .neighbors(node)
            .filter(|n| members.contains(n))
            .collect();
        succ.sort_by_key(|&n| std::cmp::Reverse(self.graph[n]));
        succ
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn direct(pairs: &[(&str, &[&str])]) -> BTreeMap<String, Vec<String>> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.iter().map(|s| s.to_string()).collect()))
            .collect()
    }

    #[test]
    fn closure_and_inverse_for_chain() {
        let index = DependencyIndex::from_direct(direct(&[("a", &["b"]), ("b", &["c"])])).unwrap();
        assert_eq!(index.dependencies_for("a"), ["b", "c"]);
        assert_eq!(index.dependencies_for("b"), ["c"]);
        assert!(index.dependencies_for("c").is_empty());
        assert_eq!(index.dependents_of("c"), ["a", "b"]);
        assert_eq!(index.dependents_of("b"), ["a"]);
        assert!(index.dependents_of("a").is_empty());
    }

    #[test]
    fn closure_orders_direct_first_and_deduplicates() {
        let index = DependencyIndex::from_direct(direct(&[
            ("a", &["b", "c", "b"]),
            ("b", &["d", "c"]),
            ("c", &["d"]),
        ]))
        .unwrap();
        assert_eq!(index.dependencies_for("a"), ["b", "c", "d"]);
    }

    #[test]
    fn unknown_features_resolve_to_empty() {
        let index = DependencyIndex::empty();
        assert!(index.dependencies_for("anything").is_empty());
        assert!(index.dependents_of("anything").is_empty());
        assert!(!index.has_dependencies("anything"));
        assert!(index.is_empty());
    }

    #[test]
    fn empty_definition_has_no_dependencies() {
        let index = DependencyIndex::from_direct(direct(&[("a", &[])])).unwrap();
        assert_eq!(index.len(), 1);
        assert!(!index.has_dependencies("a"));
    }

    #[test]
    fn self_dependency_is_a_cycle() {
        let err = DependencyIndex::from_direct(direct(&[("a", &["a"])])).unwrap_err();
        match err {
            ConfigError::DependencyCycle { path } => assert_eq!(path, ["a", "a"]),
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn long_cycle_reports_closed_path() {
        let err = DependencyIndex::from_direct(direct(&[
            ("a", &["b"]),
            ("b", &["c"]),
            ("c", &["a"]),
            ("x", &["a"]),
        ]))
        .unwrap_err();
        match err {
            ConfigError::DependencyCycle { path } => assert_eq!(path, ["a", "b", "c", "a"]),
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn diamond_is_not_a_cycle() {
        let index = DependencyIndex::from_direct(direct(&[
            ("top", &["left", "right"]),
            ("left", &["base"]),
            ("right", &["base"]),
        ]))
        .unwrap();
        assert_eq!(index.dependencies_for("top"), ["left", "right", "base"]);
        assert_eq!(index.dependents_of("base"), ["left", "right", "top"]);
    }
}
