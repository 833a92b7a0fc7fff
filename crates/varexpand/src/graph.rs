//! Dependency graph of named nodes
//!
//! [Graph::resolve] orders nodes so that every node comes after all of its dependencies.
//! It eliminates all dependency-free nodes at once per round (Kahn). Nodes that become
//! ready in the same round are appended in lexical order, which makes the order reproducible.
use std::collections::{BTreeMap, BTreeSet};

/// A named node and the names it depends on
#[derive(derive_new::new, Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub name: String,
    pub deps: Vec<String>,
}

impl Node {
    pub fn leaf(name: impl Into<String>) -> Self {
        Self::new(name.into(), Vec::new())
    }
}

#[derive(Debug, Default, Clone)]
pub struct Graph {
    nodes: Vec<Node>,
}

impl Graph {
    /// Insert a new node
    ///
    /// Returns new index when added or existing index when the name is taken
    pub fn insert(&mut self, node: Node) -> Result<usize, usize> {
        if let Some(existing) = self.position(&node.name) {
            tracing::debug!(name = %node.name, "collision");
            return Err(existing);
        }

        self.nodes.push(node);
        Ok(self.nodes.len() - 1)
    }

    pub fn get(&self, name: &str) -> Option<&Node> {
        self.position(name).map(|index| &self.nodes[index])
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.nodes.iter().position(|node| node.name == name)
    }

    /// Nodes in dependency order
    #[tracing::instrument(level = "trace", skip_all, fields(nodes = self.nodes.len()))]
    pub fn resolve(&self) -> Result<Vec<&Node>, ResolveError> {
        let by_name: BTreeMap<&str, &Node> = self
            .nodes
            .iter()
            .map(|node| (node.name.as_str(), node))
            .collect();

        // remaining dependencies per unresolved node
        let mut remaining: BTreeMap<&str, BTreeSet<&str>> = by_name
            .iter()
            .map(|(name, node)| (*name, node.deps.iter().map(String::as_str).collect()))
            .collect();

        let mut resolved = Vec::with_capacity(by_name.len());
        while !remaining.is_empty() {
            let ready: BTreeSet<&str> = remaining
                .iter()
                .filter(|(_, deps)| deps.is_empty())
                .map(|(name, _)| *name)
                .collect();

            if ready.is_empty() {
                return Err(ResolveError::stalled(&remaining, &by_name));
            }

            tracing::trace!(?ready, "ready");
            for name in &ready {
                remaining.remove(name);
                resolved.push(by_name[name]);
            }

            for deps in remaining.values_mut() {
                deps.retain(|dep| !ready.contains(dep));
            }
        }

        Ok(resolved)
    }
}

impl FromIterator<Node> for Graph {
    fn from_iter<T: IntoIterator<Item = Node>>(iter: T) -> Self {
        let mut graph = Graph::default();
        for node in iter {
            let _ = graph.insert(node);
        }
        graph
    }
}

impl std::fmt::Display for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for node in &self.nodes {
            for (index, dep) in node.deps.iter().enumerate() {
                writeln!(f, "[{index}] {} -> {dep}", node.name)?;
            }
        }
        Ok(())
    }
}

/// Serializes as a map of node name to its dependencies
impl serde::Serialize for Graph {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;

        let mut ser = serializer.serialize_map(Some(self.nodes.len()))?;
        for node in &self.nodes {
            ser.serialize_entry(&node.name, &node.deps)?;
        }
        ser.end()
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("circular dependency found between {}", join(.unresolved))]
    Cycle { unresolved: BTreeSet<String> },
    #[error("unknown dependency {} (unresolved: {})", join(.missing), join(.unresolved))]
    UnknownDependency {
        missing: BTreeSet<String>,
        unresolved: BTreeSet<String>,
    },
}

impl ResolveError {
    fn stalled(remaining: &BTreeMap<&str, BTreeSet<&str>>, nodes: &BTreeMap<&str, &Node>) -> Self {
        let unresolved: BTreeSet<String> = remaining.keys().map(|name| name.to_string()).collect();
        let missing: BTreeSet<String> = remaining
            .values()
            .flatten()
            .filter(|dep| !nodes.contains_key(*dep))
            .map(|dep| dep.to_string())
            .collect();

        tracing::debug!(?unresolved, ?missing, "resolution stalled");
        if missing.is_empty() {
            ResolveError::Cycle { unresolved }
        } else {
            ResolveError::UnknownDependency {
                missing,
                unresolved,
            }
        }
    }

    /// Every node that could not be ordered
    pub fn unresolved(&self) -> &BTreeSet<String> {
        match self {
            ResolveError::Cycle { unresolved } => unresolved,
            ResolveError::UnknownDependency { unresolved, .. } => unresolved,
        }
    }
}

fn join(names: &BTreeSet<String>) -> String {
    names
        .iter()
        .map(|name| format!("'{name}'"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn node(name: &str, deps: &[&str]) -> Node {
        Node::new(name.into(), deps.iter().map(|dep| dep.to_string()).collect())
    }

    fn names<'a>(nodes: &[&'a Node]) -> Vec<&'a str> {
        nodes.iter().map(|node| node.name.as_str()).collect()
    }

    fn set(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn resolve_in_rounds() {
        let graph: Graph = [
            node("a", &["b", "c"]),
            node("b", &["b_a", "b_b"]),
            node("b_a", &[]),
            node("b_b", &["c"]),
            node("c", &["c_a"]),
            node("c_a", &["c_b"]),
            node("c_b", &[]),
        ]
        .into_iter()
        .collect();

        let resolved = graph.resolve().expect("graph is acyclic");
        assert_eq!(
            names(&resolved),
            vec!["b_a", "c_b", "c_a", "c", "b_b", "b", "a"]
        );
    }

    #[test]
    fn ready_nodes_are_sorted() {
        let graph: Graph = [node("z", &[]), node("m", &["z"]), node("a", &[])]
            .into_iter()
            .collect();

        assert_eq!(names(&graph.resolve().unwrap()), vec!["a", "z", "m"]);
    }

    #[test]
    fn empty_graph() {
        assert!(Graph::default().resolve().unwrap().is_empty());
    }

    #[test]
    fn cycle() {
        let graph: Graph = [node("a", &["b"]), node("b", &["a"]), node("c", &[])]
            .into_iter()
            .collect();

        let err = graph.resolve().expect_err("must detect cycle");
        assert_eq!(
            err,
            ResolveError::Cycle {
                unresolved: set(&["a", "b"])
            }
        );
        assert_eq!(
            err.to_string(),
            "circular dependency found between 'a', 'b'"
        );
    }

    #[test]
    fn self_dependency() {
        let graph: Graph = [node("a", &["a"])].into_iter().collect();
        assert_eq!(graph.resolve().unwrap_err().unresolved(), &set(&["a"]));
    }

    #[test]
    fn unknown_dependency() {
        let graph: Graph = [node("a", &["nope"]), node("b", &["a"]), node("c", &[])]
            .into_iter()
            .collect();

        assert_eq!(
            graph.resolve().unwrap_err(),
            ResolveError::UnknownDependency {
                missing: set(&["nope"]),
                unresolved: set(&["a", "b"]),
            }
        );
    }

    #[test]
    fn insert_collision() {
        let mut graph = Graph::default();
        assert_eq!(graph.insert(Node::leaf("a")), Ok(0));
        assert_eq!(graph.insert(Node::leaf("b")), Ok(1));
        assert_eq!(graph.insert(node("a", &["b"])), Err(0));
        assert_eq!(graph.get("a"), Some(&Node::leaf("a")));
        assert_eq!(graph.len(), 2);
    }

    #[test]
    fn display() {
        let graph: Graph = [node("a", &["b", "c"]), node("b", &[])].into_iter().collect();
        assert_eq!(graph.to_string(), "[0] a -> b\n[1] a -> c\n");
    }
}
