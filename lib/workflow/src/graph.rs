//! Workflow graph structure using petgraph.
//!
//! The graph records which nodes exist, the static edges the engine follows
//! unconditionally, and (for documentation only) the dynamic routes a node
//! may choose at run time. Execution never walks the petgraph directly; it
//! asks for a node's static target and otherwise trusts the step's routing
//! decision. The petgraph is what gets rendered.

use crate::error::GraphError;
use crate::node::{END, NodeCategory, NodeName, Route, START};
use petgraph::Direction;
use petgraph::dot::{Config, Dot};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::HashMap;
use std::fmt::{self, Write as _};

/// A vertex of the rendered graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Vertex<N> {
    /// Synthetic entry point.
    Start,
    /// A registered node.
    Node(N),
    /// Terminal sentinel.
    End,
}

impl<N: NodeName> Vertex<N> {
    fn name(&self) -> &'static str {
        match self {
            Self::Start => START,
            Self::Node(node) => node.as_str(),
            Self::End => END,
        }
    }
}

impl<N: NodeName> fmt::Display for Vertex<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl<N> From<Route<N>> for Vertex<N> {
    fn from(route: Route<N>) -> Self {
        match route {
            Route::Node(node) => Self::Node(node),
            Route::End => Self::End,
        }
    }
}

/// How a transition is taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    /// From the entry point to the start node.
    Entry,
    /// Followed unconditionally.
    Static,
    /// Chosen by the step at run time.
    Dynamic,
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Entry => f.write_str("entry"),
            Self::Static => f.write_str("static"),
            Self::Dynamic => f.write_str("dynamic"),
        }
    }
}

/// The structure of a workflow graph.
#[derive(Debug, Clone)]
pub struct WorkflowGraph<N: NodeName> {
    graph: DiGraph<Vertex<N>, EdgeKind>,
    /// Map from vertex to petgraph's NodeIndex for O(1) lookup.
    node_index_map: HashMap<Vertex<N>, NodeIndex>,
    static_edges: HashMap<N, Route<N>>,
}

impl<N: NodeName> WorkflowGraph<N> {
    /// Creates a graph containing only the start and end vertices.
    #[must_use]
    pub fn new() -> Self {
        let mut graph = DiGraph::new();
        let mut node_index_map = HashMap::new();
        node_index_map.insert(Vertex::Start, graph.add_node(Vertex::Start));
        node_index_map.insert(Vertex::End, graph.add_node(Vertex::End));
        Self {
            graph,
            node_index_map,
            static_edges: HashMap::new(),
        }
    }

    /// Adds a node. Adding an existing node is a no-op.
    pub fn add_node(&mut self, node: N) {
        let vertex = Vertex::Node(node);
        if !self.node_index_map.contains_key(&vertex) {
            let index = self.graph.add_node(vertex);
            self.node_index_map.insert(vertex, index);
        }
    }

    /// Returns true if the node was added.
    #[must_use]
    pub fn contains(&self, node: N) -> bool {
        self.node_index_map.contains_key(&Vertex::Node(node))
    }

    /// Marks the node execution starts from.
    ///
    /// # Errors
    ///
    /// Returns an error if the node has not been added.
    pub fn set_entry(&mut self, node: N) -> Result<(), GraphError> {
        let start = self.index_of(Vertex::Start)?;
        let target = self.index_of(Vertex::Node(node))?;
        self.graph.add_edge(start, target, EdgeKind::Entry);
        Ok(())
    }

    /// Adds an unconditional transition.
    ///
    /// # Errors
    ///
    /// Returns an error if either endpoint is missing or `from` already has a
    /// static edge to a different target.
    pub fn add_static_edge(&mut self, from: N, to: Route<N>) -> Result<(), GraphError> {
        if let Some(existing) = self.static_edges.get(&from) {
            if *existing == to {
                return Ok(());
            }
            return Err(GraphError::ConflictingStaticEdge {
                node: from.as_str(),
                existing: existing.to_string(),
                requested: to.to_string(),
            });
        }

        let source = self.index_of(Vertex::Node(from))?;
        let target = self.index_of(Vertex::from(to))?;
        self.graph.add_edge(source, target, EdgeKind::Static);
        self.static_edges.insert(from, to);
        Ok(())
    }

    /// Records a transition a node may choose at run time.
    ///
    /// # Errors
    ///
    /// Returns an error if either endpoint is missing.
    pub fn add_dynamic_route(&mut self, from: N, to: Route<N>) -> Result<(), GraphError> {
        let source = self.index_of(Vertex::Node(from))?;
        let target = self.index_of(Vertex::from(to))?;
        if !self.graph.contains_edge(source, target) {
            self.graph.add_edge(source, target, EdgeKind::Dynamic);
        }
        Ok(())
    }

    /// Returns the static target of a node, if it has one.
    #[must_use]
    pub fn static_target(&self, node: N) -> Option<Route<N>> {
        self.static_edges.get(&node).copied()
    }

    /// Returns all static edges.
    pub fn static_edges(&self) -> impl Iterator<Item = (N, Route<N>)> + '_ {
        self.static_edges.iter().map(|(from, to)| (*from, *to))
    }

    /// Returns the number of registered nodes (excluding start and end).
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count() - 2
    }

    /// Returns the number of edges, including the entry edge.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Returns the vertices reachable in one step from a node.
    pub fn successors(&self, node: N) -> Vec<(Vertex<N>, EdgeKind)> {
        let Some(&index) = self.node_index_map.get(&Vertex::Node(node)) else {
            return Vec::new();
        };

        let mut successors: Vec<_> = self
            .graph
            .edges_directed(index, Direction::Outgoing)
            .filter_map(|edge| {
                let target = self.graph.node_weight(edge.target())?;
                Some((*target, *edge.weight()))
            })
            .collect();
        successors.sort_by_key(|(vertex, _)| vertex.name());
        successors
    }

    /// Renders the graph as Graphviz DOT.
    #[must_use]
    pub fn to_dot(&self) -> String {
        format!(
            "{}",
            Dot::with_attr_getters(
                &self.graph,
                &[Config::EdgeNoLabel],
                &|_, edge| match edge.weight() {
                    EdgeKind::Dynamic => "style = dashed".to_string(),
                    EdgeKind::Entry | EdgeKind::Static => String::new(),
                },
                &|_, (_, vertex)| match vertex {
                    Vertex::Start | Vertex::End => "shape = oval".to_string(),
                    Vertex::Node(node) if node.category() == NodeCategory::Router => {
                        "shape = diamond".to_string()
                    }
                    Vertex::Node(_) => "shape = box".to_string(),
                },
            )
        )
    }

    /// Renders the graph as a Mermaid flowchart.
    ///
    /// Static edges are solid, dynamic routes dotted.
    #[must_use]
    pub fn to_mermaid(&self) -> String {
        let mut out = String::from("graph TD;\n");

        let mut vertices: Vec<_> = self.graph.node_weights().collect();
        vertices.sort_by_key(|vertex| match vertex {
            Vertex::Start => (0, ""),
            Vertex::Node(node) => (1, node.as_str()),
            Vertex::End => (2, ""),
        });
        for vertex in vertices {
            let _ = match vertex {
                Vertex::Start => writeln!(out, "\t{START}([<p>{START}</p>]):::first"),
                Vertex::End => writeln!(out, "\t{END}([<p>{END}</p>]):::last"),
                Vertex::Node(node) => writeln!(out, "\t{0}({0})", node.as_str()),
            };
        }

        let mut edges: Vec<_> = self
            .graph
            .edge_references()
            .filter_map(|edge| {
                let source = self.graph.node_weight(edge.source())?;
                let target = self.graph.node_weight(edge.target())?;
                Some((source.name(), target.name(), *edge.weight()))
            })
            .collect();
        edges.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));
        for (source, target, kind) in edges {
            let arrow = match kind {
                EdgeKind::Dynamic => "-.->",
                EdgeKind::Entry | EdgeKind::Static => "-->",
            };
            let _ = writeln!(out, "\t{source} {arrow} {target};");
        }

        out.push_str("\tclassDef default fill:#f2f0ff,line-height:1.2\n");
        out.push_str("\tclassDef first fill-opacity:0\n");
        out.push_str("\tclassDef last fill:#bfb6fc\n");
        out
    }

    fn index_of(&self, vertex: Vertex<N>) -> Result<NodeIndex, GraphError> {
        self.node_index_map
            .get(&vertex)
            .copied()
            .ok_or(GraphError::NodeNotFound {
                node: vertex.name(),
            })
    }
}

impl<N: NodeName> Default for WorkflowGraph<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
    enum Demo {
        Fetch,
        Hub,
        Store,
    }

    impl NodeName for Demo {
        fn all() -> &'static [Self] {
            &[Self::Fetch, Self::Hub, Self::Store]
        }

        fn as_str(&self) -> &'static str {
            match self {
                Self::Fetch => "fetch",
                Self::Hub => "hub",
                Self::Store => "store",
            }
        }

        fn category(&self) -> NodeCategory {
            match self {
                Self::Hub => NodeCategory::Router,
                Self::Fetch | Self::Store => NodeCategory::Compute,
            }
        }
    }

    impl fmt::Display for Demo {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.as_str())
        }
    }

    fn demo_graph() -> WorkflowGraph<Demo> {
        let mut graph = WorkflowGraph::new();
        for node in Demo::all() {
            graph.add_node(*node);
        }
        graph.set_entry(Demo::Hub).unwrap();
        graph
            .add_static_edge(Demo::Fetch, Route::Node(Demo::Hub))
            .unwrap();
        graph.add_static_edge(Demo::Store, Route::End).unwrap();
        graph
            .add_dynamic_route(Demo::Hub, Route::Node(Demo::Fetch))
            .unwrap();
        graph
            .add_dynamic_route(Demo::Hub, Route::Node(Demo::Store))
            .unwrap();
        graph
    }

    #[test]
    fn static_targets_are_recorded() {
        let graph = demo_graph();
        assert_eq!(graph.static_target(Demo::Fetch), Some(Route::Node(Demo::Hub)));
        assert_eq!(graph.static_target(Demo::Store), Some(Route::End));
        assert_eq!(graph.static_target(Demo::Hub), None);
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 5);
    }

    #[test]
    fn conflicting_static_edge_is_rejected() {
        let mut graph = demo_graph();
        let err = graph.add_static_edge(Demo::Fetch, Route::End).unwrap_err();
        match err {
            GraphError::ConflictingStaticEdge { node, .. } => assert_eq!(node, "fetch"),
            other => panic!("unexpected error: {other:?}"),
        }

        // Re-declaring the same edge is harmless.
        assert!(
            graph
                .add_static_edge(Demo::Fetch, Route::Node(Demo::Hub))
                .is_ok()
        );
    }

    #[test]
    fn edge_to_missing_node_is_rejected() {
        let mut graph = WorkflowGraph::new();
        graph.add_node(Demo::Fetch);
        let result = graph.add_static_edge(Demo::Fetch, Route::Node(Demo::Store));
        assert_eq!(result, Err(GraphError::NodeNotFound { node: "store" }));
    }

    #[test]
    fn successors_include_dynamic_routes() {
        let graph = demo_graph();
        let successors = graph.successors(Demo::Hub);
        assert_eq!(
            successors,
            vec![
                (Vertex::Node(Demo::Fetch), EdgeKind::Dynamic),
                (Vertex::Node(Demo::Store), EdgeKind::Dynamic),
            ]
        );
    }

    #[test]
    fn mermaid_marks_dynamic_routes_dotted() {
        let mermaid = demo_graph().to_mermaid();
        assert!(mermaid.starts_with("graph TD;"));
        assert!(mermaid.contains("__start__ --> hub;"));
        assert!(mermaid.contains("fetch --> hub;"));
        assert!(mermaid.contains("hub -.-> store;"));
        assert!(mermaid.contains("store --> __end__;"));
    }

    #[test]
    fn dot_output_names_every_vertex() {
        let dot = demo_graph().to_dot();
        assert!(dot.starts_with("digraph"));
        for name in ["__start__", "fetch", "hub", "store", "__end__"] {
            assert!(dot.contains(name), "missing {name} in {dot}");
        }
        assert!(dot.contains("dashed"));
    }
}
