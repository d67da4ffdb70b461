//! The bidirected sequence graph contract.
//!
//! The distance index does not own the graph. It consumes any graph that
//! implements the [`SequenceGraph`] trait, which covers the operations the
//! index needs: node lengths, edge enumeration, and the node identifier range.
//! The [`MemoryGraph`] structure is a self-contained implementation for tests
//! and small graphs; adapters for succinct graph representations belong in
//! downstream crates.

use crate::support::Side;

use std::collections::BTreeMap;

#[cfg(test)]
mod tests;

//-----------------------------------------------------------------------------

/// A bidirected sequence graph.
///
/// Every node has an integer identifier and a sequence. An edge connects two
/// node sides; following the edges of a side enumerates the sides the walk may
/// enter next. Edges are symmetric in the bidirected sense: if side `b` follows
/// side `a`, then `a.flip()` follows `b.flip()`.
///
/// Node-id-indexed structures in the index are sized once over
/// `min_node()..=max_node()`, so the id range should be reasonably dense.
pub trait SequenceGraph {
    /// Returns the smallest node identifier in the graph.
    fn min_node(&self) -> usize;

    /// Returns the largest node identifier in the graph.
    fn max_node(&self) -> usize;

    /// Returns `true` if the graph contains a node with the given identifier.
    fn has_node(&self, node: usize) -> bool;

    /// Returns the length of the sequence for the node, or [`None`] if there
    /// is no such node.
    fn sequence_len(&self, node: usize) -> Option<usize>;

    /// Calls `f` for each side that follows `from`, until the callback returns
    /// `false` or the sides run out.
    ///
    /// Returns `false` if the callback stopped the enumeration.
    fn follow_edges<F: FnMut(Side) -> bool>(&self, from: Side, f: F) -> bool;

    /// Calls `f` for each node identifier in the graph, until the callback
    /// returns `false` or the nodes run out.
    ///
    /// Returns `false` if the callback stopped the enumeration.
    fn for_each_node<F: FnMut(usize) -> bool>(&self, f: F) -> bool;

    /// Returns the sides that follow `from` as a vector.
    fn successors(&self, from: Side) -> Vec<Side> {
        let mut result = Vec::new();
        self.follow_edges(from, |side| {
            result.push(side);
            true
        });
        result
    }
}

//-----------------------------------------------------------------------------

/// A simple in-memory bidirected sequence graph.
///
/// Nodes are inserted with explicit identifiers and sequence lengths, and
/// edges with explicit sides. Inserting an edge also inserts its bidirected
/// mirror. The graph is intended for tests and for hosts that build small
/// graphs on the fly.
///
/// # Examples
///
/// ```
/// use snarl_distance::{MemoryGraph, SequenceGraph, Side};
///
/// let mut graph = MemoryGraph::new();
/// graph.insert_node(1, 3);
/// graph.insert_node(2, 5);
/// graph.insert_edge(Side::forward(1), Side::forward(2));
///
/// assert_eq!(graph.nodes(), 2);
/// assert_eq!(graph.sequence_len(2), Some(5));
/// assert_eq!(graph.successors(Side::forward(1)), vec![Side::forward(2)]);
/// assert_eq!(graph.successors(Side::reverse(2)), vec![Side::reverse(1)]);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemoryGraph {
    lengths: BTreeMap<usize, usize>,
    edges: BTreeMap<Side, Vec<Side>>,
}

impl MemoryGraph {
    /// Creates an empty graph.
    pub fn new() -> MemoryGraph {
        MemoryGraph::default()
    }

    /// Returns the number of nodes in the graph.
    pub fn nodes(&self) -> usize {
        self.lengths.len()
    }

    /// Inserts a node with the given identifier and sequence length,
    /// overwriting a possible old length.
    ///
    /// # Panics
    ///
    /// Panics if `node == 0`, as identifier `0` is reserved.
    pub fn insert_node(&mut self, node: usize, len: usize) {
        assert!(node != 0, "MemoryGraph: Node identifier 0 is reserved");
        self.lengths.insert(node, len);
    }

    /// Inserts an edge from one side to another, along with its bidirected
    /// mirror.
    ///
    /// Inserting the same edge twice has no effect.
    pub fn insert_edge(&mut self, from: Side, to: Side) {
        self.insert_half_edge(from, to);
        self.insert_half_edge(to.flip(), from.flip());
    }

    fn insert_half_edge(&mut self, from: Side, to: Side) {
        let successors = self.edges.entry(from).or_default();
        if !successors.contains(&to) {
            successors.push(to);
        }
    }

    /// Builds a graph from node `(id, len)` pairs and edges between sides.
    pub fn from_parts(nodes: &[(usize, usize)], edges: &[(Side, Side)]) -> MemoryGraph {
        let mut result = MemoryGraph::new();
        for (node, len) in nodes {
            result.insert_node(*node, *len);
        }
        for (from, to) in edges {
            result.insert_edge(*from, *to);
        }
        result
    }
}

impl SequenceGraph for MemoryGraph {
    fn min_node(&self) -> usize {
        self.lengths.keys().next().cloned().unwrap_or(0)
    }

    fn max_node(&self) -> usize {
        self.lengths.keys().next_back().cloned().unwrap_or(0)
    }

    fn has_node(&self, node: usize) -> bool {
        self.lengths.contains_key(&node)
    }

    fn sequence_len(&self, node: usize) -> Option<usize> {
        self.lengths.get(&node).cloned()
    }

    fn follow_edges<F: FnMut(Side) -> bool>(&self, from: Side, mut f: F) -> bool {
        if let Some(successors) = self.edges.get(&from) {
            for side in successors {
                if !f(*side) {
                    return false;
                }
            }
        }
        true
    }

    fn for_each_node<F: FnMut(usize) -> bool>(&self, mut f: F) -> bool {
        for node in self.lengths.keys() {
            if !f(*node) {
                return false;
            }
        }
        true
    }
}

//-----------------------------------------------------------------------------

// Returns the length of a node, treating a missing node as empty.
pub(crate) fn node_len<G: SequenceGraph>(graph: &G, node: usize) -> usize {
    graph.sequence_len(node).unwrap_or(0)
}

//-----------------------------------------------------------------------------
