//! The snarl decomposition contract.
//!
//! A snarl is a subgraph with a single entry side and a single exit side, and
//! a chain is an ordered sequence of snarls sharing boundary nodes. Snarls
//! nest, forming a forest. The decomposition itself is produced elsewhere;
//! this module stores it in an arena ([`SnarlForest`]) and answers the queries
//! the index needs: parents, chains, and which snarl an oriented side enters.
//!
//! The module also provides the net graph view of a snarl ([`NetGraph`]),
//! where each child chain (or lone child snarl) is collapsed into a single
//! abstract node represented by the child's start node.

use crate::graph::SequenceGraph;
use crate::support::{Orientation, Side};

use std::collections::{HashMap, HashSet, VecDeque};

#[cfg(test)]
mod tests;

//-----------------------------------------------------------------------------

// Membership of a snarl in a chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct ChainLink {
    // Arena slot of the chain.
    chain: usize,
    // Rank of the snarl in the chain.
    rank: usize,
    // Is the snarl traversed end-to-start in the chain?
    reversed: bool,
}

/// A snarl: a single-entry single-exit subgraph of the variation graph.
///
/// The start side points into the snarl and the end side points out of it.
/// A snarl is unary if its start is the reverse of its end.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snarl {
    start: Side,
    end: Side,
    parent: Option<usize>,
    chain: Option<ChainLink>,
}

impl Snarl {
    /// Returns the start side, pointing into the snarl.
    #[inline]
    pub fn start(&self) -> Side {
        self.start
    }

    /// Returns the end side, pointing out of the snarl.
    #[inline]
    pub fn end(&self) -> Side {
        self.end
    }

    /// Returns `true` if the snarl is unary: the start side is the flipped
    /// end side.
    #[inline]
    pub fn is_unary(&self) -> bool {
        self.start == self.end.flip()
    }
}

/// A chain: an ordered sequence of snarls, where consecutive snarls share a
/// boundary node.
///
/// Each member is stored with a flag telling whether the snarl is traversed
/// end-to-start in the chain. A chain is circular if its first and last
/// boundary nodes are the same node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chain {
    snarls: Vec<(usize, bool)>,
    parent: Option<usize>,
}

impl Chain {
    /// Returns the member snarls with their orientations in the chain.
    #[inline]
    pub fn snarls(&self) -> &[(usize, bool)] {
        &self.snarls
    }

    /// Returns the number of snarls in the chain.
    #[inline]
    pub fn len(&self) -> usize {
        self.snarls.len()
    }

    /// Returns `true` if the chain is empty. A valid chain never is.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.snarls.is_empty()
    }
}

//-----------------------------------------------------------------------------

/// An arena holding the snarl decomposition of a graph.
///
/// Snarls and chains are stored in contiguous vectors and referred to by their
/// slots. The forest answers the decomposition queries used during index
/// construction and distance queries.
///
/// The forest is built by inserting snarls from the top of the decomposition
/// downwards and grouping them into chains. Inserting a chain records the
/// membership on its snarls, so each snarl may belong to at most one chain.
///
/// # Examples
///
/// ```
/// use snarl_distance::{SnarlForest, Side};
///
/// // A bubble between nodes 1 and 4 nested in a snarl between 1 and 6.
/// let mut forest = SnarlForest::new();
/// let outer = forest.insert_snarl(Side::forward(1), Side::forward(6));
/// let inner = forest.insert_child_snarl(Side::forward(2), Side::forward(5), outer);
///
/// assert_eq!(forest.top_level_snarls(), vec![outer]);
/// assert_eq!(forest.parent_of(inner), Some(outer));
/// assert_eq!(forest.into_which_snarl(Side::forward(2)), Some(inner));
/// assert_eq!(forest.into_which_snarl(Side::reverse(5)), Some(inner));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SnarlForest {
    snarls: Vec<Snarl>,
    chains: Vec<Chain>,
    // Packed side -> the snarl the side enters.
    into_snarl: HashMap<usize, usize>,
}

impl SnarlForest {
    /// Creates an empty forest.
    pub fn new() -> SnarlForest {
        SnarlForest::default()
    }

    /// Returns the number of snarls in the forest.
    #[inline]
    pub fn snarl_count(&self) -> usize {
        self.snarls.len()
    }

    /// Returns the number of chains in the forest.
    #[inline]
    pub fn chain_count(&self) -> usize {
        self.chains.len()
    }

    /// Returns the snarl in the given slot.
    ///
    /// # Panics
    ///
    /// May panic if `slot >= self.snarl_count()`.
    #[inline]
    pub fn snarl(&self, slot: usize) -> &Snarl {
        &self.snarls[slot]
    }

    /// Returns the chain in the given slot.
    ///
    /// # Panics
    ///
    /// May panic if `slot >= self.chain_count()`.
    #[inline]
    pub fn chain(&self, slot: usize) -> &Chain {
        &self.chains[slot]
    }

    /// Inserts a top-level snarl and returns its slot.
    pub fn insert_snarl(&mut self, start: Side, end: Side) -> usize {
        self.insert_snarl_impl(start, end, None)
    }

    /// Inserts a snarl contained in the net graph of `parent` and returns its
    /// slot.
    ///
    /// # Panics
    ///
    /// Panics if `parent` is not a valid slot.
    pub fn insert_child_snarl(&mut self, start: Side, end: Side, parent: usize) -> usize {
        assert!(parent < self.snarls.len(), "SnarlForest: Invalid parent slot {}", parent);
        self.insert_snarl_impl(start, end, Some(parent))
    }

    fn insert_snarl_impl(&mut self, start: Side, end: Side, parent: Option<usize>) -> usize {
        let slot = self.snarls.len();
        self.snarls.push(Snarl {
            start, end, parent, chain: None,
        });
        self.into_snarl.insert(start.pack(), slot);
        self.into_snarl.insert(end.flip().pack(), slot);
        slot
    }

    /// Groups the given snarls into a chain and returns its slot.
    ///
    /// Each member is a `(snarl, reversed)` pair. The snarls must share
    /// consecutive boundary nodes, must have the same parent, and must not
    /// already belong to a chain.
    pub fn insert_chain(&mut self, members: &[(usize, bool)]) -> Result<usize, String> {
        if members.is_empty() {
            return Err(String::from("SnarlForest: Cannot insert an empty chain"));
        }
        let parent = self.snarls[members[0].0].parent;
        for window in members.windows(2) {
            let (prev, prev_rev) = window[0];
            let (next, next_rev) = window[1];
            let shared = if prev_rev { self.snarls[prev].start.node } else { self.snarls[prev].end.node };
            let expected = if next_rev { self.snarls[next].end.node } else { self.snarls[next].start.node };
            if shared != expected {
                return Err(format!(
                    "SnarlForest: Snarls {} and {} do not share a boundary node", prev, next
                ));
            }
        }
        for (snarl, _) in members {
            if self.snarls[*snarl].parent != parent {
                return Err(format!("SnarlForest: Snarl {} has a different parent than the chain", snarl));
            }
            if self.snarls[*snarl].chain.is_some() {
                return Err(format!("SnarlForest: Snarl {} is already in a chain", snarl));
            }
        }

        let slot = self.chains.len();
        self.chains.push(Chain {
            snarls: members.to_vec(),
            parent,
        });
        for (rank, (snarl, reversed)) in members.iter().enumerate() {
            self.snarls[*snarl].chain = Some(ChainLink {
                chain: slot, rank, reversed: *reversed,
            });
        }
        Ok(slot)
    }

    /// Returns the slots of the snarls without a parent.
    pub fn top_level_snarls(&self) -> Vec<usize> {
        (0..self.snarls.len()).filter(|slot| self.snarls[*slot].parent.is_none()).collect()
    }

    /// Returns the slot of the parent snarl, or [`None`] for a top-level
    /// snarl.
    #[inline]
    pub fn parent_of(&self, slot: usize) -> Option<usize> {
        self.snarls[slot].parent
    }

    /// Returns the slot of the chain containing the snarl, or [`None`] if the
    /// snarl is not in a chain.
    #[inline]
    pub fn chain_of(&self, slot: usize) -> Option<usize> {
        self.snarls[slot].chain.map(|link| link.chain)
    }

    /// Returns the rank of the snarl in its chain and whether the snarl is
    /// reversed in it, or [`None`] if the snarl is not in a chain.
    #[inline]
    pub fn chain_link_of(&self, slot: usize) -> Option<(usize, usize, bool)> {
        self.snarls[slot].chain.map(|link| (link.chain, link.rank, link.reversed))
    }

    /// Returns `true` if the snarl belongs to a chain of more than one snarl.
    #[inline]
    pub fn in_nontrivial_chain(&self, slot: usize) -> bool {
        match self.snarls[slot].chain {
            Some(link) => self.chains[link.chain].len() > 1,
            None => false,
        }
    }

    /// Returns the snarl the given oriented side enters, or [`None`] if the
    /// side does not enter a snarl.
    #[inline]
    pub fn into_which_snarl(&self, side: Side) -> Option<usize> {
        self.into_snarl.get(&side.pack()).cloned()
    }
}

//-----------------------------------------------------------------------------

/// Chain boundaries.
impl SnarlForest {
    /// Returns the start side of the chain, pointing into the chain.
    pub fn chain_start(&self, chain: usize) -> Side {
        let (snarl, reversed) = self.chains[chain].snarls[0];
        if reversed {
            self.snarls[snarl].end.flip()
        } else {
            self.snarls[snarl].start
        }
    }

    /// Returns the end side of the chain, pointing out of the chain.
    pub fn chain_end(&self, chain: usize) -> Side {
        let (snarl, reversed) = *self.chains[chain].snarls.last().unwrap();
        if reversed {
            self.snarls[snarl].start.flip()
        } else {
            self.snarls[snarl].end
        }
    }

    /// Returns `true` if the chain is circular: its two boundary nodes are the
    /// same node.
    pub fn chain_is_circular(&self, chain: usize) -> bool {
        self.chain_start(chain).node == self.chain_end(chain).node
    }

    /// Returns the identifier of boundary node `rank` of the chain.
    ///
    /// A chain of `k` snarls has `k + 1` boundary nodes, with ranks from `0`
    /// to `k`. In a circular chain, ranks `0` and `k` refer to the same node.
    pub fn chain_boundary_node(&self, chain: usize, rank: usize) -> usize {
        if rank == 0 {
            return self.chain_start(chain).node;
        }
        let (snarl, reversed) = self.chains[chain].snarls[rank - 1];
        if reversed {
            self.snarls[snarl].start.node
        } else {
            self.snarls[snarl].end.node
        }
    }
}

//-----------------------------------------------------------------------------

// A child unit in the net graph of a snarl.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Child {
    // A child chain of more than one snarl.
    Chain(usize),
    // A lone child snarl.
    Snarl(usize),
}

/// The net graph view of one snarl.
///
/// In the net graph, each child chain (or lone child snarl) collapses into a
/// single abstract node represented by the child's start node. Traversing the
/// representative in its entry orientation corresponds to walking through the
/// whole child; the length of that walk is supplied by the caller from the
/// child's own index. Boundary nodes of the snarl appear with their real
/// sides, and edges out of the snarl are not part of the view.
pub struct NetGraph<'a, G: SequenceGraph> {
    graph: &'a G,
    forest: &'a SnarlForest,
    snarl: usize,
}

impl<'a, G: SequenceGraph> NetGraph<'a, G> {
    /// Creates the net graph view of the given snarl.
    pub fn new(graph: &'a G, forest: &'a SnarlForest, snarl: usize) -> Self {
        NetGraph { graph, forest, snarl }
    }

    /// Returns the start side of the snarl, pointing in.
    #[inline]
    pub fn start(&self) -> Side {
        self.forest.snarl(self.snarl).start()
    }

    /// Returns the end side of the snarl, pointing out.
    #[inline]
    pub fn end(&self) -> Side {
        self.forest.snarl(self.snarl).end()
    }

    // Returns the child unit represented by the given node, if any.
    pub(crate) fn child_at(&self, node: usize) -> Option<Child> {
        if node == self.start().node || node == self.end().node {
            return None;
        }
        let snarl = self.forest.into_which_snarl(Side::forward(node))
            .or_else(|| self.forest.into_which_snarl(Side::reverse(node)))?;
        if self.forest.parent_of(snarl) != Some(self.snarl) {
            return None;
        }
        if self.forest.in_nontrivial_chain(snarl) {
            Some(Child::Chain(self.forest.chain_of(snarl).unwrap()))
        } else {
            Some(Child::Snarl(snarl))
        }
    }

    // Returns the boundary sides of a child unit: the start side pointing in
    // and the end side pointing out.
    pub(crate) fn child_bounds(&self, child: Child) -> (Side, Side) {
        match child {
            Child::Chain(chain) => (self.forest.chain_start(chain), self.forest.chain_end(chain)),
            Child::Snarl(snarl) => (self.forest.snarl(snarl).start(), self.forest.snarl(snarl).end()),
        }
    }

    // Translates a real side to the side of the unit that represents it, if
    // the side enters a child unit.
    fn unit_side(&self, side: Side) -> Side {
        if let Some(child) = self.child_at(side.node) {
            let (start, end) = self.child_bounds(child);
            if side == start {
                // Entering the child forwards.
                return start;
            }
            if side == end.flip() {
                // Entering the child backwards.
                return start.flip();
            }
        }
        side
    }

    // Returns the real side a walk leaves through when it exits the unit
    // occupied in the given orientation.
    fn exit_side(&self, side: Side) -> Side {
        if let Some(child) = self.child_at(side.node) {
            let (start, end) = self.child_bounds(child);
            if side.orientation == start.orientation {
                // Traversing the child forwards: leave through the end.
                return end;
            } else {
                // Traversing the child backwards: leave through the start.
                return start.flip();
            }
        }
        side
    }

    /// Calls `f` for each unit side that follows the given unit side, until
    /// the callback returns `false` or the sides run out.
    ///
    /// Outward-facing boundary sides have no successors in the view.
    pub fn follow_edges<F: FnMut(Side) -> bool>(&self, from: Side, mut f: F) -> bool {
        // Sides leaving the snarl are not part of the net graph.
        let start = self.start();
        let end = self.end();
        let outward = (from.node == start.node && from.orientation == start.orientation.flip())
            || (from.node == end.node && from.orientation == end.orientation);
        let inward = (from.node == start.node && from.orientation == start.orientation)
            || (from.node == end.node && from.orientation == end.orientation.flip());
        if outward && !inward {
            return true;
        }

        let real = self.exit_side(from);
        self.graph.follow_edges(real, |next| f(self.unit_side(next)))
    }

    /// Returns the identifiers of the unit nodes in the view: the start node
    /// first, the end node last, and the interior units in between ordered by
    /// identifier.
    pub fn units(&self) -> Vec<usize> {
        let start = self.start();
        let end = self.end();

        let mut seen: HashSet<usize> = HashSet::new();
        let mut queue: VecDeque<usize> = VecDeque::new();
        seen.insert(start.node);
        seen.insert(end.node);
        queue.push_back(start.node);
        queue.push_back(end.node);

        let mut interior: Vec<usize> = Vec::new();
        while let Some(node) = queue.pop_front() {
            for orientation in [Orientation::Forward, Orientation::Reverse] {
                self.follow_edges(Side::new(node, orientation), |next| {
                    if seen.insert(next.node) {
                        interior.push(next.node);
                        queue.push_back(next.node);
                    }
                    true
                });
            }
        }

        interior.sort_unstable();
        let mut result = Vec::with_capacity(interior.len() + 2);
        result.push(start.node);
        result.extend(interior);
        if end.node != start.node {
            result.push(end.node);
        }
        result
    }
}

//-----------------------------------------------------------------------------
