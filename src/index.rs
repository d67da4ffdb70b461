//! The distance index: packed per-snarl and per-chain distance tables.
//!
//! The index consists of a [`SnarlIndex`] for every snarl and a [`ChainIndex`]
//! for every nontrivial chain in the decomposition, plus a [`NodeLocator`]
//! mapping graph nodes back into the decomposition. The tables are built once
//! bottom-up, optionally extended with the maximum distance structure in
//! [`crate::max_index`], and then used read-only by the queries.
//!
//! All distances are stored as `value + 1` in bit-compressed integer vectors,
//! with `0` denoting an unreachable pair. The serialization format is a
//! Simple-SDS element stream; see [`DistanceIndex`] for the layout.

use crate::graph::SequenceGraph;
use crate::max_index::MaxIndex;
use crate::snarls::SnarlForest;
use crate::support::{self, Orientation, Side};

use simple_sds::int_vector::IntVector;
use simple_sds::ops::{Vector, Access};
use simple_sds::serialize::Serialize;

use std::collections::HashMap;
use std::io::{Error, ErrorKind};
use std::io;


//-----------------------------------------------------------------------------

/// All-pairs distances among the oriented units of one snarl.
///
/// A unit is a node of the snarl's net graph: a boundary node, an interior
/// node, or a collapsed child chain / snarl represented by its start node.
/// Each unit occupies two oriented slots. Unit rank 0 is the snarl start with
/// slot 0 pointing in and slot 1 pointing out; the last rank is the snarl end
/// with the outward slot first. Interior units use their forward orientation
/// as the base slot.
///
/// The distance vector starts with one entry per unit storing the unit length
/// (the full traversal length for collapsed children), followed by the upper
/// triangle of the slot-pair matrix. The stored value for slot pair `(i, j)`
/// is the minimum distance from the end of the unit at slot `i` to the start
/// of the unit at slot `j`, plus one; `0` means unreachable. By symmetry,
/// `dist(a, b) = dist(flip(b), flip(a))`, so only the pair with the smaller
/// first slot is stored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SnarlIndex {
    // Boundary side pointing into the snarl.
    start: Side,
    // Boundary side pointing out of the snarl.
    end: Side,
    // Packed side entering the parent snarl, or 0 at the root.
    parent: usize,
    // Units by rank, with their base orientations.
    units: Vec<Side>,
    // Node identifier -> unit rank.
    ranks: HashMap<usize, usize>,
    // Unit lengths followed by the packed upper triangle.
    distances: IntVector,
}

impl SnarlIndex {
    // Creates an index with an empty distance vector. The construction code
    // fills a scratch vector of `Self::vector_len(units.len())` values and
    // installs it with `set_distances`.
    pub(crate) fn new(start: Side, end: Side, parent: usize, units: Vec<Side>) -> SnarlIndex {
        let mut ranks = HashMap::with_capacity(units.len());
        for (rank, side) in units.iter().enumerate() {
            ranks.insert(side.node, rank);
        }
        SnarlIndex {
            start, end, parent, units, ranks,
            distances: IntVector::new(1).unwrap(),
        }
    }

    // Returns the number of values in the distance vector for the given unit
    // count: the length prefix plus the upper triangle over `2n` slots.
    pub(crate) fn vector_len(num_units: usize) -> usize {
        let slots = 2 * num_units;
        num_units + (slots * (slots + 1)) / 2
    }

    // Installs the filled distance vector, bit-compressing it.
    pub(crate) fn set_distances(&mut self, values: &[u64]) {
        debug_assert_eq!(values.len(), Self::vector_len(self.units.len()));
        self.distances = support::compress(values);
    }

    /// Returns the start side of the snarl, pointing in.
    #[inline]
    pub fn start(&self) -> Side {
        self.start
    }

    /// Returns the end side of the snarl, pointing out.
    #[inline]
    pub fn end(&self) -> Side {
        self.end
    }

    /// Returns the packed side entering the parent snarl, or `0` at the root.
    #[inline]
    pub fn parent(&self) -> usize {
        self.parent
    }

    /// Returns the number of units in the snarl.
    #[inline]
    pub fn num_units(&self) -> usize {
        self.units.len()
    }

    /// Returns `true` if the given node is a unit of this snarl.
    #[inline]
    pub fn contains(&self, node: usize) -> bool {
        self.ranks.contains_key(&node)
    }

    // Returns the oriented slot for the given side.
    //
    // # Panics
    //
    // Panics if the node is not a unit of this snarl.
    fn slot(&self, side: Side) -> usize {
        let rank = self.ranks[&side.node];
        2 * rank + ((side.orientation != self.units[rank].orientation) as usize)
    }

    // Returns the offset of the distance from `from` to `to` in the packed
    // vector. The pair is canonicalized using the symmetry of the matrix.
    pub(crate) fn pair_offset(&self, from: Side, to: Side) -> usize {
        let mut i1 = self.slot(from);
        let mut i2 = self.slot(to.flip());
        if i1 > i2 {
            std::mem::swap(&mut i1, &mut i2);
        }
        let slots = 2 * self.units.len();
        let triangle = (slots * (slots + 1)) / 2;
        let tail = ((slots - i1) * (slots - i1 + 1)) / 2;
        triangle - tail + (i2 - i1) + self.units.len()
    }

    // Returns the offset of the length of the unit containing the node.
    pub(crate) fn length_offset(&self, node: usize) -> usize {
        self.ranks[&node]
    }

    /// Returns the length of the unit containing the given node, or [`None`]
    /// if the unit cannot be traversed from end to end.
    ///
    /// For a boundary or interior node this is the node length; for a
    /// collapsed child it is the full traversal length of the child.
    ///
    /// # Panics
    ///
    /// May panic if the node is not a unit of this snarl.
    pub fn unit_length(&self, node: usize) -> Option<usize> {
        support::stored_to_dist(self.distances.get(self.length_offset(node)))
    }

    /// Returns the minimum distance from the end of the unit at `from` to the
    /// start of the unit at `to`, or [`None`] if `to` is unreachable.
    ///
    /// # Panics
    ///
    /// May panic if either node is not a unit of this snarl.
    pub fn distance_short(&self, from: Side, to: Side) -> Option<usize> {
        support::stored_to_dist(self.distances.get(self.pair_offset(from, to)))
    }

    /// Returns the minimum distance from the start of the unit at `from` to
    /// the start of the unit at `to`, including the traversal of `from`.
    ///
    /// # Panics
    ///
    /// May panic if either node is not a unit of this snarl.
    pub fn distance(&self, from: Side, to: Side) -> Option<usize> {
        support::sum_dist(self.distance_short(from, to), self.unit_length(from.node))
    }

    /// Returns the length of the snarl from the outer end of the start node
    /// to the outer end of the end node, or [`None`] if the snarl has no
    /// through path.
    pub fn snarl_length(&self) -> Option<usize> {
        let through = self.distance_short(self.start, self.end)?;
        let ends = support::sum_dist(
            self.unit_length(self.start.node),
            self.unit_length(self.end.node),
        )?;
        Some(through + ends)
    }

    /// Given the distances from a position to the two sides of a unit,
    /// returns the distances from the position to the two boundaries of the
    /// snarl.
    ///
    /// # Arguments
    ///
    /// * `node`: The unit node.
    /// * `reverse`: Is the unit reversed in the snarl?
    /// * `dist_left`, `dist_right`: Distances to the sides of the unit, with
    ///   [`None`] for an unreachable side.
    pub fn dist_to_ends(
        &self, node: usize, reverse: bool,
        dist_left: Option<usize>, dist_right: Option<usize>,
    ) -> (Option<usize>, Option<usize>) {
        let (dist_left, dist_right) = if reverse { (dist_right, dist_left) } else { (dist_left, dist_right) };

        let end_in = self.end.flip();
        let mut dsl = self.distance(self.start, Side::forward(node));
        let mut dsr = self.distance(self.start, Side::reverse(node));
        let mut der = self.distance(end_in, Side::reverse(node));
        let mut del = self.distance(end_in, Side::forward(node));

        // The trip is empty if the unit is itself a boundary of the snarl.
        if node == self.start.node {
            if reverse == self.start.orientation.is_reverse() {
                dsl = Some(0);
            } else {
                dsr = Some(0);
            }
        }
        if node == self.end.node {
            if reverse == end_in.orientation.is_reverse() {
                del = Some(0);
            } else {
                der = Some(0);
            }
        }

        let dsl = support::sum_dist(dist_left, dsl);
        let dsr = support::sum_dist(dist_right, dsr);
        let der = support::sum_dist(dist_right, der);
        let del = support::sum_dist(dist_left, del);

        (support::min_dist(dsl, dsr), support::min_dist(der, del))
    }
}

impl Serialize for SnarlIndex {
    fn serialize_header<T: io::Write>(&self, _: &mut T) -> io::Result<()> {
        Ok(())
    }

    fn serialize_body<T: io::Write>(&self, writer: &mut T) -> io::Result<()> {
        self.start.pack().serialize(writer)?;
        self.end.pack().serialize(writer)?;
        self.parent.serialize(writer)?;
        let units: Vec<u64> = self.units.iter().map(|side| side.pack() as u64).collect();
        support::compress(&units).serialize(writer)?;
        self.distances.serialize(writer)?;
        Ok(())
    }

    fn load<T: io::Read>(reader: &mut T) -> io::Result<Self> {
        let start = Side::unpack(usize::load(reader)?);
        let end = Side::unpack(usize::load(reader)?);
        let parent = usize::load(reader)?;
        let unit_vector = IntVector::load(reader)?;
        let units: Vec<Side> = support::decompress(&unit_vector).iter().map(|packed| Side::unpack(*packed as usize)).collect();
        if units.is_empty() {
            return Err(Error::new(ErrorKind::InvalidData, "SnarlIndex: No units"));
        }
        let distances = IntVector::load(reader)?;
        if distances.len() != Self::vector_len(units.len()) {
            return Err(Error::new(ErrorKind::InvalidData, "SnarlIndex: Distance vector length does not match the number of units"));
        }
        let mut result = SnarlIndex::new(start, end, parent, units);
        result.distances = distances;
        Ok(result)
    }

    fn size_in_elements(&self) -> usize {
        let units: Vec<u64> = self.units.iter().map(|side| side.pack() as u64).collect();
        3 + support::compress(&units).size_in_elements() + self.distances.size_in_elements()
    }
}

//-----------------------------------------------------------------------------

// A rank in a chain, with the wrap-around boundary of a circular chain as an
// explicit variant instead of a sentinel node id.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ChainRank {
    Rank(usize),
    Wrap,
}

/// Prefix sums and loop distances for one chain.
///
/// A chain of `k` snarls has `k + 1` boundary nodes with ranks `0..=k`. The
/// prefix sum vector has `k + 2` entries: entry `i <= k` is the minimum
/// distance from the chain entry point to the entry side of boundary node
/// `i`, and the final entry is the full chain length, through the far side of
/// the last boundary node. The loop vectors have one entry per boundary node:
/// `loop_fd[i]` is the best walk that enters boundary `i` heading forward
/// along the chain and returns to it heading backward, and `loop_rev[i]` is
/// the symmetric walk through the prefix of the chain. All entries are stored
/// as `value + 1` with `0` for unreachable.
///
/// Equality compares the persistent fields; the chain-forward orientations
/// are a cache rebuilt from the decomposition.
#[derive(Clone, Debug)]
pub struct ChainIndex {
    // First boundary node of the chain.
    start_node: usize,
    // Last boundary node of the chain. Equal to `start_node` in a circular
    // chain.
    end_node: usize,
    // Packed side entering the parent snarl, or 0 at the root.
    parent: usize,
    prefix_sum: IntVector,
    loop_fd: IntVector,
    loop_rev: IntVector,
    // Distinct boundary nodes in rank order. A circular chain stores the
    // shared boundary node once, at rank 0.
    boundary_nodes: Vec<usize>,
    // Node identifier -> rank of its first occurrence.
    ranks: HashMap<usize, usize>,
    // Is the chain-forward orientation of each boundary node reverse?
    // Rebuilt from the decomposition; not serialized.
    forward_rev: Vec<bool>,
}

impl ChainIndex {
    pub(crate) fn new(
        start_node: usize, end_node: usize, parent: usize,
        prefix_sum: Vec<u64>, loop_fd: Vec<u64>, loop_rev: Vec<u64>,
        boundary_nodes: Vec<usize>, forward_rev: Vec<bool>,
    ) -> ChainIndex {
        let mut ranks = HashMap::with_capacity(boundary_nodes.len());
        for (rank, node) in boundary_nodes.iter().enumerate() {
            ranks.entry(*node).or_insert(rank);
        }
        ChainIndex {
            start_node, end_node, parent,
            prefix_sum: support::compress(&prefix_sum),
            loop_fd: support::compress(&loop_fd),
            loop_rev: support::compress(&loop_rev),
            boundary_nodes, ranks, forward_rev,
        }
    }

    /// Returns the first boundary node of the chain.
    #[inline]
    pub fn start_node(&self) -> usize {
        self.start_node
    }

    /// Returns the last boundary node of the chain.
    #[inline]
    pub fn end_node(&self) -> usize {
        self.end_node
    }

    /// Returns the packed side entering the parent snarl, or `0` at the root.
    #[inline]
    pub fn parent(&self) -> usize {
        self.parent
    }

    /// Returns the number of snarls in the chain.
    #[inline]
    pub fn snarl_count(&self) -> usize {
        self.prefix_sum.len() - 2
    }

    /// Returns `true` if the chain is circular.
    #[inline]
    pub fn is_circular(&self) -> bool {
        self.start_node == self.end_node
    }

    /// Returns the rank of the given boundary node, or [`None`] if the node
    /// is not a boundary node of the chain.
    #[inline]
    pub fn rank_of(&self, node: usize) -> Option<usize> {
        self.ranks.get(&node).cloned()
    }

    /// Returns the length of the chain, from the outer end of the first
    /// boundary node to the outer end of the last.
    pub fn chain_length(&self) -> Option<usize> {
        support::stored_to_dist(self.prefix_sum.get(self.prefix_sum.len() - 1))
    }

    /// Returns the prefix sum at the given boundary rank.
    pub fn prefix_sum_at(&self, rank: usize) -> Option<usize> {
        support::stored_to_dist(self.prefix_sum.get(rank))
    }

    /// Returns the forward loop distance at the given boundary rank.
    pub fn loop_fd_at(&self, rank: usize) -> Option<usize> {
        support::stored_to_dist(self.loop_fd.get(rank))
    }

    /// Returns the reverse loop distance at the given boundary rank.
    pub fn loop_rev_at(&self, rank: usize) -> Option<usize> {
        support::stored_to_dist(self.loop_rev.get(rank))
    }

    // Resolves a rank, treating the wrap rank of a circular chain as the
    // snarl count.
    fn rank_index(&self, rank: ChainRank) -> usize {
        match rank {
            ChainRank::Rank(rank) => rank,
            ChainRank::Wrap => self.snarl_count(),
        }
    }

    // Is the side read in reverse relative to the chain-forward direction at
    // the given rank?
    fn reading_reverse(&self, rank: ChainRank, side: Side) -> bool {
        side.orientation.is_reverse() != self.forward_rev[self.rank_index(rank)]
    }

    /// Returns the minimum distance from the start of boundary node `from` to
    /// the start of boundary node `to`, including the traversal of `from`.
    ///
    /// The sides are given in their graph orientations; the chain resolves
    /// them against its own reading direction. Circular chains also consider
    /// the wrap-around path through the shared boundary.
    ///
    /// # Panics
    ///
    /// May panic if either node is not a boundary node of the chain.
    pub fn distance<G: SequenceGraph>(&self, graph: &G, from: Side, to: Side) -> Option<usize> {
        let from_rank = ChainRank::Rank(self.ranks[&from.node]);
        let to_rank = ChainRank::Rank(self.ranks[&to.node]);
        self.distance_impl(graph, from_rank, from, to_rank, to, true)
    }

    fn distance_impl<G: SequenceGraph>(
        &self, graph: &G,
        from_rank: ChainRank, from: Side,
        to_rank: ChainRank, to: Side,
        recurse: bool,
    ) -> Option<usize> {
        let i1 = self.rank_index(from_rank);
        let i2 = self.rank_index(to_rank);
        let rev1 = self.reading_reverse(from_rank, from);
        let rev2 = self.reading_reverse(to_rank, to);

        // The wrap-around path of a circular chain passes through the shared
        // boundary node at both rank 0 and the wrap rank.
        let mut wrap_dist = None;
        if recurse && self.is_circular() && i1 != i2 {
            if i1 == 0 {
                wrap_dist = self.distance_impl(graph, ChainRank::Wrap, from, to_rank, to, false);
            } else if i2 == 0 {
                wrap_dist = self.distance_impl(graph, from_rank, from, ChainRank::Wrap, to, false);
            } else if i1 < i2 && from.orientation.is_reverse() {
                let head = Side::new(self.start_node, from.orientation);
                wrap_dist = support::sum_dist(
                    self.distance_impl(graph, from_rank, from, ChainRank::Rank(0), head, false),
                    self.distance_impl(graph, ChainRank::Wrap, head, to_rank, to, false),
                );
            } else if i1 > i2 && !rev1 {
                let head = Side::new(self.start_node, from.orientation);
                wrap_dist = support::sum_dist(
                    self.distance_impl(graph, from_rank, from, ChainRank::Wrap, head, false),
                    self.distance_impl(graph, ChainRank::Rank(0), head, to_rank, to, false),
                );
            }
        }

        let ps = |rank: usize| self.prefix_sum.get(rank);
        let len1 = graph.sequence_len(from.node).unwrap_or(0) as u64;
        let len2 = graph.sequence_len(to.node).unwrap_or(0) as u64;

        let local = match (rev1, rev2) {
            (false, false) => {
                if i1 <= i2 {
                    Some((ps(i2) - ps(i1)) as usize)
                } else {
                    let around = (ps(i1) + len1) - (ps(i2) + len2);
                    support::sum3_dist(
                        Some(around as usize),
                        self.loop_fd_at(i1),
                        self.loop_rev_at(i2),
                    )
                }
            }
            (true, true) => {
                if i1 >= i2 {
                    Some(((ps(i1) + len1) - (ps(i2) + len2)) as usize)
                } else {
                    let along = ps(i2) - ps(i1);
                    support::sum3_dist(
                        Some(along as usize),
                        self.loop_rev_at(i1),
                        self.loop_fd_at(i2),
                    )
                }
            }
            (false, true) => {
                if i1 <= i2 {
                    let along = ps(i2) - ps(i1);
                    support::sum_dist(Some(along as usize), self.loop_fd_at(i2))
                } else {
                    let around = (ps(i1) + len1) - (ps(i2) + len2);
                    support::sum_dist(Some(around as usize), self.loop_fd_at(i1))
                }
            }
            (true, false) => {
                if i1 <= i2 {
                    let along = ps(i2) - ps(i1);
                    support::sum_dist(Some(along as usize), self.loop_rev_at(i1))
                } else {
                    let around = (ps(i1) + len1) - (ps(i2) + len2);
                    support::sum_dist(Some(around as usize), self.loop_rev_at(i2))
                }
            }
        };

        support::min_dist(wrap_dist, local)
    }

    /// Returns the external distance between two boundary node sides: the
    /// distance from the end of `from` to the start of `to`, excluding both
    /// node traversals.
    ///
    /// If the sides coincide, returns the shared node length so that the
    /// caller can combine distances that both include the node.
    ///
    /// # Panics
    ///
    /// May panic if either node is not a boundary node of the chain.
    pub fn distance_short<G: SequenceGraph>(&self, graph: &G, from: Side, to: Side) -> Option<usize> {
        if from == to {
            return graph.sequence_len(from.node);
        }
        let d1 = self.distance(graph, from, to);
        let d2 = self.distance(graph, to.flip(), from.flip());
        let len1 = graph.sequence_len(from.node).unwrap_or(0);
        let len2 = graph.sequence_len(to.node).unwrap_or(0);
        match (d1, d2) {
            (None, None) => None,
            (Some(d1), None) => Some(d1 - len1),
            (None, Some(d2)) => Some(d2 - len2),
            (Some(d1), Some(d2)) => Some(std::cmp::min(d1 - len1, d2 - len2)),
        }
    }

    // Rebuilds the chain-forward orientations from the decomposition.
    pub(crate) fn set_forward_rev(&mut self, forward_rev: Vec<bool>) {
        self.forward_rev = forward_rev;
    }
}

impl PartialEq for ChainIndex {
    fn eq(&self, other: &Self) -> bool {
        self.start_node == other.start_node
            && self.end_node == other.end_node
            && self.parent == other.parent
            && self.prefix_sum == other.prefix_sum
            && self.loop_fd == other.loop_fd
            && self.loop_rev == other.loop_rev
            && self.boundary_nodes == other.boundary_nodes
    }
}

impl Eq for ChainIndex {}

impl Serialize for ChainIndex {
    fn serialize_header<T: io::Write>(&self, _: &mut T) -> io::Result<()> {
        Ok(())
    }

    fn serialize_body<T: io::Write>(&self, writer: &mut T) -> io::Result<()> {
        self.start_node.serialize(writer)?;
        self.end_node.serialize(writer)?;
        self.parent.serialize(writer)?;
        self.prefix_sum.serialize(writer)?;
        self.loop_fd.serialize(writer)?;
        self.loop_rev.serialize(writer)?;
        let nodes: Vec<u64> = self.boundary_nodes.iter().map(|node| *node as u64).collect();
        support::compress(&nodes).serialize(writer)?;
        Ok(())
    }

    fn load<T: io::Read>(reader: &mut T) -> io::Result<Self> {
        let start_node = usize::load(reader)?;
        let end_node = usize::load(reader)?;
        let parent = usize::load(reader)?;
        let prefix_sum = IntVector::load(reader)?;
        if prefix_sum.len() < 3 {
            return Err(Error::new(ErrorKind::InvalidData, "ChainIndex: Prefix sum vector is too short"));
        }
        let snarl_count = prefix_sum.len() - 2;
        let loop_fd = IntVector::load(reader)?;
        let loop_rev = IntVector::load(reader)?;
        if loop_fd.len() != snarl_count + 1 || loop_rev.len() != snarl_count + 1 {
            return Err(Error::new(ErrorKind::InvalidData, "ChainIndex: Loop vector length does not match the number of snarls"));
        }
        let node_vector = IntVector::load(reader)?;
        let boundary_nodes: Vec<usize> = support::decompress(&node_vector).iter().map(|node| *node as usize).collect();
        let expected = if start_node == end_node { snarl_count } else { snarl_count + 1 };
        if boundary_nodes.len() != expected {
            return Err(Error::new(ErrorKind::InvalidData, "ChainIndex: Boundary node count does not match the number of snarls"));
        }

        let mut ranks = HashMap::with_capacity(boundary_nodes.len());
        for (rank, node) in boundary_nodes.iter().enumerate() {
            ranks.entry(*node).or_insert(rank);
        }
        Ok(ChainIndex {
            start_node, end_node, parent,
            prefix_sum, loop_fd, loop_rev,
            boundary_nodes, ranks,
            forward_rev: Vec::new(),
        })
    }

    fn size_in_elements(&self) -> usize {
        let nodes: Vec<u64> = self.boundary_nodes.iter().map(|node| *node as u64).collect();
        3 + self.prefix_sum.size_in_elements()
            + self.loop_fd.size_in_elements()
            + self.loop_rev.size_in_elements()
            + support::compress(&nodes).size_in_elements()
    }
}

//-----------------------------------------------------------------------------

/// Mappings from graph nodes into the decomposition and the index tables.
///
/// The locator assumes a dense node identifier range and sizes its vectors
/// once over `min_node..=max_node`. The primary, secondary, and chain
/// assignments are used during construction and are not serialized; the
/// node-to-snarl mapping is used by the queries and persists.
#[derive(Clone, Debug)]
pub struct NodeLocator {
    min_node: usize,
    max_node: usize,
    // Node -> (snarl table slot, unit rank) in the snarl where the node is a
    // unit, or a boundary whose primary side lies there.
    primary: Vec<Option<(usize, usize)>>,
    // Present for boundary nodes shared by two adjacent snarls in a chain.
    secondary: Vec<Option<(usize, usize)>>,
    // Node -> (chain table slot, boundary rank).
    chain_assignment: Vec<Option<(usize, usize)>>,
    // Node -> packed side entering the smallest enclosing snarl, 0 for none.
    node_to_snarl: IntVector,
}

impl NodeLocator {
    pub(crate) fn new(min_node: usize, max_node: usize) -> NodeLocator {
        let size = max_node - min_node + 1;
        NodeLocator {
            min_node, max_node,
            primary: vec![None; size],
            secondary: vec![None; size],
            chain_assignment: vec![None; size],
            node_to_snarl: IntVector::new(1).unwrap(),
        }
    }

    /// Returns the smallest node identifier covered by the locator.
    #[inline]
    pub fn min_node(&self) -> usize {
        self.min_node
    }

    /// Returns the largest node identifier covered by the locator.
    #[inline]
    pub fn max_node(&self) -> usize {
        self.max_node
    }

    #[inline]
    fn offset(&self, node: usize) -> usize {
        node - self.min_node
    }

    /// Returns the primary (snarl slot, unit rank) assignment of the node.
    pub fn primary_snarl(&self, node: usize) -> Option<(usize, usize)> {
        self.primary[self.offset(node)]
    }

    /// Returns the secondary (snarl slot, unit rank) assignment of the node.
    pub fn secondary_snarl(&self, node: usize) -> Option<(usize, usize)> {
        self.secondary[self.offset(node)]
    }

    /// Returns the (chain slot, boundary rank) assignment of the node.
    pub fn chain_assignment(&self, node: usize) -> Option<(usize, usize)> {
        self.chain_assignment[self.offset(node)]
    }

    /// Returns the packed side entering the smallest snarl containing the
    /// node, or [`None`] if the node is not in a snarl.
    pub fn node_to_snarl(&self, node: usize) -> Option<Side> {
        if node < self.min_node || node > self.max_node || self.node_to_snarl.is_empty() {
            return None;
        }
        let packed = self.node_to_snarl.get(self.offset(node)) as usize;
        if packed == 0 { None } else { Some(Side::unpack(packed)) }
    }

    pub(crate) fn set_primary(&mut self, node: usize, snarl: usize, rank: usize) {
        let offset = self.offset(node);
        self.primary[offset] = Some((snarl, rank));
    }

    pub(crate) fn set_secondary(&mut self, node: usize, snarl: usize, rank: usize) {
        let offset = self.offset(node);
        self.secondary[offset] = Some((snarl, rank));
    }

    pub(crate) fn set_chain_assignment(&mut self, node: usize, chain: usize, rank: usize) {
        let offset = self.offset(node);
        self.chain_assignment[offset] = Some((chain, rank));
    }

    pub(crate) fn set_node_to_snarl(&mut self, values: &[u64]) {
        debug_assert_eq!(values.len(), self.max_node - self.min_node + 1);
        self.node_to_snarl = support::compress(values);
    }
}

//-----------------------------------------------------------------------------

/// The distance index over a variation graph and its snarl decomposition.
///
/// The index is built with [`DistanceIndex::new`] or
/// [`DistanceIndex::with_maximum`] and is read-only afterwards. Queries take
/// the graph and the decomposition as arguments; the index stores neither.
///
/// # Serialization
///
/// The index serializes as a Simple-SDS element stream: the snarl count and
/// the snarl tables, the chain count and the chain tables, the node id range,
/// the node-to-snarl vector, and the maximum distance structure (empty if it
/// was not built). After loading, the index must be connected to the graph
/// and the decomposition with [`DistanceIndex::connect`], which validates
/// the tables and rebuilds the unserialized parts.
///
/// # Examples
///
/// ```
/// use snarl_distance::{DistanceIndex, MemoryGraph, SnarlForest, Side, Pos, Orientation};
///
/// // A bubble: 1 -> {2, 3} -> 4.
/// let graph = MemoryGraph::from_parts(
///     &[(1, 2), (2, 4), (3, 9), (4, 2)],
///     &[
///         (Side::forward(1), Side::forward(2)),
///         (Side::forward(1), Side::forward(3)),
///         (Side::forward(2), Side::forward(4)),
///         (Side::forward(3), Side::forward(4)),
///     ],
/// );
/// let mut forest = SnarlForest::new();
/// forest.insert_snarl(Side::forward(1), Side::forward(4));
///
/// let index = DistanceIndex::new(&graph, &forest, false).unwrap();
/// let p1 = Pos::new(1, 0, Orientation::Forward);
/// let p2 = Pos::new(4, 1, Orientation::Forward);
/// assert_eq!(index.min_distance(&graph, &forest, p1, p2), Some(8));
/// ```
#[derive(Clone, Debug)]
pub struct DistanceIndex {
    pub(crate) snarls: Vec<SnarlIndex>,
    pub(crate) chains: Vec<ChainIndex>,
    pub(crate) locator: NodeLocator,
    // Packed start side -> snarl table slot.
    pub(crate) snarl_map: HashMap<usize, usize>,
    // Chain start node -> chain table slot.
    pub(crate) chain_map: HashMap<usize, usize>,
    pub(crate) max_index: Option<MaxIndex>,
}

impl DistanceIndex {
    /// Builds the minimum distance index for the given graph and
    /// decomposition.
    ///
    /// Returns an error if the decomposition references nodes the graph does
    /// not expose, or if a nontrivial chain cannot be traversed.
    ///
    /// # Arguments
    ///
    /// * `graph`: The variation graph.
    /// * `forest`: The snarl decomposition of the graph.
    /// * `verbose`: Print progress information to stderr.
    pub fn new<G: SequenceGraph>(graph: &G, forest: &SnarlForest, verbose: bool) -> Result<DistanceIndex, String> {
        crate::builder::build(graph, forest, verbose)
    }

    /// Builds the distance index with the maximum distance extension.
    ///
    /// # Arguments
    ///
    /// * `graph`: The variation graph.
    /// * `forest`: The snarl decomposition of the graph.
    /// * `cap`: The bound above which the maximum distance estimate does not
    ///   refine.
    /// * `verbose`: Print progress information to stderr.
    pub fn with_maximum<G: SequenceGraph>(
        graph: &G, forest: &SnarlForest, cap: usize, verbose: bool,
    ) -> Result<DistanceIndex, String> {
        let mut result = crate::builder::build(graph, forest, verbose)?;
        let max_index = MaxIndex::new(graph, forest, &result, cap, verbose)?;
        result.max_index = Some(max_index);
        Ok(result)
    }

    /// Returns the snarl tables in slot order.
    pub fn snarl_indexes(&self) -> &[SnarlIndex] {
        &self.snarls
    }

    /// Returns the chain tables in slot order.
    pub fn chain_indexes(&self) -> &[ChainIndex] {
        &self.chains
    }

    /// Returns the node locator.
    pub fn locator(&self) -> &NodeLocator {
        &self.locator
    }

    /// Returns the maximum distance structure, or [`None`] if it was not
    /// built.
    pub fn max_index(&self) -> Option<&MaxIndex> {
        self.max_index.as_ref()
    }

    /// Returns the slot of the smallest snarl in the decomposition containing
    /// the given node, or [`None`] if the node is not in a snarl.
    pub fn snarl_of(&self, forest: &SnarlForest, node: usize) -> Option<usize> {
        let side = self.locator.node_to_snarl(node)?;
        forest.into_which_snarl(side)
    }

    // Returns the table for the given snarl slot in the forest.
    pub(crate) fn snarl_table(&self, forest: &SnarlForest, snarl: usize) -> Option<&SnarlIndex> {
        let key = forest.snarl(snarl).start().pack();
        self.snarl_map.get(&key).map(|slot| &self.snarls[*slot])
    }

    // Returns the table for the given chain slot in the forest.
    pub(crate) fn chain_table(&self, forest: &SnarlForest, chain: usize) -> Option<&ChainIndex> {
        let key = forest.chain_start(chain).node;
        self.chain_map.get(&key).map(|slot| &self.chains[*slot])
    }

    /// Connects a loaded index to the graph and the decomposition it was
    /// built for.
    ///
    /// Validates that every serialized snarl corresponds to a snarl in the
    /// decomposition and that the node range matches the graph, and rebuilds
    /// the parts of the index that are not serialized.
    pub fn connect<G: SequenceGraph>(&mut self, graph: &G, forest: &SnarlForest) -> Result<(), String> {
        if graph.min_node() < self.locator.min_node() || graph.max_node() > self.locator.max_node() {
            return Err(String::from("DistanceIndex: Node range does not match the graph"));
        }
        for snarl in self.snarls.iter() {
            if forest.into_which_snarl(snarl.start()).is_none() {
                return Err(format!(
                    "DistanceIndex: Snarl starting at node {} does not exist in the decomposition",
                    snarl.start().node
                ));
            }
        }
        for chain in self.chains.iter_mut() {
            let first = forest.into_which_snarl(Side::forward(chain.start_node()))
                .or_else(|| forest.into_which_snarl(Side::reverse(chain.start_node())))
                .ok_or_else(|| format!(
                    "DistanceIndex: Chain starting at node {} does not exist in the decomposition",
                    chain.start_node()
                ))?;
            let chain_slot = forest.chain_of(first).ok_or_else(|| format!(
                "DistanceIndex: Node {} does not start a chain in the decomposition",
                chain.start_node()
            ))?;
            chain.set_forward_rev(chain_forward_orientations(forest, chain_slot));
        }
        Ok(())
    }

    // Compares the persistent parts of two indexes.
    pub(crate) fn same_tables(&self, other: &DistanceIndex) -> bool {
        self.snarls == other.snarls
            && self.chains == other.chains
            && self.locator.min_node == other.locator.min_node
            && self.locator.max_node == other.locator.max_node
            && self.locator.node_to_snarl == other.locator.node_to_snarl
            && self.max_index == other.max_index
    }
}

// Returns the reverse flags of the chain-forward orientations of the boundary
// nodes of a chain.
pub(crate) fn chain_forward_orientations(forest: &SnarlForest, chain: usize) -> Vec<bool> {
    let members = forest.chain(chain).snarls();
    let mut result = Vec::with_capacity(members.len() + 1);
    result.push(forest.chain_start(chain).orientation.is_reverse());
    for (snarl, reversed) in members {
        let side = if *reversed {
            forest.snarl(*snarl).start().flip()
        } else {
            forest.snarl(*snarl).end()
        };
        result.push(side.orientation.is_reverse());
    }
    result
}

impl Serialize for DistanceIndex {
    fn serialize_header<T: io::Write>(&self, _: &mut T) -> io::Result<()> {
        Ok(())
    }

    fn serialize_body<T: io::Write>(&self, writer: &mut T) -> io::Result<()> {
        self.snarls.len().serialize(writer)?;
        for snarl in self.snarls.iter() {
            snarl.serialize(writer)?;
        }
        self.chains.len().serialize(writer)?;
        for chain in self.chains.iter() {
            chain.serialize(writer)?;
        }
        self.locator.min_node.serialize(writer)?;
        self.locator.max_node.serialize(writer)?;
        self.locator.node_to_snarl.serialize(writer)?;
        match self.max_index.as_ref() {
            Some(max_index) => max_index.serialize(writer)?,
            None => MaxIndex::empty().serialize(writer)?,
        }
        Ok(())
    }

    fn load<T: io::Read>(reader: &mut T) -> io::Result<Self> {
        let snarl_count = usize::load(reader)?;
        let mut snarls = Vec::with_capacity(snarl_count);
        let mut snarl_map = HashMap::with_capacity(snarl_count);
        for slot in 0..snarl_count {
            let snarl = SnarlIndex::load(reader)?;
            snarl_map.insert(snarl.start().pack(), slot);
            snarls.push(snarl);
        }

        let chain_count = usize::load(reader)?;
        let mut chains = Vec::with_capacity(chain_count);
        let mut chain_map = HashMap::with_capacity(chain_count);
        for slot in 0..chain_count {
            let chain = ChainIndex::load(reader)?;
            chain_map.insert(chain.start_node(), slot);
            chains.push(chain);
        }

        let min_node = usize::load(reader)?;
        let max_node = usize::load(reader)?;
        if min_node > max_node {
            return Err(Error::new(ErrorKind::InvalidData, "DistanceIndex: Invalid node range"));
        }
        let node_to_snarl = IntVector::load(reader)?;
        if node_to_snarl.len() != max_node - min_node + 1 {
            return Err(Error::new(ErrorKind::InvalidData, "DistanceIndex: Node-to-snarl vector does not cover the node range"));
        }
        let mut locator = NodeLocator::new(min_node, max_node);
        locator.node_to_snarl = node_to_snarl;

        let max_index = MaxIndex::load(reader)?;
        let max_index = if max_index.is_empty() { None } else { Some(max_index) };

        Ok(DistanceIndex {
            snarls, chains, locator, snarl_map, chain_map, max_index,
        })
    }

    fn size_in_elements(&self) -> usize {
        let mut result = 2;
        for snarl in self.snarls.iter() {
            result += snarl.size_in_elements();
        }
        for chain in self.chains.iter() {
            result += chain.size_in_elements();
        }
        result += 2 + self.locator.node_to_snarl.size_in_elements();
        result += match self.max_index.as_ref() {
            Some(max_index) => max_index.size_in_elements(),
            None => MaxIndex::empty().size_in_elements(),
        };
        result
    }
}

//-----------------------------------------------------------------------------
