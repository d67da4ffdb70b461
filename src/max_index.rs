//! The maximum distance structure: a cheap upper bound for distance queries.
//!
//! The graph splits into components: nodes on cycles are grouped into cyclic
//! components (connected by edges that lie on cycles), and the remaining
//! nodes form acyclic components. For each acyclic component, the structure
//! stores the minimum and maximum number of bases on a walk from each node to
//! the boundary of the component. The upper bound query combines the stored
//! values in constant time. Positions in different components or in a cyclic
//! component get the configured cap; walks that leave an acyclic component
//! and return to it are also bounded by the cap.

use crate::graph::SequenceGraph;
use crate::index::DistanceIndex;
use crate::snarls::SnarlForest;
use crate::support::{self, Pos, Side};

use simple_sds::int_vector::IntVector;
use simple_sds::ops::{Vector, Access};
use simple_sds::serialize::Serialize;

use std::collections::{HashMap, HashSet, VecDeque};
use std::io;

#[cfg(test)]
mod tests;

//-----------------------------------------------------------------------------

/// Upper bounds for distances between graph positions.
///
/// Built as an optional extension of the minimum distance index, as the
/// component labeling uses minimum distance queries to find cycles. The
/// stored vectors cover the node range of the index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MaxIndex {
    // Number of cyclic components; component identifiers `1..=num_cycles`
    // are cyclic.
    num_cycles: usize,
    // The bound above which the estimate does not refine.
    cap: usize,
    node_to_component: IntVector,
    min_distances: IntVector,
    max_distances: IntVector,
}

impl MaxIndex {
    /// Returns the configured cap.
    #[inline]
    pub fn cap(&self) -> usize {
        self.cap
    }

    /// Returns the number of cyclic components.
    #[inline]
    pub fn num_cycles(&self) -> usize {
        self.num_cycles
    }

    /// Returns `true` if the structure is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min_distances.is_empty()
    }

    // An empty structure, used as a placeholder in serialization.
    pub(crate) fn empty() -> MaxIndex {
        MaxIndex {
            num_cycles: 0,
            cap: 0,
            node_to_component: IntVector::new(1).unwrap(),
            min_distances: IntVector::new(1).unwrap(),
            max_distances: IntVector::new(1).unwrap(),
        }
    }

    /// Returns the component identifier of the node, with `min_node` as the
    /// start of the node range.
    pub fn component_of(&self, min_node: usize, node: usize) -> usize {
        self.node_to_component.get(node - min_node) as usize
    }

    // The upper bound query; see `DistanceIndex::max_distance`.
    pub(crate) fn max_distance_impl<G: SequenceGraph>(
        &self, graph: &G, min_node: usize, p1: Pos, p2: Pos,
    ) -> usize {
        let len1 = Self::position_margin(graph, p1);
        let len2 = Self::position_margin(graph, p2);

        let comp1 = self.node_to_component.get(p1.node - min_node) as usize;
        let comp2 = self.node_to_component.get(p2.node - min_node) as usize;
        if comp1 != comp2 || comp1 <= self.num_cycles {
            return self.cap;
        }

        let max1 = self.max_distances.get(p1.node - min_node) as usize;
        let max2 = self.max_distances.get(p2.node - min_node) as usize;
        let min1 = self.min_distances.get(p1.node - min_node) as usize;
        let min2 = self.min_distances.get(p2.node - min_node) as usize;

        let d1 = max1.saturating_sub(min2);
        let d2 = max2.saturating_sub(min1);
        len1 + len2 + std::cmp::max(d1, d2)
    }

    // The larger of the two offset distances within the node, plus one.
    fn position_margin<G: SequenceGraph>(graph: &G, pos: Pos) -> usize {
        let len = graph.sequence_len(pos.node).unwrap_or(0);
        std::cmp::max(pos.offset, len - pos.offset) + 1
    }
}

//-----------------------------------------------------------------------------

/// Queries on the full index.
impl DistanceIndex {
    /// Returns an upper bound for the distance between two positions, or
    /// [`None`] if the index was built without the maximum distance
    /// structure.
    ///
    /// The bound is the cap when the positions are in different components or
    /// in a cyclic component.
    pub fn max_distance<G: SequenceGraph>(&self, graph: &G, p1: Pos, p2: Pos) -> Option<usize> {
        let max_index = self.max_index.as_ref()?;
        Some(max_index.max_distance_impl(graph, self.locator.min_node(), p1, p2))
    }
}

//-----------------------------------------------------------------------------

// Construction.

impl MaxIndex {
    // Builds the maximum distance structure over the components of the graph.
    pub(crate) fn new<G: SequenceGraph>(
        graph: &G, forest: &SnarlForest, index: &DistanceIndex, cap: usize, verbose: bool,
    ) -> Result<MaxIndex, String> {
        if cap == 0 {
            return Err(String::from("MaxIndex: The cap must be positive"));
        }
        if verbose {
            eprintln!("Building the maximum distance structure with cap {}", cap);
        }

        let min_node = index.locator().min_node();
        let size = index.locator().max_node() - min_node + 1;
        let mut builder = MaxBuilder {
            graph, forest, index, cap, min_node,
            component: vec![0; size],
            max_dists: vec![0; size],
            min_fd: vec![0; size],
            min_rev: vec![0; size],
            cyclic: HashMap::new(),
            edge_loops: HashMap::new(),
        };

        let mut nodes: Vec<usize> = Vec::new();
        graph.for_each_node(|node| {
            nodes.push(node);
            true
        });
        for node in nodes.iter() {
            let on_cycle = index.node_loop_distance(graph, forest, *node).is_some();
            builder.cyclic.insert(*node, on_cycle);
        }

        // Cyclic components first, then the acyclic ones.
        let mut next_component = 0;
        for node in nodes.iter() {
            if builder.component_of(*node) == 0 && builder.cyclic[node] {
                next_component += 1;
                builder.label_cyclic(*node, next_component);
            }
        }
        let num_cycles = next_component;
        for node in nodes.iter() {
            if builder.component_of(*node) == 0 {
                next_component += 1;
                builder.label_acyclic(*node, next_component);
            }
        }
        if verbose {
            eprintln!(
                "Found {} cyclic and {} acyclic components",
                num_cycles, next_component - num_cycles
            );
        }

        let mut min_distances: Vec<u64> = vec![0; builder.min_fd.len()];
        for offset in 0..min_distances.len() {
            let fd = builder.min_fd[offset];
            let rev = builder.min_rev[offset];
            min_distances[offset] = if fd == 0 {
                rev
            } else if rev == 0 {
                fd
            } else {
                std::cmp::min(fd, rev)
            };
        }

        Ok(MaxIndex {
            num_cycles: num_cycles as usize,
            cap,
            node_to_component: support::compress(&builder.component),
            min_distances: support::compress(&min_distances),
            max_distances: support::compress(&builder.max_dists),
        })
    }
}

//-----------------------------------------------------------------------------

struct MaxBuilder<'a, G: SequenceGraph> {
    graph: &'a G,
    forest: &'a SnarlForest,
    index: &'a DistanceIndex,
    cap: usize,
    min_node: usize,
    component: Vec<u64>,
    max_dists: Vec<u64>,
    min_fd: Vec<u64>,
    min_rev: Vec<u64>,
    cyclic: HashMap<usize, bool>,
    edge_loops: HashMap<(Side, Side), bool>,
}

impl<'a, G: SequenceGraph> MaxBuilder<'a, G> {
    fn component_of(&self, node: usize) -> u64 {
        self.component[node - self.min_node]
    }

    // Does the edge lie on a cycle?
    fn edge_on_loop(&mut self, from: Side, to: Side) -> bool {
        if let Some(cached) = self.edge_loops.get(&(from, to)) {
            return *cached;
        }
        let result = self.index.loop_distance(self.graph, self.forest, from, to).is_some();
        self.edge_loops.insert((from, to), result);
        self.edge_loops.insert((to.flip(), from.flip()), result);
        result
    }

    // Labels the cyclic component of the given node: all nodes connected to
    // it by edges that lie on cycles.
    fn label_cyclic(&mut self, node: usize, id: u64) {
        let mut queue: VecDeque<usize> = VecDeque::new();
        self.component[node - self.min_node] = id;
        queue.push_back(node);
        while let Some(curr) = queue.pop_front() {
            for side in [Side::forward(curr), Side::reverse(curr)] {
                for next in self.graph.successors(side) {
                    if self.component_of(next.node) != 0 || !self.cyclic[&next.node] {
                        continue;
                    }
                    if self.edge_on_loop(side, next) {
                        self.component[next.node - self.min_node] = id;
                        queue.push_back(next.node);
                    }
                }
            }
        }
    }

    // Does the edge stay within an acyclic component?
    fn acyclic_edge(&mut self, from: Side, to: Side) -> bool {
        !self.cyclic[&to.node] && !self.edge_on_loop(from, to)
    }

    // Labels the acyclic component of the given node and fills in the
    // distance arrays for it.
    fn label_acyclic(&mut self, node: usize, id: u64) {
        // Discover the component.
        let mut members: Vec<usize> = Vec::new();
        let mut queue: VecDeque<usize> = VecDeque::new();
        self.component[node - self.min_node] = id;
        members.push(node);
        queue.push_back(node);
        while let Some(curr) = queue.pop_front() {
            for side in [Side::forward(curr), Side::reverse(curr)] {
                for next in self.graph.successors(side) {
                    if self.component_of(next.node) == 0 && self.acyclic_edge(side, next) {
                        self.component[next.node - self.min_node] = id;
                        members.push(next.node);
                        queue.push_back(next.node);
                    }
                }
            }
        }

        // The sides of the component form two mirror-image DAGs under the
        // component edges. Walk both in topological order, maintaining the
        // minimum and maximum number of bases from the start of the walk.
        let mut in_degree: HashMap<Side, usize> = HashMap::new();
        for member in members.iter() {
            for side in [Side::forward(*member), Side::reverse(*member)] {
                let mut degree = 0;
                for next in self.graph.successors(side.flip()) {
                    if self.component_of(next.node) == id && self.acyclic_edge(side.flip(), next) {
                        degree += 1;
                    }
                }
                in_degree.insert(side, degree);
            }
        }

        let mut incoming: HashMap<Side, (u64, u64)> = HashMap::new();
        let mut ready: VecDeque<Side> = VecDeque::new();
        for (side, degree) in in_degree.iter() {
            if *degree == 0 {
                incoming.insert(*side, (1, 1));
                ready.push_back(*side);
            }
        }

        // Excursion edges: edges on which a walk leaves the component (or
        // stays in it through a cycle), with the maximum distance past the
        // exiting node.
        let mut exits: Vec<(Side, u64)> = Vec::new();

        while let Some(side) = ready.pop_front() {
            let (min_dist, max_dist) = incoming[&side];
            self.record(side, min_dist, max_dist);

            let node_len = self.graph.sequence_len(side.node).unwrap_or(0) as u64;
            for next in self.graph.successors(side) {
                if self.component_of(next.node) == id && self.acyclic_edge(side, next) {
                    let entry = incoming.entry(next).or_insert((u64::MAX, 0));
                    entry.0 = std::cmp::min(entry.0, min_dist + node_len);
                    entry.1 = std::cmp::max(entry.1, max_dist + node_len);
                    let degree = in_degree.get_mut(&next).unwrap();
                    *degree -= 1;
                    if *degree == 0 {
                        ready.push_back(next);
                    }
                } else {
                    exits.push((next, max_dist + node_len));
                }
            }
        }

        // Walks that leave the component are bounded by the cap: anything
        // they can reach back in the component continues from
        // `max + node_len + cap` with no minimum contribution.
        let reentries = self.find_reentries(id, &exits);
        for (side, max_dist) in reentries {
            self.propagate_max(id, side, max_dist);
        }
    }

    // Records the walk values at a side. Walks in reverse orientation
    // measure distances towards the low end of the component.
    fn record(&mut self, side: Side, min_dist: u64, max_dist: u64) {
        let offset = side.node - self.min_node;
        if side.orientation.is_reverse() {
            let old = self.min_fd[offset];
            self.min_fd[offset] = if old == 0 { min_dist } else { std::cmp::min(old, min_dist) };
        } else {
            let old = self.min_rev[offset];
            self.min_rev[offset] = if old == 0 { min_dist } else { std::cmp::min(old, min_dist) };
        }
        self.max_dists[offset] = std::cmp::max(self.max_dists[offset], max_dist);
    }

    // Finds the sides where walks that left the component re-enter it, with
    // their capped maximum distances. An exit is the first side past the
    // component boundary (or a side reached through a cycle within it).
    fn find_reentries(&mut self, id: u64, exits: &[(Side, u64)]) -> Vec<(Side, u64)> {
        let mut result: Vec<(Side, u64)> = Vec::new();
        for (exit, max_dist) in exits {
            let bound = max_dist + (self.cap as u64);
            if self.component_of(exit.node) == id {
                // The edge stayed in the component but went through a cycle.
                result.push((*exit, bound));
                continue;
            }
            let mut seen: HashSet<Side> = HashSet::new();
            let mut queue: VecDeque<Side> = VecDeque::new();
            seen.insert(*exit);
            queue.push_back(*exit);
            while let Some(curr) = queue.pop_front() {
                for next in self.graph.successors(curr) {
                    if self.component_of(next.node) == id {
                        result.push((next, bound));
                    } else if seen.insert(next) {
                        queue.push_back(next);
                    }
                }
            }
        }
        result
    }

    // Propagates a maximum distance bound through the component.
    fn propagate_max(&mut self, id: u64, side: Side, max_dist: u64) {
        let offset = side.node - self.min_node;
        if self.max_dists[offset] >= max_dist {
            return;
        }
        self.max_dists[offset] = max_dist;
        let node_len = self.graph.sequence_len(side.node).unwrap_or(0) as u64;
        let mut boundary: Vec<(Side, u64)> = Vec::new();
        for next in self.graph.successors(side) {
            if self.component_of(next.node) == id && self.acyclic_edge(side, next) {
                boundary.push((next, max_dist + node_len));
            }
        }
        for (next, dist) in boundary {
            self.propagate_max(id, next, dist);
        }
    }
}

//-----------------------------------------------------------------------------

impl Serialize for MaxIndex {
    fn serialize_header<T: io::Write>(&self, _: &mut T) -> io::Result<()> {
        Ok(())
    }

    fn serialize_body<T: io::Write>(&self, writer: &mut T) -> io::Result<()> {
        self.num_cycles.serialize(writer)?;
        self.cap.serialize(writer)?;
        self.node_to_component.serialize(writer)?;
        self.min_distances.serialize(writer)?;
        self.max_distances.serialize(writer)?;
        Ok(())
    }

    fn load<T: io::Read>(reader: &mut T) -> io::Result<Self> {
        let num_cycles = usize::load(reader)?;
        let cap = usize::load(reader)?;
        let node_to_component = IntVector::load(reader)?;
        let min_distances = IntVector::load(reader)?;
        let max_distances = IntVector::load(reader)?;
        if min_distances.len() != node_to_component.len() || max_distances.len() != node_to_component.len() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "MaxIndex: Distance vectors do not match the component vector",
            ));
        }
        Ok(MaxIndex {
            num_cycles, cap, node_to_component, min_distances, max_distances,
        })
    }

    fn size_in_elements(&self) -> usize {
        2 + self.node_to_component.size_in_elements()
            + self.min_distances.size_in_elements()
            + self.max_distances.size_in_elements()
    }
}

//-----------------------------------------------------------------------------
