//! Bottom-up construction of the distance index.
//!
//! The builder indexes one chain at a time. For each snarl in the chain it
//! runs a Dijkstra search over the snarl's net graph from every oriented
//! unit, using the lengths of already-indexed children as edge weights and
//! recursing into children on first encounter. After the snarls of a chain
//! are indexed, the chain prefix sums and the two loop vectors are filled in
//! two passes.

use crate::graph::SequenceGraph;
use crate::index::{self, ChainIndex, DistanceIndex, NodeLocator, SnarlIndex};
use crate::snarls::{Child, NetGraph, SnarlForest};
use crate::support::{self, Side};

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};

//-----------------------------------------------------------------------------

// Builds the minimum distance index.
pub(crate) fn build<G: SequenceGraph>(
    graph: &G, forest: &SnarlForest, verbose: bool,
) -> Result<DistanceIndex, String> {
    let (min_node, max_node) = if graph.min_node() == 0 {
        (1, 1)
    } else {
        (graph.min_node(), graph.max_node())
    };
    let mut builder = Builder {
        graph, forest, verbose,
        index: DistanceIndex {
            snarls: Vec::new(),
            chains: Vec::new(),
            locator: NodeLocator::new(min_node, max_node),
            snarl_map: std::collections::HashMap::new(),
            chain_map: std::collections::HashMap::new(),
            max_index: None,
        },
    };

    if verbose {
        eprintln!("Building the distance index");
    }
    for top in forest.top_level_snarls() {
        if builder.snarl_slot(top).is_some() {
            continue;
        }
        if forest.in_nontrivial_chain(top) {
            let chain = forest.chain_of(top).unwrap();
            builder.index_chain(chain)?;
        } else {
            builder.index_snarl(top)?;
        }
    }
    builder.fill_node_to_snarl()?;
    if verbose {
        eprintln!(
            "Indexed {} snarls and {} chains",
            builder.index.snarls.len(), builder.index.chains.len()
        );
    }

    Ok(builder.index)
}

//-----------------------------------------------------------------------------

struct Builder<'a, G: SequenceGraph> {
    graph: &'a G,
    forest: &'a SnarlForest,
    verbose: bool,
    index: DistanceIndex,
}

impl<'a, G: SequenceGraph> Builder<'a, G> {
    // Returns the table slot for the given snarl, if it has been indexed.
    fn snarl_slot(&self, snarl: usize) -> Option<usize> {
        let key = self.forest.snarl(snarl).start().pack();
        self.index.snarl_map.get(&key).cloned()
    }

    // Returns the table slot for the given chain, if it has been indexed.
    fn chain_slot(&self, chain: usize) -> Option<usize> {
        let key = self.forest.chain_start(chain).node;
        self.index.chain_map.get(&key).cloned()
    }

    // Returns the packed side entering the parent snarl of the given snarl.
    fn parent_rep(&self, snarl: usize) -> usize {
        match self.forest.parent_of(snarl) {
            Some(parent) => self.forest.snarl(parent).start().pack(),
            None => 0,
        }
    }

    // Returns the boundary sides of the snarl in chain coordinates: the left
    // boundary pointing in and the right boundary pointing out.
    fn chain_bounds(&self, snarl: usize, reversed: bool) -> (Side, Side) {
        let snarl_ref = self.forest.snarl(snarl);
        if reversed {
            (snarl_ref.end().flip(), snarl_ref.start().flip())
        } else {
            (snarl_ref.start(), snarl_ref.end())
        }
    }

    //-------------------------------------------------------------------------

    // Indexes a nontrivial chain and returns its length.
    fn index_chain(&mut self, chain: usize) -> Result<Option<usize>, String> {
        if let Some(slot) = self.chain_slot(chain) {
            return Ok(self.index.chains[slot].chain_length());
        }
        if self.verbose {
            eprintln!("Indexing the chain starting at node {}", self.forest.chain_start(chain).node);
        }

        let members: Vec<(usize, bool)> = self.forest.chain(chain).snarls().to_vec();
        let count = members.len();

        // Index the member snarls and collect the chain-coordinate distances.
        let mut through: Vec<usize> = Vec::with_capacity(count);
        let mut fd_loops: Vec<Option<usize>> = Vec::with_capacity(count);
        let mut rev_loops: Vec<Option<usize>> = Vec::with_capacity(count);
        let mut round_trips: Vec<Option<usize>> = Vec::with_capacity(count);
        for (snarl, reversed) in members.iter() {
            let slot = self.index_snarl(*snarl)?;
            let (left_in, right_out) = self.chain_bounds(*snarl, *reversed);
            let table = &self.index.snarls[slot];
            let dist = table.distance(left_in, right_out).ok_or_else(|| format!(
                "Builder: Chain member starting at node {} has no through path", left_in.node
            ))?;
            through.push(dist);
            fd_loops.push(table.distance(left_in, left_in.flip()));
            rev_loops.push(table.distance(right_out.flip(), right_out));
            round_trips.push(support::sum_dist(
                table.distance(right_out.flip(), left_in.flip()),
                table.distance(left_in, right_out),
            ));
        }

        // Prefix sums over the entry sides of the boundary nodes, with a
        // final entry for the full chain length.
        let mut prefix_sum: Vec<u64> = Vec::with_capacity(count + 2);
        prefix_sum.push(1);
        for dist in through.iter() {
            prefix_sum.push(prefix_sum.last().unwrap() + (*dist as u64));
        }
        let last_node = self.forest.chain_boundary_node(chain, count);
        let last_len = self.graph.sequence_len(last_node).ok_or_else(|| format!(
            "Builder: Chain boundary node {} is not in the graph", last_node
        ))?;
        prefix_sum.push(prefix_sum.last().unwrap() + (last_len as u64));

        let circular = self.forest.chain_is_circular(chain);

        // Reverse loops in a forward pass. The first entry only has a local
        // loop through the first snarl, or through the last one if the chain
        // is circular.
        let mut loop_rev: Vec<Option<usize>> = vec![None; count + 1];
        {
            let (first_snarl, first_reversed) = members[0];
            let (left_in, _) = self.chain_bounds(first_snarl, first_reversed);
            let slot = self.snarl_slot(first_snarl).unwrap();
            let mut first = self.index.snarls[slot].distance(left_in.flip(), left_in);
            if circular {
                first = support::min_dist(first, rev_loops[count - 1]);
            }
            loop_rev[0] = first;
        }
        for rank in 0..count {
            loop_rev[rank + 1] = support::min_dist(
                rev_loops[rank],
                support::sum_dist(loop_rev[rank], round_trips[rank]),
            );
        }

        // Forward loops in a backward pass.
        let mut loop_fd: Vec<Option<usize>> = vec![None; count + 1];
        {
            let (last_snarl, last_reversed) = members[count - 1];
            let (_, right_out) = self.chain_bounds(last_snarl, last_reversed);
            let slot = self.snarl_slot(last_snarl).unwrap();
            let mut last = self.index.snarls[slot].distance(right_out, right_out.flip());
            if circular {
                last = support::min_dist(last, fd_loops[0]);
            }
            loop_fd[count] = last;
        }
        for rank in (0..count).rev() {
            loop_fd[rank] = support::min_dist(
                fd_loops[rank],
                support::sum_dist(loop_fd[rank + 1], round_trips[rank]),
            );
        }

        // Boundary nodes in rank order; a circular chain stores the shared
        // node only at rank 0.
        let distinct = if circular { count } else { count + 1 };
        let mut boundary_nodes: Vec<usize> = Vec::with_capacity(distinct);
        for rank in 0..distinct {
            boundary_nodes.push(self.forest.chain_boundary_node(chain, rank));
        }

        let parent = match self.forest.chain(chain).snarls().first()
            .and_then(|(snarl, _)| self.forest.parent_of(*snarl))
        {
            Some(parent) => self.forest.snarl(parent).start().pack(),
            None => 0,
        };

        let table = ChainIndex::new(
            self.forest.chain_start(chain).node,
            self.forest.chain_end(chain).node,
            parent,
            prefix_sum,
            loop_fd.iter().map(|dist| support::dist_to_stored(*dist)).collect(),
            loop_rev.iter().map(|dist| support::dist_to_stored(*dist)).collect(),
            boundary_nodes,
            index::chain_forward_orientations(self.forest, chain),
        );
        let length = table.chain_length();

        let table_slot = self.index.chains.len();
        self.index.chain_map.insert(table.start_node(), table_slot);
        self.index.chains.push(table);
        for rank in 0..=count {
            let node = self.forest.chain_boundary_node(chain, rank);
            if self.index.locator.chain_assignment(node).is_none() {
                self.index.locator.set_chain_assignment(node, table_slot, rank);
            }
        }

        Ok(length)
    }

    //-------------------------------------------------------------------------

    // Indexes a snarl and returns its table slot.
    fn index_snarl(&mut self, snarl: usize) -> Result<usize, String> {
        if let Some(slot) = self.snarl_slot(snarl) {
            return Ok(slot);
        }

        let snarl_ref = self.forest.snarl(snarl);
        let (start, end) = (snarl_ref.start(), snarl_ref.end());
        let ng = NetGraph::new(self.graph, self.forest, snarl);

        // Stable unit order: start first, end last, interior units in between.
        let unit_nodes = ng.units();
        let mut units: Vec<Side> = Vec::with_capacity(unit_nodes.len());
        for node in unit_nodes.iter() {
            if !self.graph.has_node(*node) {
                return Err(format!(
                    "Builder: Node {} referenced by the snarl starting at node {} is not in the graph",
                    node, start.node
                ));
            }
            if *node == start.node {
                units.push(start);
            } else if *node == end.node {
                units.push(end);
            } else {
                units.push(Side::forward(*node));
            }
        }
        let table = SnarlIndex::new(start, end, self.parent_rep(snarl), units.clone());
        let mut values: Vec<u64> = vec![0; SnarlIndex::vector_len(units.len())];

        // Dijkstra from every oriented unit.
        for unit in units.iter() {
            for origin in [*unit, unit.flip()] {
                self.snarl_dijkstra(&ng, &table, origin, &mut values)?;
            }
        }

        let mut table = table;
        table.set_distances(&values);

        let slot = self.index.snarls.len();
        self.index.snarl_map.insert(start.pack(), slot);
        self.index.snarls.push(table);

        // Locator assignments. Interior units are primary here; the second
        // boundary in chain order claims this snarl as primary, and the first
        // boundary falls back to a secondary assignment if it already has a
        // primary one.
        for (rank, side) in units.iter().enumerate() {
            if side.node != start.node && side.node != end.node {
                self.index.locator.set_primary(side.node, slot, rank);
            }
        }
        let reversed = self.forest.chain_link_of(snarl).map(|(_, _, reversed)| reversed).unwrap_or(false);
        let (first_node, second_node) = if reversed {
            (end.node, start.node)
        } else {
            (start.node, end.node)
        };
        let rank_of = |node: usize| units.iter().position(|side| side.node == node).unwrap();
        self.index.locator.set_primary(second_node, slot, rank_of(second_node));
        if first_node != second_node {
            if self.index.locator.primary_snarl(first_node).is_none() {
                self.index.locator.set_primary(first_node, slot, rank_of(first_node));
            } else {
                self.index.locator.set_secondary(first_node, slot, rank_of(first_node));
            }
        }

        Ok(slot)
    }

    // A single Dijkstra run over the net graph from one oriented unit side.
    fn snarl_dijkstra(
        &mut self, ng: &NetGraph<G>, table: &SnarlIndex, origin: Side, values: &mut [u64],
    ) -> Result<(), String> {
        let start = ng.start();
        let end = ng.end();

        let mut heap: BinaryHeap<Reverse<(usize, Side)>> = BinaryHeap::new();
        let mut seen: HashSet<Side> = HashSet::new();
        heap.push(Reverse((0, origin)));
        let mut first = true;

        while let Some(Reverse((dist, curr))) = heap.pop() {
            if seen.contains(&curr) {
                continue;
            }
            if !first {
                values[table.pair_offset(origin, curr)] = support::dist_to_stored(Some(dist));
                seen.insert(curr);
            }

            // Length of the unit and the distance for entering and leaving it
            // on the same side.
            let (unit_len, loop_dist) = self.unit_length_and_loop(ng, curr)?;

            if curr == origin {
                values[table.length_offset(curr.node)] = support::dist_to_stored(unit_len);
            }

            // A same-side loop in the unit makes the sides reachable from the
            // flipped unit reachable as well.
            if let Some(loop_dist) = loop_dist {
                if !first {
                    ng.follow_edges(curr.flip(), |next| {
                        heap.push(Reverse((dist + loop_dist, next)));
                        true
                    });
                }
            }

            // A fresh start seeds its neighbors at distance 0 to preserve the
            // end-of-start to start-of-next semantics. A unit with no through
            // path cannot be traversed on later steps.
            if curr == origin || (unit_len.is_none() && first) {
                ng.follow_edges(curr, |next| {
                    heap.push(Reverse((0, next)));
                    true
                });
            } else if let Some(unit_len) = unit_len {
                ng.follow_edges(curr, |next| {
                    heap.push(Reverse((dist + unit_len, next)));
                    true
                });
            }

            // Edges between the boundary nodes bypass the net graph when the
            // walk leaves the snarl.
            let leaving = (curr.node == start.node && curr.orientation == start.orientation.flip())
                || (curr.node == end.node && curr.orientation == end.orientation);
            if leaving {
                let next_dist = if curr == origin { 0 } else { dist + unit_len.unwrap_or(0) };
                self.graph.follow_edges(curr, |next| {
                    if next.node == start.node || next.node == end.node {
                        heap.push(Reverse((next_dist, next)));
                    }
                    true
                });
            }

            first = false;
        }

        Ok(())
    }

    // Returns the traversal length of the unit occupied in the given
    // orientation and the distance for entering and leaving the unit on the
    // same side, recursing into children that have not been indexed yet.
    fn unit_length_and_loop(
        &mut self, ng: &NetGraph<G>, curr: Side,
    ) -> Result<(Option<usize>, Option<usize>), String> {
        let child = ng.child_at(curr.node);
        match child {
            Some(Child::Chain(chain)) => {
                let length = match self.chain_slot(chain) {
                    Some(slot) => self.index.chains[slot].chain_length(),
                    None => self.index_chain(chain)?,
                };
                let slot = self.chain_slot(chain).unwrap();
                let table = &self.index.chains[slot];
                let chain_start = self.forest.chain_start(chain);
                let chain_end = self.forest.chain_end(chain);
                let loop_dist = if curr.orientation == chain_start.orientation {
                    support::sum_dist(
                        table.loop_fd_at(0),
                        self.graph.sequence_len(chain_start.node),
                    )
                } else {
                    support::sum_dist(
                        table.loop_rev_at(table.snarl_count()),
                        self.graph.sequence_len(chain_end.node),
                    )
                };
                Ok((length, loop_dist))
            }
            Some(Child::Snarl(child_snarl)) => {
                let slot = self.index_snarl(child_snarl)?;
                let table = &self.index.snarls[slot];
                let child_start = table.start();
                let child_end = table.end();
                let length = table.snarl_length();
                let loop_dist = if curr.orientation == child_start.orientation {
                    support::sum_dist(
                        table.distance(child_start, child_start.flip()),
                        self.graph.sequence_len(child_start.node),
                    )
                } else {
                    support::sum_dist(
                        table.distance(child_end.flip(), child_end),
                        self.graph.sequence_len(child_end.node),
                    )
                };
                Ok((length, loop_dist))
            }
            None => {
                let length = self.graph.sequence_len(curr.node);
                if length.is_none() {
                    return Err(format!("Builder: Node {} is not in the graph", curr.node));
                }
                Ok((length, None))
            }
        }
    }

    //-------------------------------------------------------------------------

    // Fills the node-to-snarl mapping: every node that is not a collapsed
    // child in the net graph of a snarl maps to the packed entry side of that
    // snarl.
    fn fill_node_to_snarl(&mut self) -> Result<(), String> {
        let min_node = self.index.locator.min_node();
        let max_node = self.index.locator.max_node();
        let mut values: Vec<u64> = vec![0; max_node - min_node + 1];
        for snarl in 0..self.forest.snarl_count() {
            let entry = self.forest.snarl(snarl).start().pack() as u64;
            let ng = NetGraph::new(self.graph, self.forest, snarl);
            for node in ng.units() {
                if ng.child_at(node).is_none() {
                    values[node - min_node] = entry;
                }
            }
        }
        self.index.locator.set_node_to_snarl(&values);
        Ok(())
    }
}

//-----------------------------------------------------------------------------
