//! Minimum distance queries.
//!
//! A query starts from the snarls containing the two positions, walks both
//! ancestor paths to the lowest common ancestor in the decomposition, and
//! combines the distances to the boundaries at every level using the packed
//! tables. The climb continues past the common ancestor to the root, because
//! a shorter walk may wrap around through an enclosing snarl or chain.
//!
//! Distances are measured in base pairs over the closed interval between the
//! two positions: two positions on the same node and strand with offsets
//! `a <= b` are at distance `b - a + 1`, and the empty walk does not exist.

use crate::graph::SequenceGraph;
use crate::index::DistanceIndex;
use crate::snarls::SnarlForest;
use crate::support::{self, Orientation, Pos, Side};

use std::collections::HashSet;


//-----------------------------------------------------------------------------

impl DistanceIndex {
    /// Returns the minimum distance between two positions, or [`None`] if the
    /// second position cannot be reached from the first.
    ///
    /// The distance counts the bases of the walk from the first position to
    /// the second, inclusive of both endpoints. The walk leaves the first
    /// position along its orientation and arrives at the second position
    /// along its orientation.
    ///
    /// # Examples
    ///
    /// ```
    /// use snarl_distance::{DistanceIndex, MemoryGraph, SnarlForest, Side, Pos, Orientation};
    ///
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
    /// let index = DistanceIndex::new(&graph, &forest, false).unwrap();
    ///
    /// let p1 = Pos::new(1, 0, Orientation::Forward);
    /// let p2 = Pos::new(4, 1, Orientation::Forward);
    /// assert_eq!(index.min_distance(&graph, &forest, p1, p2), Some(8));
    ///
    /// // The reverse complement of the same walk.
    /// let p1 = Pos::new(4, 0, Orientation::Reverse);
    /// let p2 = Pos::new(1, 1, Orientation::Reverse);
    /// assert_eq!(index.min_distance(&graph, &forest, p1, p2), Some(8));
    /// ```
    pub fn min_distance<G: SequenceGraph>(
        &self, graph: &G, forest: &SnarlForest, p1: Pos, p2: Pos,
    ) -> Option<usize> {
        let mut best = None;
        if p1.node == p2.node && p1.orientation == p2.orientation && p1.offset <= p2.offset {
            best = Some(p2.offset - p1.offset + 1);
        }

        let snarl1 = match self.snarl_of(forest, p1.node) {
            Some(snarl) => snarl,
            None => return best,
        };
        let snarl2 = match self.snarl_of(forest, p2.node) {
            Some(snarl) => snarl,
            None => return best,
        };

        // Lowest common ancestor of the two snarls.
        let mut ancestors: HashSet<usize> = HashSet::new();
        let mut walker = Some(snarl1);
        while let Some(snarl) = walker {
            ancestors.insert(snarl);
            walker = forest.parent_of(snarl);
        }
        let mut common = None;
        let mut walker = Some(snarl2);
        while let Some(snarl) = walker {
            if ancestors.contains(&snarl) {
                common = Some(snarl);
                break;
            }
            walker = forest.parent_of(snarl);
        }

        // Distances from the positions to the boundaries of their enclosing
        // units at the level below the common ancestor.
        let (mut dl1, mut dr1, level1) = self.dists_to_ancestor(graph, forest, snarl1, common, p1, false);
        let (mut dl2, mut dr2, level2) = self.dists_to_ancestor(graph, forest, snarl2, common, p2, true);

        let (mut node1, mut rev1) = if Some(level1) != common {
            let start = forest.snarl(level1).start();
            (start.node, start.orientation.is_reverse())
        } else {
            (p1.node, false)
        };
        let (mut node2, mut rev2) = if Some(level2) != common {
            let start = forest.snarl(level2).start();
            (start.node, start.orientation.is_reverse())
        } else {
            (p2.node, false)
        };
        let end1 = forest.snarl(level1).end();
        let end2 = forest.snarl(level2).end();

        // If the two units lie on the same chain below the common ancestor,
        // the chain gives the distance directly.
        if Some(level1) != common && Some(level2) != common
            && forest.in_nontrivial_chain(level1) && forest.in_nontrivial_chain(level2)
            && forest.chain_of(level1) == forest.chain_of(level2)
        {
            let chain = forest.chain_of(level1).unwrap();
            if let Some(cd) = self.chain_table(forest, chain) {
                let side1_in = Side::new(node1, Orientation::from_is_reverse(rev1));
                let side2_in = Side::new(node2, Orientation::from_is_reverse(rev2));
                let combos = [
                    (side1_in.flip(), side2_in, dl1, dl2),
                    (side1_in.flip(), end2.flip(), dl1, dr2),
                    (end1, side2_in, dr1, dl2),
                    (end1, end2.flip(), dr1, dr2),
                ];
                for (from, to, da, db) in combos {
                    let external = cd.distance_short(graph, from, to);
                    let candidate = if from == to {
                        // The external distance is the shared node length,
                        // which both sides count once.
                        match (support::sum_dist(da, db), external) {
                            (Some(total), Some(shared)) => Some(total - shared),
                            _ => None,
                        }
                    } else {
                        support::sum3_dist(da, db, external)
                    };
                    best = support::min_dist(best, candidate);
                }
            }
        }

        let common = match common {
            Some(common) => common,
            None => return best,
        };

        // Lift the distances from the units to the boundaries of their
        // chains, so that both units are nodes in the common ancestor.
        if level1 != common && forest.in_nontrivial_chain(level1) {
            let chain = forest.chain_of(level1).unwrap();
            let side1_in = Side::new(node1, Orientation::from_is_reverse(rev1));
            if let Some((new_l, new_r, rep)) = self.lift_through_chain(
                graph, forest, chain, side1_in, end1.flip(), dl1, dr1,
            ) {
                dl1 = new_l;
                dr1 = new_r;
                node1 = rep.node;
                rev1 = rep.orientation.is_reverse();
            }
        }
        if level2 != common && forest.in_nontrivial_chain(level2) {
            let chain = forest.chain_of(level2).unwrap();
            let side2_in = Side::new(node2, Orientation::from_is_reverse(rev2));
            if let Some((new_l, new_r, rep)) = self.lift_through_chain(
                graph, forest, chain, side2_in, end2.flip(), dl2, dr2,
            ) {
                dl2 = new_l;
                dr2 = new_r;
                node2 = rep.node;
                rev2 = rep.orientation.is_reverse();
            }
        }

        // Combine the four side pairs in the common ancestor.
        if let Some(sd) = self.snarl_table(forest, common) {
            let side1 = Side::new(node1, Orientation::from_is_reverse(rev1));
            let side2 = Side::new(node2, Orientation::from_is_reverse(rev2));
            let d1 = support::sum3_dist(dr1, dl2, sd.distance_short(side1, side2));
            let d2 = support::sum3_dist(dr1, dr2, sd.distance_short(side1, side2.flip()));
            let d3 = support::sum3_dist(dl1, dl2, sd.distance_short(side1.flip(), side2));
            let d4 = support::sum3_dist(dl1, dr2, sd.distance_short(side1.flip(), side2.flip()));
            for candidate in [d1, d2, d3, d4] {
                best = support::min_dist(best, candidate);
            }

            let ends1 = sd.dist_to_ends(node1, rev1, dl1, dr1);
            dl1 = ends1.0;
            dr1 = ends1.1;
            let ends2 = sd.dist_to_ends(node2, rev2, dl2, dr2);
            dl2 = ends2.0;
            dr2 = ends2.1;
        }

        // Climb to the root: at each level, a shorter walk may wrap around
        // through the enclosing chain or snarl.
        let mut curr = common;
        let curr_ref = forest.snarl(curr);
        let mut rep = curr_ref.start();
        let mut rep_end = curr_ref.end();
        loop {
            if forest.in_nontrivial_chain(curr) {
                let chain = forest.chain_of(curr).unwrap();
                if let Some(cd) = self.chain_table(forest, chain) {
                    // Walks that leave the unit and return to it through the
                    // rest of the chain.
                    let left_loop = cd.distance_short(graph, rep.flip(), rep);
                    let through = cd.distance_short(graph, rep.flip(), rep_end.flip());
                    let right_loop = cd.distance_short(graph, rep_end, rep_end.flip());
                    let d1 = support::sum3_dist(dl1, dl2, left_loop);
                    let d2 = support::sum3_dist(dl1, dr2, through);
                    let d3 = support::sum3_dist(dr1, dl2, through);
                    let d4 = support::sum3_dist(dr1, dr2, right_loop);
                    for candidate in [d1, d2, d3, d4] {
                        best = support::min_dist(best, candidate);
                    }

                    // Lift the distances to the boundaries of the chain.
                    let chain_start = forest.chain_start(chain);
                    let chain_end_in = forest.chain_end(chain).flip();
                    let dsl = cd.distance(graph, chain_start, rep);
                    let dsr = cd.distance(graph, chain_start, rep_end.flip());
                    let der = cd.distance(graph, chain_end_in, rep_end.flip());
                    let del = cd.distance(graph, chain_end_in, rep);

                    let new_l1 = support::min_dist(support::sum_dist(dr1, dsr), support::sum_dist(dl1, dsl));
                    let new_l2 = support::min_dist(support::sum_dist(dr2, dsr), support::sum_dist(dl2, dsl));
                    let new_r1 = support::min_dist(support::sum_dist(dr1, der), support::sum_dist(dl1, del));
                    let new_r2 = support::min_dist(support::sum_dist(dr2, der), support::sum_dist(dl2, del));
                    dl1 = new_l1;
                    dl2 = new_l2;
                    dr1 = new_r1;
                    dr2 = new_r2;

                    // The chain collapses into a single unit of the parent,
                    // represented by its start node.
                    rep = chain_start;
                    rep_end = forest.chain_end(chain);
                }
            }

            let parent = match forest.parent_of(curr) {
                Some(parent) => parent,
                None => break,
            };
            if let Some(pd) = self.snarl_table(forest, parent) {
                // In the parent, the current level is a single unit entered
                // through its representative side.
                let d1 = support::sum3_dist(dl1, dl2, pd.distance_short(rep.flip(), rep));
                let d2 = support::sum3_dist(dr1, dr2, pd.distance_short(rep, rep.flip()));
                let through = pd.distance_short(rep, rep);
                let d3 = support::sum3_dist(dl1, dr2, through);
                let d4 = support::sum3_dist(dr1, dl2, through);
                for candidate in [d1, d2, d3, d4] {
                    best = support::min_dist(best, candidate);
                }

                let ends1 = pd.dist_to_ends(rep.node, rep.orientation.is_reverse(), dl1, dr1);
                dl1 = ends1.0;
                dr1 = ends1.1;
                let ends2 = pd.dist_to_ends(rep.node, rep.orientation.is_reverse(), dl2, dr2);
                dl2 = ends2.0;
                dr2 = ends2.1;
            }

            curr = parent;
            let curr_ref = forest.snarl(curr);
            rep = curr_ref.start();
            rep_end = curr_ref.end();
        }

        best
    }

    // Lifts distances from the boundaries of a unit to the boundaries of its
    // chain. Returns the new distance pair and the representative side of the
    // chain.
    #[allow(clippy::too_many_arguments)]
    fn lift_through_chain<G: SequenceGraph>(
        &self, graph: &G, forest: &SnarlForest, chain: usize,
        unit_in: Side, unit_end_in: Side,
        dist_left: Option<usize>, dist_right: Option<usize>,
    ) -> Option<(Option<usize>, Option<usize>, Side)> {
        let cd = self.chain_table(forest, chain)?;
        let chain_start = forest.chain_start(chain);
        let chain_end_in = forest.chain_end(chain).flip();

        let dsl = cd.distance(graph, chain_start, unit_in);
        let dsr = cd.distance(graph, chain_start, unit_end_in);
        let der = cd.distance(graph, chain_end_in, unit_end_in);
        let del = cd.distance(graph, chain_end_in, unit_in);

        let new_left = support::min_dist(
            support::sum_dist(dist_right, dsr),
            support::sum_dist(dist_left, dsl),
        );
        let new_right = support::min_dist(
            support::sum_dist(dist_right, der),
            support::sum_dist(dist_left, del),
        );
        Some((new_left, new_right, chain_start))
    }

    // Returns the distances from the position to the two boundaries of its
    // enclosing unit at the level just below `common`, along with the slot of
    // that unit's snarl. With no common ancestor, climbs to the root.
    //
    // For the first position (`incoming == false`) the walk leaves along the
    // position's orientation; for the second (`incoming == true`) it arrives
    // along it.
    fn dists_to_ancestor<G: SequenceGraph>(
        &self, graph: &G, forest: &SnarlForest,
        snarl: usize, common: Option<usize>, pos: Pos, incoming: bool,
    ) -> (Option<usize>, Option<usize>, usize) {
        let len = graph.sequence_len(pos.node).unwrap_or(0);
        let mut dist_left;
        let mut dist_right;
        if pos.orientation.is_reverse() {
            dist_right = Some(pos.offset + 1);
            dist_left = Some(len - pos.offset);
        } else {
            dist_left = Some(pos.offset + 1);
            dist_right = Some(len - pos.offset);
        }
        if incoming == pos.orientation.is_reverse() {
            dist_left = None;
        } else {
            dist_right = None;
        }

        if common == Some(snarl) {
            return (dist_left, dist_right, snarl);
        }

        let mut curr = snarl;
        if let Some(sd) = self.snarl_table(forest, curr) {
            let ends = sd.dist_to_ends(pos.node, false, dist_left, dist_right);
            dist_left = ends.0;
            dist_right = ends.1;
        }
        let mut rep = forest.snarl(curr).start();
        let mut rep_end_in = forest.snarl(curr).end().flip();

        loop {
            let parent = forest.parent_of(curr);
            match (parent, common) {
                (None, _) => break,
                (Some(parent), Some(common)) if parent == common => break,
                _ => {}
            }

            if forest.in_nontrivial_chain(curr) {
                let chain = forest.chain_of(curr).unwrap();
                if let Some((new_l, new_r, chain_rep)) = self.lift_through_chain(
                    graph, forest, chain, rep, rep_end_in, dist_left, dist_right,
                ) {
                    dist_left = new_l;
                    dist_right = new_r;
                    rep = chain_rep;
                }
            }

            let parent = parent.unwrap();
            if let Some(pd) = self.snarl_table(forest, parent) {
                let ends = pd.dist_to_ends(rep.node, rep.orientation.is_reverse(), dist_left, dist_right);
                dist_left = ends.0;
                dist_right = ends.1;
            }
            curr = parent;
            rep = forest.snarl(curr).start();
            rep_end_in = forest.snarl(curr).end().flip();
        }

        (dist_left, dist_right, curr)
    }
}

//-----------------------------------------------------------------------------

/// The loop primitive.
impl DistanceIndex {
    /// Returns the length of the shortest walk that traverses the edge from
    /// `from` to `to` and returns to traverse it again, or [`None`] if no
    /// such walk exists.
    ///
    /// The length counts every base of the closing walk once.
    pub fn loop_distance<G: SequenceGraph>(
        &self, graph: &G, forest: &SnarlForest, from: Side, to: Side,
    ) -> Option<usize> {
        let from_len = graph.sequence_len(from.node)?;
        if from_len == 0 {
            return None;
        }
        self.min_distance(
            graph, forest,
            Pos::new(to.node, 0, to.orientation),
            Pos::new(from.node, from_len - 1, from.orientation),
        )
    }

    /// Returns the length of the shortest cyclic walk through the given node,
    /// or [`None`] if the node does not lie on a cycle.
    pub fn node_loop_distance<G: SequenceGraph>(
        &self, graph: &G, forest: &SnarlForest, node: usize,
    ) -> Option<usize> {
        let mut best = None;
        let from = Side::forward(node);
        for next in graph.successors(from) {
            best = support::min_dist(best, self.loop_distance(graph, forest, from, next));
        }
        best
    }
}

//-----------------------------------------------------------------------------
