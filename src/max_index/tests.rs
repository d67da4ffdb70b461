use super::*;

use crate::graph::MemoryGraph;
use crate::support::Orientation;

use simple_sds::serialize;

//-----------------------------------------------------------------------------

fn linear_chain() -> (MemoryGraph, SnarlForest) {
    let graph = MemoryGraph::from_parts(
        &[(1, 5), (2, 3), (3, 7)],
        &[
            (Side::forward(1), Side::forward(2)),
            (Side::forward(2), Side::forward(3)),
        ],
    );
    let mut forest = SnarlForest::new();
    let first = forest.insert_snarl(Side::forward(1), Side::forward(2));
    let second = forest.insert_snarl(Side::forward(2), Side::forward(3));
    forest.insert_chain(&[(first, false), (second, false)]).unwrap();
    (graph, forest)
}

fn cycle() -> (MemoryGraph, SnarlForest) {
    let graph = MemoryGraph::from_parts(
        &[(1, 2), (2, 3), (3, 3), (4, 3), (5, 3), (6, 2)],
        &[
            (Side::forward(1), Side::forward(2)),
            (Side::forward(2), Side::forward(3)),
            (Side::forward(3), Side::forward(4)),
            (Side::forward(4), Side::forward(5)),
            (Side::forward(5), Side::forward(2)),
            (Side::forward(4), Side::forward(6)),
        ],
    );
    let mut forest = SnarlForest::new();
    forest.insert_snarl(Side::forward(1), Side::forward(6));
    (graph, forest)
}

//-----------------------------------------------------------------------------

#[test]
fn acyclic_component() {
    let (graph, forest) = linear_chain();
    let index = DistanceIndex::with_maximum(&graph, &forest, 100, false).unwrap();
    let max_index = index.max_index().unwrap();

    assert_eq!(max_index.cap(), 100, "Invalid cap");
    assert_eq!(max_index.num_cycles(), 0, "A linear chain has cyclic components");
    let comp = max_index.component_of(1, 1);
    assert!(comp > 0, "Node 1 is not assigned to a component");
    for node in 2..=3 {
        assert_eq!(max_index.component_of(1, node), comp, "Node {} is in a different component", node);
    }

    // The upper bound dominates the exact distance.
    for offset1 in [0, 2, 4] {
        for offset2 in [0, 3, 6] {
            let p1 = Pos::new(1, offset1, Orientation::Forward);
            let p2 = Pos::new(3, offset2, Orientation::Forward);
            let lower = index.min_distance(&graph, &forest, p1, p2);
            let upper = index.max_distance(&graph, p1, p2);
            assert!(
                upper.unwrap() >= lower.unwrap(),
                "Upper bound below the minimum for offsets {} and {}", offset1, offset2
            );
        }
    }
}

#[test]
fn distinct_components_get_the_cap() {
    // Two disconnected bubbles.
    let graph = MemoryGraph::from_parts(
        &[(1, 2), (2, 4), (3, 2), (4, 3), (5, 5), (6, 3)],
        &[
            (Side::forward(1), Side::forward(2)),
            (Side::forward(2), Side::forward(3)),
            (Side::forward(4), Side::forward(5)),
            (Side::forward(5), Side::forward(6)),
        ],
    );
    let mut forest = SnarlForest::new();
    forest.insert_snarl(Side::forward(1), Side::forward(3));
    forest.insert_snarl(Side::forward(4), Side::forward(6));
    let index = DistanceIndex::with_maximum(&graph, &forest, 42, false).unwrap();

    let p1 = Pos::new(1, 0, Orientation::Forward);
    let p2 = Pos::new(5, 0, Orientation::Forward);
    assert_eq!(index.min_distance(&graph, &forest, p1, p2), None, "Disconnected positions are connected");
    assert_eq!(index.max_distance(&graph, p1, p2), Some(42), "Distinct components do not get the cap");

    // Within one component the bound is finite and below the cap here.
    let p2 = Pos::new(3, 0, Orientation::Forward);
    let upper = index.max_distance(&graph, p1, p2).unwrap();
    let lower = index.min_distance(&graph, &forest, p1, p2).unwrap();
    assert!(upper >= lower, "Upper bound below the minimum within a component");
}

#[test]
fn cyclic_components_get_the_cap() {
    let (graph, forest) = cycle();
    let index = DistanceIndex::with_maximum(&graph, &forest, 64, false).unwrap();
    let max_index = index.max_index().unwrap();

    assert_eq!(max_index.num_cycles(), 1, "Invalid number of cyclic components");
    let comp = max_index.component_of(1, 2);
    for node in 3..=5 {
        assert_eq!(max_index.component_of(1, node), comp, "Node {} is not in the cyclic component", node);
    }

    // Within the cycle.
    let p1 = Pos::new(2, 0, Orientation::Forward);
    let p2 = Pos::new(4, 0, Orientation::Forward);
    assert_eq!(index.max_distance(&graph, p1, p2), Some(64), "Cyclic positions do not get the cap");

    // The boundary nodes are in their own acyclic components.
    let p1 = Pos::new(1, 0, Orientation::Forward);
    let p2 = Pos::new(6, 0, Orientation::Forward);
    assert_eq!(index.max_distance(&graph, p1, p2), Some(64), "Separated boundary nodes do not get the cap");
}

#[test]
fn max_dominates_min() {
    let (graph, forest) = linear_chain();
    let index = DistanceIndex::with_maximum(&graph, &forest, 1000, false).unwrap();

    for node1 in 1..=3 {
        for node2 in 1..=3 {
            for orientation in [Orientation::Forward, Orientation::Reverse] {
                let p1 = Pos::new(node1, 0, orientation);
                let p2 = Pos::new(node2, 0, orientation);
                if let (Some(lower), Some(upper)) = (
                    index.min_distance(&graph, &forest, p1, p2),
                    index.max_distance(&graph, p1, p2),
                ) {
                    assert!(
                        upper >= lower,
                        "Upper bound {} below minimum {} for nodes {} and {}", upper, lower, node1, node2
                    );
                }
            }
        }
    }
}

#[test]
fn no_maximum_structure() {
    let (graph, forest) = linear_chain();
    let index = DistanceIndex::new(&graph, &forest, false).unwrap();
    let p1 = Pos::new(1, 0, Orientation::Forward);
    let p2 = Pos::new(3, 0, Orientation::Forward);
    assert_eq!(index.max_distance(&graph, p1, p2), None, "An unbuilt maximum structure answers queries");
}

#[test]
fn serialization() {
    let (graph, forest) = cycle();
    let index = DistanceIndex::with_maximum(&graph, &forest, 64, false).unwrap();
    let _ = serialize::test(index.max_index().unwrap(), "max-index", None, true);
}

#[test]
fn rejects_zero_cap() {
    let (graph, forest) = linear_chain();
    assert!(
        DistanceIndex::with_maximum(&graph, &forest, 0, false).is_err(),
        "Built a maximum structure with a zero cap"
    );
}

//-----------------------------------------------------------------------------
