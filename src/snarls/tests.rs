use super::*;

use crate::graph::MemoryGraph;

//-----------------------------------------------------------------------------

// A bubble from node 1 to node 4, with branches 2 and 3.
fn bubble() -> (MemoryGraph, SnarlForest, usize) {
    let graph = MemoryGraph::from_parts(
        &[(1, 2), (2, 4), (3, 9), (4, 2)],
        &[
            (Side::forward(1), Side::forward(2)),
            (Side::forward(1), Side::forward(3)),
            (Side::forward(2), Side::forward(4)),
            (Side::forward(3), Side::forward(4)),
        ],
    );
    let mut forest = SnarlForest::new();
    let snarl = forest.insert_snarl(Side::forward(1), Side::forward(4));
    (graph, forest, snarl)
}

// A bubble from node 2 to node 5 nested in a snarl from node 1 to node 6.
fn nested() -> (MemoryGraph, SnarlForest, usize, usize) {
    let graph = MemoryGraph::from_parts(
        &[(1, 2), (2, 1), (3, 4), (4, 9), (5, 1), (6, 2)],
        &[
            (Side::forward(1), Side::forward(2)),
            (Side::forward(2), Side::forward(3)),
            (Side::forward(2), Side::forward(4)),
            (Side::forward(3), Side::forward(5)),
            (Side::forward(4), Side::forward(5)),
            (Side::forward(5), Side::forward(6)),
        ],
    );
    let mut forest = SnarlForest::new();
    let outer = forest.insert_snarl(Side::forward(1), Side::forward(6));
    let inner = forest.insert_child_snarl(Side::forward(2), Side::forward(5), outer);
    (graph, forest, outer, inner)
}

//-----------------------------------------------------------------------------

#[test]
fn snarl_basics() {
    let (_, forest, snarl) = bubble();
    assert_eq!(forest.snarl_count(), 1, "Invalid snarl count");
    assert_eq!(forest.chain_count(), 0, "Invalid chain count");
    assert_eq!(forest.top_level_snarls(), vec![snarl], "Invalid top-level snarls");

    let snarl_ref = forest.snarl(snarl);
    assert_eq!(snarl_ref.start(), Side::forward(1), "Invalid start side");
    assert_eq!(snarl_ref.end(), Side::forward(4), "Invalid end side");
    assert!(!snarl_ref.is_unary(), "The bubble is unary");

    assert_eq!(forest.parent_of(snarl), None, "Top-level snarl has a parent");
    assert_eq!(forest.chain_of(snarl), None, "Top-level snarl is in a chain");
    assert!(!forest.in_nontrivial_chain(snarl), "Top-level snarl is in a nontrivial chain");
}

#[test]
fn into_which_snarl() {
    let (_, forest, snarl) = bubble();
    assert_eq!(forest.into_which_snarl(Side::forward(1)), Some(snarl), "The start side does not enter the snarl");
    assert_eq!(forest.into_which_snarl(Side::reverse(4)), Some(snarl), "The flipped end side does not enter the snarl");
    assert_eq!(forest.into_which_snarl(Side::reverse(1)), None, "The flipped start side enters a snarl");
    assert_eq!(forest.into_which_snarl(Side::forward(4)), None, "The end side enters a snarl");
    assert_eq!(forest.into_which_snarl(Side::forward(2)), None, "An interior side enters a snarl");
}

#[test]
fn unary_snarl() {
    let mut forest = SnarlForest::new();
    let snarl = forest.insert_snarl(Side::forward(7), Side::reverse(7));
    assert!(forest.snarl(snarl).is_unary(), "A snarl with flipped boundary sides is not unary");
}

//-----------------------------------------------------------------------------

#[test]
fn chains() {
    // A chain of two snarls over nodes 1 -> 2 -> 3.
    let mut forest = SnarlForest::new();
    let first = forest.insert_snarl(Side::forward(1), Side::forward(2));
    let second = forest.insert_snarl(Side::forward(2), Side::forward(3));
    let chain = forest.insert_chain(&[(first, false), (second, false)]).unwrap();

    assert_eq!(forest.chain_count(), 1, "Invalid chain count");
    assert_eq!(forest.chain(chain).len(), 2, "Invalid chain length");
    assert_eq!(forest.chain_of(first), Some(chain), "First snarl is not in the chain");
    assert_eq!(forest.chain_of(second), Some(chain), "Second snarl is not in the chain");
    assert_eq!(forest.chain_link_of(first), Some((chain, 0, false)), "Invalid chain link for the first snarl");
    assert_eq!(forest.chain_link_of(second), Some((chain, 1, false)), "Invalid chain link for the second snarl");
    assert!(forest.in_nontrivial_chain(first), "First snarl is not in a nontrivial chain");

    assert_eq!(forest.chain_start(chain), Side::forward(1), "Invalid chain start");
    assert_eq!(forest.chain_end(chain), Side::forward(3), "Invalid chain end");
    assert!(!forest.chain_is_circular(chain), "The chain is circular");
    for (rank, truth) in [1usize, 2, 3].iter().enumerate() {
        assert_eq!(forest.chain_boundary_node(chain, rank), *truth, "Invalid boundary node {}", rank);
    }
}

#[test]
fn circular_chain() {
    let mut forest = SnarlForest::new();
    let first = forest.insert_snarl(Side::forward(1), Side::forward(2));
    let second = forest.insert_snarl(Side::forward(2), Side::forward(1));
    let chain = forest.insert_chain(&[(first, false), (second, false)]).unwrap();
    assert!(forest.chain_is_circular(chain), "The chain is not circular");
    assert_eq!(forest.chain_boundary_node(chain, 0), forest.chain_boundary_node(chain, 2), "Circular boundary nodes differ");
}

#[test]
fn invalid_chains() {
    let mut forest = SnarlForest::new();
    let first = forest.insert_snarl(Side::forward(1), Side::forward(2));
    let second = forest.insert_snarl(Side::forward(3), Side::forward(4));
    assert!(forest.insert_chain(&[]).is_err(), "Inserted an empty chain");
    assert!(
        forest.insert_chain(&[(first, false), (second, false)]).is_err(),
        "Inserted a chain without shared boundary nodes"
    );
}

#[test]
fn reversed_in_chain() {
    // The second snarl runs from 3 to 2, so the chain traverses it in reverse.
    let mut forest = SnarlForest::new();
    let first = forest.insert_snarl(Side::forward(1), Side::forward(2));
    let second = forest.insert_snarl(Side::reverse(3), Side::reverse(2));
    let chain = forest.insert_chain(&[(first, false), (second, true)]).unwrap();

    assert_eq!(forest.chain_link_of(second), Some((chain, 1, true)), "Invalid chain link for the reversed snarl");
    assert_eq!(forest.chain_end(chain), Side::forward(3), "Invalid end side for a chain with a reversed snarl");
    assert_eq!(forest.chain_boundary_node(chain, 2), 3, "Invalid final boundary node");
}

//-----------------------------------------------------------------------------

#[test]
fn net_graph_flat() {
    let (graph, forest, snarl) = bubble();
    let ng = NetGraph::new(&graph, &forest, snarl);

    assert_eq!(ng.start(), Side::forward(1), "Invalid net graph start");
    assert_eq!(ng.end(), Side::forward(4), "Invalid net graph end");
    assert_eq!(ng.units(), vec![1, 2, 3, 4], "Invalid units for a flat snarl");

    let mut successors = Vec::new();
    ng.follow_edges(Side::forward(1), |side| {
        successors.push(side);
        true
    });
    successors.sort();
    assert_eq!(successors, vec![Side::forward(2), Side::forward(3)], "Invalid successors for the start side");

    // Outward-facing boundary sides have no successors.
    let mut outward = Vec::new();
    ng.follow_edges(Side::reverse(1), |side| {
        outward.push(side);
        true
    });
    ng.follow_edges(Side::forward(4), |side| {
        outward.push(side);
        true
    });
    assert!(outward.is_empty(), "Outward boundary sides have successors");
}

#[test]
fn net_graph_collapses_children() {
    let (graph, forest, outer, inner) = nested();
    let ng = NetGraph::new(&graph, &forest, outer);

    assert_eq!(ng.child_at(2), Some(Child::Snarl(inner)), "Node 2 does not represent the child");
    assert_eq!(ng.child_at(1), None, "The start node represents a child");
    assert_eq!(ng.units(), vec![1, 2, 6], "Invalid units for a snarl with a child");

    // Traversing the child forward leads to the node after the child.
    let mut successors = Vec::new();
    ng.follow_edges(Side::forward(2), |side| {
        successors.push(side);
        true
    });
    assert_eq!(successors, vec![Side::forward(6)], "Invalid successors through the child");

    // Arriving at the child from the right enters it backwards.
    let mut predecessors = Vec::new();
    ng.follow_edges(Side::reverse(6), |side| {
        predecessors.push(side);
        true
    });
    assert_eq!(predecessors, vec![Side::reverse(2)], "Invalid translation when entering the child backwards");
}

//-----------------------------------------------------------------------------
