use super::*;

use crate::support::Side;

//-----------------------------------------------------------------------------

fn example_graph() -> MemoryGraph {
    // 1 -> 2 -> 4, 1 -> 3 -> 4, with 3 reversed on its second edge.
    MemoryGraph::from_parts(
        &[(1, 3), (2, 1), (3, 2), (4, 4)],
        &[
            (Side::forward(1), Side::forward(2)),
            (Side::forward(1), Side::reverse(3)),
            (Side::forward(2), Side::forward(4)),
            (Side::reverse(3), Side::forward(4)),
        ],
    )
}

#[test]
fn statistics() {
    let empty = MemoryGraph::new();
    assert_eq!(empty.nodes(), 0, "Invalid node count for an empty graph");

    let graph = example_graph();
    assert_eq!(graph.nodes(), 4, "Invalid node count");
    assert_eq!(graph.min_node(), 1, "Invalid minimum node id");
    assert_eq!(graph.max_node(), 4, "Invalid maximum node id");
    for node in 1..=4 {
        assert!(graph.has_node(node), "Node {} is missing", node);
    }
    assert!(!graph.has_node(5), "Node 5 should not exist");
    assert_eq!(graph.sequence_len(1), Some(3), "Invalid length for node 1");
    assert_eq!(graph.sequence_len(5), None, "Node 5 has a length");
}

#[test]
fn edges() {
    let graph = example_graph();

    let mut successors = graph.successors(Side::forward(1));
    successors.sort();
    assert_eq!(successors, vec![Side::forward(2), Side::reverse(3)], "Invalid successors for node 1");

    // Bidirected mirrors.
    assert_eq!(graph.successors(Side::reverse(2)), vec![Side::reverse(1)], "Missing mirror edge for node 2");
    assert_eq!(graph.successors(Side::forward(3)), vec![Side::reverse(1)], "Missing mirror edge for node 3");

    // Duplicate insertion has no effect.
    let mut copy = graph.clone();
    copy.insert_edge(Side::forward(1), Side::forward(2));
    assert_eq!(copy, graph, "Duplicate edge changed the graph");
}

#[test]
fn iteration() {
    let graph = example_graph();

    let mut nodes = Vec::new();
    graph.for_each_node(|node| {
        nodes.push(node);
        true
    });
    assert_eq!(nodes, vec![1, 2, 3, 4], "Invalid node enumeration");

    let mut first = None;
    let finished = graph.for_each_node(|node| {
        first = Some(node);
        false
    });
    assert!(!finished, "Stopped enumeration claims to have finished");
    assert_eq!(first, Some(1), "Invalid first node");

    let finished = graph.follow_edges(Side::forward(1), |_| false);
    assert!(!finished, "Stopped edge enumeration claims to have finished");
}

//-----------------------------------------------------------------------------
