use super::*;

//-----------------------------------------------------------------------------

#[test]
fn orientation() {
    assert_eq!(Orientation::Forward.flip(), Orientation::Reverse, "Forward does not flip to reverse");
    assert_eq!(Orientation::Reverse.flip(), Orientation::Forward, "Reverse does not flip to forward");
    assert!(!Orientation::Forward.is_reverse(), "Forward is reverse");
    assert!(Orientation::Reverse.is_reverse(), "Reverse is not reverse");
    assert_eq!(Orientation::from_is_reverse(false), Orientation::Forward, "Invalid orientation for flag false");
    assert_eq!(Orientation::from_is_reverse(true), Orientation::Reverse, "Invalid orientation for flag true");
}

#[test]
fn sides() {
    for node in 1..10 {
        let forward = Side::forward(node);
        let reverse = Side::reverse(node);
        assert_eq!(forward.flip(), reverse, "Invalid flip for node {}", node);
        assert_eq!(reverse.flip(), forward, "Invalid double flip for node {}", node);
        assert_eq!(forward.pack(), 2 * node, "Invalid packed value for forward side of {}", node);
        assert_eq!(reverse.pack(), 2 * node + 1, "Invalid packed value for reverse side of {}", node);
        assert_eq!(Side::unpack(forward.pack()), forward, "Forward side of {} does not round trip", node);
        assert_eq!(Side::unpack(reverse.pack()), reverse, "Reverse side of {} does not round trip", node);
    }
}

//-----------------------------------------------------------------------------

#[test]
fn stored_distances() {
    assert_eq!(stored_to_dist(0), None, "Stored 0 is not unreachable");
    assert_eq!(stored_to_dist(1), Some(0), "Stored 1 is not distance 0");
    assert_eq!(stored_to_dist(42), Some(41), "Stored 42 is not distance 41");
    assert_eq!(dist_to_stored(None), 0, "Unreachable is not stored as 0");
    assert_eq!(dist_to_stored(Some(0)), 1, "Distance 0 is not stored as 1");
    for value in 0..10 {
        assert_eq!(stored_to_dist(dist_to_stored(Some(value))), Some(value), "Distance {} does not round trip", value);
    }
}

#[test]
fn distance_arithmetic() {
    assert_eq!(min_dist(None, None), None, "Minimum of unreachable pair is reachable");
    assert_eq!(min_dist(Some(3), None), Some(3), "Unreachable is not an identity on the right");
    assert_eq!(min_dist(None, Some(5)), Some(5), "Unreachable is not an identity on the left");
    assert_eq!(min_dist(Some(3), Some(5)), Some(3), "Invalid minimum");

    assert_eq!(sum_dist(Some(3), Some(5)), Some(8), "Invalid sum");
    assert_eq!(sum_dist(Some(3), None), None, "Sum with unreachable is reachable");
    assert_eq!(sum_dist(None, Some(5)), None, "Sum with unreachable is reachable");
    assert_eq!(sum3_dist(Some(1), Some(2), Some(3)), Some(6), "Invalid three-way sum");
    assert_eq!(sum3_dist(Some(1), None, Some(3)), None, "Three-way sum with unreachable is reachable");
}

//-----------------------------------------------------------------------------

#[test]
fn compression() {
    let empty: Vec<u64> = Vec::new();
    let packed = compress(&empty);
    assert_eq!(packed.len(), 0, "Invalid length for an empty vector");

    let values: Vec<u64> = vec![0, 1, 17, 4, 1023, 2, 0];
    let packed = compress(&values);
    assert_eq!(packed.len(), values.len(), "Invalid length for the packed vector");
    assert_eq!(packed.width(), 10, "Invalid width for the packed vector");
    assert_eq!(decompress(&packed), values, "Values do not round trip through compression");

    let zeros: Vec<u64> = vec![0, 0, 0];
    let packed = compress(&zeros);
    assert_eq!(packed.width(), 1, "Invalid width for an all-zero vector");
    assert_eq!(decompress(&packed), zeros, "Zeros do not round trip through compression");
}

//-----------------------------------------------------------------------------
