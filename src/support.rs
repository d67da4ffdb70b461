//! Support structures for the distance index.
//!
//! This module provides the basic vocabulary of the crate: node orientations,
//! oriented node sides, graph positions, and the sentinel-coded distances
//! stored in the index.

use simple_sds::int_vector::IntVector;
use simple_sds::ops::{Vector, Access, Push};
use simple_sds::bits;

use std::cmp;

#[cfg(test)]
mod tests;

//-----------------------------------------------------------------------------

/// Orientation of a node or a walk through it.
///
/// Forward orientation reads the stored sequence as it is; reverse orientation
/// reads the reverse complement.
///
/// # Examples
///
/// ```
/// use snarl_distance::Orientation;
///
/// assert_eq!(Orientation::Forward.flip(), Orientation::Reverse);
/// assert!(!Orientation::Forward.is_reverse());
/// assert_eq!(Orientation::from_is_reverse(true), Orientation::Reverse);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Orientation {
    /// The node in its stored orientation.
    Forward,
    /// The node in reverse complement orientation.
    Reverse,
}

impl Orientation {
    /// Returns the opposite orientation.
    #[inline]
    pub fn flip(self) -> Orientation {
        match self {
            Orientation::Forward => Orientation::Reverse,
            Orientation::Reverse => Orientation::Forward,
        }
    }

    /// Returns `true` if the orientation is reverse.
    #[inline]
    pub fn is_reverse(self) -> bool {
        self == Orientation::Reverse
    }

    /// Converts a flag into an orientation.
    #[inline]
    pub fn from_is_reverse(is_reverse: bool) -> Orientation {
        if is_reverse { Orientation::Reverse } else { Orientation::Forward }
    }
}

//-----------------------------------------------------------------------------

/// An oriented side of a node.
///
/// Traversing a side enters the node from that side and reads it in the given
/// orientation. A side packs into a single integer as `2 * node + orientation`,
/// the encoding used in bidirectional GBWT indexes. Node identifier `0` is
/// reserved for technical purposes, so packed value `0` can denote a missing
/// side.
///
/// # Examples
///
/// ```
/// use snarl_distance::{Side, Orientation};
///
/// let side = Side::forward(42);
/// assert_eq!(side.flip(), Side::reverse(42));
/// assert_eq!(Side::unpack(side.pack()), side);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Side {
    /// Identifier of the node.
    pub node: usize,
    /// Orientation of the traversal.
    pub orientation: Orientation,
}

impl Side {
    /// Creates a new side.
    #[inline]
    pub fn new(node: usize, orientation: Orientation) -> Side {
        Side { node, orientation }
    }

    /// Creates the forward side of a node.
    #[inline]
    pub fn forward(node: usize) -> Side {
        Side::new(node, Orientation::Forward)
    }

    /// Creates the reverse side of a node.
    #[inline]
    pub fn reverse(node: usize) -> Side {
        Side::new(node, Orientation::Reverse)
    }

    /// Returns the same node in the other orientation.
    #[inline]
    pub fn flip(self) -> Side {
        Side::new(self.node, self.orientation.flip())
    }

    /// Returns the packed integer representation `2 * node + orientation`.
    ///
    /// # Panics
    ///
    /// May panic if `self.node > usize::MAX / 2`.
    #[inline]
    pub fn pack(self) -> usize {
        2 * self.node + (self.orientation.is_reverse() as usize)
    }

    /// Returns the side corresponding to the packed representation.
    #[inline]
    pub fn unpack(packed: usize) -> Side {
        Side::new(packed / 2, Orientation::from_is_reverse(packed & 1 != 0))
    }
}

//-----------------------------------------------------------------------------

/// A position in the graph: an offset on an oriented node.
///
/// The offset is relative to the given orientation, with
/// `0 <= offset < length(node)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Pos {
    /// Identifier of the node.
    pub node: usize,
    /// Offset on the node in the given orientation.
    pub offset: usize,
    /// Orientation of the node.
    pub orientation: Orientation,
}

impl Pos {
    /// Creates a new position.
    #[inline]
    pub fn new(node: usize, offset: usize, orientation: Orientation) -> Pos {
        Pos { node, offset, orientation }
    }
}

//-----------------------------------------------------------------------------

// Distances in the index are stored as `value + 1`, with `0` denoting an
// unreachable pair. In-memory code works with `Option<usize>` and converts at
// the storage boundary.

/// Converts a stored distance into an optional distance.
#[inline]
pub fn stored_to_dist(stored: u64) -> Option<usize> {
    if stored == 0 { None } else { Some((stored - 1) as usize) }
}

/// Converts an optional distance into its stored form.
#[inline]
pub fn dist_to_stored(dist: Option<usize>) -> u64 {
    match dist {
        Some(value) => (value as u64) + 1,
        None => 0,
    }
}

/// Returns the minimum of two optional distances, treating [`None`] as
/// unreachable.
#[inline]
pub fn min_dist(a: Option<usize>, b: Option<usize>) -> Option<usize> {
    match (a, b) {
        (Some(x), Some(y)) => Some(cmp::min(x, y)),
        (Some(x), None) => Some(x),
        (None, y) => y,
    }
}

/// Returns the sum of two optional distances, or [`None`] if either is
/// unreachable.
#[inline]
pub fn sum_dist(a: Option<usize>, b: Option<usize>) -> Option<usize> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x + y),
        _ => None,
    }
}

/// Returns the sum of three optional distances, or [`None`] if any is
/// unreachable.
#[inline]
pub fn sum3_dist(a: Option<usize>, b: Option<usize>, c: Option<usize>) -> Option<usize> {
    sum_dist(sum_dist(a, b), c)
}

//-----------------------------------------------------------------------------

/// Bit-compresses a slice of integers into an [`IntVector`].
///
/// The width of the vector is the number of bits needed for the largest value,
/// with a minimum of one bit.
///
/// # Examples
///
/// ```
/// use snarl_distance::support;
/// use simple_sds::ops::{Vector, Access};
///
/// let values = [0u64, 13, 5, 299];
/// let packed = support::compress(&values);
/// assert_eq!(packed.len(), values.len());
/// assert_eq!(packed.width(), 9);
/// for (index, value) in values.iter().enumerate() {
///     assert_eq!(packed.get(index), *value);
/// }
/// ```
pub fn compress(values: &[u64]) -> IntVector {
    let max_value = values.iter().cloned().fold(0, cmp::max);
    let width = bits::bit_len(cmp::max(max_value, 1));
    let mut result = IntVector::with_capacity(values.len(), width).unwrap();
    for value in values {
        result.push(*value);
    }
    result
}

/// Extracts the values of an [`IntVector`] into a vector of integers.
pub fn decompress(values: &IntVector) -> Vec<u64> {
    let mut result = Vec::with_capacity(values.len());
    for i in 0..values.len() {
        result.push(values.get(i));
    }
    result
}

//-----------------------------------------------------------------------------
