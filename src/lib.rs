//! # Snarl-based distance index for variation graphs
//!
//! This crate computes minimum and maximum distances between positions in a
//! variation graph: a bidirected sequence graph whose nodes carry DNA
//! sequences and whose edges connect node sides. The index is built over the
//! snarl decomposition of the graph and answers queries fast enough to be
//! issued millions of times during read mapping.
//!
//! The minimum distance is exact: the length of the shortest walk between
//! two positions in base pairs, inclusive of both endpoints. The optional
//! maximum distance structure gives a constant-time upper bound for walks
//! within acyclic parts of the graph, capped by a configurable bound
//! elsewhere.
//!
//! The distance index has been described in:
//!
//! > Xian Chang, Jordan Eizenga, Adam M. Novak, Jouni Siren, and Benedict Paten:
//! > **Distance indexing and seed clustering in sequence graphs**.\
//! > Bioinformatics 36(Supplement_1):i146-i153, 2020.
//! > DOI: [10.1093/bioinformatics/btaa446](https://doi.org/10.1093/bioinformatics/btaa446)
//!
//! # Notes
//!
//! * The graph and the snarl decomposition are consumed through the
//!   [`SequenceGraph`] trait and the [`SnarlForest`] arena; the index stores
//!   neither and borrows them per query.
//! * Serialization uses the [Simple-SDS](https://github.com/jltsiren/simple-sds)
//!   element stream; all stored integer vectors are bit-width-compressed.

pub mod graph;
pub mod index;
pub mod max_index;
pub mod snarls;
pub mod support;

mod builder;
mod query;

//-----------------------------------------------------------------------------

pub use crate::graph::{MemoryGraph, SequenceGraph};
pub use crate::index::{ChainIndex, DistanceIndex, NodeLocator, SnarlIndex};
pub use crate::max_index::MaxIndex;
pub use crate::snarls::{Chain, NetGraph, Snarl, SnarlForest};
pub use crate::support::{Orientation, Pos, Side};

//-----------------------------------------------------------------------------

/// Node identifier `0` is used for technical purposes and does not exist in
/// the graph.
pub const ENDMARKER: usize = 0;

//-----------------------------------------------------------------------------
