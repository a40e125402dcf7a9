//! Graph structure: edge lists, type metadata and indexing utilities.
//!
//! Everything here runs on the host over plain index vectors. The
//! utilities validate indices against an explicit node count and accept
//! optional per-edge weights that travel with the edges they describe.

pub mod coalesce;
pub mod degree;
pub mod edge_index;
pub mod loops;
pub mod mask;
pub mod metadata;
pub mod undirected;

pub use coalesce::{coalesce, sort_edge_index};
pub use degree::{degree, gcn_norm, Direction};
pub use edge_index::{DeviceEdgeIndex, EdgeIndex};
pub use loops::{add_self_loops, contains_self_loops, remove_self_loops};
pub use mask::{homophily, index_to_mask, mask_to_index};
pub use metadata::{EdgeType, Metadata, NodeType, TypeRegistry};
pub use undirected::{is_undirected, to_undirected};
