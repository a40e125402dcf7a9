//! hetmp: sparse graph message passing on burn tensors.
//!
//! - [`ops`]: segment reductions and segment softmax over per-edge rows
//! - [`graph`]: edge lists, type metadata and host-side graph utilities
//! - [`conv`]: the message-passing pipeline and the HGT attention layer
//!
//! ```no_run
//! use burn::backend::NdArray;
//! use burn::tensor::Tensor;
//! use hetmp::{EdgeIndex, EdgeIndices, EdgeType, HgtConvConfig, InChannels, Metadata, NodeFeatures};
//!
//! let device = Default::default();
//! let metadata = Metadata::new(
//!     ["author", "paper"],
//!     [EdgeType::new("author", "writes", "paper")],
//! );
//! let layer = HgtConvConfig::new(InChannels::Uniform(16), 16, metadata)
//!     .with_heads(4)
//!     .init::<NdArray>(&device)?;
//!
//! let mut x = NodeFeatures::new();
//! x.insert("author".into(), Tensor::zeros([2, 16], &device));
//! x.insert("paper".into(), Tensor::zeros([3, 16], &device));
//! let mut edges = EdgeIndices::new();
//! edges.insert(
//!     EdgeType::new("author", "writes", "paper"),
//!     EdgeIndex::from_pairs([(0, 0), (1, 2)]),
//! );
//!
//! let out = layer.forward(&x, &edges)?;
//! assert_eq!(out.get(&"paper".into())?.dims(), [3, 16]);
//! # Ok::<(), hetmp::Error>(())
//! ```

pub mod conv;
pub mod error;
pub mod graph;
pub mod ops;

pub use conv::{
    EdgeIndices, HeteroOutput, HgtConv, HgtConvConfig, InChannels, MessageContext, MessagePassing,
    NodeFeatures,
};
pub use error::{Error, Result};
pub use graph::{
    add_self_loops, coalesce, contains_self_loops, degree, gcn_norm, homophily, index_to_mask,
    is_undirected, mask_to_index, remove_self_loops, sort_edge_index, to_undirected,
    DeviceEdgeIndex, Direction, EdgeIndex, EdgeType, Metadata, NodeType, TypeRegistry,
};
pub use ops::{segment_reduce, segment_softmax, Aggregation};
