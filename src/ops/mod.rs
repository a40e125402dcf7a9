//! Grouped tensor primitives the engine is built on.

pub mod segment;
pub mod softmax;

pub use segment::{scatter_add, segment_count, segment_reduce, Aggregation};
pub use softmax::segment_softmax;
