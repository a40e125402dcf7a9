//! Message-passing layers.
//!
//! [`MessagePassing`] is the generic gather → message → aggregate → update
//! pipeline; [`HgtConv`] is the heterogeneous attention layer built on it.

pub mod hgt;
pub mod message_passing;
pub mod projection;

pub use hgt::{EdgeIndices, HeteroOutput, HgtConv, HgtConvConfig, InChannels, NodeFeatures};
pub use message_passing::{Gather, MessageContext, MessagePassing, PerEdge, Shared, Source, Target};
pub use projection::{relu6, Projection, ProjectionConfig};
