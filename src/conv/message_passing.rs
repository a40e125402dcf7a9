//! Message passing framework.
//!
//! A layer supplies `message` (and optionally `aggregate` / `update`);
//! [`MessagePassing::propagate`] does the indexing, gathering and grouped
//! reduction:
//!
//! ```text
//! h_i' = UPDATE(AGGREGATE({ MESSAGE(inputs gathered for edge j → i) }))
//! ```
//!
//! What a message stage reads is declared by its `Input` type. Node-level
//! tensors wrapped in [`Source`] or [`Target`] are gathered per edge by
//! source or target index, [`PerEdge`] tensors are already per edge, and
//! [`Shared`] values are handed over as they are. Tuples of these gather
//! element-wise, so `message` receives exactly the per-edge values its
//! signature names.

use burn::prelude::*;
use tracing::trace;

use crate::error::{Error, Result};
use crate::graph::DeviceEdgeIndex;
use crate::ops::{segment_reduce, Aggregation};

// ─── Gathered inputs ──────────────────────────────────────────────

/// Node-level tensor gathered by source index (the neighbour side, `x_j`).
#[derive(Debug, Clone)]
pub struct Source<B: Backend, const D: usize>(pub Tensor<B, D>);

/// Node-level tensor gathered by target index (the receiving side, `x_i`).
#[derive(Debug, Clone)]
pub struct Target<B: Backend, const D: usize>(pub Tensor<B, D>);

/// Tensor that already has one row per edge.
#[derive(Debug, Clone)]
pub struct PerEdge<B: Backend, const D: usize>(pub Tensor<B, D>);

/// A value passed to the message stage unchanged.
#[derive(Debug, Clone)]
pub struct Shared<T>(pub T);

/// An input that can be turned into its per-edge form.
pub trait Gather<B: Backend> {
    type Output;

    /// Check row counts against `edges` without gathering.
    fn check(&self, edges: &DeviceEdgeIndex<B>) -> Result<()>;

    fn gather(self, edges: &DeviceEdgeIndex<B>) -> Result<Self::Output>;
}

fn check_rows(what: &str, expected: usize, got: usize) -> Result<()> {
    if got != expected {
        return Err(Error::shape(what, expected, got));
    }
    Ok(())
}

impl<B: Backend, const D: usize> Gather<B> for Source<B, D> {
    type Output = Tensor<B, D>;

    fn check(&self, edges: &DeviceEdgeIndex<B>) -> Result<()> {
        check_rows("source-side input rows", edges.num_src_nodes(), self.0.dims()[0])
    }

    fn gather(self, edges: &DeviceEdgeIndex<B>) -> Result<Self::Output> {
        self.check(edges)?;
        Ok(self.0.select(0, edges.source()))
    }
}

impl<B: Backend, const D: usize> Gather<B> for Target<B, D> {
    type Output = Tensor<B, D>;

    fn check(&self, edges: &DeviceEdgeIndex<B>) -> Result<()> {
        check_rows("target-side input rows", edges.num_dst_nodes(), self.0.dims()[0])
    }

    fn gather(self, edges: &DeviceEdgeIndex<B>) -> Result<Self::Output> {
        self.check(edges)?;
        Ok(self.0.select(0, edges.target()))
    }
}

impl<B: Backend, const D: usize> Gather<B> for PerEdge<B, D> {
    type Output = Tensor<B, D>;

    fn check(&self, edges: &DeviceEdgeIndex<B>) -> Result<()> {
        check_rows("per-edge input rows", edges.num_edges(), self.0.dims()[0])
    }

    fn gather(self, edges: &DeviceEdgeIndex<B>) -> Result<Self::Output> {
        self.check(edges)?;
        Ok(self.0)
    }
}

impl<B: Backend, T> Gather<B> for Shared<T> {
    type Output = T;

    fn check(&self, _edges: &DeviceEdgeIndex<B>) -> Result<()> {
        Ok(())
    }

    fn gather(self, _edges: &DeviceEdgeIndex<B>) -> Result<T> {
        Ok(self.0)
    }
}

macro_rules! impl_gather_tuple {
    ($($name:ident),+) => {
        impl<B: Backend, $($name: Gather<B>),+> Gather<B> for ($($name,)+) {
            type Output = ($($name::Output,)+);

            #[allow(non_snake_case)]
            fn check(&self, edges: &DeviceEdgeIndex<B>) -> Result<()> {
                let ($($name,)+) = self;
                $($name.check(edges)?;)+
                Ok(())
            }

            #[allow(non_snake_case)]
            fn gather(self, edges: &DeviceEdgeIndex<B>) -> Result<Self::Output> {
                let ($($name,)+) = self;
                Ok(($($name.gather(edges)?,)+))
            }
        }
    };
}

impl_gather_tuple!(T1);
impl_gather_tuple!(T1, T2);
impl_gather_tuple!(T1, T2, T3);
impl_gather_tuple!(T1, T2, T3, T4);
impl_gather_tuple!(T1, T2, T3, T4, T5);
impl_gather_tuple!(T1, T2, T3, T4, T5, T6);

// ─── Message passing ──────────────────────────────────────────────

/// What a message stage knows about the edge batch besides its inputs.
#[derive(Debug, Clone)]
pub struct MessageContext<B: Backend> {
    target: Tensor<B, 1, Int>,
    num_nodes: usize,
    num_edges: usize,
}

impl<B: Backend> MessageContext<B> {
    pub fn new(target: Tensor<B, 1, Int>, num_nodes: usize) -> Self {
        let num_edges = target.dims()[0];
        Self {
            target,
            num_nodes,
            num_edges,
        }
    }

    /// Destination node per edge; the group id for segment operations.
    pub fn target(&self) -> Tensor<B, 1, Int> {
        self.target.clone()
    }

    /// Number of destination nodes (output rows).
    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    pub fn num_edges(&self) -> usize {
        self.num_edges
    }
}

/// A layer expressed as message / aggregate / update stages.
pub trait MessagePassing<B: Backend> {
    /// The node-level inputs the message stage reads.
    type Input: Gather<B>;

    /// Compute one message row per edge, for the whole batch at once.
    fn message(
        &self,
        input: <Self::Input as Gather<B>>::Output,
        ctx: &MessageContext<B>,
    ) -> Result<Tensor<B, 2>>;

    /// Width of a message row.
    fn message_width(&self) -> usize;

    fn aggregation(&self) -> Aggregation {
        Aggregation::Sum
    }

    /// Fold messages into one row per destination node.
    fn aggregate(&self, messages: Tensor<B, 2>, ctx: &MessageContext<B>) -> Result<Tensor<B, 2>> {
        segment_reduce(messages, ctx.target(), ctx.num_nodes(), self.aggregation())
    }

    /// Post-process the aggregated rows.
    fn update(&self, aggregated: Tensor<B, 2>) -> Result<Tensor<B, 2>> {
        Ok(aggregated)
    }

    /// Run gather → message → aggregate → update over `edges`.
    ///
    /// Returns [edges.num_dst_nodes(), message_width]; destinations without
    /// incoming edges hold the reduction identity (zero) before `update`.
    fn propagate(&self, edges: &DeviceEdgeIndex<B>, input: Self::Input) -> Result<Tensor<B, 2>> {
        let num_nodes = edges.num_dst_nodes();
        if edges.is_empty() {
            input.check(edges)?;
            trace!(num_nodes, "propagate over empty edge set");
            let zeros = Tensor::zeros([num_nodes, self.message_width()], edges.device());
            return self.update(zeros);
        }

        let gathered = input.gather(edges)?;
        let ctx = MessageContext::new(edges.target(), num_nodes);
        trace!(num_nodes, num_edges = ctx.num_edges, "propagate");

        let messages = self.message(gathered, &ctx)?;
        let rows = messages.dims()[0];
        if rows != ctx.num_edges {
            return Err(Error::shape("message rows", ctx.num_edges, rows));
        }

        let aggregated = self.aggregate(messages, &ctx)?;
        self.update(aggregated)
    }
}

// ─── Tests ────────────────────────────────────────────────────────
