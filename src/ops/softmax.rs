//! Segment softmax: softmax of edge scores grouped by destination node.
//!
//! Each destination's incoming scores are normalised among themselves,
//! independently per column (attention head). No dense
//! [num_nodes, num_edges] matrix is ever built.

use burn::prelude::*;

use super::segment::{scatter_add, segment_reduce, Aggregation};
use crate::error::{Error, Result};

/// Softmax of `scores` within each group of `group_ids`.
///
/// - `scores`: [num_edges, heads], raw attention logits
/// - `group_ids`: [num_edges], destination node per edge
/// - `group_count`: total number of destination nodes
///
/// Returns [num_edges, heads]; for every non-empty group the rows of that
/// group sum to 1.0 in each column. The per-group max is subtracted before
/// exponentiating, so the denominator is at least 1.0 and large logits do
/// not overflow.
pub fn segment_softmax<B: Backend>(
    scores: Tensor<B, 2>,
    group_ids: Tensor<B, 1, Int>,
    group_count: usize,
) -> Result<Tensor<B, 2>> {
    let num_edges = scores.dims()[0];
    let num_ids = group_ids.dims()[0];
    if num_ids != num_edges {
        return Err(Error::shape("softmax group ids", num_edges, num_ids));
    }
    if num_edges == 0 {
        return Ok(scores);
    }

    // Softmax is shift-invariant, so the max needs no gradient.
    let group_max = segment_reduce(
        scores.clone().detach(),
        group_ids.clone(),
        group_count,
        Aggregation::Max,
    )?;
    let edge_max = group_max.select(0, group_ids.clone());

    let exp_scores = (scores - edge_max).exp();
    let group_sum = scatter_add(exp_scores.clone(), group_ids.clone(), group_count);
    let edge_sum = group_sum.select(0, group_ids);

    Ok(exp_scores / edge_sum)
}

// ─── Tests ────────────────────────────────────────────────────────
