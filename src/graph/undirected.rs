//! Symmetrisation of edge lists.

use super::coalesce::coalesce;
use super::edge_index::{check_weights, EdgeIndex};
use crate::error::Result;
use crate::ops::Aggregation;

/// Ensure `(v, u)` is present for every `(u, v)`.
///
/// Edges and their reverses are merged with [`coalesce`], so duplicate
/// weights are folded with `reduce` and the output is sorted by
/// (target, source).
pub fn to_undirected(
    edges: &EdgeIndex,
    weights: Option<&[f32]>,
    num_nodes: usize,
    reduce: Aggregation,
) -> Result<(EdgeIndex, Option<Vec<f32>>)> {
    check_weights(weights, edges.len())?;

    let mut both = edges.clone();
    both.extend(&edges.reversed());
    let doubled = weights.map(|w| [w, w].concat());

    coalesce(&both, doubled.as_deref(), num_nodes, reduce)
}

/// Whether every edge has its reverse (with an equal summed weight when
/// weights are given).
pub fn is_undirected(edges: &EdgeIndex, weights: Option<&[f32]>, num_nodes: usize) -> Result<bool> {
    let (forward, fw) = coalesce(edges, weights, num_nodes, Aggregation::Sum)?;
    let (backward, bw) = coalesce(&forward.reversed(), fw.as_deref(), num_nodes, Aggregation::Sum)?;
    Ok(forward == backward && fw == bw)
}
