//! Self-loop handling.
//!
//! `add_self_loops` always appends one loop per node, so calling it twice
//! duplicates loops. Call `remove_self_loops` first, or `coalesce` after,
//! when the input may already contain loops.

use super::edge_index::{check_weights, EdgeIndex};
use crate::error::Result;

/// Append `(i, i)` for every node `i` in `0..num_nodes`. New edges get
/// `fill_value` as weight when weights are present.
pub fn add_self_loops(
    edges: &EdgeIndex,
    weights: Option<&[f32]>,
    fill_value: f32,
    num_nodes: usize,
) -> Result<(EdgeIndex, Option<Vec<f32>>)> {
    edges.validate(num_nodes, num_nodes)?;
    check_weights(weights, edges.len())?;

    let mut out = edges.clone();
    out.extend(&EdgeIndex::from_pairs((0..num_nodes).map(|i| (i, i))));

    let weights = weights.map(|w| {
        let mut w = w.to_vec();
        w.resize(w.len() + num_nodes, fill_value);
        w
    });
    Ok((out, weights))
}

/// Drop every edge whose source equals its target, keeping the order of
/// the rest.
pub fn remove_self_loops(
    edges: &EdgeIndex,
    weights: Option<&[f32]>,
) -> Result<(EdgeIndex, Option<Vec<f32>>)> {
    check_weights(weights, edges.len())?;

    let keep: Vec<usize> = edges
        .iter()
        .enumerate()
        .filter(|(_, (s, t))| s != t)
        .map(|(i, _)| i)
        .collect();
    let weights = weights.map(|w| keep.iter().map(|&i| w[i]).collect());
    Ok((edges.select(&keep), weights))
}

pub fn contains_self_loops(edges: &EdgeIndex) -> bool {
    edges.iter().any(|(s, t)| s == t)
}
