//! Sorting and deduplication of edge lists.

use rayon::prelude::*;

use super::edge_index::{check_weights, EdgeIndex};
use crate::error::Result;
use crate::ops::Aggregation;

/// Stable order of edge positions by (target, source).
fn sorted_order(edges: &EdgeIndex) -> Vec<usize> {
    let (source, target) = (edges.source(), edges.target());
    let mut order: Vec<usize> = (0..edges.len()).collect();
    order.par_sort_by_key(|&i| (target[i], source[i]));
    order
}

/// Reorder edges by (target, source), keeping the relative order of equal
/// pairs. Weights, if any, are permuted alongside.
///
/// `num_nodes` bounds both endpoints.
pub fn sort_edge_index(
    edges: &EdgeIndex,
    weights: Option<&[f32]>,
    num_nodes: usize,
) -> Result<(EdgeIndex, Option<Vec<f32>>)> {
    edges.validate(num_nodes, num_nodes)?;
    check_weights(weights, edges.len())?;

    let order = sorted_order(edges);
    let weights = weights.map(|w| order.iter().map(|&i| w[i]).collect());
    Ok((edges.select(&order), weights))
}

/// Merge duplicate (source, target) pairs, folding their weights with
/// `reduce`. The result is sorted by (target, source) and has no
/// duplicates; applying it twice changes nothing.
pub fn coalesce(
    edges: &EdgeIndex,
    weights: Option<&[f32]>,
    num_nodes: usize,
    reduce: Aggregation,
) -> Result<(EdgeIndex, Option<Vec<f32>>)> {
    let (sorted, sorted_weights) = sort_edge_index(edges, weights, num_nodes)?;
    let (source, target) = (sorted.source(), sorted.target());

    let mut pairs = Vec::with_capacity(sorted.len());
    let mut merged = sorted_weights.as_ref().map(|_| Vec::with_capacity(sorted.len()));

    let mut start = 0;
    while start < sorted.len() {
        let pair = (source[start], target[start]);
        let mut end = start + 1;
        while end < sorted.len() && (source[end], target[end]) == pair {
            end += 1;
        }
        pairs.push(pair);
        if let (Some(out), Some(w)) = (merged.as_mut(), sorted_weights.as_ref()) {
            out.push(reduce.fold(&w[start..end]));
        }
        start = end;
    }

    Ok((EdgeIndex::from_pairs(pairs), merged))
}
