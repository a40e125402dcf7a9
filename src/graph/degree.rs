//! Node degrees and degree-based edge normalisation.

use super::edge_index::{check_weights, EdgeIndex};
use super::loops::add_self_loops;
use crate::error::{Error, Result};

/// Which endpoint of an edge is counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Count edges arriving at a node (occurrences as target).
    #[default]
    In,
    /// Count edges leaving a node (occurrences as source).
    Out,
}

impl Direction {
    fn side(&self) -> &'static str {
        match self {
            Self::In => "target",
            Self::Out => "source",
        }
    }
}

/// Dense degree vector of length `num_nodes`.
pub fn degree(edges: &EdgeIndex, num_nodes: usize, direction: Direction) -> Result<Vec<usize>> {
    let index = match direction {
        Direction::In => edges.target(),
        Direction::Out => edges.source(),
    };

    let mut counts = vec![0usize; num_nodes];
    for &node in index {
        let slot = counts.get_mut(node).ok_or(Error::IndexOutOfRange {
            what: direction.side(),
            index: node,
            bound: num_nodes,
        })?;
        *slot += 1;
    }
    Ok(counts)
}

/// Symmetric GCN normalisation: `w_ij / sqrt(deg(i) * deg(j))`.
///
/// Degrees are weighted in-degrees. Missing weights count as 1.0; with
/// `add_loops` every node first gets a self-loop of weight 1.0. Nodes of
/// zero degree contribute a factor of 0 instead of dividing by zero.
pub fn gcn_norm(
    edges: &EdgeIndex,
    weights: Option<&[f32]>,
    num_nodes: usize,
    add_loops: bool,
) -> Result<(EdgeIndex, Vec<f32>)> {
    check_weights(weights, edges.len())?;
    edges.validate(num_nodes, num_nodes)?;

    let (edges, weights) = if add_loops {
        add_self_loops(edges, weights, 1.0, num_nodes)?
    } else {
        (edges.clone(), weights.map(<[f32]>::to_vec))
    };
    let weights = weights.unwrap_or_else(|| vec![1.0; edges.len()]);

    let mut deg = vec![0.0f32; num_nodes];
    for (&t, &w) in edges.target().iter().zip(&weights) {
        deg[t] += w;
    }
    let inv_sqrt: Vec<f32> = deg
        .iter()
        .map(|&d| if d > 0.0 { d.powf(-0.5) } else { 0.0 })
        .collect();

    let norm = edges
        .iter()
        .zip(&weights)
        .map(|((s, t), &w)| inv_sqrt[s] * w * inv_sqrt[t])
        .collect();
    Ok((edges, norm))
}
