//! Edge lists in COO form, on the host and on a burn device.

use burn::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Edge list in COO format: edge `k` goes from `source[k]` to `target[k]`.
///
/// Indices are local to the source and destination node sets. Edge order
/// carries no meaning beyond which target each edge belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EdgeIndex {
    source: Vec<usize>,
    target: Vec<usize>,
}

impl EdgeIndex {
    /// Build from parallel source/target vectors of equal length.
    pub fn new(source: Vec<usize>, target: Vec<usize>) -> Result<Self> {
        if source.len() != target.len() {
            return Err(Error::shape("edge index targets", source.len(), target.len()));
        }
        Ok(Self { source, target })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_pairs<I: IntoIterator<Item = (usize, usize)>>(pairs: I) -> Self {
        pairs.into_iter().collect()
    }

    pub fn source(&self) -> &[usize] {
        &self.source
    }

    pub fn target(&self) -> &[usize] {
        &self.target
    }

    pub fn len(&self) -> usize {
        self.source.len()
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    /// Iterate `(source, target)` pairs in storage order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.source.iter().copied().zip(self.target.iter().copied())
    }

    /// Every edge flipped.
    pub fn reversed(&self) -> Self {
        Self {
            source: self.target.clone(),
            target: self.source.clone(),
        }
    }

    /// Check every source index against `num_src` and every target
    /// index against `num_dst`.
    pub fn validate(&self, num_src: usize, num_dst: usize) -> Result<()> {
        check_bounds(&self.source, num_src, "source")?;
        check_bounds(&self.target, num_dst, "target")
    }

    /// Validate and upload to `device`.
    pub fn to_device<B: Backend>(
        &self,
        num_src: usize,
        num_dst: usize,
        device: &B::Device,
    ) -> Result<DeviceEdgeIndex<B>> {
        self.validate(num_src, num_dst)?;
        let num_edges = self.len();
        let upload = |indices: &[usize]| {
            let data: Vec<i64> = indices.iter().map(|&i| i as i64).collect();
            Tensor::<B, 1, Int>::from_data(TensorData::new(data, [num_edges]), device)
        };
        Ok(DeviceEdgeIndex {
            source: upload(&self.source),
            target: upload(&self.target),
            num_src_nodes: num_src,
            num_dst_nodes: num_dst,
            num_edges,
            device: device.clone(),
        })
    }

    /// Edges picked (and possibly repeated) by position.
    pub(crate) fn select(&self, order: &[usize]) -> Self {
        Self {
            source: order.iter().map(|&i| self.source[i]).collect(),
            target: order.iter().map(|&i| self.target[i]).collect(),
        }
    }

    pub(crate) fn extend(&mut self, other: &EdgeIndex) {
        self.source.extend_from_slice(&other.source);
        self.target.extend_from_slice(&other.target);
    }
}

impl FromIterator<(usize, usize)> for EdgeIndex {
    fn from_iter<I: IntoIterator<Item = (usize, usize)>>(iter: I) -> Self {
        let (source, target) = iter.into_iter().unzip();
        Self { source, target }
    }
}

fn check_bounds(indices: &[usize], bound: usize, what: &'static str) -> Result<()> {
    match indices.iter().find(|&&i| i >= bound) {
        Some(&index) => Err(Error::IndexOutOfRange { what, index, bound }),
        None => Ok(()),
    }
}

/// Per-edge weights must line up with the edges they describe.
pub(crate) fn check_weights(weights: Option<&[f32]>, num_edges: usize) -> Result<()> {
    match weights {
        Some(w) if w.len() != num_edges => Err(Error::shape("edge weights", num_edges, w.len())),
        _ => Ok(()),
    }
}

/// A validated edge index living on a burn device.
///
/// Carries the node counts it was validated against, so gathers and
/// reductions never infer a node count from the largest index.
#[derive(Debug, Clone)]
pub struct DeviceEdgeIndex<B: Backend> {
    source: Tensor<B, 1, Int>,
    target: Tensor<B, 1, Int>,
    num_src_nodes: usize,
    num_dst_nodes: usize,
    num_edges: usize,
    device: B::Device,
}

impl<B: Backend> DeviceEdgeIndex<B> {
    pub fn source(&self) -> Tensor<B, 1, Int> {
        self.source.clone()
    }

    pub fn target(&self) -> Tensor<B, 1, Int> {
        self.target.clone()
    }

    pub fn num_src_nodes(&self) -> usize {
        self.num_src_nodes
    }

    pub fn num_dst_nodes(&self) -> usize {
        self.num_dst_nodes
    }

    pub fn num_edges(&self) -> usize {
        self.num_edges
    }

    pub fn is_empty(&self) -> bool {
        self.num_edges == 0
    }

    pub fn device(&self) -> &B::Device {
        &self.device
    }
}

// ─── Tests ────────────────────────────────────────────────────────
