//! Node masks and label statistics over edge lists.

use super::edge_index::EdgeIndex;
use crate::error::{Error, Result};

/// Boolean mask of length `size` with `true` at every listed index.
pub fn index_to_mask(indices: &[usize], size: usize) -> Result<Vec<bool>> {
    let mut mask = vec![false; size];
    for &i in indices {
        *mask.get_mut(i).ok_or(Error::IndexOutOfRange {
            what: "mask",
            index: i,
            bound: size,
        })? = true;
    }
    Ok(mask)
}

/// Positions of the `true` entries, ascending.
pub fn mask_to_index(mask: &[bool]) -> Vec<usize> {
    mask.iter()
        .enumerate()
        .filter_map(|(i, &set)| set.then_some(i))
        .collect()
}

/// Edge homophily: the fraction of edges whose endpoints share a label.
///
/// Returns `None` for an edge list without edges.
pub fn homophily(edges: &EdgeIndex, labels: &[usize]) -> Result<Option<f64>> {
    edges.validate(labels.len(), labels.len())?;
    if edges.is_empty() {
        return Ok(None);
    }
    let same = edges.iter().filter(|&(s, t)| labels[s] == labels[t]).count();
    Ok(Some(same as f64 / edges.len() as f64))
}
