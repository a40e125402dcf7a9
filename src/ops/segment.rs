//! Segment reductions: fold rows that share a group id into one row.
//!
//! burn has a scatter-add but no grouped min/max, so the extremal
//! reductions pick the winning row per (group, column) on the host and
//! gather it on the device. Gradients then flow through the selected
//! entries only, as with any max-pooling.

use std::fmt;
use std::str::FromStr;

use burn::prelude::*;
use burn::tensor::IndexingUpdateOp;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Reduction applied within a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    #[default]
    Sum,
    Mean,
    Min,
    Max,
}

impl Aggregation {
    pub const ALL: [Aggregation; 4] = [Self::Sum, Self::Mean, Self::Min, Self::Max];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sum => "sum",
            Self::Mean => "mean",
            Self::Min => "min",
            Self::Max => "max",
        }
    }

    /// Reduce a host slice. An empty slice reduces to 0.0 for every op.
    pub fn fold(&self, values: &[f32]) -> f32 {
        if values.is_empty() {
            return 0.0;
        }
        match self {
            Self::Sum => values.iter().sum(),
            Self::Mean => values.iter().sum::<f32>() / values.len() as f32,
            Self::Min => values.iter().copied().fold(f32::INFINITY, f32::min),
            Self::Max => values.iter().copied().fold(f32::NEG_INFINITY, f32::max),
        }
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Aggregation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "sum" | "add" => Ok(Self::Sum),
            "mean" => Ok(Self::Mean),
            "min" => Ok(Self::Min),
            "max" => Ok(Self::Max),
            other => Err(Error::InvalidConfig(format!(
                "unknown aggregation `{}` (expected sum, mean, min or max)",
                other
            ))),
        }
    }
}

/// Unchecked segment sum: row `k` of `rows` is added into output row
/// `group_ids[k]` of a [group_count, C] zero tensor.
///
/// Ids are trusted as given; an id outside `[0, group_count)` is a backend
/// panic. [`segment_reduce`] validates first.
pub fn scatter_add<B: Backend>(
    rows: Tensor<B, 2>,
    group_ids: Tensor<B, 1, Int>,
    group_count: usize,
) -> Tensor<B, 2> {
    let device = rows.device();
    let [num_rows, width] = rows.dims();
    let index = group_ids.unsqueeze_dim::<2>(1).expand([num_rows, width]);

    Tensor::<B, 2>::zeros([group_count, width], &device).scatter(
        0,
        index,
        rows,
        IndexingUpdateOp::Add,
    )
}

/// Number of members per group as a [group_count, 1] float column.
pub fn segment_count<B: Backend>(group_ids: Tensor<B, 1, Int>, group_count: usize) -> Tensor<B, 2> {
    let device = group_ids.device();
    let num_edges = group_ids.dims()[0];
    if num_edges == 0 {
        return Tensor::zeros([group_count, 1], &device);
    }
    let ones = Tensor::<B, 2>::ones([num_edges, 1], &device);
    scatter_add(ones, group_ids, group_count)
}

/// Reduce `values` row-wise within each group.
///
/// - `values`: [E, C]
/// - `group_ids`: [E], each in `[0, group_count)`, any order
///
/// Returns [group_count, C]. A group without members yields a zero row
/// for every op, including min and max. Ids are read back and checked for
/// every op, so a bad id is an error rather than a backend panic.
pub fn segment_reduce<B: Backend>(
    values: Tensor<B, 2>,
    group_ids: Tensor<B, 1, Int>,
    group_count: usize,
    op: Aggregation,
) -> Result<Tensor<B, 2>> {
    let [num_edges, width] = values.dims();
    let num_ids = group_ids.dims()[0];
    if num_ids != num_edges {
        return Err(Error::shape("segment group ids", num_edges, num_ids));
    }
    if num_edges == 0 {
        return Ok(Tensor::zeros([group_count, width], &values.device()));
    }
    let ids = read_group_ids(group_ids.clone(), group_count)?;

    match op {
        Aggregation::Sum => Ok(scatter_add(values, group_ids, group_count)),
        Aggregation::Mean => {
            let counts = segment_count(group_ids.clone(), group_count).clamp_min(1.0);
            let sums = scatter_add(values, group_ids, group_count);
            Ok(sums / counts.expand([group_count, width]))
        }
        Aggregation::Min | Aggregation::Max => segment_extremum(values, &ids, group_count, op),
    }
}

fn segment_extremum<B: Backend>(
    values: Tensor<B, 2>,
    ids: &[usize],
    group_count: usize,
    op: Aggregation,
) -> Result<Tensor<B, 2>> {
    let width = values.dims()[1];
    let device = values.device();
    let data = values
        .clone()
        .into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| Error::TensorData(format!("{:?}", e)))?;

    let wins = |candidate: f32, current: f32| match op {
        Aggregation::Max => candidate > current,
        _ => candidate < current,
    };

    // Winning row per (group, column).
    let mut best: Vec<Option<usize>> = vec![None; group_count * width];
    for (row, &group) in ids.iter().enumerate() {
        for col in 0..width {
            let candidate = data[row * width + col];
            let slot = &mut best[group * width + col];
            match *slot {
                Some(current) if !wins(candidate, data[current * width + col]) => {}
                _ => *slot = Some(row),
            }
        }
    }

    let rows: Vec<i64> = best.iter().map(|r| r.unwrap_or(0) as i64).collect();
    let mask: Vec<f32> = best
        .iter()
        .map(|r| if r.is_some() { 1.0 } else { 0.0 })
        .collect();

    let rows = Tensor::<B, 2, Int>::from_data(TensorData::new(rows, [group_count, width]), &device);
    let mask = Tensor::<B, 2>::from_data(TensorData::new(mask, [group_count, width]), &device);

    Ok(values.gather(0, rows) * mask)
}

/// Read group ids back to the host, checking each against `bound`.
fn read_group_ids<B: Backend>(
    group_ids: Tensor<B, 1, Int>,
    bound: usize,
) -> Result<Vec<usize>> {
    let raw = group_ids
        .into_data()
        .convert::<i64>()
        .to_vec::<i64>()
        .map_err(|e| Error::TensorData(format!("{:?}", e)))?;

    raw.into_iter()
        .map(|id| match usize::try_from(id) {
            Ok(index) if index < bound => Ok(index),
            Ok(index) => Err(Error::IndexOutOfRange {
                what: "group",
                index,
                bound,
            }),
            Err(_) => Err(Error::NegativeIndex {
                what: "group",
                index: id,
            }),
        })
        .collect()
}

// ─── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type B = NdArray;

    fn values(t: Tensor<B, 2>) -> Vec<f32> {
        t.into_data().to_vec::<f32>().unwrap()
    }

    #[test]
    fn scatter_add_basic() {
        let device = Default::default();
        let src = Tensor::<B, 2>::from_floats([[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]], &device);
        let dst = Tensor::<B, 1, Int>::from_ints([0, 0, 1], &device);

        let result = scatter_add(src, dst, 2);
        let data = result.to_data();
        assert_eq!(data.as_slice::<f32>().unwrap(), &[4.0, 6.0, 5.0, 6.0]);
    }

    #[test]
    fn sum_leaves_empty_groups_at_zero() {
        let device = Default::default();
        let src = Tensor::<B, 2>::from_floats([[1.0], [2.0], [4.0]], &device);
        let ids = Tensor::<B, 1, Int>::from_ints([2, 0, 2], &device);

        let out = segment_reduce(src, ids, 4, Aggregation::Sum).unwrap();
        assert_eq!(values(out), vec![2.0, 0.0, 5.0, 0.0]);
    }

    #[test]
    fn mean_divides_by_member_count() {
        let device = Default::default();
        let src = Tensor::<B, 2>::from_floats([[1.0, 10.0], [3.0, 30.0], [7.0, 70.0]], &device);
        let ids = Tensor::<B, 1, Int>::from_ints([1, 1, 0], &device);

        let out = segment_reduce(src, ids, 3, Aggregation::Mean).unwrap();
        assert_eq!(values(out), vec![7.0, 70.0, 2.0, 20.0, 0.0, 0.0]);
    }

    #[test]
    fn max_and_min_pick_per_column() {
        let device = Default::default();
        let src = Tensor::<B, 2>::from_floats([[1.0, -5.0], [3.0, -9.0], [-2.0, 4.0]], &device);
        let ids = Tensor::<B, 1, Int>::from_ints([0, 0, 1], &device);

        let max = segment_reduce(src.clone(), ids.clone(), 3, Aggregation::Max).unwrap();
        assert_eq!(values(max), vec![3.0, -5.0, -2.0, 4.0, 0.0, 0.0]);

        let min = segment_reduce(src, ids, 3, Aggregation::Min).unwrap();
        assert_eq!(values(min), vec![1.0, -9.0, -2.0, 4.0, 0.0, 0.0]);
    }

    #[test]
    fn max_of_all_negative_group_is_not_clamped_to_zero() {
        let device = Default::default();
        let src = Tensor::<B, 2>::from_floats([[-3.0], [-1.0]], &device);
        let ids = Tensor::<B, 1, Int>::from_ints([0, 0], &device);

        let max = segment_reduce(src, ids, 1, Aggregation::Max).unwrap();
        assert_eq!(values(max), vec![-1.0]);
    }

    #[test]
    fn empty_input_yields_zero_rows() {
        let device = Default::default();
        let src = Tensor::<B, 2>::zeros([0, 3], &device);
        let ids = Tensor::<B, 1, Int>::zeros([0], &device);

        for op in Aggregation::ALL {
            let out = segment_reduce(src.clone(), ids.clone(), 2, op).unwrap();
            assert_eq!(out.dims(), [2, 3]);
            assert!(values(out).iter().all(|&v| v == 0.0), "{}", op);
        }
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let device = Default::default();
        let src = Tensor::<B, 2>::zeros([3, 2], &device);
        let ids = Tensor::<B, 1, Int>::from_ints([0, 1], &device);

        let err = segment_reduce(src, ids, 2, Aggregation::Sum).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { expected: 3, got: 2, .. }));
    }

    #[test]
    fn extremum_rejects_out_of_range_group() {
        let device = Default::default();
        let src = Tensor::<B, 2>::zeros([2, 1], &device);
        let ids = Tensor::<B, 1, Int>::from_ints([0, 5], &device);

        let err = segment_reduce(src, ids, 2, Aggregation::Max).unwrap_err();
        assert_eq!(
            err,
            Error::IndexOutOfRange {
                what: "group",
                index: 5,
                bound: 2
            }
        );
    }

    #[test]
    fn every_op_rejects_out_of_range_group() {
        let device = Default::default();
        let src = Tensor::<B, 2>::ones([2, 1], &device);
        let ids = Tensor::<B, 1, Int>::from_ints([0, 5], &device);

        for op in Aggregation::ALL {
            let err = segment_reduce(src.clone(), ids.clone(), 2, op).unwrap_err();
            assert_eq!(
                err,
                Error::IndexOutOfRange {
                    what: "group",
                    index: 5,
                    bound: 2
                },
                "{}",
                op
            );
        }
    }

    #[test]
    fn negative_group_is_reported_as_is() {
        let device = Default::default();
        let src = Tensor::<B, 2>::ones([2, 1], &device);
        let ids = Tensor::<B, 1, Int>::from_ints([-3, 0], &device);

        let err = segment_reduce(src, ids, 2, Aggregation::Mean).unwrap_err();
        assert_eq!(
            err,
            Error::NegativeIndex {
                what: "group",
                index: -3
            }
        );
        assert_eq!(err.to_string(), "group index -3 is negative");
    }

    #[test]
    fn aggregation_parses_and_folds() {
        assert_eq!("mean".parse::<Aggregation>().unwrap(), Aggregation::Mean);
        assert!("median".parse::<Aggregation>().is_err());
        assert_eq!(Aggregation::Max.fold(&[1.0, 4.0, 2.0]), 4.0);
        assert_eq!(Aggregation::Mean.fold(&[1.0, 2.0]), 1.5);
        assert_eq!(Aggregation::Min.fold(&[]), 0.0);
    }
}
