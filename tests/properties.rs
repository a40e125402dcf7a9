//! Property-based tests for the graph utilities and segment primitives.
//!
//! These tests verify invariants that should hold for any edge list:
//! - Coalescing is idempotent and duplicate-free
//! - Self-loop round trips
//! - Symmetrisation
//! - Order independence of segment reductions and softmax normalisation

use burn::backend::NdArray;
use burn::tensor::{Int, Tensor, TensorData};
use hetmp::{Aggregation, EdgeIndex};
use proptest::prelude::*;

type B = NdArray;

/// Node count plus edges whose endpoints stay below it.
fn arb_graph() -> impl Strategy<Value = (usize, EdgeIndex)> {
    (1usize..12).prop_flat_map(|n| {
        (
            Just(n),
            prop::collection::vec((0..n, 0..n), 0..40)
                .prop_map(|pairs| pairs.into_iter().collect::<EdgeIndex>()),
        )
    })
}

/// A graph with one small integer weight per edge.
fn arb_weighted_graph() -> impl Strategy<Value = (usize, EdgeIndex, Vec<f32>)> {
    arb_graph().prop_flat_map(|(n, edges)| {
        let len = edges.len();
        (
            Just(n),
            Just(edges),
            prop::collection::vec((-8i32..8).prop_map(|w| w as f32), len),
        )
    })
}

fn ids(values: &[usize]) -> Tensor<B, 1, Int> {
    let data: Vec<i64> = values.iter().map(|&v| v as i64).collect();
    Tensor::from_data(TensorData::new(data, [values.len()]), &Default::default())
}

fn rows(values: &[f32], width: usize) -> Tensor<B, 2> {
    Tensor::from_data(
        TensorData::new(values.to_vec(), [values.len() / width, width]),
        &Default::default(),
    )
}

fn to_vec(t: Tensor<B, 2>) -> Vec<f32> {
    t.into_data().to_vec::<f32>().unwrap()
}

mod graph_props {
    use super::*;
    use hetmp::{
        add_self_loops, coalesce, contains_self_loops, is_undirected, remove_self_loops,
        to_undirected,
    };

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn coalesce_is_idempotent((n, edges, weights) in arb_weighted_graph()) {
            let (once, w_once) = coalesce(&edges, Some(&weights), n, Aggregation::Sum).unwrap();
            let (twice, w_twice) =
                coalesce(&once, w_once.as_deref(), n, Aggregation::Sum).unwrap();

            prop_assert_eq!(&once, &twice);
            prop_assert_eq!(w_once, w_twice);

            let pairs: Vec<_> = once.iter().collect();
            prop_assert!(
                pairs.windows(2).all(|w| (w[0].1, w[0].0) < (w[1].1, w[1].0)),
                "not strictly sorted by (target, source): {:?}",
                pairs
            );
        }

        #[test]
        fn coalesce_preserves_total_weight((n, edges, weights) in arb_weighted_graph()) {
            let (_, merged) = coalesce(&edges, Some(&weights), n, Aggregation::Sum).unwrap();
            let before: f32 = weights.iter().sum();
            let after: f32 = merged.unwrap().iter().sum();
            prop_assert_eq!(before, after);
        }

        #[test]
        fn self_loop_round_trip((n, edges) in arb_graph()) {
            let (clean, _) = remove_self_loops(&edges, None).unwrap();
            prop_assert!(!contains_self_loops(&clean));

            let (looped, _) = add_self_loops(&clean, None, 1.0, n).unwrap();
            prop_assert_eq!(looped.len(), clean.len() + n);

            let (restored, _) = remove_self_loops(&looped, None).unwrap();
            prop_assert_eq!(restored, clean);
        }

        #[test]
        fn to_undirected_output_is_undirected((n, edges, weights) in arb_weighted_graph()) {
            let (sym, sym_w) = to_undirected(&edges, Some(&weights), n, Aggregation::Sum).unwrap();
            prop_assert!(is_undirected(&sym, sym_w.as_deref(), n).unwrap());
            prop_assert!(sym.len() <= 2 * edges.len());
        }
    }
}

mod segment_props {
    use super::*;
    use hetmp::{segment_reduce, segment_softmax};

    /// Per-edge values [E, 2] for a graph, plus a permutation of its edges.
    fn arb_messages() -> impl Strategy<Value = (usize, Vec<usize>, Vec<f32>, Vec<usize>)> {
        arb_graph().prop_flat_map(|(n, edges)| {
            let len = edges.len();
            let targets = edges.target().to_vec();
            (
                Just(n),
                Just(targets),
                prop::collection::vec(-50.0f32..50.0, 2 * len),
                Just((0..len).collect::<Vec<_>>()).prop_shuffle(),
            )
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn reduction_ignores_edge_order((n, targets, values, perm) in arb_messages()) {
            let permuted_targets: Vec<usize> = perm.iter().map(|&i| targets[i]).collect();
            let permuted_values: Vec<f32> = perm
                .iter()
                .flat_map(|&i| [values[2 * i], values[2 * i + 1]])
                .collect();

            for op in Aggregation::ALL {
                let a = segment_reduce(rows(&values, 2), ids(&targets), n, op).unwrap();
                let b = segment_reduce(rows(&permuted_values, 2), ids(&permuted_targets), n, op)
                    .unwrap();
                for (x, y) in to_vec(a).iter().zip(to_vec(b)) {
                    prop_assert!((x - y).abs() < 1e-2, "{}: {} vs {}", op, x, y);
                }
            }
        }

        #[test]
        fn softmax_groups_sum_to_one((n, targets, values, _perm) in arb_messages()) {
            let alpha = to_vec(segment_softmax(rows(&values, 2), ids(&targets), n).unwrap());
            prop_assert!(alpha.iter().all(|&a| (0.0..=1.0 + 1e-6).contains(&a)));

            let mut sums = vec![[0.0f32; 2]; n];
            for (e, &t) in targets.iter().enumerate() {
                sums[t][0] += alpha[2 * e];
                sums[t][1] += alpha[2 * e + 1];
            }
            for (node, sum) in sums.iter().enumerate() {
                if targets.contains(&node) {
                    prop_assert!((sum[0] - 1.0).abs() < 1e-4 && (sum[1] - 1.0).abs() < 1e-4,
                        "node {} sums to {:?}", node, sum);
                }
            }
        }

        #[test]
        fn softmax_is_shift_invariant(
            (n, targets, values, _perm) in arb_messages(),
            shift in -100.0f32..100.0,
        ) {
            let shifted: Vec<f32> = values.iter().map(|v| v + shift).collect();
            let a = to_vec(segment_softmax(rows(&values, 2), ids(&targets), n).unwrap());
            let b = to_vec(segment_softmax(rows(&shifted, 2), ids(&targets), n).unwrap());
            for (x, y) in a.iter().zip(b) {
                prop_assert!((x - y).abs() < 1e-4, "{} vs {}", x, y);
            }
        }
    }
}
