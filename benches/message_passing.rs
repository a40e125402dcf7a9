//! Throughput benchmark for the message-passing primitives.
//!
//! Measures, on CPU:
//! 1. segment_reduce (sum and max) over per-edge rows
//! 2. segment_softmax over multi-head scores
//! 3. HGT forward pass on a two-type synthetic graph

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use burn::backend::NdArray;
use burn::tensor::backend::Backend;
use burn::tensor::{Distribution, Int, Tensor, TensorData};

use hetmp::{
    segment_reduce, segment_softmax, Aggregation, EdgeIndex, EdgeIndices, EdgeType,
    HgtConvConfig, InChannels, Metadata, NodeFeatures,
};

type B = NdArray;

/// Deterministic pseudo-random edges between `num_src` and `num_dst` nodes.
fn synthetic_edges(num_edges: usize, num_src: usize, num_dst: usize) -> EdgeIndex {
    (0..num_edges)
        .map(|i| ((i * 7919) % num_src, (i * 104_729 + 13) % num_dst))
        .collect()
}

fn group_ids(edges: &EdgeIndex, device: &<B as Backend>::Device) -> Tensor<B, 1, Int> {
    let targets: Vec<i64> = edges.target().iter().map(|&t| t as i64).collect();
    Tensor::from_data(TensorData::new(targets, [edges.len()]), device)
}

fn bench_segment_reduce(c: &mut Criterion) {
    let device = Default::default();
    let edges = synthetic_edges(10_000, 1_000, 1_000);
    let values = Tensor::<B, 2>::random([10_000, 64], Distribution::Default, &device);
    let ids = group_ids(&edges, &device);

    let mut group = c.benchmark_group("segment_reduce");
    for op in [Aggregation::Sum, Aggregation::Max] {
        group.bench_function(op.as_str(), |b| {
            b.iter(|| {
                segment_reduce(black_box(values.clone()), ids.clone(), 1_000, op)
            })
        });
    }
    group.finish();
}

fn bench_segment_softmax(c: &mut Criterion) {
    let device = Default::default();
    let edges = synthetic_edges(10_000, 1_000, 1_000);
    let scores = Tensor::<B, 2>::random([10_000, 8], Distribution::Normal(0.0, 3.0), &device);
    let ids = group_ids(&edges, &device);

    c.bench_function("segment_softmax_10k_edges_8_heads", |b| {
        b.iter(|| segment_softmax(black_box(scores.clone()), ids.clone(), 1_000))
    });
}

fn bench_hgt_forward(c: &mut Criterion) {
    let device = Default::default();
    let metadata = Metadata::new(
        ["author", "paper"],
        [
            EdgeType::new("author", "writes", "paper"),
            EdgeType::new("paper", "cites", "paper"),
            EdgeType::new("paper", "written_by", "author"),
        ],
    );
    let layer = HgtConvConfig::new(InChannels::Uniform(64), 64, metadata)
        .with_heads(4)
        .init::<B>(&device)
        .expect("valid config");

    let mut x = NodeFeatures::<B>::new();
    x.insert("author".into(), Tensor::random([500, 64], Distribution::Default, &device));
    x.insert("paper".into(), Tensor::random([2_000, 64], Distribution::Default, &device));

    let writes = synthetic_edges(4_000, 500, 2_000);
    let mut edges = EdgeIndices::new();
    edges.insert(EdgeType::new("paper", "written_by", "author"), writes.reversed());
    edges.insert(EdgeType::new("author", "writes", "paper"), writes);
    edges.insert(
        EdgeType::new("paper", "cites", "paper"),
        synthetic_edges(8_000, 2_000, 2_000),
    );

    c.bench_function("hgt_forward_2_types_16k_edges", |b| {
        b.iter(|| layer.forward(black_box(&x), black_box(&edges)))
    });
}

criterion_group!(
    benches,
    bench_segment_reduce,
    bench_segment_softmax,
    bench_hgt_forward
);
criterion_main!(benches);
