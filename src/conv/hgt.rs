//! Heterogeneous Graph Transformer convolution.
//!
//! Every node type has its own query/key/value/output projections and a
//! residual gate; every edge type has its own per-head key and value maps
//! and a per-head prior on its attention scores. For one edge type
//! (s, r, t) and an edge j → i:
//!
//! ```text
//! score_h(j, i) = <k_j W^att_r,h , q_i>_h * mu_r,h / sqrt(d)
//! alpha_h(j, i) = softmax over all edges of type r entering i
//! msg(j, i)     = || over h of alpha_h(j, i) * v_j W^msg_r,h
//! ```
//!
//! Messages are summed per destination within an edge type, the results of
//! all edge types entering a node type are combined with the configured
//! group op, and the node type's output projection plus gate produce:
//!
//! ```text
//! h_i' = sigmoid(skip) * A(agg_i) + (1 - sigmoid(skip)) * h_i
//! ```
//!
//! The gate blend needs matching input and output widths; for node types
//! whose widths differ the projected aggregate is returned as is.
//!
//! Attention dropout is applied after the softmax, so during training a
//! destination's weights only sum to one in expectation.
//!
//! # Reference
//!
//! Hu et al., "Heterogeneous Graph Transformer", WWW 2020.

use std::collections::{BTreeMap, HashMap};

use burn::config::Config;
use burn::module::{Ignored, Module, Param};
use burn::nn::{Dropout, DropoutConfig};
use burn::prelude::*;
use burn::tensor::activation::sigmoid;
use burn::tensor::Distribution;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use super::message_passing::{MessageContext, MessagePassing, Shared, Source, Target};
use super::projection::{Projection, ProjectionConfig};
use crate::error::{self, Error};
use crate::graph::{EdgeIndex, EdgeType, Metadata, NodeType, TypeRegistry};
use crate::ops::{segment_softmax, Aggregation};

/// Node type → feature tensor [num_nodes, in_channels].
pub type NodeFeatures<B> = HashMap<NodeType, Tensor<B, 2>>;

/// Edge type → edge list, indices local to the source and destination types.
pub type EdgeIndices = HashMap<EdgeType, EdgeIndex>;

/// Standard deviation of the relation transform initialisation.
const RELATION_INIT_STD: f64 = 0.05;

// ─── Configuration ────────────────────────────────────────────────

/// Input width of each node type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InChannels {
    /// Take every width from the first observed input.
    Infer,
    /// Same width for every node type.
    Uniform(usize),
    /// Width per node type label; unlisted types are inferred.
    PerType(BTreeMap<String, usize>),
}

impl InChannels {
    fn declared(&self, node_type: &NodeType) -> Option<usize> {
        match self {
            Self::Infer => None,
            Self::Uniform(width) => Some(*width),
            Self::PerType(widths) => widths.get(node_type.as_str()).copied(),
        }
    }
}

/// HGT layer configuration.
#[derive(Config, Debug)]
pub struct HgtConvConfig {
    /// Input width per node type.
    pub in_channels: InChannels,
    /// Output width (heads × head_dim).
    pub out_channels: usize,
    /// Node and edge types the layer holds parameters for.
    pub metadata: Metadata,
    /// Number of attention heads.
    #[config(default = 1)]
    pub heads: usize,
    /// How results of different edge types entering a node type combine.
    #[config(default = "Aggregation::Sum")]
    pub group: Aggregation,
    /// Attention dropout rate (inactive outside training).
    #[config(default = 0.0)]
    pub dropout: f64,
}

impl HgtConvConfig {
    /// Initialise a layer whose input widths are all declared.
    pub fn init<B: Backend>(&self, device: &B::Device) -> error::Result<HgtConv<B>> {
        let registry = TypeRegistry::new(&self.metadata)?;
        let widths = registry
            .node_types()
            .iter()
            .map(|node_type| {
                self.in_channels.declared(node_type).ok_or_else(|| {
                    Error::InvalidConfig(format!(
                        "input width of node type `{}` is not declared; use init_with_inputs",
                        node_type
                    ))
                })
            })
            .collect::<error::Result<Vec<_>>>()?;
        self.build(registry, widths, device)
    }

    /// Initialise a layer, taking undeclared input widths from `x`.
    ///
    /// Declared widths must agree with the observed ones.
    pub fn init_with_inputs<B: Backend>(
        &self,
        x: &NodeFeatures<B>,
        device: &B::Device,
    ) -> error::Result<HgtConv<B>> {
        let registry = TypeRegistry::new(&self.metadata)?;
        for node_type in x.keys() {
            registry.node_id(node_type)?;
        }

        let widths = registry
            .node_types()
            .iter()
            .map(|node_type| {
                let observed = x.get(node_type).map(|features| features.dims()[1]);
                match (self.in_channels.declared(node_type), observed) {
                    (Some(declared), Some(seen)) if declared != seen => Err(Error::shape(
                        format!("input width of node type `{}`", node_type),
                        declared,
                        seen,
                    )),
                    (Some(width), _) | (None, Some(width)) => Ok(width),
                    (None, None) => Err(Error::MissingArgument(format!(
                        "features of node type `{}` are needed to infer its input width",
                        node_type
                    ))),
                }
            })
            .collect::<error::Result<Vec<_>>>()?;
        self.build(registry, widths, device)
    }

    fn validate(&self) -> error::Result<()> {
        if self.heads == 0 {
            return Err(Error::InvalidConfig("heads must be at least 1".into()));
        }
        if self.out_channels == 0 || self.out_channels % self.heads != 0 {
            return Err(Error::InvalidConfig(format!(
                "out_channels ({}) must be a positive multiple of heads ({})",
                self.out_channels, self.heads
            )));
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return Err(Error::InvalidConfig(format!(
                "dropout must be in [0, 1), got {}",
                self.dropout
            )));
        }
        Ok(())
    }

    fn build<B: Backend>(
        &self,
        registry: TypeRegistry,
        widths: Vec<usize>,
        device: &B::Device,
    ) -> error::Result<HgtConv<B>> {
        self.validate()?;
        let head_dim = self.out_channels / self.heads;

        let node_params = widths
            .iter()
            .map(|&width| NodeTypeParams::new(width, self.out_channels, device))
            .collect();
        let relation_params = (0..registry.num_edge_types())
            .map(|_| RelationParams::new(self.heads, head_dim, device))
            .collect();

        debug!(
            node_types = registry.num_node_types(),
            edge_types = registry.num_edge_types(),
            heads = self.heads,
            out_channels = self.out_channels,
            group = %self.group,
            "initialised HGT layer"
        );

        Ok(HgtConv {
            node_params,
            relation_params,
            dropout: DropoutConfig::new(self.dropout).init(),
            heads: self.heads,
            head_dim,
            group: Ignored(self.group),
            registry: Ignored(registry),
        })
    }
}

// ─── Parameters ───────────────────────────────────────────────────

/// Parameters owned by one node type.
#[derive(Module, Debug)]
pub struct NodeTypeParams<B: Backend> {
    k_lin: Projection<B>,
    q_lin: Projection<B>,
    v_lin: Projection<B>,
    /// Output projection applied to the aggregated messages.
    a_lin: Projection<B>,
    /// Residual gate logit.
    skip: Param<Tensor<B, 1>>,
    in_channels: usize,
}

impl<B: Backend> NodeTypeParams<B> {
    fn new(in_channels: usize, out_channels: usize, device: &B::Device) -> Self {
        let input = ProjectionConfig::new(in_channels, out_channels);
        Self {
            k_lin: input.init(device),
            q_lin: input.init(device),
            v_lin: input.init(device),
            a_lin: ProjectionConfig::new(out_channels, out_channels).init(device),
            skip: Param::from_tensor(Tensor::ones([1], device)),
            in_channels,
        }
    }
}

/// Parameters owned by one edge type.
#[derive(Module, Debug)]
pub struct RelationParams<B: Backend> {
    /// Per-head key transform [heads, head_dim, head_dim].
    a_rel: Param<Tensor<B, 3>>,
    /// Per-head value transform [heads, head_dim, head_dim].
    m_rel: Param<Tensor<B, 3>>,
    /// Per-head score prior [heads].
    p_rel: Param<Tensor<B, 1>>,
}

impl<B: Backend> RelationParams<B> {
    fn new(heads: usize, head_dim: usize, device: &B::Device) -> Self {
        Self {
            a_rel: Param::from_tensor(clipped_normal([heads, head_dim, head_dim], device)),
            m_rel: Param::from_tensor(clipped_normal([heads, head_dim, head_dim], device)),
            p_rel: Param::from_tensor(Tensor::ones([heads], device)),
        }
    }
}

/// Normal(0, RELATION_INIT_STD) clipped to two standard deviations.
fn clipped_normal<B: Backend, const D: usize>(shape: [usize; D], device: &B::Device) -> Tensor<B, D> {
    let bound = 2.0 * RELATION_INIT_STD;
    Tensor::random(shape, Distribution::Normal(0.0, RELATION_INIT_STD), device).clamp(-bound, bound)
}

/// Apply one [d, d] map per head: [N, H, d] × [H, d, d] → [N, H, d].
fn relation_transform<B: Backend>(x: Tensor<B, 3>, weight: Tensor<B, 3>) -> Tensor<B, 3> {
    x.swap_dims(0, 1).matmul(weight).swap_dims(0, 1)
}

/// Per-head query, key and value of one node type, each [N, H, d].
struct Projected<B: Backend> {
    q: Tensor<B, 3>,
    k: Tensor<B, 3>,
    v: Tensor<B, 3>,
}

// ─── Layer ────────────────────────────────────────────────────────

/// Heterogeneous Graph Transformer layer.
#[derive(Module, Debug)]
pub struct HgtConv<B: Backend> {
    node_params: Vec<NodeTypeParams<B>>,
    relation_params: Vec<RelationParams<B>>,
    dropout: Dropout,
    heads: usize,
    head_dim: usize,
    group: Ignored<Aggregation>,
    registry: Ignored<TypeRegistry>,
}

impl<B: Backend> HgtConv<B> {
    /// Forward pass over a heterogeneous graph.
    ///
    /// - `x`: features per node type; every type must be in the metadata
    ///   and have its declared width
    /// - `edges`: edge lists per edge type; types absent here contribute
    ///   nothing, as do edge types with an empty edge list
    ///
    /// Returns updated features [num_nodes, out_channels] for every node
    /// type present in `x`.
    pub fn forward(
        &self,
        x: &NodeFeatures<B>,
        edges: &EdgeIndices,
    ) -> error::Result<HeteroOutput<B>> {
        let registry = &self.registry.0;

        let mut inputs: Vec<Option<Tensor<B, 2>>> = vec![None; registry.num_node_types()];
        for (node_type, features) in x {
            let id = registry.node_id(node_type)?;
            let expected = self.node_params[id].in_channels;
            let got = features.dims()[1];
            if got != expected {
                return Err(Error::shape(
                    format!("features of node type `{}`", node_type),
                    expected,
                    got,
                ));
            }
            inputs[id] = Some(features.clone());
        }

        let mut relations = edges
            .iter()
            .map(|(edge_type, edge_index)| Ok((registry.edge_id(edge_type)?, edge_index)))
            .collect::<error::Result<Vec<_>>>()?;
        relations.sort_by_key(|&(id, _)| id);

        debug!(
            node_types = x.len(),
            edge_types = relations.len(),
            heads = self.heads,
            "HGT forward"
        );

        let projected: Vec<Option<Projected<B>>> = inputs
            .iter()
            .enumerate()
            .map(|(id, features)| features.clone().map(|f| self.project(id, f)))
            .collect();

        let mut incoming: Vec<Vec<Tensor<B, 2>>> = vec![Vec::new(); registry.num_node_types()];
        let mut touched = vec![false; registry.num_node_types()];

        for (edge_id, edge_index) in relations {
            let edge_type = registry.edge_type(edge_id);
            let (src, dst) = registry.endpoints(edge_id);
            let (Some(src_proj), Some(dst_proj)) = (&projected[src], &projected[dst]) else {
                let missing = if projected[src].is_none() { src } else { dst };
                return Err(Error::MissingArgument(format!(
                    "features of node type `{}` required by edge type {}",
                    registry.node_type(missing),
                    edge_type
                )));
            };
            touched[src] = true;
            touched[dst] = true;

            let device = dst_proj.q.device();
            let edge_index =
                edge_index.to_device::<B>(src_proj.k.dims()[0], dst_proj.q.dims()[0], &device)?;
            trace!(edge_type = %edge_type, num_edges = edge_index.num_edges(), "relation");
            if edge_index.is_empty() {
                continue;
            }

            let params = &self.relation_params[edge_id];
            let k = relation_transform(src_proj.k.clone(), params.a_rel.val());
            let v = relation_transform(src_proj.v.clone(), params.m_rel.val());

            let out = self.propagate(
                &edge_index,
                (
                    Target(dst_proj.q.clone()),
                    Source(k),
                    Source(v),
                    Shared(params.p_rel.val()),
                ),
            )?;
            incoming[dst].push(out);
        }

        let mut outputs = HashMap::with_capacity(x.len());
        for (id, features) in inputs.into_iter().enumerate() {
            let Some(features) = features else {
                continue;
            };
            let node_type = registry.node_type(id);
            if !touched[id] {
                warn!(node_type = %node_type, "node type takes part in no edge type");
            }

            let aggregated = self.group_relations(
                std::mem::take(&mut incoming[id]),
                features.dims()[0],
                &features.device(),
            );
            outputs.insert(node_type.clone(), self.update_node(id, aggregated, features));
        }

        Ok(HeteroOutput {
            outputs,
            known: registry.node_types().to_vec(),
        })
    }

    pub fn heads(&self) -> usize {
        self.heads
    }

    pub fn head_dim(&self) -> usize {
        self.head_dim
    }

    pub fn out_channels(&self) -> usize {
        self.heads * self.head_dim
    }

    pub fn group(&self) -> Aggregation {
        self.group.0
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry.0
    }

    /// Declared input width of a node type.
    pub fn in_channels(&self, node_type: &NodeType) -> error::Result<usize> {
        let id = self.registry.0.node_id(node_type)?;
        Ok(self.node_params[id].in_channels)
    }

    fn project(&self, id: usize, x: Tensor<B, 2>) -> Projected<B> {
        let params = &self.node_params[id];
        let shape = [x.dims()[0], self.heads, self.head_dim];
        Projected {
            q: params.q_lin.forward(x.clone()).reshape(shape),
            k: params.k_lin.forward(x.clone()).reshape(shape),
            v: params.v_lin.forward(x).reshape(shape),
        }
    }

    /// Normalised attention [E, H] of each edge over its destination group.
    fn attention(
        &self,
        q_i: Tensor<B, 3>,
        k_j: Tensor<B, 3>,
        rel: Tensor<B, 1>,
        ctx: &MessageContext<B>,
    ) -> error::Result<Tensor<B, 2>> {
        let [num_edges, heads, _] = q_i.dims();
        let scores = (k_j * q_i).sum_dim(2).reshape([num_edges, heads]);
        let prior = rel.unsqueeze::<2>().expand([num_edges, heads]);
        let scores = (scores * prior).div_scalar((self.head_dim as f64).sqrt());
        segment_softmax(scores, ctx.target(), ctx.num_nodes())
    }

    /// Combine the per-edge-type results entering one node type.
    fn group_relations(
        &self,
        mut outs: Vec<Tensor<B, 2>>,
        num_nodes: usize,
        device: &B::Device,
    ) -> Tensor<B, 2> {
        if outs.len() <= 1 {
            return outs
                .pop()
                .unwrap_or_else(|| Tensor::zeros([num_nodes, self.out_channels()], device));
        }
        let stacked: Tensor<B, 3> = Tensor::stack(outs, 0);
        let reduced = match self.group.0 {
            Aggregation::Sum => stacked.sum_dim(0),
            Aggregation::Mean => stacked.mean_dim(0),
            Aggregation::Min => stacked.min_dim(0),
            Aggregation::Max => stacked.max_dim(0),
        };
        reduced.squeeze_dim::<2>(0)
    }

    /// Output projection and gated residual for one node type.
    fn update_node(&self, id: usize, aggregated: Tensor<B, 2>, x: Tensor<B, 2>) -> Tensor<B, 2> {
        let params = &self.node_params[id];
        let out = params.a_lin.forward(aggregated);
        let [num_nodes, width] = out.dims();
        if x.dims()[1] != width {
            return out;
        }
        let gate = sigmoid(params.skip.val())
            .unsqueeze::<2>()
            .expand([num_nodes, width]);
        let keep = gate.clone().neg().add_scalar(1.0);
        out * gate + x * keep
    }
}

impl<B: Backend> MessagePassing<B> for HgtConv<B> {
    /// (q_i, relation key k_j, relation value v_j, score prior).
    type Input = (
        Target<B, 3>,
        Source<B, 3>,
        Source<B, 3>,
        Shared<Tensor<B, 1>>,
    );

    fn message(
        &self,
        (q_i, k_j, v_j, rel): (Tensor<B, 3>, Tensor<B, 3>, Tensor<B, 3>, Tensor<B, 1>),
        ctx: &MessageContext<B>,
    ) -> error::Result<Tensor<B, 2>> {
        let alpha = self.dropout.forward(self.attention(q_i, k_j, rel, ctx)?);
        let [num_edges, heads, head_dim] = v_j.dims();
        let weights = alpha.unsqueeze_dim::<3>(2).expand([num_edges, heads, head_dim]);
        Ok((v_j * weights).reshape([num_edges, heads * head_dim]))
    }

    fn message_width(&self) -> usize {
        self.out_channels()
    }
}

// ─── Output ───────────────────────────────────────────────────────

/// Updated features per node type.
///
/// Asking for a metadata node type that had no input features is a
/// `MissingArgument` error; asking for a type outside the metadata is
/// `UnknownNodeType`.
#[derive(Debug, Clone)]
pub struct HeteroOutput<B: Backend> {
    outputs: HashMap<NodeType, Tensor<B, 2>>,
    known: Vec<NodeType>,
}

impl<B: Backend> HeteroOutput<B> {
    pub fn get(&self, node_type: &NodeType) -> error::Result<&Tensor<B, 2>> {
        self.outputs
            .get(node_type)
            .ok_or_else(|| self.absent(node_type))
    }

    pub fn take(&mut self, node_type: &NodeType) -> error::Result<Tensor<B, 2>> {
        match self.outputs.remove(node_type) {
            Some(tensor) => Ok(tensor),
            None => Err(self.absent(node_type)),
        }
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NodeType, &Tensor<B, 2>)> {
        self.outputs.iter()
    }

    pub fn into_map(self) -> HashMap<NodeType, Tensor<B, 2>> {
        self.outputs
    }

    fn absent(&self, node_type: &NodeType) -> Error {
        if self.known.contains(node_type) {
            Error::MissingArgument(format!(
                "no features were supplied for node type `{}`",
                node_type
            ))
        } else {
            Error::UnknownNodeType(node_type.to_string())
        }
    }
}

// ─── Tests ────────────────────────────────────────────────────────
