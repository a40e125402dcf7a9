//! Heterogeneous graph metadata.
//!
//! Node and edge types are labels; a [`TypeRegistry`] assigns each of them a
//! dense id once, at layer construction, so the forward pass addresses
//! parameters by position instead of by label.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A node type identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeType(String);

impl NodeType {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeType {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NodeType {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An edge type: (source node type, relation, destination node type).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeType {
    pub src: NodeType,
    pub relation: String,
    pub dst: NodeType,
}

impl EdgeType {
    pub fn new(src: impl Into<NodeType>, relation: impl Into<String>, dst: impl Into<NodeType>) -> Self {
        Self {
            src: src.into(),
            relation: relation.into(),
            dst: dst.into(),
        }
    }
}

impl fmt::Display for EdgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.src, self.relation, self.dst)
    }
}

/// The full list of node and edge types a layer is built for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub node_types: Vec<NodeType>,
    pub edge_types: Vec<EdgeType>,
}

impl Metadata {
    pub fn new<N, E>(node_types: N, edge_types: E) -> Self
    where
        N: IntoIterator,
        N::Item: Into<NodeType>,
        E: IntoIterator<Item = EdgeType>,
    {
        Self {
            node_types: node_types.into_iter().map(Into::into).collect(),
            edge_types: edge_types.into_iter().collect(),
        }
    }

    /// Metadata of a plain graph: one node type, one self-relation.
    pub fn homogeneous(node_type: impl Into<NodeType>, relation: impl Into<String>) -> Self {
        let node_type = node_type.into();
        let edge_type = EdgeType::new(node_type.clone(), relation, node_type.clone());
        Self::new([node_type], [edge_type])
    }
}

/// Dense ids for every type in a [`Metadata`].
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    node_types: Vec<NodeType>,
    edge_types: Vec<EdgeType>,
    node_ids: HashMap<NodeType, usize>,
    edge_ids: HashMap<EdgeType, usize>,
    endpoints: Vec<(usize, usize)>,
}

impl TypeRegistry {
    /// Assign ids in metadata order. Duplicate labels are a config error;
    /// an edge type naming an unlisted node type is `UnknownNodeType`.
    pub fn new(metadata: &Metadata) -> Result<Self> {
        let mut node_ids = HashMap::with_capacity(metadata.node_types.len());
        for (id, node_type) in metadata.node_types.iter().enumerate() {
            if node_ids.insert(node_type.clone(), id).is_some() {
                return Err(Error::InvalidConfig(format!(
                    "node type `{}` listed twice",
                    node_type
                )));
            }
        }

        let mut edge_ids = HashMap::with_capacity(metadata.edge_types.len());
        let mut endpoints = Vec::with_capacity(metadata.edge_types.len());
        for (id, edge_type) in metadata.edge_types.iter().enumerate() {
            let lookup = |t: &NodeType| {
                node_ids
                    .get(t)
                    .copied()
                    .ok_or_else(|| Error::UnknownNodeType(t.to_string()))
            };
            endpoints.push((lookup(&edge_type.src)?, lookup(&edge_type.dst)?));
            if edge_ids.insert(edge_type.clone(), id).is_some() {
                return Err(Error::InvalidConfig(format!(
                    "edge type {} listed twice",
                    edge_type
                )));
            }
        }

        Ok(Self {
            node_types: metadata.node_types.clone(),
            edge_types: metadata.edge_types.clone(),
            node_ids,
            edge_ids,
            endpoints,
        })
    }

    pub fn node_id(&self, node_type: &NodeType) -> Result<usize> {
        self.node_ids
            .get(node_type)
            .copied()
            .ok_or_else(|| Error::UnknownNodeType(node_type.to_string()))
    }

    pub fn edge_id(&self, edge_type: &EdgeType) -> Result<usize> {
        self.edge_ids
            .get(edge_type)
            .copied()
            .ok_or_else(|| Error::UnknownEdgeType(edge_type.to_string()))
    }

    pub fn node_type(&self, id: usize) -> &NodeType {
        &self.node_types[id]
    }

    pub fn edge_type(&self, id: usize) -> &EdgeType {
        &self.edge_types[id]
    }

    /// (source node id, destination node id) of an edge type.
    pub fn endpoints(&self, edge_id: usize) -> (usize, usize) {
        self.endpoints[edge_id]
    }

    pub fn num_node_types(&self) -> usize {
        self.node_types.len()
    }

    pub fn num_edge_types(&self) -> usize {
        self.edge_types.len()
    }

    pub fn node_types(&self) -> &[NodeType] {
        &self.node_types
    }
}
