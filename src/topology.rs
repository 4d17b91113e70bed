use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Node category. Determines the node's radius and nothing else; the
/// simulation logic never branches on it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Hub,
    #[default]
    Primary,
    Secondary,
}

impl NodeKind {
    /// Collision/hit-test radius in simulation units.
    pub fn radius(self) -> f32 {
        match self {
            Self::Hub => 22.0,
            Self::Primary => 14.0,
            Self::Secondary => 9.0,
        }
    }
}

/// Link category, carried for consumers; not consulted by the physics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LinkKind {
    #[default]
    Collaboration,
    DataFlow,
    Dependency,
}

/// A node as supplied by the external data source.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentNode {
    pub id: String,
    #[serde(default)]
    pub kind: NodeKind,
}

/// A link between two node ids. `weight` scales the link force and must be
/// finite and positive.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentLink {
    pub source: String,
    pub target: String,
    #[serde(default = "default_weight")]
    pub weight: f32,
    #[serde(default)]
    pub kind: LinkKind,
}

fn default_weight() -> f32 {
    1.0
}

/// The unit of ingestion: the node and link collections defining the graph
/// structure, distinct from any positions.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Topology {
    pub nodes: Vec<AgentNode>,
    #[serde(default)]
    pub links: Vec<AgentLink>,
}

impl Topology {
    /// Checks the structural invariants: unique node ids, link endpoints
    /// referencing present nodes, finite positive link weights.
    ///
    /// Duplicate links between the same pair are allowed; their force
    /// contributions stack additively downstream.
    pub fn validate(&self) -> Result<(), EngineError> {
        let mut seen = HashSet::with_capacity(self.nodes.len());
        for node in &self.nodes {
            if node.id.is_empty() {
                return Err(EngineError::integrity("empty node id"));
            }
            if !seen.insert(node.id.as_str()) {
                return Err(EngineError::integrity(format!(
                    "duplicate node id `{}`",
                    node.id
                )));
            }
        }

        for link in &self.links {
            for endpoint in [&link.source, &link.target] {
                if !seen.contains(endpoint.as_str()) {
                    return Err(EngineError::integrity(format!(
                        "link references missing node `{endpoint}`"
                    )));
                }
            }
            if !link.weight.is_finite() || link.weight <= 0.0 {
                return Err(EngineError::integrity(format!(
                    "link `{}` -> `{}` has non-positive weight",
                    link.source, link.target
                )));
            }
        }

        Ok(())
    }
}
