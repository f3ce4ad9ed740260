//! Graph JSON writer
//!
//! Serializes a [`Graph`] back into the ingestion format (`nodes` + `links`),
//! so a written document normalizes to the same topology. Positions and
//! velocities are runtime state and are not written.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::graph::Graph;
use crate::io::{IngestError, IngestResult, Writer};

/// A node as stored in a graph document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: String,
    pub label: String,
    pub group: i64,
}

/// A link as stored in a graph document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkRecord {
    /// Source node id
    pub source: String,
    /// Target node id
    pub target: String,
    pub weight: f64,
}

/// Complete graph document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    pub nodes: Vec<NodeRecord>,
    pub links: Vec<LinkRecord>,
}

impl GraphDocument {
    /// Flatten a graph into id-addressed records
    pub fn from_graph(graph: &Graph) -> Self {
        let nodes = graph.nodes();
        Self {
            nodes: nodes
                .iter()
                .map(|n| NodeRecord {
                    id: n.id().to_string(),
                    label: n.label().to_string(),
                    group: n.group(),
                })
                .collect(),
            links: graph
                .edges()
                .iter()
                .map(|e| LinkRecord {
                    source: nodes[e.a().index()].id().to_string(),
                    target: nodes[e.b().index()].id().to_string(),
                    weight: e.weight,
                })
                .collect(),
        }
    }
}

/// Writer for the `graph-json` document format
#[derive(Debug, Clone, Default)]
pub struct GraphJsonWriter;

impl GraphJsonWriter {
    pub fn new() -> Self {
        Self
    }

    /// Render the document as pretty-printed JSON
    pub fn to_json(&self, graph: &Graph) -> IngestResult<String> {
        serde_json::to_string_pretty(&GraphDocument::from_graph(graph))
            .map_err(|e| IngestError::Parse(format!("JSON serialization failed: {e}")))
    }
}

impl Writer for GraphJsonWriter {
    fn write(&self, graph: &Graph, output: &Path) -> IngestResult<()> {
        let json = self.to_json(graph)?;
        std::fs::write(output, json)?;
        tracing::debug!(
            path = %output.display(),
            nodes = graph.len(),
            links = graph.edge_count(),
            "wrote graph document"
        );
        Ok(())
    }

    fn format_id(&self) -> &str {
        "graph-json"
    }
}
