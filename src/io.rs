//! Reader/Writer traits and the ingestion error taxonomy
//!
//! Everything that crosses the "untrusted input → trusted Graph" boundary
//! reports one of the three [`IngestError`] kinds. None of them is fatal to
//! the caller; the usual recovery is to fall back to a mock graph.

use std::path::Path;

use thiserror::Error;

use crate::graph::Graph;
use crate::normalize::{RawGraph, normalize_graph};
use crate::simulation::DEFAULT_SPRING_REST_LENGTH;

/// Errors that can occur while reading or writing graphs
#[derive(Error, Debug)]
pub enum IngestError {
    /// The document parsed but does not have the required shape
    #[error("invalid graph: {0}")]
    Validation(String),

    /// The input text is not well-formed JSON
    #[error("parse error: {0}")]
    Parse(String),

    /// Reading or writing the file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for reader/writer operations
pub type IngestResult<T> = Result<T, IngestError>;

/// A reader turns a file into a normalized graph
pub trait Reader {
    /// Parse the input file into a Graph
    fn read(&self, input: &Path) -> IngestResult<Graph>;

    /// File extensions this reader can handle (e.g., ["json"])
    fn supported_extensions(&self) -> &[&str];

    /// Check if this reader can handle the given file extension
    fn supports_extension(&self, ext: &str) -> bool {
        self.supported_extensions()
            .iter()
            .any(|e| e.eq_ignore_ascii_case(ext))
    }
}

/// A writer outputs a graph in some format
pub trait Writer {
    /// Write the graph to the output path
    fn write(&self, graph: &Graph, output: &Path) -> IngestResult<()>;

    /// Identifier for this output format (e.g., "graph-json")
    fn format_id(&self) -> &str;
}

/// Parse JSON text and normalize it into a graph whose links rest at `rest_length`
pub fn parse_graph_str(text: &str, rest_length: f64) -> IngestResult<Graph> {
    let value: serde_json::Value = serde_json::from_str(text)
        .map_err(|e| IngestError::Parse(format!("the provided file is not valid JSON ({e})")))?;
    let raw = RawGraph::from_value(value)?;
    normalize_graph(raw, rest_length)
}

/// Read a graph document from disk without blocking the scheduler
pub async fn load_graph_from_file(
    path: impl AsRef<Path>,
    rest_length: f64,
) -> IngestResult<Graph> {
    let path = path.as_ref();
    let text = tokio::fs::read_to_string(path).await?;
    tracing::debug!(path = %path.display(), bytes = text.len(), "read graph document");
    parse_graph_str(&text, rest_length)
}

/// Blocking reader for JSON graph documents (`nodes` + `links`)
pub struct JsonGraphReader {
    rest_length: f64,
}

impl JsonGraphReader {
    pub fn new() -> Self {
        Self::with_rest_length(DEFAULT_SPRING_REST_LENGTH)
    }

    /// Reader whose links rest at `rest_length`
    pub fn with_rest_length(rest_length: f64) -> Self {
        Self { rest_length }
    }
}

impl Default for JsonGraphReader {
    fn default() -> Self {
        Self::new()
    }
}

impl Reader for JsonGraphReader {
    fn read(&self, input: &Path) -> IngestResult<Graph> {
        let text = std::fs::read_to_string(input)?;
        parse_graph_str(&text, self.rest_length)
    }

    fn supported_extensions(&self) -> &[&str] {
        &["json"]
    }
}
