//! Topology-only mock graphs
//!
//! A random spanning backbone (node `i` links to a uniformly chosen earlier
//! node) guarantees connectivity; extra random pairs thicken the graph.
//! Nodes carry no meaningful positions; use
//! [`ClusterGenerator::seed_layout`](crate::cluster::ClusterGenerator::seed_layout)
//! to place them.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::graph::{Graph, NodeSlot, NodeSpec};

/// Options for mock graph generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MockGraphConfig {
    /// Smallest node count (requested counts are clamped up to this)
    pub min_nodes: usize,
    /// Largest node count (requested counts are clamped down to this)
    pub max_nodes: usize,
    pub min_groups: usize,
    pub max_groups: usize,
    /// Weight range for backbone edges
    pub backbone_weight_range: [f64; 2],
    /// Weight range for extra edges
    pub extra_weight_range: [f64; 2],
    /// Extra edge attempts per node are drawn from this range
    pub extra_density_range: [f64; 2],
}

impl Default for MockGraphConfig {
    fn default() -> Self {
        Self {
            min_nodes: 300,
            max_nodes: 600,
            min_groups: 4,
            max_groups: 12,
            backbone_weight_range: [0.5, 2.5],
            extra_weight_range: [0.5, 3.0],
            extra_density_range: [1.5, 3.5],
        }
    }
}

impl MockGraphConfig {
    /// Clamp a requested node count into the configured range
    pub fn clamp_node_count(&self, requested: usize) -> usize {
        let max = self.max_nodes.max(self.min_nodes);
        requested.clamp(self.min_nodes, max)
    }

    /// Number of groups for `node_count` nodes: √n bounded by the group limits
    pub fn group_count(&self, node_count: usize) -> usize {
        let max = self.max_groups.max(self.min_groups).max(1);
        let sqrt = (node_count as f64).sqrt().floor() as usize;
        sqrt.clamp(self.min_groups.max(1), max)
    }
}

/// Uniform float in `[lo, hi)`, tolerating an empty or inverted range
pub(crate) fn uniform<R: Rng + ?Sized>(rng: &mut R, range: [f64; 2]) -> f64 {
    let [lo, hi] = range;
    if hi > lo {
        rng.random_range(lo..hi)
    } else {
        lo
    }
}

/// Build a connected, weighted mock graph
///
/// `node_count` defaults to a uniform draw from the configured range and is
/// clamped into it when given. Every edge rests at `rest_length`.
pub fn generate_mock_graph<R: Rng + ?Sized>(
    rng: &mut R,
    config: &MockGraphConfig,
    node_count: Option<usize>,
    rest_length: f64,
) -> Graph {
    let count = match node_count {
        Some(requested) => config.clamp_node_count(requested),
        None => {
            let max = config.max_nodes.max(config.min_nodes);
            rng.random_range(config.min_nodes..=max)
        }
    };
    let groups = config.group_count(count);

    let mut graph = Graph::new();
    for i in 0..count {
        let spec = NodeSpec::new(format!("n{i}"))
            .with_label(format!("Node {}", i + 1))
            .with_group(rng.random_range(0..groups) as i64);
        // Ids are generated sequentially, so they cannot collide.
        let _ = graph.add_node(spec);
    }

    for i in 1..count {
        let parent = rng.random_range(0..i);
        let weight = uniform(rng, config.backbone_weight_range);
        let _ = graph.add_edge(NodeSlot(parent), NodeSlot(i), rest_length, weight);
    }

    let backbone = graph.edge_count();
    let extra_attempts = (count as f64 * uniform(rng, config.extra_density_range)).floor() as usize;
    if count >= 2 {
        for _ in 0..extra_attempts {
            let a = rng.random_range(0..count);
            let mut b = rng.random_range(0..count - 1);
            if b >= a {
                b += 1;
            }
            let weight = uniform(rng, config.extra_weight_range);
            let _ = graph.add_edge(NodeSlot(a), NodeSlot(b), rest_length, weight);
        }
    }

    tracing::debug!(
        nodes = count,
        groups,
        backbone,
        extra = graph.edge_count() - backbone,
        "generated mock graph"
    );
    graph
}
