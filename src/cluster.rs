//! Clustered, layout-ready graphs
//!
//! Cluster centers are rejection-sampled so clusters do not overlap, nodes
//! are scattered around their center with mass concentrated near the middle,
//! and edges join each node to its nearest same-cluster neighbours plus a
//! sparse set of cross-cluster links. Every edge's rest length is its length
//! at creation, so a fresh layout starts close to equilibrium.

use std::f64::consts::TAU;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::graph::{DEFAULT_EDGE_WEIGHT, Graph, NodeSlot, NodeSpec, Vec2};
use crate::mock::uniform;

/// Options for cluster layout generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Total nodes to place
    pub node_count: usize,
    /// Inclusive bounds on the number of clusters to attempt
    pub cluster_count_range: [usize; 2],
    /// Spatial spread of a cluster (px)
    pub cluster_radius_range: [f64; 2],
    /// Fraction of nodes flagged as hubs
    pub hub_rate: f64,
    /// Inclusive bounds on the intra-cluster degree target
    pub link_per_node_range: [usize; 2],
    /// Cross-cluster edge attempts per cluster
    pub inter_cluster_factor: f64,
    /// Multiplier on both edge-count paths
    pub graph_density: f64,
    /// Keep cluster centers this far from the canvas edges (px)
    pub margin: f64,
    /// Minimum center separation as a fraction of the smaller canvas side
    pub min_separation_fraction: f64,
    /// Rejection-sampling budget for cluster centers
    pub center_attempts: usize,
    /// Exponent (< 1) biasing node radii toward the cluster center
    pub radius_exponent: f64,
    /// Peak-to-peak per-axis position jitter (px)
    pub position_jitter: f64,
    pub node_size_range: [f64; 2],
    pub hub_size_range: [f64; 2],
    /// Device pixel ratio applied to node sizes, clamped to [1, 2]
    pub pixel_ratio: f64,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            node_count: 380,
            cluster_count_range: [6, 8],
            cluster_radius_range: [42.0, 110.0],
            hub_rate: 0.08,
            link_per_node_range: [3, 6],
            inter_cluster_factor: 14.0,
            graph_density: 1.0,
            margin: 80.0,
            min_separation_fraction: 0.22,
            center_attempts: 4000,
            radius_exponent: 0.7,
            position_jitter: 8.0,
            node_size_range: [1.6, 2.6],
            hub_size_range: [3.6, 6.0],
            pixel_ratio: 1.0,
        }
    }
}

/// Builds clustered graphs with seeded positions
#[derive(Debug, Clone, Default)]
pub struct ClusterGenerator {
    config: ClusterConfig,
}

impl ClusterGenerator {
    pub fn new(config: ClusterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    /// Generate a fresh clustered graph for a `width` × `height` canvas
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R, width: f64, height: f64) -> Graph {
        let [lo, hi] = sorted(self.config.cluster_count_range);
        let requested = rng.random_range(lo..=hi).max(1);
        let centers = self.place_centers(rng, width, height, requested);

        let total = self.config.node_count;
        let hubs = hub_flags(rng, total, self.config.hub_rate);
        let mut graph = Graph::new();
        let mut members: Vec<Vec<usize>> = Vec::with_capacity(centers.len());

        let mut idx = 0;
        for (ci, (center, count)) in centers
            .iter()
            .zip(split_evenly(total, centers.len()))
            .enumerate()
        {
            let radius = uniform(rng, self.config.cluster_radius_range);
            let mut cluster = Vec::with_capacity(count);
            for _ in 0..count {
                let position = self.scatter(rng, *center, radius);
                let is_hub = hubs[idx];
                let spec = NodeSpec::new(format!("n{idx}"))
                    .with_group(ci as i64)
                    .at(position)
                    .with_size(self.node_size(rng, is_hub))
                    .hub(is_hub);
                // Ids are generated sequentially, so they cannot collide.
                let _ = graph.add_node(spec);
                cluster.push(idx);
                idx += 1;
            }
            members.push(cluster);
        }

        let intra = self.link_nearest(rng, &mut graph, &members);
        let inter = self.link_across(rng, &mut graph, &members);

        tracing::debug!(
            nodes = graph.len(),
            clusters = centers.len(),
            hubs = graph.hub_count(),
            intra,
            inter,
            "generated cluster layout"
        );
        graph
    }

    /// Place an existing topology on the canvas, one cluster per group
    ///
    /// Ids, labels, groups, edges and weights are kept. Edge rest lengths
    /// become the seeded distances.
    pub fn seed_layout<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        topology: &Graph,
        width: f64,
        height: f64,
    ) -> Graph {
        let groups = topology.groups();
        let centers = self.place_centers(rng, width, height, groups.len().max(1));
        let radii: Vec<f64> = centers
            .iter()
            .map(|_| uniform(rng, self.config.cluster_radius_range))
            .collect();
        let hubs = hub_flags(rng, topology.len(), self.config.hub_rate);

        let mut graph = Graph::new();
        for (node, &is_hub) in topology.nodes().iter().zip(&hubs) {
            let cluster = groups.binary_search(&node.group()).unwrap_or(0) % centers.len();
            let spec = NodeSpec::new(node.id())
                .with_label(node.label())
                .with_group(node.group())
                .at(self.scatter(rng, centers[cluster], radii[cluster]))
                .with_size(self.node_size(rng, is_hub))
                .hub(is_hub);
            let _ = graph.add_node(spec);
        }
        for edge in topology.edges() {
            let rest = measured(&graph, edge.a(), edge.b());
            let _ = graph.add_edge(edge.a(), edge.b(), rest, edge.weight);
        }

        tracing::debug!(
            nodes = graph.len(),
            edges = graph.edge_count(),
            groups = groups.len(),
            clusters = centers.len(),
            "seeded layout for existing graph"
        );
        graph
    }

    /// Rejection-sample up to `count` well separated centers
    ///
    /// Running out of attempts returns however many were found.
    fn place_centers<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        width: f64,
        height: f64,
        count: usize,
    ) -> Vec<Vec2> {
        let margin = self.config.margin;
        let min_dist = width.min(height) * self.config.min_separation_fraction;
        let mut centers: Vec<Vec2> = Vec::with_capacity(count);

        let mut attempts = 0;
        while centers.len() < count && attempts < self.config.center_attempts {
            let x = span(rng, margin, width - margin);
            let y = -span(rng, margin, height - margin);
            let candidate = Vec2::new(x, y);
            if centers.iter().all(|c| c.distance(candidate) > min_dist) {
                centers.push(candidate);
            }
            attempts += 1;
        }

        if centers.is_empty() {
            centers.push(Vec2::new(width / 2.0, -height / 2.0));
        }
        if centers.len() < count {
            tracing::warn!(
                requested = count,
                placed = centers.len(),
                "cluster center budget exhausted"
            );
        }
        centers
    }

    /// A position around `center`, biased toward it
    fn scatter<R: Rng + ?Sized>(&self, rng: &mut R, center: Vec2, radius: f64) -> Vec2 {
        let angle = rng.random_range(0.0..TAU);
        let r = radius * rng.random::<f64>().powf(self.config.radius_exponent);
        let jitter = self.config.position_jitter;
        Vec2::new(
            center.x + angle.cos() * r + (rng.random::<f64>() - 0.5) * jitter,
            center.y + angle.sin() * r + (rng.random::<f64>() - 0.5) * jitter,
        )
    }

    fn node_size<R: Rng + ?Sized>(&self, rng: &mut R, is_hub: bool) -> f64 {
        let range = if is_hub {
            self.config.hub_size_range
        } else {
            self.config.node_size_range
        };
        uniform(rng, range) * self.config.pixel_ratio.clamp(1.0, 2.0)
    }

    /// Join each node to its nearest same-cluster neighbours
    fn link_nearest<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        graph: &mut Graph,
        members: &[Vec<usize>],
    ) -> usize {
        let [k_min, k_max] = sorted(self.config.link_per_node_range);
        let mut added = 0;

        for cluster in members {
            for &i in cluster {
                let origin = graph.nodes()[i].position();
                let mut nearest: Vec<(usize, f64)> = cluster
                    .iter()
                    .filter(|&&j| j != i)
                    .map(|&j| (j, graph.nodes()[j].position().distance_squared(origin)))
                    .collect();
                nearest.sort_by(|a, b| a.1.total_cmp(&b.1));

                let k = rng.random_range(k_min..=k_max) as f64 * self.config.graph_density;
                for &(j, _) in nearest.iter().take(k.round().max(0.0) as usize) {
                    let (a, b) = (NodeSlot(i), NodeSlot(j));
                    let rest = measured(graph, a, b);
                    if let Ok(true) = graph.add_edge(a, b, rest, DEFAULT_EDGE_WEIGHT) {
                        added += 1;
                    }
                }
            }
        }
        added
    }

    /// Sparse links between randomly chosen pairs of distinct clusters
    fn link_across<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        graph: &mut Graph,
        members: &[Vec<usize>],
    ) -> usize {
        let populated: Vec<&Vec<usize>> = members.iter().filter(|m| !m.is_empty()).collect();
        let clusters = populated.len();
        if clusters < 2 {
            return 0;
        }

        let per_cluster = self.config.inter_cluster_factor * self.config.graph_density;
        let attempts = (clusters as f64 * per_cluster)
            .round()
            .max(0.0) as usize;
        let mut added = 0;
        for _ in 0..attempts {
            let ca = rng.random_range(0..clusters);
            let mut cb = rng.random_range(0..clusters);
            if cb == ca {
                cb = (cb + 1) % clusters;
            }
            let ia = populated[ca][rng.random_range(0..populated[ca].len())];
            let ib = populated[cb][rng.random_range(0..populated[cb].len())];

            let (a, b) = (NodeSlot(ia), NodeSlot(ib));
            let rest = measured(graph, a, b);
            if let Ok(true) = graph.add_edge(a, b, rest, DEFAULT_EDGE_WEIGHT) {
                added += 1;
            }
        }
        added
    }
}

/// Exactly `floor(total × rate)` flags set, shuffled
pub fn hub_flags<R: Rng + ?Sized>(rng: &mut R, total: usize, rate: f64) -> Vec<bool> {
    let hubs = ((total as f64 * rate.clamp(0.0, 1.0)).floor() as usize).min(total);
    let mut flags: Vec<bool> = (0..total).map(|i| i < hubs).collect();
    flags.shuffle(rng);
    flags
}

/// Split `total` into `parts` near-equal counts, remainder to the first parts
pub fn split_evenly(total: usize, parts: usize) -> Vec<usize> {
    if parts == 0 {
        return Vec::new();
    }
    let base = total / parts;
    let leftover = total % parts;
    (0..parts).map(|i| base + usize::from(i < leftover)).collect()
}

fn measured(graph: &Graph, a: NodeSlot, b: NodeSlot) -> f64 {
    match (graph.node(a), graph.node(b)) {
        (Some(na), Some(nb)) => na.position().distance(nb.position()),
        _ => 0.0,
    }
}

/// Uniform in `[lo, hi]`, or the midpoint when the span is empty
fn span<R: Rng + ?Sized>(rng: &mut R, lo: f64, hi: f64) -> f64 {
    if hi > lo {
        rng.random_range(lo..hi)
    } else {
        (lo + hi) / 2.0
    }
}

fn sorted([a, b]: [usize; 2]) -> [usize; 2] {
    if a <= b { [a, b] } else { [b, a] }
}
