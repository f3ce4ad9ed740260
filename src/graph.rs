//! Graph model: nodes, canonical edges, and the arena that owns them
//!
//! Nodes live in an arena indexed by [`NodeSlot`]; a side table maps external
//! string ids to slots. Edges store slots in canonical order (`a < b`), so an
//! edge between A and B is recognised no matter which endpoint is given first.

use std::collections::{HashMap, HashSet, VecDeque};

use thiserror::Error;

/// Default size for nodes that were not given one (topology-only graphs)
pub const DEFAULT_NODE_SIZE: f64 = 2.0;

/// Default edge weight when none is supplied
pub const DEFAULT_EDGE_WEIGHT: f64 = 1.0;

/// Errors raised when an operation would break a graph invariant
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    /// A node with this id already exists
    #[error("duplicate node id: {0}")]
    DuplicateId(String),

    /// Both endpoints of the edge are the same node
    #[error("self-loop on node: {0}")]
    SelfLoop(String),

    /// The slot does not refer to a node in this graph
    #[error("unknown node slot: {0}")]
    UnknownSlot(usize),

    /// The id does not refer to a node in this graph
    #[error("unknown node id: {0}")]
    UnknownId(String),
}

/// A 2D vector in canvas space (x grows right, y grows up; the canvas spans negative y)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn distance(self, other: Vec2) -> f64 {
        (other - self).length()
    }

    pub fn distance_squared(self, other: Vec2) -> f64 {
        let d = other - self;
        d.x * d.x + d.y * d.y
    }

    pub fn scale(self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }
}

impl std::ops::Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl std::ops::SubAssign for Vec2 {
    fn sub_assign(&mut self, rhs: Vec2) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

/// Stable index of a node inside its graph's arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeSlot(pub usize);

impl NodeSlot {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A node in the graph
///
/// `group`, `size` and `is_hub` are fixed at creation. Position and velocity
/// are only written by the layout simulator.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    id: String,
    label: String,
    group: i64,
    size: f64,
    is_hub: bool,
    pub(crate) position: Vec2,
    pub(crate) velocity: Vec2,
}

impl Node {
    /// Unique identifier within the graph
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display name (defaults to the id)
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Cluster membership
    pub fn group(&self) -> i64 {
        self.group
    }

    /// Radius-like scalar used for rendering and wall padding
    pub fn size(&self) -> f64 {
        self.size
    }

    pub fn is_hub(&self) -> bool {
        self.is_hub
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }
}

/// Everything needed to create a node
#[derive(Debug, Clone)]
pub struct NodeSpec {
    pub id: String,
    pub label: Option<String>,
    pub group: i64,
    pub position: Vec2,
    pub size: f64,
    pub is_hub: bool,
}

impl NodeSpec {
    /// A node at the origin, group 0, default size
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: None,
            group: 0,
            position: Vec2::ZERO,
            size: DEFAULT_NODE_SIZE,
            is_hub: false,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_group(mut self, group: i64) -> Self {
        self.group = group;
        self
    }

    pub fn at(mut self, position: Vec2) -> Self {
        self.position = position;
        self
    }

    pub fn with_size(mut self, size: f64) -> Self {
        self.size = size;
        self
    }

    pub fn hub(mut self, is_hub: bool) -> Self {
        self.is_hub = is_hub;
        self
    }
}

/// An undirected edge with endpoints in canonical order (`a < b`)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    a: NodeSlot,
    b: NodeSlot,
    /// Distance at which the spring exerts no force
    pub rest_length: f64,
    /// Informational weight; not consumed by the simulator
    pub weight: f64,
}

impl Edge {
    pub fn a(&self) -> NodeSlot {
        self.a
    }

    pub fn b(&self) -> NodeSlot {
        self.b
    }

    pub fn endpoints(&self) -> (NodeSlot, NodeSlot) {
        (self.a, self.b)
    }
}

/// Orders a pair of slots so that (A, B) and (B, A) share one key
pub fn canonical_pair(a: NodeSlot, b: NodeSlot) -> (NodeSlot, NodeSlot) {
    if a <= b { (a, b) } else { (b, a) }
}

/// A node arena plus a deduplicated edge list
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: Vec<Node>,
    index: HashMap<String, NodeSlot>,
    edges: Vec<Edge>,
    edge_keys: HashSet<(NodeSlot, NodeSlot)>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node, failing if its id is already taken
    pub fn add_node(&mut self, spec: NodeSpec) -> Result<NodeSlot, GraphError> {
        if self.index.contains_key(&spec.id) {
            return Err(GraphError::DuplicateId(spec.id));
        }

        let slot = NodeSlot(self.nodes.len());
        let label = spec.label.unwrap_or_else(|| spec.id.clone());
        self.index.insert(spec.id.clone(), slot);
        self.nodes.push(Node {
            id: spec.id,
            label,
            group: spec.group,
            size: spec.size,
            is_hub: spec.is_hub,
            position: spec.position,
            velocity: Vec2::ZERO,
        });
        Ok(slot)
    }

    /// Add an edge between two slots
    ///
    /// Returns `Ok(false)` when the canonical pair already exists.
    pub fn add_edge(
        &mut self,
        a: NodeSlot,
        b: NodeSlot,
        rest_length: f64,
        weight: f64,
    ) -> Result<bool, GraphError> {
        for slot in [a, b] {
            if slot.0 >= self.nodes.len() {
                return Err(GraphError::UnknownSlot(slot.0));
            }
        }
        if a == b {
            return Err(GraphError::SelfLoop(self.nodes[a.0].id.clone()));
        }

        let (a, b) = canonical_pair(a, b);
        if !self.edge_keys.insert((a, b)) {
            return Ok(false);
        }
        self.edges.push(Edge {
            a,
            b,
            rest_length,
            weight,
        });
        Ok(true)
    }

    /// Add an edge between two nodes given by id
    pub fn connect_ids(
        &mut self,
        a: &str,
        b: &str,
        rest_length: f64,
        weight: f64,
    ) -> Result<bool, GraphError> {
        let sa = self
            .slot_of(a)
            .ok_or_else(|| GraphError::UnknownId(a.to_string()))?;
        let sb = self
            .slot_of(b)
            .ok_or_else(|| GraphError::UnknownId(b.to_string()))?;
        self.add_edge(sa, sb, rest_length, weight)
    }

    pub fn slot_of(&self, id: &str) -> Option<NodeSlot> {
        self.index.get(id).copied()
    }

    pub fn node(&self, slot: NodeSlot) -> Option<&Node> {
        self.nodes.get(slot.0)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub(crate) fn nodes_mut(&mut self) -> &mut [Node] {
        &mut self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Whether an edge joins the two slots, in either order
    pub fn contains_edge(&self, a: NodeSlot, b: NodeSlot) -> bool {
        self.edge_keys.contains(&canonical_pair(a, b))
    }

    pub fn hub_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_hub).count()
    }

    /// Distinct groups in ascending order
    pub fn groups(&self) -> Vec<i64> {
        let mut groups: Vec<i64> = self.nodes.iter().map(|n| n.group).collect();
        groups.sort_unstable();
        groups.dedup();
        groups
    }

    /// Whether every node is reachable from slot 0 (an empty graph counts as connected)
    pub fn is_connected(&self) -> bool {
        if self.nodes.is_empty() {
            return true;
        }

        let mut adjacency = vec![Vec::new(); self.nodes.len()];
        for edge in &self.edges {
            adjacency[edge.a.0].push(edge.b.0);
            adjacency[edge.b.0].push(edge.a.0);
        }

        let mut seen = vec![false; self.nodes.len()];
        let mut queue = VecDeque::from([0]);
        seen[0] = true;
        let mut reached = 1;
        while let Some(current) = queue.pop_front() {
            for &next in &adjacency[current] {
                if !seen[next] {
                    seen[next] = true;
                    reached += 1;
                    queue.push_back(next);
                }
            }
        }
        reached == self.nodes.len()
    }
}
