//! Continuous force-directed layout
//!
//! Every tick applies, per edge, a Hooke spring and a damped inverse-square
//! repulsion between its endpoints, adds per-axis random jitter to every
//! node, decays velocity exponentially and reflects nodes off the canvas
//! walls. Forces for a tick are computed from frozen positions before any
//! node moves.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::frame::FrameSnapshot;
use crate::graph::{Graph, Vec2};

// =============================================================================
// Default Constants
// =============================================================================

/// Spring constant along edges
pub const DEFAULT_SPRING_CONSTANT: f64 = 0.012;

/// Rest length for edges whose endpoints have no measured distance yet (px)
pub const DEFAULT_SPRING_REST_LENGTH: f64 = 36.0;

/// Repulsion strength between edge endpoints (px²)
pub const DEFAULT_REPULSION_STRENGTH: f64 = 450.0;

/// Extra scale applied to the repulsion term only
pub const DEFAULT_REPULSION_SCALE: f64 = 0.35;

/// Velocity multiplier applied every tick
pub const DEFAULT_DAMPING_FACTOR: f64 = 0.9;

/// Peak-to-peak magnitude of the per-axis jitter force
pub const DEFAULT_JITTER_MAGNITUDE: f64 = 0.15;

/// Distance nodes keep from the canvas edges, on top of their own size (px)
pub const DEFAULT_WALL_PADDING: f64 = 18.0;

/// Fraction of velocity kept (and reversed) on a wall bounce
pub const DEFAULT_RESTITUTION: f64 = 0.5;

/// Largest time step taken in one tick, in seconds
pub const DEFAULT_MAX_STEP: f64 = 1.0 / 30.0;

/// Lower bound on edge lengths used as divisors, so coincident endpoints stay finite
pub const DISTANCE_EPSILON: f64 = 1e-4;

/// Physics tuning for the layout simulator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub spring_constant: f64,
    /// Default rest length for edges that were not measured at creation
    pub spring_rest_length: f64,
    pub repulsion_strength: f64,
    pub repulsion_scale: f64,
    pub damping_factor: f64,
    pub jitter_magnitude: f64,
    pub wall_padding: f64,
    pub restitution: f64,
    pub max_step: f64,
    /// Whether a suspended simulation may start again
    pub allow_resume: bool,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            spring_constant: DEFAULT_SPRING_CONSTANT,
            spring_rest_length: DEFAULT_SPRING_REST_LENGTH,
            repulsion_strength: DEFAULT_REPULSION_STRENGTH,
            repulsion_scale: DEFAULT_REPULSION_SCALE,
            damping_factor: DEFAULT_DAMPING_FACTOR,
            jitter_magnitude: DEFAULT_JITTER_MAGNITUDE,
            wall_padding: DEFAULT_WALL_PADDING,
            restitution: DEFAULT_RESTITUTION,
            max_step: DEFAULT_MAX_STEP,
            allow_resume: false,
        }
    }
}

/// Canvas dimensions in pixels
///
/// The canvas spans `x ∈ [0, width]` and `y ∈ [-height, 0]` (top-left origin).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Lifecycle of a simulator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationState {
    Uninitialized,
    Running,
    Suspended,
    Disposed,
}

/// Owns a graph and advances its kinematics one tick at a time
pub struct LayoutSimulator {
    graph: Graph,
    bounds: Bounds,
    config: PhysicsConfig,
    state: SimulationState,
    frame: u64,
    rng: StdRng,
    forces: Vec<Vec2>,
}

impl LayoutSimulator {
    /// Create a simulator with an OS-seeded jitter source
    pub fn new(graph: Graph, bounds: Bounds, config: PhysicsConfig) -> Self {
        Self::with_rng(graph, bounds, config, StdRng::from_os_rng())
    }

    /// Create a simulator with a caller-provided jitter source
    pub fn with_rng(graph: Graph, bounds: Bounds, config: PhysicsConfig, rng: StdRng) -> Self {
        let forces = vec![Vec2::ZERO; graph.len()];
        Self {
            graph,
            bounds,
            config,
            state: SimulationState::Uninitialized,
            frame: 0,
            rng,
            forces,
        }
    }

    pub fn state(&self) -> SimulationState {
        self.state
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Number of ticks that advanced the layout
    pub fn frame_index(&self) -> u64 {
        self.frame
    }

    /// Stop advancing; the layout is kept as-is
    pub fn suspend(&mut self) {
        if matches!(
            self.state,
            SimulationState::Uninitialized | SimulationState::Running
        ) {
            self.state = SimulationState::Suspended;
        }
    }

    /// Start a suspended simulation again, if the config allows it
    pub fn resume(&mut self) -> bool {
        if self.state == SimulationState::Suspended && self.config.allow_resume {
            self.state = SimulationState::Running;
            return true;
        }
        false
    }

    /// Terminal: no further ticks produce frames
    pub fn dispose(&mut self) {
        self.state = SimulationState::Disposed;
        self.forces = Vec::new();
    }

    /// Advance by `dt` seconds and return the resulting frame
    ///
    /// A suspended simulator returns its frozen frame; a disposed one returns `None`.
    pub fn tick(&mut self, dt: f64) -> Option<FrameSnapshot> {
        match self.state {
            SimulationState::Disposed => return None,
            SimulationState::Suspended => return Some(self.snapshot()),
            SimulationState::Uninitialized => self.state = SimulationState::Running,
            SimulationState::Running => {}
        }

        let dt = if dt.is_finite() {
            dt.clamp(0.0, self.config.max_step)
        } else {
            0.0
        };

        self.seed_jitter();
        self.apply_edge_forces();
        self.integrate(dt);
        self.frame += 1;

        Some(self.snapshot())
    }

    /// The current frame without advancing
    pub fn snapshot(&self) -> FrameSnapshot {
        FrameSnapshot::capture(self.frame, self.bounds, &self.graph)
    }

    /// Reset every accumulator to an independent per-axis jitter
    fn seed_jitter(&mut self) {
        let jitter = self.config.jitter_magnitude;
        let rng = &mut self.rng;
        self.forces.clear();
        self.forces.extend((0..self.graph.len()).map(|_| {
            if jitter == 0.0 {
                Vec2::ZERO
            } else {
                Vec2::new(
                    (rng.random::<f64>() - 0.5) * jitter,
                    (rng.random::<f64>() - 0.5) * jitter,
                )
            }
        }));
    }

    /// Spring + repulsion between the endpoints of every edge
    fn apply_edge_forces(&mut self) {
        let PhysicsConfig {
            spring_constant,
            repulsion_strength,
            repulsion_scale,
            ..
        } = self.config;
        let nodes = self.graph.nodes();

        for edge in self.graph.edges() {
            let (a, b) = (edge.a().index(), edge.b().index());
            let delta = nodes[b].position - nodes[a].position;
            let len = delta.length();
            // Only the divisions are guarded; the stretch uses the true length.
            let dist = len.max(DISTANCE_EPSILON);
            let dir = delta.scale(1.0 / dist);

            // Hooke's law: F = k * (x - x0)
            let spring = spring_constant * (len - edge.rest_length);
            let repulsion = repulsion_strength / (dist * dist) * repulsion_scale;
            let force = dir.scale(spring - repulsion);

            self.forces[a] += force;
            self.forces[b] -= force;
        }
    }

    /// Velocity update, position step, then wall reflection
    fn integrate(&mut self, dt: f64) {
        let Bounds { width, height } = self.bounds;
        let damping = self.config.damping_factor;
        let restitution = self.config.restitution;
        let wall_padding = self.config.wall_padding;

        for (node, force) in self.graph.nodes_mut().iter_mut().zip(&self.forces) {
            node.velocity = (node.velocity + force.scale(dt)).scale(damping);
            node.position += node.velocity;

            let pad = wall_padding + node.size();
            reflect(
                &mut node.position.x,
                &mut node.velocity.x,
                [pad, width - pad],
                restitution,
            );
            reflect(
                &mut node.position.y,
                &mut node.velocity.y,
                [-(height - pad), -pad],
                restitution,
            );
        }
    }
}

/// Keep one axis inside `[lo, hi]`, bouncing the velocity on contact
///
/// A canvas narrower than twice the padding has no valid span; the node is
/// pinned to its middle.
fn reflect(position: &mut f64, velocity: &mut f64, [lo, hi]: [f64; 2], restitution: f64) {
    let bound = if lo > hi {
        (lo + hi) / 2.0
    } else if *position < lo {
        lo
    } else if *position > hi {
        hi
    } else {
        return;
    };
    *position = bound;
    *velocity = -*velocity * restitution;
}
