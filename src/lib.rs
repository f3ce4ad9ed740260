//! netweave - clustered network generation and force-directed layout for
//! animated network backdrops.
//!
//! Graphs come from a cluster generator, a topology-only mock generator, or a
//! normalized JSON document. A [`LayoutSimulator`] advances them one tick at
//! a time and hands owned [`FrameSnapshot`]s to a [`FrameSink`].

pub mod cluster;
pub mod config;
pub mod driver;
pub mod frame;
pub mod graph;
pub mod graph_writer;
pub mod io;
pub mod mock;
pub mod normalize;
pub mod simulation;

pub use cluster::{ClusterConfig, ClusterGenerator};
pub use config::{ConfigError, NetweaveConfig};
pub use driver::{AnimationDriver, DriverConfig, DriverEvent};
pub use frame::{FrameSink, FrameSnapshot, JsonLinesSink};
pub use graph::{Graph, GraphError, NodeSlot, NodeSpec, Vec2};
pub use graph_writer::GraphJsonWriter;
pub use io::{IngestError, IngestResult, JsonGraphReader, Reader, Writer, load_graph_from_file};
pub use mock::{MockGraphConfig, generate_mock_graph};
pub use normalize::{RawGraph, normalize_graph};
pub use simulation::{Bounds, LayoutSimulator, PhysicsConfig, SimulationState};
