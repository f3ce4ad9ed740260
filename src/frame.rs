//! Render snapshots and the sink trait renderers implement
//!
//! A [`FrameSnapshot`] is an owned copy of everything a renderer needs for
//! one frame. Sinks never see the simulator's graph directly.

use std::io::Write;

use serde::Serialize;

use crate::graph::Graph;
use crate::simulation::Bounds;

/// A node as the renderer sees it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeSprite {
    pub x: f64,
    pub y: f64,
    pub size: f64,
    pub is_hub: bool,
    pub group: i64,
}

/// An edge with resolved endpoint coordinates
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeSegment {
    pub from: [f64; 2],
    pub to: [f64; 2],
}

/// Everything needed to draw one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameSnapshot {
    /// Number of ticks that advanced the layout before this frame
    pub frame: u64,
    pub width: f64,
    pub height: f64,
    pub nodes: Vec<NodeSprite>,
    pub edges: Vec<EdgeSegment>,
}

impl FrameSnapshot {
    /// Copy positions, sizes and edge endpoints out of a graph
    pub fn capture(frame: u64, bounds: Bounds, graph: &Graph) -> Self {
        let nodes = graph.nodes();
        Self {
            frame,
            width: bounds.width,
            height: bounds.height,
            nodes: nodes
                .iter()
                .map(|n| NodeSprite {
                    x: n.position().x,
                    y: n.position().y,
                    size: n.size(),
                    is_hub: n.is_hub(),
                    group: n.group(),
                })
                .collect(),
            edges: graph
                .edges()
                .iter()
                .map(|e| {
                    let (a, b) = (nodes[e.a().index()].position(), nodes[e.b().index()].position());
                    EdgeSegment {
                        from: [a.x, a.y],
                        to: [b.x, b.y],
                    }
                })
                .collect(),
        }
    }
}

/// Consumer of layout frames (a GPU renderer, a canvas, a file...)
pub trait FrameSink {
    /// Draw or record one frame
    fn render(&mut self, frame: &FrameSnapshot) -> std::io::Result<()>;

    /// Release any resources tied to the sink; called once on disposal
    fn release(&mut self) {}
}

/// Writes each frame as one line of JSON
pub struct JsonLinesSink<W: Write> {
    out: W,
    frames_written: u64,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            frames_written: 0,
        }
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> FrameSink for JsonLinesSink<W> {
    fn render(&mut self, frame: &FrameSnapshot) -> std::io::Result<()> {
        serde_json::to_writer(&mut self.out, frame)?;
        self.out.write_all(b"\n")?;
        self.frames_written += 1;
        Ok(())
    }

    fn release(&mut self) {
        if let Err(e) = self.out.flush() {
            tracing::warn!(error = %e, "failed to flush frame output");
        }
    }
}
