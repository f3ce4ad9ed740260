//! Frame scheduling around the layout simulator
//!
//! The driver owns the generator, the current simulator and the sink. It is
//! the only place that knows about time: [`AnimationDriver::run`] ticks on a
//! `tokio` interval and reacts to viewport events. A resize never patches
//! the layout in place; the graph and simulator are discarded and a fresh
//! layout is generated for the new canvas.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};

use crate::cluster::ClusterGenerator;
use crate::frame::FrameSink;
use crate::simulation::{Bounds, LayoutSimulator, PhysicsConfig, SimulationState};

/// Scheduling options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Time between frame callbacks
    pub frame_interval_ms: u64,
    /// Stop after this many rendered frames
    pub max_frames: Option<u64>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: 16,
            max_frames: None,
        }
    }
}

/// Environment signals the driver reacts to
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DriverEvent {
    /// The canvas changed size; regenerate the layout
    Resize { width: f64, height: f64 },
    /// The user prefers reduced motion; freeze for good
    ReducedMotion,
    /// The viewport is too small for animation; freeze for good
    SmallViewport,
    /// Stop scheduling and release the sink
    Dispose,
}

/// Drives a [`LayoutSimulator`] and feeds its frames to a sink
pub struct AnimationDriver<S: FrameSink> {
    generator: ClusterGenerator,
    physics: PhysicsConfig,
    config: DriverConfig,
    sink: S,
    rng: StdRng,
    simulator: Option<LayoutSimulator>,
    generation: u64,
    frames_rendered: u64,
    suspended: bool,
    disposed: bool,
}

impl<S: FrameSink> AnimationDriver<S> {
    pub fn new(
        generator: ClusterGenerator,
        physics: PhysicsConfig,
        config: DriverConfig,
        sink: S,
        rng: StdRng,
    ) -> Self {
        Self {
            generator,
            physics,
            config,
            sink,
            rng,
            simulator: None,
            generation: 0,
            frames_rendered: 0,
            suspended: false,
            disposed: false,
        }
    }

    /// Generate the first layout once the canvas size is known
    pub fn start(&mut self, width: f64, height: f64) -> std::io::Result<()> {
        self.regenerate(width, height)
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn simulator(&self) -> Option<&LayoutSimulator> {
        self.simulator.as_ref()
    }

    /// How many layouts have been generated (1 after start, +1 per resize)
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// One display-refresh callback; returns whether a frame was rendered
    pub fn frame(&mut self, dt: f64) -> std::io::Result<bool> {
        if self.disposed || self.suspended {
            return Ok(false);
        }
        let Some(frame) = self.simulator.as_mut().and_then(|sim| sim.tick(dt)) else {
            return Ok(false);
        };
        self.sink.render(&frame)?;
        self.frames_rendered += 1;
        Ok(true)
    }

    /// React to an environment event
    pub fn handle(&mut self, event: DriverEvent) -> std::io::Result<()> {
        if self.disposed {
            return Ok(());
        }
        match event {
            DriverEvent::Resize { width, height } => self.regenerate(width, height),
            DriverEvent::ReducedMotion | DriverEvent::SmallViewport => {
                tracing::info!(?event, "suspending animation");
                self.suspended = true;
                self.freeze()
            }
            DriverEvent::Dispose => {
                self.dispose();
                Ok(())
            }
        }
    }

    /// Stop all future ticks and release the sink
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        if let Some(sim) = self.simulator.as_mut() {
            sim.dispose();
        }
        self.sink.release();
        self.disposed = true;
        tracing::info!(frames = self.frames_rendered, "animation disposed");
    }

    /// Tick on a fixed interval until disposed, the event channel closes, or
    /// the frame limit is reached
    ///
    /// A suspended driver stops ticking and only waits for events. Any sink
    /// error disposes the driver before it is returned.
    pub async fn run(&mut self, mut events: mpsc::Receiver<DriverEvent>) -> std::io::Result<()> {
        let result = self.drive(&mut events).await;
        if result.is_err() {
            self.dispose();
        }
        result
    }

    async fn drive(&mut self, events: &mut mpsc::Receiver<DriverEvent>) -> std::io::Result<()> {
        let period = Duration::from_millis(self.config.frame_interval_ms.max(1));
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut last = Instant::now();

        while !self.disposed {
            if self.suspended {
                let event = events.recv().await;
                self.on_event(event)?;
                continue;
            }

            tokio::select! {
                biased;

                event = events.recv() => self.on_event(event)?,
                _ = interval.tick() => {
                    let now = Instant::now();
                    let dt = now.duration_since(last).as_secs_f64();
                    last = now;
                    self.frame(dt)?;
                    if self
                        .config
                        .max_frames
                        .is_some_and(|max| self.frames_rendered >= max)
                    {
                        self.dispose();
                    }
                }
            }
        }
        Ok(())
    }

    /// A received event, or `None` once every sender is gone
    fn on_event(&mut self, event: Option<DriverEvent>) -> std::io::Result<()> {
        match event {
            Some(event) => self.handle(event),
            None => {
                self.dispose();
                Ok(())
            }
        }
    }

    /// Discard the current graph and simulator and build fresh ones
    fn regenerate(&mut self, width: f64, height: f64) -> std::io::Result<()> {
        let bounds = Bounds::new(width.max(1.0), height.max(1.0));
        let graph = self
            .generator
            .generate(&mut self.rng, bounds.width, bounds.height);
        let jitter = StdRng::seed_from_u64(self.rng.random());

        self.simulator = Some(LayoutSimulator::with_rng(
            graph,
            bounds,
            self.physics.clone(),
            jitter,
        ));
        self.generation += 1;
        tracing::info!(
            width = bounds.width,
            height = bounds.height,
            generation = self.generation,
            "generated layout"
        );

        if self.suspended {
            self.freeze()?;
        }
        Ok(())
    }

    /// Suspend the simulator and hand the sink one static frame
    fn freeze(&mut self) -> std::io::Result<()> {
        let Some(sim) = self.simulator.as_mut() else {
            return Ok(());
        };
        sim.suspend();
        if sim.state() == SimulationState::Suspended {
            let frame = sim.snapshot();
            self.sink.render(&frame)?;
            self.frames_rendered += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::ClusterConfig;
    use crate::frame::FrameSnapshot;
    use crate::simulation::DEFAULT_MAX_STEP;

    #[derive(Default)]
    struct RecordingSink {
        frames: Vec<FrameSnapshot>,
        released: usize,
    }

    impl FrameSink for RecordingSink {
        fn render(&mut self, frame: &FrameSnapshot) -> std::io::Result<()> {
            self.frames.push(frame.clone());
            Ok(())
        }

        fn release(&mut self) {
            self.released += 1;
        }
    }

    /// Accepts `budget` frames, then fails every render
    struct FailingSink {
        budget: usize,
        released: usize,
    }

    impl FrameSink for FailingSink {
        fn render(&mut self, _frame: &FrameSnapshot) -> std::io::Result<()> {
            if self.budget == 0 {
                return Err(std::io::Error::other("disk full"));
            }
            self.budget -= 1;
            Ok(())
        }

        fn release(&mut self) {
            self.released += 1;
        }
    }

    fn generator() -> ClusterGenerator {
        ClusterGenerator::new(ClusterConfig {
            node_count: 120,
            ..ClusterConfig::default()
        })
    }

    fn driver(config: DriverConfig) -> AnimationDriver<RecordingSink> {
        AnimationDriver::new(
            generator(),
            PhysicsConfig::default(),
            config,
            RecordingSink::default(),
            StdRng::seed_from_u64(99),
        )
    }

    fn inside(frame: &FrameSnapshot) -> bool {
        frame.nodes.iter().all(|n| {
            n.x >= 0.0 && n.x <= frame.width && n.y <= 0.0 && n.y >= -frame.height
        })
    }

    #[test]
    fn frames_reach_the_sink() {
        let mut driver = driver(DriverConfig::default());
        driver.start(1200.0, 800.0).unwrap();
        assert!(driver.frame(DEFAULT_MAX_STEP).unwrap());
        assert!(driver.frame(DEFAULT_MAX_STEP).unwrap());

        let frames = &driver.sink().frames;
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].frame, 2);
        assert_eq!(frames[1].nodes.len(), 120);
    }

    #[test]
    fn frame_before_start_is_a_no_op() {
        let mut driver = driver(DriverConfig::default());
        assert!(!driver.frame(DEFAULT_MAX_STEP).unwrap());
        assert!(driver.sink().frames.is_empty());
    }

    #[test]
    fn resize_replaces_graph_and_simulator() {
        let mut driver = driver(DriverConfig::default());
        driver.start(1600.0, 1000.0).unwrap();
        for _ in 0..5 {
            driver.frame(DEFAULT_MAX_STEP).unwrap();
        }

        driver
            .handle(DriverEvent::Resize {
                width: 500.0,
                height: 400.0,
            })
            .unwrap();
        assert_eq!(driver.generation(), 2);

        let sim = driver.simulator().unwrap();
        assert_eq!(sim.bounds(), Bounds::new(500.0, 400.0));
        assert_eq!(sim.frame_index(), 0);
        assert_eq!(sim.graph().len(), 120);

        driver.frame(DEFAULT_MAX_STEP).unwrap();
        let last = driver.sink().frames.last().unwrap();
        assert_eq!(last.frame, 1);
        assert_eq!((last.width, last.height), (500.0, 400.0));
        assert!(inside(last));
    }

    #[test]
    fn reduced_motion_freezes_permanently() {
        let mut driver = driver(DriverConfig::default());
        driver.start(1200.0, 800.0).unwrap();
        driver.frame(DEFAULT_MAX_STEP).unwrap();
        driver.handle(DriverEvent::ReducedMotion).unwrap();

        // One static frame on suspension, nothing afterwards.
        assert_eq!(driver.sink().frames.len(), 2);
        assert!(!driver.frame(DEFAULT_MAX_STEP).unwrap());
        assert_eq!(driver.sink().frames.len(), 2);
        assert_eq!(
            driver.simulator().unwrap().state(),
            SimulationState::Suspended
        );

        driver
            .handle(DriverEvent::Resize {
                width: 900.0,
                height: 700.0,
            })
            .unwrap();
        assert_eq!(
            driver.simulator().unwrap().state(),
            SimulationState::Suspended
        );
        assert!(!driver.frame(DEFAULT_MAX_STEP).unwrap());
    }

    #[test]
    fn dispose_stops_ticks_and_releases_sink_once() {
        let mut driver = driver(DriverConfig::default());
        driver.start(1200.0, 800.0).unwrap();
        driver.frame(DEFAULT_MAX_STEP).unwrap();
        driver.handle(DriverEvent::Dispose).unwrap();
        driver.dispose();

        assert!(driver.is_disposed());
        assert_eq!(driver.sink().released, 1);
        assert!(!driver.frame(DEFAULT_MAX_STEP).unwrap());
        driver
            .handle(DriverEvent::Resize {
                width: 10.0,
                height: 10.0,
            })
            .unwrap();
        assert_eq!(driver.generation(), 1);
        assert_eq!(driver.sink().frames.len(), 1);
        assert_eq!(
            driver.simulator().unwrap().state(),
            SimulationState::Disposed
        );
    }

    #[tokio::test]
    async fn run_stops_at_frame_limit() {
        let mut driver = driver(DriverConfig {
            frame_interval_ms: 1,
            max_frames: Some(3),
        });
        driver.start(800.0, 600.0).unwrap();
        let (_tx, rx) = mpsc::channel(4);

        driver.run(rx).await.unwrap();

        assert_eq!(driver.sink().frames.len(), 3);
        assert_eq!(driver.sink().released, 1);
        assert!(driver.is_disposed());
    }

    #[tokio::test]
    async fn run_stops_when_events_close() {
        let mut driver = driver(DriverConfig::default());
        driver.start(800.0, 600.0).unwrap();
        let (tx, rx) = mpsc::channel(4);
        tx.send(DriverEvent::ReducedMotion).await.unwrap();
        drop(tx);

        driver.run(rx).await.unwrap();

        assert!(driver.is_disposed());
        assert_eq!(driver.sink().frames.len(), 1);
        assert_eq!(driver.sink().released, 1);
    }

    #[tokio::test]
    async fn sink_error_disposes_and_releases() {
        let sink = FailingSink {
            budget: 2,
            released: 0,
        };
        let config = DriverConfig {
            frame_interval_ms: 1,
            max_frames: None,
        };
        let mut driver = AnimationDriver::new(
            generator(),
            PhysicsConfig::default(),
            config,
            sink,
            StdRng::seed_from_u64(5),
        );
        driver.start(800.0, 600.0).unwrap();
        let (_tx, rx) = mpsc::channel(4);

        let err = driver.run(rx).await.unwrap_err();

        assert_eq!(err.to_string(), "disk full");
        assert_eq!(driver.frames_rendered(), 2);
        assert!(driver.is_disposed());
        assert_eq!(driver.sink().released, 1);
        assert_eq!(
            driver.simulator().unwrap().state(),
            SimulationState::Disposed
        );
    }

    #[tokio::test]
    async fn suspended_run_waits_for_events_only() {
        let mut driver = driver(DriverConfig {
            frame_interval_ms: 1,
            max_frames: Some(2),
        });
        driver.start(800.0, 600.0).unwrap();
        let (tx, rx) = mpsc::channel(4);
        tx.send(DriverEvent::SmallViewport).await.unwrap();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            tx.send(DriverEvent::Resize {
                width: 640.0,
                height: 480.0,
            })
            .await
            .unwrap();
            tokio::time::sleep(Duration::from_millis(30)).await;
            tx.send(DriverEvent::Dispose).await.unwrap();
        });

        driver.run(rx).await.unwrap();

        // The suspension frame and the regenerated static frame, nothing
        // ticked in between even though the frame limit was never reached.
        let frames = &driver.sink().frames;
        assert_eq!(frames.len(), 2);
        assert!(frames.iter().all(|f| f.frame == 0));
        assert_eq!(frames[1].width, 640.0);
        assert_eq!(driver.generation(), 2);
        assert_eq!(driver.sink().released, 1);
    }
}
