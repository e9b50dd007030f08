//! # Lantern Game Loop
//!
//! One frame:
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │ 1. MEASURE                                                          │
//! │    └─ Wall-clock delta since last frame, clamped to max_delta       │
//! │                                                                     │
//! │ 2. EVENTS                                                           │
//! │    └─ Drain inbound channel, world.on_event() for each event        │
//! │                                                                     │
//! │ 3. UPDATE                                                           │
//! │    └─ world.on_update(dt): begin / per-entity / end for each system │
//! │                                                                     │
//! │ 4. RECORD                                                           │
//! │    └─ FrameStats into the accumulator, warn when over budget        │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The loop never sleeps; pacing belongs to the host (browser animation
//! frame, vsync, or a fixed-step driver).

use std::fmt;
use std::time::{Duration, Instant};

use lantern_core::WorldManager;
use tracing::{debug, warn};

use crate::config::FrameConfig;
use crate::events::{EngineEvent, EventBus, EventReceiver, EventSender};

/// Frame timing statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameStats {
    /// Total frame time in microseconds.
    pub total_us: u64,
    /// Event dispatch time in microseconds.
    pub events_us: u64,
    /// `on_update` time in microseconds.
    pub update_us: u64,
    /// Frame number.
    pub frame: u64,
    /// Events dispatched this frame.
    pub events_processed: u32,
    /// Delta time handed to systems, after clamping.
    pub delta_time: f32,
}

/// The frame orchestrator.
///
/// Owns the world and both event channels.
pub struct GameLoop {
    /// The ECS world.
    world: WorldManager<EngineEvent>,
    /// Application → systems.
    inbound: EventBus,
    /// Systems → application.
    outbound: EventBus,
    /// Configuration.
    config: FrameConfig,
    /// Frame counter.
    frame_count: u64,
    /// Last frame start time.
    last_frame_time: Option<Instant>,
    /// Accumulated frame statistics.
    stats_accumulator: FrameStatsAccumulator,
}

impl GameLoop {
    /// Creates a game loop around a world.
    ///
    /// Wires the world's event outlet to the outbound channel.
    ///
    /// # Arguments
    ///
    /// * `world` - The world to drive
    /// * `config` - Frame settings
    #[must_use]
    pub fn new(mut world: WorldManager<EngineEvent>, config: FrameConfig) -> Self {
        let inbound = EventBus::new(config.event_capacity);
        let outbound = EventBus::new(config.event_capacity);
        world.set_event_outlet(outbound.channel_sender());

        let stats_accumulator = FrameStatsAccumulator::new(config.target_frame_time());
        Self {
            world,
            inbound,
            outbound,
            config,
            frame_count: 0,
            last_frame_time: None,
            stats_accumulator,
        }
    }

    /// Runs one frame using wall-clock delta time.
    ///
    /// The first frame uses a delta of zero.
    pub fn tick(&mut self) -> FrameStats {
        let now = Instant::now();
        let delta = self
            .last_frame_time
            .map_or(Duration::ZERO, |last| now.duration_since(last));
        self.last_frame_time = Some(now);
        self.step(delta.as_secs_f32())
    }

    /// Runs one frame with an explicit delta time (seconds).
    ///
    /// The delta is clamped to `[0, max_delta_seconds]`.
    pub fn step(&mut self, dt: f32) -> FrameStats {
        let frame_start = Instant::now();
        let delta_time = self.config.clamp_delta(dt);

        let events = self.inbound.receiver().drain();
        for event in &events {
            self.world.on_event(event);
        }
        let events_done = Instant::now();

        self.world.on_update(delta_time);
        let update_done = Instant::now();

        let stats = FrameStats {
            total_us: micros(update_done - frame_start),
            events_us: micros(events_done - frame_start),
            update_us: micros(update_done - events_done),
            frame: self.frame_count,
            events_processed: u32::try_from(events.len()).unwrap_or(u32::MAX),
            delta_time,
        };
        self.end_frame(stats);
        stats
    }

    /// Runs `frames` fixed-delta frames.
    pub fn run_frames(&mut self, frames: u64, dt: f32) {
        for _ in 0..frames {
            self.step(dt);
        }
        debug!(frames, total = self.frame_count, "fixed-step run complete");
    }

    fn end_frame(&mut self, stats: FrameStats) {
        self.frame_count += 1;
        self.stats_accumulator.record(stats);

        if stats.total_us > micros(self.config.target_frame_time()) {
            warn!(
                frame = stats.frame,
                total_us = stats.total_us,
                budget_us = micros(self.config.target_frame_time()),
                "frame exceeded budget"
            );
        }
    }

    /// Returns the current frame count.
    #[inline]
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Handle the application uses to send events to systems.
    #[must_use]
    pub fn input(&self) -> EventSender {
        self.inbound.sender()
    }

    /// Handle the application uses to read events emitted by systems.
    #[must_use]
    pub fn output(&self) -> EventReceiver {
        self.outbound.receiver()
    }

    /// The world.
    #[must_use]
    pub fn world(&self) -> &WorldManager<EngineEvent> {
        &self.world
    }

    /// The world, mutably.
    pub fn world_mut(&mut self) -> &mut WorldManager<EngineEvent> {
        &mut self.world
    }

    /// Consumes the loop, returning the world.
    #[must_use]
    pub fn into_world(self) -> WorldManager<EngineEvent> {
        self.world
    }

    /// Returns the accumulated statistics.
    #[must_use]
    pub fn stats(&self) -> &FrameStatsAccumulator {
        &self.stats_accumulator
    }
}

fn micros(duration: Duration) -> u64 {
    u64::try_from(duration.as_micros()).unwrap_or(u64::MAX)
}

/// Accumulator for frame statistics.
#[derive(Clone, Debug)]
pub struct FrameStatsAccumulator {
    /// Frame budget used for over-budget counting.
    budget_us: u64,
    /// Total frames recorded.
    pub frames_recorded: u64,
    /// Sum of total frame times.
    pub total_us_sum: u64,
    /// Sum of event dispatch times.
    pub events_us_sum: u64,
    /// Sum of update times.
    pub update_us_sum: u64,
    /// Total events dispatched.
    pub events_processed: u64,
    /// Min frame time.
    pub min_frame_us: u64,
    /// Max frame time.
    pub max_frame_us: u64,
    /// Frames that exceeded budget.
    pub frames_over_budget: u64,
}

impl FrameStatsAccumulator {
    /// Creates a new accumulator for a frame budget.
    #[must_use]
    pub fn new(budget: Duration) -> Self {
        Self {
            budget_us: micros(budget),
            frames_recorded: 0,
            total_us_sum: 0,
            events_us_sum: 0,
            update_us_sum: 0,
            events_processed: 0,
            min_frame_us: u64::MAX,
            max_frame_us: 0,
            frames_over_budget: 0,
        }
    }

    /// Records a frame's statistics.
    pub fn record(&mut self, stats: FrameStats) {
        self.frames_recorded += 1;
        self.total_us_sum += stats.total_us;
        self.events_us_sum += stats.events_us;
        self.update_us_sum += stats.update_us;
        self.events_processed += u64::from(stats.events_processed);
        self.min_frame_us = self.min_frame_us.min(stats.total_us);
        self.max_frame_us = self.max_frame_us.max(stats.total_us);

        if stats.total_us > self.budget_us {
            self.frames_over_budget += 1;
        }
    }

    /// Returns average frame time in milliseconds.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn avg_frame_ms(&self) -> f64 {
        if self.frames_recorded == 0 {
            return 0.0;
        }
        (self.total_us_sum as f64 / self.frames_recorded as f64) / 1000.0
    }

    /// Returns the percentage of frames over budget.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn over_budget_ratio(&self) -> f64 {
        if self.frames_recorded == 0 {
            return 0.0;
        }
        self.frames_over_budget as f64 / self.frames_recorded as f64
    }
}

impl Default for FrameStatsAccumulator {
    fn default() -> Self {
        Self::new(FrameConfig::default().target_frame_time())
    }
}

impl fmt::Display for FrameStatsAccumulator {
    #[allow(clippy::cast_precision_loss)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let min_ms = if self.frames_recorded == 0 {
            0.0
        } else {
            self.min_frame_us as f64 / 1000.0
        };
        writeln!(f, "frames:       {}", self.frames_recorded)?;
        writeln!(f, "avg frame:    {:.3} ms", self.avg_frame_ms())?;
        writeln!(f, "min frame:    {min_ms:.3} ms")?;
        writeln!(f, "max frame:    {:.3} ms", self.max_frame_us as f64 / 1000.0)?;
        writeln!(f, "events:       {}", self.events_processed)?;
        write!(
            f,
            "over budget:  {} ({:.1}%)",
            self.frames_over_budget,
            self.over_budget_ratio() * 100.0
        )
    }
}
