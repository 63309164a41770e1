// Keymouse Motion Integrator
// Fixed-rate loop turning held velocity into pointer moves and wheel clicks

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use smallvec::SmallVec;

use crate::output::{OutputError, OutputSink};
use crate::motion::click_units;
use crate::{MotionState, ScrollDirection, SharedMotion};

/// Output decided by one tick, emitted after the motion lock is released.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickOutput {
    pub warp: Option<(f64, f64)>,
    pub scroll: SmallVec<[ScrollDirection; 4]>,
}

/// Pull whole clicks out of one axis of the scroll remainder, where `one`
/// is a full click.
///
/// Leaves the remainder in [-one/2, one/2]. Only one direction is drained
/// per call so an exact tie cannot flip back and forth.
fn quantize(
    remainder: &mut i64,
    one: i64,
    positive: ScrollDirection,
    negative: ScrollDirection,
    out: &mut SmallVec<[ScrollDirection; 4]>,
) {
    let half = one / 2;
    if *remainder >= half {
        while *remainder >= half {
            *remainder -= one;
            out.push(positive);
        }
    } else if *remainder <= -half {
        while *remainder <= -half {
            *remainder += one;
            out.push(negative);
        }
    }
}

/// Advance `state` by one tick.
pub fn step(state: &mut MotionState, tick_rate: u32) -> TickOutput {
    let mut out = TickOutput::default();

    if !state.mouse_mode {
        state.stop();
        return out;
    }

    let rate = f64::from(tick_rate.max(1));

    if !state.pointer.is_zero() {
        let (vx, vy) = state.pointer.as_f64();
        let speed = f64::from(state.speed);
        out.warp = Some((vx * speed / rate, vy * speed / rate));
    }

    // Velocity is fixed point, so with the remainder counted in
    // 1/(65536 * rate) clicks each tick adds the raw velocity exactly.
    let one = click_units(tick_rate);
    let (rx, ry) = &mut state.scroll_remainder;
    let mut scrolled = false;
    if let Some((nx, ny)) = state.scroll_nudge.take() {
        *rx = rx.saturating_add(i64::from(nx) * one);
        *ry = ry.saturating_add(i64::from(ny) * one);
        scrolled = true;
    }
    if !state.scroll.is_zero() {
        let (vx, vy) = state.scroll.raw();
        *rx = rx.saturating_add(vx);
        *ry = ry.saturating_add(vy);
        scrolled = true;
    }

    // An idle remainder is never re-quantized.
    if scrolled {
        quantize(rx, one, ScrollDirection::Right, ScrollDirection::Left, &mut out.scroll);
        quantize(ry, one, ScrollDirection::Down, ScrollDirection::Up, &mut out.scroll);
    }

    out
}

/// Drains [`SharedMotion`] into an [`OutputSink`] on a fixed clock.
pub struct MotionIntegrator<S> {
    motion: SharedMotion,
    sink: S,
    tick_rate: u32,
    running: Arc<AtomicBool>,
}

impl<S: OutputSink> MotionIntegrator<S> {
    pub fn new(motion: SharedMotion, sink: S, tick_rate: u32, running: Arc<AtomicBool>) -> Self {
        Self {
            motion,
            sink,
            tick_rate: tick_rate.max(1),
            running,
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.tick_rate))
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Run one tick and emit its output
    pub fn tick(&mut self) -> Result<(), OutputError> {
        let output = step(&mut self.motion.lock(), self.tick_rate);

        if let Some((dx, dy)) = output.warp {
            self.sink.warp_relative(dx, dy)?;
        }
        for direction in output.scroll {
            let button = direction.button();
            self.sink.button_event(button, true)?;
            self.sink.button_event(button, false)?;
        }
        Ok(())
    }

    /// Tick until the running flag is cleared.
    ///
    /// Sleeps to absolute deadlines so slow ticks do not drift the rate; after
    /// falling behind it restarts the schedule instead of bursting.
    pub fn run(&mut self) -> Result<(), OutputError> {
        let interval = self.interval();
        log::info!("Motion integrator running at {} Hz", self.tick_rate);

        let mut deadline = Instant::now() + interval;
        while self.running.load(Ordering::SeqCst) {
            self.tick()?;

            let now = Instant::now();
            if deadline > now {
                thread::sleep(deadline - now);
                deadline += interval;
            } else {
                deadline = now + interval;
            }
        }

        log::info!("Motion integrator stopped");
        Ok(())
    }
}
