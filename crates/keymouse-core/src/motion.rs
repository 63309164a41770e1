// Keymouse Motion State
// Pointer/scroll velocity shared between the event router and the integrator

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

/// Binding units are stored in 1/65536ths so that adding and removing the
/// same binding always cancels exactly, whatever the release order.
pub(crate) const FIXED_SCALE: i64 = 65536;
const FIXED_ONE: f64 = FIXED_SCALE as f64;

/// One scroll click in remainder units (1/65536 binding unit per tick).
pub(crate) fn click_units(tick_rate: u32) -> i64 {
    FIXED_SCALE * i64::from(tick_rate.max(1))
}

/// A 2D velocity in fixed-point binding units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Velocity {
    x: i64,
    y: i64,
}

impl Velocity {
    pub const ZERO: Velocity = Velocity { x: 0, y: 0 };

    /// Convert a binding's `(dx, dy)`. The same input always yields the same
    /// fixed-point value.
    pub fn from_units(dx: f64, dy: f64) -> Self {
        Self {
            x: (dx * FIXED_ONE).round() as i64,
            y: (dy * FIXED_ONE).round() as i64,
        }
    }

    /// Add (`sign` = 1) or remove (`sign` = -1) `other`, saturating at the
    /// i64 range.
    pub fn accumulate(&mut self, other: Velocity, sign: i64) {
        self.x = self.x.saturating_add(other.x.saturating_mul(sign));
        self.y = self.y.saturating_add(other.y.saturating_mul(sign));
    }

    pub fn is_zero(&self) -> bool {
        self.x == 0 && self.y == 0
    }

    pub fn x(&self) -> f64 {
        self.x as f64 / FIXED_ONE
    }

    pub fn y(&self) -> f64 {
        self.y as f64 / FIXED_ONE
    }

    pub fn as_f64(&self) -> (f64, f64) {
        (self.x(), self.y())
    }

    /// Raw fixed-point components
    pub(crate) fn raw(&self) -> (i64, i64) {
        (self.x, self.y)
    }

    /// Per-axis sign as -1, 0 or 1
    pub fn signum(&self) -> (i8, i8) {
        (self.x.signum() as i8, self.y.signum() as i8)
    }
}

/// Everything the integrator needs to turn held keys into motion.
#[derive(Debug, Clone)]
pub struct MotionState {
    pub(crate) mouse_mode: bool,
    pub(crate) pointer: Velocity,
    pub(crate) scroll: Velocity,
    /// Units of 1/(65536 * tick_rate) click, so ties land exactly on half
    pub(crate) scroll_remainder: (i64, i64),
    pub(crate) speed: u32,
    pub(crate) scroll_nudge: Option<(i8, i8)>,
}

impl MotionState {
    pub fn new(default_speed: u32) -> Self {
        Self {
            mouse_mode: false,
            pointer: Velocity::ZERO,
            scroll: Velocity::ZERO,
            scroll_remainder: (0, 0),
            speed: default_speed,
            scroll_nudge: None,
        }
    }

    pub fn mouse_mode(&self) -> bool {
        self.mouse_mode
    }

    pub fn set_mouse_mode(&mut self, active: bool) {
        self.mouse_mode = active;
    }

    pub fn pointer_velocity(&self) -> (f64, f64) {
        self.pointer.as_f64()
    }

    pub fn scroll_velocity(&self) -> (f64, f64) {
        self.scroll.as_f64()
    }

    /// Fractional scroll clicks carried over, as seen by an integrator
    /// running at `tick_rate`
    pub fn scroll_remainder(&self, tick_rate: u32) -> (f64, f64) {
        let one = click_units(tick_rate) as f64;
        (
            self.scroll_remainder.0 as f64 / one,
            self.scroll_remainder.1 as f64 / one,
        )
    }

    pub fn speed(&self) -> u32 {
        self.speed
    }

    pub fn set_speed(&mut self, speed: u32) {
        self.speed = speed;
    }

    pub fn apply_move(&mut self, delta: Velocity, pressed: bool) {
        self.pointer.accumulate(delta, if pressed { 1 } else { -1 });
    }

    pub fn apply_scroll(&mut self, delta: Velocity, pressed: bool) {
        self.scroll.accumulate(delta, if pressed { 1 } else { -1 });
    }

    /// Ask the integrator for one immediate scroll unit in the direction of
    /// the current scroll velocity.
    pub fn request_scroll_nudge(&mut self) {
        let (sx, sy) = self.scroll.signum();
        self.scroll_nudge = Some((sx, sy));
    }

    /// Drop all held velocity (mode exit)
    pub fn stop(&mut self) {
        self.pointer = Velocity::ZERO;
        self.scroll = Velocity::ZERO;
        self.scroll_nudge = None;
    }
}

/// Synchronized handle to the [`MotionState`].
///
/// Cloned into the integrator thread; every read-modify-write on the state
/// happens under this one lock.
#[derive(Debug, Clone)]
pub struct SharedMotion(Arc<Mutex<MotionState>>);

impl SharedMotion {
    pub fn new(default_speed: u32) -> Self {
        Self(Arc::new(Mutex::new(MotionState::new(default_speed))))
    }

    pub fn lock(&self) -> MutexGuard<'_, MotionState> {
        self.0.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_velocity_cancels_exactly() {
        let a = Velocity::from_units(0.1, 0.7);
        let b = Velocity::from_units(0.2, -0.3);
        let c = Velocity::from_units(1.0 / 3.0, 0.0);

        let mut v = Velocity::ZERO;
        v.accumulate(a, 1);
        v.accumulate(b, 1);
        v.accumulate(c, 1);
        v.accumulate(b, -1);
        v.accumulate(a, -1);
        v.accumulate(c, -1);
        assert!(v.is_zero());
        assert_eq!(v.as_f64(), (0.0, 0.0));
    }

    #[test]
    fn test_velocity_conversion() {
        let v = Velocity::from_units(1.0, -2.5);
        assert_eq!(v.as_f64(), (1.0, -2.5));
        assert_eq!(v.signum(), (1, -1));
        assert_eq!(Velocity::ZERO.signum(), (0, 0));
    }

    #[test]
    fn test_stop_keeps_speed_and_remainder() {
        let mut state = MotionState::new(10);
        state.apply_move(Velocity::from_units(1.0, 0.0), true);
        state.apply_scroll(Velocity::from_units(0.0, 5.0), true);
        state.scroll_remainder = (0, click_units(60) / 4);
        state.set_speed(100);
        state.stop();

        assert_eq!(state.pointer_velocity(), (0.0, 0.0));
        assert_eq!(state.scroll_velocity(), (0.0, 0.0));
        assert_eq!(state.scroll_remainder(60), (0.0, 0.25));
        assert_eq!(state.speed(), 100);
    }

    #[test]
    fn test_accumulate_saturates() {
        let huge = Velocity::from_units(1e14, -1e14);
        let mut v = Velocity::ZERO;
        v.accumulate(huge, 1);
        v.accumulate(huge, 1);
        assert_eq!(v.raw(), (i64::MAX, i64::MIN));

        let mut state = MotionState::new(10);
        state.apply_move(huge, true);
        state.apply_move(huge, true);
        assert!(state.pointer_velocity().0 > 0.0);
        assert!(state.pointer_velocity().1 < 0.0);
    }

    #[test]
    fn test_shared_handle_sees_writes() {
        let shared = SharedMotion::new(10);
        let other = shared.clone();
        shared.lock().set_mouse_mode(true);
        assert!(other.lock().mouse_mode());
    }
}
