// Keymouse Subpixel Accumulator
// Carries fractional pointer motion between integer relative moves

/// Keeps the fractional part of relative motion so slow movement still
/// reaches whole pixels instead of being truncated away every tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SubpixelAccumulator {
    x: f64,
    y: f64,
}

impl SubpixelAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a fractional delta and take out the whole pixels, truncating
    /// toward zero. The leftover stays in (-1, 1) on each axis.
    pub fn push(&mut self, dx: f64, dy: f64) -> (i32, i32) {
        self.x += dx;
        self.y += dy;
        let whole_x = self.x.trunc();
        let whole_y = self.y.trunc();
        self.x -= whole_x;
        self.y -= whole_y;
        (whole_x as i32, whole_y as i32)
    }

    #[cfg(test)]
    fn remainder(&self) -> (f64, f64) {
        (self.x, self.y)
    }
}
