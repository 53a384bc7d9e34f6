// SPDX: CC0-1.0

/// How much of a curve is currently drawn, as a fraction in `[0, 1]`.
///
/// Grows with elapsed time only; never shrinks.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Reveal {
    progress: f32,
}

impl Reveal {
    /// Animated reveals start hidden, static ones fully drawn.
    pub const fn new(animate: bool) -> Self {
        Self {
            progress: if animate { 0.0 } else { 1.0 },
        }
    }

    pub const fn progress(&self) -> f32 {
        self.progress
    }

    pub fn is_complete(&self) -> bool {
        self.progress >= 1.0
    }

    /// Advances by `delta` seconds of an animation lasting `duration` seconds.
    pub fn update(&mut self, delta: f32, duration: f32) {
        if self.is_complete() || delta.is_nan() || delta <= 0.0 {
            return;
        }
        self.progress = if duration > 0.0 {
            (self.progress + delta / duration).min(1.0)
        } else {
            1.0
        };
    }

    /// Number of leading samples out of `len` that are visible.
    pub fn visible_len(&self, len: usize) -> usize {
        if self.is_complete() {
            len
        } else {
            // truncation intended
            ((len as f32 * self.progress) as usize).min(len)
        }
    }
}

impl Default for Reveal {
    fn default() -> Self {
        Self::new(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_reveal_is_complete() {
        let mut reveal = Reveal::new(false);
        assert_eq!(reveal.progress(), 1.0);
        reveal.update(0.5, 1.0);
        assert_eq!(reveal.progress(), 1.0);
        assert_eq!(reveal.visible_len(7), 7);
    }

    #[test]
    fn animated_reveal_grows_with_time() {
        let mut reveal = Reveal::new(true);
        assert_eq!(reveal.progress(), 0.0);
        assert_eq!(reveal.visible_len(10), 0);

        reveal.update(0.25, 1.0);
        assert_eq!(reveal.progress(), 0.25);
        reveal.update(0.25, 1.0);
        assert_eq!(reveal.progress(), 0.5);
        assert_eq!(reveal.visible_len(10), 5);

        reveal.update(2.0, 1.0);
        assert_eq!(reveal.progress(), 1.0);
        assert!(reveal.is_complete());
    }

    #[test]
    fn duration_scales_progress() {
        let mut reveal = Reveal::new(true);
        reveal.update(0.5, 2.0);
        assert_eq!(reveal.progress(), 0.25);

        let mut instant = Reveal::new(true);
        instant.update(0.001, 0.0);
        assert_eq!(instant.progress(), 1.0);
    }

    #[test]
    fn never_decreases() {
        let mut reveal = Reveal::new(true);
        reveal.update(0.5, 1.0);
        reveal.update(-1.0, 1.0);
        reveal.update(f32::NAN, 1.0);
        assert_eq!(reveal.progress(), 0.5);
    }
}
