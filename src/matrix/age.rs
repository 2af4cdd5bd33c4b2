/// Opacity of cells older than the age threshold.
pub const DIM_OPACITY: f32 = 0.08;

const FRESH_FLOOR: f32 = 0.3;

/// Positions on the age threshold slider.
pub const THRESHOLD_STEPS: u8 = 20;

/// Opacity of a cell when colouring by age.
///
/// Cells at or after `threshold` fade linearly from 0.3 (oldest) to 1.0
/// (newest); older cells and cells without a run are dimmed.
#[allow(clippy::cast_precision_loss)]
pub fn cell_opacity(unix: i64, threshold: i64, min_unix: i64, max_unix: i64) -> f32 {
    if unix <= 0 || unix < threshold {
        return DIM_OPACITY;
    }
    if max_unix <= min_unix {
        return 1.0;
    }
    let t = (unix - min_unix) as f64 / (max_unix - min_unix) as f64;
    #[allow(clippy::cast_possible_truncation)]
    let t = t.clamp(0.0, 1.0) as f32;
    FRESH_FLOOR + (1.0 - FRESH_FLOOR) * t
}

/// Position of the user-movable age threshold.
///
/// Stored as a slider step rather than a timestamp so it stays meaningful when
/// the data range changes after a refresh. Step 0 keeps every cell bright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AgeThreshold {
    step: u8,
}

impl AgeThreshold {
    pub fn new(step: u8) -> Self {
        Self {
            step: step.min(THRESHOLD_STEPS),
        }
    }

    pub fn step(self) -> u8 {
        self.step
    }

    pub fn step_forward(self) -> Self {
        Self::new(self.step.saturating_add(1))
    }

    pub fn step_back(self) -> Self {
        Self::new(self.step.saturating_sub(1))
    }

    /// Threshold timestamp within `(min, max)`.
    pub fn value(self, range: Option<(i64, i64)>) -> i64 {
        let Some((min, max)) = range else {
            return 0;
        };
        let span = max.saturating_sub(min);
        min.saturating_add(span.saturating_mul(i64::from(self.step)) / i64::from(THRESHOLD_STEPS))
    }

    /// Fraction of the slider travelled, for drawing it.
    pub fn fraction(self) -> f32 {
        f32::from(self.step) / f32::from(THRESHOLD_STEPS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newest_cell_is_opaque_oldest_is_floor() {
        assert!((cell_opacity(200, 100, 100, 200) - 1.0).abs() < f32::EPSILON);
        assert!((cell_opacity(100, 100, 100, 200) - 0.3).abs() < 1e-6);
        assert!((cell_opacity(150, 0, 100, 200) - 0.65).abs() < 1e-6);
    }

    #[test]
    fn below_threshold_is_dim() {
        assert!((cell_opacity(120, 150, 100, 200) - DIM_OPACITY).abs() < f32::EPSILON);
    }

    #[test]
    fn empty_cell_is_dim() {
        assert!((cell_opacity(0, 0, 100, 200) - DIM_OPACITY).abs() < f32::EPSILON);
    }

    #[test]
    fn flat_range_is_opaque() {
        assert!((cell_opacity(100, 0, 100, 100) - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn slider_is_bounded() {
        let mut t = AgeThreshold::default();
        t = t.step_back();
        assert_eq!(t.step(), 0);
        for _ in 0..50 {
            t = t.step_forward();
        }
        assert_eq!(t.step(), THRESHOLD_STEPS);
        assert_eq!(t.value(Some((100, 300))), 300);
        assert_eq!(AgeThreshold::new(10).value(Some((100, 300))), 200);
        assert_eq!(AgeThreshold::new(0).value(Some((100, 300))), 100);
        assert_eq!(t.value(None), 0);
    }
}
