/// Fraction of the remaining distance covered each frame.
pub const INERTIA: f32 = 0.05;

/// A normalized 2D displacement, nominally within `[-1, 1]` per axis.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Displacement {
    pub x: f32,
    pub y: f32,
}

impl Displacement {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn negated(self) -> Self {
        Self {
            x: -self.x,
            y: -self.y,
        }
    }

    pub fn as_array(self) -> [f32; 2] {
        [self.x, self.y]
    }
}

/// Smoothed displacement fed to the `mouse` uniform.
///
/// Input handlers write [`MotionState::target_mut`]; only the render loop
/// calls [`MotionState::step`], which is the sole writer of `current`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MotionState {
    current: Displacement,
    target: Displacement,
}

impl MotionState {
    pub fn current(&self) -> Displacement {
        self.current
    }

    pub fn target(&self) -> Displacement {
        self.target
    }

    pub fn target_mut(&mut self) -> &mut Displacement {
        &mut self.target
    }

    /// Advances `current` one frame toward `target`.
    pub fn step(&mut self) -> Displacement {
        self.current = Displacement {
            x: ease(self.current.x, self.target.x),
            y: ease(self.current.y, self.target.y),
        };
        self.current
    }
}

fn ease(current: f32, target: f32) -> f32 {
    let next = current + (target - current) * INERTIA;
    if next.is_finite() {
        next
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converges_without_overshoot() {
        for target in [1.0_f32, -1.0, 0.37, -0.82] {
            let mut motion = MotionState::default();
            *motion.target_mut() = Displacement::new(target, -target);
            let mut last_gap = (target.abs(), target.abs());
            for _ in 0..600 {
                let current = motion.step();
                let gap = ((target - current.x).abs(), (-target - current.y).abs());
                assert!(gap.0 <= last_gap.0);
                assert!(gap.1 <= last_gap.1);
                assert!(current.x.abs() <= target.abs());
                assert!(current.y.abs() <= target.abs());
                assert_eq!(current.x.signum(), target.signum());
                last_gap = gap;
            }
            assert!(last_gap.0 < 1e-4, "did not converge: {last_gap:?}");
        }
    }

    #[test]
    fn first_step_covers_five_percent() {
        let mut motion = MotionState::default();
        *motion.target_mut() = Displacement::new(1.0, 0.5);
        let current = motion.step();
        assert!((current.x - 0.05).abs() < 1e-6);
        assert!((current.y - 0.025).abs() < 1e-6);
    }

    #[test]
    fn non_finite_results_reset_to_zero() {
        let mut motion = MotionState::default();
        *motion.target_mut() = Displacement::new(f32::NAN, f32::INFINITY);
        let current = motion.step();
        assert_eq!(current, Displacement::ZERO);
    }

    #[test]
    fn target_writes_leave_current_alone() {
        let mut motion = MotionState::default();
        *motion.target_mut() = Displacement::new(0.4, -0.4);
        assert_eq!(motion.current(), Displacement::ZERO);
        assert_eq!(motion.target(), Displacement::new(0.4, -0.4));
    }
}
