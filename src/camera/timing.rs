//! Timing curves mapping elapsed fraction to animation progress

use serde::{Deserialize, Serialize};

/// Easing applied to an animator's fraction complete
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TimingCurve {
    Linear,
    EaseIn,
    EaseOut,
    #[default]
    EaseInOut,
    /// Cubic bezier through (0,0), `p1`, `p2`, (1,1)
    Custom { p1: (f64, f64), p2: (f64, f64) },
}

impl TimingCurve {
    /// Applies the curve to a fraction in [0, 1]
    pub fn apply(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            TimingCurve::Linear => t,
            TimingCurve::EaseIn => UnitBezier::new(0.42, 0.0, 1.0, 1.0).solve(t),
            TimingCurve::EaseOut => UnitBezier::new(0.0, 0.0, 0.58, 1.0).solve(t),
            TimingCurve::EaseInOut => UnitBezier::new(0.42, 0.0, 0.58, 1.0).solve(t),
            TimingCurve::Custom { p1, p2 } => UnitBezier::new(p1.0, p1.1, p2.0, p2.1).solve(t),
        }
    }
}

/// Cubic bezier with fixed end points, solved for y given x
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitBezier {
    cx: f64,
    bx: f64,
    ax: f64,
    cy: f64,
    by: f64,
    ay: f64,
}

impl UnitBezier {
    const EPSILON: f64 = 1e-7;

    pub fn new(p1x: f64, p1y: f64, p2x: f64, p2y: f64) -> Self {
        let p1x = p1x.clamp(0.0, 1.0);
        let p2x = p2x.clamp(0.0, 1.0);
        let cx = 3.0 * p1x;
        let bx = 3.0 * (p2x - p1x) - cx;
        let ax = 1.0 - cx - bx;
        let cy = 3.0 * p1y;
        let by = 3.0 * (p2y - p1y) - cy;
        let ay = 1.0 - cy - by;
        Self {
            cx,
            bx,
            ax,
            cy,
            by,
            ay,
        }
    }

    fn sample_x(&self, t: f64) -> f64 {
        ((self.ax * t + self.bx) * t + self.cx) * t
    }

    fn sample_y(&self, t: f64) -> f64 {
        ((self.ay * t + self.by) * t + self.cy) * t
    }

    fn sample_derivative_x(&self, t: f64) -> f64 {
        (3.0 * self.ax * t + 2.0 * self.bx) * t + self.cx
    }

    /// Curve parameter whose x equals `x`: Newton first, bisection as fallback
    fn solve_x(&self, x: f64) -> f64 {
        let mut t = x;
        for _ in 0..8 {
            let error = self.sample_x(t) - x;
            if error.abs() < Self::EPSILON {
                return t;
            }
            let derivative = self.sample_derivative_x(t);
            if derivative.abs() < 1e-6 {
                break;
            }
            t -= error / derivative;
        }

        let (mut low, mut high) = (0.0, 1.0);
        t = x;
        while low < high {
            let value = self.sample_x(t);
            if (value - x).abs() < Self::EPSILON {
                return t;
            }
            if x > value {
                low = t;
            } else {
                high = t;
            }
            t = (high - low) / 2.0 + low;
            if high - low < Self::EPSILON {
                break;
            }
        }
        t
    }

    pub fn solve(&self, x: f64) -> f64 {
        if x <= 0.0 {
            return 0.0;
        }
        if x >= 1.0 {
            return 1.0;
        }
        self.sample_y(self.solve_x(x))
    }
}
