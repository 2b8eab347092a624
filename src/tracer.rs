//! Convergence detection on a scalar time series.

use std::collections::VecDeque;

/// State of a traced quantity.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Convergence {
    Running,
    Converged,
    Diverged,
}

/// Tracks the last values of a quantity over a window of `l / u` samples
/// and reports convergence once their standard deviation, relative to the
/// mean, falls below `epsilon`.
///
/// `u` and `l` are a characteristic velocity and length, so the window
/// covers about one advection time across the system.
#[derive(Debug, Clone)]
pub struct ValueTracer {
    period: usize,
    epsilon: f64,
    values: VecDeque<f64>,
    steps: usize,
}

impl ValueTracer {
    pub fn new(u: f64, l: f64, epsilon: f64) -> Self {
        assert!(u > 0.0 && l > 0.0, "characteristic scales must be positive");
        let period = ((l / u).round() as usize).max(1);
        ValueTracer {
            period,
            epsilon,
            values: VecDeque::with_capacity(period),
            steps: 0,
        }
    }

    /// Number of samples in the window.
    pub fn period(&self) -> usize {
        self.period
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn take_value(&mut self, value: f64) {
        if self.values.len() == self.period {
            self.values.pop_front();
        }
        self.values.push_back(value);
        self.steps += 1;
    }

    pub fn reset(&mut self) {
        self.values.clear();
        self.steps = 0;
    }

    fn mean(&self) -> f64 {
        self.values.iter().sum::<f64>() / self.values.len() as f64
    }

    fn std_dev(&self, mean: f64) -> f64 {
        let n = self.values.len() as f64;
        let var = self.values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
        var.sqrt()
    }

    pub fn convergence(&self) -> Convergence {
        if self.values.iter().any(|v| !v.is_finite()) {
            tracing::warn!("traced value is not finite after {} steps", self.steps);
            return Convergence::Diverged;
        }
        if self.values.len() < self.period {
            return Convergence::Running;
        }
        let mean = self.mean();
        let deviation = self.std_dev(mean);
        if mean == 0.0 {
            return if deviation == 0.0 {
                Convergence::Converged
            } else {
                Convergence::Running
            };
        }
        if deviation / mean.abs() < self.epsilon {
            Convergence::Converged
        } else {
            Convergence::Running
        }
    }

    pub fn has_converged(&self) -> bool {
        self.convergence() == Convergence::Converged
    }
}

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn window_test() {
        let t = ValueTracer::new(0.1, 10.0, 1e-3);
        assert_eq!(t.period(), 100);
        let t = ValueTracer::new(1.0, 0.2, 1e-3);
        assert_eq!(t.period(), 1);
    }

    #[test]
    fn converges_on_constant_test() {
        let mut t = ValueTracer::new(1.0, 5.0, 1e-6);
        for _ in 0..4 {
            t.take_value(2.0);
        }
        assert_eq!(t.convergence(), Convergence::Running);
        t.take_value(2.0);
        assert!(t.has_converged());
    }

    #[test]
    fn oscillation_test() {
        let mut t = ValueTracer::new(1.0, 4.0, 1e-3);
        for i in 0..20 {
            t.take_value(if i % 2 == 0 { 1.0 } else { 2.0 });
        }
        assert_eq!(t.convergence(), Convergence::Running);
        for _ in 0..4 {
            t.take_value(1.5);
        }
        assert!(t.has_converged());
    }

    #[test]
    fn nan_diverges_test() {
        let mut t = ValueTracer::new(1.0, 3.0, 1e-3);
        t.take_value(1.0);
        t.take_value(f64::NAN);
        assert_eq!(t.convergence(), Convergence::Diverged);
    }

    #[test]
    fn window_slides_test() {
        let mut t = ValueTracer::new(1.0, 3.0, 1e-9);
        t.take_value(f64::INFINITY);
        assert_eq!(t.convergence(), Convergence::Diverged);
        for _ in 0..3 {
            t.take_value(4.0);
        }
        // The diverged sample has left the window.
        assert!(t.has_converged());
        assert_eq!(t.steps(), 4);
    }
}
