//! Adaptive ODE integration for culture simulations.
//!
//! Implements the embedded Dormand-Prince 5(4) Runge-Kutta pair with
//! local-extrapolation, FSAL reuse of the last stage, an RMS error norm and
//! a bounded step size. Every accepted step is recorded so callers can scan
//! the full trajectory.
//!
//! Reference: Hairer E, Nørsett SP, Wanner G. Solving Ordinary Differential
//! Equations I, 2nd ed., Springer 1993 (§II.4-II.5)

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, IntegrationError, ModelError};

/// Configuration for the adaptive integrator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegratorConfig {
    /// Relative error tolerance per component
    pub relative_tolerance: f64,
    /// Absolute error tolerance per component
    pub absolute_tolerance: f64,
    /// Upper bound on the step size (h). Keeps the death-rate transition and
    /// substrate depletion resolved.
    pub max_step_h: f64,
    /// Steps smaller than this are a failure (h)
    pub min_step_h: f64,
    /// Maximum number of attempted steps per integration
    pub max_steps: usize,
}

impl Default for IntegratorConfig {
    fn default() -> Self {
        Self {
            relative_tolerance: 1e-9,
            absolute_tolerance: 1e-6,
            max_step_h: 0.5,
            min_step_h: 1e-12,
            max_steps: 1_000_000,
        }
    }
}

impl IntegratorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.relative_tolerance > 0.0 && self.relative_tolerance.is_finite()) {
            return Err(ConfigError::InvalidSolver(format!(
                "relative tolerance must be positive, got {}",
                self.relative_tolerance
            )));
        }
        if !(self.absolute_tolerance > 0.0 && self.absolute_tolerance.is_finite()) {
            return Err(ConfigError::InvalidSolver(format!(
                "absolute tolerance must be positive, got {}",
                self.absolute_tolerance
            )));
        }
        if !(self.min_step_h > 0.0 && self.max_step_h > self.min_step_h) {
            return Err(ConfigError::InvalidSolver(format!(
                "step bounds must satisfy 0 < min < max, got [{}, {}]",
                self.min_step_h, self.max_step_h
            )));
        }
        if self.max_steps == 0 {
            return Err(ConfigError::InvalidSolver("max_steps must be at least 1".into()));
        }
        Ok(())
    }
}

/// Step statistics of one integration
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct IntegrationStats {
    pub accepted_steps: usize,
    pub rejected_steps: usize,
    pub rhs_evaluations: usize,
}

/// Solution samples at every accepted step, including the initial state
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    /// Sample times (h), strictly increasing, ending exactly at the span end
    pub times_h: Vec<f64>,
    /// State at each sample time
    pub states: Vec<Vec<f64>>,
    pub stats: IntegrationStats,
}

impl Trajectory {
    /// Last sample (time, state)
    pub fn last(&self) -> Option<(f64, &[f64])> {
        let t = *self.times_h.last()?;
        let y = self.states.last()?;
        Some((t, y.as_slice()))
    }
}

// Dormand-Prince 5(4) tableau
const C: [f64; 7] = [0.0, 1.0 / 5.0, 3.0 / 10.0, 4.0 / 5.0, 8.0 / 9.0, 1.0, 1.0];
const A: [[f64; 6]; 7] = [
    [0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [1.0 / 5.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [3.0 / 40.0, 9.0 / 40.0, 0.0, 0.0, 0.0, 0.0],
    [44.0 / 45.0, -56.0 / 15.0, 32.0 / 9.0, 0.0, 0.0, 0.0],
    [19372.0 / 6561.0, -25360.0 / 2187.0, 64448.0 / 6561.0, -212.0 / 729.0, 0.0, 0.0],
    [9017.0 / 3168.0, -355.0 / 33.0, 46732.0 / 5247.0, 49.0 / 176.0, -5103.0 / 18656.0, 0.0],
    // Last row equals the 5th-order weights (FSAL).
    [35.0 / 384.0, 0.0, 500.0 / 1113.0, 125.0 / 192.0, -2187.0 / 6784.0, 11.0 / 84.0],
];
/// Difference between 5th- and 4th-order weights
const E: [f64; 7] = [
    71.0 / 57600.0,
    0.0,
    -71.0 / 16695.0,
    71.0 / 1920.0,
    -17253.0 / 339200.0,
    22.0 / 525.0,
    -1.0 / 40.0,
];

const SAFETY: f64 = 0.9;
const MIN_FACTOR: f64 = 0.2;
const MAX_FACTOR: f64 = 10.0;
/// Exponent 1/(q+1) with q = 4, the order of the embedded error estimate
const ERROR_EXPONENT: f64 = -1.0 / 5.0;

/// Embedded Dormand-Prince 5(4) integrator
///
/// Solves dy/dt = f(t, y) where `f` may fail; a failing evaluation aborts the
/// integration.
#[derive(Debug, Clone, Default)]
pub struct DormandPrince {
    pub config: IntegratorConfig,
}

impl DormandPrince {
    pub fn new(config: IntegratorConfig) -> Self {
        Self { config }
    }

    /// Integrate from `t_span.0` to `t_span.1` starting at `y0`
    ///
    /// # Arguments
    /// * `rhs` - Computes dy/dt into its third argument given (t, y)
    /// * `t_span` - (start, end) in hours; end must be after start
    /// * `y0` - Initial state
    pub fn integrate<F>(
        &self,
        mut rhs: F,
        t_span: (f64, f64),
        y0: &[f64],
    ) -> Result<Trajectory, IntegrationError>
    where
        F: FnMut(f64, &[f64], &mut [f64]) -> Result<(), ModelError>,
    {
        let (t0, t1) = t_span;
        if !(t0.is_finite() && t1.is_finite() && t1 > t0) {
            return Err(IntegrationError::InvalidSpan { t0_h: t0, t1_h: t1 });
        }
        if y0.iter().any(|v| !v.is_finite()) {
            return Err(IntegrationError::NonFinite { t_h: t0 });
        }

        let cfg = &self.config;
        let n = y0.len();
        let mut stats = IntegrationStats::default();
        let mut eval = |t: f64, y: &[f64], out: &mut [f64], stats: &mut IntegrationStats| {
            stats.rhs_evaluations += 1;
            rhs(t, y, out).map_err(|source| IntegrationError::Model { t_h: t, source })
        };

        let mut k: Vec<Vec<f64>> = vec![vec![0.0; n]; 7];
        let mut y = y0.to_vec();
        let mut y_stage = vec![0.0; n];
        let mut t = t0;

        eval(t, &y, &mut k[0], &mut stats)?;
        let mut h = {
            let (first, rest) = k.split_at_mut(1);
            self.initial_step(&mut eval, t, &y, &first[0], &mut rest[0], &mut y_stage, &mut stats)?
        }
        .min(t1 - t0);

        let mut times_h = vec![t0];
        let mut states = vec![y.clone()];
        let mut rejected_last = false;

        while t < t1 {
            if stats.accepted_steps + stats.rejected_steps >= cfg.max_steps {
                return Err(IntegrationError::StepLimitExceeded {
                    t_h: t,
                    max_steps: cfg.max_steps,
                });
            }
            if h < cfg.min_step_h {
                return Err(IntegrationError::StepSizeUnderflow { t_h: t, step_h: h });
            }

            let last_step = t + h >= t1;
            if last_step {
                h = t1 - t;
            }

            for s in 1..7 {
                let (done, rest) = k.split_at_mut(s);
                for i in 0..n {
                    let mut acc = 0.0;
                    for (j, kj) in done.iter().enumerate() {
                        acc += A[s][j] * kj[i];
                    }
                    y_stage[i] = y[i] + h * acc;
                }
                eval(t + C[s] * h, &y_stage, &mut rest[0], &mut stats)?;
            }
            // y_stage now holds the 5th-order solution at t + h.

            let error_norm = self.error_norm(&k, &y, &y_stage, h);

            if error_norm.is_finite() && error_norm <= 1.0 {
                if y_stage.iter().any(|v| !v.is_finite()) {
                    return Err(IntegrationError::NonFinite { t_h: t + h });
                }
                t = if last_step { t1 } else { t + h };
                std::mem::swap(&mut y, &mut y_stage);
                k.swap(0, 6);
                times_h.push(t);
                states.push(y.clone());
                stats.accepted_steps += 1;

                let mut factor = if error_norm == 0.0 {
                    MAX_FACTOR
                } else {
                    (SAFETY * error_norm.powf(ERROR_EXPONENT)).min(MAX_FACTOR)
                };
                if rejected_last {
                    factor = factor.min(1.0);
                }
                rejected_last = false;
                h = (h * factor).min(cfg.max_step_h);
            } else {
                let factor = if error_norm.is_finite() {
                    (SAFETY * error_norm.powf(ERROR_EXPONENT)).max(MIN_FACTOR)
                } else {
                    MIN_FACTOR
                };
                rejected_last = true;
                stats.rejected_steps += 1;
                h *= factor;
            }
        }

        log::debug!(
            "integrated [{}, {}] h: {} accepted, {} rejected, {} evaluations",
            t0,
            t1,
            stats.accepted_steps,
            stats.rejected_steps,
            stats.rhs_evaluations
        );

        Ok(Trajectory { times_h, states, stats })
    }

    /// Weighted RMS norm of the embedded error estimate
    fn error_norm(&self, k: &[Vec<f64>], y: &[f64], y_new: &[f64], h: f64) -> f64 {
        let n = y.len();
        if n == 0 {
            return 0.0;
        }
        let cfg = &self.config;
        let mut sum = 0.0;
        for i in 0..n {
            let mut err = 0.0;
            for (j, kj) in k.iter().enumerate() {
                err += E[j] * kj[i];
            }
            let scale = cfg.absolute_tolerance + cfg.relative_tolerance * y[i].abs().max(y_new[i].abs());
            let r = h * err / scale;
            sum += r * r;
        }
        (sum / n as f64).sqrt()
    }

    /// Starting step from the local derivative scale (Hairer et al. §II.4)
    #[allow(clippy::too_many_arguments)]
    fn initial_step<G>(
        &self,
        eval: &mut G,
        t0: f64,
        y0: &[f64],
        f0: &[f64],
        f1: &mut [f64],
        y1: &mut [f64],
        stats: &mut IntegrationStats,
    ) -> Result<f64, IntegrationError>
    where
        G: FnMut(f64, &[f64], &mut [f64], &mut IntegrationStats) -> Result<(), IntegrationError>,
    {
        let cfg = &self.config;
        let n = y0.len();
        if n == 0 {
            return Ok(cfg.max_step_h);
        }
        let rms = |v: &mut dyn Iterator<Item = f64>| -> f64 {
            (v.map(|x| x * x).sum::<f64>() / n as f64).sqrt()
        };
        let scale: Vec<f64> = y0
            .iter()
            .map(|v| cfg.absolute_tolerance + cfg.relative_tolerance * v.abs())
            .collect();

        let d0 = rms(&mut y0.iter().zip(&scale).map(|(y, s)| y / s));
        let d1 = rms(&mut f0.iter().zip(&scale).map(|(f, s)| f / s));
        let h0 = if d0 < 1e-5 || d1 < 1e-5 { 1e-6 } else { 0.01 * d0 / d1 };
        let h0 = h0.min(cfg.max_step_h);

        for i in 0..n {
            y1[i] = y0[i] + h0 * f0[i];
        }
        eval(t0 + h0, y1, f1, stats)?;
        let d2 = rms(&mut f1.iter().zip(f0).zip(&scale).map(|((a, b), s)| (a - b) / s)) / h0;

        let h1 = if d1.max(d2) <= 1e-15 {
            (h0 * 1e-3).max(1e-6)
        } else {
            (0.01 / d1.max(d2)).powf(-ERROR_EXPONENT)
        };
        Ok((100.0 * h0).min(h1).min(cfg.max_step_h))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tight() -> IntegratorConfig {
        IntegratorConfig {
            absolute_tolerance: 1e-12,
            ..Default::default()
        }
    }

    #[test]
    fn test_exponential_decay() {
        // Test: dy/dt = -y with y(0) = 1
        // Analytical solution: y(t) = exp(-t)
        let solver = DormandPrince::new(tight());
        let traj = solver
            .integrate(
                |_, y, dydt| {
                    dydt[0] = -y[0];
                    Ok(())
                },
                (0.0, 1.0),
                &[1.0],
            )
            .unwrap();

        let (t, y) = traj.last().unwrap();
        assert_eq!(t, 1.0);
        let expected = (-1.0_f64).exp();
        assert!((y[0] - expected).abs() < 1e-8, "error too large: {} vs {}", y[0], expected);
    }

    #[test]
    fn test_harmonic_oscillator() {
        // dy1/dt = y2, dy2/dt = -y1; y1 = cos(t)
        let solver = DormandPrince::new(tight());
        let traj = solver
            .integrate(
                |_, y, dydt| {
                    dydt[0] = y[1];
                    dydt[1] = -y[0];
                    Ok(())
                },
                (0.0, std::f64::consts::PI),
                &[1.0, 0.0],
            )
            .unwrap();

        let (_, y) = traj.last().unwrap();
        assert!((y[0] + 1.0).abs() < 1e-7, "cos(pi) = {}", y[0]);
        assert!(y[1].abs() < 1e-7, "-sin(pi) = {}", y[1]);
    }

    #[test]
    fn test_step_never_exceeds_max() {
        let solver = DormandPrince::new(IntegratorConfig {
            max_step_h: 0.5,
            ..Default::default()
        });
        let traj = solver
            .integrate(
                |_, _, dydt| {
                    dydt[0] = 0.0;
                    Ok(())
                },
                (0.0, 10.0),
                &[1.0],
            )
            .unwrap();

        assert!(traj.times_h.len() >= 21);
        for w in traj.times_h.windows(2) {
            assert!(w[1] > w[0]);
            assert!(w[1] - w[0] <= 0.5 + 1e-12);
        }
        assert_eq!(*traj.times_h.last().unwrap(), 10.0);
    }

    #[test]
    fn test_model_error_aborts() {
        let solver = DormandPrince::default();
        let result = solver.integrate(
            |t, _, dydt| {
                if t > 0.3 {
                    return Err(ModelError::AmmoniaDomain { value_mM: 0.0 });
                }
                dydt[0] = 1.0;
                Ok(())
            },
            (0.0, 1.0),
            &[0.0],
        );
        assert!(matches!(result, Err(IntegrationError::Model { .. })));
    }

    #[test]
    fn test_step_limit_reported() {
        let solver = DormandPrince::new(IntegratorConfig {
            max_steps: 3,
            ..Default::default()
        });
        let result = solver.integrate(
            |_, y, dydt| {
                dydt[0] = -y[0];
                Ok(())
            },
            (0.0, 100.0),
            &[1.0],
        );
        assert!(matches!(
            result,
            Err(IntegrationError::StepLimitExceeded { max_steps: 3, .. })
        ));
    }

    #[test]
    fn test_invalid_span_rejected() {
        let solver = DormandPrince::default();
        let result = solver.integrate(|_, _, _| Ok(()), (1.0, 1.0), &[0.0]);
        assert!(matches!(result, Err(IntegrationError::InvalidSpan { .. })));
    }

    #[test]
    fn test_blowup_reported() {
        // dy/dt = y^2 from y(0) = 1 diverges at t = 1.
        let solver = DormandPrince::default();
        let result = solver.integrate(
            |_, y, dydt| {
                dydt[0] = y[0] * y[0];
                Ok(())
            },
            (0.0, 2.0),
            &[1.0],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = IntegratorConfig {
            relative_tolerance: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        assert!(IntegratorConfig::default().validate().is_ok());
    }
}
