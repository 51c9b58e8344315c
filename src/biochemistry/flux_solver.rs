//! Flux solver for metabolically coupled amino acids.
//!
//! Two groups of amino acids exchange carbon/nitrogen with each other, so
//! their specific rates cannot be written explicitly. Each group is a small
//! dense linear system `A·q = b`:
//!
//! Transamination group, q = [Q_asp, Q_arg, Q_pro, Q_glu]:
//! ```text
//! | -1          -Y_asp_arg   0           0         |       | μ/Y_x_asp − Y_asp_x          |
//! | -Y_arg_asp  -1           Y_arg_pro   Y_arg_glu |  q =  | μ/Y_x_arg                    |
//! |  0          -Y_pro_arg  -1           Y_pro_glu |       | μ/Y_x_pro                    |
//! |  0           0           Y_glu_pro  -1         |       | μ/Y_x_glu + Y_glu_his·Q_his  |
//! ```
//!
//! Serine group, q = [Q_ser, Q_cys, Q_gly]:
//! ```text
//! | -1           0   Y_ser_gly |       | μ/Y_x_ser |
//! | -Y_cys_ser  -1   0         |  q =  | μ/Y_x_cys |
//! | -μ/Y_gly_ser 0  -1         |       | 0         |
//! ```
//!
//! Both are solved by LU decomposition. A singular or near-singular matrix is
//! a configuration problem and is reported, never regularized.

use nalgebra::{Matrix3, Matrix4, Vector3, Vector4};

use crate::config::{GrowthParameters, YieldCoefficients};
use crate::error::{FluxGroup, ModelError};

/// Specific rates of the transamination group (mmol/cell/h)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransaminationFluxes {
    pub aspartate: f64,
    pub arginine: f64,
    pub proline: f64,
    pub glutamate: f64,
}

/// Specific rates of the serine group (mmol/cell/h)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SerineFluxes {
    pub serine: f64,
    pub cysteine: f64,
    pub glycine: f64,
}

/// Builds and solves the coupled amino-acid flux systems
#[derive(Debug, Clone)]
pub struct FluxSolver {
    yields: YieldCoefficients,
}

impl FluxSolver {
    pub fn new(yields: &YieldCoefficients) -> Self {
        Self { yields: yields.clone() }
    }

    /// Coefficient matrix of the transamination group (independent of μ)
    pub fn transamination_matrix(&self) -> Matrix4<f64> {
        let y = &self.yields;
        Matrix4::new(
            -1.0, -y.Y_asp_arg, 0.0, 0.0,
            -y.Y_arg_asp, -1.0, y.Y_arg_pro, y.Y_arg_glu,
            0.0, -y.Y_pro_arg, -1.0, y.Y_pro_glu,
            0.0, 0.0, y.Y_glu_pro, -1.0,
        )
    }

    /// Right-hand side of the transamination group
    pub fn transamination_rhs(&self, mu_per_h: f64, q_his: f64) -> Vector4<f64> {
        let y = &self.yields;
        Vector4::new(
            mu_per_h / y.Y_x_asp - y.Y_asp_x,
            mu_per_h / y.Y_x_arg,
            mu_per_h / y.Y_x_pro,
            mu_per_h / y.Y_x_glu + y.Y_glu_his * q_his,
        )
    }

    /// Coefficient matrix of the serine group; glycine couples through μ
    pub fn serine_matrix(&self, mu_per_h: f64) -> Matrix3<f64> {
        let y = &self.yields;
        Matrix3::new(
            -1.0, 0.0, y.Y_ser_gly,
            -y.Y_cys_ser, -1.0, 0.0,
            -mu_per_h / y.Y_gly_ser, 0.0, -1.0,
        )
    }

    /// Right-hand side of the serine group
    pub fn serine_rhs(&self, mu_per_h: f64) -> Vector3<f64> {
        let y = &self.yields;
        Vector3::new(mu_per_h / y.Y_x_ser, mu_per_h / y.Y_x_cys, 0.0)
    }

    /// Solve for ASP/ARG/PRO/GLU rates given μ and the histidine rate
    pub fn transamination(&self, mu_per_h: f64, q_his: f64) -> Result<TransaminationFluxes, ModelError> {
        let q = solve_4x4(
            &self.transamination_matrix(),
            &self.transamination_rhs(mu_per_h, q_his),
        )
        .ok_or(ModelError::SingularFluxMatrix {
            group: FluxGroup::Transamination,
            mu: mu_per_h,
        })?;
        Ok(TransaminationFluxes {
            aspartate: q[0],
            arginine: q[1],
            proline: q[2],
            glutamate: q[3],
        })
    }

    /// Solve for SER/CYS/GLY rates given μ
    pub fn serine(&self, mu_per_h: f64) -> Result<SerineFluxes, ModelError> {
        let q = solve_3x3(&self.serine_matrix(mu_per_h), &self.serine_rhs(mu_per_h)).ok_or(
            ModelError::SingularFluxMatrix {
                group: FluxGroup::Serine,
                mu: mu_per_h,
            },
        )?;
        Ok(SerineFluxes {
            serine: q[0],
            cysteine: q[1],
            glycine: q[2],
        })
    }

    /// Check both systems are solvable across the whole growth-rate range
    pub fn validate(&self, growth: &GrowthParameters) -> Result<(), ModelError> {
        for mu in [growth.mu_min_per_h, growth.mu_max_per_h] {
            self.transamination(mu, -mu / self.yields.Y_x_his)?;
            self.serine(mu)?;
        }
        Ok(())
    }
}

/// Relative determinant below which a system is treated as singular
const SINGULARITY_TOLERANCE: f64 = f64::EPSILON;

/// Solve a 4×4 system by LU, `None` if singular or near-singular
pub fn solve_4x4(matrix: &Matrix4<f64>, rhs: &Vector4<f64>) -> Option<Vector4<f64>> {
    // Scale the determinant test by the row magnitudes.
    let scale: f64 = matrix.row_iter().map(|r| r.amax()).product();
    let lu = matrix.lu();
    if !(lu.determinant().abs() > SINGULARITY_TOLERANCE * scale) {
        return None;
    }
    lu.solve(rhs).filter(|q| q.iter().all(|v| v.is_finite()))
}

/// Solve a 3×3 system by LU, `None` if singular or near-singular
pub fn solve_3x3(matrix: &Matrix3<f64>, rhs: &Vector3<f64>) -> Option<Vector3<f64>> {
    let scale: f64 = matrix.row_iter().map(|r| r.amax()).product();
    let lu = matrix.lu();
    if !(lu.determinant().abs() > SINGULARITY_TOLERANCE * scale) {
        return None;
    }
    lu.solve(rhs).filter(|q| q.iter().all(|v| v.is_finite()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn solver() -> FluxSolver {
        FluxSolver::new(&YieldCoefficients::default())
    }

    #[test]
    fn test_transamination_satisfies_system() {
        let flux = solver();
        let mu = 0.05;
        let q_his = -mu / 2.4e10;
        let q = flux.transamination(mu, q_his).unwrap();
        let x = Vector4::new(q.aspartate, q.arginine, q.proline, q.glutamate);
        let back = flux.transamination_matrix() * x;
        let rhs = flux.transamination_rhs(mu, q_his);
        for i in 0..4 {
            assert_relative_eq!(back[i], rhs[i], max_relative = 1e-9);
        }
    }

    #[test]
    fn test_serine_satisfies_system() {
        let flux = solver();
        let mu = 0.05;
        let q = flux.serine(mu).unwrap();
        let x = Vector3::new(q.serine, q.cysteine, q.glycine);
        let residual = flux.serine_matrix(mu) * x - flux.serine_rhs(mu);
        assert!(residual.amax() < 1e-9 * flux.serine_rhs(mu).amax());
    }

    #[test]
    fn test_growth_consumes_serine_group() {
        let q = solver().serine(0.065).unwrap();
        assert!(q.serine < 0.0, "serine is consumed: {}", q.serine);
        assert!(q.glycine > 0.0, "glycine is released from serine: {}", q.glycine);
    }

    #[test]
    fn test_singular_matrix_detected() {
        let singular = Matrix3::new(1.0, 2.0, 3.0, 2.0, 4.0, 6.0, 0.0, 1.0, 1.0);
        assert!(solve_3x3(&singular, &Vector3::new(1.0, 2.0, 3.0)).is_none());
    }

    #[test]
    fn test_degenerate_yields_reported() {
        // Y_pro_glu = 1/Y_glu_pro makes the PRO and GLU rows dependent.
        let yields = YieldCoefficients {
            Y_pro_arg: 0.0,
            Y_arg_pro: 0.0,
            Y_arg_glu: 0.0,
            Y_glu_pro: 1.0,
            Y_pro_glu: 1.0,
            ..Default::default()
        };
        let err = FluxSolver::new(&yields).transamination(0.05, 0.0).unwrap_err();
        assert_eq!(
            err,
            ModelError::SingularFluxMatrix {
                group: FluxGroup::Transamination,
                mu: 0.05
            }
        );
    }

    #[test]
    fn test_default_yields_validate() {
        assert!(solver().validate(&GrowthParameters::default()).is_ok());
    }
}
