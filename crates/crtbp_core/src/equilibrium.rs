use crate::model::Crtbp;
use anyhow::{Context, Result};
use nalgebra::Vector2;
use num_complex::Complex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Conventional labels for the five Lagrange points, in seed order.
pub const LAGRANGE_LABELS: [&str; 5] = ["L1", "L2", "L3", "L4", "L5"];

/// Real-part threshold below which an eigenvalue counts as neutral.
const STABILITY_TOLERANCE: f64 = 1e-6;

/// Settings controlling the Newton-Raphson equilibrium search.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NewtonSettings {
    pub max_steps: usize,
    pub tolerance: f64,
}

impl Default for NewtonSettings {
    fn default() -> Self {
        Self {
            max_steps: 10,
            tolerance: 1e-8,
        }
    }
}

#[derive(Debug, Error)]
pub enum EquilibriumError {
    #[error(
        "Newton iteration did not converge in {iterations} steps \
         (|dx| = {step_norm:.3e} near ({x:.6}, {y:.6}))."
    )]
    DidNotConverge {
        iterations: usize,
        step_norm: f64,
        x: f64,
        y: f64,
    },
    #[error("Hessian is singular near ({x:.6}, {y:.6}).")]
    SingularHessian { x: f64, y: f64 },
}

/// A converged root of the pseudo-potential gradient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Equilibrium {
    pub position: [f64; 2],
    pub residual_norm: f64,
    pub iterations: usize,
    /// Eigenvalues of the phase-space flow Jacobian at the root.
    pub eigenvalues: Vec<Complex<f64>>,
    /// True when no eigenvalue has a real part beyond the neutral threshold.
    pub linearly_stable: bool,
}

/// Seed guesses for L1..L5 on the conventional branches: near the secondary
/// on the axis, beyond the secondary, beyond the primary, and the two
/// equilateral points.
pub fn default_seeds() -> [Vector2<f64>; 5] {
    [
        Vector2::new(0.8, 0.0),
        Vector2::new(1.2, 0.0),
        Vector2::new(-1.0, 0.0),
        Vector2::new(0.5, 0.8),
        Vector2::new(0.5, -0.8),
    ]
}

/// Newton-Raphson root search on the pseudo-potential gradient, using the
/// analytic Hessian as Jacobian. The Newton step is obtained by LU solve,
/// never by explicit inversion.
pub fn find_equilibrium(
    model: &Crtbp,
    guess: Vector2<f64>,
    settings: NewtonSettings,
) -> std::result::Result<Equilibrium, EquilibriumError> {
    let mut x = guess;
    let mut step_norm = f64::INFINITY;

    for iteration in 1..=settings.max_steps {
        let grad = model.pseudo_potential_grad(&x);
        let hessian = model.pseudo_potential_hessian(&x);
        let dx = hessian
            .lu()
            .solve(&grad)
            .filter(|dx| dx.iter().all(|v| v.is_finite()))
            .ok_or(EquilibriumError::SingularHessian { x: x.x, y: x.y })?;

        x -= dx;
        step_norm = dx.norm();
        if step_norm < settings.tolerance {
            return Ok(classify(model, x, iteration));
        }
    }

    Err(EquilibriumError::DidNotConverge {
        iterations: settings.max_steps,
        step_norm,
        x: x.x,
        y: x.y,
    })
}

/// Locates the five Lagrange points. Results are returned in seed order;
/// index 0..4 corresponds to L1..L5 and callers rely on that labeling.
pub fn lagrange_points(
    model: &Crtbp,
    seeds: &[Vector2<f64>; 5],
    settings: NewtonSettings,
) -> Result<Vec<Equilibrium>> {
    seeds
        .iter()
        .zip(LAGRANGE_LABELS)
        .map(|(seed, label)| {
            find_equilibrium(model, *seed, settings).with_context(|| {
                format!(
                    "Failed to locate {label} from seed ({}, {}).",
                    seed.x, seed.y
                )
            })
        })
        .collect()
}

fn classify(model: &Crtbp, position: Vector2<f64>, iterations: usize) -> Equilibrium {
    let residual_norm = model.pseudo_potential_grad(&position).norm();
    let eigenvalues: Vec<Complex<f64>> = model
        .flow_jacobian(&position)
        .complex_eigenvalues()
        .iter()
        .copied()
        .collect();
    let linearly_stable = eigenvalues
        .iter()
        .all(|lambda| lambda.re.abs() < STABILITY_TOLERANCE);
    Equilibrium {
        position: [position.x, position.y],
        residual_norm,
        iterations,
        eigenvalues,
        linearly_stable,
    }
}
