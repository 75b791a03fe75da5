use crate::traits::VectorField;
use anyhow::{bail, Result};
use nalgebra::{Matrix2, Matrix4, Vector2, Vector4};

/// Sun-Earth mass ratio.
pub const SUN_EARTH_MASS_RATIO: f64 = 3.04042338912411e-6;

/// Earth-Moon mass ratio.
pub const EARTH_MOON_MASS_RATIO: f64 = 0.012150585609624;

/// Analytic model for the circular restricted three-body problem.
///
/// All quantities live in the normalized co-rotating frame: the two massive
/// bodies sit at `(-mu, 0)` and `(1 - mu, 0)` with unit separation, and the
/// frame rotates at rate `omega` about the barycenter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Crtbp {
    mu: f64,
    omega: f64,
}

impl Crtbp {
    pub fn new(mu: f64, omega: f64) -> Result<Self> {
        if !(mu > 0.0 && mu < 0.5) {
            bail!("Mass ratio must lie strictly between 0 and 0.5, got {mu}.");
        }
        if !omega.is_finite() || omega <= 0.0 {
            bail!("Rotation rate must be positive and finite, got {omega}.");
        }
        Ok(Self { mu, omega })
    }

    pub fn mass_ratio(&self) -> f64 {
        self.mu
    }

    pub fn rotation_rate(&self) -> f64 {
        self.omega
    }

    /// Position of the primary (heavier) body in the rotating frame.
    pub fn primary(&self) -> Vector2<f64> {
        Vector2::new(-self.mu, 0.0)
    }

    /// Position of the secondary (lighter) body in the rotating frame.
    pub fn secondary(&self) -> Vector2<f64> {
        Vector2::new(1.0 - self.mu, 0.0)
    }

    /// Gravitational acceleration from both massive bodies, excluding
    /// centrifugal and Coriolis terms.
    ///
    /// Singular at either body's position; callers must not sample there.
    pub fn acceleration(&self, pos: &Vector2<f64>) -> Vector2<f64> {
        let to_primary = self.primary() - pos;
        let to_secondary = self.secondary() - pos;
        to_primary * ((1.0 - self.mu) / to_primary.norm().powi(3))
            + to_secondary * (self.mu / to_secondary.norm().powi(3))
    }

    /// Effective potential combining gravity and the centrifugal term:
    /// `mu/r2 + (1 - mu)/r1 + omega^2 (x^2 + y^2) / 2`, where `r1` and `r2`
    /// are the distances to the primary and secondary body.
    pub fn pseudo_potential(&self, pos: &Vector2<f64>) -> f64 {
        let r1 = (pos - self.primary()).norm();
        let r2 = (pos - self.secondary()).norm();
        self.mu / r2 + (1.0 - self.mu) / r1 + self.omega * self.omega * pos.norm_squared() / 2.0
    }

    /// Spatial gradient of the pseudo-potential; vanishes at the five
    /// Lagrange points.
    pub fn pseudo_potential_grad(&self, pos: &Vector2<f64>) -> Vector2<f64> {
        let d1 = pos - self.primary();
        let d2 = pos - self.secondary();
        let r1 = d1.norm();
        let r2 = d2.norm();
        d1 * (-(1.0 - self.mu) / r1.powi(3)) + d2 * (-self.mu / r2.powi(3))
            + pos * (self.omega * self.omega)
    }

    /// Hessian of the pseudo-potential; symmetric by construction. Used as
    /// the Jacobian of the Newton-Raphson equilibrium search.
    pub fn pseudo_potential_hessian(&self, pos: &Vector2<f64>) -> Matrix2<f64> {
        let d1 = pos - self.primary();
        let d2 = pos - self.secondary();
        let r1 = d1.norm();
        let r2 = d2.norm();
        let m1 = 1.0 - self.mu;
        let m2 = self.mu;
        let omega2 = self.omega * self.omega;
        let hxx = omega2 - m1 / r1.powi(3) + 3.0 * m1 * d1.x * d1.x / r1.powi(5)
            - m2 / r2.powi(3)
            + 3.0 * m2 * d2.x * d2.x / r2.powi(5);
        let hxy = 3.0 * m1 * d1.x * d1.y / r1.powi(5) + 3.0 * m2 * d2.x * d2.y / r2.powi(5);
        let hyy = omega2 - m1 / r1.powi(3) + 3.0 * m1 * d1.y * d1.y / r1.powi(5)
            - m2 / r2.powi(3)
            + 3.0 * m2 * d2.y * d2.y / r2.powi(5);
        Matrix2::new(hxx, hxy, hxy, hyy)
    }

    /// Jacobi constant at a position for a given speed.
    ///
    /// Convention: `speed` is a velocity magnitude; it is squared inside the
    /// formula `C = 2 U(pos) - speed^2`. The tracer and the field sampler
    /// both follow this convention.
    pub fn jacobi_constant(&self, pos: &Vector2<f64>, speed: f64) -> f64 {
        2.0 * self.pseudo_potential(pos) - speed * speed
    }

    /// Jacobian of the phase-space flow at a point, used for the linear
    /// stability classification of equilibria.
    pub fn flow_jacobian(&self, pos: &Vector2<f64>) -> Matrix4<f64> {
        let h = self.pseudo_potential_hessian(pos);
        let two_omega = 2.0 * self.omega;
        #[rustfmt::skip]
        let jacobian = Matrix4::new(
            0.0,       0.0,       1.0,        0.0,
            0.0,       0.0,       0.0,        1.0,
            h[(0, 0)], h[(0, 1)], 0.0,        two_omega,
            h[(1, 0)], h[(1, 1)], -two_omega, 0.0,
        );
        jacobian
    }

    /// Distance from `pos` to the nearer of the two massive bodies.
    pub fn nearest_body_distance(&self, pos: &Vector2<f64>) -> f64 {
        let r1 = (pos - self.primary()).norm();
        let r2 = (pos - self.secondary()).norm();
        r1.min(r2)
    }
}

impl VectorField for Crtbp {
    /// Full rotating-frame equations of motion: centrifugal, Coriolis and
    /// gravitational terms.
    fn direction(&self, state: &Vector4<f64>) -> Vector4<f64> {
        let pos = Vector2::new(state.x, state.y);
        let vel = Vector2::new(state.z, state.w);
        let coriolis = Vector2::new(vel.y, -vel.x) * (2.0 * self.omega);
        let acc = pos * (self.omega * self.omega) + coriolis + self.acceleration(&pos);
        Vector4::new(vel.x, vel.y, acc.x, acc.y)
    }
}
