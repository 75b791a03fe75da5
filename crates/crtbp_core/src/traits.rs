use nalgebra::Vector4;

/// An autonomous planar vector field expressed in phase space.
/// States are `(x, y, vx, vy)`.
pub trait VectorField {
    /// Evaluates the phase-space derivative `(vx, vy, ax, ay)` at `state`.
    fn direction(&self, state: &Vector4<f64>) -> Vector4<f64>;
}

/// A fixed-step scheme that advances a vector field forward in time.
pub trait Steppable {
    /// Performs one step of size `dt`.
    /// t: current time (updated after step)
    /// state: current state (updated after step)
    fn step(&self, field: &impl VectorField, t: &mut f64, state: &mut Vector4<f64>, dt: f64);
}
