use crate::traits::{Steppable, VectorField};
use nalgebra::Vector4;

/// Classic Runge-Kutta 4th order solver with a fixed step size.
///
/// No adaptive step control and no re-normalization onto the energy surface;
/// numerical drift off a target Jacobi level is expected and accepted.
pub struct Rk4;

impl Steppable for Rk4 {
    fn step(&self, field: &impl VectorField, t: &mut f64, state: &mut Vector4<f64>, dt: f64) {
        let t0 = *t;

        // k1 = f(y)
        let k1 = field.direction(state);
        // k2 = f(y + dt*k1/2)
        let k2 = field.direction(&(*state + k1 * (dt / 2.0)));
        // k3 = f(y + dt*k2/2)
        let k3 = field.direction(&(*state + k2 * (dt / 2.0)));
        // k4 = f(y + dt*k3)
        let k4 = field.direction(&(*state + k3 * dt));

        // y_next = y + dt/6 * (k1 + 2k2 + 2k3 + k4)
        *state += (k1 + k2 * 2.0 + k3 * 2.0 + k4) * (dt / 6.0);
        *t = t0 + dt;
    }
}
