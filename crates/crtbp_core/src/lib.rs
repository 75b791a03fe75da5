pub mod equilibrium;
pub mod field;
pub mod model;
pub mod scenario;
pub mod solvers;
pub mod tracer;
/// The `crtbp_core` crate provides the dynamical and numerical core for a
/// circular restricted three-body problem (CRTBP) visualization.
///
/// Key components:
/// - **Traits**: `VectorField` (phase-space right-hand side), `Steppable` (solvers).
/// - **Model**: Analytic rotating-frame force model, pseudo-potential and derivatives.
/// - **Equilibrium**: Newton-Raphson search for the five Lagrange points.
/// - **Tracer**: Fixed-step RK4 trajectory propagation on a target Jacobi level.
/// - **Field**: Jacobi-constant grid sampling for iso-contour extraction.
pub mod traits;
