use crate::equilibrium::{default_seeds, lagrange_points, Equilibrium, NewtonSettings};
use crate::field::{sample_jacobi_field, FieldSettings, ScalarField};
use crate::model::Crtbp;
use crate::tracer::{trace, TracerSettings, Trajectory};
use anyhow::{Context, Result};
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

/// Construction-time configuration for a complete CRTBP session: model
/// constants, solver settings and the initial pick, all defaulting to the
/// documented values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub mass_ratio: f64,
    pub rotation_rate: f64,
    pub newton: NewtonSettings,
    pub tracer: TracerSettings,
    pub field: FieldSettings,
    /// Seed guesses for L1..L5; seed order fixes the result labeling.
    pub seeds: [[f64; 2]; 5],
    /// World coordinate of the startup pick; only x and y are used.
    pub initial_pick: [f64; 3],
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            mass_ratio: 0.02,
            rotation_rate: 1.0,
            newton: NewtonSettings::default(),
            tracer: TracerSettings::default(),
            field: FieldSettings::default(),
            seeds: default_seeds().map(|seed| [seed.x, seed.y]),
            initial_pick: [1.019, -0.008, 0.0],
        }
    }
}

/// The in-process boundary handed to the rendering collaborator: equilibria
/// and the scalar field are computed once at startup, the trajectory is
/// recomputed on every pick and replaced wholesale.
#[derive(Debug, Clone)]
pub struct Scenario {
    model: Crtbp,
    tracer: TracerSettings,
    equilibria: Vec<Equilibrium>,
    field: ScalarField,
    trajectory: Trajectory,
}

impl Scenario {
    pub fn new(config: &ScenarioConfig) -> Result<Self> {
        let model = Crtbp::new(config.mass_ratio, config.rotation_rate)?;
        let seeds = config.seeds.map(|seed| Vector2::new(seed[0], seed[1]));
        let equilibria = lagrange_points(&model, &seeds, config.newton)?;
        let field = sample_jacobi_field(&model, config.field)
            .context("Failed to sample the Jacobi field.")?;
        let trajectory = trace(
            &model,
            Vector2::new(config.initial_pick[0], config.initial_pick[1]),
            &config.tracer,
        )
        .context("Failed to trace the startup pick.")?;
        Ok(Self {
            model,
            tracer: config.tracer,
            equilibria,
            field,
            trajectory,
        })
    }

    pub fn model(&self) -> &Crtbp {
        &self.model
    }

    /// The five Lagrange points, indexable 0..4 as L1..L5.
    pub fn equilibria(&self) -> &[Equilibrium] {
        &self.equilibria
    }

    pub fn field(&self) -> &ScalarField {
        &self.field
    }

    pub fn trajectory(&self) -> &Trajectory {
        &self.trajectory
    }

    /// Recomputes the trajectory from a picked world coordinate. The z
    /// component is ignored; the previous trajectory is dropped only once
    /// the new one is fully computed.
    pub fn pick(&mut self, point: [f64; 3]) -> Result<&Trajectory> {
        self.trajectory = trace(&self.model, Vector2::new(point[0], point[1]), &self.tracer)?;
        Ok(&self.trajectory)
    }

    /// Advances the tube-radius pulse by one tick.
    pub fn advance_pulse(&mut self) {
        self.trajectory.advance_pulse();
    }
}
