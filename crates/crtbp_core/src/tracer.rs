use crate::model::Crtbp;
use crate::solvers::Rk4;
use crate::traits::Steppable;
use anyhow::{bail, Result};
use nalgebra::{Vector2, Vector4};
use serde::{Deserialize, Serialize};

/// Settings controlling trajectory propagation from a picked point.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TracerSettings {
    /// Target Jacobi constant; the launch speed is derived from it.
    pub jacobi_target: f64,
    /// Number of fixed integration steps; the trajectory has `steps + 1` points.
    pub steps: usize,
    pub step_size: f64,
    /// Fixed offset, in radians, applied to the tangential launch direction.
    pub launch_angle: f64,
    /// Tube radius taper endpoints, presentation metadata only.
    pub min_radius: f64,
    pub max_radius: f64,
    /// Distance to either body below which a sample counts as singular.
    pub singularity_epsilon: f64,
}

impl Default for TracerSettings {
    fn default() -> Self {
        Self {
            jacobi_target: 3.139855,
            steps: 1000,
            step_size: 0.005,
            launch_angle: -0.008,
            min_radius: 0.002,
            max_radius: 0.01,
            singularity_epsilon: 1e-3,
        }
    }
}

/// A propagated trajectory, replaced wholesale on every pick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trajectory {
    /// Chronological positions, starting point included.
    pub positions: Vec<[f64; 2]>,
    /// Per-point tube radii, tapered from `min_radius` to `max_radius`.
    pub radii: Vec<f64>,
    pub initial_state: [f64; 4],
    pub jacobi_target: f64,
    /// True when the target energy was unreachable at the starting position
    /// and the launch speed was clamped to zero.
    pub energy_clamped: bool,
    /// First step index at which the state went non-finite or came within
    /// the singularity epsilon of a body, if any.
    pub singularity_step: Option<usize>,
}

impl Trajectory {
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Rotates the radius sequence forward by one element, moving the pulse
    /// one point ahead. Presentation effect only; call once per frame.
    pub fn advance_pulse(&mut self) {
        if self.radii.is_empty() {
            return;
        }
        self.radii.rotate_right(1);
    }
}

/// Launch speed on the target Jacobi level: `sqrt(max(2 U(pos) - C, 0))`.
/// The clamp to zero (instead of an imaginary speed) is deliberate; the
/// returned flag reports that the target energy is unreachable at `pos`.
pub fn launch_speed(model: &Crtbp, pos: &Vector2<f64>, jacobi_target: f64) -> (f64, bool) {
    let radicand = 2.0 * model.pseudo_potential(pos) - jacobi_target;
    if radicand < 0.0 {
        (0.0, true)
    } else {
        (radicand.sqrt(), false)
    }
}

/// Propagates a trajectory from `start` on the configured Jacobi level.
///
/// The initial velocity is tangential to a circle around the secondary body,
/// rotated by the fixed launch angle and scaled to the derived speed. The
/// integration always runs the full step count; passing near a gravitational
/// singularity is recorded on the result rather than aborting.
pub fn trace(model: &Crtbp, start: Vector2<f64>, settings: &TracerSettings) -> Result<Trajectory> {
    if !(settings.step_size > 0.0) || !settings.step_size.is_finite() {
        bail!("Step size must be positive and finite, got {}.", settings.step_size);
    }
    if settings.min_radius > settings.max_radius {
        bail!(
            "Radius taper is inverted: min {} > max {}.",
            settings.min_radius,
            settings.max_radius
        );
    }
    if !(settings.singularity_epsilon >= 0.0) {
        bail!("Singularity epsilon must be non-negative.");
    }

    let rel = start - model.secondary();
    if rel.norm() == 0.0 {
        bail!("Starting position coincides with the secondary body.");
    }

    let (speed, energy_clamped) = launch_speed(model, &start, settings.jacobi_target);
    let tangent = Vector2::new(-rel.y, rel.x).normalize();
    let (sin, cos) = settings.launch_angle.sin_cos();
    let velocity = Vector2::new(
        tangent.x * cos - tangent.y * sin,
        tangent.x * sin + tangent.y * cos,
    ) * speed;

    let mut state = Vector4::new(start.x, start.y, velocity.x, velocity.y);
    let initial_state = [start.x, start.y, velocity.x, velocity.y];
    let mut t = 0.0;
    let stepper = Rk4;

    let mut positions = Vec::with_capacity(settings.steps + 1);
    positions.push([state.x, state.y]);
    let mut singularity_step = is_singular(model, &state, settings).then_some(0);

    for step in 1..=settings.steps {
        stepper.step(model, &mut t, &mut state, settings.step_size);
        positions.push([state.x, state.y]);
        if singularity_step.is_none() && is_singular(model, &state, settings) {
            singularity_step = Some(step);
        }
    }

    let radii = taper_radii(positions.len(), settings.min_radius, settings.max_radius);
    Ok(Trajectory {
        positions,
        radii,
        initial_state,
        jacobi_target: settings.jacobi_target,
        energy_clamped,
        singularity_step,
    })
}

fn is_singular(model: &Crtbp, state: &Vector4<f64>, settings: &TracerSettings) -> bool {
    if !state.iter().all(|v| v.is_finite()) {
        return true;
    }
    let pos = Vector2::new(state.x, state.y);
    model.nearest_body_distance(&pos) < settings.singularity_epsilon
}

fn taper_radii(count: usize, min_radius: f64, max_radius: f64) -> Vec<f64> {
    let denom = count.saturating_sub(1).max(1) as f64;
    (0..count)
        .map(|i| min_radius + (max_radius - min_radius) * i as f64 / denom)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{launch_speed, trace, TracerSettings, Trajectory};
    use crate::model::Crtbp;
    use crate::solvers::Rk4;
    use crate::traits::Steppable;
    use nalgebra::{Vector2, Vector4};

    fn model() -> Crtbp {
        Crtbp::new(0.02, 1.0).expect("test model should construct")
    }

    #[test]
    fn default_pick_produces_full_length_trajectory() {
        let model = model();
        let start = Vector2::new(1.019, -0.008);
        let trajectory =
            trace(&model, start, &TracerSettings::default()).expect("trace should succeed");
        assert_eq!(trajectory.len(), 1001);
        assert_eq!(trajectory.positions[0], [1.019, -0.008]);
        assert_eq!(trajectory.radii.len(), 1001);
        assert!(!trajectory.energy_clamped);
        assert!(trajectory.singularity_step.is_none());
        assert!(trajectory
            .positions
            .iter()
            .all(|p| p[0].is_finite() && p[1].is_finite()));
    }

    #[test]
    fn zero_steps_return_only_the_start() {
        let model = model();
        let settings = TracerSettings {
            steps: 0,
            ..TracerSettings::default()
        };
        let trajectory =
            trace(&model, Vector2::new(1.019, -0.008), &settings).expect("trace should succeed");
        assert_eq!(trajectory.positions, vec![[1.019, -0.008]]);
        assert_eq!(trajectory.radii.len(), 1);
    }

    #[test]
    fn launch_speed_is_clamped_when_energy_is_unreachable() {
        let model = model();
        // The pseudo-potential attains its minimum near the triangular
        // points; 2U there is well below the default Jacobi target.
        let l4 = Vector2::new(0.48, 0.866);
        let (speed, clamped) = launch_speed(&model, &l4, 3.139855);
        assert_eq!(speed, 0.0);
        assert!(clamped);

        let (speed, clamped) = launch_speed(&model, &Vector2::new(1.019, -0.008), 3.139855);
        assert!(speed > 0.0 && speed.is_finite());
        assert!(!clamped);

        let trajectory = trace(&model, l4, &TracerSettings::default()).expect("trace succeeds");
        assert!(trajectory.energy_clamped);
    }

    #[test]
    fn jacobi_constant_drift_stays_within_one_percent() {
        let model = model();
        let settings = TracerSettings::default();
        let trajectory = trace(&model, Vector2::new(1.019, -0.008), &settings)
            .expect("trace should succeed");

        // Re-integrate from the recorded initial state, sampling the Jacobi
        // constant along the way; RK4 drift must stay inside the band.
        let s = trajectory.initial_state;
        let mut state = Vector4::new(s[0], s[1], s[2], s[3]);
        let mut t = 0.0;
        let stepper = Rk4;
        let speed0 = (state.z * state.z + state.w * state.w).sqrt();
        let c0 = model.jacobi_constant(&Vector2::new(state.x, state.y), speed0);
        for _ in 0..settings.steps {
            stepper.step(&model, &mut t, &mut state, settings.step_size);
            let speed = (state.z * state.z + state.w * state.w).sqrt();
            let c = model.jacobi_constant(&Vector2::new(state.x, state.y), speed);
            assert!(
                ((c - c0) / c0).abs() < 0.01,
                "Jacobi constant drifted from {c0} to {c}"
            );
        }
    }

    #[test]
    fn near_body_start_is_reported_as_singular() {
        let model = model();
        let start = model.secondary() + Vector2::new(1e-5, 0.0);
        let settings = TracerSettings {
            steps: 5,
            ..TracerSettings::default()
        };
        let trajectory = trace(&model, start, &settings).expect("trace still completes");
        assert_eq!(trajectory.singularity_step, Some(0));
        assert_eq!(trajectory.len(), 6);
    }

    #[test]
    fn start_on_secondary_is_rejected() {
        let model = model();
        let err = trace(&model, model.secondary(), &TracerSettings::default())
            .expect_err("start exactly on the secondary must fail");
        assert!(err.to_string().contains("secondary"));
    }

    #[test]
    fn pulse_rotation_moves_last_radius_to_front() {
        let model = model();
        let settings = TracerSettings {
            steps: 2,
            ..TracerSettings::default()
        };
        let mut trajectory =
            trace(&model, Vector2::new(1.019, -0.008), &settings).expect("trace should succeed");
        let before = trajectory.radii.clone();
        trajectory.advance_pulse();
        assert_eq!(trajectory.radii[0], before[2]);
        assert_eq!(trajectory.radii[1], before[0]);
        assert_eq!(trajectory.radii[2], before[1]);
    }

    #[test]
    fn pulse_rotation_tolerates_an_empty_trajectory() {
        let mut trajectory = Trajectory {
            positions: Vec::new(),
            radii: Vec::new(),
            initial_state: [0.0; 4],
            jacobi_target: 3.139855,
            energy_clamped: false,
            singularity_step: None,
        };
        trajectory.advance_pulse();
        assert!(trajectory.radii.is_empty());
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let model = model();
        let start = Vector2::new(1.019, -0.008);
        let bad_step = TracerSettings {
            step_size: 0.0,
            ..TracerSettings::default()
        };
        assert!(trace(&model, start, &bad_step).is_err());
        let bad_radii = TracerSettings {
            min_radius: 0.5,
            max_radius: 0.1,
            ..TracerSettings::default()
        };
        assert!(trace(&model, start, &bad_radii).is_err());
    }
}
