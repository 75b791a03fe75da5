use crate::model::Crtbp;
use anyhow::{bail, Result};
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

/// Rectangular sampling window for the Jacobi scalar field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldSettings {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
    /// Grid resolution per axis; the grid holds `resolution^2` samples.
    pub resolution: usize,
}

impl Default for FieldSettings {
    fn default() -> Self {
        Self {
            x_min: -2.0,
            x_max: 2.0,
            y_min: -2.0,
            y_max: 2.0,
            resolution: 50,
        }
    }
}

/// A row-major grid of Jacobi-constant samples at zero reference speed,
/// filled once and immutable afterwards. Consumed by an external
/// contour-extraction collaborator, which owns the adjustable iso-level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalarField {
    settings: FieldSettings,
    values: Vec<f64>,
}

/// Evaluates `jacobi_constant(pos, 0)` over the grid. Cell `(0, 0)` maps to
/// `(x_min, y_min)` and cell `(R-1, R-1)` to `(x_max, y_max)`.
pub fn sample_jacobi_field(model: &Crtbp, settings: FieldSettings) -> Result<ScalarField> {
    if settings.resolution < 2 {
        bail!("Field resolution must be at least 2, got {}.", settings.resolution);
    }
    for (min, max, axis) in [
        (settings.x_min, settings.x_max, "x"),
        (settings.y_min, settings.y_max, "y"),
    ] {
        if !min.is_finite() || !max.is_finite() || max <= min {
            bail!("Field {axis} range must be finite with max > min, got [{min}, {max}].");
        }
    }

    let r = settings.resolution;
    let mut values = Vec::with_capacity(r * r);
    for iy in 0..r {
        for ix in 0..r {
            let pos = cell_position(&settings, ix, iy);
            values.push(model.jacobi_constant(&pos, 0.0));
        }
    }
    Ok(ScalarField { settings, values })
}

impl ScalarField {
    pub fn settings(&self) -> &FieldSettings {
        &self.settings
    }

    pub fn resolution(&self) -> usize {
        self.settings.resolution
    }

    /// Raw samples in row-major order, `ix + iy * resolution`.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn value(&self, ix: usize, iy: usize) -> f64 {
        self.values[ix + iy * self.settings.resolution]
    }

    /// World position of a cell under the linear index-to-world map.
    pub fn world_position(&self, ix: usize, iy: usize) -> Vector2<f64> {
        cell_position(&self.settings, ix, iy)
    }
}

fn cell_position(settings: &FieldSettings, ix: usize, iy: usize) -> Vector2<f64> {
    let denom = (settings.resolution - 1) as f64;
    Vector2::new(
        settings.x_min + ix as f64 * (settings.x_max - settings.x_min) / denom,
        settings.y_min + iy as f64 * (settings.y_max - settings.y_min) / denom,
    )
}
