use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::color::Rgba;
use crate::error::{FieldError, FieldResult};

/// Parameters of one simulation run. Missing keys in a config file fall back
/// to the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub point_count: i64,
    /// Drawn radius of a particle and the inset of the collision walls.
    pub point_radius: f32,
    pub point_color: Rgba,
    pub line_color: Rgba,

    pub attraction_enabled: bool,
    pub attraction_radius: f32,
    pub attraction_strength: f32,

    pub velocity_scale: f32,
    pub velocity_damping: f32,
    pub gravity: f32,
    pub restitution: f32,
    /// Factor applied to every particle's acceleration once per step.
    pub acceleration_decay: f32,
    /// Seed velocities are drawn from `[-initial_speed, initial_speed]`.
    pub initial_speed: f32,
    pub particle_mass: f32,

    pub line_max_distance: f32,
    pub line_width: f32,
    pub gradient_enabled: bool,
    /// Start, middle and end stops of the line gradient.
    pub gradient_stops: [Rgba; 3],

    pub transparent_background: bool,
    pub background_color: Rgba,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            point_count: 80,
            point_radius: 1.5,
            point_color: Rgba::WHITE,
            line_color: Rgba::WHITE,
            attraction_enabled: true,
            attraction_radius: 150.0,
            attraction_strength: 0.3,
            velocity_scale: 1.0,
            velocity_damping: 0.8,
            gravity: 0.0,
            restitution: 1.0,
            acceleration_decay: 0.1,
            initial_speed: 0.5,
            particle_mass: 50.0,
            line_max_distance: 120.0,
            line_width: 0.3,
            gradient_enabled: true,
            gradient_stops: [Rgba::WHITE; 3],
            transparent_background: true,
            background_color: Rgba::BLACK,
        }
    }
}

impl SimulationConfig {
    pub fn load(path: &Path) -> FieldResult<Self> {
        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)
            .map_err(|err| FieldError::Config(format!("unable to parse config: {err}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> FieldResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let encoded = toml::to_string_pretty(self)
            .map_err(|err| FieldError::Config(format!("unable to encode config: {err}")))?;
        fs::write(path, encoded)?;
        Ok(())
    }

    /// Number of particles to seed. Only a negative count is rejected here.
    pub fn particle_count(&self) -> FieldResult<usize> {
        usize::try_from(self.point_count)
            .map_err(|_| FieldError::NegativePointCount(self.point_count))
    }

    pub fn validate(&self) -> FieldResult<()> {
        self.particle_count()?;

        let positive = [
            ("point_radius", self.point_radius),
            ("attraction_radius", self.attraction_radius),
            ("line_max_distance", self.line_max_distance),
            ("line_width", self.line_width),
        ];
        for (name, value) in positive {
            if !(value > 0.0) {
                return Err(FieldError::InvalidConfig(format!(
                    "{name} must be positive (got {value})"
                )));
            }
        }

        if !(0.0..=1.0).contains(&self.velocity_damping) {
            return Err(FieldError::InvalidConfig(format!(
                "velocity_damping must be within [0, 1] (got {})",
                self.velocity_damping
            )));
        }
        if !(0.0..1.0).contains(&self.acceleration_decay) {
            return Err(FieldError::InvalidConfig(format!(
                "acceleration_decay must be within [0, 1) (got {})",
                self.acceleration_decay
            )));
        }
        if !(self.initial_speed >= 0.0 && (2.0 * self.initial_speed).is_finite()) {
            return Err(FieldError::InvalidConfig(format!(
                "initial_speed must be a finite, non-negative speed (got {})",
                self.initial_speed
            )));
        }
        Ok(())
    }
}
