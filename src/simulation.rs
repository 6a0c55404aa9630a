use cgmath::prelude::*;
use rand::prelude::*;
use rayon::prelude::*;
use tracing::debug;

use crate::config::SimulationConfig;
use crate::error::FieldResult;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub position: cgmath::Vector2<f32>,
    pub velocity: cgmath::Vector2<f32>,
    /// Leaky accumulator of applied forces, decayed every step.
    pub acceleration: cgmath::Vector2<f32>,
    /// Carried for callers; forces are applied as accelerations directly.
    pub mass: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerState {
    pub position: cgmath::Vector2<f32>,
}

impl Default for PointerState {
    fn default() -> Self {
        Self {
            position: cgmath::Vector2::zero(),
        }
    }
}

/// Size of the drawing surface in surface pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationState {
    pub particles: Vec<Particle>,
    pub pointer: PointerState,
    pub viewport: Viewport,
}

/// Acceleration a pointer at `pointer` adds to a particle at `position` in one
/// step: linear falloff from `attraction_strength` at distance zero to nothing
/// at `attraction_radius`, pointing from the particle toward the pointer.
pub fn attraction(
    position: cgmath::Vector2<f32>,
    pointer: cgmath::Vector2<f32>,
    config: &SimulationConfig,
) -> Option<cgmath::Vector2<f32>> {
    let delta = pointer - position;
    let distance = delta.x.hypot(delta.y);
    if distance >= config.attraction_radius {
        return None;
    }

    let falloff = (config.attraction_radius - distance) / config.attraction_radius;
    let angle = delta.y.atan2(delta.x);
    Some(cgmath::vec2(angle.cos(), angle.sin()) * (config.attraction_strength * falloff))
}

fn sample_axis<R: Rng + ?Sized>(rng: &mut R, low: f32, high: f32) -> f32 {
    if high > low && (high - low).is_finite() {
        rng.gen_range(low..=high)
    } else {
        low
    }
}

impl Particle {
    fn seeded<R: Rng + ?Sized>(config: &SimulationConfig, viewport: Viewport, rng: &mut R) -> Self {
        let margin = config.point_radius;
        let speed = config.initial_speed.abs();
        Self {
            position: cgmath::vec2(
                sample_axis(rng, margin, viewport.width - margin),
                sample_axis(rng, margin, viewport.height - margin),
            ),
            velocity: cgmath::vec2(
                sample_axis(rng, -speed, speed),
                sample_axis(rng, -speed, speed),
            ),
            acceleration: cgmath::Vector2::zero(),
            mass: config.particle_mass,
        }
    }

    fn integrate(&mut self, config: &SimulationConfig) {
        self.acceleration *= config.acceleration_decay;

        let scale = config.velocity_scale * config.velocity_damping;
        self.velocity.x += self.acceleration.x * scale;
        self.velocity.y += (self.acceleration.y + config.gravity) * scale;

        self.position += self.velocity;
    }

    fn apply_boundary_conditions(&mut self, viewport: Viewport, config: &SimulationConfig) {
        let margin = config.point_radius;
        let restitution = config.restitution;

        macro_rules! handle_boundary {
            ($coord:expr, $vel:expr, $extent:expr) => {
                if $coord > $extent - margin {
                    $coord = $extent - margin;
                    $vel = -$vel * restitution;
                }
                if $coord < margin {
                    $coord = margin;
                    $vel = -$vel * restitution;
                }
            };
        }

        handle_boundary!(self.position.x, self.velocity.x, viewport.width);
        handle_boundary!(self.position.y, self.velocity.y, viewport.height);
    }
}

impl SimulationState {
    pub fn initialize(config: &SimulationConfig, width: f32, height: f32) -> FieldResult<Self> {
        Self::initialize_with_rng(config, width, height, &mut thread_rng())
    }

    pub fn initialize_with_rng<R: Rng + ?Sized>(
        config: &SimulationConfig,
        width: f32,
        height: f32,
        rng: &mut R,
    ) -> FieldResult<Self> {
        let mut state = Self {
            particles: Vec::new(),
            pointer: PointerState::default(),
            viewport: Viewport { width, height },
        };
        state.seed(config, config.particle_count()?, rng);
        Ok(state)
    }

    /// Replaces every particle with a fresh random one inside the current
    /// viewport. The particle count of the run is kept whatever
    /// `config.point_count` says.
    pub fn reseed<R: Rng + ?Sized>(&mut self, config: &SimulationConfig, rng: &mut R) {
        self.seed(config, self.particles.len(), rng);
    }

    fn seed<R: Rng + ?Sized>(&mut self, config: &SimulationConfig, count: usize, rng: &mut R) {
        let viewport = self.viewport;
        self.particles = (0..count)
            .map(|_| Particle::seeded(config, viewport, rng))
            .collect();
        debug!(count, width = viewport.width, height = viewport.height, "seeded particles");
    }

    pub fn on_pointer_move(&mut self, x: f32, y: f32) {
        self.pointer.position = cgmath::vec2(x, y);
    }

    /// Records new viewport dimensions. Particles outside the new bounds are
    /// pulled back in by the next `step`.
    pub fn on_resize(&mut self, width: f32, height: f32) {
        self.viewport = Viewport { width, height };
    }

    /// Advances the field by one frame.
    pub fn step(&mut self, config: &SimulationConfig) {
        let pointer = self.pointer.position;
        let viewport = self.viewport;

        self.particles.par_iter_mut().for_each(|particle| {
            if config.attraction_enabled {
                if let Some(pull) = attraction(particle.position, pointer, config) {
                    particle.acceleration += pull;
                }
            }
            particle.integrate(config);
            particle.apply_boundary_conditions(viewport, config);
        });
    }

    /// Sum of squared speeds over all particles.
    pub fn kinetic_energy(&self) -> f32 {
        self.particles.iter().map(|p| p.velocity.magnitude2()).sum()
    }
}
