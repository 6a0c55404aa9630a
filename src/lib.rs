//! A 2D particle field: point-masses drifting inside a viewport, pulled toward
//! the pointer and joined by lines that fade with distance.

pub mod animation;
pub mod color;
pub mod config;
pub mod error;
pub mod render;
pub mod simulation;

pub use animation::{Animation, CancellationToken, FixedRateClock, FrameBudget, FrameClock};
pub use color::Rgba;
pub use config::SimulationConfig;
pub use error::{FieldError, FieldResult};
pub use render::{
    Connection, DrawCommand, LineStyle, RecordingSurface, Surface, connections, line_opacity,
    render,
};
pub use simulation::{Particle, PointerState, SimulationState, Viewport, attraction};
