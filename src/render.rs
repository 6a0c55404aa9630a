use rayon::prelude::*;
use tracing::trace;

use crate::color::Rgba;
use crate::config::SimulationConfig;
use crate::simulation::{Particle, SimulationState};

/// How a connecting line is coloured.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LineStyle {
    Flat(Rgba),
    /// Stops at the start, middle and end of the line.
    Gradient([Rgba; 3]),
}

impl LineStyle {
    pub fn for_opacity(config: &SimulationConfig, opacity: f32) -> Self {
        if config.gradient_enabled {
            Self::Gradient(config.gradient_stops.map(|stop| stop.with_opacity(opacity)))
        } else {
            Self::Flat(config.line_color.with_opacity(opacity))
        }
    }

    /// Colour at `t` in `[0, 1]` along the line.
    pub fn color_at(&self, t: f32) -> Rgba {
        match *self {
            Self::Flat(color) => color,
            Self::Gradient([start, middle, end]) => {
                if t <= 0.5 {
                    start.lerp(middle, t * 2.0)
                } else {
                    middle.lerp(end, (t - 0.5) * 2.0)
                }
            }
        }
    }
}

/// Drawing target for one frame. Coordinates are surface pixels with the
/// origin at the top-left corner.
pub trait Surface {
    fn width(&self) -> f32;
    fn height(&self) -> f32;
    fn clear(&mut self);
    fn fill_background(&mut self, color: Rgba);
    fn stroke_line(
        &mut self,
        from: cgmath::Vector2<f32>,
        to: cgmath::Vector2<f32>,
        style: &LineStyle,
        width: f32,
    );
    fn fill_circle(&mut self, center: cgmath::Vector2<f32>, radius: f32, color: Rgba);

    fn has_area(&self) -> bool {
        self.width() > 0.0 && self.height() > 0.0
    }
}

/// A line to draw between particles `from` and `to` (`from < to`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Connection {
    pub from: usize,
    pub to: usize,
    pub distance: f32,
    pub opacity: f32,
}

pub fn line_opacity(distance: f32, max_distance: f32) -> f32 {
    (1.0 - distance / max_distance).clamp(0.0, 1.0)
}

/// Every unordered pair no further apart than `max_distance`, ordered by
/// `(from, to)`.
pub fn connections(particles: &[Particle], max_distance: f32) -> Vec<Connection> {
    (0..particles.len())
        .into_par_iter()
        .flat_map_iter(|from| {
            let origin = particles[from].position;
            particles[from + 1..]
                .iter()
                .enumerate()
                .filter_map(move |(offset, other)| {
                    let delta = other.position - origin;
                    let distance = delta.x.hypot(delta.y);
                    (distance <= max_distance).then(|| Connection {
                        from,
                        to: from + 1 + offset,
                        distance,
                        opacity: line_opacity(distance, max_distance),
                    })
                })
        })
        .collect()
}

/// Draws one frame: lines first, then particles on top. Returns `false`
/// without touching the surface when it has no area.
pub fn render<S: Surface + ?Sized>(
    state: &SimulationState,
    config: &SimulationConfig,
    surface: &mut S,
) -> bool {
    if !surface.has_area() {
        trace!(
            width = surface.width(),
            height = surface.height(),
            "skipping frame on empty surface"
        );
        return false;
    }

    surface.clear();
    if !config.transparent_background {
        surface.fill_background(config.background_color);
    }

    let particles = &state.particles;
    for connection in connections(particles, config.line_max_distance) {
        let style = LineStyle::for_opacity(config, connection.opacity);
        surface.stroke_line(
            particles[connection.from].position,
            particles[connection.to].position,
            &style,
            config.line_width,
        );
    }

    for particle in particles {
        surface.fill_circle(particle.position, config.point_radius, config.point_color);
    }
    true
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Background(Rgba),
    Line {
        from: cgmath::Vector2<f32>,
        to: cgmath::Vector2<f32>,
        style: LineStyle,
        width: f32,
    },
    Circle {
        center: cgmath::Vector2<f32>,
        radius: f32,
        color: Rgba,
    },
}

/// In-memory surface holding the draw commands of the latest frame.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    pub width: f32,
    pub height: f32,
    pub commands: Vec<DrawCommand>,
    pub frames: u64,
}

impl RecordingSurface {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    pub fn lines(&self) -> impl Iterator<Item = &DrawCommand> + '_ {
        self.commands
            .iter()
            .filter(|command| matches!(command, DrawCommand::Line { .. }))
    }

    pub fn circles(&self) -> impl Iterator<Item = &DrawCommand> + '_ {
        self.commands
            .iter()
            .filter(|command| matches!(command, DrawCommand::Circle { .. }))
    }
}

impl Surface for RecordingSurface {
    fn width(&self) -> f32 {
        self.width
    }

    fn height(&self) -> f32 {
        self.height
    }

    fn clear(&mut self) {
        self.commands.clear();
        self.frames += 1;
    }

    fn fill_background(&mut self, color: Rgba) {
        self.commands.push(DrawCommand::Background(color));
    }

    fn stroke_line(
        &mut self,
        from: cgmath::Vector2<f32>,
        to: cgmath::Vector2<f32>,
        style: &LineStyle,
        width: f32,
    ) {
        self.commands.push(DrawCommand::Line {
            from,
            to,
            style: *style,
            width,
        });
    }

    fn fill_circle(&mut self, center: cgmath::Vector2<f32>, radius: f32, color: Rgba) {
        self.commands.push(DrawCommand::Circle {
            center,
            radius,
            color,
        });
    }
}

#[cfg(test)]
mod tests {
    use cgmath::prelude::*;

    use super::{DrawCommand, LineStyle, RecordingSurface, connections, line_opacity, render};
    use crate::color::Rgba;
    use crate::config::SimulationConfig;
    use crate::simulation::{Particle, PointerState, SimulationState, Viewport};

    fn field(points: &[(f32, f32)]) -> SimulationState {
        SimulationState {
            particles: points
                .iter()
                .map(|&(x, y)| Particle {
                    position: cgmath::vec2(x, y),
                    velocity: cgmath::Vector2::zero(),
                    acceleration: cgmath::Vector2::zero(),
                    mass: 1.0,
                })
                .collect(),
            pointer: PointerState::default(),
            viewport: Viewport {
                width: 200.0,
                height: 200.0,
            },
        }
    }

    #[test]
    fn opacity_falls_off_linearly() {
        assert_eq!(line_opacity(0.0, 120.0), 1.0);
        assert_eq!(line_opacity(60.0, 120.0), 0.5);
        assert_eq!(line_opacity(120.0, 120.0), 0.0);
    }

    #[test]
    fn pairs_at_cutoff_are_connected_but_invisible() {
        let state = field(&[(0.0, 0.0), (30.0, 40.0), (30.0, 40.0), (150.0, 150.0)]);
        let found = connections(&state.particles, 50.0);

        let pairs: Vec<_> = found.iter().map(|c| (c.from, c.to)).collect();
        assert_eq!(pairs, vec![(0, 1), (0, 2), (1, 2)]);
        assert_eq!(found[0].opacity, 0.0);
        assert_eq!(found[2].opacity, 1.0);
    }

    #[test]
    fn lines_are_drawn_before_points() {
        let config = SimulationConfig {
            gradient_enabled: false,
            line_color: Rgba::rgb(10, 20, 30),
            ..SimulationConfig::default()
        };
        let state = field(&[(10.0, 10.0), (20.0, 10.0), (40.0, 10.0)]);
        let mut surface = RecordingSurface::new(200.0, 200.0);

        assert!(render(&state, &config, &mut surface));

        assert_eq!(surface.lines().count(), 3);
        assert_eq!(surface.circles().count(), 3);
        let first_circle = surface
            .commands
            .iter()
            .position(|c| matches!(c, DrawCommand::Circle { .. }))
            .unwrap();
        assert!(surface.commands[first_circle..]
            .iter()
            .all(|c| matches!(c, DrawCommand::Circle { .. })));

        match &surface.commands[0] {
            DrawCommand::Line { style, width, .. } => {
                let expected = Rgba::rgb(10, 20, 30).with_opacity(1.0 - 10.0 / 120.0);
                assert_eq!(*style, LineStyle::Flat(expected));
                assert_eq!(*width, config.line_width);
            }
            other => panic!("expected a line, got {other:?}"),
        }
    }

    #[test]
    fn gradient_stops_carry_opacity() {
        let config = SimulationConfig {
            gradient_stops: [Rgba::rgb(255, 0, 0), Rgba::rgb(0, 255, 0), Rgba::rgb(0, 0, 255)],
            ..SimulationConfig::default()
        };
        let style = LineStyle::for_opacity(&config, 0.5);

        assert_eq!(
            style,
            LineStyle::Gradient([
                Rgba::rgba(255, 0, 0, 127),
                Rgba::rgba(0, 255, 0, 127),
                Rgba::rgba(0, 0, 255, 127),
            ])
        );
        assert_eq!(style.color_at(0.0), Rgba::rgba(255, 0, 0, 127));
        assert_eq!(style.color_at(0.5), Rgba::rgba(0, 255, 0, 127));
        assert_eq!(style.color_at(1.0), Rgba::rgba(0, 0, 255, 127));
    }

    #[test]
    fn opaque_background_is_filled_first() {
        let config = SimulationConfig {
            transparent_background: false,
            background_color: Rgba::rgb(1, 2, 3),
            ..SimulationConfig::default()
        };
        let mut surface = RecordingSurface::new(50.0, 50.0);
        render(&field(&[(5.0, 5.0)]), &config, &mut surface);

        assert_eq!(surface.commands[0], DrawCommand::Background(Rgba::rgb(1, 2, 3)));
    }

    #[test]
    fn empty_surface_is_skipped() {
        let mut surface = RecordingSurface::new(0.0, 300.0);
        let drawn = render(&field(&[(5.0, 5.0)]), &SimulationConfig::default(), &mut surface);

        assert!(!drawn);
        assert_eq!(surface.frames, 0);
        assert!(surface.commands.is_empty());
    }
}
