use std::path::PathBuf;

use clap::Parser;
use eframe::egui;
use particle_field::{
    Animation, FieldError, FieldResult, FixedRateClock, FrameBudget, LineStyle, RecordingSurface, Rgba,
    SimulationConfig, Surface,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const GRADIENT_SEGMENTS: usize = 6;
const HEADLESS_SIZE: (f32, f32) = (1280.0, 720.0);

#[derive(Parser, Debug)]
#[command(name = "particle-field", about = "Interactive particle field background")]
struct Args {
    /// TOML file with simulation settings.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Overrides the configured number of particles.
    #[arg(long)]
    points: Option<i64>,

    /// Run this many frames against an in-memory surface instead of opening a window.
    #[arg(long)]
    headless_frames: Option<u64>,

    /// Pace headless frames to this many per second instead of running them back to back.
    #[arg(long, requires = "headless_frames")]
    refresh_rate: Option<f32>,

    /// Write the default settings to this path and exit.
    #[arg(long)]
    write_default_config: Option<PathBuf>,
}

fn color32(color: Rgba) -> egui::Color32 {
    egui::Color32::from_rgba_unmultiplied(color.r, color.g, color.b, color.a)
}

/// Surface backed by an egui painter. Field coordinates are physical pixels,
/// egui works in points.
struct PainterSurface<'a> {
    painter: &'a egui::Painter,
    origin: egui::Pos2,
    points_per_pixel: f32,
    width: f32,
    height: f32,
}

impl<'a> PainterSurface<'a> {
    fn new(painter: &'a egui::Painter, rect: egui::Rect, pixels_per_point: f32) -> Self {
        Self {
            painter,
            origin: rect.min,
            points_per_pixel: 1.0 / pixels_per_point,
            width: rect.width() * pixels_per_point,
            height: rect.height() * pixels_per_point,
        }
    }

    fn to_screen(&self, position: cgmath::Vector2<f32>) -> egui::Pos2 {
        self.origin + egui::vec2(position.x, position.y) * self.points_per_pixel
    }
}

impl Surface for PainterSurface<'_> {
    fn width(&self) -> f32 {
        self.width
    }

    fn height(&self) -> f32 {
        self.height
    }

    // egui repaints the whole panel every frame.
    fn clear(&mut self) {}

    fn fill_background(&mut self, color: Rgba) {
        self.painter
            .rect_filled(self.painter.clip_rect(), 0.0, color32(color));
    }

    fn stroke_line(
        &mut self,
        from: cgmath::Vector2<f32>,
        to: cgmath::Vector2<f32>,
        style: &LineStyle,
        width: f32,
    ) {
        let stroke_width = width * self.points_per_pixel;
        let (start, end) = (self.to_screen(from), self.to_screen(to));

        match style {
            LineStyle::Flat(color) => {
                self.painter
                    .line_segment([start, end], egui::Stroke::new(stroke_width, color32(*color)));
            }
            LineStyle::Gradient(_) => {
                for segment in 0..GRADIENT_SEGMENTS {
                    let t0 = segment as f32 / GRADIENT_SEGMENTS as f32;
                    let t1 = (segment + 1) as f32 / GRADIENT_SEGMENTS as f32;
                    let color = style.color_at((t0 + t1) * 0.5);
                    self.painter.line_segment(
                        [lerp_pos(start, end, t0), lerp_pos(start, end, t1)],
                        egui::Stroke::new(stroke_width, color32(color)),
                    );
                }
            }
        }
    }

    fn fill_circle(&mut self, center: cgmath::Vector2<f32>, radius: f32, color: Rgba) {
        self.painter.circle_filled(
            self.to_screen(center),
            radius * self.points_per_pixel,
            color32(color),
        );
    }
}

struct FieldApp {
    config: SimulationConfig,
    animation: Option<Animation>,
    surface_size: (f32, f32),
    mount_error: Option<String>,
}

impl FieldApp {
    fn new(_cc: &eframe::CreationContext, config: SimulationConfig) -> Self {
        Self {
            config,
            animation: None,
            surface_size: (0.0, 0.0),
            mount_error: None,
        }
    }

    // The panel size is only known once the first frame is laid out.
    fn ensure_mounted(&mut self, width: f32, height: f32) {
        if self.animation.is_some() || self.mount_error.is_some() {
            return;
        }
        match Animation::mount(self.config.clone(), width, height) {
            Ok(animation) => {
                self.animation = Some(animation);
                self.surface_size = (width, height);
            }
            Err(err) => {
                error!(%err, "unable to mount particle field");
                self.mount_error = Some(err.to_string());
            }
        }
    }
}

impl eframe::App for FieldApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let pixels_per_point = ctx.pixels_per_point();

        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(egui::Color32::from_rgb(8, 10, 24)))
            .show(ctx, |ui| {
                if let Some(message) = &self.mount_error {
                    ui.label(message.as_str());
                    return;
                }

                let (rect, response) =
                    ui.allocate_exact_size(ui.available_size(), egui::Sense::hover());
                let size = (rect.width() * pixels_per_point, rect.height() * pixels_per_point);
                self.ensure_mounted(size.0, size.1);

                let Some(animation) = &self.animation else {
                    return;
                };
                if size != self.surface_size {
                    animation.resized(size.0, size.1);
                    self.surface_size = size;
                }
                if let Some(pointer) = response.hover_pos() {
                    let local = (pointer - rect.min) * pixels_per_point;
                    animation.pointer_moved(local.x, local.y);
                }

                let painter = ui.painter_at(rect);
                let mut surface = PainterSurface::new(&painter, rect, pixels_per_point);
                animation.frame(&mut surface);
            });

        ctx.request_repaint();
    }
}

fn run_headless(config: SimulationConfig, frames: u64, refresh_rate: Option<f32>) -> FieldResult<()> {
    let (width, height) = HEADLESS_SIZE;
    let animation = Animation::mount(config, width, height)?;
    let mut surface = RecordingSurface::new(width, height);

    let ran = match refresh_rate {
        Some(rate) => animation.run(
            &mut surface,
            &mut FixedRateClock::new(rate).with_frame_limit(frames),
        ),
        None => animation.run(&mut surface, &mut FrameBudget::new(frames)),
    };
    animation.unmount();

    let state = animation.snapshot();
    info!(
        frames = ran,
        lines = surface.lines().count(),
        points = surface.circles().count(),
        kinetic_energy = state.kinetic_energy(),
        "headless run finished"
    );
    Ok(())
}

fn main() -> FieldResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    if let Some(path) = &args.write_default_config {
        SimulationConfig::default().save(path)?;
        info!(path = %path.display(), "wrote default config");
        return Ok(());
    }

    let mut config = match &args.config {
        Some(path) => SimulationConfig::load(path)?,
        None => SimulationConfig::default(),
    };
    if let Some(points) = args.points {
        config.point_count = points;
    }
    config.validate()?;

    if let Some(frames) = args.headless_frames {
        return run_headless(config, frames, args.refresh_rate);
    }

    eframe::run_native(
        "Particle Field",
        eframe::NativeOptions {
            renderer: eframe::Renderer::Wgpu,
            initial_window_size: Some(egui::vec2(1280.0, 720.0)),
            ..Default::default()
        },
        Box::new(move |cc| Box::new(FieldApp::new(cc, config))),
    )
    .map_err(|err| FieldError::Host(err.to_string()))
}

/// Component-wise `Pos2` interpolation (egui 0.21 has no `Pos2::lerp`).
fn lerp_pos(from: egui::Pos2, to: egui::Pos2, t: f32) -> egui::Pos2 {
    egui::pos2(
        egui::emath::lerp(from.x..=to.x, t),
        egui::emath::lerp(from.y..=to.y, t),
    )
}
