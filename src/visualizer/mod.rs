use std::path::Path;

use clap::ValueEnum;
use tracing::debug;

use crate::config::FigureConfig;
use crate::epicycle::{self, ChainSegment, Point2D};
use crate::error::RenderError;

pub mod html_visualizer;
pub mod path_util;
pub mod plot_visualizer;
pub mod svg_visualizer;

pub use html_visualizer::HtmlSurface;
pub use plot_visualizer::PlotSurface;
pub use svg_visualizer::SvgSurface;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub fn css(&self) -> String {
        format!("rgb({}, {}, {})", self.0, self.1, self.2)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Style {
    pub color: Rgb,
    /// Stroke width in pixels.
    pub width: f64,
    pub dashed: bool,
    pub filled: bool,
}

pub const CIRCLE_STYLE: Style = Style {
    color: Rgb(0, 0, 255),
    width: 1.5,
    dashed: true,
    filled: false,
};

pub const VECTOR_STYLE: Style = Style {
    color: Rgb(255, 0, 0),
    width: 2.0,
    dashed: false,
    filled: false,
};

pub const MARKER_STYLE: Style = Style {
    color: Rgb(255, 0, 0),
    width: 4.0,
    dashed: false,
    filled: true,
};

pub const AXIS_STYLE: Style = Style {
    color: Rgb(128, 128, 128),
    width: 0.5,
    dashed: true,
    filled: false,
};

pub const GRID_STYLE: Style = Style {
    color: Rgb(225, 225, 225),
    width: 0.5,
    dashed: false,
    filled: false,
};

/// A 2D drawing back end. Coordinates are in data units; `show` produces the figure.
pub trait Surface {
    fn set_axis_limits(&mut self, x_range: (f64, f64), y_range: (f64, f64)) -> Result<(), RenderError>;
    fn draw_circle(&mut self, center: Point2D, radius: f64, style: &Style) -> Result<(), RenderError>;
    fn draw_line(&mut self, from: Point2D, to: Point2D, style: &Style) -> Result<(), RenderError>;
    fn draw_point(&mut self, at: Point2D, style: &Style) -> Result<(), RenderError>;
    fn show(&mut self) -> Result<(), RenderError>;
}

#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    Circle { center: Point2D, radius: f64, style: Style },
    Line { from: Point2D, to: Point2D, style: Style },
    Point { at: Point2D, style: Style },
}

/// Draw calls collected by a surface until it is shown.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    pub x_range: (f64, f64),
    pub y_range: (f64, f64),
    pub shapes: Vec<Shape>,
}

impl Scene {
    pub fn new(figure: &FigureConfig) -> Scene {
        Scene {
            x_range: (figure.x_range[0], figure.x_range[1]),
            y_range: (figure.y_range[0], figure.y_range[1]),
            shapes: Vec::new(),
        }
    }

    pub fn set_axis_limits(&mut self, x_range: (f64, f64), y_range: (f64, f64)) -> Result<(), RenderError> {
        check_range("x", x_range)?;
        check_range("y", y_range)?;
        self.x_range = x_range;
        self.y_range = y_range;
        Ok(())
    }

    /// Record a shape. Shapes with a NaN or infinite coordinate are refused.
    pub fn push(&mut self, shape: Shape) -> Result<(), RenderError> {
        let (points, radius) = match &shape {
            Shape::Circle { center, radius, .. } => (vec![*center], Some(*radius)),
            Shape::Line { from, to, .. } => (vec![*from, *to], None),
            Shape::Point { at, .. } => (vec![*at], None),
        };
        if points.iter().any(|p| !(p.x.is_finite() && p.y.is_finite())) {
            return Err(RenderError::NonFinite { what: "coordinate" });
        }
        if radius.is_some_and(|r| !r.is_finite()) {
            return Err(RenderError::NonFinite { what: "radius" });
        }
        self.shapes.push(shape);
        Ok(())
    }
}

/// Evenly spaced "nice" values (1, 2 or 5 times a power of ten) inside a range.
pub fn grid_ticks((min, max): (f64, f64)) -> Vec<f64> {
    const TARGET: f64 = 8.0;
    let span = max - min;
    if !(span.is_finite() && span > 0.0) {
        return Vec::new();
    }
    let rough = span / TARGET;
    let magnitude = 10f64.powf(rough.log10().floor());
    let step = [1.0, 2.0, 5.0, 10.0]
        .iter()
        .map(|m| m * magnitude)
        .find(|step| span / step <= TARGET)
        .unwrap_or(10.0 * magnitude);

    let first = (min / step).ceil() as i64;
    let last = (max / step).floor() as i64;
    (first..=last).map(|i| i as f64 * step).collect()
}

/// Grid lines at the ticks of both axes, spanning the plot area.
pub fn grid_lines(x_range: (f64, f64), y_range: (f64, f64)) -> Vec<(Point2D, Point2D)> {
    let vertical = grid_ticks(x_range)
        .into_iter()
        .map(|x| (Point2D::new(x, y_range.0), Point2D::new(x, y_range.1)));
    let horizontal = grid_ticks(y_range)
        .into_iter()
        .map(|y| (Point2D::new(x_range.0, y), Point2D::new(x_range.1, y)));
    vertical.chain(horizontal).collect()
}

/// Escape text for XML/HTML element content and attribute values.
pub fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn check_range(axis: &'static str, (min, max): (f64, f64)) -> Result<(), RenderError> {
    if !(min.is_finite() && max.is_finite() && min < max) {
        return Err(RenderError::InvalidAxisRange { axis, min, max });
    }
    Ok(())
}

/// Maps data coordinates to pixels with equal scale on both axes.
#[derive(Clone, Copy, Debug)]
pub struct Viewport {
    scale: f64,
    origin_px: (f64, f64),
    x_min: f64,
    y_max: f64,
}

impl Viewport {
    pub const MARGIN_LEFT: f64 = 70.0;
    pub const MARGIN_RIGHT: f64 = 30.0;
    pub const MARGIN_TOP: f64 = 50.0;
    pub const MARGIN_BOTTOM: f64 = 60.0;

    pub fn new(width: u32, height: u32, x_range: (f64, f64), y_range: (f64, f64)) -> Viewport {
        let plot_w = (width as f64 - Self::MARGIN_LEFT - Self::MARGIN_RIGHT).max(1.0);
        let plot_h = (height as f64 - Self::MARGIN_TOP - Self::MARGIN_BOTTOM).max(1.0);
        let span_x = x_range.1 - x_range.0;
        let span_y = y_range.1 - y_range.0;
        let scale = (plot_w / span_x).min(plot_h / span_y);

        // Center the plot area inside the margins.
        let left = Self::MARGIN_LEFT + (plot_w - span_x * scale) / 2.0;
        let top = Self::MARGIN_TOP + (plot_h - span_y * scale) / 2.0;
        Viewport {
            scale,
            origin_px: (left, top),
            x_min: x_range.0,
            y_max: y_range.1,
        }
    }

    pub fn to_px(&self, p: Point2D) -> (f64, f64) {
        (
            self.origin_px.0 + (p.x - self.x_min) * self.scale,
            self.origin_px.1 + (self.y_max - p.y) * self.scale,
        )
    }

    pub fn length_px(&self, len: f64) -> f64 {
        len.abs() * self.scale
    }
}

/// Axis limits for a chain: the configured ranges, or a square fitted around it.
pub fn axis_limits(chain: &[ChainSegment], figure: &FigureConfig) -> ((f64, f64), (f64, f64)) {
    if figure.auto_limits {
        let half = epicycle::extent(chain).max(1.0) * 1.1;
        ((-half, half), (-half, half))
    } else {
        (
            (figure.x_range[0], figure.x_range[1]),
            (figure.y_range[0], figure.y_range[1]),
        )
    }
}

/// Issue the draw calls for a chain, in chain order.
pub fn draw_chain<S: Surface + ?Sized>(
    surface: &mut S,
    chain: &[ChainSegment],
    figure: &FigureConfig,
) -> Result<(), RenderError> {
    let (x_range, y_range) = axis_limits(chain, figure);
    surface.set_axis_limits(x_range, y_range)?;

    surface.draw_line(Point2D::new(x_range.0, 0.0), Point2D::new(x_range.1, 0.0), &AXIS_STYLE)?;
    surface.draw_line(Point2D::new(0.0, y_range.0), Point2D::new(0.0, y_range.1), &AXIS_STYLE)?;

    for segment in chain {
        surface.draw_circle(segment.center, segment.radius, &CIRCLE_STYLE)?;
        surface.draw_line(segment.center, segment.endpoint, &VECTOR_STYLE)?;
        surface.draw_point(segment.endpoint, &MARKER_STYLE)?;
    }
    debug!(segments = chain.len(), ?x_range, ?y_range, "drew chain");
    Ok(())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Html,
    Svg,
    Png,
}

impl OutputFormat {
    pub fn from_path(path: &Path) -> Option<OutputFormat> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "html" | "htm" => Some(OutputFormat::Html),
            "svg" => Some(OutputFormat::Svg),
            "png" => Some(OutputFormat::Png),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Html => "html",
            OutputFormat::Svg => "svg",
            OutputFormat::Png => "png",
        }
    }
}

pub fn surface_for(format: OutputFormat, figure: &FigureConfig) -> Box<dyn Surface> {
    match format {
        OutputFormat::Html => Box::new(HtmlSurface::new(figure)),
        OutputFormat::Svg => Box::new(SvgSurface::new(figure)),
        OutputFormat::Png => Box::new(PlotSurface::new(figure)),
    }
}
