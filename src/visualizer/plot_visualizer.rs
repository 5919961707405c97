use std::path::PathBuf;

use plotters::prelude::*;
use tracing::{debug, info};

use crate::config::FigureConfig;
use crate::epicycle::Point2D;
use crate::error::RenderError;
use crate::visualizer::path_util::{circle_path, compute_path_length, dash_runs, flatten};
use crate::visualizer::{Scene, Shape, Style, Surface};

/// Flattening error allowed for circle outlines, in pixels.
const FLATTEN_TOLERANCE_PX: f64 = 0.25;
/// Dashes per full circle.
const DASHES_PER_CIRCLE: f64 = 48.0;
const TITLE_FONT: i32 = 28;
const LABEL_FONT: i32 = 18;
const MARGIN: u32 = 20;
const X_LABEL_AREA: u32 = 50;
const Y_LABEL_AREA: u32 = 60;

/// Renders the figure to a PNG with `plotters`.
pub struct PlotSurface {
    file_name: PathBuf,
    width: u32,
    height: u32,
    title: String,
    x_label: String,
    y_label: String,
    scene: Scene,
}

fn rgb(style: &Style) -> RGBColor {
    RGBColor(style.color.0, style.color.1, style.color.2)
}

fn shape_style(style: &Style) -> ShapeStyle {
    let color = rgb(style);
    if style.filled {
        color.filled()
    } else {
        color.stroke_width(style.width.round().max(1.0) as u32)
    }
}

/// Polylines for a circle outline; one per dash when the style is dashed.
///
/// `tolerance` is in data units.
fn circle_runs(center: Point2D, radius: f64, style: &Style, tolerance: f32) -> Vec<Vec<(f64, f64)>> {
    let path = circle_path((center.x, center.y), radius);
    let points = flatten(&path, tolerance);
    if !style.dashed {
        return vec![points];
    }
    let unit = compute_path_length(&path, tolerance) as f64 / DASHES_PER_CIRCLE;
    dash_runs(&points, unit * 0.6, unit * 0.4)
}

fn line_runs(from: Point2D, to: Point2D, style: &Style, span: f64) -> Vec<Vec<(f64, f64)>> {
    let points = vec![(from.x, from.y), (to.x, to.y)];
    if !style.dashed {
        return vec![points];
    }
    let unit = span / 80.0;
    dash_runs(&points, unit * 0.6, unit * 0.4)
}

/// Size in pixels of the plotting area left inside a chart area of `dim`.
fn plot_size(dim: (u32, u32)) -> (u32, u32) {
    (
        dim.0.saturating_sub(2 * MARGIN + Y_LABEL_AREA).max(1),
        dim.1.saturating_sub(2 * MARGIN + X_LABEL_AREA).max(1),
    )
}

/// Widen the axis with the coarser scale so one data unit has the same
/// length in pixels on both axes. Both ranges stay centered.
fn equal_aspect(x_range: (f64, f64), y_range: (f64, f64), plot_px: (u32, u32)) -> ((f64, f64), (f64, f64)) {
    let (w, h) = (plot_px.0 as f64, plot_px.1 as f64);
    let (span_x, span_y) = (x_range.1 - x_range.0, y_range.1 - y_range.0);
    let scale = (w / span_x).min(h / span_y);
    let widen = |(min, max): (f64, f64), span: f64| {
        let mid = (min + max) / 2.0;
        (mid - span / 2.0, mid + span / 2.0)
    };
    (widen(x_range, w / scale), widen(y_range, h / scale))
}

impl PlotSurface {
    pub fn new(figure: &FigureConfig) -> PlotSurface {
        PlotSurface {
            file_name: figure.output.clone(),
            width: figure.width,
            height: figure.height,
            title: figure.title.clone(),
            x_label: figure.x_label.clone(),
            y_label: figure.y_label.clone(),
            scene: Scene::new(figure),
        }
    }

    /// Every polyline the figure is made of, with its style.
    ///
    /// `px_per_unit` is the chart scale; circles are flattened finely enough
    /// to stay within a fraction of a pixel of the true outline.
    fn polylines(&self, x_range: (f64, f64), y_range: (f64, f64), px_per_unit: f64) -> Vec<(Vec<(f64, f64)>, Style)> {
        let span = (x_range.1 - x_range.0).max(y_range.1 - y_range.0);
        let tolerance = (FLATTEN_TOLERANCE_PX / px_per_unit) as f32;

        let mut out = Vec::new();
        for shape in &self.scene.shapes {
            let (runs, style) = match shape {
                Shape::Circle { center, radius, style } => {
                    (circle_runs(*center, *radius, style, tolerance), *style)
                }
                Shape::Line { from, to, style } => (line_runs(*from, *to, style, span), *style),
                Shape::Point { .. } => continue,
            };
            out.extend(runs.into_iter().map(|run| (run, style)));
        }
        out
    }

    fn render(&self) -> Result<(), RenderError> {
        let root = BitMapBackend::new(&self.file_name, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE).map_err(RenderError::backend)?;
        let area = root
            .titled(&self.title, ("sans-serif", TITLE_FONT as f64).into_font())
            .map_err(RenderError::backend)?;

        let plot_px = plot_size(area.dim_in_pixel());
        let (x_range, y_range) = equal_aspect(self.scene.x_range, self.scene.y_range, plot_px);
        let px_per_unit = plot_px.0 as f64 / (x_range.1 - x_range.0);
        debug!(?x_range, ?y_range, px_per_unit, "PNG chart layout");

        let mut chart = ChartBuilder::on(&area)
            .margin(MARGIN)
            .x_label_area_size(X_LABEL_AREA)
            .y_label_area_size(Y_LABEL_AREA)
            .build_cartesian_2d(x_range.0..x_range.1, y_range.0..y_range.1)
            .map_err(RenderError::backend)?;

        chart
            .configure_mesh()
            .x_desc(self.x_label.as_str())
            .y_desc(self.y_label.as_str())
            .axis_desc_style(("sans-serif", LABEL_FONT))
            .draw()
            .map_err(RenderError::backend)?;

        chart
            .draw_series(
                self.polylines(x_range, y_range, px_per_unit)
                    .into_iter()
                    .map(|(run, style)| PathElement::new(run, shape_style(&style))),
            )
            .map_err(RenderError::backend)?;

        let points = self.scene.shapes.iter().filter_map(|shape| match shape {
            Shape::Point { at, style } => Some(Circle::new(
                (at.x, at.y),
                style.width.round().max(1.0) as u32,
                shape_style(style),
            )),
            _ => None,
        });
        chart.draw_series(points).map_err(RenderError::backend)?;

        root.present().map_err(RenderError::backend)?;
        Ok(())
    }
}

impl Surface for PlotSurface {
    fn set_axis_limits(&mut self, x_range: (f64, f64), y_range: (f64, f64)) -> Result<(), RenderError> {
        self.scene.set_axis_limits(x_range, y_range)
    }

    fn draw_circle(&mut self, center: Point2D, radius: f64, style: &Style) -> Result<(), RenderError> {
        self.scene.push(Shape::Circle { center, radius, style: *style })
    }

    fn draw_line(&mut self, from: Point2D, to: Point2D, style: &Style) -> Result<(), RenderError> {
        self.scene.push(Shape::Line { from, to, style: *style })
    }

    fn draw_point(&mut self, at: Point2D, style: &Style) -> Result<(), RenderError> {
        self.scene.push(Shape::Point { at, style: *style })
    }

    fn show(&mut self) -> Result<(), RenderError> {
        self.render()?;
        info!("Figure written to {}", self.file_name.display());
        Ok(())
    }
}
