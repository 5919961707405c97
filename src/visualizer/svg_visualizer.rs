use std::fmt::Write;
use std::fs;
use std::path::PathBuf;

use tracing::info;

use crate::config::FigureConfig;
use crate::epicycle::Point2D;
use crate::error::RenderError;
use crate::visualizer::path_util::{circle_path, line_path, svg_path_data};
use crate::visualizer::{escape_xml, grid_lines, Scene, Shape, Style, Surface, Viewport, GRID_STYLE};

/// Writes the figure as an SVG document.
pub struct SvgSurface {
    file_name: PathBuf,
    width: u32,
    height: u32,
    title: String,
    x_label: String,
    y_label: String,
    scene: Scene,
}

fn stroke_attrs(style: &Style) -> String {
    let mut attrs = format!(
        "fill=\"none\" stroke=\"{}\" stroke-width=\"{}\"",
        style.color.css(),
        style.width
    );
    if style.dashed {
        attrs.push_str(" stroke-dasharray=\"6 4\"");
    }
    attrs
}

impl SvgSurface {
    pub fn new(figure: &FigureConfig) -> SvgSurface {
        SvgSurface {
            file_name: figure.output.clone(),
            width: figure.width,
            height: figure.height,
            title: figure.title.clone(),
            x_label: figure.x_label.clone(),
            y_label: figure.y_label.clone(),
            scene: Scene::new(figure),
        }
    }

    pub fn content(&self) -> Result<String, RenderError> {
        let (w, h) = (self.width, self.height);
        let viewport = Viewport::new(w, h, self.scene.x_range, self.scene.y_range);

        let mut svg = String::new();
        writeln!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#
        )?;
        writeln!(svg, r#"<rect x="0" y="0" width="{w}" height="{h}" fill="white"/>"#)?;

        for (from, to) in grid_lines(self.scene.x_range, self.scene.y_range) {
            let (x0, y0) = viewport.to_px(from);
            let (x1, y1) = viewport.to_px(to);
            writeln!(
                svg,
                r#"<line class="grid" x1="{x0:.2}" y1="{y0:.2}" x2="{x1:.2}" y2="{y1:.2}" {}/>"#,
                stroke_attrs(&GRID_STYLE)
            )?;
        }

        for shape in &self.scene.shapes {
            match shape {
                Shape::Circle { center, radius, style } => {
                    let path = circle_path(viewport.to_px(*center), viewport.length_px(*radius));
                    writeln!(
                        svg,
                        r#"<path class="circle" d="{}" {}/>"#,
                        svg_path_data(&path),
                        stroke_attrs(style)
                    )?;
                }
                Shape::Line { from, to, style } => {
                    let path = line_path(viewport.to_px(*from), viewport.to_px(*to));
                    writeln!(
                        svg,
                        r#"<path class="line" d="{}" {}/>"#,
                        svg_path_data(&path),
                        stroke_attrs(style)
                    )?;
                }
                Shape::Point { at, style } => {
                    let (x, y) = viewport.to_px(*at);
                    writeln!(
                        svg,
                        r#"<circle class="point" cx="{x:.2}" cy="{y:.2}" r="{}" fill="{}"/>"#,
                        style.width,
                        style.color.css()
                    )?;
                }
            }
        }

        writeln!(
            svg,
            r#"<text x="{}" y="30" text-anchor="middle" font-family="sans-serif" font-size="20">{}</text>"#,
            w / 2,
            escape_xml(&self.title)
        )?;
        writeln!(
            svg,
            r#"<text x="{}" y="{}" text-anchor="middle" font-family="sans-serif" font-size="16">{}</text>"#,
            w / 2,
            h.saturating_sub(20),
            escape_xml(&self.x_label)
        )?;
        writeln!(
            svg,
            r#"<text transform="translate(20 {}) rotate(-90)" text-anchor="middle" font-family="sans-serif" font-size="16">{}</text>"#,
            h / 2,
            escape_xml(&self.y_label)
        )?;
        svg.push_str("</svg>\n");
        Ok(svg)
    }
}

impl Surface for SvgSurface {
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
        fs::write(&self.file_name, self.content()?)?;
        info!("Figure written to {}", self.file_name.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::epicycle::{build_chain, default_components, FrequencyComponent};
    use crate::visualizer::draw_chain;

    #[test]
    fn test_svg_figure_written() {
        let dir = tempfile::tempdir().unwrap();
        let figure = FigureConfig {
            output: dir.path().join("circles.svg"),
            ..FigureConfig::default()
        };
        let chain = build_chain(&default_components());

        let mut surface = SvgSurface::new(&figure);
        draw_chain(&mut surface, &chain, &figure).unwrap();
        surface.show().unwrap();

        let svg = fs::read_to_string(&figure.output).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert_eq!(svg.matches("class=\"circle\"").count(), 5);
        assert_eq!(svg.matches("class=\"point\"").count(), 5);
        assert_eq!(svg.matches("class=\"line\"").count(), 7);
        assert_eq!(svg.matches("stroke-dasharray").count(), 5 + 2);
        assert_eq!(svg.matches("class=\"grid\"").count(), 18);
        assert!(svg.contains(">Imaginary Part</text>"));
    }

    #[test]
    fn test_negative_radius_drawn_as_magnitude() {
        let figure = FigureConfig::default();
        let chain = build_chain(&[FrequencyComponent::new(1.0, -2.0, 0.0)]);
        let mut surface = SvgSurface::new(&figure);
        draw_chain(&mut surface, &chain, &figure).unwrap();

        let mut positive = SvgSurface::new(&figure);
        positive.draw_circle(Point2D::ORIGIN, 2.0, &crate::visualizer::CIRCLE_STYLE).unwrap();
        let expected = svg_path_data(&circle_path(
            Viewport::new(800, 800, (-20.0, 20.0), (-20.0, 20.0)).to_px(Point2D::ORIGIN),
            Viewport::new(800, 800, (-20.0, 20.0), (-20.0, 20.0)).length_px(2.0),
        ));
        assert!(surface.content().unwrap().contains(&expected));
        assert!(positive.content().unwrap().contains(&expected));
    }

    #[test]
    fn test_title_is_escaped() {
        let figure = FigureConfig {
            title: "a < b & c".to_string(),
            ..FigureConfig::default()
        };
        let surface = SvgSurface::new(&figure);
        assert!(surface.content().unwrap().contains(">a &lt; b &amp; c</text>"));
    }
}
