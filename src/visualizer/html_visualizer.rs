use std::fs;
use std::path::PathBuf;

use serde::Serialize;
use tracing::info;

use crate::config::FigureConfig;
use crate::epicycle::Point2D;
use crate::error::RenderError;
use crate::visualizer::{escape_xml, grid_lines, Scene, Shape, Style, Surface, Viewport, GRID_STYLE};

/// Writes the figure as a standalone page drawing on a `<canvas>`.
pub struct HtmlSurface {
    file_name: PathBuf,
    width: u32,
    height: u32,
    title: String,
    x_label: String,
    y_label: String,
    scene: Scene,
}

/// One canvas drawing command, in pixels.
#[derive(Debug, Serialize)]
#[serde(tag = "k", rename_all = "lowercase")]
enum CanvasItem {
    Grid { x: f64, y: f64, x1: f64, y1: f64, #[serde(flatten)] style: CanvasStyle },
    Circle { x: f64, y: f64, r: f64, #[serde(flatten)] style: CanvasStyle },
    Line { x: f64, y: f64, x1: f64, y1: f64, #[serde(flatten)] style: CanvasStyle },
    Point { x: f64, y: f64, #[serde(flatten)] style: CanvasStyle },
}

#[derive(Debug, Serialize)]
struct CanvasStyle {
    c: String,
    w: f64,
    d: bool,
    f: bool,
}

impl From<&Style> for CanvasStyle {
    fn from(s: &Style) -> Self {
        CanvasStyle {
            c: s.color.css(),
            w: s.width,
            d: s.dashed,
            f: s.filled,
        }
    }
}

fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

fn px(viewport: &Viewport, p: Point2D) -> (f64, f64) {
    let (x, y) = viewport.to_px(p);
    (round3(x), round3(y))
}

/// JSON safe to place inside a `<script>` element.
fn script_json<T: Serialize + ?Sized>(value: &T) -> Result<String, RenderError> {
    Ok(serde_json::to_string(value)?.replace("</", "<\\/"))
}

impl HtmlSurface {
    pub fn new(figure: &FigureConfig) -> HtmlSurface {
        HtmlSurface {
            file_name: figure.output.clone(),
            width: figure.width,
            height: figure.height,
            title: figure.title.clone(),
            x_label: figure.x_label.clone(),
            y_label: figure.y_label.clone(),
            scene: Scene::new(figure),
        }
    }

    fn items(&self) -> Vec<CanvasItem> {
        let viewport = Viewport::new(self.width, self.height, self.scene.x_range, self.scene.y_range);
        let grid = grid_lines(self.scene.x_range, self.scene.y_range).into_iter().map(|(from, to)| {
            let ((x, y), (x1, y1)) = (px(&viewport, from), px(&viewport, to));
            CanvasItem::Grid { x, y, x1, y1, style: (&GRID_STYLE).into() }
        });
        let shapes = self.scene.shapes.iter().map(|shape| match shape {
            Shape::Circle { center, radius, style } => {
                let (x, y) = px(&viewport, *center);
                CanvasItem::Circle { x, y, r: round3(viewport.length_px(*radius)), style: style.into() }
            }
            Shape::Line { from, to, style } => {
                let ((x, y), (x1, y1)) = (px(&viewport, *from), px(&viewport, *to));
                CanvasItem::Line { x, y, x1, y1, style: style.into() }
            }
            Shape::Point { at, style } => {
                let (x, y) = px(&viewport, *at);
                CanvasItem::Point { x, y, style: style.into() }
            }
        });
        grid.chain(shapes).collect()
    }

    pub fn content(&self) -> Result<String, RenderError> {
        Ok(format!("<html>
<head>
    <meta charset=\"utf-8\">
    <title>{page_title}</title>
</head>
<body>
<canvas id=\"fourier_canvas\" width=\"{width}\" height=\"{height}\"></canvas>
<script>
const SHAPES = {shapes};
const TITLE = {title};
const X_LABEL = {x_label};
const Y_LABEL = {y_label};

function draw_shape(ctx, s) {{
    ctx.beginPath();
    ctx.setLineDash(s.d ? [6, 4] : []);
    ctx.lineWidth = s.w;
    ctx.strokeStyle = s.c;
    ctx.fillStyle = s.c;
    if (s.k === 'circle') {{
        ctx.arc(s.x, s.y, s.r, 0, Math.PI * 2, true);
        ctx.stroke();
    }} else if (s.k === 'line' || s.k === 'grid') {{
        ctx.moveTo(s.x, s.y);
        ctx.lineTo(s.x1, s.y1);
        ctx.stroke();
    }} else if (s.k === 'point') {{
        ctx.arc(s.x, s.y, s.w, 0, Math.PI * 2, true);
        ctx.fill();
    }}
}}

function draw_labels(ctx, canvas) {{
    ctx.setLineDash([]);
    ctx.fillStyle = 'black';
    ctx.textAlign = 'center';
    ctx.font = '20px sans-serif';
    ctx.fillText(TITLE, canvas.width / 2, 30);
    ctx.font = '16px sans-serif';
    ctx.fillText(X_LABEL, canvas.width / 2, canvas.height - 20);
    ctx.save();
    ctx.translate(20, canvas.height / 2);
    ctx.rotate(-Math.PI / 2);
    ctx.fillText(Y_LABEL, 0, 0);
    ctx.restore();
}}

window.onload = function() {{
    let canvas = document.getElementById(\"fourier_canvas\");
    let context = canvas.getContext('2d');
    context.clearRect(0, 0, canvas.width, canvas.height);
    for (let i = 0; i < SHAPES.length; i++) {{
        draw_shape(context, SHAPES[i]);
    }}
    draw_labels(context, canvas);
}};
</script>
</body>
</html>
",
            page_title = escape_xml(&self.title),
            width = self.width,
            height = self.height,
            shapes = script_json(&self.items())?,
            title = script_json(&self.title)?,
            x_label = script_json(&self.x_label)?,
            y_label = script_json(&self.y_label)?,
        ))
    }
}

impl Surface for HtmlSurface {
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
    use crate::epicycle::{build_chain, default_components};
    use crate::visualizer::draw_chain;

    fn shapes_of(html: &str) -> serde_json::Value {
        let start = html.find("const SHAPES = ").unwrap() + "const SHAPES = ".len();
        let end = start + html[start..].find(";\n").unwrap();
        serde_json::from_str(&html[start..end]).unwrap()
    }

    fn count_kind(shapes: &serde_json::Value, kind: &str) -> usize {
        shapes.as_array().unwrap().iter().filter(|s| s["k"] == kind).count()
    }

    #[test]
    fn test_html_figure_written() {
        let dir = tempfile::tempdir().unwrap();
        let figure = FigureConfig {
            output: dir.path().join("circles.html"),
            ..FigureConfig::default()
        };
        let chain = build_chain(&default_components());

        let mut surface = HtmlSurface::new(&figure);
        draw_chain(&mut surface, &chain, &figure).unwrap();
        surface.show().unwrap();

        let html = fs::read_to_string(&figure.output).unwrap();
        assert!(html.contains("<title>Frequency Circles as Vectors</title>"));
        assert!(html.contains("const X_LABEL = \"Real Part\";"));
        let shapes = shapes_of(&html);
        assert_eq!(count_kind(&shapes, "circle"), 5);
        assert_eq!(count_kind(&shapes, "point"), 5);
        // five vectors plus the two axis lines
        assert_eq!(count_kind(&shapes, "line"), 7);
        // ticks every 5 units from -20 to 20 on both axes
        assert_eq!(count_kind(&shapes, "grid"), 18);
    }

    #[test]
    fn test_origin_maps_to_canvas_center() {
        let figure = FigureConfig {
            width: 400,
            height: 400,
            ..FigureConfig::default()
        };
        let mut surface = HtmlSurface::new(&figure);
        surface.draw_point(Point2D::ORIGIN, &crate::visualizer::MARKER_STYLE).unwrap();
        let shapes = shapes_of(&surface.content().unwrap());

        let vp = Viewport::new(400, 400, (-20.0, 20.0), (-20.0, 20.0));
        let (x, y) = vp.to_px(Point2D::ORIGIN);
        let point = shapes.as_array().unwrap().iter().find(|s| s["k"] == "point").unwrap();
        assert!((point["x"].as_f64().unwrap() - x).abs() < 1e-3);
        assert!((point["y"].as_f64().unwrap() - y).abs() < 1e-3);
    }

    #[test]
    fn test_markup_in_labels_stays_inside_script() {
        let figure = FigureConfig {
            title: "</script><script>alert(1)</script>".to_string(),
            x_label: "a \"quoted\" `label` ${x}".to_string(),
            y_label: "line\nbreak & <b>".to_string(),
            ..FigureConfig::default()
        };
        let html = HtmlSurface::new(&figure).content().unwrap();

        assert_eq!(html.matches("</script>").count(), 1);
        assert!(html.contains(r#"const TITLE = "<\/script><script>alert(1)<\/script>";"#));
        assert!(html.contains("<title>&lt;/script&gt;&lt;script&gt;alert(1)&lt;/script&gt;</title>"));
        assert!(html.contains(r#"const X_LABEL = "a \"quoted\" `label` ${x}";"#));
        assert!(html.contains(r#"const Y_LABEL = "line\nbreak & <b>";"#));
    }

    #[test]
    fn test_show_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let figure = FigureConfig {
            output: dir.path().join("missing").join("circles.html"),
            ..FigureConfig::default()
        };
        let mut surface = HtmlSurface::new(&figure);
        assert!(matches!(surface.show(), Err(RenderError::Io(_))));
    }
}
