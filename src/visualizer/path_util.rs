use lyon_path::iterator::*;
use lyon_path::math::{point, vector, Point};
use lyon_path::{Path, PathEvent};

// Control point distance for a quarter circle drawn as one cubic bezier.
const KAPPA: f32 = 0.552_284_8;

/// A closed circle made of four cubic bezier quarters.
pub fn circle_path(center: (f64, f64), radius: f64) -> Path {
    let c = point(center.0 as f32, center.1 as f32);
    let r = radius.abs() as f32;
    let k = r * KAPPA;

    let mut builder = Path::builder();
    builder.begin(c + vector(r, 0.0));
    builder.cubic_bezier_to(c + vector(r, k), c + vector(k, r), c + vector(0.0, r));
    builder.cubic_bezier_to(c + vector(-k, r), c + vector(-r, k), c + vector(-r, 0.0));
    builder.cubic_bezier_to(c + vector(-r, -k), c + vector(-k, -r), c + vector(0.0, -r));
    builder.cubic_bezier_to(c + vector(k, -r), c + vector(r, -k), c + vector(r, 0.0));
    builder.end(true);
    builder.build()
}

pub fn line_path(from: (f64, f64), to: (f64, f64)) -> Path {
    let mut builder = Path::builder();
    builder.begin(point(from.0 as f32, from.1 as f32));
    builder.line_to(point(to.0 as f32, to.1 as f32));
    builder.end(false);
    builder.build()
}

/// Serialize a path to the `d` attribute of an SVG `<path>`.
pub fn svg_path_data(path: &Path) -> String {
    let mut d = String::new();
    let fmt = |p: Point| format!("{:.2} {:.2}", p.x, p.y);
    for evt in path.iter() {
        let cmd = match evt {
            PathEvent::Begin { at } => format!("M {}", fmt(at)),
            PathEvent::Line { to, .. } => format!("L {}", fmt(to)),
            PathEvent::Quadratic { ctrl, to, .. } => format!("Q {} {}", fmt(ctrl), fmt(to)),
            PathEvent::Cubic { ctrl1, ctrl2, to, .. } => {
                format!("C {} {} {}", fmt(ctrl1), fmt(ctrl2), fmt(to))
            }
            PathEvent::End { close: true, .. } => "Z".to_string(),
            PathEvent::End { close: false, .. } => continue,
        };
        if !d.is_empty() {
            d.push(' ');
        }
        d.push_str(&cmd);
    }
    d
}

/// The path approximated by straight segments, as a polyline.
///
/// Closed sub-paths repeat their first point at the end.
pub fn flatten(path: &Path, tolerance: f32) -> Vec<(f64, f64)> {
    let mut points = Vec::new();
    for evt in path.iter().flattened(tolerance) {
        match evt {
            PathEvent::Begin { at } => points.push((at.x as f64, at.y as f64)),
            PathEvent::Line { to, .. } => points.push((to.x as f64, to.y as f64)),
            PathEvent::End { last, first, close } => {
                if close && last != first {
                    points.push((first.x as f64, first.y as f64));
                }
            }
            // Flattening only yields lines.
            PathEvent::Quadratic { .. } | PathEvent::Cubic { .. } => {}
        }
    }
    points
}

pub fn compute_path_length(path: &Path, tolerance: f32) -> f32 {
    let mut total_length: f32 = 0.0;
    for evt in path.iter().flattened(tolerance) {
        match evt {
            PathEvent::Line { from, to } => total_length += (to - from).length(),
            PathEvent::End { last, first, close } => {
                if close {
                    total_length += (first - last).length();
                }
            }
            _ => {}
        }
    }
    total_length
}

/// Split a polyline into the "on" runs of a dash pattern.
pub fn dash_runs(points: &[(f64, f64)], dash: f64, gap: f64) -> Vec<Vec<(f64, f64)>> {
    let mut runs = Vec::new();
    if points.len() < 2 || dash <= 0.0 {
        return runs;
    }

    let period = dash + gap.max(0.0);
    let mut offset = 0.0_f64; // position inside the current period
    let mut current = vec![points[0]];

    for pair in points.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let len = ((b.0 - a.0).powi(2) + (b.1 - a.1).powi(2)).sqrt();
        let mut walked = 0.0;
        while walked < len {
            let on = offset < dash;
            let boundary = if on { dash } else { period };
            let step = (boundary - offset).min(len - walked);
            walked += step;
            offset += step;
            let t = walked / len;
            let p = (a.0 + (b.0 - a.0) * t, a.1 + (b.1 - a.1) * t);
            if on {
                current.push(p);
            }
            if offset >= boundary {
                if on {
                    runs.push(std::mem::take(&mut current));
                } else {
                    offset = 0.0;
                    current.push(p);
                }
            }
        }
    }
    if current.len() > 1 {
        runs.push(current);
    }
    runs
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_circle_length() {
        let path = circle_path((3.0, -1.0), 5.0);
        let length = compute_path_length(&path, 0.001) as f64;
        assert!((length - 2.0 * PI * 5.0).abs() < 0.05, "length {length}");
    }

    #[test]
    fn test_flattened_circle_stays_on_radius() {
        let points = flatten(&circle_path((0.0, 0.0), 2.0), 0.001);
        assert!(points.len() > 8);
        assert_eq!(points.first(), points.last());
        for (x, y) in points {
            assert!(((x * x + y * y).sqrt() - 2.0).abs() < 0.01);
        }
    }

    #[test]
    fn test_svg_path_data() {
        assert_eq!(
            svg_path_data(&line_path((0.0, 1.0), (2.5, 3.0))),
            "M 0.00 1.00 L 2.50 3.00"
        );
        let d = svg_path_data(&circle_path((10.0, 10.0), 1.0));
        assert!(d.starts_with("M 11.00 10.00 C"));
        assert_eq!(d.matches('C').count(), 4);
        assert!(d.ends_with('Z'));
    }

    #[test]
    fn test_dash_runs() {
        let runs = dash_runs(&[(0.0, 0.0), (10.0, 0.0)], 2.0, 1.0);
        // dashes at [0,2], [3,5], [6,8], [9,10]
        assert_eq!(runs.len(), 4);
        assert_eq!(runs[0], vec![(0.0, 0.0), (2.0, 0.0)]);
        assert_eq!(runs[1], vec![(3.0, 0.0), (5.0, 0.0)]);
        assert_eq!(runs[3], vec![(9.0, 0.0), (10.0, 0.0)]);
    }

    #[test]
    fn test_dash_runs_degenerate() {
        assert!(dash_runs(&[(0.0, 0.0)], 1.0, 1.0).is_empty());
        assert!(dash_runs(&[(0.0, 0.0), (1.0, 0.0)], 0.0, 1.0).is_empty());
    }
}
