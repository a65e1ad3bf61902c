// SVG track map with problem markers

use std::fmt::Write;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::{
    analysis::{ProblemPoint, Severity},
    telemetry::TrackPoint,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackMapConfig {
    /// Canvas dimensions (width, height) in pixels
    pub canvas_size: (u32, u32),
    /// Empty border kept on every side of the canvas
    pub padding: f64,
    pub stroke_width: f64,
    pub marker_radius: f64,
}

impl Default for TrackMapConfig {
    fn default() -> Self {
        Self {
            canvas_size: (800, 500),
            padding: 40.,
            stroke_width: 2.5,
            marker_radius: 8.,
        }
    }
}

fn severity_color(severity: Severity) -> &'static str {
    match severity {
        Severity::Low => "#ffd166",
        Severity::Medium => "#ef476f",
        Severity::High => "#d90429",
    }
}

/// Min-max bounds of one axis of the polyline.
#[derive(Debug, Clone, Copy)]
struct Bounds {
    min: f64,
    max: f64,
}

impl Bounds {
    fn of(values: impl Iterator<Item = f64>) -> Self {
        values.fold(
            Self {
                min: f64::INFINITY,
                max: f64::NEG_INFINITY,
            },
            |b, v| Self {
                min: b.min.min(v),
                max: b.max.max(v),
            },
        )
    }

    /// Maps `v` into `[offset, offset + span]`, centering flat axes.
    fn scale(&self, v: f64, offset: f64, span: f64) -> f64 {
        let range = self.max - self.min;
        if range > 0. {
            (v - self.min) / range * span + offset
        } else {
            offset + span / 2.
        }
    }
}

pub struct TrackMapRenderer {
    config: TrackMapConfig,
}

impl Default for TrackMapRenderer {
    fn default() -> Self {
        Self::with_config(TrackMapConfig::default())
    }
}

impl TrackMapRenderer {
    pub fn with_config(config: TrackMapConfig) -> Self {
        Self { config }
    }

    fn inner_size(&self) -> (f64, f64) {
        let (width, height) = self.config.canvas_size;
        (
            (width as f64 - 2. * self.config.padding).max(0.),
            (height as f64 - 2. * self.config.padding).max(0.),
        )
    }

    /// Track coordinates rescaled per axis onto the padded canvas.
    pub fn display_points(&self, track_points: &[TrackPoint]) -> Vec<(f64, f64)> {
        let finite = track_points
            .iter()
            .filter(|(x, y)| x.is_finite() && y.is_finite())
            .copied()
            .collect::<Vec<_>>();
        if finite.len() != track_points.len() {
            warn!(
                "Skipping {} track points with non-finite coordinates",
                track_points.len() - finite.len()
            );
        }
        let x_bounds = Bounds::of(finite.iter().map(|p| p.0));
        let y_bounds = Bounds::of(finite.iter().map(|p| p.1));
        let (inner_w, inner_h) = self.inner_size();
        let padding = self.config.padding;
        finite
            .iter()
            .map(|(x, y)| {
                (
                    x_bounds.scale(*x, padding, inner_w),
                    y_bounds.scale(*y, padding, inner_h),
                )
            })
            .collect()
    }

    /// Problem positions are already in percent space and map straight onto
    /// the padded canvas.
    fn marker_position(&self, problem: &ProblemPoint) -> (f64, f64) {
        let (inner_w, inner_h) = self.inner_size();
        (
            self.config.padding + problem.position.0 / 100. * inner_w,
            self.config.padding + problem.position.1 / 100. * inner_h,
        )
    }

    pub fn render(&self, track_points: &[TrackPoint], problems: &[ProblemPoint]) -> String {
        let (width, height) = self.config.canvas_size;
        let mut svg = String::with_capacity(1024 + track_points.len() * 20 + problems.len() * 160);
        let _ = write!(
            svg,
            r##"<svg width="{w}" height="{h}" xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {w} {h}">
  <defs>
    <style>
      .track-shadow {{ stroke: rgba(255,255,255,0.1); stroke-width: {shadow:.2}; fill: none; stroke-linecap: round; }}
      .track-line {{ stroke: #ffffff; stroke-width: {stroke:.2}; fill: none; stroke-linecap: round; stroke-linejoin: round; }}
      .problem {{ stroke: #000; stroke-width: 1; }}
    </style>
  </defs>
  <rect width="100%" height="100%" fill="#111" />"##,
            w = width,
            h = height,
            shadow = self.config.stroke_width * 2.4,
            stroke = self.config.stroke_width,
        );

        let points = self.display_points(track_points);
        if points.len() >= 2 {
            let path = points
                .iter()
                .enumerate()
                .map(|(i, (x, y))| format!("{} {:.2},{:.2}", if i == 0 { "M" } else { "L" }, x, y))
                .collect::<Vec<_>>()
                .join(" ");
            let _ = write!(svg, "\n  <path class=\"track-shadow\" d=\"{}\" />", path);
            let _ = write!(svg, "\n  <path class=\"track-line\" d=\"{}\" />", path);
        } else {
            warn!("Not enough track points to draw the track line");
            let _ = write!(
                svg,
                "\n  <text x=\"{:.2}\" y=\"{:.2}\" fill=\"#aaa\" text-anchor=\"middle\">No valid track data available</text>",
                width as f64 / 2.,
                height as f64 / 2.
            );
        }

        for problem in problems {
            let (cx, cy) = self.marker_position(problem);
            let _ = write!(
                svg,
                "\n  <circle class=\"problem\" cx=\"{:.2}\" cy=\"{:.2}\" r=\"{:.1}\" fill=\"{}\"><title>{}</title></circle>",
                cx,
                cy,
                self.config.marker_radius,
                severity_color(problem.severity),
                escape(&problem.description)
            );
        }

        svg.push_str("\n</svg>\n");
        debug!(
            "Rendered track map with {} points and {} problems",
            points.len(),
            problems.len()
        );
        svg
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
