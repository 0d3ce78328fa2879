//! Closed parametric track that customers travel along.

use std::f64::consts::TAU;

use churn_defence_core::{CanvasSize, Point};

const SAMPLE_COUNT: usize = 360;
const HORIZONTAL_RADIUS: f64 = 0.35;
const VERTICAL_RADIUS: f64 = 0.32;
const LOBE_AMPLITUDE: f64 = 0.15;
const LOBE_COUNT: f64 = 3.0;

/// Half of the drawn track width; towers must stay outside this band.
pub const TRACK_HALF_WIDTH: f64 = 20.0;

/// Closed curve fitted to the canvas, with a precomputed sample table for
/// proximity queries.
#[derive(Clone, Debug)]
pub struct TrackPath {
    canvas: CanvasSize,
    samples: Vec<Point>,
}

impl TrackPath {
    /// Creates a track fitted to the provided canvas.
    #[must_use]
    pub fn new(canvas: CanvasSize) -> Self {
        let mut path = Self {
            canvas,
            samples: Vec::with_capacity(SAMPLE_COUNT),
        };
        path.regenerate();
        path
    }

    /// Refits the track to a new canvas size.
    pub fn resize(&mut self, canvas: CanvasSize) {
        self.canvas = canvas;
        self.regenerate();
    }

    fn regenerate(&mut self) {
        self.samples.clear();
        for index in 0..SAMPLE_COUNT {
            let t = index as f64 / SAMPLE_COUNT as f64;
            self.samples.push(self.position_at(t));
        }
    }

    /// Canvas the track is fitted to.
    #[must_use]
    pub fn canvas(&self) -> CanvasSize {
        self.canvas
    }

    /// Precomputed points along the track, in increasing parameter order.
    #[must_use]
    pub fn samples(&self) -> &[Point] {
        &self.samples
    }

    /// Converts a track position into canvas coordinates.
    ///
    /// The parameter wraps, so `t` and `t + 1.0` map to the same point.
    #[must_use]
    pub fn position_at(&self, t: f64) -> Point {
        let theta = TAU * t.rem_euclid(1.0);
        let radius = 1.0 + LOBE_AMPLITUDE * (LOBE_COUNT * theta).sin();
        let center_x = self.canvas.width() / 2.0;
        let center_y = self.canvas.height() / 2.0;
        Point::new(
            center_x + HORIZONTAL_RADIUS * self.canvas.width() * radius * theta.cos(),
            center_y + VERTICAL_RADIUS * self.canvas.height() * radius * theta.sin(),
        )
    }

    /// Shortest distance from the point to the sampled track polyline.
    #[must_use]
    pub fn distance_to(&self, point: Point) -> f64 {
        let count = self.samples.len();
        (0..count)
            .map(|index| {
                let start = self.samples[index];
                let end = self.samples[(index + 1) % count];
                distance_to_segment(point, start, end)
            })
            .fold(f64::INFINITY, f64::min)
    }

    /// Reports whether the point lies within `threshold` of the track's centre line.
    #[must_use]
    pub fn is_near_center(&self, point: Point, threshold: f64) -> bool {
        self.distance_to(point) <= threshold
    }

    /// Reports whether a square footprint of side `size` centred at `point`
    /// fits inside the canvas without touching the track.
    #[must_use]
    pub fn is_valid_placement(&self, point: Point, size: f64) -> bool {
        let half = size / 2.0;
        self.canvas.contains(point, half) && !self.is_near_center(point, TRACK_HALF_WIDTH + half)
    }
}

fn distance_to_segment(point: Point, start: Point, end: Point) -> f64 {
    let dx = end.x() - start.x();
    let dy = end.y() - start.y();
    let length_sq = dx * dx + dy * dy;
    if length_sq <= f64::EPSILON {
        return point.distance_to(start);
    }

    let projection = ((point.x() - start.x()) * dx + (point.y() - start.y()) * dy) / length_sq;
    let t = projection.clamp(0.0, 1.0);
    point.distance_to(Point::new(start.x() + t * dx, start.y() + t * dy))
}
