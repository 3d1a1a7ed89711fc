use serde::{Deserialize, Serialize};

// ── Compass geometry ────────────────────────────────────────────────
//
// Bearings are compass style: 0° points at +y, 90° at +x, angles grow
// clockwise. Projection therefore uses `x += sin`, `y += cos` and the
// inverse is `atan2(dx, dy)`, not the usual `atan2(dy, dx)`.

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Wraps an angle into `(-180, 180]`.
pub fn normalize_relative(degrees: f64) -> f64 {
    if !degrees.is_finite() {
        return 0.0;
    }
    let wrapped = degrees.rem_euclid(360.0);
    if wrapped > 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

/// Wraps an angle into `[0, 360)`.
pub fn normalize_absolute(degrees: f64) -> f64 {
    if !degrees.is_finite() {
        return 0.0;
    }
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs.
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

pub fn project(origin: Point, bearing_degrees: f64, distance: f64) -> Point {
    let rad = bearing_degrees.to_radians();
    Point {
        x: origin.x + rad.sin() * distance,
        y: origin.y + rad.cos() * distance,
    }
}

pub fn bearing_to(from: Point, to: Point) -> f64 {
    normalize_absolute((to.x - from.x).atan2(to.y - from.y).to_degrees())
}

pub fn distance(a: Point, b: Point) -> f64 {
    (b.x - a.x).hypot(b.y - a.y)
}

/// Signed shortest rotation from `current` to `target`.
pub fn turn_toward(current: f64, target: f64) -> f64 {
    normalize_relative(target - current)
}
