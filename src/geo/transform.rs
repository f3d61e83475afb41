// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Latitude/longitude to image position transforms
//!
//! Two reference points give two independent 1-D linear maps (lon to x and
//! lat to y). Three points give a plane fit per image axis. With more points
//! the three closest to the query position are used, which is a local
//! interpolation rather than a global least squares fit.

use super::GeoRefPoint;

/// Map a geographic position to image coordinates.
///
/// Returns `None` with fewer than two reference points.
pub fn lat_lon_to_image_pos(points: &[GeoRefPoint], lat: f64, lon: f64) -> Option<(f64, f64)> {
    match points {
        [] | [_] => None,
        [p1, p2] => Some(convert_with_2_samples(lat, lon, p1, p2)),
        [p1, p2, p3] => Some(convert_with_3_samples(lat, lon, p1, p2, p3)),
        _ => {
            let [p1, p2, p3] = nearest_three(points, lat, lon);
            Some(convert_with_3_samples(lat, lon, p1, p2, p3))
        }
    }
}

/// The three reference points closest to `(lat, lon)`, ties in list order
fn nearest_three(points: &[GeoRefPoint], lat: f64, lon: f64) -> [&GeoRefPoint; 3] {
    let mut sorted: Vec<&GeoRefPoint> = points.iter().collect();
    sorted.sort_by(|a, b| {
        a.geo_distance_sq(lat, lon)
            .partial_cmp(&b.geo_distance_sq(lat, lon))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    [sorted[0], sorted[1], sorted[2]]
}

pub fn convert_with_2_samples(lat: f64, lon: f64, p1: &GeoRefPoint, p2: &GeoRefPoint) -> (f64, f64) {
    let x = interpolate(lon, p1.lon(), p2.lon(), p1.x_image(), p2.x_image());
    let y = interpolate(lat, p1.lat(), p2.lat(), p1.y_image(), p2.y_image());
    (x, y)
}

/// 1-D affine map through `(g1, i1)` and `(g2, i2)`. An axis without
/// geographic extent maps everything to `i1`.
fn interpolate(g: f64, g1: f64, g2: f64, i1: f64, i2: f64) -> f64 {
    let dg = g2 - g1;
    if dg == 0.0 {
        return i1;
    }
    (g - g1) / dg * (i2 - i1) + i1
}

pub fn convert_with_3_samples(
    lat: f64,
    lon: f64,
    p1: &GeoRefPoint,
    p2: &GeoRefPoint,
    p3: &GeoRefPoint,
) -> (f64, f64) {
    let x = solve_plane(
        [p1.lat(), p1.lon(), p1.x_image()],
        [p2.lat(), p2.lon(), p2.x_image()],
        [p3.lat(), p3.lon(), p3.x_image()],
        lat,
        lon,
    );
    let y = solve_plane(
        [p1.lat(), p1.lon(), p1.y_image()],
        [p2.lat(), p2.lon(), p2.y_image()],
        [p3.lat(), p3.lon(), p3.y_image()],
        lat,
        lon,
    );
    (x, y)
}

/// Fit the plane `n·v = d` through three samples and solve for the third
/// coordinate at `(a, b)`
fn solve_plane(v1: [f64; 3], v2: [f64; 3], v3: [f64; 3], a: f64, b: f64) -> f64 {
    let e1 = sub(v2, v1);
    let e2 = sub(v3, v1);
    let n = cross(e1, e2);
    let d = dot(v1, n);
    (d - n[0] * a - n[1] * b) / n[2]
}

fn sub(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}
