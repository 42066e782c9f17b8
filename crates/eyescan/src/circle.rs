//! Minimum enclosing circle of a contour.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Relative slack when testing whether a point lies inside a circle.
const CONTAIN_EPS: f64 = 1e-7;

/// Circle in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Circle {
    pub cx: f64,
    pub cy: f64,
    pub radius: f64,
}

impl Circle {
    fn from_point(p: [f64; 2]) -> Self {
        Self {
            cx: p[0],
            cy: p[1],
            radius: 0.0,
        }
    }

    fn from_diameter(a: [f64; 2], b: [f64; 2]) -> Self {
        let cx = 0.5 * (a[0] + b[0]);
        let cy = 0.5 * (a[1] + b[1]);
        Self {
            cx,
            cy,
            radius: dist([cx, cy], a).max(dist([cx, cy], b)),
        }
    }

    /// Circumcircle of three points; for collinear input, the circle on the
    /// farthest pair.
    fn from_three(a: [f64; 2], b: [f64; 2], c: [f64; 2]) -> Self {
        let bx = b[0] - a[0];
        let by = b[1] - a[1];
        let cx = c[0] - a[0];
        let cy = c[1] - a[1];
        let d = 2.0 * (bx * cy - by * cx);
        if d.abs() < 1e-12 {
            let pairs = [(a, b), (a, c), (b, c)];
            return pairs
                .iter()
                .map(|&(p, q)| Self::from_diameter(p, q))
                .fold(Self::from_point(a), |best, cand| {
                    if cand.radius > best.radius {
                        cand
                    } else {
                        best
                    }
                });
        }
        let b2 = bx * bx + by * by;
        let c2 = cx * cx + cy * cy;
        let ux = (cy * b2 - by * c2) / d;
        let uy = (bx * c2 - cx * b2) / d;
        let center = [a[0] + ux, a[1] + uy];
        Self {
            cx: center[0],
            cy: center[1],
            radius: dist(center, a).max(dist(center, b)).max(dist(center, c)),
        }
    }

    /// Returns `true` when `p` lies inside or on the circle (with slack).
    pub fn contains(&self, p: [f64; 2]) -> bool {
        dist([self.cx, self.cy], p) <= self.radius * (1.0 + CONTAIN_EPS) + CONTAIN_EPS
    }

    pub fn diameter(&self) -> f64 {
        2.0 * self.radius
    }
}

#[inline]
fn dist(a: [f64; 2], b: [f64; 2]) -> f64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    (dx * dx + dy * dy).sqrt()
}

/// Smallest circle containing every point (randomized incremental Welzl).
///
/// Input order is shuffled with a seeded RNG so runs are reproducible.
/// Returns `None` for an empty point set.
pub fn min_enclosing_circle(points: &[[f64; 2]], seed: u64) -> Option<Circle> {
    let first = *points.first()?;
    let mut pts = points.to_vec();
    let mut rng = StdRng::seed_from_u64(seed);
    pts.shuffle(&mut rng);

    let mut circle = Circle::from_point(first);
    for i in 0..pts.len() {
        if circle.contains(pts[i]) {
            continue;
        }
        circle = Circle::from_point(pts[i]);
        for j in 0..i {
            if circle.contains(pts[j]) {
                continue;
            }
            circle = Circle::from_diameter(pts[i], pts[j]);
            for k in 0..j {
                if !circle.contains(pts[k]) {
                    circle = Circle::from_three(pts[i], pts[j], pts[k]);
                }
            }
        }
    }
    Some(circle)
}
