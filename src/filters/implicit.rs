//! Implicit functions sampled by [`SampleFunction`](super::SampleFunction).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Scalar field over 3D space.
pub trait ImplicitFunction: Send + Sync + fmt::Debug {
    fn evaluate(&self, p: [f64; 3]) -> f64;
}

/// `|p - center|² - radius²`: negative inside, zero on the surface.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sphere {
    pub center: [f64; 3],
    pub radius: f64,
}

impl Sphere {
    pub fn new(center: [f64; 3], radius: f64) -> Self {
        Self { center, radius }
    }
}

impl ImplicitFunction for Sphere {
    fn evaluate(&self, p: [f64; 3]) -> f64 {
        let d2: f64 = (0..3).map(|a| (p[a] - self.center[a]).powi(2)).sum();
        d2 - self.radius * self.radius
    }
}

/// `normal · (p - origin)`. The normal is used as given, so the value is a
/// signed distance only for unit normals.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    pub origin: [f64; 3],
    pub normal: [f64; 3],
}

impl Plane {
    pub fn new(origin: [f64; 3], normal: [f64; 3]) -> Self {
        Self { origin, normal }
    }
}

impl ImplicitFunction for Plane {
    fn evaluate(&self, p: [f64; 3]) -> f64 {
        (0..3).map(|a| self.normal[a] * (p[a] - self.origin[a])).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sphere_sign_follows_the_surface() {
        let s = Sphere::new([1.0, 0.0, 0.0], 2.0);
        assert!(s.evaluate([1.0, 0.0, 0.0]) < 0.0);
        assert_eq!(s.evaluate([3.0, 0.0, 0.0]), 0.0);
        assert_eq!(s.evaluate([1.0, 3.0, 0.0]), 5.0);
    }

    #[test]
    fn plane_is_linear() {
        let p = Plane::new([0.0, 0.0, 1.0], [0.0, 0.0, 2.0]);
        assert_eq!(p.evaluate([5.0, -3.0, 1.0]), 0.0);
        assert_eq!(p.evaluate([0.0, 0.0, 3.0]), 4.0);
    }
}
