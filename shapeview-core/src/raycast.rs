/// Rays and the intersection tests used for pointer picking and dragging
use nalgebra::{Point3, Vector3};

const EPSILON: f32 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Point3<f32>,
    /// Unit direction
    pub direction: Vector3<f32>,
}

impl Ray {
    pub fn new(origin: Point3<f32>, direction: Vector3<f32>) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    pub fn at(&self, t: f32) -> Point3<f32> {
        self.origin + self.direction * t
    }

    /// Distance along the ray to triangle `(v0, v1, v2)`, two-sided
    /// (Möller–Trumbore).
    pub fn intersect_triangle(
        &self,
        v0: &Point3<f32>,
        v1: &Point3<f32>,
        v2: &Point3<f32>,
    ) -> Option<f32> {
        let edge1 = v1 - v0;
        let edge2 = v2 - v0;
        let pvec = self.direction.cross(&edge2);
        let det = edge1.dot(&pvec);
        if det.abs() <= EPSILON {
            return None;
        }
        let inv_det = 1.0 / det;

        let tvec = self.origin - v0;
        let u = tvec.dot(&pvec) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let qvec = tvec.cross(&edge1);
        let v = self.direction.dot(&qvec) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = edge2.dot(&qvec) * inv_det;
        (t > EPSILON).then_some(t)
    }

    /// Point where the ray crosses the plane through `point` with `normal`
    pub fn intersect_plane(&self, point: &Point3<f32>, normal: &Vector3<f32>) -> Option<Point3<f32>> {
        let denom = normal.dot(&self.direction);
        if denom.abs() <= EPSILON {
            return None;
        }

        let t = normal.dot(&(point - self.origin)) / denom;
        if t <= 0.0 {
            return None;
        }

        Some(self.at(t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn down_ray(x: f32, z: f32) -> Ray {
        Ray::new(Point3::new(x, 5.0, z), Vector3::new(0.0, -1.0, 0.0))
    }

    #[test]
    fn test_hits_triangle_from_either_side() {
        let (a, b, c) = (
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        );
        let t = down_ray(0.25, 0.25).intersect_triangle(&a, &b, &c).unwrap();
        assert!((t - 5.0).abs() < 1e-5);
        assert!(down_ray(0.25, 0.25).intersect_triangle(&a, &c, &b).is_some());
    }

    #[test]
    fn test_misses_outside_triangle() {
        let (a, b, c) = (
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        );
        assert!(down_ray(0.9, 0.9).intersect_triangle(&a, &b, &c).is_none());
    }

    #[test]
    fn test_triangle_behind_origin_is_ignored() {
        let ray = Ray::new(Point3::new(0.25, -1.0, 0.25), Vector3::new(0.0, -1.0, 0.0));
        let (a, b, c) = (
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        );
        assert!(ray.intersect_triangle(&a, &b, &c).is_none());
    }

    #[test]
    fn test_plane_intersection() {
        let hit = down_ray(2.0, -1.0)
            .intersect_plane(&Point3::origin(), &Vector3::y())
            .unwrap();
        assert!((hit - Point3::new(2.0, 0.0, -1.0)).norm() < 1e-6);

        let parallel = Ray::new(Point3::new(0.0, 1.0, 0.0), Vector3::x());
        assert!(parallel.intersect_plane(&Point3::origin(), &Vector3::y()).is_none());
    }
}
