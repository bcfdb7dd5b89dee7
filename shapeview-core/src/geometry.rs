/// Triangle meshes and the primitive geometries shapes are drawn with
use nalgebra::{Matrix4, Point3, Vector3};
use std::f32::consts::{PI, TAU};

use crate::shape::ShapeKind;

/// Radial segments used for curved primitives
pub const DEFAULT_SEGMENTS: usize = 24;

/// A 3D vertex with position and normal
#[derive(Debug, Clone, Copy)]
pub struct Vertex {
    pub position: Point3<f32>,
    pub normal: Vector3<f32>,
}

impl Vertex {
    pub fn new(x: f32, y: f32, z: f32, nx: f32, ny: f32, nz: f32) -> Self {
        Self {
            position: Point3::new(x, y, z),
            normal: Vector3::new(nx, ny, nz),
        }
    }

    fn at(position: Point3<f32>, normal: Vector3<f32>) -> Self {
        Self { position, normal }
    }
}

/// A triangle face defined by three vertices, counter-clockwise seen from outside
#[derive(Debug, Clone)]
pub struct Triangle {
    pub vertices: [Vertex; 3],
}

impl Triangle {
    pub fn new(v0: Vertex, v1: Vertex, v2: Vertex) -> Self {
        Self {
            vertices: [v0, v1, v2],
        }
    }

    /// Calculate the face normal from the triangle's vertices
    pub fn calculate_normal(&self) -> Vector3<f32> {
        let v0 = self.vertices[0].position;
        let v1 = self.vertices[1].position;
        let v2 = self.vertices[2].position;

        let edge1 = v1 - v0;
        let edge2 = v2 - v0;

        edge1.cross(&edge2).normalize()
    }

    /// Vertex positions after applying `model`
    pub fn world_positions(&self, model: &Matrix4<f32>) -> [Point3<f32>; 3] {
        self.vertices.map(|v| model.transform_point(&v.position))
    }
}

/// A 3D mesh composed of triangles
#[derive(Debug, Clone)]
pub struct Mesh {
    pub triangles: Vec<Triangle>,
}

impl Mesh {
    pub fn new() -> Self {
        Self {
            triangles: Vec::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            triangles: Vec::with_capacity(capacity),
        }
    }

    pub fn add_triangle(&mut self, triangle: Triangle) {
        self.triangles.push(triangle);
    }

    /// Axis-aligned bounds as (min, max); `None` for an empty mesh
    pub fn bounds(&self) -> Option<(Point3<f32>, Point3<f32>)> {
        let mut points = self.triangles.iter().flat_map(|t| t.vertices.iter().map(|v| v.position));
        let first = points.next()?;
        Some(points.fold((first, first), |(min, max), p| {
            (min.inf(&p), max.sup(&p))
        }))
    }

    /// Axis-aligned box centered on the origin
    pub fn cube(size: f32) -> Self {
        let h = size / 2.0;
        // (normal, tangent u, tangent v) with u x v == normal
        let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
            ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            ([0.0, 0.0, -1.0], [0.0, 1.0, 0.0], [1.0, 0.0, 0.0]),
            ([0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0]),
            ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
            ([1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]),
            ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
        ];

        let mut mesh = Self::with_capacity(12);
        for (n, u, v) in faces {
            let n = Vector3::from(n);
            let u = Vector3::from(u) * h;
            let v = Vector3::from(v) * h;
            let center = Point3::from(n * h);
            let corner = |su: f32, sv: f32| Vertex::at(center + u * su + v * sv, n);

            mesh.add_triangle(Triangle::new(corner(-1.0, -1.0), corner(1.0, -1.0), corner(1.0, 1.0)));
            mesh.add_triangle(Triangle::new(corner(-1.0, -1.0), corner(1.0, 1.0), corner(-1.0, 1.0)));
        }
        mesh
    }

    /// UV sphere centered on the origin
    pub fn sphere(radius: f32, segments: usize, rings: usize) -> Self {
        let segments = segments.max(3);
        let rings = rings.max(2);
        let point = |ring: usize, seg: usize| {
            let theta = PI * ring as f32 / rings as f32;
            let phi = TAU * seg as f32 / segments as f32;
            let n = Vector3::new(theta.sin() * phi.cos(), theta.cos(), theta.sin() * phi.sin());
            Vertex::at(Point3::from(n * radius), n)
        };

        let mut mesh = Self::with_capacity(segments * rings * 2);
        for ring in 0..rings {
            for seg in 0..segments {
                let p00 = point(ring, seg);
                let p01 = point(ring, seg + 1);
                let p10 = point(ring + 1, seg);
                let p11 = point(ring + 1, seg + 1);

                // Pole rows collapse to a single triangle
                if ring != 0 {
                    mesh.add_triangle(Triangle::new(p00, p01, p11));
                }
                if ring != rings - 1 {
                    mesh.add_triangle(Triangle::new(p00, p11, p10));
                }
            }
        }
        mesh
    }

    /// Capped cylinder along Y, centered on the origin
    pub fn cylinder(radius: f32, height: f32, segments: usize) -> Self {
        let segments = segments.max(3);
        let half = height / 2.0;
        let up = Vector3::y();
        let down = -up;

        let mut mesh = Self::with_capacity(segments * 4);
        for seg in 0..segments {
            let (n0, n1) = (radial(seg, segments), radial(seg + 1, segments));
            let top = |n: Vector3<f32>, normal| Vertex::at(Point3::new(n.x * radius, half, n.z * radius), normal);
            let bottom = |n: Vector3<f32>, normal| Vertex::at(Point3::new(n.x * radius, -half, n.z * radius), normal);

            mesh.add_triangle(Triangle::new(top(n0, n0), top(n1, n1), bottom(n1, n1)));
            mesh.add_triangle(Triangle::new(top(n0, n0), bottom(n1, n1), bottom(n0, n0)));

            let top_center = Vertex::at(Point3::new(0.0, half, 0.0), up);
            mesh.add_triangle(Triangle::new(top_center, top(n1, up), top(n0, up)));

            let bottom_center = Vertex::at(Point3::new(0.0, -half, 0.0), down);
            mesh.add_triangle(Triangle::new(bottom_center, bottom(n0, down), bottom(n1, down)));
        }
        mesh
    }

    /// Cone along Y with its apex up, centered on the origin
    pub fn cone(radius: f32, height: f32, segments: usize) -> Self {
        let segments = segments.max(3);
        let half = height / 2.0;
        let down = -Vector3::y();
        let apex = Point3::new(0.0, half, 0.0);

        let mut mesh = Self::with_capacity(segments * 2);
        for seg in 0..segments {
            let (r0, r1) = (radial(seg, segments), radial(seg + 1, segments));
            let slant = |r: Vector3<f32>| Vector3::new(r.x * height, radius, r.z * height).normalize();
            let rim = |r: Vector3<f32>, normal| Vertex::at(Point3::new(r.x * radius, -half, r.z * radius), normal);

            let apex_normal = slant(radial_mid(seg, segments));
            mesh.add_triangle(Triangle::new(
                Vertex::at(apex, apex_normal),
                rim(r1, slant(r1)),
                rim(r0, slant(r0)),
            ));

            let base_center = Vertex::at(Point3::new(0.0, -half, 0.0), down);
            mesh.add_triangle(Triangle::new(base_center, rim(r0, down), rim(r1, down)));
        }
        mesh
    }
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}

fn radial(seg: usize, segments: usize) -> Vector3<f32> {
    let phi = TAU * seg as f32 / segments as f32;
    Vector3::new(phi.cos(), 0.0, phi.sin())
}

fn radial_mid(seg: usize, segments: usize) -> Vector3<f32> {
    let phi = TAU * (seg as f32 + 0.5) / segments as f32;
    Vector3::new(phi.cos(), 0.0, phi.sin())
}

/// Fixed default geometry of each shape kind
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Primitive {
    Sphere { radius: f32 },
    Cylinder { radius: f32, height: f32 },
    Box { size: f32 },
    Cone { radius: f32, height: f32 },
}

impl Primitive {
    pub fn for_kind(kind: ShapeKind) -> Self {
        match kind {
            ShapeKind::Sphere => Primitive::Sphere { radius: 1.0 },
            ShapeKind::Cylinder => Primitive::Cylinder { radius: 1.0, height: 2.0 },
            ShapeKind::Cube => Primitive::Box { size: 1.0 },
            ShapeKind::Cone => Primitive::Cone { radius: 1.0, height: 2.0 },
        }
    }

    /// Distance from the mesh origin down to its base
    pub fn base_offset(&self) -> f32 {
        match *self {
            Primitive::Sphere { radius } => radius,
            Primitive::Cylinder { height, .. } | Primitive::Cone { height, .. } => height / 2.0,
            Primitive::Box { size } => size / 2.0,
        }
    }

    pub fn mesh(&self, segments: usize) -> Mesh {
        match *self {
            Primitive::Sphere { radius } => Mesh::sphere(radius, segments, segments / 2),
            Primitive::Cylinder { radius, height } => Mesh::cylinder(radius, height, segments),
            Primitive::Box { size } => Mesh::cube(size),
            Primitive::Cone { radius, height } => Mesh::cone(radius, height, segments),
        }
    }
}
