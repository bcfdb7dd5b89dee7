/// Camera, projection, viewport and orbit utilities
use nalgebra::{Matrix4, Point3, Vector3, Vector4};

use crate::raycast::Ray;

/// Projection mode for rendering
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProjectionMode {
    Orthographic,
    Perspective,
}

/// Drawing surface size in device units.
///
/// `pixel_aspect` is the width/height ratio of one device unit: 1.0 for
/// pixels, roughly 0.5 for terminal cells.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub pixel_aspect: f32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_pixel_aspect(width, height, 1.0)
    }

    pub fn with_pixel_aspect(width: u32, height: u32, pixel_aspect: f32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            pixel_aspect,
        }
    }

    /// Surface left after reserving `header` rows at the top
    pub fn below_header(width: u32, height: u32, header: u32, pixel_aspect: f32) -> Self {
        Self::with_pixel_aspect(width, height.saturating_sub(header), pixel_aspect)
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 * self.pixel_aspect / self.height as f32
    }

    /// Normalized device coordinates of a surface position
    pub fn to_ndc(&self, x: f32, y: f32) -> (f32, f32) {
        (
            x / self.width as f32 * 2.0 - 1.0,
            1.0 - y / self.height as f32 * 2.0,
        )
    }

    /// Surface position of normalized device coordinates
    pub fn from_ndc(&self, ndc_x: f32, ndc_y: f32) -> (f32, f32) {
        (
            (ndc_x + 1.0) * 0.5 * self.width as f32,
            (1.0 - ndc_y) * 0.5 * self.height as f32,
        )
    }
}

/// Camera configuration for 3D rendering
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub mode: ProjectionMode,
}

impl Camera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            position: Point3::new(0.0, 0.0, 5.0),
            target: Point3::new(0.0, 0.0, 0.0),
            up: Vector3::new(0.0, 1.0, 0.0),
            fov: 75f32.to_radians(),
            aspect: width as f32 / height.max(1) as f32,
            near: 0.1,
            far: 1000.0,
            mode: ProjectionMode::Perspective,
        }
    }

    pub fn for_viewport(viewport: &Viewport) -> Self {
        let mut camera = Self::new(viewport.width, viewport.height);
        camera.aspect = viewport.aspect();
        camera
    }

    pub fn set_viewport(&mut self, viewport: &Viewport) {
        self.aspect = viewport.aspect();
    }

    pub fn toggle_mode(&mut self) {
        self.mode = match self.mode {
            ProjectionMode::Perspective => ProjectionMode::Orthographic,
            ProjectionMode::Orthographic => ProjectionMode::Perspective,
        };
    }

    pub fn forward(&self) -> Vector3<f32> {
        (self.target - self.position).normalize()
    }

    /// Camera-space right and up axes in world space
    fn basis(&self) -> (Vector3<f32>, Vector3<f32>) {
        let forward = self.forward();
        let right = forward.cross(&self.up).normalize();
        (right, right.cross(&forward))
    }

    /// Half extents of the view volume at distance `depth` from the camera
    fn half_extents(&self, depth: f32) -> (f32, f32) {
        let half_h = match self.mode {
            ProjectionMode::Perspective => (0.5 * self.fov).tan() * depth,
            ProjectionMode::Orthographic => (self.position - self.target).norm() / 2.0,
        };
        (half_h * self.aspect, half_h)
    }

    /// Create the view matrix (camera transformation)
    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(&self.position, &self.target, &self.up)
    }

    /// Create the projection matrix
    pub fn projection_matrix(&self) -> Matrix4<f32> {
        match self.mode {
            ProjectionMode::Perspective => {
                Matrix4::new_perspective(self.aspect, self.fov, self.near, self.far)
            }
            ProjectionMode::Orthographic => {
                let (half_w, half_h) = self.half_extents(1.0);
                Matrix4::new_orthographic(-half_w, half_w, -half_h, half_h, self.near, self.far)
            }
        }
    }

    pub fn view_projection(&self) -> Matrix4<f32> {
        self.projection_matrix() * self.view_matrix()
    }

    /// Project a world point to normalized device coordinates.
    /// Points behind the camera have no projection.
    pub fn project_to_ndc(&self, point: &Point3<f32>, mvp: &Matrix4<f32>) -> Option<Point3<f32>> {
        let clip: Vector4<f32> = mvp * point.to_homogeneous();
        if clip.w <= 1e-6 {
            return None;
        }
        Some(Point3::from(clip.xyz() / clip.w))
    }

    /// Project a model-space point to surface coordinates plus NDC depth
    pub fn project_to_screen(
        &self,
        point: &Point3<f32>,
        model_matrix: &Matrix4<f32>,
        viewport: &Viewport,
    ) -> Option<(f32, f32, f32)> {
        let mvp = self.view_projection() * model_matrix;
        let ndc = self.project_to_ndc(point, &mvp)?;
        if ndc.z < -1.0 || ndc.z > 1.0 {
            return None;
        }
        let (x, y) = viewport.from_ndc(ndc.x, ndc.y);
        Some((x, y, ndc.z))
    }

    /// World-space ray through normalized device coordinates
    pub fn ray_from_ndc(&self, ndc_x: f32, ndc_y: f32) -> Ray {
        let forward = self.forward();
        let (right, up) = self.basis();
        match self.mode {
            ProjectionMode::Perspective => {
                let (half_w, half_h) = self.half_extents(1.0);
                let direction = forward + right * (ndc_x * half_w) + up * (ndc_y * half_h);
                Ray::new(self.position, direction)
            }
            ProjectionMode::Orthographic => {
                let (half_w, half_h) = self.half_extents(1.0);
                let origin = self.position + right * (ndc_x * half_w) + up * (ndc_y * half_h);
                Ray::new(origin, forward)
            }
        }
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(800, 600)
    }
}

/// Orbit input: yaw/pitch/distance around the camera target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitControls {
    pub yaw: f32,
    pub pitch: f32,
    pub distance: f32,
    pub enabled: bool,
}

const PITCH_LIMIT: f32 = 1.5;
const MIN_DISTANCE: f32 = 1.0;
const MAX_DISTANCE: f32 = 100.0;

impl OrbitControls {
    pub fn new(yaw: f32, pitch: f32, distance: f32) -> Self {
        Self {
            yaw,
            pitch: pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT),
            distance: distance.clamp(MIN_DISTANCE, MAX_DISTANCE),
            enabled: true,
        }
    }

    /// Rotate by delta amounts (in radians); ignored while disabled
    pub fn rotate(&mut self, dyaw: f32, dpitch: f32) {
        if !self.enabled {
            return;
        }
        self.yaw += dyaw;
        self.pitch = (self.pitch + dpitch).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Scale the distance to the target; ignored while disabled
    pub fn zoom(&mut self, factor: f32) {
        if !self.enabled || factor <= 0.0 {
            return;
        }
        self.distance = (self.distance * factor).clamp(MIN_DISTANCE, MAX_DISTANCE);
    }

    /// Place `camera` on the orbit around its target
    pub fn apply(&self, camera: &mut Camera) {
        let (sy, cy) = self.yaw.sin_cos();
        let (sp, cp) = self.pitch.sin_cos();
        let offset = Vector3::new(cp * sy, sp, cp * cy) * self.distance;
        camera.position = camera.target + offset;
    }
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self::new(0.0, 0.0, 5.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_creation() {
        let camera = Camera::new(800, 600);
        assert_eq!(camera.mode, ProjectionMode::Perspective);
        assert!((camera.aspect - 800.0 / 600.0).abs() < 1e-6);
    }

    #[test]
    fn test_view_matrix() {
        let camera = Camera::new(800, 600);
        let view = camera.view_matrix();
        assert!(view.norm() > 0.0);
    }

    #[test]
    fn test_viewport_aspect_and_header() {
        let viewport = Viewport::below_header(100, 52, 2, 0.5);
        assert_eq!(viewport.height, 50);
        assert!((viewport.aspect() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_ndc_roundtrip_through_surface() {
        let viewport = Viewport::new(640, 480);
        let (nx, ny) = viewport.to_ndc(160.0, 120.0);
        assert!((nx + 0.5).abs() < 1e-6 && (ny - 0.5).abs() < 1e-6);
        let (x, y) = viewport.from_ndc(nx, ny);
        assert!((x - 160.0).abs() < 1e-4 && (y - 120.0).abs() < 1e-4);
    }

    #[test]
    fn test_ray_passes_through_projected_point() {
        for mode in [ProjectionMode::Perspective, ProjectionMode::Orthographic] {
            let mut camera = Camera::new(800, 600);
            camera.mode = mode;
            camera.position = Point3::new(2.0, 3.0, 6.0);
            camera.target = Point3::new(0.0, 0.5, 0.0);

            let point = Point3::new(1.0, 1.0, -0.5);
            let ndc = camera.project_to_ndc(&point, &camera.view_projection()).unwrap();
            let ray = camera.ray_from_ndc(ndc.x, ndc.y);

            let to_point = point - ray.origin;
            let off_axis = (to_point - ray.direction * to_point.dot(&ray.direction)).norm();
            assert!(off_axis < 1e-3, "{mode:?}: ray misses by {off_axis}");
        }
    }

    #[test]
    fn test_point_behind_camera_not_projected() {
        let camera = Camera::new(800, 600);
        let behind = Point3::new(0.0, 0.0, 10.0);
        assert!(camera.project_to_ndc(&behind, &camera.view_projection()).is_none());
    }

    #[test]
    fn test_orbit_disabled_ignores_input() {
        let mut orbit = OrbitControls::default();
        orbit.enabled = false;
        orbit.rotate(1.0, 1.0);
        orbit.zoom(2.0);
        assert_eq!(orbit, OrbitControls { enabled: false, ..OrbitControls::default() });
    }

    #[test]
    fn test_orbit_keeps_distance() {
        let mut camera = Camera::default();
        let mut orbit = OrbitControls::new(0.3, 0.2, 7.0);
        orbit.rotate(0.5, 5.0);
        orbit.apply(&mut camera);
        assert!(((camera.position - camera.target).norm() - 7.0).abs() < 1e-4);
        assert!(orbit.pitch <= 1.5);
    }
}
