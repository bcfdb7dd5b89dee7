//! Interactive 3D scene of shape meshes
//!
//! Shapes are laid out left to right in id order along the X axis, centered
//! on the origin, each resting on the ground plane. The scene resolves pointer
//! positions (in normalized device coordinates) to meshes by ray casting,
//! moves a grabbed mesh in the camera-facing plane through its center, and
//! applies the uniform size control to the selected mesh.
//!
//! Positions, scales and colors live only as long as the scene; nothing here
//! is written back to the catalog.

use std::collections::HashMap;
use std::f32::consts::PI;
use std::sync::Arc;

use nalgebra::{Point3, Vector3};

use crate::geometry::{Mesh, Primitive, DEFAULT_SEGMENTS};
use crate::projection::{Camera, OrbitControls, Viewport};
use crate::raycast::Ray;
use crate::shape::{ShapeKind, ShapeRecord};
use crate::transform::{clamp_size, ObjectTransform};

/// Distance between neighbouring shapes along the X axis
pub const LAYOUT_SPACING: f32 = 2.5;

/// Size shown by the size control when nothing is selected
pub const DEFAULT_SIZE: f32 = 1.0;

const CAMERA_TARGET: Point3<f32> = Point3::new(0.0, 1.0, 0.0);
const CAMERA_PITCH: f32 = 0.25;

/// X position of the `index`-th of `count` shapes
pub fn layout_x(index: usize, count: usize) -> f32 {
    let spread = count.saturating_sub(1) as f32 * LAYOUT_SPACING;
    index as f32 * LAYOUT_SPACING - spread / 2.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn from_hex(hex: u32) -> Self {
        Self::new((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
    }

    pub fn to_hex(self) -> u32 {
        (self.r as u32) << 16 | (self.g as u32) << 8 | self.b as u32
    }

    /// Multiply each channel by `factor`, saturating
    pub fn shade(self, factor: f32) -> Self {
        let scale = |c: u8| (c as f32 * factor).clamp(0.0, 255.0) as u8;
        Self::new(scale(self.r), scale(self.g), scale(self.b))
    }
}

/// Supplies display colors for new meshes
pub trait ColorSource {
    fn next_color(&mut self) -> Rgb;
}

impl<F: FnMut() -> Rgb> ColorSource for F {
    fn next_color(&mut self) -> Rgb {
        self()
    }
}

/// A fresh random color per mesh
#[cfg(feature = "rand")]
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomColors;

#[cfg(feature = "rand")]
impl ColorSource for RandomColors {
    fn next_color(&mut self) -> Rgb {
        Rgb::from_hex(rand::random::<u32>() & 0xFF_FFFF)
    }
}

/// Handle of a mesh inside one scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshId(usize);

impl MeshId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A shape's mesh as placed in the scene
#[derive(Debug, Clone)]
pub struct SceneObject {
    pub id: MeshId,
    pub shape: ShapeRecord,
    pub primitive: Primitive,
    pub mesh: Arc<Mesh>,
    pub transform: ObjectTransform,
    pub color: Rgb,
}

impl SceneObject {
    /// Distance along `ray` to the nearest triangle of this object
    fn hit_distance(&self, ray: &Ray) -> Option<f32> {
        let model = self.transform.model_matrix();
        self.mesh
            .triangles
            .iter()
            .filter_map(|triangle| {
                let [a, b, c] = triangle.world_positions(&model);
                ray.intersect_triangle(&a, &b, &c)
            })
            .min_by(f32::total_cmp)
    }
}

/// Pointer interaction in progress
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Interaction {
    Idle,
    /// Pointer went down on empty space; movement orbits the camera
    Orbiting { last: (f32, f32) },
    /// Pointer went down on a mesh; movement drags it
    Dragging {
        mesh: MeshId,
        plane_normal: Vector3<f32>,
        offset: Vector3<f32>,
    },
}

#[derive(Debug, Clone)]
pub struct Scene {
    objects: Vec<SceneObject>,
    camera: Camera,
    orbit: OrbitControls,
    viewport: Viewport,
    selected: Option<MeshId>,
    size: f32,
    interaction: Interaction,
}

impl Scene {
    /// Build meshes for `shapes`, ordered by ascending id
    pub fn new(shapes: &[ShapeRecord], viewport: Viewport, colors: &mut dyn ColorSource) -> Self {
        let mut sorted = shapes.to_vec();
        sorted.sort_by_key(|shape| shape.id);

        let mut geometry: HashMap<ShapeKind, Arc<Mesh>> = HashMap::new();
        let count = sorted.len();
        let objects: Vec<SceneObject> = sorted
            .into_iter()
            .enumerate()
            .map(|(index, shape)| {
                let primitive = Primitive::for_kind(shape.kind);
                let mesh = geometry
                    .entry(shape.kind)
                    .or_insert_with(|| Arc::new(primitive.mesh(DEFAULT_SEGMENTS)));
                let position = Point3::new(layout_x(index, count), primitive.base_offset(), 0.0);
                SceneObject {
                    id: MeshId(index),
                    shape,
                    primitive,
                    mesh: Arc::clone(mesh),
                    transform: ObjectTransform::at(position),
                    color: colors.next_color(),
                }
            })
            .collect();

        let spread = count.saturating_sub(1) as f32 * LAYOUT_SPACING;
        let orbit = OrbitControls::new(0.0, CAMERA_PITCH, 5.0 + spread * 0.6);
        let mut camera = Camera::for_viewport(&viewport);
        camera.target = CAMERA_TARGET;
        orbit.apply(&mut camera);

        log::debug!("scene built with {} meshes", objects.len());
        Self {
            objects,
            camera,
            orbit,
            viewport,
            selected: None,
            size: DEFAULT_SIZE,
            interaction: Interaction::Idle,
        }
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn mesh_count(&self) -> usize {
        self.objects.len()
    }

    pub fn object(&self, id: MeshId) -> Option<&SceneObject> {
        self.objects.get(id.0)
    }

    /// Source record of a mesh
    pub fn record_for(&self, id: MeshId) -> Option<&ShapeRecord> {
        self.object(id).map(|object| &object.shape)
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn orbit(&self) -> &OrbitControls {
        &self.orbit
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn interaction(&self) -> Interaction {
        self.interaction
    }

    pub fn selected(&self) -> Option<MeshId> {
        self.selected
    }

    pub fn selected_record(&self) -> Option<&ShapeRecord> {
        self.selected.and_then(|id| self.record_for(id))
    }

    /// Value shown by the size control
    pub fn size(&self) -> f32 {
        self.size
    }

    /// Nearest mesh under the pointer, if any
    pub fn pick(&self, ndc_x: f32, ndc_y: f32) -> Option<MeshId> {
        let ray = self.camera.ray_from_ndc(ndc_x, ndc_y);
        self.objects
            .iter()
            .filter_map(|object| object.hit_distance(&ray).map(|t| (object.id, t)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id)
    }

    /// Select the mesh under the pointer, or clear the selection on a miss
    pub fn click(&mut self, ndc_x: f32, ndc_y: f32) -> Option<MeshId> {
        match self.pick(ndc_x, ndc_y) {
            Some(id) => {
                self.selected = Some(id);
                self.size = self.objects[id.0].transform.scale.x;
            }
            None => self.deselect(),
        }
        self.selected
    }

    pub fn deselect(&mut self) {
        self.selected = None;
        self.size = DEFAULT_SIZE;
    }

    /// Pointer pressed: select and start dragging a hit mesh, otherwise
    /// clear the selection and start orbiting
    pub fn pointer_down(&mut self, ndc_x: f32, ndc_y: f32) {
        // A release can be lost outside the window
        self.pointer_up();

        let Some(id) = self.click(ndc_x, ndc_y) else {
            self.interaction = Interaction::Orbiting { last: (ndc_x, ndc_y) };
            return;
        };

        let ray = self.camera.ray_from_ndc(ndc_x, ndc_y);
        let plane_normal = -self.camera.forward();
        let center = self.objects[id.0].transform.position;
        let grab = ray.intersect_plane(&center, &plane_normal).unwrap_or(center);

        self.orbit.enabled = false;
        self.interaction = Interaction::Dragging {
            mesh: id,
            plane_normal,
            offset: center - grab,
        };
        log::debug!("drag start on {:?}", id);
    }

    pub fn pointer_move(&mut self, ndc_x: f32, ndc_y: f32) {
        match self.interaction {
            Interaction::Idle => {}
            Interaction::Orbiting { last } => {
                let (dx, dy) = (ndc_x - last.0, ndc_y - last.1);
                self.orbit_by(-dx * PI, -dy * PI / 2.0);
                self.interaction = Interaction::Orbiting { last: (ndc_x, ndc_y) };
            }
            Interaction::Dragging {
                mesh,
                plane_normal,
                offset,
            } => {
                let ray = self.camera.ray_from_ndc(ndc_x, ndc_y);
                let object = &mut self.objects[mesh.0];
                let center = object.transform.position;
                if let Some(hit) = ray.intersect_plane(&center, &plane_normal) {
                    object.transform.position = hit + offset;
                }
            }
        }
    }

    /// Pointer released: ends a drag and gives input back to the orbit
    pub fn pointer_up(&mut self) {
        if let Interaction::Dragging { mesh, .. } = self.interaction {
            self.orbit.enabled = true;
            log::debug!("drag end on {:?}", mesh);
        }
        self.interaction = Interaction::Idle;
    }

    /// Set the size control; the clamped value scales the selected mesh.
    /// Non-finite values are ignored.
    pub fn set_size(&mut self, size: f32) -> f32 {
        if !size.is_finite() {
            return self.size;
        }
        self.size = clamp_size(size);
        if let Some(id) = self.selected {
            self.objects[id.0].transform.set_uniform_scale(self.size);
        }
        self.size
    }

    /// Parse and apply a typed size value
    pub fn set_size_input(&mut self, input: &str) -> Option<f32> {
        match input.trim().parse::<f32>() {
            Ok(size) if size.is_finite() => Some(self.set_size(size)),
            _ => {
                log::debug!("ignoring size input {:?}", input);
                None
            }
        }
    }

    pub fn nudge_size(&mut self, delta: f32) -> f32 {
        self.set_size(self.size + delta)
    }

    pub fn orbit_by(&mut self, dyaw: f32, dpitch: f32) {
        self.orbit.rotate(dyaw, dpitch);
        self.orbit.apply(&mut self.camera);
    }

    pub fn zoom(&mut self, factor: f32) {
        self.orbit.zoom(factor);
        self.orbit.apply(&mut self.camera);
    }

    pub fn toggle_projection(&mut self) {
        self.camera.toggle_mode();
    }

    /// Match the camera to a new drawing surface
    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.camera.set_viewport(&viewport);
    }

    /// Ground grid segments around the layout; drawn only, never picked
    pub fn grid_lines(&self) -> Vec<(Point3<f32>, Point3<f32>)> {
        let extent = (self.objects.len() as f32 * LAYOUT_SPACING / 2.0 + 2.0).ceil();
        let steps = (extent * 2.0) as i32;
        (0..=steps)
            .flat_map(|i| {
                let d = -extent + i as f32;
                [
                    (Point3::new(d, 0.0, -extent), Point3::new(d, 0.0, extent)),
                    (Point3::new(-extent, 0.0, d), Point3::new(extent, 0.0, d)),
                ]
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn grey() -> impl FnMut() -> Rgb {
        || Rgb::new(128, 128, 128)
    }

    fn scene(shapes: &[ShapeRecord]) -> Scene {
        Scene::new(shapes, Viewport::new(800, 600), &mut grey())
    }

    fn three() -> Vec<ShapeRecord> {
        vec![
            ShapeRecord::new(3, "c", ShapeKind::Cone),
            ShapeRecord::new(1, "a", ShapeKind::Sphere),
            ShapeRecord::new(2, "b", ShapeKind::Cube),
        ]
    }

    /// NDC of an object's center as seen by the scene camera
    fn ndc_of(scene: &Scene, id: MeshId) -> (f32, f32) {
        let center = scene.object(id).unwrap().transform.position;
        let ndc = scene
            .camera()
            .project_to_ndc(&center, &scene.camera().view_projection())
            .unwrap();
        (ndc.x, ndc.y)
    }

    #[test]
    fn test_layout_sorted_and_symmetric() {
        let scene = scene(&three());
        let ids: Vec<_> = scene.objects().iter().map(|o| o.shape.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);

        let xs: Vec<_> = scene.objects().iter().map(|o| o.transform.position.x).collect();
        assert_eq!(xs, vec![-2.5, 0.0, 2.5]);
    }

    #[test]
    fn test_meshes_rest_on_ground() {
        let scene = scene(&three());
        let ys: Vec<_> = scene.objects().iter().map(|o| o.transform.position.y).collect();
        assert_eq!(ys, vec![1.0, 0.5, 1.0]);
    }

    #[test]
    fn test_mesh_maps_back_to_record() {
        let scene = scene(&three());
        let id = scene.objects()[2].id;
        assert_eq!(scene.record_for(id).unwrap().name, "c");
    }

    #[test]
    fn test_click_selects_exactly_the_shape_under_pointer() {
        let mut scene = scene(&three());
        for object in scene.objects().to_vec() {
            let (x, y) = ndc_of(&scene, object.id);
            assert_eq!(scene.click(x, y), Some(object.id));
            assert_eq!(scene.selected_record(), Some(&object.shape));
        }
    }

    #[test]
    fn test_click_empty_space_clears_selection_and_resets_size() {
        let mut scene = scene(&three());
        let id = scene.objects()[0].id;
        let (x, y) = ndc_of(&scene, id);
        scene.click(x, y);
        scene.set_size(3.0);

        // Top corner looks over the shapes into empty sky
        assert_eq!(scene.click(-0.99, 0.99), None);
        assert_eq!(scene.selected(), None);
        assert_eq!(scene.size(), DEFAULT_SIZE);
    }

    #[test]
    fn test_reselect_surfaces_current_scale() {
        let mut scene = scene(&three());
        let id = scene.objects()[1].id;
        let (x, y) = ndc_of(&scene, id);
        scene.click(x, y);
        scene.set_size(2.0);
        scene.deselect();
        scene.click(x, y);
        assert_eq!(scene.size(), 2.0);
    }

    #[test]
    fn test_size_scales_selected_uniformly_and_clamps() {
        let mut scene = scene(&three());
        let id = scene.objects()[0].id;
        let (x, y) = ndc_of(&scene, id);
        scene.click(x, y);

        assert_eq!(scene.set_size(2.0), 2.0);
        assert_eq!(scene.object(id).unwrap().transform.scale, Vector3::repeat(2.0));

        assert_eq!(scene.set_size(9.0), 5.0);
        assert_eq!(scene.set_size(0.0), 0.1);
        assert_eq!(scene.object(id).unwrap().transform.scale, Vector3::repeat(0.1));

        // Other meshes untouched
        assert_eq!(scene.objects()[1].transform.scale, Vector3::repeat(1.0));
    }

    #[test]
    fn test_size_input_parsing() {
        let mut scene = scene(&three());
        assert_eq!(scene.set_size_input(" 1.5 "), Some(1.5));
        assert_eq!(scene.set_size_input("abc"), None);
        assert_eq!(scene.set_size_input("NaN"), None);
        assert_eq!(scene.size(), 1.5);
    }

    #[test]
    fn test_drag_moves_mesh_and_suspends_orbit() {
        let mut scene = scene(&three());
        let id = scene.objects()[1].id;
        let start = scene.object(id).unwrap().transform.position;
        let (x, y) = ndc_of(&scene, id);

        scene.pointer_down(x, y);
        assert!(!scene.orbit().enabled);
        let camera_before = scene.camera().position;

        scene.pointer_move(x + 0.2, y);
        let moved = scene.object(id).unwrap().transform.position;
        assert!(moved.x > start.x);
        assert_eq!(scene.camera().position, camera_before);

        scene.pointer_up();
        assert!(scene.orbit().enabled);
        assert_eq!(scene.interaction(), Interaction::Idle);
    }

    #[test]
    fn test_drag_keeps_grab_point_under_pointer() {
        let mut scene = scene(&three());
        let id = scene.objects()[2].id;
        let (x, y) = ndc_of(&scene, id);

        scene.pointer_down(x, y);
        scene.pointer_move(x - 0.1, y + 0.05);
        scene.pointer_up();

        let (nx, ny) = ndc_of(&scene, id);
        assert!((nx - (x - 0.1)).abs() < 1e-3);
        assert!((ny - (y + 0.05)).abs() < 1e-3);
    }

    #[test]
    fn test_press_after_lost_release_restores_orbit() {
        let mut scene = scene(&three());
        let id = scene.objects()[0].id;
        let (x, y) = ndc_of(&scene, id);

        scene.pointer_down(x, y);
        scene.pointer_down(-0.99, 0.99);
        scene.pointer_up();
        assert!(scene.orbit().enabled);

        let before = scene.camera().position;
        scene.pointer_down(-0.99, 0.99);
        scene.pointer_move(-0.5, 0.99);
        scene.pointer_up();
        let orbited = scene.camera().position;
        assert_ne!(orbited, before);

        scene.zoom(2.0);
        assert_ne!(scene.camera().position, orbited);
    }

    #[test]
    fn test_drag_on_empty_space_orbits() {
        let mut scene = scene(&three());
        let before = scene.camera().position;
        scene.pointer_down(-0.99, 0.99);
        scene.pointer_move(-0.5, 0.99);
        scene.pointer_up();
        assert_ne!(scene.camera().position, before);
    }

    #[test]
    fn test_resize_updates_camera_aspect() {
        let mut scene = scene(&three());
        scene.resize(Viewport::below_header(1000, 564, 64, 1.0));
        assert!((scene.camera().aspect - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_same_kind_shares_geometry() {
        let shapes = vec![
            ShapeRecord::new(1, "a", ShapeKind::Cube),
            ShapeRecord::new(2, "b", ShapeKind::Cube),
        ];
        let scene = scene(&shapes);
        assert!(Arc::ptr_eq(&scene.objects()[0].mesh, &scene.objects()[1].mesh));
    }

    #[test]
    fn test_grid_is_not_pickable() {
        let mut scene = scene(&[]);
        // Straight down the view onto the ground plane
        assert_eq!(scene.click(0.0, -0.9), None);
        assert!(!scene.grid_lines().is_empty());
    }

    #[test]
    fn test_rgb_hex_roundtrip() {
        assert_eq!(Rgb::from_hex(0x12ab34).to_hex(), 0x12ab34);
    }

    proptest! {
        #[test]
        fn layout_symmetric_about_origin(count in 1usize..40) {
            for i in 0..count {
                let mirrored = layout_x(count - 1 - i, count);
                prop_assert!((layout_x(i, count) + mirrored).abs() < 1e-3);
            }
            if count > 1 {
                prop_assert!((layout_x(1, count) - layout_x(0, count) - LAYOUT_SPACING).abs() < 1e-4);
            }
        }
    }
}
