/// Shapeview Web - browser bindings for the shape catalog and viewer
///
/// The catalog persists to `localStorage`. The viewer keeps the scene state
/// (layout, selection, drag, size) in Rust and hands JavaScript a JSON view of
/// every mesh and the camera to draw each frame.
use serde::Serialize;
use std::time::Duration;
use wasm_bindgen::prelude::*;

use shapeview_core::form::FormErrors;
use shapeview_core::{
    Catalog, ColorSource, Rgb, Scene, SceneObject, ShapeForm, ShapeId, ShapeRecord, TableLayout,
    TableView, Viewer, Viewport,
};

pub mod storage;

pub use storage::LocalStorageStore;

/// Viewport width, in CSS pixels, below which the table collapses
pub const TABLE_BREAKPOINT_PX: u16 = 600;

/// Colors from `Math.random()`
#[derive(Debug, Clone, Copy, Default)]
pub struct MathRandomColors;

impl ColorSource for MathRandomColors {
    fn next_color(&mut self) -> Rgb {
        Rgb::from_hex((js_sys::Math::random() * 0xFF_FFFF as f64) as u32)
    }
}

#[derive(Debug, Serialize)]
struct ErrorsView {
    name: Option<&'static str>,
    #[serde(rename = "type")]
    kind: Option<&'static str>,
}

fn errors_json(errors: &FormErrors) -> String {
    let view = ErrorsView {
        name: errors.name,
        kind: errors.kind,
    };
    serde_json::to_string(&view).unwrap_or_default()
}

/// What JavaScript needs to draw one mesh
#[derive(Debug, Serialize)]
struct ObjectView<'a> {
    id: ShapeId,
    name: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    position: [f32; 3],
    scale: [f32; 3],
    color: String,
    selected: bool,
}

impl<'a> ObjectView<'a> {
    fn new(object: &'a SceneObject, selected: bool) -> Self {
        let position = object.transform.position;
        let scale = object.transform.scale;
        Self {
            id: object.shape.id,
            name: &object.shape.name,
            kind: object.shape.kind.label(),
            position: [position.x, position.y, position.z],
            scale: [scale.x, scale.y, scale.z],
            color: format!("#{:06x}", object.color.to_hex()),
            selected,
        }
    }
}

#[derive(Debug, Serialize)]
struct CameraView {
    position: [f32; 3],
    target: [f32; 3],
    fov_degrees: f32,
    aspect: f32,
}

fn objects_json(scene: &Scene) -> String {
    let views: Vec<_> = scene
        .objects()
        .iter()
        .map(|object| ObjectView::new(object, scene.selected() == Some(object.id)))
        .collect();
    serde_json::to_string(&views).unwrap_or_else(|_| "[]".to_string())
}

fn camera_json(scene: &Scene) -> String {
    let camera = scene.camera();
    let view = CameraView {
        position: [camera.position.x, camera.position.y, camera.position.z],
        target: [camera.target.x, camera.target.y, camera.target.z],
        fov_degrees: camera.fov.to_degrees(),
        aspect: camera.aspect,
    };
    serde_json::to_string(&view).unwrap_or_default()
}

fn to_js(error: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&error.to_string())
}

/// Shape catalog backed by `localStorage`
#[wasm_bindgen]
pub struct WebCatalog {
    table: TableView<LocalStorageStore>,
}

#[wasm_bindgen]
impl WebCatalog {
    #[wasm_bindgen(constructor)]
    pub fn new(width: u16) -> Result<WebCatalog, JsValue> {
        let store = LocalStorageStore::from_window().map_err(to_js)?;
        let catalog = Catalog::load(store);
        Ok(WebCatalog {
            table: TableView::new(catalog, width, TABLE_BREAKPOINT_PX),
        })
    }

    /// All records as a JSON array
    pub fn shapes_json(&self) -> String {
        serde_json::to_string(self.table.catalog().shapes()).unwrap_or_else(|_| "[]".to_string())
    }

    /// Validate and create a shape. Returns the new record as JSON, or throws
    /// a JSON object with one message per invalid field.
    pub fn create(&mut self, name: &str, kind: &str) -> Result<String, JsValue> {
        let mut form = ShapeForm::new();
        form.set_name(name);
        form.select_kind(kind.parse().ok());

        let draft = form
            .submit()
            .map_err(|errors| JsValue::from_str(&errors_json(&errors)))?;
        let record = self.table.create(draft, js_sys::Date::now() as u64);
        serde_json::to_string(&record).map_err(to_js)
    }

    pub fn remove(&mut self, id: f64) {
        self.table.delete(id as ShapeId);
    }

    pub fn resize(&mut self, width: u16) {
        self.table.resize(width);
    }

    pub fn collapsed(&self) -> bool {
        self.table.layout() == TableLayout::Collapsed
    }

    pub fn toggle_row(&mut self, id: f64) {
        self.table.tap(id as ShapeId);
    }

    pub fn expanded(&self) -> Option<f64> {
        self.table.catalog().expanded().map(|id| id as f64)
    }
}

/// Interactive scene for a canvas of `width` x `height` pixels minus a header
#[wasm_bindgen]
pub struct WebViewer {
    viewer: Viewer,
    colors: MathRandomColors,
}

#[wasm_bindgen]
impl WebViewer {
    #[wasm_bindgen(constructor)]
    pub fn new(fps: u32) -> WebViewer {
        WebViewer {
            viewer: Viewer::new(fps),
            colors: MathRandomColors,
        }
    }

    pub fn open_all(&mut self, catalog: &WebCatalog, width: u32, height: u32, header: u32, now_ms: f64) {
        let request = catalog.table.render_all();
        self.open(&request.shapes, width, height, header, now_ms);
    }

    pub fn open_one(
        &mut self,
        catalog: &WebCatalog,
        id: f64,
        width: u32,
        height: u32,
        header: u32,
        now_ms: f64,
    ) -> bool {
        match catalog.table.render_one(id as ShapeId) {
            Some(request) => {
                self.open(&request.shapes, width, height, header, now_ms);
                true
            }
            None => false,
        }
    }

    pub fn close(&mut self) {
        self.viewer.close();
    }

    pub fn is_open(&self) -> bool {
        self.viewer.is_open()
    }

    pub fn mesh_count(&self) -> usize {
        self.viewer.scene().map_or(0, |scene| scene.mesh_count())
    }

    pub fn resize(&mut self, width: u32, height: u32, header: u32) {
        self.viewer
            .resize(Viewport::below_header(width, height, header, 1.0));
    }

    /// Whether a frame is due at `now_ms`
    pub fn frame(&mut self, now_ms: f64) -> bool {
        self.viewer.tick(duration_from_ms(now_ms))
    }

    pub fn pointer_down(&mut self, x: f32, y: f32) {
        if let Some(scene) = self.viewer.scene_mut() {
            let (nx, ny) = scene.viewport().to_ndc(x, y);
            scene.pointer_down(nx, ny);
        }
    }

    pub fn pointer_move(&mut self, x: f32, y: f32) {
        if let Some(scene) = self.viewer.scene_mut() {
            let (nx, ny) = scene.viewport().to_ndc(x, y);
            scene.pointer_move(nx, ny);
        }
    }

    pub fn pointer_up(&mut self) {
        if let Some(scene) = self.viewer.scene_mut() {
            scene.pointer_up();
        }
    }

    pub fn zoom(&mut self, factor: f32) {
        if let Some(scene) = self.viewer.scene_mut() {
            scene.zoom(factor);
        }
    }

    /// Apply the size control's text; returns the size now shown
    pub fn set_size(&mut self, value: &str) -> f32 {
        match self.viewer.scene_mut() {
            Some(scene) => {
                scene.set_size_input(value);
                scene.size()
            }
            None => shapeview_core::scene::DEFAULT_SIZE,
        }
    }

    pub fn selected_id(&self) -> Option<f64> {
        self.viewer
            .scene()
            .and_then(|scene| scene.selected_record())
            .map(|shape| shape.id as f64)
    }

    pub fn objects_json(&self) -> String {
        self.viewer.scene().map_or_else(|| "[]".to_string(), objects_json)
    }

    pub fn camera_json(&self) -> String {
        self.viewer.scene().map_or_else(String::new, camera_json)
    }
}

impl WebViewer {
    fn open(&mut self, shapes: &[ShapeRecord], width: u32, height: u32, header: u32, now_ms: f64) {
        let viewport = Viewport::below_header(width, height, header, 1.0);
        self.viewer
            .open(shapes, viewport, &mut self.colors, duration_from_ms(now_ms));
    }
}

fn duration_from_ms(ms: f64) -> Duration {
    Duration::from_secs_f64(ms.max(0.0) / 1000.0)
}

#[wasm_bindgen(start)]
pub fn main() -> Result<(), JsValue> {
    // Setup panic hook for better error messages in browser console
    console_error_panic_hook::set_once();

    console_log::init_with_level(log::Level::Info)
        .map_err(|e| JsValue::from_str(&format!("Failed to init logger: {}", e)))?;

    log::info!("shapeview web bindings loaded");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shapeview_core::ShapeKind;

    #[test]
    fn test_errors_json_uses_field_names() {
        let errors = FormErrors {
            name: Some("Name is required"),
            kind: None,
        };
        assert_eq!(errors_json(&errors), r#"{"name":"Name is required","type":null}"#);
    }

    #[test]
    fn test_objects_json_marks_selection() {
        let shapes = [
            ShapeRecord::new(2, "b", ShapeKind::Cube),
            ShapeRecord::new(1, "a", ShapeKind::Sphere),
        ];
        let mut scene = Scene::new(&shapes, Viewport::new(800, 600), &mut || Rgb::from_hex(0x00ff80));
        let center = scene.objects()[0].transform.position;
        let ndc = scene
            .camera()
            .project_to_ndc(&center, &scene.camera().view_projection())
            .unwrap();
        scene.click(ndc.x, ndc.y);

        let json: serde_json::Value = serde_json::from_str(&objects_json(&scene)).unwrap();
        assert_eq!(json[0]["id"], 1);
        assert_eq!(json[0]["selected"], true);
        assert_eq!(json[1]["selected"], false);
        assert_eq!(json[0]["color"], "#00ff80");
        assert_eq!(json[1]["position"][0], 1.25);
    }

    #[test]
    fn test_duration_from_ms() {
        assert_eq!(duration_from_ms(1500.0), Duration::from_millis(1500));
        assert_eq!(duration_from_ms(-3.0), Duration::ZERO);
    }
}
