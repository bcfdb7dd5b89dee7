/// ASCII rasterizer for terminal rendering
use crossterm::{
    cursor,
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use nalgebra::{Matrix4, Point3, Vector3};
use shapeview_core::{Camera, ProjectionMode, Rgb, Scene, SceneObject, Triangle, Viewport};
use std::io::Write;

/// Character luminosity ramp for depth/shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &['.', ':', '-', '=', '+', '*', '#', '%', '@'];

const GRID_CHAR: char = '.';
const GRID_COLOR: Color = Color::DarkGrey;

/// Ambient and directional light weights
const AMBIENT: f32 = 0.3;
const DIFFUSE: f32 = 0.7;
const SELECTED_BOOST: f32 = 1.4;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Cell {
    character: char,
    color: Color,
}

const BLANK: Cell = Cell {
    character: ' ',
    color: Color::Reset,
};

/// ASCII renderer that converts 3D scenes to terminal characters
pub struct AsciiRenderer {
    width: usize,
    height: usize,
    depth_buffer: Vec<f32>,
    cells: Vec<Cell>,
    light_dir: Vector3<f32>,
}

impl AsciiRenderer {
    pub fn new(width: usize, height: usize) -> Self {
        let size = width * height;
        Self {
            width,
            height,
            depth_buffer: vec![f32::INFINITY; size],
            cells: vec![BLANK; size],
            light_dir: Vector3::new(1.0, 1.0, 1.0).normalize(),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Reallocate the buffers for a new output size
    pub fn resize(&mut self, width: usize, height: usize) {
        if (width, height) != (self.width, self.height) {
            *self = Self::new(width, height);
        }
    }

    pub fn clear(&mut self) {
        self.depth_buffer.fill(f32::INFINITY);
        self.cells.fill(BLANK);
    }

    /// Character at a cell, for inspection
    pub fn char_at(&self, x: usize, y: usize) -> Option<char> {
        (x < self.width && y < self.height).then(|| self.cells[y * self.width + x].character)
    }

    fn viewport(&self) -> Viewport {
        Viewport::new(self.width as u32, self.height as u32)
    }

    /// Rasterize the ground grid and every scene object
    pub fn render_scene(&mut self, scene: &Scene) {
        let camera = scene.camera();
        for (from, to) in scene.grid_lines() {
            self.render_line(&from, &to, camera);
        }
        for object in scene.objects() {
            let selected = scene.selected() == Some(object.id);
            self.render_object(object, camera, selected);
        }
    }

    fn render_object(&mut self, object: &SceneObject, camera: &Camera, selected: bool) {
        let model = object.transform.model_matrix();
        for triangle in &object.mesh.triangles {
            self.render_triangle(triangle, &model, camera, object.color, selected);
        }
    }

    fn render_triangle(
        &mut self,
        triangle: &Triangle,
        model_matrix: &Matrix4<f32>,
        camera: &Camera,
        color: Rgb,
        selected: bool,
    ) {
        // Uniform scale and translation leave face normals unchanged
        let normal = triangle.calculate_normal();
        let anchor = model_matrix.transform_point(&triangle.vertices[0].position);
        let to_camera = match camera.mode {
            ProjectionMode::Perspective => camera.position - anchor,
            ProjectionMode::Orthographic => -camera.forward(),
        };
        if normal.dot(&to_camera) <= 0.0 {
            return;
        }

        // Project vertices to screen space
        let viewport = self.viewport();
        let mut screen_coords = [(0.0, 0.0, 0.0); 3];
        for (coords, vertex) in screen_coords.iter_mut().zip(&triangle.vertices) {
            match camera.project_to_screen(&vertex.position, model_matrix, &viewport) {
                Some(projected) => *coords = projected,
                None => return, // Triangle is clipped
            }
        }

        let mut brightness = AMBIENT + DIFFUSE * normal.dot(&self.light_dir).max(0.0);
        if selected {
            brightness *= SELECTED_BOOST;
        }

        // Map brightness to character
        let char_index = (brightness.min(1.0) * (LUMINOSITY_RAMP.len() - 1) as f32) as usize;
        let character = LUMINOSITY_RAMP[char_index.min(LUMINOSITY_RAMP.len() - 1)];
        let shaded = color.shade(brightness);
        let cell = Cell {
            character,
            color: Color::Rgb {
                r: shaded.r,
                g: shaded.g,
                b: shaded.b,
            },
        };

        self.rasterize_triangle(&screen_coords, cell);
    }

    fn render_line(&mut self, from: &Point3<f32>, to: &Point3<f32>, camera: &Camera) {
        let viewport = self.viewport();
        let identity = Matrix4::identity();
        let (Some(a), Some(b)) = (
            camera.project_to_screen(from, &identity, &viewport),
            camera.project_to_screen(to, &identity, &viewport),
        ) else {
            return;
        };

        let steps = (b.0 - a.0).abs().max((b.1 - a.1).abs()).ceil().max(1.0) as usize;
        let cell = Cell {
            character: GRID_CHAR,
            color: GRID_COLOR,
        };
        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            let x = a.0 + (b.0 - a.0) * t;
            let y = a.1 + (b.1 - a.1) * t;
            let depth = a.2 + (b.2 - a.2) * t;
            self.plot(x.floor() as i32, y.floor() as i32, depth, cell);
        }
    }

    fn plot(&mut self, x: i32, y: i32, depth: f32, cell: Cell) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return;
        }
        let idx = y as usize * self.width + x as usize;
        if depth < self.depth_buffer[idx] {
            self.depth_buffer[idx] = depth;
            self.cells[idx] = cell;
        }
    }

    fn rasterize_triangle(&mut self, coords: &[(f32, f32, f32); 3], cell: Cell) {
        let (v0, v1, v2) = (coords[0], coords[1], coords[2]);

        // Bounding box clipped to screen bounds
        let min_x = (v0.0.min(v1.0).min(v2.0).floor() as i32).max(0);
        let max_x = (v0.0.max(v1.0).max(v2.0).ceil() as i32).min(self.width as i32 - 1);
        let min_y = (v0.1.min(v1.1).min(v2.1).floor() as i32).max(0);
        let max_y = (v0.1.max(v1.1).max(v2.1).ceil() as i32).min(self.height as i32 - 1);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let p = (x as f32 + 0.5, y as f32 + 0.5);
                let Some((w0, w1, w2)) = barycentric((v0.0, v0.1), (v1.0, v1.1), (v2.0, v2.1), p)
                else {
                    continue;
                };
                if w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0 {
                    let depth = w0 * v0.2 + w1 * v1.2 + w2 * v2.2;
                    self.plot(x, y, depth, cell);
                }
            }
        }
    }

    /// Write the buffer starting at terminal row `top`
    pub fn draw<W: Write>(&self, writer: &mut W, top: u16) -> std::io::Result<()> {
        let mut current = None;
        for y in 0..self.height {
            writer.queue(cursor::MoveTo(0, top + y as u16))?;
            for cell in &self.cells[y * self.width..(y + 1) * self.width] {
                if current != Some(cell.color) {
                    writer.queue(SetForegroundColor(cell.color))?;
                    current = Some(cell.color);
                }
                writer.queue(Print(cell.character))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(
    v0: (f32, f32),
    v1: (f32, f32),
    v2: (f32, f32),
    p: (f32, f32),
) -> Option<(f32, f32, f32)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use shapeview_core::{ShapeKind, ShapeRecord};

    fn scene(width: u32, height: u32) -> Scene {
        let shapes = [ShapeRecord::new(1, "box", ShapeKind::Cube)];
        Scene::new(&shapes, Viewport::new(width, height), &mut || Rgb::new(200, 100, 50))
    }

    #[test]
    fn test_barycentric_center() {
        let (w0, w1, w2) = barycentric((0.0, 0.0), (3.0, 0.0), (0.0, 3.0), (1.0, 1.0)).unwrap();
        assert!((w0 + w1 + w2 - 1.0).abs() < 1e-6);
        assert!(w0 > 0.0 && w1 > 0.0 && w2 > 0.0);
    }

    #[test]
    fn test_degenerate_triangle_has_no_coordinates() {
        assert!(barycentric((0.0, 0.0), (1.0, 1.0), (2.0, 2.0), (1.0, 1.0)).is_none());
    }

    #[test]
    fn test_scene_draws_shape_at_screen_center() {
        let mut renderer = AsciiRenderer::new(80, 40);
        let scene = scene(80, 40);
        renderer.render_scene(&scene);

        let center = scene.objects()[0].transform.position;
        let (x, y, _) = scene
            .camera()
            .project_to_screen(&center, &Matrix4::identity(), &renderer.viewport())
            .unwrap();
        let cell = renderer.cells[y as usize * renderer.width + x as usize];
        assert!(LUMINOSITY_RAMP.contains(&cell.character));
        assert!(matches!(cell.color, Color::Rgb { .. }));
    }

    #[test]
    fn test_clear_and_resize() {
        let mut renderer = AsciiRenderer::new(10, 5);
        renderer.render_scene(&scene(10, 5));
        renderer.clear();
        assert!((0..10).all(|x| renderer.char_at(x, 2) == Some(' ')));

        renderer.resize(20, 8);
        assert_eq!((renderer.width(), renderer.height()), (20, 8));
        assert_eq!(renderer.char_at(20, 0), None);
    }

    #[test]
    fn test_draw_emits_every_row() {
        let renderer = AsciiRenderer::new(4, 3);
        let mut out = Vec::new();
        renderer.draw(&mut out, 2).unwrap();
        assert!(!out.is_empty());
    }
}
