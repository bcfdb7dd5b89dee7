//! Viewer lifecycle: scene, frame loop and input listeners
//!
//! Opening the viewer builds a fresh [`Scene`], attaches the input listeners
//! and starts the frame loop. Closing stops the loop, detaches every listener
//! and drops the scene with all of its meshes, so an open/close cycle leaves
//! nothing behind.

use std::time::Duration;

use crate::projection::Viewport;
use crate::scene::{ColorSource, Scene};
use crate::shape::ShapeRecord;

pub const DEFAULT_FPS: u32 = 30;

/// Input sources the viewer listens to while open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Listener {
    Resize,
    PointerDown,
    PointerMove,
    PointerUp,
    Keyboard,
}

impl Listener {
    pub const ALL: [Listener; 5] = [
        Listener::Resize,
        Listener::PointerDown,
        Listener::PointerMove,
        Listener::PointerUp,
        Listener::Keyboard,
    ];
}

#[derive(Debug, Clone, Default)]
pub struct InputListeners {
    attached: Vec<Listener>,
}

impl InputListeners {
    pub fn attach_all(&mut self) {
        for listener in Listener::ALL {
            if !self.attached.contains(&listener) {
                self.attached.push(listener);
            }
        }
    }

    pub fn detach_all(&mut self) {
        self.attached.clear();
    }

    pub fn is_attached(&self, listener: Listener) -> bool {
        self.attached.contains(&listener)
    }

    pub fn len(&self) -> usize {
        self.attached.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attached.is_empty()
    }
}

/// Frame pacing driven by the host clock.
///
/// Times are offsets from any fixed origin the host chooses (process start,
/// `performance.now()`), so the loop itself never reads a clock.
#[derive(Debug, Clone)]
pub struct FrameLoop {
    target_frame_time: Duration,
    running: bool,
    last_frame: Option<Duration>,
    window_start: Duration,
    frame_count: u32,
    fps: f32,
}

impl FrameLoop {
    pub fn new(fps: u32) -> Self {
        Self {
            target_frame_time: Duration::from_secs(1) / fps.max(1),
            running: false,
            last_frame: None,
            window_start: Duration::ZERO,
            frame_count: 0,
            fps: 0.0,
        }
    }

    pub fn start(&mut self, now: Duration) {
        self.running = true;
        self.last_frame = None;
        self.window_start = now;
        self.frame_count = 0;
        self.fps = 0.0;
    }

    pub fn stop(&mut self) {
        self.running = false;
        self.last_frame = None;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn target_frame_time(&self) -> Duration {
        self.target_frame_time
    }

    /// Frames per second measured over the last full second
    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// Whether a frame is due at `now`; a due frame is counted
    pub fn tick(&mut self, now: Duration) -> bool {
        if !self.running {
            return false;
        }
        if let Some(last) = self.last_frame {
            if now.saturating_sub(last) < self.target_frame_time {
                return false;
            }
        }

        self.last_frame = Some(now);
        self.frame_count += 1;

        let window = now.saturating_sub(self.window_start);
        if window >= Duration::from_secs(1) {
            self.fps = self.frame_count as f32 / window.as_secs_f32();
            self.frame_count = 0;
            self.window_start = now;
        }
        true
    }

    /// Time left until the next frame is due
    pub fn time_to_next(&self, now: Duration) -> Duration {
        match self.last_frame {
            Some(last) if self.running => (last + self.target_frame_time).saturating_sub(now),
            _ => Duration::ZERO,
        }
    }
}

impl Default for FrameLoop {
    fn default() -> Self {
        Self::new(DEFAULT_FPS)
    }
}

#[derive(Debug, Default)]
pub struct Viewer {
    scene: Option<Scene>,
    frames: FrameLoop,
    listeners: InputListeners,
}

impl Viewer {
    pub fn new(fps: u32) -> Self {
        Self {
            scene: None,
            frames: FrameLoop::new(fps),
            listeners: InputListeners::default(),
        }
    }

    /// Show `shapes`, replacing any scene already open
    pub fn open(
        &mut self,
        shapes: &[ShapeRecord],
        viewport: Viewport,
        colors: &mut dyn ColorSource,
        now: Duration,
    ) {
        if self.is_open() {
            self.close();
        }
        self.scene = Some(Scene::new(shapes, viewport, colors));
        self.listeners.attach_all();
        self.frames.start(now);
        log::info!("viewer opened with {} shapes", shapes.len());
    }

    /// Stop the loop, detach listeners and release the scene
    pub fn close(&mut self) {
        if !self.is_open() {
            return;
        }
        self.frames.stop();
        self.listeners.detach_all();
        self.scene = None;
        log::info!("viewer closed");
    }

    pub fn is_open(&self) -> bool {
        self.scene.is_some()
    }

    pub fn scene(&self) -> Option<&Scene> {
        self.scene.as_ref()
    }

    pub fn scene_mut(&mut self) -> Option<&mut Scene> {
        self.scene.as_mut()
    }

    pub fn frames(&self) -> &FrameLoop {
        &self.frames
    }

    pub fn listeners(&self) -> &InputListeners {
        &self.listeners
    }

    /// Whether the host should draw a frame at `now`
    pub fn tick(&mut self, now: Duration) -> bool {
        self.is_open() && self.frames.tick(now)
    }

    pub fn resize(&mut self, viewport: Viewport) {
        if let Some(scene) = self.scene.as_mut() {
            scene.resize(viewport);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Rgb;
    use crate::shape::ShapeKind;

    fn shapes() -> Vec<ShapeRecord> {
        vec![
            ShapeRecord::new(1, "a", ShapeKind::Sphere),
            ShapeRecord::new(2, "b", ShapeKind::Cylinder),
        ]
    }

    fn open(viewer: &mut Viewer, shapes: &[ShapeRecord]) {
        let mut colors = || Rgb::new(10, 20, 30);
        viewer.open(shapes, Viewport::new(80, 24), &mut colors, Duration::ZERO);
    }

    #[test]
    fn test_open_close_cycles_do_not_leak() {
        let mut viewer = Viewer::new(30);
        for _ in 0..3 {
            open(&mut viewer, &shapes());
            assert_eq!(viewer.scene().unwrap().mesh_count(), 2);
            assert_eq!(viewer.listeners().len(), Listener::ALL.len());
            assert!(viewer.frames().is_running());

            viewer.close();
            assert!(viewer.scene().is_none());
            assert!(viewer.listeners().is_empty());
            assert!(!viewer.frames().is_running());
        }
    }

    #[test]
    fn test_reopen_replaces_scene() {
        let mut viewer = Viewer::new(30);
        open(&mut viewer, &shapes());
        open(&mut viewer, &shapes()[..1]);
        assert_eq!(viewer.scene().unwrap().mesh_count(), 1);
        assert_eq!(viewer.listeners().len(), Listener::ALL.len());
    }

    #[test]
    fn test_closed_viewer_never_ticks() {
        let mut viewer = Viewer::new(30);
        open(&mut viewer, &shapes());
        assert!(viewer.tick(Duration::from_millis(0)));
        viewer.close();
        assert!(!viewer.tick(Duration::from_secs(5)));
    }

    #[test]
    fn test_frame_loop_paces_frames() {
        let mut frames = FrameLoop::new(10);
        frames.start(Duration::ZERO);
        assert!(frames.tick(Duration::ZERO));
        assert!(!frames.tick(Duration::from_millis(50)));
        assert_eq!(frames.time_to_next(Duration::from_millis(50)), Duration::from_millis(50));
        assert!(frames.tick(Duration::from_millis(100)));
    }

    #[test]
    fn test_frame_loop_measures_fps() {
        let mut frames = FrameLoop::new(10);
        frames.start(Duration::ZERO);
        for i in 0..=10 {
            frames.tick(Duration::from_millis(i * 100));
        }
        assert!((frames.fps() - 11.0).abs() < 1e-3);
    }
}
