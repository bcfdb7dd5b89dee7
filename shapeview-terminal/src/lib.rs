/// Terminal front end: shape table, creation dialog and ASCII 3D viewer
use crossterm::{
    cursor,
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        MouseButton, MouseEvent, MouseEventKind,
    },
    execute, queue,
    terminal::{self, Clear, ClearType},
};
use std::cell::Cell;
use std::io::{self, stdout, Write};
use std::rc::Rc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use shapeview_core::{
    Catalog, KeyValueStore, RandomColors, RenderRequest, ShapeForm, TableView, Viewer, Viewport,
};

pub mod config;
pub mod renderer;
pub mod ui;

pub use config::{AppConfig, Args};
pub use renderer::AsciiRenderer;

/// Width/height ratio of one terminal cell
const CELL_ASPECT: f32 = 0.5;
const IDLE_POLL: Duration = Duration::from_millis(100);
const ORBIT_STEP: f32 = 0.1;
const SIZE_STEP: f32 = 0.1;
const ZOOM_STEP: f32 = 1.1;

/// Milliseconds since the Unix epoch, used as the id source for new shapes
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Table,
    Viewer,
}

/// Main application struct for the terminal front end
pub struct TerminalApp<S> {
    table: TableView<S>,
    form: ShapeForm,
    viewer: Viewer,
    renderer: AsciiRenderer,
    colors: RandomColors,
    screen: Screen,
    size_input: String,
    status: Option<String>,
    dirty: Rc<Cell<bool>>,
    started: Instant,
    width: u16,
    height: u16,
    running: bool,
}

impl<S: KeyValueStore> TerminalApp<S> {
    pub fn new(store: S, config: &AppConfig) -> io::Result<Self> {
        let (width, height) = terminal::size()?;
        Ok(Self::with_size(store, config, width, height))
    }

    /// Build the app for a known terminal size
    pub fn with_size(store: S, config: &AppConfig, width: u16, height: u16) -> Self {
        let mut catalog = Catalog::load(store);
        let dirty = Rc::new(Cell::new(true));
        {
            let dirty = Rc::clone(&dirty);
            catalog.subscribe(move |_| dirty.set(true));
        }

        Self {
            table: TableView::new(catalog, width, config.breakpoint),
            form: ShapeForm::new(),
            viewer: Viewer::new(config.fps),
            renderer: AsciiRenderer::new(width as usize, viewer_rows(height) as usize),
            colors: RandomColors,
            screen: Screen::Table,
            size_input: String::new(),
            status: None,
            dirty,
            started: Instant::now(),
            width,
            height,
            running: true,
        }
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn table(&self) -> &TableView<S> {
        &self.table
    }

    pub fn form(&self) -> &ShapeForm {
        &self.form
    }

    pub fn viewer(&self) -> &Viewer {
        &self.viewer
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn run(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(stdout(), terminal::EnterAlternateScreen, cursor::Hide)?;

        let result = self.main_loop();

        // Cleanup
        self.close_viewer();
        terminal::disable_raw_mode()?;
        execute!(
            stdout(),
            DisableMouseCapture,
            terminal::LeaveAlternateScreen,
            cursor::Show
        )?;

        result
    }

    /// Start directly in the viewer
    pub fn open_viewer(&mut self, request: RenderRequest) {
        let viewport = self.viewer_viewport();
        self.viewer
            .open(&request.shapes, viewport, &mut self.colors, self.started.elapsed());
        self.renderer.resize(self.width as usize, viewer_rows(self.height) as usize);
        self.size_input.clear();
        self.screen = Screen::Viewer;
        self.sync_mouse_capture();
    }

    fn close_viewer(&mut self) {
        if self.viewer.is_open() {
            self.viewer.close();
            self.sync_mouse_capture();
        }
        self.screen = Screen::Table;
        self.dirty.set(true);
    }

    /// Mouse capture follows the viewer's pointer listeners
    fn sync_mouse_capture(&self) {
        let pointer = self
            .viewer
            .listeners()
            .is_attached(shapeview_core::Listener::PointerDown);
        let result = if pointer {
            execute!(stdout(), EnableMouseCapture)
        } else {
            execute!(stdout(), DisableMouseCapture)
        };
        if let Err(e) = result {
            log::warn!("could not toggle mouse capture: {e}");
        }
    }

    fn viewer_viewport(&self) -> Viewport {
        Viewport::below_header(
            self.width as u32,
            self.height as u32,
            ui::VIEWER_HEADER_ROWS as u32,
            CELL_ASPECT,
        )
    }

    fn main_loop(&mut self) -> io::Result<()> {
        while self.running {
            let now = self.started.elapsed();
            let timeout = match self.screen {
                Screen::Viewer => self.viewer.frames().time_to_next(now),
                Screen::Table => IDLE_POLL,
            };

            // Handle input
            if event::poll(timeout)? {
                self.handle_event(event::read()?);
                while event::poll(Duration::ZERO)? {
                    self.handle_event(event::read()?);
                }
            }

            // Render
            match self.screen {
                Screen::Table => {
                    if self.dirty.replace(false) {
                        self.draw_table()?;
                        self.form.settle();
                    }
                }
                Screen::Viewer => {
                    if self.viewer.tick(self.started.elapsed()) {
                        self.draw_viewer()?;
                    }
                }
            }
        }

        Ok(())
    }

    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) if key.kind != KeyEventKind::Release => self.handle_key(key),
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            Event::Resize(width, height) => self.resize(width, height),
            _ => {}
        }
    }

    fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.table.resize(width);
        self.viewer.resize(self.viewer_viewport());
        self.renderer.resize(width as usize, viewer_rows(height) as usize);
        self.dirty.set(true);
    }

    fn handle_key(&mut self, key: KeyEvent) {
        match self.screen {
            Screen::Viewer => self.handle_viewer_key(key.code),
            Screen::Table if self.form.is_open() => self.handle_form_key(key.code),
            Screen::Table => self.handle_table_key(key.code),
        }
    }

    fn handle_table_key(&mut self, code: KeyCode) {
        self.status = None;
        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.running = false,
            KeyCode::Char('c') => self.form.open(),
            KeyCode::Char('a') => {
                let request = self.table.render_all();
                self.open_viewer(request);
            }
            KeyCode::Up | KeyCode::Char('k') => self.table.move_cursor(-1),
            KeyCode::Down | KeyCode::Char('j') => self.table.move_cursor(1),
            KeyCode::Char(' ') => {
                if let Some(id) = self.table.highlighted().map(|s| s.id) {
                    self.table.tap(id);
                }
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                if let Some(shape) = self.table.highlighted().cloned() {
                    self.table.delete(shape.id);
                    self.status = Some(format!("Deleted {}", shape.name));
                }
            }
            KeyCode::Char('r') | KeyCode::Enter => {
                let request = self
                    .table
                    .highlighted()
                    .and_then(|shape| self.table.render_one(shape.id));
                if let Some(request) = request {
                    self.open_viewer(request);
                }
            }
            _ => {}
        }
        self.dirty.set(true);
    }

    fn handle_form_key(&mut self, code: KeyCode) {
        use shapeview_core::Field;

        match code {
            KeyCode::Esc => self.form.cancel(),
            KeyCode::Tab | KeyCode::BackTab => self.form.focus_next(),
            KeyCode::Enter => match self.form.submit() {
                Ok(draft) => {
                    let record = self.table.create(draft, now_millis());
                    self.status = Some(format!("Created {}", record.name));
                }
                Err(errors) => log::debug!("form rejected: {errors:?}"),
            },
            KeyCode::Left | KeyCode::Up if self.form.focus() == Some(Field::Kind) => {
                self.form.cycle_kind(false)
            }
            KeyCode::Right | KeyCode::Down if self.form.focus() == Some(Field::Kind) => {
                self.form.cycle_kind(true)
            }
            KeyCode::Backspace => self.form.backspace(),
            KeyCode::Char(c) if self.form.focus() != Some(Field::Kind) => {
                self.form.set_focus(Field::Name);
                self.form.push_char(c);
            }
            _ => {}
        }
        self.dirty.set(true);
    }

    fn handle_viewer_key(&mut self, code: KeyCode) {
        if matches!(code, KeyCode::Esc | KeyCode::Char('q')) {
            self.close_viewer();
            return;
        }

        let Some(scene) = self.viewer.scene_mut() else {
            return;
        };
        match code {
            KeyCode::Left => scene.orbit_by(-ORBIT_STEP, 0.0),
            KeyCode::Right => scene.orbit_by(ORBIT_STEP, 0.0),
            KeyCode::Up => scene.orbit_by(0.0, ORBIT_STEP),
            KeyCode::Down => scene.orbit_by(0.0, -ORBIT_STEP),
            KeyCode::Char('p') => scene.toggle_projection(),
            KeyCode::Char('+') | KeyCode::Char('=') => {
                scene.nudge_size(SIZE_STEP);
            }
            KeyCode::Char('-') if self.size_input.is_empty() => {
                scene.nudge_size(-SIZE_STEP);
            }
            KeyCode::Char(c) if c.is_ascii_digit() || c == '.' => self.size_input.push(c),
            KeyCode::Backspace => {
                self.size_input.pop();
            }
            KeyCode::Enter => {
                scene.set_size_input(&self.size_input);
                self.size_input.clear();
            }
            _ => {}
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        if self.screen != Screen::Viewer {
            return;
        }
        let viewport = self.viewer_viewport();
        let Some(scene) = self.viewer.scene_mut() else {
            return;
        };

        let row = mouse.row.saturating_sub(ui::VIEWER_HEADER_ROWS);
        let (x, y) = viewport.to_ndc(mouse.column as f32 + 0.5, row as f32 + 0.5);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) if mouse.row >= ui::VIEWER_HEADER_ROWS => {
                scene.pointer_down(x, y);
            }
            MouseEventKind::Drag(MouseButton::Left) => scene.pointer_move(x, y),
            MouseEventKind::Up(MouseButton::Left) => scene.pointer_up(),
            MouseEventKind::ScrollUp => scene.zoom(1.0 / ZOOM_STEP),
            MouseEventKind::ScrollDown => scene.zoom(ZOOM_STEP),
            _ => {}
        }
    }

    fn draw_table(&mut self) -> io::Result<()> {
        let mut stdout = stdout();
        queue!(stdout, Clear(ClearType::All))?;

        let rows = self.table.rows();
        let lines = ui::table_lines(&rows, self.table.layout(), self.status.as_deref());
        ui::draw_lines(&mut stdout, &lines, 0, 0, self.width)?;

        if self.form.is_open() {
            let form_lines = ui::form_lines(&self.form);
            let box_width = form_lines.iter().map(|l| l.text.chars().count()).max().unwrap_or(0) as u16;
            let left = self.width.saturating_sub(box_width) / 2;
            let top = self.height.saturating_sub(form_lines.len() as u16) / 2;
            ui::draw_lines(&mut stdout, &form_lines, top, left, self.width - left)?;
        }

        stdout.flush()
    }

    fn draw_viewer(&mut self) -> io::Result<()> {
        let Some(scene) = self.viewer.scene() else {
            return Ok(());
        };

        self.renderer.clear();
        self.renderer.render_scene(scene);

        let mut stdout = stdout();
        self.renderer.draw(&mut stdout, ui::VIEWER_HEADER_ROWS)?;

        // Draw UI overlay
        let header = ui::viewer_header(scene, self.viewer.frames().fps(), &self.size_input);
        ui::draw_lines(&mut stdout, &header, 0, 0, self.width)?;

        stdout.flush()
    }
}

fn viewer_rows(height: u16) -> u16 {
    height.saturating_sub(ui::VIEWER_HEADER_ROWS).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;
    use shapeview_core::{FileStore, MemoryStore, ShapeKind};

    fn app() -> TerminalApp<MemoryStore> {
        TerminalApp::with_size(MemoryStore::new(), &AppConfig::default(), 100, 40)
    }

    fn press(app: &mut TerminalApp<MemoryStore>, code: KeyCode) {
        press_any(app, code);
    }

    fn press_any<S: KeyValueStore>(app: &mut TerminalApp<S>, code: KeyCode) {
        app.handle_event(Event::Key(KeyEvent::new(code, KeyModifiers::NONE)));
    }

    fn type_text(app: &mut TerminalApp<MemoryStore>, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    #[test]
    fn test_create_shape_through_form() {
        let mut app = app();
        press(&mut app, KeyCode::Char('c'));
        assert!(app.form().is_open());

        type_text(&mut app, "a very long shape name");
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Enter);

        assert!(!app.form().is_open());
        let shapes = app.table().catalog().shapes();
        assert_eq!(shapes.len(), 1);
        assert_eq!(shapes[0].name, "a very long shap");
        assert_eq!(shapes[0].kind, ShapeKind::Sphere);
    }

    #[test]
    fn test_invalid_form_creates_nothing() {
        let mut app = app();
        press(&mut app, KeyCode::Char('c'));
        press(&mut app, KeyCode::Enter);
        assert!(app.form().is_open());
        assert!(app.form().errors().name.is_some());
        assert!(app.table().catalog().is_empty());

        press(&mut app, KeyCode::Esc);
        assert!(!app.form().is_open());
    }

    #[test]
    fn test_delete_highlighted_row() {
        let mut app = app();
        for name in ["one", "two"] {
            press(&mut app, KeyCode::Char('c'));
            type_text(&mut app, name);
            press(&mut app, KeyCode::Tab);
            press(&mut app, KeyCode::Left);
            press(&mut app, KeyCode::Enter);
        }
        press(&mut app, KeyCode::Char('d'));
        let names: Vec<_> = app.table().catalog().shapes().iter().map(|s| s.name.clone()).collect();
        assert_eq!(names, vec!["one"]);
        assert_eq!(app.table().catalog().repository().get_shapes().len(), 1);
    }

    #[test]
    fn test_created_shapes_survive_restart() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = AppConfig::default();

        let mut first = TerminalApp::with_size(FileStore::new(dir.path()), &config, 100, 40);
        press_any(&mut first, KeyCode::Char('c'));
        for c in "disk".chars() {
            press_any(&mut first, KeyCode::Char(c));
        }
        press_any(&mut first, KeyCode::Tab);
        press_any(&mut first, KeyCode::Right);
        press_any(&mut first, KeyCode::Enter);

        let second = TerminalApp::with_size(FileStore::new(dir.path()), &config, 100, 40);
        assert_eq!(second.table().catalog().shapes(), first.table().catalog().shapes());
        assert_eq!(second.table().catalog().shapes()[0].name, "disk");
    }

    #[test]
    fn test_resize_collapses_table() {
        let mut app = app();
        app.handle_event(Event::Resize(30, 20));
        assert_eq!(app.table().layout(), shapeview_core::TableLayout::Collapsed);
    }

    #[test]
    fn test_quit_key_stops_app() {
        let mut app = app();
        press(&mut app, KeyCode::Char('q'));
        assert!(!app.is_running());
    }
}
