/// Example: open the viewer on one shape of each kind, without touching disk
///
/// Usage: cargo run --example render_all
use std::io;

use shapeview_core::{Catalog, MemoryStore, ShapeDraft, ShapeKind, TableView};
use shapeview_terminal::{now_millis, AppConfig, TerminalApp};

fn main() -> io::Result<()> {
    let config = AppConfig {
        log_file: None,
        ..AppConfig::default()
    };

    let mut table = TableView::new(Catalog::load(MemoryStore::new()), 80, config.breakpoint);
    for kind in ShapeKind::ALL {
        table.create(
            ShapeDraft {
                name: kind.label().to_lowercase(),
                kind,
            },
            now_millis(),
        );
    }
    let store = table.catalog().repository().store().clone();

    let mut app = TerminalApp::new(store, &config)?;
    let request = app.table().render_all();
    app.open_viewer(request);
    app.run()
}
