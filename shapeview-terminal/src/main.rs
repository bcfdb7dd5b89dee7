/// Shapeview - catalogue shapes and inspect them in a terminal 3D viewer
///
/// Controls:
///   - Table: c=create, a=render all, r=render, d=delete, space=details, q=quit
///   - Viewer: click=select, drag=move, arrows=orbit, +/- or digits=size, q/ESC=close
use clap::Parser;
use std::fs::{self, OpenOptions};
use std::io;

use shapeview_core::FileStore;
use shapeview_terminal::{AppConfig, Args, TerminalApp};

fn init_logging(config: &AppConfig) -> io::Result<()> {
    let Some(path) = &config.log_file else {
        return Ok(());
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    // Stdout belongs to the UI in raw mode, so records go to the file only
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

fn main() -> io::Result<()> {
    let config = AppConfig::from_args(Args::parse());
    init_logging(&config)?;
    log::info!("using store at {}", config.store_dir.display());

    let store = FileStore::new(&config.store_dir);
    let mut app = TerminalApp::new(store, &config)?;
    app.run()
}
