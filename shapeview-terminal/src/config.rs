/// Command line configuration for the terminal front end
use clap::Parser;
use std::path::PathBuf;

use shapeview_core::table::DEFAULT_BREAKPOINT;
use shapeview_core::viewer::DEFAULT_FPS;

const APP_DIR: &str = "shapeview";
const LOG_FILE: &str = "shapeview.log";

#[derive(Debug, Parser)]
#[command(name = "shapeview", version, about = "Catalogue shapes and view them in 3D")]
pub struct Args {
    /// Directory holding the shape store (default: user data dir)
    #[arg(long, value_name = "DIR")]
    pub store_dir: Option<PathBuf>,

    /// Viewer frame rate
    #[arg(long, default_value_t = DEFAULT_FPS)]
    pub fps: u32,

    /// Terminal width below which the table collapses to one column
    #[arg(long, value_name = "COLS", default_value_t = DEFAULT_BREAKPOINT)]
    pub breakpoint: u16,

    /// Do not write a log file
    #[arg(long)]
    pub no_log: bool,
}

/// Resolved settings
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub store_dir: PathBuf,
    pub fps: u32,
    pub breakpoint: u16,
    pub log_file: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_args(args: Args) -> Self {
        let store_dir = args.store_dir.unwrap_or_else(default_store_dir);
        let log_file = (!args.no_log).then(|| store_dir.join(LOG_FILE));
        Self {
            fps: args.fps.clamp(1, 120),
            breakpoint: args.breakpoint,
            log_file,
            store_dir,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_args(Args {
            store_dir: None,
            fps: DEFAULT_FPS,
            breakpoint: DEFAULT_BREAKPOINT,
            no_log: false,
        })
    }
}

fn default_store_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from(".").join(format!(".{APP_DIR}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_store_dir_and_clamped_fps() {
        let args = Args::parse_from(["shapeview", "--store-dir", "/tmp/shapes", "--fps", "500"]);
        let config = AppConfig::from_args(args);
        assert_eq!(config.store_dir, PathBuf::from("/tmp/shapes"));
        assert_eq!(config.fps, 120);
        assert_eq!(config.log_file, Some(PathBuf::from("/tmp/shapes/shapeview.log")));
    }

    #[test]
    fn test_no_log_disables_log_file() {
        let args = Args::parse_from(["shapeview", "--no-log", "--breakpoint", "40"]);
        let config = AppConfig::from_args(args);
        assert_eq!(config.log_file, None);
        assert_eq!(config.breakpoint, 40);
        assert_eq!(config.fps, DEFAULT_FPS);
    }

    #[test]
    fn test_default_store_dir_is_named() {
        assert!(AppConfig::default().store_dir.ends_with("shapeview")
            || AppConfig::default().store_dir.ends_with(".shapeview"));
    }
}
