// SmartBin Library - Public API

// Re-export error types
pub mod error;
pub use error::{Result, SmartBinError, TransportError};

// Module declarations
pub mod commands;
pub mod core;
pub mod ui;

// Re-export commonly used types
pub use core::config::Settings;

use std::fs::OpenOptions;
use std::path::Path;

// Initialize logging
pub fn init_logging() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();
}

/// Initialize logging into a file instead of stderr, for full-screen modes
/// where stderr output would corrupt the display. Falls back to stderr when
/// the file cannot be opened.
pub fn init_file_logging(path: &Path) {
    let file = path
        .parent()
        .map(std::fs::create_dir_all)
        .transpose()
        .and_then(|_| OpenOptions::new().create(true).append(true).open(path));

    let mut builder = env_logger::Builder::from_default_env();
    builder.filter_level(log::LevelFilter::Info);
    if let Ok(file) = file {
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
}
