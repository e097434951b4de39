//! umlpress CLI - Command-line interface library
//!
//! This library provides the CLI functionality for umlpress:
//! - Render: export every page of a diagram to a format
//! - Map: extract image-map data for every page
//! - Formats: list the output format catalog
//!
//! # Binary Usage
//!
//! ```bash
//! # Render a two-page diagram to page-indexed SVG files
//! umlpress render flow.puml --format svg --pages 2 --output out/flow.svg
//!
//! # Render to stdout, killing the engine after 30 seconds
//! umlpress render flow.puml --format png --timeout 30 > flow.png
//!
//! # Extract map data
//! umlpress map flow.puml
//! ```

pub mod app;

// Re-export main entry point and commands
pub use app::{formats_command, load_diagram, load_settings, map_command, render_command};
pub use app::{run_cli, RenderOptions};
