//! # umlpress-render
//!
//! Multi-page diagram rendering through an external engine, one engine
//! process per page.
//!
//! ## How a render runs
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │ LocalRenderer::render / get_map_data                           │
//! ├────────────────────────────────────────────────────────────────┤
//! │ 1. Preflight: engine executable + bundle (no process started)  │
//! │ 2. Launch: one engine process per page, all at once            │
//! │ 3. Drain: page 0..N-1 in order: write source, read output      │
//! │ 4. Bridge (pdf only): convert each written svg page            │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use umlpress_render::{Diagram, DiagramRenderer, LocalRenderer, OutputFormat, Settings};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = Settings::discover(std::path::Path::new("."))?;
//! let renderer = LocalRenderer::new(Arc::new(settings));
//!
//! let diagram = Diagram::new("@startuml\nAlice -> Bob\nnewpage\nBob -> Alice\n@enduml", "hello")
//!     .with_page_count(2);
//! let task = renderer.render(&diagram, OutputFormat::Svg, None);
//!
//! // task.processes() can be used to kill in-flight work
//! let output = task.await?;
//! for page in output.pages() {
//!     println!("{} bytes", page.bytes().map_or(0, |b| b.len()));
//! }
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod bridge;
pub mod chain;
pub mod config;
pub mod error;
pub mod launcher;
pub mod messages;
pub mod naming;
pub mod process;
pub mod renderer;
pub mod task;
pub mod types;

pub use bridge::FormatBridge;
pub use config::{ConfigProvider, Settings, SETTINGS_FILE_NAME};
pub use error::{ConfigError, OutputError, RenderError, Result, UnsupportedFormat};
pub use messages::{EnglishMessages, MessageId, Messages};
pub use naming::page_file_name;
pub use process::{EngineProcess, Invocation, ProcessHandle, ProcessOutput, Spawner, TokioSpawner};
pub use renderer::{DiagramRenderer, LocalRenderer};
pub use task::{RenderTask, TaskResult};
pub use types::{
    Diagram, OutputFormat, PageOutcome, RenderRequest, RequestKind, ResourceId, TaskOutput,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
