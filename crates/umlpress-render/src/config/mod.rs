//! Configuration for the local engine
//!
//! Settings are loaded from `umlpress.toml` in the workspace root:
//!
//! ```toml
//! [engine]
//! executable = "java"
//! bundle = "/opt/plantuml/plantuml.jar"
//!
//! [render]
//! include_paths = ["shared"]
//! diagrams_root = "docs/diagrams"
//! pre_args = ["-Xmx1g"]
//! post_args = ["-nometadata"]
//!
//! [converter]
//! executable = "inkscape"
//!
//! [[overrides]]
//! resource = "projects/legacy"
//! bundle = "/opt/plantuml-old/plantuml.jar"
//! ```
//!
//! The orchestrator never reads settings directly; it queries a
//! [`ConfigProvider`] per diagram resource.

mod settings;


use std::path::PathBuf;

use crate::types::ResourceId;

pub use settings::{
    ConverterSettings, EngineSettings, RenderSettings, ResourceOverride, Settings,
    SETTINGS_FILE_NAME,
};

/// Per-resource configuration lookup
pub trait ConfigProvider: Send + Sync {
    /// Engine executable; `None` when not configured
    fn engine_executable(&self) -> Option<PathBuf>;

    /// Engine bundle file the engine should load
    fn engine_bundle(&self, resource: &ResourceId) -> PathBuf;

    /// Root that relative include paths are resolved against
    fn workspace_root(&self, resource: &ResourceId) -> Option<PathBuf>;

    /// Extra include paths, possibly relative
    fn include_paths(&self, resource: &ResourceId) -> Vec<String>;

    /// Diagrams root added to the include path
    fn diagrams_root(&self, resource: &ResourceId) -> Option<PathBuf>;

    /// Arguments placed before the engine bundle
    fn pre_args(&self, resource: &ResourceId) -> Vec<String>;

    /// Arguments placed after everything else
    fn post_args(&self, resource: &ResourceId) -> Vec<String>;

    /// Secondary converter for two-stage formats
    fn converter_executable(&self) -> PathBuf;
}
