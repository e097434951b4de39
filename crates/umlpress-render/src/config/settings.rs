//! Configuration Settings
//!
//! Defines the `umlpress.toml` structures and their per-resource lookup.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::ConfigProvider;
use crate::error::ConfigError;
use crate::types::ResourceId;

/// Settings file looked up in a workspace root
pub const SETTINGS_FILE_NAME: &str = "umlpress.toml";

/// Bundle file name assumed when none is configured
const DEFAULT_BUNDLE_NAME: &str = "plantuml.jar";

/// Top-level settings structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    /// Engine location
    pub engine: EngineSettings,
    /// Render arguments and include paths
    pub render: RenderSettings,
    /// Secondary converter
    pub converter: ConverterSettings,
    /// Per-resource overrides
    pub overrides: Vec<ResourceOverride>,
    /// Directory the settings were loaded from
    #[serde(skip)]
    pub workspace_root: Option<PathBuf>,
}

/// Engine executable and bundle
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EngineSettings {
    /// Executable that runs the engine (e.g. `java`)
    pub executable: Option<PathBuf>,
    /// Engine bundle (e.g. `plantuml.jar`)
    pub bundle: Option<PathBuf>,
}

/// Render options shared by all resources
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RenderSettings {
    /// Extra include paths; relative ones are resolved against the workspace root
    pub include_paths: Vec<String>,
    /// Diagrams root added to the include path
    pub diagrams_root: Option<PathBuf>,
    /// Arguments before the bundle
    pub pre_args: Vec<String>,
    /// Arguments after everything else
    pub post_args: Vec<String>,
}

/// Secondary converter settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterSettings {
    /// Converter executable
    pub executable: PathBuf,
}

impl Default for ConverterSettings {
    fn default() -> Self {
        Self {
            executable: PathBuf::from("inkscape"),
        }
    }
}

/// Settings that apply to resources under a prefix
///
/// Unset fields fall through to the next shorter matching prefix, then to
/// the top-level settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ResourceOverride {
    /// Resource prefix, matched on `/` boundaries
    pub resource: String,
    pub bundle: Option<PathBuf>,
    pub include_paths: Option<Vec<String>>,
    pub diagrams_root: Option<PathBuf>,
    pub pre_args: Option<Vec<String>>,
    pub post_args: Option<Vec<String>>,
}

impl ResourceOverride {
    fn matches(&self, resource: &ResourceId) -> bool {
        let prefix = self.resource.trim_end_matches('/');
        let resource = resource.as_str();
        prefix.is_empty()
            || resource == prefix
            || resource
                .strip_prefix(prefix)
                .is_some_and(|rest| rest.starts_with('/'))
    }
}

impl Settings {
    /// Parse settings from a TOML string
    pub fn from_toml_str(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Load settings from a file; its directory becomes the workspace root
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        let mut settings = Self::from_toml_str(&text)?;
        settings.workspace_root = path.parent().map(Path::to_path_buf);
        Ok(settings)
    }

    /// Load `umlpress.toml` from a directory, or use defaults rooted there
    pub fn discover(dir: &Path) -> Result<Self, ConfigError> {
        let path = dir.join(SETTINGS_FILE_NAME);
        if path.is_file() {
            return Self::load(&path);
        }
        Ok(Self {
            workspace_root: Some(dir.to_path_buf()),
            ..Self::default()
        })
    }

    /// Matching overrides, most specific first
    fn overrides_for(&self, resource: &ResourceId) -> Vec<&ResourceOverride> {
        let mut matching: Vec<&ResourceOverride> = self
            .overrides
            .iter()
            .filter(|o| o.matches(resource))
            .collect();
        matching.sort_by_key(|o| std::cmp::Reverse(o.resource.trim_end_matches('/').len()));
        matching
    }

    /// Resolve a path against the workspace root
    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.workspace_root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl ConfigProvider for Settings {
    fn engine_executable(&self) -> Option<PathBuf> {
        self.engine
            .executable
            .clone()
            .filter(|p| !p.as_os_str().is_empty())
    }

    fn engine_bundle(&self, resource: &ResourceId) -> PathBuf {
        let bundle = self
            .overrides_for(resource)
            .into_iter()
            .find_map(|o| o.bundle.clone())
            .or_else(|| self.engine.bundle.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_BUNDLE_NAME));
        self.resolve(&bundle)
    }

    fn workspace_root(&self, _resource: &ResourceId) -> Option<PathBuf> {
        self.workspace_root.clone()
    }

    fn include_paths(&self, resource: &ResourceId) -> Vec<String> {
        self.overrides_for(resource)
            .into_iter()
            .find_map(|o| o.include_paths.clone())
            .unwrap_or_else(|| self.render.include_paths.clone())
    }

    fn diagrams_root(&self, resource: &ResourceId) -> Option<PathBuf> {
        self.overrides_for(resource)
            .into_iter()
            .find_map(|o| o.diagrams_root.clone())
            .or_else(|| self.render.diagrams_root.clone())
            .map(|root| self.resolve(&root))
    }

    fn pre_args(&self, resource: &ResourceId) -> Vec<String> {
        self.overrides_for(resource)
            .into_iter()
            .find_map(|o| o.pre_args.clone())
            .unwrap_or_else(|| self.render.pre_args.clone())
    }

    fn post_args(&self, resource: &ResourceId) -> Vec<String> {
        self.overrides_for(resource)
            .into_iter()
            .find_map(|o| o.post_args.clone())
            .unwrap_or_else(|| self.render.post_args.clone())
    }

    fn converter_executable(&self) -> PathBuf {
        self.converter.executable.clone()
    }
}
