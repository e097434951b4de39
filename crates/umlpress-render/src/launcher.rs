//! Engine process launcher
//!
//! Builds the engine argument vector for one page and starts the process
//! right away. All pages of a task are launched before any output is read.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use crate::config::ConfigProvider;
use crate::process::{Invocation, ProcessHandle, Spawner};
use crate::types::{Diagram, RequestKind};

/// Separator between include path entries
#[cfg(windows)]
pub const INCLUDE_PATH_SEPARATOR: &str = ";";
/// Separator between include path entries
#[cfg(not(windows))]
pub const INCLUDE_PATH_SEPARATOR: &str = ":";

const HEADLESS_FLAG: &str = "-Djava.awt.headless=true";
const INCLUDE_PATH_PROPERTY: &str = "-Dplantuml.include.path=";
const CHARSET: &str = "utf-8";

/// A page whose process could not be started
#[derive(Debug)]
pub struct LaunchFailure {
    pub page: u32,
    pub error: io::Error,
}

/// Result of the launch phase
#[derive(Debug, Default)]
pub struct Launch {
    /// One handle per started page, in page order
    pub processes: Vec<ProcessHandle>,
    /// First page that failed to start; no later page was attempted
    pub failure: Option<LaunchFailure>,
}

/// Starts one engine process per page
pub struct ProcessLauncher<'a> {
    spawner: &'a dyn Spawner,
    config: &'a dyn ConfigProvider,
    executable: PathBuf,
    bundle: PathBuf,
    diagram: &'a Diagram,
    kind: RequestKind,
}

impl<'a> ProcessLauncher<'a> {
    /// Create a launcher for one diagram
    ///
    /// `kind` is what the engine is asked for, after any format bridging.
    pub fn new(
        spawner: &'a dyn Spawner,
        config: &'a dyn ConfigProvider,
        executable: PathBuf,
        bundle: PathBuf,
        diagram: &'a Diagram,
        kind: RequestKind,
    ) -> Self {
        Self {
            spawner,
            config,
            executable,
            bundle,
            diagram,
            kind,
        }
    }

    /// Assemble the engine invocation for `page`
    pub fn invocation(&self, page: u32) -> Invocation {
        let resource = &self.diagram.parent;
        let mut inv = Invocation::new(&self.executable);

        inv.arg(HEADLESS_FLAG);
        let mut include = OsString::from(INCLUDE_PATH_PROPERTY);
        include.push(self.include_path());
        inv.arg(include);
        inv.args(self.config.pre_args(resource));

        inv.arg("-jar").arg(&self.bundle);
        inv.arg("-pipeimageindex").arg(page.to_string());
        inv.arg("-charset").arg(CHARSET);
        inv.arg(self.kind.pipe_flag());
        if let Some(format) = self.kind.format() {
            inv.arg(format!("-t{}", format.engine_name()));
        }
        if let Some(name) = self.diagram.file_name() {
            inv.arg("-filename").arg(name);
        }
        inv.args(self.config.post_args(resource));
        inv
    }

    /// Include path value: diagram folder, configured paths, diagrams root
    pub fn include_path(&self) -> OsString {
        let resource = &self.diagram.parent;
        let root = self.config.workspace_root(resource);
        let mut paths: Vec<PathBuf> = Vec::new();

        if let Some(dir) = &self.diagram.dir {
            paths.push(dir.clone());
        }
        for entry in self.config.include_paths(resource) {
            let entry = entry.trim();
            if entry.is_empty() {
                continue;
            }
            paths.push(resolve(root.as_deref(), Path::new(entry)));
        }
        if let Some(diagrams_root) = self.config.diagrams_root(resource) {
            paths.push(diagrams_root);
        }

        let mut joined = OsString::new();
        for (i, path) in paths.iter().enumerate() {
            if i > 0 {
                joined.push(INCLUDE_PATH_SEPARATOR);
            }
            joined.push(path);
        }
        joined
    }

    /// Start the process for `page` and append its handle
    pub fn launch(&self, page: u32, processes: &mut Vec<ProcessHandle>) -> io::Result<()> {
        let invocation = self.invocation(page);
        let process = self.spawner.spawn(&invocation)?;
        let handle = ProcessHandle::new(page, process);
        tracing::debug!(
            page,
            pid = ?handle.pid(),
            title = %self.diagram.title,
            "Launched engine process"
        );
        processes.push(handle);
        Ok(())
    }

    /// Start every page's process now
    ///
    /// Stops at the first page that cannot be started.
    pub fn launch_all(&self) -> Launch {
        let mut launch = Launch::default();
        for page in 0..self.diagram.page_count.max(1) {
            if let Err(error) = self.launch(page, &mut launch.processes) {
                tracing::warn!(
                    page,
                    program = %self.executable.display(),
                    error = %error,
                    "Failed to launch engine process"
                );
                launch.failure = Some(LaunchFailure { page, error });
                break;
            }
        }
        launch
    }
}

fn resolve(root: Option<&Path>, path: &Path) -> PathBuf {
    match root {
        Some(root) if path.is_relative() => root.join(path),
        _ => path.to_path_buf(),
    }
}
