//! Diagram renderer trait and the local engine backend
//!
//! Callers depend on [`DiagramRenderer`] only. [`LocalRenderer`] drives a
//! locally installed engine, one process per page.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::bridge::FormatBridge;
use crate::chain::PageChain;
use crate::config::ConfigProvider;
use crate::error::RenderError;
use crate::launcher::ProcessLauncher;
use crate::messages::{EnglishMessages, MessageId, Messages};
use crate::process::{Spawner, TokioSpawner};
use crate::task::RenderTask;
use crate::types::{Diagram, OutputFormat, RenderRequest, RequestKind};

/// Trait for diagram renderers
///
/// Both entry points return immediately with a [`RenderTask`]; the work
/// continues in the background on the current tokio runtime. Called outside
/// a runtime, the task is rejected with [`RenderError::Aborted`] and no
/// process is started.
pub trait DiagramRenderer: Send + Sync {
    /// Human-readable name of this renderer
    fn name(&self) -> &'static str;

    /// Formats this renderer can produce
    fn formats(&self) -> &'static [OutputFormat];

    /// Whether callers should avoid running many tasks at once
    fn limit_concurrency(&self) -> bool;

    /// Render every page of `diagram` to `format`
    ///
    /// Must be called from within a tokio runtime.
    fn render(
        &self,
        diagram: &Diagram,
        format: OutputFormat,
        destination: Option<&Path>,
    ) -> RenderTask;

    /// Extract image-map data for every page of `diagram`
    ///
    /// Must be called from within a tokio runtime.
    fn get_map_data(&self, diagram: &Diagram, destination: Option<&Path>) -> RenderTask;

    /// Check if this renderer supports the given output format
    fn supports_format(&self, format: OutputFormat) -> bool {
        self.formats().contains(&format)
    }
}

/// Renderer that runs the engine as local processes
pub struct LocalRenderer {
    config: Arc<dyn ConfigProvider>,
    messages: Arc<dyn Messages>,
    spawner: Arc<dyn Spawner>,
}

impl LocalRenderer {
    /// Create a renderer with the English catalog and real processes
    pub fn new(config: Arc<dyn ConfigProvider>) -> Self {
        Self {
            config,
            messages: Arc::new(EnglishMessages),
            spawner: Arc::new(TokioSpawner),
        }
    }

    /// Use a different message catalog
    pub fn with_messages(mut self, messages: Arc<dyn Messages>) -> Self {
        self.messages = messages;
        self
    }

    /// Use a different process spawner
    pub fn with_spawner(mut self, spawner: Arc<dyn Spawner>) -> Self {
        self.spawner = spawner;
        self
    }

    /// Run one request: preflight, launch all pages, then drain in order
    ///
    /// Must be called from within a tokio runtime; otherwise the task is
    /// rejected before anything is launched.
    pub fn submit(&self, request: RenderRequest) -> RenderTask {
        let RenderRequest {
            diagram,
            kind,
            destination,
        } = request;

        let (executable, bundle) = match self.preflight(&diagram) {
            Ok(found) => found,
            Err(err) => return RenderTask::rejected(err),
        };
        if tokio::runtime::Handle::try_current().is_err() {
            return RenderTask::rejected(RenderError::Aborted {
                message: self.messages.format(
                    MessageId::TaskAborted,
                    &[&diagram.title, "no tokio runtime is running"],
                ),
            });
        }

        let bridge = kind
            .format()
            .and_then(|f| FormatBridge::for_format(f, self.config.converter_executable()));
        let (kind, destination) = match &bridge {
            Some(bridge) => (
                RequestKind::Render(bridge.engine_format()),
                destination.map(|d| bridge.intermediate_destination(&d)),
            ),
            None => (kind, destination),
        };
        if bridge.is_some() && destination.is_none() {
            tracing::debug!(
                title = %diagram.title,
                "No destination for a two-stage format, returning the intermediate"
            );
        }

        let launch = ProcessLauncher::new(
            self.spawner.as_ref(),
            self.config.as_ref(),
            executable.clone(),
            bundle,
            &diagram,
            kind,
        )
        .launch_all();

        let chain = PageChain {
            processes: launch.processes,
            launch_failure: launch.failure,
            program: executable,
            content: diagram.content,
            title: diagram.title,
            page_count: diagram.page_count.max(1),
            destination,
            bridge,
            spawner: Arc::clone(&self.spawner),
            messages: Arc::clone(&self.messages),
        };
        RenderTask::start(chain, Arc::clone(&self.messages))
    }

    /// Resolve engine executable and bundle, or fail before launching
    fn preflight(&self, diagram: &Diagram) -> Result<(PathBuf, PathBuf), RenderError> {
        let executable = self.config.engine_executable().ok_or_else(|| {
            RenderError::Configuration {
                message: self.messages.format(MessageId::EngineNotConfigured, &[]),
            }
        })?;

        let bundle = self.config.engine_bundle(&diagram.parent);
        if !bundle.exists() {
            let location = bundle.display().to_string();
            return Err(RenderError::Configuration {
                message: self.messages.format(MessageId::BundleNotFound, &[&location]),
            });
        }

        Ok((executable, bundle))
    }
}

impl DiagramRenderer for LocalRenderer {
    fn name(&self) -> &'static str {
        "local"
    }

    fn formats(&self) -> &'static [OutputFormat] {
        OutputFormat::all()
    }

    fn limit_concurrency(&self) -> bool {
        true
    }

    fn render(
        &self,
        diagram: &Diagram,
        format: OutputFormat,
        destination: Option<&Path>,
    ) -> RenderTask {
        self.submit(RenderRequest::render(
            diagram.clone(),
            format,
            destination.map(Path::to_path_buf),
        ))
    }

    fn get_map_data(&self, diagram: &Diagram, destination: Option<&Path>) -> RenderTask {
        self.submit(RenderRequest::map_data(
            diagram.clone(),
            destination.map(Path::to_path_buf),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;

    #[test]
    fn test_local_renderer_capabilities() {
        let renderer = LocalRenderer::new(Arc::new(Settings::default()));
        assert_eq!(renderer.name(), "local");
        assert!(renderer.limit_concurrency());
        assert!(renderer.supports_format(OutputFormat::Pdf));
        assert!(renderer.supports_format(OutputFormat::LatexNoPreamble));
    }
}
