//! Ordered drain of launched page processes
//!
//! Every page's process is already running when the chain starts. The chain
//! visits pages strictly in index order: write the source to the page's
//! stdin, collect its output, run the second stage if any, then move on.
//! Page `i + 1` is never written before page `i` has been consumed.

use std::path::PathBuf;
use std::sync::Arc;

use crate::adapter::collect_output;
use crate::bridge::FormatBridge;
use crate::error::{OutputError, RenderError};
use crate::launcher::LaunchFailure;
use crate::messages::{MessageId, Messages};
use crate::naming::page_file_name;
use crate::process::{ProcessHandle, Spawner};
use crate::types::{PageOutcome, TaskOutput};

/// Ordered list of page artifacts
///
/// Voiding discards everything collected so far; nothing is appended after.
#[derive(Debug, Default)]
pub struct ResultAggregator {
    pages: Option<Vec<PageOutcome>>,
}

impl ResultAggregator {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            pages: Some(Vec::with_capacity(capacity)),
        }
    }

    /// Append the next page's artifact
    pub fn push(&mut self, outcome: PageOutcome) {
        if let Some(pages) = self.pages.as_mut() {
            pages.push(outcome);
        }
    }

    /// Drop all collected artifacts
    pub fn void(&mut self) {
        self.pages = None;
    }

    pub fn is_voided(&self) -> bool {
        self.pages.is_none()
    }

    pub fn finish(self) -> TaskOutput {
        match self.pages {
            Some(pages) => TaskOutput::Pages(pages),
            None => TaskOutput::Voided,
        }
    }
}

/// Sequential continuation over all pages of one task
pub struct PageChain {
    pub(crate) processes: Vec<ProcessHandle>,
    pub(crate) launch_failure: Option<LaunchFailure>,
    pub(crate) program: PathBuf,
    pub(crate) content: String,
    pub(crate) title: String,
    pub(crate) page_count: u32,
    /// Destination as the engine writes it (intermediate extension when bridged)
    pub(crate) destination: Option<PathBuf>,
    pub(crate) bridge: Option<FormatBridge>,
    pub(crate) spawner: Arc<dyn Spawner>,
    pub(crate) messages: Arc<dyn Messages>,
}

impl PageChain {
    /// Drain every page in order
    pub async fn drain(self) -> Result<TaskOutput, RenderError> {
        let mut results = ResultAggregator::with_capacity(self.processes.len());

        for handle in &self.processes {
            match self.step(handle).await? {
                PageOutcome::Killed => {
                    tracing::warn!(
                        page = handle.page(),
                        title = %self.title,
                        "Page process was killed before its turn, discarding results"
                    );
                    results.void();
                    return Ok(results.finish());
                }
                outcome => results.push(outcome),
            }
        }

        if let Some(failure) = &self.launch_failure {
            let program = self.program.display().to_string();
            let cause = self.messages.format(
                MessageId::SpawnFailed,
                &[&program, &failure.error.to_string()],
            );
            return Err(self.page_error(failure.page, OutputError::new(cause, Vec::new())));
        }

        Ok(results.finish())
    }

    async fn step(&self, handle: &ProcessHandle) -> Result<PageOutcome, RenderError> {
        let page = handle.page();
        let mut process = handle.process().lock().await;

        if handle.is_killed() {
            return Ok(PageOutcome::Killed);
        }

        let written = if self.content.is_empty() {
            process.close_input().await
        } else {
            process.write_input(self.content.as_bytes()).await
        };
        if let Err(err) = &written {
            tracing::debug!(page, error = %err, "Writing page input failed");
        }

        let destination = self
            .destination
            .as_deref()
            .map(|dest| page_file_name(dest, page, self.page_count));
        // An engine that exits early breaks the pipe; its own report wins.
        let collected = collect_output(
            process.as_mut(),
            destination.as_deref(),
            handle.cancel_token(),
        )
        .await;
        drop(process);

        let outcome = match (written, collected) {
            (_, Err(err)) => return Err(self.page_error(page, err)),
            (Err(err), Ok(_)) => return Err(self.page_error(page, err.into())),
            (Ok(()), Ok(outcome)) => outcome,
        };

        tracing::debug!(page, title = %self.title, "Page rendered");

        if let (Some(bridge), PageOutcome::Written(path)) = (&self.bridge, &outcome) {
            bridge
                .convert(self.spawner.as_ref(), self.messages.as_ref(), path)
                .await;
        }

        Ok(outcome)
    }

    fn page_error(&self, page: u32, err: OutputError) -> RenderError {
        tracing::warn!(page, title = %self.title, error = %err, "Page failed");
        RenderError::Page {
            page,
            message: self
                .messages
                .format(MessageId::PageFailed, &[&self.title, &err.message]),
            partial_output: err.partial_output,
        }
    }
}
