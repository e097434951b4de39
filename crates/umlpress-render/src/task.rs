//! Render task handle
//!
//! Returned by every render request. Holds the launched process handles
//! (for cancellation) and the eventual outcome.

use std::fmt;
use std::future::IntoFuture;
use std::sync::Arc;

use futures::future::{self, BoxFuture, FutureExt};

use crate::chain::PageChain;
use crate::error::RenderError;
use crate::messages::{MessageId, Messages};
use crate::process::ProcessHandle;
use crate::types::TaskOutput;

/// Outcome of a render task
pub type TaskResult = Result<TaskOutput, RenderError>;

/// One in-flight render request
///
/// The drain runs in the background from the moment the task is created,
/// whether or not the outcome is awaited.
pub struct RenderTask {
    processes: Vec<ProcessHandle>,
    outcome: BoxFuture<'static, TaskResult>,
}

impl RenderTask {
    /// A task that failed before launching anything
    pub(crate) fn rejected(error: RenderError) -> Self {
        Self {
            processes: Vec::new(),
            outcome: future::ready(Err(error)).boxed(),
        }
    }

    /// Start draining `chain` in the background
    pub(crate) fn start(chain: PageChain, messages: Arc<dyn Messages>) -> Self {
        let processes = chain.processes.clone();
        let title = chain.title.clone();
        let drain = tokio::spawn(chain.drain());

        let outcome = async move {
            match drain.await {
                Ok(result) => result,
                Err(err) => Err(RenderError::Aborted {
                    message: messages
                        .format(MessageId::TaskAborted, &[&title, &err.to_string()]),
                }),
            }
        }
        .boxed();

        Self { processes, outcome }
    }

    /// Handles of every launched page process, in page order
    pub fn processes(&self) -> &[ProcessHandle] {
        &self.processes
    }

    /// Request termination of every launched process
    pub fn kill_all(&self) {
        for handle in &self.processes {
            handle.kill();
        }
    }

    /// Wait for the task to settle
    pub async fn wait(self) -> TaskResult {
        self.outcome.await
    }
}

impl IntoFuture for RenderTask {
    type Output = TaskResult;
    type IntoFuture = BoxFuture<'static, TaskResult>;

    fn into_future(self) -> Self::IntoFuture {
        self.outcome
    }
}

impl fmt::Debug for RenderTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderTask")
            .field("processes", &self.processes)
            .finish_non_exhaustive()
    }
}
