//! Process-output adapter
//!
//! Turns a finished engine process into a page outcome: the produced bytes
//! in buffer mode, or a written file in file mode.

use std::path::Path;

use tokio_util::sync::CancellationToken;

use crate::error::OutputError;
use crate::process::{EngineProcess, ProcessOutput};
use crate::types::PageOutcome;

/// Wait for `process` and collect its output
///
/// With a destination the engine's stdout is written there and
/// [`PageOutcome::Written`] is returned; without one the bytes are returned.
/// A non-zero exit yields an [`OutputError`] carrying whatever stdout held.
pub async fn collect_output(
    process: &mut dyn EngineProcess,
    destination: Option<&Path>,
    cancel: &CancellationToken,
) -> Result<PageOutcome, OutputError> {
    let output = process.wait_output(cancel).await?;

    if !output.success {
        return Err(OutputError::new(failure_message(&output), output.stdout));
    }

    match destination {
        Some(path) => {
            if let Err(err) = tokio::fs::write(path, &output.stdout).await {
                return Err(OutputError::new(
                    format!("{}: {}", path.display(), err),
                    output.stdout,
                ));
            }
            Ok(PageOutcome::Written(path.to_path_buf()))
        }
        None => Ok(PageOutcome::Bytes(output.stdout)),
    }
}

fn failure_message(output: &ProcessOutput) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    if !stderr.is_empty() {
        return stderr.to_string();
    }
    match output.code {
        Some(code) => format!("engine exited with code {}", code),
        None => "engine was terminated".to_string(),
    }
}
