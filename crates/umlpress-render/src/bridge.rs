//! Two-stage rendering for formats the engine cannot emit directly
//!
//! The engine renders the substitute format into the destination with the
//! substitute extension; a secondary converter then produces the requested
//! format next to it.
//!
//! A failed conversion is logged and otherwise ignored. The task outcome
//! stays successful and lists the intermediate page files.

use std::path::{Path, PathBuf};

use tokio_util::sync::CancellationToken;

use crate::messages::{MessageId, Messages};
use crate::naming::with_extension;
use crate::process::{Invocation, Spawner};
use crate::types::OutputFormat;

/// Converter flag that runs without a GUI
const CONVERTER_HEADLESS_FLAG: &str = "-z";

/// Second rendering stage for one requested format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatBridge {
    target: OutputFormat,
    intermediate: OutputFormat,
    converter: PathBuf,
}

impl FormatBridge {
    /// Bridge for `format`, or `None` when the engine emits it natively
    pub fn for_format(format: OutputFormat, converter: impl Into<PathBuf>) -> Option<Self> {
        format.bridge().map(|intermediate| Self {
            target: format,
            intermediate,
            converter: converter.into(),
        })
    }

    /// Format requested in the end
    pub fn target(&self) -> OutputFormat {
        self.target
    }

    /// Format the engine is asked for instead
    pub fn engine_format(&self) -> OutputFormat {
        self.intermediate
    }

    /// Destination rewritten to the intermediate extension
    pub fn intermediate_destination(&self, destination: &Path) -> PathBuf {
        with_extension(destination, self.intermediate.extension())
    }

    /// Final output path for an intermediate page file
    pub fn output_path(&self, intermediate: &Path) -> PathBuf {
        with_extension(intermediate, self.target.extension())
    }

    /// Converter argument vector: headless flag, export flag, input file
    pub fn converter_invocation(&self, input: &Path, output: &Path) -> Invocation {
        let mut inv = Invocation::new(&self.converter);
        inv.arg(CONVERTER_HEADLESS_FLAG);
        inv.arg(format!(
            "--export-{}={}",
            self.target.extension(),
            output.display()
        ));
        inv.arg(input);
        inv
    }

    /// Convert one intermediate page file and wait for the converter
    ///
    /// Failures are logged only.
    pub async fn convert(&self, spawner: &dyn Spawner, messages: &dyn Messages, input: &Path) {
        let output = self.output_path(input);
        let invocation = self.converter_invocation(input, &output);
        tracing::debug!(command = %invocation, "Converting page");

        let failure = match spawner.spawn(&invocation) {
            Ok(mut process) => {
                let waited = match process.close_input().await {
                    Ok(()) => process.wait_output(&CancellationToken::new()).await,
                    Err(err) => Err(err),
                };
                match waited {
                    Ok(result) if result.success => None,
                    Ok(result) => Some(
                        String::from_utf8_lossy(&result.stderr).trim().to_string(),
                    ),
                    Err(err) => Some(err.to_string()),
                }
            }
            Err(err) => Some(err.to_string()),
        };

        if let Some(cause) = failure {
            let path = output.display().to_string();
            tracing::warn!(
                "{}",
                messages.format(MessageId::ConversionFailed, &[&path, &cause])
            );
        }
    }
}
