//! CLI Application logic
//!
//! Contains the command-line interface implementation.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use umlpress_render::{
    Diagram, DiagramRenderer, LocalRenderer, OutputFormat, PageOutcome, RenderTask, ResourceId,
    Settings, TaskOutput,
};

#[derive(Parser)]
#[command(name = "umlpress")]
#[command(author, version, about = "Render multi-page diagrams with a local engine", long_about = None)]
struct Cli {
    /// Settings file (defaults to umlpress.toml in the current directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render every page of a diagram
    Render {
        /// Input diagram source
        input: PathBuf,

        /// Output format (see `umlpress formats`)
        #[arg(short, long, default_value = "png")]
        format: String,

        #[command(flatten)]
        options: RenderOptions,
    },

    /// Extract image-map data for every page of a diagram
    Map {
        /// Input diagram source
        input: PathBuf,

        #[command(flatten)]
        options: RenderOptions,
    },

    /// List supported output formats
    Formats,
}

/// Options shared by `render` and `map`
#[derive(Debug, Clone, Default, clap::Args)]
pub struct RenderOptions {
    /// Output file; multi-page diagrams get `-page<N>` suffixes.
    /// Without it, output goes to stdout in page order.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Number of pages in the diagram
    #[arg(long, default_value_t = 1)]
    pub pages: u32,

    /// Kill the engine processes after this many seconds
    #[arg(long)]
    pub timeout: Option<u64>,
}

/// Run the CLI application
///
/// This is the main entry point for the command-line interface.
/// It parses arguments and dispatches to the appropriate command.
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    match cli.command {
        Commands::Render {
            input,
            format,
            options,
        } => {
            let format: OutputFormat = format.parse()?;
            runtime.block_on(render_command(
                &input,
                format,
                &options,
                cli.config.as_deref(),
            ))?;
        }
        Commands::Map { input, options } => {
            runtime.block_on(map_command(&input, &options, cli.config.as_deref()))?;
        }
        Commands::Formats => {
            print!("{}", formats_command());
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

/// Load settings from `config`, or discover them in the current directory
pub fn load_settings(config: Option<&Path>) -> Result<Settings> {
    match config {
        Some(path) => Settings::load(path)
            .with_context(|| format!("Failed to load settings: {}", path.display())),
        None => {
            let cwd = std::env::current_dir().context("Failed to read current directory")?;
            Settings::discover(&cwd)
                .with_context(|| format!("Failed to load settings from {}", cwd.display()))
        }
    }
}

/// Read a diagram source file
///
/// The title is the file stem; the resource is the path relative to
/// `workspace_root` when it lies inside it.
pub fn load_diagram(input: &Path, pages: u32, workspace_root: Option<&Path>) -> Result<Diagram> {
    if !input.exists() {
        anyhow::bail!("Input file not found: {}", input.display());
    }
    let content = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read input file: {}", input.display()))?;

    let path = if input.is_absolute() {
        input.to_path_buf()
    } else {
        std::env::current_dir()
            .context("Failed to read current directory")?
            .join(input)
    };
    let title = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "diagram".to_string());
    let resource = workspace_root
        .and_then(|root| path.strip_prefix(root).ok())
        .unwrap_or(&path)
        .to_string_lossy()
        .into_owned();

    Ok(Diagram::new(content, title)
        .with_page_count(pages)
        .with_path(&path)
        .with_parent(ResourceId::new(resource)))
}

/// Execute the render command
pub async fn render_command(
    input: &Path,
    format: OutputFormat,
    options: &RenderOptions,
    config: Option<&Path>,
) -> Result<()> {
    let settings = load_settings(config)?;
    let diagram = load_diagram(input, options.pages, settings.workspace_root.as_deref())?;
    let renderer = LocalRenderer::new(Arc::new(settings));

    tracing::info!(input = %input.display(), %format, pages = diagram.page_count, "Rendering");
    let task = renderer.render(&diagram, format, options.output.as_deref());
    finish(task, options).await
}

/// Execute the map command
pub async fn map_command(input: &Path, options: &RenderOptions, config: Option<&Path>) -> Result<()> {
    let settings = load_settings(config)?;
    let diagram = load_diagram(input, options.pages, settings.workspace_root.as_deref())?;
    let renderer = LocalRenderer::new(Arc::new(settings));

    tracing::info!(input = %input.display(), pages = diagram.page_count, "Extracting map data");
    let task = renderer.get_map_data(&diagram, options.output.as_deref());
    finish(task, options).await
}

/// Await a task, enforcing the timeout from outside, and emit its pages
async fn finish(task: RenderTask, options: &RenderOptions) -> Result<()> {
    if let Some(secs) = options.timeout {
        let handles = task.processes().to_vec();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            for handle in handles {
                handle.kill();
            }
        });
    }

    let output = task.await?;
    let pages = match output {
        TaskOutput::Voided => anyhow::bail!("Rendering was cancelled"),
        TaskOutput::Pages(pages) => pages,
    };

    let mut stdout = std::io::stdout().lock();
    for page in &pages {
        match page {
            PageOutcome::Bytes(data) => stdout
                .write_all(data)
                .context("Failed to write to stdout")?,
            PageOutcome::Written(path) => writeln!(stdout, "  Created: {}", path.display())
                .context("Failed to write to stdout")?,
            PageOutcome::Killed => {}
        }
    }
    stdout.flush().context("Failed to write to stdout")?;
    Ok(())
}

/// Execute the formats command
pub fn formats_command() -> String {
    let mut out = String::new();
    for format in OutputFormat::all() {
        let note = match format.bridge() {
            Some(via) => format!(" (via {})", via),
            None => String::new(),
        };
        out.push_str(&format!(
            "{:<18} .{:<6} {}{}\n",
            format.engine_name(),
            format.extension(),
            format.mime_type(),
            note
        ));
    }
    out
}
