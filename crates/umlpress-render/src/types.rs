//! Type definitions for render requests
//!
//! This module defines the output format catalog, the diagram view the
//! orchestrator reads, and the per-page and per-task results.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::UnsupportedFormat;

/// Output formats the engine can be asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OutputFormat {
    /// PNG raster image
    #[default]
    Png,
    /// SVG vector image
    Svg,
    /// Encapsulated PostScript
    Eps,
    /// PDF document (rendered as SVG, then converted)
    Pdf,
    /// Visio VDX
    Vdx,
    /// XMI model export
    Xmi,
    /// SCXML state chart
    Scxml,
    /// HTML
    Html,
    /// ASCII art
    Txt,
    /// Unicode art
    Utxt,
    /// LaTeX/TikZ
    Latex,
    /// LaTeX/TikZ without preamble
    LatexNoPreamble,
}

impl OutputFormat {
    /// Get the name the engine expects after `-t`
    pub fn engine_name(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Svg => "svg",
            Self::Eps => "eps",
            Self::Pdf => "pdf",
            Self::Vdx => "vdx",
            Self::Xmi => "xmi",
            Self::Scxml => "scxml",
            Self::Html => "html",
            Self::Txt => "txt",
            Self::Utxt => "utxt",
            Self::Latex => "latex",
            Self::LatexNoPreamble => "latex:nopreamble",
        }
    }

    /// Get the file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Svg => "svg",
            Self::Eps => "eps",
            Self::Pdf => "pdf",
            Self::Vdx => "vdx",
            Self::Xmi => "xmi",
            Self::Scxml => "scxml",
            Self::Html => "html",
            Self::Txt => "txt",
            Self::Utxt => "utxt",
            Self::Latex | Self::LatexNoPreamble => "tex",
        }
    }

    /// Get the MIME type for this format
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Svg => "image/svg+xml",
            Self::Eps => "application/postscript",
            Self::Pdf => "application/pdf",
            Self::Vdx => "application/vnd.visio",
            Self::Xmi | Self::Scxml => "application/xml",
            Self::Html => "text/html",
            Self::Txt | Self::Utxt | Self::Latex | Self::LatexNoPreamble => "text/plain",
        }
    }

    /// Format the engine renders instead, when this one needs a second stage
    ///
    /// Only PDF is bridged: the engine emits SVG and an external converter
    /// turns it into PDF.
    pub fn bridge(&self) -> Option<OutputFormat> {
        match self {
            Self::Pdf => Some(Self::Svg),
            _ => None,
        }
    }

    /// Get all catalog formats
    pub fn all() -> &'static [OutputFormat] {
        &[
            Self::Png,
            Self::Svg,
            Self::Eps,
            Self::Pdf,
            Self::Vdx,
            Self::Xmi,
            Self::Scxml,
            Self::Html,
            Self::Txt,
            Self::Utxt,
            Self::Latex,
            Self::LatexNoPreamble,
        ]
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.engine_name())
    }
}

impl FromStr for OutputFormat {
    type Err = UnsupportedFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().trim_start_matches('.').to_lowercase();
        Self::all()
            .iter()
            .find(|f| f.engine_name() == name)
            .copied()
            .ok_or_else(|| UnsupportedFormat(s.to_string()))
    }
}

/// Identifier of the resource a diagram came from
///
/// Used to look up per-resource configuration. Usually the path of the
/// source file or its folder, relative to the workspace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ResourceId(String);

impl ResourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into().replace('\\', "/"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Read-only view of one diagram source unit
#[derive(Debug, Clone)]
pub struct Diagram {
    /// Diagram source text
    pub content: String,
    /// Number of pages (at least 1)
    pub page_count: u32,
    /// Source file path, if the diagram lives on disk
    pub path: Option<PathBuf>,
    /// Directory containing the source file
    pub dir: Option<PathBuf>,
    /// Resource used to resolve configuration
    pub parent: ResourceId,
    /// Display title
    pub title: String,
}

impl Diagram {
    /// Create an in-memory diagram with one page
    pub fn new(content: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            page_count: 1,
            path: None,
            dir: None,
            parent: ResourceId::default(),
            title: title.into(),
        }
    }

    /// Set the page count (clamped to at least 1)
    pub fn with_page_count(mut self, page_count: u32) -> Self {
        self.page_count = page_count.max(1);
        self
    }

    /// Set the source path; the containing directory follows from it
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        self.dir = path.parent().map(Path::to_path_buf);
        self.path = Some(path);
        self
    }

    /// Set the parent resource
    pub fn with_parent(mut self, parent: ResourceId) -> Self {
        self.parent = parent;
        self
    }

    /// Source file name, used as the engine's file name hint
    pub fn file_name(&self) -> Option<&str> {
        self.path
            .as_deref()
            .and_then(Path::file_name)
            .and_then(|n| n.to_str())
    }

    /// Check if there is source text to send to the engine
    pub fn has_content(&self) -> bool {
        !self.content.is_empty()
    }
}

/// What the engine is asked to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// Full page export in the given format
    Render(OutputFormat),
    /// Image-map extraction
    MapData,
}

impl RequestKind {
    /// Engine pipe-mode directive
    pub fn pipe_flag(&self) -> &'static str {
        match self {
            Self::Render(_) => "-pipe",
            Self::MapData => "-pipemap",
        }
    }

    /// Requested format, for full renders only
    pub fn format(&self) -> Option<OutputFormat> {
        match self {
            Self::Render(format) => Some(*format),
            Self::MapData => None,
        }
    }
}

/// Diagram, target and destination of one render
#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub diagram: Diagram,
    pub kind: RequestKind,
    /// Write pages next to this path instead of returning bytes
    pub destination: Option<PathBuf>,
}

impl RenderRequest {
    pub fn render(diagram: Diagram, format: OutputFormat, destination: Option<PathBuf>) -> Self {
        Self {
            diagram,
            kind: RequestKind::Render(format),
            destination,
        }
    }

    pub fn map_data(diagram: Diagram, destination: Option<PathBuf>) -> Self {
        Self {
            diagram,
            kind: RequestKind::MapData,
            destination,
        }
    }
}

/// Result of one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    /// Bytes produced by the engine (buffer mode)
    Bytes(Vec<u8>),
    /// Page was written to this file (file mode)
    Written(PathBuf),
    /// The page's process was killed before its turn
    Killed,
}

impl PageOutcome {
    /// Produced bytes, if any were retained
    pub fn bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(data) => Some(data),
            _ => None,
        }
    }
}

/// Successful outcome of a render task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutput {
    /// One entry per page, in page order
    Pages(Vec<PageOutcome>),
    /// The drain hit a killed process; nothing was kept
    Voided,
}

impl TaskOutput {
    /// Page artifacts, empty when voided
    pub fn pages(&self) -> &[PageOutcome] {
        match self {
            Self::Pages(pages) => pages,
            Self::Voided => &[],
        }
    }

    pub fn is_voided(&self) -> bool {
        matches!(self, Self::Voided)
    }

    /// Consume into the page list, empty when voided
    pub fn into_pages(self) -> Vec<PageOutcome> {
        match self {
            Self::Pages(pages) => pages,
            Self::Voided => Vec::new(),
        }
    }
}
