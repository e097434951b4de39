//! Scripted fake engine for orchestration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use umlpress_render::{EngineProcess, Invocation, ProcessOutput, Settings, Spawner};

/// Something the fake observed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Spawn(u32),
    Write(u32, String),
    Close(u32),
    Kill(u32),
    Convert(Vec<String>),
    /// A converter process exited
    Converted,
}

/// What one page's engine process does
#[derive(Debug, Clone)]
pub struct PageScript {
    /// Time after spawn at which the process exits
    pub delay: Duration,
    pub success: bool,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    /// Exits without reading stdin, so writing input breaks the pipe
    pub ignores_input: bool,
}

impl PageScript {
    pub fn ok(stdout: impl Into<Vec<u8>>, delay_ms: u64) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
            success: true,
            stdout: stdout.into(),
            stderr: Vec::new(),
            ignores_input: false,
        }
    }

    pub fn fail(stdout: impl Into<Vec<u8>>, stderr: &str) -> Self {
        Self {
            delay: Duration::ZERO,
            success: false,
            stdout: stdout.into(),
            stderr: stderr.as_bytes().to_vec(),
            ignores_input: false,
        }
    }

    /// Exits at once with `stderr`, never reading its input
    pub fn exits_early(success: bool, stderr: &str) -> Self {
        Self {
            success,
            ignores_input: true,
            ..Self::fail("", stderr)
        }
    }
}

#[derive(Default)]
struct Script {
    pages: HashMap<u32, PageScript>,
    /// Pages whose spawn fails
    unspawnable: Vec<u32>,
    converter_fails: bool,
    converter_delay_ms: u64,
}

/// Fake [`Spawner`] that records every interaction
#[derive(Clone, Default)]
pub struct FakeEngine {
    journal: Arc<Mutex<Vec<Event>>>,
    invocations: Arc<Mutex<Vec<Invocation>>>,
    script: Arc<Mutex<Script>>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(self, page: u32, script: PageScript) -> Self {
        self.script.lock().unwrap().pages.insert(page, script);
        self
    }

    pub fn unspawnable(self, page: u32) -> Self {
        self.script.lock().unwrap().unspawnable.push(page);
        self
    }

    pub fn converter_fails(self) -> Self {
        self.script.lock().unwrap().converter_fails = true;
        self
    }

    /// Converter runs take this long before exiting
    pub fn converter_takes(self, delay_ms: u64) -> Self {
        self.script.lock().unwrap().converter_delay_ms = delay_ms;
        self
    }

    pub fn events(&self) -> Vec<Event> {
        self.journal.lock().unwrap().clone()
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.lock().unwrap().clone()
    }

    /// Engine invocations only (converter calls excluded)
    pub fn engine_invocations(&self) -> Vec<Invocation> {
        self.invocations()
            .into_iter()
            .filter(|inv| page_of(inv).is_some())
            .collect()
    }

    /// Pages whose stdin received source, in order
    pub fn written_pages(&self) -> Vec<u32> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Write(page, _) => Some(page),
                _ => None,
            })
            .collect()
    }

    pub fn conversions(&self) -> Vec<Vec<String>> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Convert(args) => Some(args),
                _ => None,
            })
            .collect()
    }

    fn record(&self, event: Event) {
        self.journal.lock().unwrap().push(event);
    }
}

fn page_of(inv: &Invocation) -> Option<u32> {
    let args = inv.args_lossy();
    args.iter()
        .position(|a| a == "-pipeimageindex")
        .and_then(|i| args.get(i + 1))
        .and_then(|p| p.parse().ok())
}

impl Spawner for FakeEngine {
    fn spawn(&self, invocation: &Invocation) -> io::Result<Box<dyn EngineProcess>> {
        self.invocations.lock().unwrap().push(invocation.clone());
        let script = self.script.lock().unwrap();

        let Some(page) = page_of(invocation) else {
            self.record(Event::Convert(invocation.args_lossy()));
            let result = if script.converter_fails {
                PageScript::fail("", "converter crashed")
            } else {
                PageScript::ok("", script.converter_delay_ms)
            };
            return Ok(Box::new(FakeProcess::new(u32::MAX, result, self.clone())));
        };

        if script.unspawnable.contains(&page) {
            return Err(io::Error::new(io::ErrorKind::NotFound, "engine not found"));
        }
        self.record(Event::Spawn(page));
        let result = script
            .pages
            .get(&page)
            .cloned()
            .unwrap_or_else(|| PageScript::ok(format!("page-{page}"), 0));
        Ok(Box::new(FakeProcess::new(page, result, self.clone())))
    }
}

struct FakeProcess {
    page: u32,
    exits_at: Instant,
    script: PageScript,
    engine: FakeEngine,
}

impl FakeProcess {
    fn new(page: u32, script: PageScript, engine: FakeEngine) -> Self {
        Self {
            page,
            exits_at: Instant::now() + script.delay,
            script,
            engine,
        }
    }
}

#[async_trait]
impl EngineProcess for FakeProcess {
    fn id(&self) -> Option<u32> {
        Some(10_000 + self.page)
    }

    async fn write_input(&mut self, input: &[u8]) -> io::Result<()> {
        self.engine.record(Event::Write(
            self.page,
            String::from_utf8_lossy(input).into_owned(),
        ));
        if self.script.ignores_input {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "Broken pipe (os error 32)"));
        }
        Ok(())
    }

    async fn close_input(&mut self) -> io::Result<()> {
        if self.page != u32::MAX {
            self.engine.record(Event::Close(self.page));
        }
        Ok(())
    }

    async fn wait_output(&mut self, cancel: &CancellationToken) -> io::Result<ProcessOutput> {
        tokio::select! {
            () = tokio::time::sleep_until(self.exits_at) => {
                if self.page == u32::MAX {
                    self.engine.record(Event::Converted);
                }
                Ok(ProcessOutput {
                    success: self.script.success,
                    code: Some(if self.script.success { 0 } else { 1 }),
                    stdout: self.script.stdout.clone(),
                    stderr: self.script.stderr.clone(),
                })
            }
            () = cancel.cancelled() => {
                self.engine.record(Event::Kill(self.page));
                Ok(ProcessOutput::default())
            }
        }
    }

    fn start_kill(&mut self) -> io::Result<()> {
        self.engine.record(Event::Kill(self.page));
        Ok(())
    }
}

/// Workspace with an existing engine bundle
pub struct Workspace {
    pub dir: TempDir,
    pub settings: Settings,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let bundle = dir.path().join("plantuml.jar");
        std::fs::write(&bundle, b"jar").unwrap();

        let mut settings = Settings::from_toml_str(
            r#"
[engine]
executable = "java"
bundle = "plantuml.jar"

[converter]
executable = "inkscape"
"#,
        )
        .unwrap();
        settings.workspace_root = Some(dir.path().to_path_buf());
        Self { dir, settings }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}
