//! External process plumbing
//!
//! [`Spawner`] starts processes from an [`Invocation`]; the started process
//! is driven through [`EngineProcess`]. [`ProcessHandle`] is what a render
//! task hands out to its caller: it can only request termination.

use std::ffi::OsString;
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// Program and argument vector of one external process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

impl Invocation {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append one argument
    pub fn arg(&mut self, arg: impl Into<OsString>) -> &mut Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments
    pub fn args<I, S>(&mut self, args: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Arguments as lossy strings (for logging and tests)
    pub fn args_lossy(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Everything a finished process produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit status was success
    pub success: bool,
    /// Exit code, if the process exited normally
    pub code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

/// A started external process
#[async_trait]
pub trait EngineProcess: Send {
    /// OS process id, if still known
    fn id(&self) -> Option<u32>;

    /// Write `input` to stdin, then close it
    async fn write_input(&mut self, input: &[u8]) -> io::Result<()>;

    /// Close stdin without writing
    async fn close_input(&mut self) -> io::Result<()>;

    /// Wait for exit, collecting stdout and stderr
    ///
    /// When `cancel` fires first the process is killed and whatever it
    /// produced so far is returned with a failed status.
    async fn wait_output(&mut self, cancel: &CancellationToken) -> io::Result<ProcessOutput>;

    /// Ask the OS to kill the process; does not wait
    fn start_kill(&mut self) -> io::Result<()>;
}

/// Starts external processes
pub trait Spawner: Send + Sync {
    /// Start the process now; stdin/stdout/stderr are piped
    fn spawn(&self, invocation: &Invocation) -> io::Result<Box<dyn EngineProcess>>;
}

/// [`Spawner`] backed by `tokio::process`
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSpawner;

impl Spawner for TokioSpawner {
    fn spawn(&self, invocation: &Invocation) -> io::Result<Box<dyn EngineProcess>> {
        let child = Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;
        Ok(Box::new(ChildProcess { child }))
    }
}

/// A `tokio::process::Child` driven as an [`EngineProcess`]
pub struct ChildProcess {
    child: Child,
}

async fn read_all<R: AsyncRead + Unpin>(reader: Option<R>) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if let Some(mut reader) = reader {
        reader.read_to_end(&mut buf).await?;
    }
    Ok(buf)
}

#[async_trait]
impl EngineProcess for ChildProcess {
    fn id(&self) -> Option<u32> {
        self.child.id()
    }

    async fn write_input(&mut self, input: &[u8]) -> io::Result<()> {
        if let Some(mut stdin) = self.child.stdin.take() {
            stdin.write_all(input).await?;
            stdin.shutdown().await?;
        }
        Ok(())
    }

    async fn close_input(&mut self) -> io::Result<()> {
        drop(self.child.stdin.take());
        Ok(())
    }

    async fn wait_output(&mut self, cancel: &CancellationToken) -> io::Result<ProcessOutput> {
        let stdout = self.child.stdout.take();
        let stderr = self.child.stderr.take();
        let child = &mut self.child;

        let wait = async {
            tokio::select! {
                status = child.wait() => status,
                () = cancel.cancelled() => match child.start_kill() {
                    Ok(()) => child.wait().await,
                    Err(err) => Err(err),
                },
            }
        };
        let (status, stdout, stderr) = tokio::try_join!(wait, read_all(stdout), read_all(stderr))?;

        Ok(ProcessOutput {
            success: status.success(),
            code: status.code(),
            stdout,
            stderr,
        })
    }

    fn start_kill(&mut self) -> io::Result<()> {
        self.child.start_kill()
    }
}

/// Caller-facing handle to one page's process
///
/// Cloning is cheap; all clones refer to the same process. The handle can
/// only request termination. Reading and writing stay with the render task.
#[derive(Clone)]
pub struct ProcessHandle {
    page: u32,
    pid: Option<u32>,
    cancel: CancellationToken,
    process: Arc<Mutex<Box<dyn EngineProcess>>>,
}

impl ProcessHandle {
    pub(crate) fn new(page: u32, process: Box<dyn EngineProcess>) -> Self {
        Self {
            page,
            pid: process.id(),
            cancel: CancellationToken::new(),
            process: Arc::new(Mutex::new(process)),
        }
    }

    /// Zero-based page index this process renders
    pub fn page(&self) -> u32 {
        self.page
    }

    /// OS process id at launch time
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Request termination
    ///
    /// If the render task is currently waiting on this process the wait is
    /// interrupted and the process killed; otherwise it is killed right away
    /// and the task voids its result when it reaches this page.
    pub fn kill(&self) {
        self.cancel.cancel();
        if let Ok(mut process) = self.process.try_lock() {
            if let Err(err) = process.start_kill() {
                tracing::debug!(page = self.page, error = %err, "Kill request failed");
            }
        }
    }

    /// Check if termination was requested
    pub fn is_killed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub(crate) fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub(crate) fn process(&self) -> &Arc<Mutex<Box<dyn EngineProcess>>> {
        &self.process
    }
}

impl fmt::Debug for ProcessHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessHandle")
            .field("page", &self.page)
            .field("pid", &self.pid)
            .field("killed", &self.is_killed())
            .finish()
    }
}
