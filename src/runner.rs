//! # Tool Invocation Module
//!
//! Questo modulo esegue i tool esterni e cattura il loro output.
//!
//! ## Responsabilità:
//! - Descrive una chiamata (`ToolInvocation`) con tool, argomenti e timeout
//! - Definisce il trait `ToolRunner`, punto di iniezione per i test
//! - `ProcessRunner`: implementazione reale basata su `tokio::process`
//! - Streaming riga per riga per i tool che stampano progressi
//!   (HandBrakeCLI su stdout, ffmpeg su stderr) con `\r` e `\n` come separatori
//!
//! ## Esempio:
//! ```rust,ignore
//! let invocation = ToolInvocation::new(&tools, Tool::Ffprobe, args!["-v", "quiet", path])
//!     .with_timeout(Duration::from_secs(30));
//! let output = ProcessRunner.run(&invocation).await?.into_success()?;
//! ```

use crate::error::{MediaToolError, Result};
use crate::platform::{Tool, ToolSet};
use std::ffi::OsString;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::debug;

/// A single external tool call
#[derive(Debug, Clone)]
pub struct ToolInvocation {
    pub tool: Tool,
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub timeout: Option<Duration>,
}

impl ToolInvocation {
    pub fn new(tools: &ToolSet, tool: Tool, args: Vec<OsString>) -> Self {
        Self {
            tool,
            program: tools.path(tool).to_path_buf(),
            args,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Last argument as a path; output file for ffmpeg, input for ffprobe
    #[cfg(test)]
    pub(crate) fn last_path(&self) -> Option<&Path> {
        self.args.last().map(Path::new)
    }

    /// Shell-quoted command line, for logs
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_os_str())
            .chain(self.args.iter().map(OsString::as_os_str))
            .map(|part| shell_quote(&part.to_string_lossy()))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Captured result of a finished tool
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    pub tool: Option<Tool>,
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
}

impl ToolOutput {
    /// Turn a non-zero exit into `MediaToolError::ToolFailed`
    pub fn into_success(self) -> Result<Self> {
        if self.success {
            return Ok(self);
        }
        Err(MediaToolError::ToolFailed {
            tool: self
                .tool
                .map(|t| t.to_string())
                .unwrap_or_else(|| "tool".to_string()),
            code: self.code.unwrap_or(-1),
            stderr: self.stderr.trim().to_string(),
        })
    }
}

/// Runs external tools; the seam tests replace with a scripted runner
pub trait ToolRunner {
    fn run(&self, invocation: &ToolInvocation) -> impl Future<Output = Result<ToolOutput>> + Send;

    /// Like `run`, handing each line of `source` to `on_line` as it arrives
    fn run_streaming<F>(
        &self,
        invocation: &ToolInvocation,
        source: StreamSource,
        on_line: F,
    ) -> impl Future<Output = Result<ToolOutput>> + Send
    where
        F: FnMut(&str) + Send;
}

/// Runs tools as child processes
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl ToolRunner for ProcessRunner {
    async fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput> {
        debug!("Executing command: {}", invocation.command_line());

        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let start = Instant::now();
        let output = match invocation.timeout {
            Some(limit) => tokio::time::timeout(limit, cmd.output())
                .await
                .map_err(|_| MediaToolError::ToolTimeout {
                    tool: invocation.tool.to_string(),
                    seconds: limit.as_secs(),
                })??,
            None => cmd.output().await?,
        };

        Ok(ToolOutput {
            tool: Some(invocation.tool),
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            elapsed: start.elapsed(),
        })
    }

    async fn run_streaming<F>(
        &self,
        invocation: &ToolInvocation,
        source: StreamSource,
        on_line: F,
    ) -> Result<ToolOutput>
    where
        F: FnMut(&str) + Send,
    {
        stream_process(invocation, source, on_line).await
    }
}

/// Which pipe carries the progress lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamSource {
    Stdout,
    Stderr,
}

/// Run a tool and hand every line of one stream to `on_line` as it arrives.
///
/// The other stream is drained in the background and returned in the output.
async fn stream_process<F>(
    invocation: &ToolInvocation,
    source: StreamSource,
    mut on_line: F,
) -> Result<ToolOutput>
where
    F: FnMut(&str) + Send,
{
    debug!("Executing command: {}", invocation.command_line());

    let mut child = Command::new(&invocation.program)
        .args(&invocation.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| MediaToolError::Validation("stdout was not captured".to_string()))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| MediaToolError::Validation("stderr was not captured".to_string()))?;

    let start = Instant::now();
    let (streamed, drained) = match source {
        StreamSource::Stdout => {
            let drain = tokio::spawn(drain_to_string(stderr));
            let streamed = stream_reader(stdout, &mut on_line).await?;
            (streamed, drain.await.map_err(std::io::Error::other)??)
        }
        StreamSource::Stderr => {
            let drain = tokio::spawn(drain_to_string(stdout));
            let streamed = stream_reader(stderr, &mut on_line).await?;
            (streamed, drain.await.map_err(std::io::Error::other)??)
        }
    };

    let status = child.wait().await?;
    let (stdout, stderr) = match source {
        StreamSource::Stdout => (streamed, drained),
        StreamSource::Stderr => (drained, streamed),
    };

    Ok(ToolOutput {
        tool: Some(invocation.tool),
        success: status.success(),
        code: status.code(),
        stdout,
        stderr,
        elapsed: start.elapsed(),
    })
}

async fn stream_reader<R, F>(mut reader: R, on_line: &mut F) -> std::io::Result<String>
where
    R: AsyncRead + Unpin,
    F: FnMut(&str),
{
    let mut splitter = LineSplitter::default();
    let mut collected = String::new();
    let mut buf = [0u8; 8192];

    loop {
        let read = reader.read(&mut buf).await?;
        if read == 0 {
            break;
        }
        for line in splitter.push(&buf[..read]) {
            on_line(&line);
            collected.push_str(&line);
            collected.push('\n');
        }
    }

    if let Some(line) = splitter.finish() {
        on_line(&line);
        collected.push_str(&line);
        collected.push('\n');
    }

    Ok(collected)
}

async fn drain_to_string<R>(mut reader: R) -> std::io::Result<String>
where
    R: AsyncRead + Unpin,
{
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes).await?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Splits a byte stream into lines on `\n` or `\r`, skipping empty lines
#[derive(Debug, Default)]
pub struct LineSplitter {
    pending: Vec<u8>,
}

impl LineSplitter {
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        for &byte in chunk {
            if byte == b'\n' || byte == b'\r' {
                if !self.pending.is_empty() {
                    lines.push(String::from_utf8_lossy(&self.pending).into_owned());
                    self.pending.clear();
                }
            } else {
                self.pending.push(byte);
            }
        }
        lines
    }

    pub fn finish(self) -> Option<String> {
        (!self.pending.is_empty()).then(|| String::from_utf8_lossy(&self.pending).into_owned())
    }
}

/// Quote an argument for display in a POSIX shell
pub fn shell_quote(arg: &str) -> String {
    let safe = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=+,%@".contains(c));
    if safe {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', "'\\''"))
    }
}
