//! Interactions with external CLI tools.
//!
//! Every collaborator process (ffprobe, ffmpeg, yt-dlp) is invoked
//! through [`run_command_with_timeout`], which enforces the
//! caller-imposed time budget the pipeline requires: no external
//! invocation may block the run indefinitely.

use std::io::{self, Read};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use crate::error::{command_failed_error, command_start_error, CoreError, CoreResult};

pub mod ffmpeg;
pub mod ffprobe;
pub mod ytdlp;

pub use ffmpeg::{DerivativeEngine, FfmpegDerivatives};
pub use ffprobe::{FfprobeProber, MediaProber};
pub use ytdlp::{detect_platform, fetch_url, FetchedFile};

/// Poll interval while waiting on a child process.
const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Captured output of a completed external command.
#[derive(Debug)]
pub struct CommandOutput {
    pub stdout: Vec<u8>,
    pub stderr: String,
}

/// Checks that a required external command is available and executable.
///
/// Runs `<cmd> -version` and discards the output. Used up-front by the
/// CLI so a missing tool aborts the run before any file is touched.
pub fn check_dependency(cmd_name: &str) -> CoreResult<()> {
    let result = Command::new(cmd_name)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();

    match result {
        Ok(_) => {
            log::debug!("Found dependency: {}", cmd_name);
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::warn!("Dependency '{}' not found.", cmd_name);
            Err(CoreError::DependencyNotFound(cmd_name.to_string()))
        }
        Err(e) => {
            log::error!("Failed to start dependency check for '{}': {}", cmd_name, e);
            Err(command_start_error(cmd_name, e))
        }
    }
}

/// Runs a prepared command to completion, killing it if the timeout
/// expires. Non-zero exit becomes `CommandFailed` carrying stderr.
pub fn run_command_with_timeout(
    tool: &str,
    cmd: &mut Command,
    timeout: Duration,
) -> CoreResult<CommandOutput> {
    log::debug!("Running {}: {:?}", tool, cmd);

    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| command_start_error(tool, e))?;

    // Drain the pipes on separate threads; a full pipe would otherwise
    // deadlock against our wait loop.
    let mut stdout_pipe = child.stdout.take();
    let mut stderr_pipe = child.stderr.take();
    let stdout_handle = std::thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(pipe) = stdout_pipe.as_mut() {
            let _ = pipe.read_to_end(&mut buf);
        }
        buf
    });
    let stderr_handle = std::thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(pipe) = stderr_pipe.as_mut() {
            let _ = pipe.read_to_end(&mut buf);
        }
        buf
    });

    let start = Instant::now();
    let status = loop {
        match child.try_wait()? {
            Some(status) => break status,
            None if start.elapsed() >= timeout => {
                log::error!(
                    "{} exceeded its {}s budget; killing it",
                    tool,
                    timeout.as_secs()
                );
                let _ = child.kill();
                let _ = child.wait();
                return Err(CoreError::CommandTimeout {
                    tool: tool.to_string(),
                    seconds: timeout.as_secs(),
                });
            }
            None => std::thread::sleep(WAIT_POLL_INTERVAL),
        }
    };

    let stdout = stdout_handle.join().unwrap_or_default();
    let stderr_bytes = stderr_handle.join().unwrap_or_default();
    let stderr = String::from_utf8_lossy(&stderr_bytes).into_owned();

    if !status.success() {
        log::error!("{} exited with {}: {}", tool, status, stderr.trim());
        return Err(command_failed_error(tool, status, stderr));
    }

    Ok(CommandOutput { stdout, stderr })
}
