//! External process invocation with an explicit contract: program, args,
//! stdin payload, working directory, optional timeout, and exit-code
//! handling. The working directory is always a per-call argument, never a
//! process-wide mutation, so concurrent pipeline instances stay safe.

use std::ffi::OsString;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::{PipelineError, Result};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

pub struct ExternalCommand {
    tool: String,
    program: OsString,
    args: Vec<OsString>,
    working_dir: Option<PathBuf>,
    stdin_payload: Option<String>,
    timeout: Option<Duration>,
}

impl ExternalCommand {
    pub fn new(tool: &str, program: impl Into<OsString>) -> Self {
        Self {
            tool: tool.to_string(),
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
            stdin_payload: None,
            timeout: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Payload written to the child's stdin; without one, stdin is closed.
    pub fn stdin_payload(mut self, payload: impl Into<String>) -> Self {
        self.stdin_payload = Some(payload.into());
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    fn tool_error(&self, status: Option<i32>, message: impl Into<String>) -> PipelineError {
        PipelineError::ExternalTool {
            tool: self.tool.clone(),
            status,
            stderr: message.into(),
        }
    }

    /// Run to completion. Output is captured, never inherited. A non-zero
    /// exit, a timeout, or a spawn failure all surface as `ExternalTool`.
    pub fn run(&self) -> Result<Output> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(if self.stdin_payload.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }

        debug!("running {} ({:?} {:?})", self.tool, self.program, self.args);
        let mut child = command
            .spawn()
            .map_err(|e| self.tool_error(None, format!("failed to spawn: {e}")))?;

        if let Some(payload) = &self.stdin_payload {
            let mut stdin = child
                .stdin
                .take()
                .ok_or_else(|| self.tool_error(None, "child stdin unavailable"))?;
            stdin
                .write_all(payload.as_bytes())
                .and_then(|()| stdin.write_all(b"\n"))
                .map_err(|e| self.tool_error(None, format!("failed to write stdin: {e}")))?;
            // Dropping the handle closes the pipe so the child sees EOF.
        }

        if let Some(timeout) = self.timeout {
            let deadline = Instant::now() + timeout;
            loop {
                match child.try_wait() {
                    Ok(Some(_)) => break,
                    Ok(None) if Instant::now() >= deadline => {
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(self.tool_error(
                            None,
                            format!("timed out after {}s", timeout.as_secs()),
                        ));
                    }
                    Ok(None) => thread::sleep(POLL_INTERVAL),
                    Err(e) => return Err(self.tool_error(None, e.to_string())),
                }
            }
        }

        let output = child
            .wait_with_output()
            .map_err(|e| self.tool_error(None, e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(self.tool_error(output.status.code(), stderr));
        }
        Ok(output)
    }
}

//───────────────────────────────── tests ───────────────────────────────────//
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_stdout() {
        let output = ExternalCommand::new("echo", "echo")
            .arg("hello")
            .run()
            .unwrap();
        assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "hello");
    }

    #[test]
    fn nonzero_exit_is_an_error() {
        let err = ExternalCommand::new("false", "false").run().unwrap_err();
        match err {
            PipelineError::ExternalTool { tool, status, .. } => {
                assert_eq!(tool, "false");
                assert_eq!(status, Some(1));
            }
            other => panic!("expected ExternalTool, got {other:?}"),
        }
    }

    #[test]
    fn stdin_payload_reaches_child() {
        let output = ExternalCommand::new("cat", "cat")
            .stdin_payload("MFVF")
            .run()
            .unwrap();
        assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "MFVF");
    }

    #[test]
    fn working_dir_is_honored() {
        let dir = tempfile::tempdir().unwrap();
        let output = ExternalCommand::new("pwd", "pwd")
            .working_dir(dir.path())
            .run()
            .unwrap();
        let reported = String::from_utf8_lossy(&output.stdout).trim().to_string();
        assert!(reported.ends_with(
            dir.path()
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap()
        ));
    }

    #[test]
    fn missing_program_surfaces_spawn_failure() {
        let err = ExternalCommand::new("nope", "/nonexistent/definitely-not-a-tool")
            .run()
            .unwrap_err();
        assert!(matches!(err, PipelineError::ExternalTool { status: None, .. }));
    }
}
