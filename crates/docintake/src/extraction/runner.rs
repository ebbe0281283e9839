use std::ffi::OsStr;
use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError};
use log::{debug, warn};

use crate::error::ExtractError;

const POLL_INTERVAL: Duration = Duration::from_millis(50);
const READ_CHUNK: usize = 8 * 1024;
/// Minimum time left to drain the pipes after the child exits.
const DRAIN_GRACE: Duration = Duration::from_millis(500);

/// Captured result of one finished subprocess.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Standard output followed by standard error.
    pub fn combined(&self) -> String {
        let mut combined = String::with_capacity(self.stdout.len() + self.stderr.len() + 1);
        combined.push_str(&self.stdout);
        if !self.stderr.is_empty() {
            if !combined.is_empty() && !combined.ends_with('\n') {
                combined.push('\n');
            }
            combined.push_str(&self.stderr);
        }
        combined
    }

    pub fn status_label(&self) -> String {
        match self.code {
            Some(code) => format!("exit code {}", code),
            None => "termination by signal".to_string(),
        }
    }
}

/// Process execution seam. Production code uses [`ProcessRunner`]; tests
/// substitute a scripted runner.
pub trait CommandRunner: Send + Sync {
    fn run(
        &self,
        program: &Path,
        args: &[&OsStr],
        timeout: Option<Duration>,
    ) -> Result<CommandOutput, ExtractError>;
}

/// Runs commands as real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    fn run(
        &self,
        program: &Path,
        args: &[&OsStr],
        timeout: Option<Duration>,
    ) -> Result<CommandOutput, ExtractError> {
        debug!("Running {} {:?}", program.display(), args);

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(ExtractError::Spawn)?;

        let deadline = timeout.map(|limit| (Instant::now() + limit, limit));

        // Pipes drain on their own threads while the child runs
        let stdout = child.stdout.take().map(spawn_reader);
        let stderr = child.stderr.take().map(spawn_reader);

        let status = match deadline {
            Some((at, limit)) => wait_with_deadline(&mut child, at, limit)?,
            None => child.wait().map_err(ExtractError::Spawn)?,
        };

        // A grandchild holding the pipes open must not outlive the deadline
        let drain_until = deadline.map(|(at, _)| at.max(Instant::now() + DRAIN_GRACE));

        Ok(CommandOutput {
            success: status.success(),
            code: status.code(),
            stdout: collect_output(stdout, drain_until, "stdout"),
            stderr: collect_output(stderr, drain_until, "stderr"),
        })
    }
}

/// Reads `reader` to EOF on a detached thread, forwarding chunks as they
/// arrive.
fn spawn_reader<R: Read + Send + 'static>(mut reader: R) -> Receiver<Vec<u8>> {
    let (tx, rx) = crossbeam_channel::unbounded();
    thread::spawn(move || {
        let mut buffer = vec![0u8; READ_CHUNK];
        loop {
            match reader.read(&mut buffer) {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    if tx.send(buffer[..n].to_vec()).is_err() {
                        break;
                    }
                }
            }
        }
    });
    rx
}

/// Gathers what a reader produced, until EOF or `until`. Output still
/// pending at `until` is abandoned and the reader thread left detached.
fn collect_output(
    rx: Option<Receiver<Vec<u8>>>,
    until: Option<Instant>,
    label: &str,
) -> String {
    let Some(rx) = rx else {
        return String::new();
    };

    let mut bytes = Vec::new();
    loop {
        let chunk = match until {
            Some(at) => rx.recv_deadline(at),
            None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };
        match chunk {
            Ok(chunk) => bytes.extend_from_slice(&chunk),
            Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {
                warn!("{} still open after the process exited; keeping partial output", label);
                break;
            }
        }
    }
    String::from_utf8_lossy(&bytes).into_owned()
}

fn wait_with_deadline(
    child: &mut Child,
    deadline: Instant,
    limit: Duration,
) -> Result<ExitStatus, ExtractError> {
    loop {
        if let Some(status) = child.try_wait().map_err(ExtractError::Spawn)? {
            return Ok(status);
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            return Err(ExtractError::TimedOut(limit));
        }
        thread::sleep(POLL_INTERVAL);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combined_output_order() {
        let output = CommandOutput {
            success: true,
            code: Some(0),
            stdout: "out".to_string(),
            stderr: "err\n".to_string(),
        };
        assert_eq!(output.combined(), "out\nerr\n");
    }

    #[test]
    fn test_status_label() {
        let exited = CommandOutput {
            code: Some(2),
            ..Default::default()
        };
        assert_eq!(exited.status_label(), "exit code 2");

        let signalled = CommandOutput::default();
        assert_eq!(signalled.status_label(), "termination by signal");
    }

    #[test]
    fn test_spawn_failure() {
        let result = ProcessRunner.run(
            Path::new("/nonexistent/interpreter"),
            &[OsStr::new("script.py")],
            None,
        );
        assert!(matches!(result, Err(ExtractError::Spawn(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_captures_stdout_and_stderr() {
        let output = ProcessRunner
            .run(
                Path::new("/bin/sh"),
                &[OsStr::new("-c"), OsStr::new("echo to-out; echo to-err 1>&2")],
                Some(Duration::from_secs(10)),
            )
            .unwrap();

        assert!(output.success);
        assert_eq!(output.code, Some(0));
        assert_eq!(output.stdout, "to-out\n");
        assert_eq!(output.stderr, "to-err\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_nonzero_exit_reported() {
        let output = ProcessRunner
            .run(
                Path::new("/bin/sh"),
                &[OsStr::new("-c"), OsStr::new("exit 3")],
                None,
            )
            .unwrap();

        assert!(!output.success);
        assert_eq!(output.code, Some(3));
    }

    #[cfg(unix)]
    #[test]
    fn test_deadline_kills_child() {
        let started = Instant::now();
        let result = ProcessRunner.run(
            Path::new("sleep"),
            &[OsStr::new("5")],
            Some(Duration::from_millis(200)),
        );

        assert!(matches!(result, Err(ExtractError::TimedOut(_))));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[cfg(unix)]
    #[test]
    fn test_background_process_holding_stdout_does_not_block() {
        let started = Instant::now();
        let output = ProcessRunner
            .run(
                Path::new("/bin/sh"),
                &[OsStr::new("-c"), OsStr::new("echo done; sleep 10 &")],
                Some(Duration::from_secs(1)),
            )
            .unwrap();

        assert!(output.success);
        assert_eq!(output.stdout, "done\n");
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
