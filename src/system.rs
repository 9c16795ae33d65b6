//! [`CommandRunner`] backed by real child processes, and the session power
//! actions.

use crate::traits::CommandRunner;
use log::debug;
use std::io::{ErrorKind, Read};
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

/// Timeout applied to [`SystemRunner::output`] unless overridden.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const POLL_STEP: Duration = Duration::from_millis(10);

/// Errors produced while running an external program.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("{0}: command not found")]
    NotFound(String),
    #[error("{program} exited with status {status}")]
    Failed { program: String, status: i32 },
    #[error("{program} timed out after {timeout:?}")]
    Timeout { program: String, timeout: Duration },
    #[error("{program}: output is not utf-8")]
    Utf8 { program: String },
    #[error("{program}: io error: {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Runs programs with [`std::process`].
///
/// `output` waits at most `timeout` for the program to exit and kills it
/// otherwise.  `spawn` detaches; a background thread reaps the child.
#[derive(Debug, Clone)]
pub struct SystemRunner {
    timeout: Duration,
}

impl Default for SystemRunner {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl SystemRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    fn start(program: &str, args: &[&str], stdout: Stdio) -> Result<Child, CommandError> {
        Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => CommandError::NotFound(program.to_string()),
                _ => CommandError::Io {
                    program: program.to_string(),
                    source: e,
                },
            })
    }
}

impl CommandRunner for SystemRunner {
    fn output(&self, program: &str, args: &[&str]) -> Result<String, CommandError> {
        debug!("run {} {:?}", program, args);
        let mut child = Self::start(program, args, Stdio::piped())?;
        let io_err = |source| CommandError::Io {
            program: program.to_string(),
            source,
        };

        // Drain stdout concurrently so a chatty child cannot block on a
        // full pipe while we wait for it.
        let reader = child.stdout.take().map(|mut out| {
            std::thread::spawn(move || {
                let mut buf = Vec::new();
                let _ = out.read_to_end(&mut buf);
                buf
            })
        });

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            if let Some(status) = child.try_wait().map_err(io_err)? {
                break status;
            }
            if Instant::now() >= deadline {
                let _ = child.kill();
                let _ = child.wait();
                return Err(CommandError::Timeout {
                    program: program.to_string(),
                    timeout: self.timeout,
                });
            }
            std::thread::sleep(POLL_STEP);
        };

        let bytes = reader
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default();

        if !status.success() {
            return Err(CommandError::Failed {
                program: program.to_string(),
                status: status.code().unwrap_or(-1),
            });
        }

        String::from_utf8(bytes)
            .map(|s| s.trim().to_string())
            .map_err(|_| CommandError::Utf8 {
                program: program.to_string(),
            })
    }

    fn spawn(&self, program: &str, args: &[&str]) -> Result<(), CommandError> {
        debug!("spawn {} {:?}", program, args);
        let mut child = Self::start(program, args, Stdio::null())?;
        std::thread::spawn(move || {
            let _ = child.wait();
        });
        Ok(())
    }
}

//  Power actions

/// The session controls shown below the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerAction {
    Lock,
    Logout,
    Restart,
    Shutdown,
}

impl PowerAction {
    pub const ALL: [PowerAction; 4] = [
        PowerAction::Lock,
        PowerAction::Logout,
        PowerAction::Restart,
        PowerAction::Shutdown,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PowerAction::Lock => "Lock",
            PowerAction::Logout => "Log out",
            PowerAction::Restart => "Restart",
            PowerAction::Shutdown => "Shut down",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            PowerAction::Lock => "system-lock-screen",
            PowerAction::Logout => "system-log-out",
            PowerAction::Restart => "system-reboot",
            PowerAction::Shutdown => "system-shutdown",
        }
    }

    /// Program and arguments for this action.  `user` is only used by
    /// [`PowerAction::Logout`].
    pub fn argv(self, user: &str) -> (&'static str, Vec<String>) {
        match self {
            PowerAction::Lock => ("loginctl", vec!["lock-session".into()]),
            PowerAction::Logout => ("loginctl", vec!["terminate-user".into(), user.into()]),
            PowerAction::Restart => ("systemctl", vec!["reboot".into()]),
            PowerAction::Shutdown => ("systemctl", vec!["poweroff".into()]),
        }
    }

    /// Start the action through `runner` for the user in `$USER`.
    pub fn run(self, runner: &dyn CommandRunner) -> Result<(), CommandError> {
        let user = std::env::var("USER").unwrap_or_default();
        let (program, args) = self.argv(&user);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        runner.spawn(program, &args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_is_trimmed() {
        let r = SystemRunner::default();
        assert_eq!(r.output("echo", &["  hello  "]).unwrap(), "hello");
    }

    #[test]
    fn missing_program_is_not_found() {
        let r = SystemRunner::default();
        let err = r.output("ywidgets-no-such-program", &[]).unwrap_err();
        assert!(matches!(err, CommandError::NotFound(_)));
    }

    #[test]
    fn non_zero_exit_is_failure() {
        let r = SystemRunner::default();
        let err = r.output("false", &[]).unwrap_err();
        assert!(matches!(err, CommandError::Failed { status: 1, .. }));
    }

    #[test]
    fn slow_program_times_out() {
        let r = SystemRunner::new(Duration::from_millis(100));
        let start = Instant::now();
        let err = r.output("sleep", &["5"]).unwrap_err();
        assert!(matches!(err, CommandError::Timeout { .. }));
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn spawn_returns_immediately() {
        let r = SystemRunner::default();
        let start = Instant::now();
        r.spawn("sleep", &["1"]).unwrap();
        assert!(start.elapsed() < Duration::from_millis(500));
    }

    #[test]
    fn power_argv() {
        assert_eq!(
            PowerAction::Lock.argv("ann"),
            ("loginctl", vec!["lock-session".to_string()])
        );
        assert_eq!(
            PowerAction::Logout.argv("ann"),
            (
                "loginctl",
                vec!["terminate-user".to_string(), "ann".to_string()]
            )
        );
        assert_eq!(PowerAction::Restart.argv("").0, "systemctl");
        assert_eq!(PowerAction::Shutdown.argv("").1, vec!["poweroff".to_string()]);
    }
}
