//! Single-instance guard.
//!
//! The first process to start binds the daemon socket and becomes the
//! primary instance.  Later launches find the socket taken, send `toggle`
//! and exit.  A socket file is only removed after binding failed and
//! nobody accepted a connection on it.

use super::listener::{UnixSocketError, UnixSocketListener};
use crate::command::Command;
use log::{debug, info};
use std::io::{ErrorKind, Write};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// How long a forwarding launch may block on the running instance.
pub const FORWARD_TIMEOUT: Duration = Duration::from_millis(100);

/// Socket file name inside `$XDG_RUNTIME_DIR`.
pub const SOCKET_NAME: &str = "ywidgets_daemon.sock";

/// `$XDG_RUNTIME_DIR/ywidgets_daemon.sock`, or under `/tmp` if unset.
pub fn default_socket_path() -> PathBuf {
    let runtime = std::env::var("XDG_RUNTIME_DIR").unwrap_or_else(|_| "/tmp".into());
    PathBuf::from(runtime).join(SOCKET_NAME)
}

#[derive(Debug, thiserror::Error)]
pub enum InstanceError {
    #[error("failed to forward to running instance: {0}")]
    Forward(#[source] std::io::Error),
    #[error("failed to remove stale socket {path}: {source}")]
    Stale {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Listen(#[from] UnixSocketError),
}

/// Outcome of [`acquire`].
pub enum Instance {
    /// No other instance was running; this process owns the socket.
    Primary(UnixSocketListener),
    /// Another instance was running and has been sent `toggle`.
    Forwarded,
}

/// Become the primary instance, or forward a toggle to the existing one.
pub fn acquire(path: &Path) -> Result<Instance, InstanceError> {
    match UnixSocketListener::bind(path) {
        Ok(listener) => return Ok(Instance::Primary(listener)),
        Err(UnixSocketError::Bind { source, .. }) if source.kind() == ErrorKind::AddrInUse => {}
        Err(e) => return Err(e.into()),
    }
    match UnixStream::connect(path) {
        Ok(stream) => {
            forward(stream, Command::Toggle)?;
            info!("forwarded toggle to running instance");
            Ok(Instance::Forwarded)
        }
        Err(e) if e.kind() == ErrorKind::ConnectionRefused => {
            debug!("stale socket at {}: {}", path.display(), e);
            std::fs::remove_file(path).map_err(|source| InstanceError::Stale {
                path: path.to_path_buf(),
                source,
            })?;
            Ok(Instance::Primary(UnixSocketListener::bind(path)?))
        }
        Err(e) => Err(InstanceError::Forward(e)),
    }
}

fn forward(mut stream: UnixStream, cmd: Command) -> Result<(), InstanceError> {
    stream
        .set_write_timeout(Some(FORWARD_TIMEOUT))
        .map_err(InstanceError::Forward)?;
    writeln!(stream, "{}", cmd.as_wire()).map_err(InstanceError::Forward)?;
    stream.flush().map_err(InstanceError::Forward)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::CommandSource;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::mpsc;

    static TEST_ID: AtomicU32 = AtomicU32::new(0);

    fn tmp_socket_path() -> PathBuf {
        let id = TEST_ID.fetch_add(1, Ordering::SeqCst);
        std::env::temp_dir().join(format!(
            "ywidgets-instance-{}-{}.sock",
            std::process::id(),
            id
        ))
    }

    #[test]
    fn first_launch_is_primary_second_forwards() {
        let path = tmp_socket_path();
        let Instance::Primary(mut listener) = acquire(&path).unwrap() else {
            panic!("expected primary");
        };
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let _ = listener.run(tx);
        });

        assert!(matches!(acquire(&path).unwrap(), Instance::Forwarded));
        assert_eq!(
            rx.recv_timeout(Duration::from_secs(2)).unwrap(),
            Command::Toggle
        );
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn stale_socket_file_is_replaced() {
        let path = tmp_socket_path();
        // Binding and dropping the std listener leaves the file behind.
        drop(std::os::unix::net::UnixListener::bind(&path).unwrap());
        assert!(path.exists());
        let instance = acquire(&path).unwrap();
        assert!(matches!(instance, Instance::Primary(_)));
        drop(instance);
        assert!(!path.exists());
    }

    #[test]
    fn live_socket_is_kept() {
        let path = tmp_socket_path();
        let live = std::os::unix::net::UnixListener::bind(&path).unwrap();
        assert!(matches!(acquire(&path).unwrap(), Instance::Forwarded));
        assert!(path.exists());

        let (stream, _) = live.accept().unwrap();
        let mut line = String::new();
        std::io::BufRead::read_line(&mut std::io::BufReader::new(stream), &mut line).unwrap();
        assert_eq!(line.trim(), "toggle");
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn unusable_directory_is_an_error() {
        let path = std::env::temp_dir()
            .join(format!("ywidgets-missing-{}", std::process::id()))
            .join("daemon.sock");
        assert!(matches!(acquire(&path), Err(InstanceError::Listen(_))));
        assert!(!path.exists());
    }
}
