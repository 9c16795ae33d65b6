//! Unix-socket [`CommandSource`] implementation.
//!
//! Accepts one connection at a time.  Each line received is parsed as a
//! [`Command`]; a trailing chunk without a newline counts as a line.
//!
//! # Wire format
//!
//! ```text
//! toggle
//! ```

use crate::command::Command;
use crate::traits::CommandSource;
use log::{debug, error, info, warn};
use std::io::{BufRead, BufReader};
use std::os::unix::net::UnixListener;
use std::path::{Path, PathBuf};
use std::sync::mpsc;

/// A [`CommandSource`] bound to a Unix stream socket.
///
/// The socket file is created by [`bind`](UnixSocketListener::bind) and
/// removed when the listener is dropped.
pub struct UnixSocketListener {
    path: PathBuf,
    listener: UnixListener,
}

/// Errors produced by the Unix socket listener.
#[derive(Debug, thiserror::Error)]
pub enum UnixSocketError {
    #[error("failed to bind {path}: {source}")]
    Bind {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl UnixSocketListener {
    /// Bind a new socket at `path`.  Fails if the file already exists.
    pub fn bind(path: impl AsRef<Path>) -> Result<Self, UnixSocketError> {
        let path = path.as_ref().to_path_buf();
        let listener = UnixListener::bind(&path).map_err(|source| UnixSocketError::Bind {
            path: path.clone(),
            source,
        })?;
        info!("listening on {}", path.display());
        Ok(Self { path, listener })
    }

    /// The filesystem path of the socket.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CommandSource for UnixSocketListener {
    type Error = UnixSocketError;

    /// Accept connections until `sink` is closed.
    ///
    /// This method **blocks** indefinitely.  Run it on a dedicated thread.
    fn run(&mut self, sink: mpsc::Sender<Command>) -> Result<(), Self::Error> {
        for stream in self.listener.incoming() {
            match stream {
                Ok(stream) => {
                    debug!("client connected");
                    let reader = BufReader::new(stream);
                    for line in reader.lines() {
                        match line {
                            Ok(ref text) if text.trim().is_empty() => continue,
                            Ok(text) => match Command::parse(&text) {
                                Some(cmd) => {
                                    debug!("received {:?}", cmd);
                                    if sink.send(cmd).is_err() {
                                        info!("sink closed, shutting down");
                                        return Ok(());
                                    }
                                }
                                None => warn!("unknown command: {:?}", text),
                            },
                            Err(e) => {
                                error!("read error: {}", e);
                                break;
                            }
                        }
                    }
                    debug!("client disconnected");
                }
                Err(e) => {
                    error!("accept error: {}", e);
                }
            }
        }
        Ok(())
    }
}

impl Drop for UnixSocketListener {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            debug!("could not remove {}: {}", self.path.display(), e);
        }
    }
}

//  Tests
