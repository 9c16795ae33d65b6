//! Entry point for the **ywidgets** daemon.
//!
//! A second launch forwards `toggle` to the running instance and exits.
//! The primary instance listens on the daemon socket on a background
//! thread and processes commands on the main thread.
//!
//! When the `gui-gtk` feature is enabled the main thread runs the GLib
//! main loop (GTK4 requires it) and polls the command channel from there.
//! Without the feature, a simple blocking loop is used instead.

use log::{debug, error, info};
use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::Arc;
use ywidgets::command::Command;
use ywidgets::ipc::instance::{self, Instance};
use ywidgets::ipc::listener::UnixSocketListener;
use ywidgets::registry::PluginRegistry;
use ywidgets::store::LayoutStore;
use ywidgets::surface::ControlSurface;
use ywidgets::system::SystemRunner;
use ywidgets::traits::{CommandSource, SurfaceEvent};

/// Resolve the config directory (`$XDG_CONFIG_HOME/ywidgets`).
fn config_dir() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME").unwrap_or_else(|_| {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        format!("{}/.config", home)
    });
    PathBuf::from(base).join("ywidgets")
}

/// `--config <path>` if given, else `$XDG_CONFIG_HOME/ywidgets/config.json`.
fn config_path() -> PathBuf {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            if let Some(path) = args.next() {
                return PathBuf::from(path);
            }
        } else if let Some(path) = arg.strip_prefix("--config=") {
            return PathBuf::from(path);
        }
    }
    config_dir().join("config.json")
}

/// Resolve the CSS stylesheet path.
#[cfg(feature = "gui-gtk")]
fn css_path() -> PathBuf {
    config_dir().join("style.css")
}

//  Main

fn main() {
    env_logger::init();

    let socket = instance::default_socket_path();
    let listener = match instance::acquire(&socket) {
        Ok(Instance::Forwarded) => return,
        Ok(Instance::Primary(listener)) => listener,
        Err(e) => {
            error!("single-instance check failed: {}", e);
            std::process::exit(1);
        }
    };

    let path = config_path();
    info!("layout file: {}", path.display());
    let store = LayoutStore::open(&path);

    let (event_tx, event_rx) = mpsc::channel::<SurfaceEvent>();
    let surface = ControlSurface::new(
        store,
        PluginRegistry::builtin(),
        Arc::new(SystemRunner::default()),
        event_tx,
    );

    let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();
    spawn_command_source(listener, cmd_tx);

    start_event_loop(surface, event_rx, cmd_rx);
}

//  Event loops

#[cfg(feature = "gui-gtk")]
fn start_event_loop(
    surface: ControlSurface,
    events: mpsc::Receiver<SurfaceEvent>,
    cmd_rx: mpsc::Receiver<Command>,
) {
    ywidgets::view::gtk::run_main_loop(surface, events, cmd_rx, Some(css_path()));
}

#[cfg(not(feature = "gui-gtk"))]
fn start_event_loop(
    mut surface: ControlSurface,
    events: mpsc::Receiver<SurfaceEvent>,
    cmd_rx: mpsc::Receiver<Command>,
) {
    std::thread::spawn(move || {
        for event in events {
            debug!("surface event: {:?}", event);
        }
    });
    info!("ywidgets running headless");
    for cmd in cmd_rx {
        surface.handle(cmd);
    }
    surface.shutdown();
    info!("command source closed, exiting");
}

//  Helpers

fn spawn_command_source(mut source: UnixSocketListener, tx: mpsc::Sender<Command>) {
    std::thread::spawn(move || {
        if let Err(e) = source.run(tx) {
            error!("socket listener error: {}", e);
        }
    });
}
