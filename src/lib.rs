//! **ywidgets**: a grid-based control-center panel.
//!
//! Plugins (volume, clock, weather and so on) are laid out as
//! rectangles on a sparse grid.  In edit mode they can be dragged, swapped,
//! resized, added and removed; the layout is persisted to a JSON file
//! after every change.
//!
//! # Architecture
//!
//! * [`grid`]: the pure layout engine, including drop resolution and
//!   arrangement of a stored layout.
//! * [`store`]: the persisted layout document.
//! * [`registry`] and [`plugins`]: the compiled-in plugin catalog.
//! * [`host`]: one worker thread per plugin.
//! * [`surface`]: the drag/edit state machine that ties it together and
//!   emits [`traits::SurfaceEvent`]s to a front-end.
//! * [`ipc`]: the single-instance socket.
//!
//! Two traits keep the core independent of the outside world:
//!
//! * [`traits::CommandRunner`]: runs external programs, so plugins can be
//!   tested against a scripted runner.
//! * [`traits::CommandSource`]: delivers [`command::Command`]s from a
//!   transport (the Unix socket) into the main loop.

pub mod command;
pub mod config;
pub mod grid;
pub mod host;
pub mod ipc;
pub mod plugins;
pub mod registry;
pub mod size;
pub mod store;
pub mod surface;
pub mod system;
pub mod traits;
pub mod view;
