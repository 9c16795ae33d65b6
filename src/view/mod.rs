//! Front-ends for the control surface.
//!
//! When the `gui-gtk` feature is enabled, [`gtk::run_main_loop`] takes over
//! the main thread and drives both command processing and rendering
//! through the GLib main loop.

#[cfg(feature = "gui-gtk")]
pub mod gtk;
