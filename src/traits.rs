//! Core traits that decouple ywidgets from the system it controls and the
//! transport that delivers commands.
//!
//! * [`CommandRunner`] runs external programs.  Plugins only ever talk to
//!   the system through it, so tests can substitute a scripted runner.
//! * [`Plugin`] is the contract every applet implements.
//! * [`CommandSource`] delivers [`Command`]s from some transport into the
//!   main loop.

use crate::command::Command;
use crate::grid::PixelRect;
use crate::size::{SizeClass, Span};
use crate::surface::GridSnapshot;
use crate::system::CommandError;
use std::sync::mpsc;
use std::time::Duration;

//  External commands

/// Runs external programs on behalf of plugins.
///
/// Implementations must be shareable across plugin worker threads.
pub trait CommandRunner: Send + Sync {
    /// Run `program` to completion and return its trimmed stdout.
    ///
    /// A non-zero exit status is an error.
    fn output(&self, program: &str, args: &[&str]) -> Result<String, CommandError>;

    /// Start `program` detached and return immediately.
    fn spawn(&self, program: &str, args: &[&str]) -> Result<(), CommandError>;
}

//  Plugins

/// Identity of a plugin kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PluginDescriptor {
    /// Unique key, also used in the layout file.
    pub name: &'static str,
    /// Display string for menus.
    pub title: &'static str,
    /// Span used when no size override is stored.
    pub default_span: Span,
    /// Size class reported to the plugin when no override is stored.
    pub default_size_class: SizeClass,
}

/// What a plugin tile shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PluginView {
    /// Theme icon name; empty for text-only tiles.
    pub icon: String,
    /// Label text; may span several lines.  `None` for icon-only tiles.
    pub text: Option<String>,
    /// Slider value in percent, for plugins that have one.
    pub level: Option<u8>,
}

impl PluginView {
    pub fn icon(icon: impl Into<String>) -> Self {
        Self {
            icon: icon.into(),
            ..Self::default()
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_level(mut self, level: u8) -> Self {
        self.level = Some(level);
        self
    }
}

/// A control-center applet.
///
/// A plugin owns its own display state.  Failures of the commands it runs
/// are absorbed inside the plugin and show up as a neutral view; nothing
/// here returns an error.
pub trait Plugin: Send {
    fn descriptor(&self) -> PluginDescriptor;

    /// Called whenever the effective size class changes, and once when the
    /// plugin is first placed.
    fn on_size_changed(&mut self, size: SizeClass);

    /// How often [`refresh`](Plugin::refresh) should run.  `None` means
    /// only on start-up and after user interaction.
    fn poll_interval(&self) -> Option<Duration> {
        None
    }

    /// Re-read external state.
    fn refresh(&mut self, _runner: &dyn CommandRunner) {}

    fn view(&self) -> PluginView;

    /// Primary click.
    fn activate(&mut self, runner: &dyn CommandRunner);

    /// Secondary (right) click.
    fn secondary(&mut self, _runner: &dyn CommandRunner) {}

    /// Scroll by `steps` notches; positive is up.
    fn scroll(&mut self, _runner: &dyn CommandRunner, _steps: i32) {}

    /// Slider moved to `percent`.
    fn set_level(&mut self, _runner: &dyn CommandRunner, _percent: u8) {}
}

//  Surface events

/// Events sent from the [`ControlSurface`](crate::surface::ControlSurface)
/// to whatever front-end renders it, over an [`mpsc`] channel.
///
/// The surface never holds widgets; it only describes what should be on
/// screen.
#[derive(Debug, Clone)]
pub enum SurfaceEvent {
    /// The grid changed shape; throw away all tiles and build these.
    Rebuild(GridSnapshot),
    /// Drop-target highlight in grid pixels, or `None` to clear it.
    Highlight(Option<PixelRect>),
    /// Show or hide the window.
    Visibility(bool),
    /// Edit mode switched on or off.
    EditMode(bool),
    /// A plugin has new content.
    PluginView { name: String, view: PluginView },
}

//  Command Source

/// A source of [`Command`]s.
///
/// Implementations listen on some transport (a Unix socket, a test
/// harness, …) and forward parsed commands into the provided
/// [`mpsc::Sender`].
///
/// # Contract
///
/// * [`run`](CommandSource::run) **blocks** until the source is exhausted or
///   an unrecoverable error occurs.
/// * Each received command must be sent through `sink` exactly once.
/// * Implementations must be [`Send`] so they can run on a dedicated thread.
pub trait CommandSource: Send {
    type Error: std::error::Error + Send + 'static;

    /// Start listening and forward every incoming [`Command`] into `sink`.
    fn run(&mut self, sink: mpsc::Sender<Command>) -> Result<(), Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A test double that emits a fixed sequence of commands.
    struct MockSource {
        commands: Vec<Command>,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("mock error")]
    struct MockError;

    impl CommandSource for MockSource {
        type Error = MockError;

        fn run(&mut self, sink: mpsc::Sender<Command>) -> Result<(), MockError> {
            for cmd in self.commands.drain(..) {
                let _ = sink.send(cmd);
            }
            Ok(())
        }
    }

    #[test]
    fn mock_source_emits_commands() {
        let mut src = MockSource {
            commands: vec![Command::Toggle, Command::Toggle],
        };
        let (tx, rx) = mpsc::channel();
        src.run(tx).unwrap();
        let cmds: Vec<Command> = rx.try_iter().collect();
        assert_eq!(cmds, vec![Command::Toggle, Command::Toggle]);
    }

    #[test]
    fn view_builder() {
        let v = PluginView::icon("audio-volume-high").with_text("40%").with_level(40);
        assert_eq!(v.icon, "audio-volume-high");
        assert_eq!(v.text.as_deref(), Some("40%"));
        assert_eq!(v.level, Some(40));
    }
}
