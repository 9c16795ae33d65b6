//! Launcher for the system settings panel.

use super::{icon_only, log_failure};
use crate::size::{SizeClass, Span};
use crate::traits::{CommandRunner, Plugin, PluginDescriptor, PluginView};

pub const DESCRIPTOR: PluginDescriptor = PluginDescriptor {
    name: "Settings",
    title: "Settings",
    default_span: Span::new(2, 2),
    default_size_class: SizeClass::Normal,
};

pub fn create() -> Box<dyn Plugin> {
    Box::new(Settings::default())
}

#[derive(Debug, Default)]
pub struct Settings {
    size: SizeClass,
}

impl Plugin for Settings {
    fn descriptor(&self) -> PluginDescriptor {
        DESCRIPTOR
    }

    fn on_size_changed(&mut self, size: SizeClass) {
        self.size = size;
    }

    fn view(&self) -> PluginView {
        let view = PluginView::icon("tools");
        if icon_only(self.size) {
            return view;
        }
        view.with_text("Control Center")
    }

    fn activate(&mut self, runner: &dyn CommandRunner) {
        if let Err(e) = runner.spawn("ycc", &["-t"]) {
            log_failure(DESCRIPTOR.name, &e);
        }
    }
}
