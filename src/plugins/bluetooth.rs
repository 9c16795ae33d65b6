//! Launcher for the Bluetooth manager.

use super::{icon_only, log_failure};
use crate::size::{SizeClass, Span};
use crate::traits::{CommandRunner, Plugin, PluginDescriptor, PluginView};

pub const DESCRIPTOR: PluginDescriptor = PluginDescriptor {
    name: "Bluetooth",
    title: "Bluetooth",
    default_span: Span::new(2, 2),
    default_size_class: SizeClass::Normal,
};

pub fn create() -> Box<dyn Plugin> {
    Box::new(Bluetooth::default())
}

#[derive(Debug, Default)]
pub struct Bluetooth {
    size: SizeClass,
}

impl Plugin for Bluetooth {
    fn descriptor(&self) -> PluginDescriptor {
        DESCRIPTOR
    }

    fn on_size_changed(&mut self, size: SizeClass) {
        self.size = size;
    }

    fn view(&self) -> PluginView {
        let view = PluginView::icon("bluetooth-disabled");
        if icon_only(self.size) {
            return view;
        }
        view.with_text("Bluetooth")
    }

    fn activate(&mut self, runner: &dyn CommandRunner) {
        if let Err(e) = runner.spawn("blueman-manager", &[]) {
            log_failure(DESCRIPTOR.name, &e);
        }
    }
}
