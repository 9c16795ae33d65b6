//! Current weather summary from `yweather`.

use super::log_failure;
use crate::size::{SizeClass, Span};
use crate::traits::{CommandRunner, Plugin, PluginDescriptor, PluginView};
use std::time::Duration;

pub const DESCRIPTOR: PluginDescriptor = PluginDescriptor {
    name: "Weather",
    title: "Weather",
    default_span: Span::new(2, 4),
    default_size_class: SizeClass::Large,
};

pub fn create() -> Box<dyn Plugin> {
    Box::new(Weather::default())
}

const UNAVAILABLE: &str = "N/A";
const ICON: &str = "weather-clouds";

#[derive(Debug)]
pub struct Weather {
    size: SizeClass,
    summary: String,
}

impl Default for Weather {
    fn default() -> Self {
        Self {
            size: SizeClass::Large,
            summary: UNAVAILABLE.to_string(),
        }
    }
}

impl Plugin for Weather {
    fn descriptor(&self) -> PluginDescriptor {
        DESCRIPTOR
    }

    fn on_size_changed(&mut self, size: SizeClass) {
        self.size = size;
    }

    fn poll_interval(&self) -> Option<Duration> {
        Some(Duration::from_secs(300))
    }

    fn refresh(&mut self, runner: &dyn CommandRunner) {
        self.summary = match runner.output("yweather", &["-m"]) {
            Ok(out) if !out.is_empty() => out,
            Ok(_) => UNAVAILABLE.to_string(),
            Err(e) => {
                log_failure(DESCRIPTOR.name, &e);
                UNAVAILABLE.to_string()
            }
        };
    }

    fn view(&self) -> PluginView {
        match self.size {
            SizeClass::Small | SizeClass::Normal => PluginView::icon(ICON),
            SizeClass::Medium | SizeClass::Large => {
                PluginView::default().with_text(self.summary.clone())
            }
            SizeClass::Huge | SizeClass::Default => {
                PluginView::icon(ICON).with_text(self.summary.clone())
            }
        }
    }

    fn activate(&mut self, runner: &dyn CommandRunner) {
        if let Err(e) = runner.spawn("yweather", &["-t"]) {
            log_failure(DESCRIPTOR.name, &e);
        }
    }
}
