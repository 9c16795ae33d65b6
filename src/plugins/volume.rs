//! Default sink volume through `pactl`.

use super::{first_percent, icon_only, log_failure, step_percent};
use crate::size::{SizeClass, Span};
use crate::traits::{CommandRunner, Plugin, PluginDescriptor, PluginView};
use std::time::Duration;

pub const DESCRIPTOR: PluginDescriptor = PluginDescriptor {
    name: "Volume",
    title: "Volume Control",
    default_span: Span::new(2, 2),
    default_size_class: SizeClass::Normal,
};

pub fn create() -> Box<dyn Plugin> {
    Box::new(Volume::default())
}

const SINK: &str = "@DEFAULT_SINK@";
const STEP: i32 = 5;

#[derive(Debug)]
pub struct Volume {
    size: SizeClass,
    level: u8,
    muted: bool,
}

impl Default for Volume {
    fn default() -> Self {
        Self {
            size: SizeClass::Normal,
            level: 50,
            muted: false,
        }
    }
}

impl Volume {
    fn apply_level(&mut self, runner: &dyn CommandRunner, level: u8) {
        self.level = level;
        let arg = format!("{}%", level);
        if let Err(e) = runner.output("pactl", &["set-sink-volume", SINK, &arg]) {
            log_failure(DESCRIPTOR.name, &e);
        }
    }
}

impl Plugin for Volume {
    fn descriptor(&self) -> PluginDescriptor {
        DESCRIPTOR
    }

    fn on_size_changed(&mut self, size: SizeClass) {
        self.size = size;
    }

    fn poll_interval(&self) -> Option<Duration> {
        Some(Duration::from_secs(1))
    }

    fn refresh(&mut self, runner: &dyn CommandRunner) {
        match runner.output("pactl", &["get-sink-volume", SINK]) {
            Ok(out) => {
                if let Some(level) = first_percent(&out) {
                    self.level = level;
                }
            }
            Err(e) => {
                log_failure(DESCRIPTOR.name, &e);
                return;
            }
        }
        match runner.output("pactl", &["get-sink-mute", SINK]) {
            Ok(out) => self.muted = out.to_lowercase().contains("yes"),
            Err(e) => log_failure(DESCRIPTOR.name, &e),
        }
    }

    fn view(&self) -> PluginView {
        let icon = if self.muted {
            "audio-volume-muted"
        } else {
            "audio-volume-high"
        };
        let view = PluginView::icon(icon);
        if icon_only(self.size) {
            return view;
        }
        view.with_text(format!("{}%", self.level))
            .with_level(self.level)
    }

    fn activate(&mut self, runner: &dyn CommandRunner) {
        self.muted = !self.muted;
        if let Err(e) = runner.output("pactl", &["set-sink-mute", SINK, "toggle"]) {
            log_failure(DESCRIPTOR.name, &e);
        }
    }

    fn secondary(&mut self, runner: &dyn CommandRunner) {
        if let Err(e) = runner.spawn("ycsound", &["-t"]) {
            log_failure(DESCRIPTOR.name, &e);
        }
    }

    fn scroll(&mut self, runner: &dyn CommandRunner, steps: i32) {
        let level = step_percent(self.level, steps.saturating_mul(STEP));
        self.apply_level(runner, level);
    }

    fn set_level(&mut self, runner: &dyn CommandRunner, percent: u8) {
        self.apply_level(runner, percent.min(100));
    }
}
