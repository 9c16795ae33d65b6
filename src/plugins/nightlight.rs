//! Night light toggle through `ycnightlight`.

use super::{icon_only, log_failure};
use crate::size::{SizeClass, Span};
use crate::traits::{CommandRunner, Plugin, PluginDescriptor, PluginView};
use std::time::Duration;

pub const DESCRIPTOR: PluginDescriptor = PluginDescriptor {
    name: "Nightlight",
    title: "Night Light",
    default_span: Span::new(2, 2),
    default_size_class: SizeClass::Normal,
};

pub fn create() -> Box<dyn Plugin> {
    Box::new(Nightlight::default())
}

#[derive(Debug, Default)]
pub struct Nightlight {
    size: SizeClass,
    enabled: bool,
}

fn is_enabled(runner: &dyn CommandRunner) -> bool {
    match runner.output("ycnightlight", &["-c"]) {
        Ok(out) => out.contains("enabled"),
        Err(e) => {
            log_failure(DESCRIPTOR.name, &e);
            false
        }
    }
}

impl Plugin for Nightlight {
    fn descriptor(&self) -> PluginDescriptor {
        DESCRIPTOR
    }

    fn on_size_changed(&mut self, size: SizeClass) {
        self.size = size;
    }

    fn poll_interval(&self) -> Option<Duration> {
        Some(Duration::from_secs(5))
    }

    fn refresh(&mut self, runner: &dyn CommandRunner) {
        self.enabled = is_enabled(runner);
    }

    fn view(&self) -> PluginView {
        let icon = if self.enabled {
            "weather-clear-night"
        } else {
            "weather-clear"
        };
        let view = PluginView::icon(icon);
        if icon_only(self.size) {
            return view;
        }
        view.with_text(if self.enabled { "Disable" } else { "Enable" })
    }

    fn activate(&mut self, runner: &dyn CommandRunner) {
        let target = if is_enabled(runner) { "off" } else { "on" };
        if let Err(e) = runner.output("ycnightlight", &["-s", target]) {
            log_failure(DESCRIPTOR.name, &e);
        }
        self.refresh(runner);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::testing::MockRunner;

    #[test]
    fn label_offers_the_opposite_state() {
        let r = MockRunner::new().with("ycnightlight -c", "enabled");
        let mut n = Nightlight::default();
        n.refresh(&r);
        assert_eq!(n.view().text.as_deref(), Some("Disable"));
        assert_eq!(n.view().icon, "weather-clear-night");

        r.set("ycnightlight -c", "disabled");
        n.refresh(&r);
        assert_eq!(n.view().text.as_deref(), Some("Enable"));
    }

    #[test]
    fn click_turns_on_when_off() {
        let r = MockRunner::new()
            .with("ycnightlight -c", "disabled")
            .with("ycnightlight -s on", "");
        let mut n = Nightlight::default();
        n.activate(&r);
        assert!(r.called("ycnightlight -s on"));
    }

    #[test]
    fn failure_reads_as_disabled() {
        let mut n = Nightlight::default();
        n.refresh(&MockRunner::new());
        assert_eq!(n.view().text.as_deref(), Some("Enable"));
    }
}
