//! Backlight level through `brightnessctl`.

use super::{first_percent, icon_only, log_failure, step_percent};
use crate::size::{SizeClass, Span};
use crate::traits::{CommandRunner, Plugin, PluginDescriptor, PluginView};

pub const DESCRIPTOR: PluginDescriptor = PluginDescriptor {
    name: "Brightness",
    title: "Brightness Control",
    default_span: Span::new(2, 2),
    default_size_class: SizeClass::Normal,
};

pub fn create() -> Box<dyn Plugin> {
    Box::new(Brightness::default())
}

const STEP: i32 = 5;

#[derive(Debug)]
pub struct Brightness {
    size: SizeClass,
    level: u8,
}

impl Default for Brightness {
    fn default() -> Self {
        Self {
            size: SizeClass::Normal,
            level: 50,
        }
    }
}

/// Percentage from `brightnessctl -m` output:
/// `intel_backlight,backlight,7500,78%,9600`.
fn parse_machine_output(out: &str) -> Option<u8> {
    let field = out.lines().next()?.split(',').nth(3)?;
    first_percent(field)
}

impl Plugin for Brightness {
    fn descriptor(&self) -> PluginDescriptor {
        DESCRIPTOR
    }

    fn on_size_changed(&mut self, size: SizeClass) {
        self.size = size;
    }

    fn refresh(&mut self, runner: &dyn CommandRunner) {
        match runner.output("brightnessctl", &["-m"]) {
            Ok(out) => {
                if let Some(level) = parse_machine_output(&out) {
                    self.level = level;
                }
            }
            Err(e) => log_failure(DESCRIPTOR.name, &e),
        }
    }

    fn view(&self) -> PluginView {
        let view = PluginView::icon("brightness-high");
        if icon_only(self.size) {
            return view;
        }
        let view = view.with_level(self.level);
        if matches!(self.size, SizeClass::Huge) {
            return view.with_text(format!("{}%", self.level));
        }
        view
    }

    /// Clicking the tile does nothing; the slider is the control.
    fn activate(&mut self, _runner: &dyn CommandRunner) {}

    fn scroll(&mut self, runner: &dyn CommandRunner, steps: i32) {
        let level = step_percent(self.level, steps.saturating_mul(STEP));
        self.set_level(runner, level);
    }

    fn set_level(&mut self, runner: &dyn CommandRunner, percent: u8) {
        self.level = percent.min(100);
        let arg = format!("{}%", self.level);
        if let Err(e) = runner.output("brightnessctl", &["set", &arg]) {
            log_failure(DESCRIPTOR.name, &e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::testing::MockRunner;

    #[test]
    fn parses_fourth_csv_field() {
        assert_eq!(
            parse_machine_output("intel_backlight,backlight,7500,78%,9600"),
            Some(78)
        );
        assert_eq!(parse_machine_output("garbage"), None);
    }

    #[test]
    fn refresh_then_scroll_down() {
        let r = MockRunner::new()
            .with("brightnessctl -m", "intel_backlight,backlight,7500,78%,9600")
            .with("brightnessctl set 73%", "");
        let mut b = Brightness::default();
        b.refresh(&r);
        assert_eq!(b.view().level, Some(78));
        b.scroll(&r, -1);
        assert!(r.called("brightnessctl set 73%"));
        assert_eq!(b.view().level, Some(73));
    }

    #[test]
    fn huge_tile_shows_percentage() {
        let mut b = Brightness::default();
        b.on_size_changed(SizeClass::Huge);
        assert_eq!(b.view().text.as_deref(), Some("50%"));
        b.on_size_changed(SizeClass::Normal);
        assert!(b.view().text.is_none());
    }
}
