//! Local date and time.

use super::log_failure;
use crate::size::{SizeClass, Span};
use crate::traits::{CommandRunner, Plugin, PluginDescriptor, PluginView};
use chrono::{Local, NaiveDateTime};
use std::time::Duration;

pub const DESCRIPTOR: PluginDescriptor = PluginDescriptor {
    name: "Clock",
    title: "Clock",
    default_span: Span::new(2, 2),
    default_size_class: SizeClass::Normal,
};

pub fn create() -> Box<dyn Plugin> {
    Box::new(Clock::default())
}

const CALENDAR_ICON: &str = "view-calendar";

#[derive(Debug)]
pub struct Clock {
    size: SizeClass,
    now: NaiveDateTime,
}

impl Default for Clock {
    fn default() -> Self {
        Self {
            size: SizeClass::Normal,
            now: Local::now().naive_local(),
        }
    }
}

/// Tile content for `size` at `now`.
fn render(size: SizeClass, now: &NaiveDateTime) -> PluginView {
    let time = now.format("%H:%M:%S");
    match size {
        SizeClass::Small => PluginView::icon(CALENDAR_ICON),
        SizeClass::Normal => {
            PluginView::default().with_text(format!("{}\n{}", now.format("%d %b %y"), time))
        }
        SizeClass::Medium => {
            PluginView::default().with_text(format!("{}\n{}", now.format("%a %d %b %y"), time))
        }
        SizeClass::Large => PluginView::default().with_text(format!(
            "{}\n{}\n{}",
            now.format("%A %d"),
            now.format("%B %Y"),
            time
        )),
        SizeClass::Huge => PluginView::icon(CALENDAR_ICON).with_text(format!(
            "{}\n{}\n{}",
            now.format("%A %d"),
            now.format("%B %Y"),
            time
        )),
        SizeClass::Default => PluginView::default().with_text(time.to_string()),
    }
}

impl Plugin for Clock {
    fn descriptor(&self) -> PluginDescriptor {
        DESCRIPTOR
    }

    fn on_size_changed(&mut self, size: SizeClass) {
        self.size = size;
    }

    fn poll_interval(&self) -> Option<Duration> {
        Some(Duration::from_secs(1))
    }

    fn refresh(&mut self, _runner: &dyn CommandRunner) {
        self.now = Local::now().naive_local();
    }

    fn view(&self) -> PluginView {
        render(self.size, &self.now)
    }

    fn activate(&mut self, runner: &dyn CommandRunner) {
        if let Err(e) = runner.spawn("ycalendar", &[]) {
            log_failure(DESCRIPTOR.name, &e);
        }
    }
}
