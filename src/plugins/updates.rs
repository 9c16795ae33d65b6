//! Pending system updates from `ysystemupdate`.

use super::{icon_only, log_failure};
use crate::size::{SizeClass, Span};
use crate::traits::{CommandRunner, Plugin, PluginDescriptor, PluginView};
use log::debug;
use serde::Deserialize;
use std::time::Duration;

pub const DESCRIPTOR: PluginDescriptor = PluginDescriptor {
    name: "Updates",
    title: "System Updates",
    default_span: Span::new(2, 2),
    default_size_class: SizeClass::Normal,
};

pub fn create() -> Box<dyn Plugin> {
    Box::new(Updates::default())
}

const UP_TO_DATE: &str = "Up to date.";

/// The JSON object printed by `ysystemupdate -m`.
#[derive(Debug, Default, Deserialize)]
struct UpdateStatus {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Default)]
pub struct Updates {
    size: SizeClass,
    /// Number of pending updates as reported, empty when none.
    pending: String,
}

fn parse_status(out: &str) -> String {
    match serde_json::from_str::<UpdateStatus>(out) {
        Ok(status) => status.text.trim().to_string(),
        Err(e) => {
            debug!("{}: bad status json: {}", DESCRIPTOR.name, e);
            String::new()
        }
    }
}

impl Plugin for Updates {
    fn descriptor(&self) -> PluginDescriptor {
        DESCRIPTOR
    }

    fn on_size_changed(&mut self, size: SizeClass) {
        self.size = size;
    }

    fn poll_interval(&self) -> Option<Duration> {
        Some(Duration::from_secs(600))
    }

    fn refresh(&mut self, runner: &dyn CommandRunner) {
        self.pending = match runner.output("ysystemupdate", &["-m"]) {
            Ok(out) => parse_status(&out),
            Err(e) => {
                log_failure(DESCRIPTOR.name, &e);
                String::new()
            }
        };
    }

    fn view(&self) -> PluginView {
        let view = PluginView::icon("update-none");
        if icon_only(self.size) {
            return view;
        }
        if self.pending.is_empty() {
            view.with_text(UP_TO_DATE)
        } else {
            view.with_text(format!("{} new updates", self.pending))
        }
    }

    fn activate(&mut self, runner: &dyn CommandRunner) {
        if let Err(e) = runner.spawn("ysystemupdate", &["-t"]) {
            log_failure(DESCRIPTOR.name, &e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::testing::MockRunner;

    #[test]
    fn pending_updates_are_counted() {
        let r = MockRunner::new().with("ysystemupdate -m", r#"{"text": " 12 ", "class": "pending"}"#);
        let mut u = Updates::default();
        u.refresh(&r);
        assert_eq!(u.view().text.as_deref(), Some("12 new updates"));
    }

    #[test]
    fn empty_text_and_failures_read_as_up_to_date() {
        let mut u = Updates::default();
        for out in [r#"{"text": ""}"#, "{}", "not json"] {
            let r = MockRunner::new().with("ysystemupdate -m", out);
            u.refresh(&r);
            assert_eq!(u.view().text.as_deref(), Some(UP_TO_DATE), "{}", out);
        }
        u.refresh(&MockRunner::new());
        assert_eq!(u.view().text.as_deref(), Some(UP_TO_DATE));
    }

    #[test]
    fn click_toggles_updater() {
        let r = MockRunner::new();
        Updates::default().activate(&r);
        assert!(r.called("spawn ysystemupdate -t"));
    }
}
