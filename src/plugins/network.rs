//! NetworkManager status and on/off toggle through `nmcli`.

use super::{icon_only, log_failure};
use crate::size::{SizeClass, Span};
use crate::traits::{CommandRunner, Plugin, PluginDescriptor, PluginView};
use std::time::Duration;

pub const DESCRIPTOR: PluginDescriptor = PluginDescriptor {
    name: "Network",
    title: "Network Manager",
    default_span: Span::new(2, 2),
    default_size_class: SizeClass::Normal,
};

pub fn create() -> Box<dyn Plugin> {
    Box::new(Network::default())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Link {
    /// Networking is switched off.
    Disabled,
    /// Networking is on but nothing is connected, or nmcli failed.
    #[default]
    Offline,
    Wired,
    Wireless,
}

#[derive(Debug, Default)]
pub struct Network {
    size: SizeClass,
    link: Link,
}

impl Network {
    fn detect(runner: &dyn CommandRunner) -> Link {
        let enabled = match runner.output("nmcli", &["networking"]) {
            Ok(out) => out.contains("enabled"),
            Err(e) => {
                log_failure(DESCRIPTOR.name, &e);
                return Link::Offline;
            }
        };
        if !enabled {
            return Link::Disabled;
        }
        match runner.output("nmcli", &["connection", "show", "--active"]) {
            Ok(out) if out.trim().is_empty() => Link::Offline,
            Ok(out) if out.contains("ethernet") => Link::Wired,
            Ok(_) => Link::Wireless,
            Err(e) => {
                log_failure(DESCRIPTOR.name, &e);
                Link::Offline
            }
        }
    }
}

impl Plugin for Network {
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
        self.link = Self::detect(runner);
    }

    fn view(&self) -> PluginView {
        let (icon, text) = match self.link {
            Link::Disabled => ("network-error", "Enable"),
            Link::Offline => ("network-error", "No network."),
            Link::Wired => ("network-wired-activated", "Disable"),
            Link::Wireless => ("network-wireless-on", "Disable"),
        };
        let view = PluginView::icon(icon);
        if icon_only(self.size) {
            return view;
        }
        view.with_text(text)
    }

    fn activate(&mut self, runner: &dyn CommandRunner) {
        let state = match runner.output("nmcli", &["networking"]) {
            Ok(out) if out.contains("enabled") => "off",
            Ok(_) => "on",
            Err(e) => {
                log_failure(DESCRIPTOR.name, &e);
                return;
            }
        };
        if let Err(e) = runner.output("nmcli", &["networking", state]) {
            log_failure(DESCRIPTOR.name, &e);
        }
        self.refresh(runner);
    }

    fn secondary(&mut self, runner: &dyn CommandRunner) {
        if let Err(e) = runner.spawn("nmtui", &[]) {
            log_failure(DESCRIPTOR.name, &e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::testing::MockRunner;

    fn view_for(networking: &str, active: &str) -> PluginView {
        let r = MockRunner::new()
            .with("nmcli networking", networking)
            .with("nmcli connection show --active", active);
        let mut n = Network::default();
        n.refresh(&r);
        n.view()
    }

    #[test]
    fn wired_and_wireless_states() {
        let wired = view_for(
            "enabled",
            "NAME  UUID  TYPE  DEVICE\nWired  1234  ethernet  enp3s0",
        );
        assert_eq!(wired.icon, "network-wired-activated");
        assert_eq!(wired.text.as_deref(), Some("Disable"));

        let wifi = view_for("enabled", "NAME  UUID  TYPE  DEVICE\nHome  5678  wifi  wlan0");
        assert_eq!(wifi.icon, "network-wireless-on");
    }

    #[test]
    fn disabled_and_offline_states() {
        assert_eq!(view_for("disabled", "").text.as_deref(), Some("Enable"));
        assert_eq!(view_for("enabled", "").text.as_deref(), Some("No network."));
    }

    #[test]
    fn missing_nmcli_reads_as_no_network() {
        let r = MockRunner::new();
        let mut n = Network::default();
        n.refresh(&r);
        assert_eq!(n.view().text.as_deref(), Some("No network."));
    }

    #[test]
    fn click_switches_networking_off_when_enabled() {
        let r = MockRunner::new()
            .with("nmcli networking", "enabled")
            .with("nmcli networking off", "")
            .with("nmcli connection show --active", "");
        let mut n = Network::default();
        n.activate(&r);
        assert!(r.called("nmcli networking off"));
    }

    #[test]
    fn right_click_opens_nmtui() {
        let r = MockRunner::new();
        let mut n = Network::default();
        n.secondary(&r);
        assert_eq!(r.calls(), vec!["spawn nmtui".to_string()]);
    }
}
