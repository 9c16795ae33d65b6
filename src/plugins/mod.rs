//! Built-in plugins.
//!
//! Every plugin module exposes a `DESCRIPTOR` and a `create` factory, and
//! is listed once in [`CATALOG`].

pub mod bluetooth;
pub mod brightness;
pub mod clock;
pub mod network;
pub mod nightlight;
pub mod settings;
pub mod updates;
pub mod volume;
pub mod weather;

use crate::size::SizeClass;
use crate::system::CommandError;
use crate::traits::{Plugin, PluginDescriptor};
use log::debug;
use regex::Regex;
use std::sync::LazyLock;

/// One registrable plugin kind.
#[derive(Debug, Clone, Copy)]
pub struct PluginEntry {
    pub descriptor: PluginDescriptor,
    pub create: fn() -> Box<dyn Plugin>,
}

/// The compiled-in plugin list.
pub static CATALOG: &[PluginEntry] = &[
    PluginEntry {
        descriptor: volume::DESCRIPTOR,
        create: volume::create,
    },
    PluginEntry {
        descriptor: brightness::DESCRIPTOR,
        create: brightness::create,
    },
    PluginEntry {
        descriptor: network::DESCRIPTOR,
        create: network::create,
    },
    PluginEntry {
        descriptor: nightlight::DESCRIPTOR,
        create: nightlight::create,
    },
    PluginEntry {
        descriptor: bluetooth::DESCRIPTOR,
        create: bluetooth::create,
    },
    PluginEntry {
        descriptor: clock::DESCRIPTOR,
        create: clock::create,
    },
    PluginEntry {
        descriptor: weather::DESCRIPTOR,
        create: weather::create,
    },
    PluginEntry {
        descriptor: updates::DESCRIPTOR,
        create: updates::create,
    },
    PluginEntry {
        descriptor: settings::DESCRIPTOR,
        create: settings::create,
    },
];

//  Shared helpers

static PERCENT: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"(\d+)%").ok());

/// The first `N%` in `text`, clamped to 100.
pub(crate) fn first_percent(text: &str) -> Option<u8> {
    let caps = PERCENT.as_ref()?.captures(text)?;
    let value: u32 = caps.get(1)?.as_str().parse().ok()?;
    Some(value.min(100) as u8)
}

/// `current + delta`, kept within `0..=100`.
pub(crate) fn step_percent(current: u8, delta: i32) -> u8 {
    (i32::from(current) + delta).clamp(0, 100) as u8
}

/// Small tiles show only their icon.
pub(crate) fn icon_only(size: SizeClass) -> bool {
    size == SizeClass::Small
}

/// Log a failed external command.  Plugins fall back to a neutral state
/// instead of surfacing these.
pub(crate) fn log_failure(plugin: &str, err: &CommandError) {
    debug!("{}: {}", plugin, err);
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_parsing() {
        assert_eq!(
            first_percent("Volume: front-left: 26214 /  40% / -23.88 dB"),
            Some(40)
        );
        assert_eq!(first_percent("no numbers"), None);
        assert_eq!(first_percent("150%"), Some(100));
    }

    #[test]
    fn percent_pattern_is_shared() {
        assert!(PERCENT.is_some());
        for _ in 0..3 {
            assert_eq!(first_percent("Mono: 65536 / 100% / 0.00 dB"), Some(100));
        }
    }

    #[test]
    fn percent_steps_clamp() {
        assert_eq!(step_percent(98, 5), 100);
        assert_eq!(step_percent(3, -5), 0);
        assert_eq!(step_percent(50, 5), 55);
    }

    #[test]
    fn catalog_descriptors_match_instances() {
        for entry in CATALOG {
            assert_eq!((entry.create)().descriptor(), entry.descriptor);
        }
    }
}
