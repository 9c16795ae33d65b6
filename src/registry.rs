//! The compiled-in plugin registry.
//!
//! Plugins are listed once in [`plugins::CATALOG`](crate::plugins::CATALOG);
//! adding a plugin means adding one entry there.  The registry is an
//! explicit object owned by the application's start-up routine.

use crate::plugins::{PluginEntry, CATALOG};
use crate::size::{span_of, SizeClass, Span};
use crate::traits::{Plugin, PluginDescriptor};
use log::warn;

/// Span used for plugins the registry does not know.
pub const FALLBACK_SPAN: Span = Span::new(2, 2);

/// Available plugin kinds and how to construct them.
#[derive(Debug, Clone)]
pub struct PluginRegistry {
    source: &'static [PluginEntry],
    entries: Vec<PluginEntry>,
}

impl PluginRegistry {
    /// Registry over the built-in catalog.
    pub fn builtin() -> Self {
        Self::from_catalog(CATALOG)
    }

    /// Registry over an arbitrary catalog.  Later entries whose name is
    /// already registered are dropped.
    pub fn from_catalog(source: &'static [PluginEntry]) -> Self {
        let mut registry = Self {
            source,
            entries: Vec::new(),
        };
        registry.reload();
        registry
    }

    /// Rebuild the entry list from the catalog.
    pub fn reload(&mut self) {
        self.entries.clear();
        for entry in self.source {
            if self.entries.iter().any(|e| e.descriptor.name == entry.descriptor.name) {
                warn!("duplicate plugin {} ignored", entry.descriptor.name);
                continue;
            }
            self.entries.push(*entry);
        }
    }

    pub fn list_available(&self) -> impl Iterator<Item = &PluginDescriptor> {
        self.entries.iter().map(|e| &e.descriptor)
    }

    pub fn descriptor(&self, name: &str) -> Option<&PluginDescriptor> {
        self.entries
            .iter()
            .map(|e| &e.descriptor)
            .find(|d| d.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.descriptor(name).is_some()
    }

    /// Effective span of `name` given its stored size override.
    ///
    /// A concrete override wins; otherwise the plugin's default span, or
    /// [`FALLBACK_SPAN`] if the plugin is unknown.
    pub fn resolve_span(&self, name: &str, size_override: SizeClass) -> Span {
        let fallback = self
            .descriptor(name)
            .map(|d| d.default_span)
            .unwrap_or(FALLBACK_SPAN);
        span_of(size_override, fallback)
    }

    /// Size class a plugin should render at: the override if concrete,
    /// else its default.
    pub fn effective_size(&self, name: &str, size_override: SizeClass) -> SizeClass {
        if size_override.is_concrete() {
            return size_override;
        }
        self.descriptor(name)
            .map(|d| d.default_size_class)
            .unwrap_or(SizeClass::Normal)
    }

    /// Construct a fresh instance of `name`.
    pub fn instantiate(&self, name: &str) -> Option<Box<dyn Plugin>> {
        self.entries
            .iter()
            .find(|e| e.descriptor.name == name)
            .map(|e| (e.create)())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::{settings, volume};

    #[test]
    fn builtin_lists_all_plugins() {
        let r = PluginRegistry::builtin();
        let names: Vec<&str> = r.list_available().map(|d| d.name).collect();
        for n in [
            "Volume",
            "Brightness",
            "Network",
            "Nightlight",
            "Bluetooth",
            "Clock",
            "Weather",
            "Updates",
            "Settings",
        ] {
            assert!(names.contains(&n), "missing {}", n);
        }
        assert_eq!(names.len(), 9);
    }

    #[test]
    fn resolve_span_prefers_override() {
        let r = PluginRegistry::builtin();
        assert_eq!(r.resolve_span("Weather", SizeClass::Default), Span::new(2, 4));
        assert_eq!(r.resolve_span("Weather", SizeClass::Small), Span::new(1, 1));
        assert_eq!(r.resolve_span("Volume", SizeClass::Huge), Span::new(4, 4));
    }

    #[test]
    fn unknown_plugin_gets_fallback_span() {
        let r = PluginRegistry::builtin();
        assert_eq!(r.resolve_span("Nope", SizeClass::Default), FALLBACK_SPAN);
        assert!(r.instantiate("Nope").is_none());
    }

    #[test]
    fn effective_size_uses_default_class() {
        let r = PluginRegistry::builtin();
        assert_eq!(r.effective_size("Weather", SizeClass::Default), SizeClass::Large);
        assert_eq!(r.effective_size("Volume", SizeClass::Default), SizeClass::Normal);
        assert_eq!(r.effective_size("Volume", SizeClass::Medium), SizeClass::Medium);
    }

    #[test]
    fn instantiate_matches_descriptor() {
        let r = PluginRegistry::builtin();
        let p = r.instantiate("Settings").unwrap();
        assert_eq!(p.descriptor(), settings::DESCRIPTOR);
    }

    static DUPLICATED: [PluginEntry; 2] = [
        PluginEntry {
            descriptor: volume::DESCRIPTOR,
            create: volume::create,
        },
        PluginEntry {
            descriptor: volume::DESCRIPTOR,
            create: volume::create,
        },
    ];

    #[test]
    fn duplicates_are_dropped_and_reload_is_stable() {
        let mut r = PluginRegistry::from_catalog(&DUPLICATED);
        assert_eq!(r.list_available().count(), 1);
        r.reload();
        assert_eq!(r.list_available().count(), 1);
    }
}
