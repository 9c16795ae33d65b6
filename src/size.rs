//! Size classes and the spans they map to.
//!
//! A [`SizeClass`] is a named preset that controls how many grid cells a
//! plugin occupies and how much content it renders.  [`SizeClass::Default`]
//! means "use the plugin's built-in span".

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// `(row_span, col_span)` of a plugin, both at least `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub rows: usize,
    pub cols: usize,
}

impl Span {
    pub const fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }
}

/// Named size preset for a plugin instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SizeClass {
    /// Use the plugin's own default span.
    #[default]
    Default,
    Small,
    Normal,
    Medium,
    Large,
    Huge,
}

impl SizeClass {
    /// Every size class in menu order.
    pub const ALL: [SizeClass; 6] = [
        SizeClass::Default,
        SizeClass::Small,
        SizeClass::Normal,
        SizeClass::Medium,
        SizeClass::Large,
        SizeClass::Huge,
    ];

    /// Parse a size-class name (case-insensitive).  Unrecognised names map
    /// to [`SizeClass::Default`].
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "small" => SizeClass::Small,
            "normal" => SizeClass::Normal,
            "medium" => SizeClass::Medium,
            "large" => SizeClass::Large,
            "huge" => SizeClass::Huge,
            _ => SizeClass::Default,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SizeClass::Default => "Default",
            SizeClass::Small => "Small",
            SizeClass::Normal => "Normal",
            SizeClass::Medium => "Medium",
            SizeClass::Large => "Large",
            SizeClass::Huge => "Huge",
        }
    }

    /// Whether this is a concrete preset rather than [`SizeClass::Default`].
    pub fn is_concrete(self) -> bool {
        self != SizeClass::Default
    }
}

impl fmt::Display for SizeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for SizeClass {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SizeClass {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(SizeClass::parse(&s))
    }
}

/// Look up the span of `size`, falling back to `fallback` for
/// [`SizeClass::Default`].
pub fn span_of(size: SizeClass, fallback: Span) -> Span {
    match size {
        SizeClass::Small => Span::new(1, 1),
        SizeClass::Normal => Span::new(2, 2),
        SizeClass::Medium => Span::new(2, 3),
        SizeClass::Large => Span::new(2, 4),
        SizeClass::Huge => Span::new(4, 4),
        SizeClass::Default => fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concrete_classes_map_to_fixed_spans() {
        let fb = Span::new(3, 7);
        assert_eq!(span_of(SizeClass::Small, fb), Span::new(1, 1));
        assert_eq!(span_of(SizeClass::Normal, fb), Span::new(2, 2));
        assert_eq!(span_of(SizeClass::Medium, fb), Span::new(2, 3));
        assert_eq!(span_of(SizeClass::Large, fb), Span::new(2, 4));
        assert_eq!(span_of(SizeClass::Huge, fb), Span::new(4, 4));
    }

    #[test]
    fn default_uses_fallback() {
        assert_eq!(span_of(SizeClass::Default, Span::new(2, 4)), Span::new(2, 4));
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(SizeClass::parse("LARGE"), SizeClass::Large);
        assert_eq!(SizeClass::parse(" small "), SizeClass::Small);
    }

    #[test]
    fn unknown_names_become_default() {
        assert_eq!(SizeClass::parse("Gigantic"), SizeClass::Default);
        let s: SizeClass = serde_json::from_str(r#""whatever""#).unwrap();
        assert_eq!(s, SizeClass::Default);
    }

    #[test]
    fn serializes_as_name() {
        assert_eq!(serde_json::to_string(&SizeClass::Medium).unwrap(), r#""Medium""#);
    }
}
