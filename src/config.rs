//! The persisted layout document.
//!
//! The document lives at `$XDG_CONFIG_HOME/ywidgets/config.json` and holds
//! the window/grid metrics plus the plugin layout.  Every section is
//! optional; a missing or unreadable file falls back to
//! [`LayoutDocument::default`], the built-in eight-plugin layout.
//!
//! # Example
//!
//! ```json
//! {
//!   "window": { "width": 400, "height": 600 },
//!   "grid": { "columns": 4, "rows": 20, "cell_size": 48, "spacing": 2 },
//!   "plugins": {
//!     "enabled": ["Volume", "Weather"],
//!     "positions": {
//!       "Volume": { "row": 0, "col": 0 },
//!       "Weather": { "row": 2, "col": 0 }
//!     },
//!     "sizes": { "Volume": "Small" }
//!   }
//! }
//! ```

use crate::grid::GridPosition;
use crate::size::SizeClass;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Top-level layout document.
///
/// A parseable file with a section left out gets that section's own
/// default; in particular a missing `plugins` section enables nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutDocument {
    /// Informational only; the real window size is derived from the grid.
    #[serde(default)]
    pub window: WindowSection,

    /// Grid metrics.
    #[serde(default)]
    pub grid: GridSection,

    /// Enabled plugins, their anchors and size overrides.
    #[serde(default)]
    pub plugins: LayoutState,
}

/// Last known window size.  Never read back into the layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSection {
    pub width: u32,
    pub height: u32,
}

impl Default for WindowSection {
    fn default() -> Self {
        Self {
            width: 400,
            height: 600,
        }
    }
}

/// Grid metrics.
///
/// `columns` and `rows` are advisory and do not bound the layout.
/// `cell_size` and `spacing` are in pixels and drive both pointer-to-cell
/// mapping and window sizing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSection {
    pub columns: usize,
    pub rows: usize,
    pub cell_size: u32,
    pub spacing: u32,
}

impl Default for GridSection {
    fn default() -> Self {
        Self {
            columns: 4,
            rows: 20,
            cell_size: 48,
            spacing: 2,
        }
    }
}

/// The plugin layout.
///
/// `enabled` keeps insertion order (used for menus only, not for the grid).
/// `positions` may hold entries for disabled plugins; those are inert.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutState {
    pub enabled: Vec<String>,
    pub positions: BTreeMap<String, GridPosition>,
    #[serde(rename = "sizes")]
    pub size_overrides: BTreeMap<String, SizeClass>,
}

impl LayoutState {
    pub fn is_enabled(&self, name: &str) -> bool {
        self.enabled.iter().any(|n| n == name)
    }

    /// Stored size override, [`SizeClass::Default`] when none is set.
    pub fn size_override(&self, name: &str) -> SizeClass {
        self.size_overrides.get(name).copied().unwrap_or_default()
    }
}

/// Built-in layout: `(name, row, col)`.
const DEFAULT_LAYOUT: [(&str, usize, usize); 8] = [
    ("Volume", 0, 0),
    ("Brightness", 0, 2),
    ("Network", 2, 0),
    ("Nightlight", 2, 2),
    ("Weather", 4, 0),
    ("Settings", 6, 0),
    ("Bluetooth", 6, 2),
    ("Updates", 8, 0),
];

impl Default for LayoutDocument {
    fn default() -> Self {
        let plugins = LayoutState {
            enabled: DEFAULT_LAYOUT.iter().map(|(n, _, _)| n.to_string()).collect(),
            positions: DEFAULT_LAYOUT
                .iter()
                .map(|&(n, row, col)| (n.to_string(), GridPosition::new(row, col)))
                .collect(),
            size_overrides: BTreeMap::new(),
        };
        Self {
            window: WindowSection::default(),
            grid: GridSection::default(),
            plugins,
        }
    }
}

impl LayoutDocument {
    /// Load the document from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError(format!("failed to read {}: {}", path.display(), e)))?;
        let doc: Self = serde_json::from_str(&contents)
            .map_err(|e| ConfigError(format!("failed to parse {}: {}", path.display(), e)))?;
        Ok(doc)
    }

    /// Like [`load`](Self::load), but substitutes the built-in layout for a
    /// missing or corrupt file.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(doc) => {
                info!("loaded layout from {}", path.display());
                doc
            }
            Err(e) if path.exists() => {
                warn!("{}, using built-in layout", e);
                Self::default()
            }
            Err(e) => {
                info!("no layout file ({}), using built-in layout", e);
                Self::default()
            }
        }
    }
}

/// Error from loading or parsing the layout document.
#[derive(Debug, thiserror::Error)]
#[error("config error: {0}")]
pub struct ConfigError(String);
