//! Persistent access to the layout document.
//!
//! [`LayoutStore`] owns the in-memory [`LayoutDocument`] and writes it back
//! to disk synchronously after every mutation.  It assumes a single writer:
//! changes made to the file by another process are overwritten on the next
//! save.

use crate::config::{GridSection, LayoutDocument, LayoutState};
use crate::grid::GridPosition;
use crate::size::SizeClass;
use log::debug;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Errors produced while persisting the layout.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("io error writing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("serialize error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Layout state plus the file it is flushed to.
///
/// The in-memory state is always updated, even when the flush fails; the
/// error is returned so the caller can log it.
#[derive(Debug, Clone)]
pub struct LayoutStore {
    path: Option<PathBuf>,
    doc: LayoutDocument,
}

impl LayoutStore {
    /// Load the document at `path`, falling back to the built-in layout.
    /// Later mutations are written back to `path`.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let doc = LayoutDocument::load_or_default(&path);
        Self {
            path: Some(path),
            doc,
        }
    }

    /// A store that never touches the filesystem.
    pub fn in_memory(doc: LayoutDocument) -> Self {
        Self { path: None, doc }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn state(&self) -> &LayoutState {
        &self.doc.plugins
    }

    pub fn grid(&self) -> &GridSection {
        &self.doc.grid
    }

    //  Enabled list

    pub fn enabled(&self) -> &[String] {
        &self.doc.plugins.enabled
    }

    pub fn set_enabled(&mut self, enabled: Vec<String>) -> Result<(), StoreError> {
        self.doc.plugins.enabled = enabled;
        self.save()
    }

    //  Positions

    pub fn position(&self, name: &str) -> Option<GridPosition> {
        self.doc.plugins.positions.get(name).copied()
    }

    /// Every stored position, including those of disabled plugins.
    pub fn all_positions(&self) -> &BTreeMap<String, GridPosition> {
        &self.doc.plugins.positions
    }

    pub fn set_position(&mut self, name: &str, pos: GridPosition) -> Result<(), StoreError> {
        self.doc.plugins.positions.insert(name.to_string(), pos);
        self.save()
    }

    /// Store several positions with a single flush (used for swaps).
    pub fn set_positions<'a>(
        &mut self,
        updates: impl IntoIterator<Item = (&'a str, GridPosition)>,
    ) -> Result<(), StoreError> {
        for (name, pos) in updates {
            self.doc.plugins.positions.insert(name.to_string(), pos);
        }
        self.save()
    }

    //  Size overrides

    pub fn size_override(&self, name: &str) -> SizeClass {
        self.doc.plugins.size_override(name)
    }

    /// Store a size override.  [`SizeClass::Default`] clears it.
    pub fn set_size_override(&mut self, name: &str, size: SizeClass) -> Result<(), StoreError> {
        if size.is_concrete() {
            self.doc.plugins.size_overrides.insert(name.to_string(), size);
        } else {
            self.doc.plugins.size_overrides.remove(name);
        }
        self.save()
    }

    //  Persistence

    /// Write the document to disk.  In-memory stores do nothing.
    fn save(&self) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let io_err = |source| StoreError::Io {
            path: path.clone(),
            source,
        };
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(&self.doc)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(io_err)?;
        std::fs::rename(&tmp, path).map_err(io_err)?;
        debug!("saved layout to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    static TEST_ID: AtomicU32 = AtomicU32::new(0);

    /// A unique file path inside a fresh directory per test.
    fn tmp_path() -> PathBuf {
        let id = TEST_ID.fetch_add(1, Ordering::SeqCst);
        std::env::temp_dir()
            .join(format!("ywidgets-store-{}-{}", std::process::id(), id))
            .join("config.json")
    }

    fn cleanup(path: &Path) {
        if let Some(dir) = path.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }

    #[test]
    fn missing_file_exposes_builtin_layout() {
        let path = tmp_path();
        let store = LayoutStore::open(&path);
        assert_eq!(store.enabled().len(), 8);
        assert_eq!(store.position("Volume"), Some(GridPosition::new(0, 0)));
        cleanup(&path);
    }

    #[test]
    fn setters_persist_immediately() {
        let path = tmp_path();
        let mut store = LayoutStore::open(&path);
        store.set_position("Volume", GridPosition::new(5, 1)).unwrap();
        store.set_size_override("Volume", SizeClass::Small).unwrap();
        store
            .set_enabled(vec!["Volume".into(), "Clock".into()])
            .unwrap();

        let reopened = LayoutStore::open(&path);
        assert_eq!(reopened.position("Volume"), Some(GridPosition::new(5, 1)));
        assert_eq!(reopened.size_override("Volume"), SizeClass::Small);
        assert_eq!(reopened.enabled(), &["Volume".to_string(), "Clock".to_string()]);
        cleanup(&path);
    }

    #[test]
    fn default_size_clears_override() {
        let mut store = LayoutStore::in_memory(LayoutDocument::default());
        store.set_size_override("Clock", SizeClass::Huge).unwrap();
        assert_eq!(store.size_override("Clock"), SizeClass::Huge);
        store.set_size_override("Clock", SizeClass::Default).unwrap();
        assert_eq!(store.size_override("Clock"), SizeClass::Default);
        assert!(store.state().size_overrides.is_empty());
    }

    #[test]
    fn all_positions_includes_disabled_plugins() {
        let mut store = LayoutStore::in_memory(LayoutDocument::default());
        store.set_enabled(vec!["Volume".into()]).unwrap();
        assert_eq!(store.all_positions().len(), 8);
    }

    #[test]
    fn set_positions_applies_all_updates() {
        let mut store = LayoutStore::in_memory(LayoutDocument::default());
        store
            .set_positions([
                ("Volume", GridPosition::new(0, 2)),
                ("Brightness", GridPosition::new(0, 0)),
            ])
            .unwrap();
        assert_eq!(store.position("Volume"), Some(GridPosition::new(0, 2)));
        assert_eq!(store.position("Brightness"), Some(GridPosition::new(0, 0)));
    }

    #[test]
    fn in_memory_store_has_no_path() {
        let store = LayoutStore::in_memory(LayoutDocument::default());
        assert!(store.path().is_none());
    }

    #[test]
    fn corrupt_file_is_replaced_on_next_save() {
        let path = tmp_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "not json").unwrap();
        let mut store = LayoutStore::open(&path);
        assert_eq!(store.enabled().len(), 8);
        store.set_position("Clock", GridPosition::new(10, 0)).unwrap();
        let doc = LayoutDocument::load(&path).unwrap();
        assert_eq!(doc.plugins.positions["Clock"], GridPosition::new(10, 0));
        cleanup(&path);
    }
}
