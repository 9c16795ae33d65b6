//! End-to-end layout editing against a file-backed store.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{mpsc, Arc};
use ywidgets::grid::{DropOutcome, GridPosition};
use ywidgets::registry::PluginRegistry;
use ywidgets::size::SizeClass;
use ywidgets::store::LayoutStore;
use ywidgets::surface::{ControlSurface, MenuAction};
use ywidgets::system::CommandError;
use ywidgets::traits::{CommandRunner, SurfaceEvent};

/// Fails every command: plugins fall back to their offline views.
struct Offline;

impl CommandRunner for Offline {
    fn output(&self, program: &str, _args: &[&str]) -> Result<String, CommandError> {
        Err(CommandError::NotFound(program.into()))
    }

    fn spawn(&self, program: &str, _args: &[&str]) -> Result<(), CommandError> {
        Err(CommandError::NotFound(program.into()))
    }
}

static TEST_ID: AtomicU32 = AtomicU32::new(0);

fn tmp_path() -> PathBuf {
    let id = TEST_ID.fetch_add(1, Ordering::SeqCst);
    std::env::temp_dir()
        .join(format!("ywidgets-flow-{}-{}", std::process::id(), id))
        .join("config.json")
}

fn cleanup(path: &Path) {
    if let Some(dir) = path.parent() {
        let _ = std::fs::remove_dir_all(dir);
    }
}

fn open(path: &Path) -> (ControlSurface, mpsc::Receiver<SurfaceEvent>) {
    let (tx, rx) = mpsc::channel();
    let surface = ControlSurface::new(
        LayoutStore::open(path),
        PluginRegistry::builtin(),
        Arc::new(Offline),
        tx,
    );
    (surface, rx)
}

fn write_layout(path: &Path, json: &str) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, json).unwrap();
}

/// Pixel centre of `(row, col)` with the default 48px cells and 2px gaps.
fn px(row: usize, col: usize) -> (f64, f64) {
    (col as f64 * 50.0 + 24.0, row as f64 * 50.0 + 24.0)
}

#[test]
fn swap_survives_restart() {
    let path = tmp_path();
    write_layout(
        &path,
        r#"{"plugins":{"enabled":["Volume","Brightness"],
            "positions":{"Volume":{"row":0,"col":0},"Brightness":{"row":0,"col":2}}}}"#,
    );

    let (mut surface, _rx) = open(&path);
    surface.set_edit_mode(true);
    let (x, y) = px(0, 0);
    assert!(surface.press(x, y));
    let (x, y) = px(0, 2);
    assert!(matches!(surface.release(x, y), Some(DropOutcome::Swap { .. })));
    surface.shutdown();
    drop(surface);

    let (surface, _rx) = open(&path);
    let placement = surface.placement();
    assert_eq!(placement.get("Volume").unwrap().position, GridPosition::new(0, 2));
    assert_eq!(placement.get("Brightness").unwrap().position, GridPosition::new(0, 0));
    cleanup(&path);
}

#[test]
fn overlapping_file_is_repaired_on_load() {
    let path = tmp_path();
    write_layout(
        &path,
        r#"{"plugins":{"enabled":["Volume","Brightness"],
            "positions":{"Volume":{"row":0,"col":0},"Brightness":{"row":1,"col":1}}}}"#,
    );

    let (mut surface, _rx) = open(&path);
    assert!(!surface.placement().has_overlap());
    surface.shutdown();

    let reopened = LayoutStore::open(&path);
    let a = reopened.position("Volume").unwrap();
    let b = reopened.position("Brightness").unwrap();
    assert_ne!(a, b);
    assert!(a.row + 2 <= b.row || b.row + 2 <= a.row || a.col + 2 <= b.col || b.col + 2 <= a.col);
    cleanup(&path);
}

#[test]
fn menu_edits_are_persisted() {
    let path = tmp_path();
    write_layout(
        &path,
        r#"{"plugins":{"enabled":["Volume"],"positions":{"Volume":{"row":0,"col":0}}}}"#,
    );

    let (mut surface, _rx) = open(&path);
    surface.set_edit_mode(true);
    surface.perform(MenuAction::Add("Clock".into()));
    surface.perform(MenuAction::Resize("Volume".into(), SizeClass::Small));
    surface.perform(MenuAction::Remove("Volume".into()));
    surface.shutdown();

    let reopened = LayoutStore::open(&path);
    assert_eq!(reopened.enabled(), ["Clock".to_string()]);
    assert_eq!(reopened.size_override("Volume"), SizeClass::Small);
    assert_eq!(reopened.position("Clock"), Some(GridPosition::new(2, 0)));
    cleanup(&path);
}

#[test]
fn unreadable_file_falls_back_to_builtin_layout() {
    let path = tmp_path();
    write_layout(&path, "not json");

    let (mut surface, rx) = open(&path);
    assert_eq!(surface.placement().len(), 8);
    let rebuilt = rx.try_iter().any(|e| matches!(e, SurfaceEvent::Rebuild(_)));
    assert!(rebuilt);
    surface.shutdown();
    cleanup(&path);
}

#[test]
fn far_anchors_are_reassigned_and_persisted() {
    let path = tmp_path();
    write_layout(
        &path,
        r#"{"plugins":{"enabled":["Volume","Clock"],
            "positions":{"Volume":{"row":100000000,"col":0},
                         "Clock":{"row":0,"col":18446744073709551615}}}}"#,
    );

    let (mut surface, _rx) = open(&path);
    let placement = surface.placement();
    assert_eq!(placement.get("Volume").unwrap().position, GridPosition::new(0, 0));
    assert_eq!(placement.get("Clock").unwrap().position, GridPosition::new(2, 0));
    assert_eq!(surface.grid_size(), (98, 198));
    surface.shutdown();

    let reopened = LayoutStore::open(&path);
    assert_eq!(reopened.position("Volume"), Some(GridPosition::new(0, 0)));
    assert_eq!(reopened.position("Clock"), Some(GridPosition::new(2, 0)));
    cleanup(&path);
}

#[test]
fn huge_cell_metrics_do_not_overflow() {
    let path = tmp_path();
    write_layout(
        &path,
        r#"{"grid":{"cell_size":4294967295,"spacing":4294967295},
            "plugins":{"enabled":["Volume"],"positions":{"Volume":{"row":3,"col":3}}}}"#,
    );

    let (mut surface, _rx) = open(&path);
    assert_eq!(surface.grid_size(), (i32::MAX, i32::MAX));
    assert_eq!(surface.window_size(), (i32::MAX, i32::MAX));
    surface.shutdown();
    cleanup(&path);
}
