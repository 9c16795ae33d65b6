//! The control surface: ties layout, plugins and the front-end together.
//!
//! [`ControlSurface`] owns the [`LayoutStore`], the [`PluginRegistry`], the
//! live [`Placement`] and the [`PluginHost`].  It reacts to pointer input,
//! menu actions and [`Command`]s, persists every layout change, and tells
//! the front-end what to draw through [`SurfaceEvent`]s.
//!
//! All layout mutation happens here, on the caller's thread.  Plugin
//! workers only ever produce views.

use crate::command::{Command, Direction};
use crate::grid::{arrange, CellMetrics, DropOutcome, GridPosition, PixelRect, Placement};
use crate::host::{PluginHost, PluginRequest};
use crate::registry::PluginRegistry;
use crate::size::{SizeClass, Span};
use crate::store::{LayoutStore, StoreError};
use crate::system::PowerAction;
use crate::traits::{CommandRunner, SurfaceEvent};
use log::{debug, info, warn};
use std::sync::mpsc;
use std::sync::Arc;

/// Minimum width of the grid area, so the power row always fits.
pub const MIN_GRID_WIDTH: i32 = 250;
/// Height reserved below the grid for the toolbar and power row.
pub const CHROME_HEIGHT: i32 = 65;
/// Window border on each axis.
pub const WINDOW_MARGIN: i32 = 4;

//  Snapshot

/// One placed plugin as the front-end should draw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    pub name: String,
    pub title: String,
    pub position: GridPosition,
    pub span: Span,
    pub size: SizeClass,
    pub rect: PixelRect,
}

/// Everything needed to (re)build the grid widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridSnapshot {
    pub tiles: Vec<Tile>,
    /// Pixel size of the grid area.
    pub grid_size: (i32, i32),
    /// Pixel size of the whole window.
    pub window_size: (i32, i32),
    pub edit_mode: bool,
}

//  Context menu

/// What a context-menu entry does when chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuAction {
    Add(String),
    Remove(String),
    Resize(String, SizeClass),
    Nudge(String, Direction),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuItem {
    Action { label: String, action: MenuAction },
    Submenu { label: String, items: Vec<MenuItem> },
}

impl MenuItem {
    fn action(label: impl Into<String>, action: MenuAction) -> Self {
        MenuItem::Action {
            label: label.into(),
            action,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            MenuItem::Action { label, .. } | MenuItem::Submenu { label, .. } => label,
        }
    }
}

//  Drag state

#[derive(Debug, Clone, PartialEq, Eq)]
enum DragState {
    Idle,
    Dragging {
        plugin: String,
        original: GridPosition,
        span: Span,
        /// Last cell the pointer was over, as `(row, col)`.
        target: (i64, i64),
    },
}

/// The control-center window's state and behaviour.
pub struct ControlSurface {
    store: LayoutStore,
    registry: PluginRegistry,
    placement: Placement,
    metrics: CellMetrics,
    host: PluginHost,
    events: mpsc::Sender<SurfaceEvent>,
    visible: bool,
    edit_mode: bool,
    drag: DragState,
}

impl ControlSurface {
    /// Build the surface from `store` and start every enabled plugin.
    ///
    /// `events` receives a [`SurfaceEvent::Rebuild`] right away, followed
    /// by one [`SurfaceEvent::PluginView`] per plugin as workers come up.
    pub fn new(
        store: LayoutStore,
        registry: PluginRegistry,
        runner: Arc<dyn CommandRunner>,
        events: mpsc::Sender<SurfaceEvent>,
    ) -> Self {
        let grid = store.grid();
        let metrics = CellMetrics::new(grid.cell_size, grid.spacing);
        let host = PluginHost::new(runner, events.clone());
        let mut surface = Self {
            store,
            registry,
            placement: Placement::default(),
            metrics,
            host,
            events,
            visible: false,
            edit_mode: false,
            drag: DragState::Idle,
        };
        surface.reload();
        surface
    }

    //  Accessors

    pub fn placement(&self) -> &Placement {
        &self.placement
    }

    pub fn store(&self) -> &LayoutStore {
        &self.store
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_edit_mode(&self) -> bool {
        self.edit_mode
    }

    /// The plugin being dragged, if any.
    pub fn dragging(&self) -> Option<&str> {
        match &self.drag {
            DragState::Dragging { plugin, .. } => Some(plugin),
            DragState::Idle => None,
        }
    }

    /// Plugin under grid pixel `(x, y)`.
    pub fn plugin_at_point(&self, x: f64, y: f64) -> Option<&str> {
        let (row, col) = self.metrics.cell_at(x, y);
        self.placement.plugin_at(row as usize, col as usize)
    }

    /// Process a single [`Command`].
    pub fn handle(&mut self, cmd: Command) {
        match cmd {
            Command::Toggle => {
                debug!("toggle");
                self.toggle_visibility();
            }
        }
    }

    //  Layout

    /// Re-arrange from the store, reconcile plugin workers with the result
    /// and rebuild the front-end.
    pub fn reload(&mut self) {
        let store = &self.store;
        let registry = &self.registry;
        let arrangement = arrange(store.state(), |name| {
            registry
                .contains(name)
                .then(|| registry.resolve_span(name, store.size_override(name)))
        });
        if !arrangement.assigned.is_empty() {
            info!("assigned {} plugin position(s)", arrangement.assigned.len());
            let updates = arrangement
                .assigned
                .iter()
                .map(|(name, pos)| (name.as_str(), *pos));
            let result = self.store.set_positions(updates);
            self.log_store(result);
        }
        self.placement = arrangement.placement;

        let stale: Vec<String> = self
            .registry
            .list_available()
            .map(|d| d.name.to_string())
            .filter(|n| self.host.is_running(n) && self.placement.get(n).is_none())
            .collect();
        for name in stale {
            self.host.stop(&name);
        }
        let names: Vec<String> = self.placement.plugins().iter().map(|p| p.name.clone()).collect();
        for name in names {
            if !self.host.is_running(&name) {
                self.start_plugin(&name);
            }
        }
        self.rebuild();
    }

    /// Pixel size of the grid area.
    pub fn grid_size(&self) -> (i32, i32) {
        self.metrics.grid_size(self.placement.bounds())
    }

    /// Pixel size of the whole window.
    pub fn window_size(&self) -> (i32, i32) {
        let (w, h) = self.grid_size();
        (
            w.max(MIN_GRID_WIDTH).saturating_add(WINDOW_MARGIN),
            h.saturating_add(CHROME_HEIGHT + WINDOW_MARGIN),
        )
    }

    pub fn snapshot(&self) -> GridSnapshot {
        let tiles = self
            .placement
            .plugins()
            .iter()
            .map(|p| Tile {
                name: p.name.clone(),
                title: self
                    .registry
                    .descriptor(&p.name)
                    .map(|d| d.title.to_string())
                    .unwrap_or_else(|| p.name.clone()),
                position: p.position,
                span: p.span,
                size: self.effective_size(&p.name),
                rect: self.metrics.rect(p.position, p.span),
            })
            .collect();
        GridSnapshot {
            tiles,
            grid_size: self.grid_size(),
            window_size: self.window_size(),
            edit_mode: self.edit_mode,
        }
    }

    /// Enable `name` and place it below everything else.
    pub fn add_plugin(&mut self, name: &str) -> bool {
        if !self.registry.contains(name) || self.placement.get(name).is_some() {
            return false;
        }
        info!("add plugin {}", name);
        if !self.store.state().is_enabled(name) {
            let mut enabled = self.store.enabled().to_vec();
            enabled.push(name.to_string());
            let result = self.store.set_enabled(enabled);
            self.log_store(result);
        }

        let span = self.span_of(name);
        let pos = self.placement.push_below(name, span);
        let result = self.store.set_position(name, pos);
        self.log_store(result);

        self.start_plugin(name);
        self.rebuild();
        true
    }

    /// Disable `name`.  Its stored position is kept.
    pub fn remove_plugin(&mut self, name: &str) -> bool {
        if self.placement.remove(name).is_none() {
            return false;
        }
        info!("remove plugin {}", name);
        let enabled: Vec<String> = self
            .store
            .enabled()
            .iter()
            .filter(|n| n.as_str() != name)
            .cloned()
            .collect();
        let result = self.store.set_enabled(enabled);
        self.log_store(result);
        self.host.stop(name);
        self.rebuild();
        true
    }

    /// Change the size override of `name`, moving it below everything else
    /// if the new span no longer fits where it is.
    pub fn set_size(&mut self, name: &str, size: SizeClass) -> bool {
        if self.placement.get(name).is_none() {
            return false;
        }
        info!("resize {} to {}", name, size);
        let result = self.store.set_size_override(name, size);
        self.log_store(result);

        let span = self.span_of(name);
        if let Some(pos) = self.placement.resize(name, span) {
            debug!("{} relocated to {:?}", name, pos);
            let result = self.store.set_position(name, pos);
            self.log_store(result);
        }
        self.host
            .send(name, PluginRequest::SizeChanged(self.effective_size(name)));
        self.rebuild();
        true
    }

    /// Move `name` one cell in `direction`, with the same rules as a drop.
    pub fn nudge(&mut self, name: &str, direction: Direction) -> DropOutcome {
        let outcome = self.placement.nudge(name, direction);
        debug!("nudge {} {}: {:?}", name, direction, outcome);
        self.commit(name, &outcome);
        outcome
    }

    //  Visibility and mode

    pub fn toggle_visibility(&mut self) {
        self.set_visible(!self.visible);
    }

    pub fn set_visible(&mut self, visible: bool) {
        if self.visible == visible {
            return;
        }
        self.visible = visible;
        if !visible {
            self.cancel_drag();
        }
        self.emit(SurfaceEvent::Visibility(visible));
    }

    /// The window lost keyboard focus.
    pub fn focus_lost(&mut self) {
        self.set_visible(false);
    }

    pub fn toggle_edit_mode(&mut self) {
        self.set_edit_mode(!self.edit_mode);
    }

    pub fn set_edit_mode(&mut self, on: bool) {
        if self.edit_mode == on {
            return;
        }
        info!("edit mode {}", if on { "on" } else { "off" });
        self.edit_mode = on;
        if !on {
            self.cancel_drag();
        }
        self.emit(SurfaceEvent::EditMode(on));
    }

    //  Drag and drop

    /// Pointer pressed at grid pixel `(x, y)`.  Starts a drag when in edit
    /// mode over a plugin.  Returns whether a drag started.
    pub fn press(&mut self, x: f64, y: f64) -> bool {
        if !self.edit_mode {
            return false;
        }
        let Some(placed) = self
            .plugin_at_point(x, y)
            .and_then(|n| self.placement.get(n))
            .cloned()
        else {
            return false;
        };
        debug!("drag start {} at {:?}", placed.name, placed.position);
        self.drag = DragState::Dragging {
            plugin: placed.name,
            original: placed.position,
            span: placed.span,
            target: (placed.position.row as i64, placed.position.col as i64),
        };
        true
    }

    /// Pointer moved to `(x, y)` during a drag.  Updates the drop highlight.
    pub fn motion(&mut self, x: f64, y: f64) {
        let cell = self.metrics.cell_at(x, y);
        let DragState::Dragging {
            plugin,
            span,
            target,
            ..
        } = &mut self.drag
        else {
            return;
        };
        if *target == cell {
            return;
        }
        *target = cell;
        let outcome = self.placement.resolve_drop(plugin, cell.0, cell.1);
        let highlight = match outcome {
            DropOutcome::Rejected => None,
            _ => Some(self.metrics.rect(
                GridPosition::new(cell.0 as usize, cell.1 as usize),
                *span,
            )),
        };
        self.emit(SurfaceEvent::Highlight(highlight));
    }

    /// Pointer released at `(x, y)`.  Resolves the drop against the target
    /// cell and commits it.  Returns the outcome, or `None` without a drag.
    pub fn release(&mut self, x: f64, y: f64) -> Option<DropOutcome> {
        self.motion(x, y);
        let DragState::Dragging {
            plugin,
            original,
            target,
            ..
        } = std::mem::replace(&mut self.drag, DragState::Idle)
        else {
            return None;
        };
        self.emit(SurfaceEvent::Highlight(None));
        let outcome = self.placement.resolve_drop(&plugin, target.0, target.1);
        debug!(
            "drop {} from {:?} at {:?}: {:?}",
            plugin, original, target, outcome
        );
        self.commit(&plugin, &outcome);
        Some(outcome)
    }

    /// Abandon the current drag without changing anything.
    pub fn cancel_drag(&mut self) {
        if self.drag != DragState::Idle {
            self.drag = DragState::Idle;
            self.emit(SurfaceEvent::Highlight(None));
        }
    }

    //  Context menu

    /// Entries for a right click at grid pixel `(x, y)`.  Empty outside of
    /// edit mode.
    pub fn context_menu(&self, x: f64, y: f64) -> Vec<MenuItem> {
        if !self.edit_mode {
            return Vec::new();
        }
        match self.plugin_at_point(x, y) {
            Some(name) => self.plugin_menu(name),
            None => self.empty_space_menu(),
        }
    }

    fn plugin_menu(&self, name: &str) -> Vec<MenuItem> {
        let title = self
            .registry
            .descriptor(name)
            .map(|d| d.title)
            .unwrap_or(name);
        let sizes = SizeClass::ALL
            .iter()
            .map(|&s| MenuItem::action(s.as_str(), MenuAction::Resize(name.to_string(), s)))
            .collect();
        let moves = Direction::ALL
            .iter()
            .map(|&d| MenuItem::action(d.label(), MenuAction::Nudge(name.to_string(), d)))
            .collect();
        vec![
            MenuItem::action(
                format!("Remove {}", title),
                MenuAction::Remove(name.to_string()),
            ),
            MenuItem::Submenu {
                label: "Size".into(),
                items: sizes,
            },
            MenuItem::Submenu {
                label: "Move".into(),
                items: moves,
            },
        ]
    }

    fn empty_space_menu(&self) -> Vec<MenuItem> {
        let items: Vec<MenuItem> = self
            .registry
            .list_available()
            .filter(|d| self.placement.get(d.name).is_none())
            .map(|d| MenuItem::action(d.title, MenuAction::Add(d.name.to_string())))
            .collect();
        if items.is_empty() {
            return Vec::new();
        }
        vec![MenuItem::Submenu {
            label: "Add plugin".into(),
            items,
        }]
    }

    pub fn perform(&mut self, action: MenuAction) {
        match action {
            MenuAction::Add(name) => {
                self.add_plugin(&name);
            }
            MenuAction::Remove(name) => {
                self.remove_plugin(&name);
            }
            MenuAction::Resize(name, size) => {
                self.set_size(&name, size);
            }
            MenuAction::Nudge(name, dir) => {
                self.nudge(&name, dir);
            }
        }
    }

    //  Plugin interaction

    /// Forward a user gesture to a plugin.  Ignored in edit mode, where
    /// pointer input belongs to the layout.
    pub fn interact(&mut self, name: &str, request: PluginRequest) {
        if self.edit_mode {
            return;
        }
        if !self.host.send(name, request) {
            debug!("no running plugin {}", name);
        }
    }

    pub fn power(&self, action: PowerAction) {
        info!("power action: {}", action.label());
        if let Err(e) = action.run(self.host.runner().as_ref()) {
            warn!("{} failed: {}", action.label(), e);
        }
    }

    /// Stop all plugin workers and wait for them.
    pub fn shutdown(&mut self) {
        self.host.shutdown();
    }

    //  Internal

    fn span_of(&self, name: &str) -> Span {
        self.registry
            .resolve_span(name, self.store.size_override(name))
    }

    fn effective_size(&self, name: &str) -> SizeClass {
        self.registry
            .effective_size(name, self.store.size_override(name))
    }

    fn start_plugin(&mut self, name: &str) {
        match self.registry.instantiate(name) {
            Some(plugin) => {
                let size = self.effective_size(name);
                self.host.start(name, plugin, size);
            }
            None => warn!("unknown plugin {}", name),
        }
    }

    fn commit(&mut self, name: &str, outcome: &DropOutcome) {
        if !outcome.is_change() {
            return;
        }
        let updates = self.placement.apply(name, outcome);
        let result = self
            .store
            .set_positions(updates.iter().map(|(n, p)| (n.as_str(), *p)));
        self.log_store(result);
        self.rebuild();
    }

    fn rebuild(&self) {
        self.emit(SurfaceEvent::Rebuild(self.snapshot()));
    }

    fn emit(&self, event: SurfaceEvent) {
        let _ = self.events.send(event);
    }

    fn log_store(&self, result: Result<(), StoreError>) {
        if let Err(e) = result {
            warn!("failed to save layout: {}", e);
        }
    }
}

//  Tests
