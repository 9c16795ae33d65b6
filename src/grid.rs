//! Grid layout engine.
//!
//! Plugins occupy axis-aligned rectangles on a sparse grid.  Each rectangle
//! is anchored at its top-left cell ([`GridPosition`]) and extends
//! `span.rows × span.cols` cells.  The grid has no fixed size: its bounds
//! are recomputed from whatever is placed on it.
//!
//! [`Placement`] is the in-memory set the engine works on.  It never reads
//! or writes persistence; callers build it with [`arrange`] from the stored
//! layout and write back whatever [`Placement::apply`] reports as changed.
//!
//! The one invariant every committed operation keeps: no two placed
//! rectangles overlap.
//!
//! Anchors are bounded by [`MAX_ANCHOR`] on both axes.  Stored anchors past
//! it are treated as missing and reassigned, so pixel geometry always
//! stays within `i32`.

use crate::command::Direction;
use crate::config::LayoutState;
use crate::size::Span;
use log::debug;
use serde::{Deserialize, Serialize};

/// Largest row or column an anchor may use.
pub const MAX_ANCHOR: usize = 4096;

/// Top-left anchor cell of a plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridPosition {
    pub row: usize,
    pub col: usize,
}

impl GridPosition {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Whether both axes are within [`MAX_ANCHOR`].
    pub fn in_bounds(self) -> bool {
        self.row <= MAX_ANCHOR && self.col <= MAX_ANCHOR
    }
}

/// A plugin resolved onto the grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedPlugin {
    pub name: String,
    pub position: GridPosition,
    pub span: Span,
}

impl PlacedPlugin {
    pub fn new(name: impl Into<String>, position: GridPosition, span: Span) -> Self {
        Self {
            name: name.into(),
            position,
            span,
        }
    }

    /// Whether cell `(row, col)` lies inside this plugin's rectangle.
    pub fn contains(&self, row: usize, col: usize) -> bool {
        let p = self.position;
        (p.row..p.row.saturating_add(self.span.rows)).contains(&row)
            && (p.col..p.col.saturating_add(self.span.cols)).contains(&col)
    }

    /// Axis-aligned overlap with the rectangle at `pos` of size `span`.
    /// Upper bounds are exclusive.
    pub fn intersects(&self, pos: GridPosition, span: Span) -> bool {
        let p = self.position;
        p.row < pos.row.saturating_add(span.rows)
            && pos.row < p.row.saturating_add(self.span.rows)
            && p.col < pos.col.saturating_add(span.cols)
            && pos.col < p.col.saturating_add(self.span.cols)
    }

    /// Last occupied row (inclusive).
    pub fn last_row(&self) -> usize {
        self.position.row.saturating_add(self.span.rows.max(1) - 1)
    }

    /// Last occupied column (inclusive).
    pub fn last_col(&self) -> usize {
        self.position.col.saturating_add(self.span.cols.max(1) - 1)
    }
}

/// Result of resolving a drop or a directional nudge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    /// Out of bounds or the target area is occupied.  Nothing changes.
    Rejected,
    /// The target equals the current anchor.  Nothing to persist.
    NoChange,
    /// The dragged plugin moves to `to`; nobody else moves.
    Move { to: GridPosition },
    /// The dragged plugin takes `to` and `other` takes `other_to`, the
    /// dragged plugin's original anchor.
    Swap {
        other: String,
        to: GridPosition,
        other_to: GridPosition,
    },
}

impl DropOutcome {
    /// Whether the outcome should be committed.
    pub fn is_change(&self) -> bool {
        matches!(self, DropOutcome::Move { .. } | DropOutcome::Swap { .. })
    }
}

/// The set of placed plugins the engine operates on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Placement {
    plugins: Vec<PlacedPlugin>,
}

impl Placement {
    pub fn new(plugins: Vec<PlacedPlugin>) -> Self {
        Self { plugins }
    }

    //  Accessors

    pub fn plugins(&self) -> &[PlacedPlugin] {
        &self.plugins
    }

    pub fn get(&self, name: &str) -> Option<&PlacedPlugin> {
        self.plugins.iter().find(|p| p.name == name)
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// `(max_row, max_col)`: the largest inclusive row and column any plugin
    /// reaches, or `(0, 0)` when nothing is placed.
    pub fn bounds(&self) -> (usize, usize) {
        self.plugins.iter().fold((0, 0), |(r, c), p| {
            (r.max(p.last_row()), c.max(p.last_col()))
        })
    }

    /// Name of the plugin whose rectangle contains `(row, col)`.
    pub fn plugin_at(&self, row: usize, col: usize) -> Option<&str> {
        self.plugins
            .iter()
            .find(|p| p.contains(row, col))
            .map(|p| p.name.as_str())
    }

    /// Whether a rectangle at `(row, col)` of size `span` touches no plugin
    /// other than `exclude`.
    pub fn is_area_free(&self, row: usize, col: usize, span: Span, exclude: Option<&str>) -> bool {
        let excluded: Vec<&str> = exclude.into_iter().collect();
        self.fits(GridPosition::new(row, col), span, &excluded)
    }

    /// Row where a newly added plugin goes, or `0` on an empty grid.
    ///
    /// Two rows below the lowest anchor, pushed further down if a tall
    /// plugin still reaches that row.
    pub fn find_next_free_row(&self) -> usize {
        self.plugins
            .iter()
            .map(|p| {
                p.position
                    .row
                    .saturating_add(2)
                    .max(p.position.row.saturating_add(p.span.rows))
            })
            .max()
            .unwrap_or(0)
    }

    /// Whether any two placed rectangles overlap.
    pub fn has_overlap(&self) -> bool {
        self.plugins.iter().enumerate().any(|(i, a)| {
            self.plugins[i + 1..]
                .iter()
                .any(|b| a.intersects(b.position, b.span))
        })
    }

    //  Drop resolution

    /// Decide what dropping `name` with its anchor at `(target_row,
    /// target_col)` does.
    ///
    /// Landing exactly on another plugin's anchor swaps the two, provided
    /// both rectangles fit at their new anchors.  Any other target must be
    /// free of every plugin but the dragged one.
    pub fn resolve_drop(&self, name: &str, target_row: i64, target_col: i64) -> DropOutcome {
        let Some(dragged) = self.get(name) else {
            return DropOutcome::Rejected;
        };
        let (Ok(row), Ok(col)) = (usize::try_from(target_row), usize::try_from(target_col)) else {
            return DropOutcome::Rejected;
        };
        let to = GridPosition::new(row, col);
        if to == dragged.position {
            return DropOutcome::NoChange;
        }
        if !to.in_bounds() {
            return DropOutcome::Rejected;
        }

        let anchored = self
            .plugins
            .iter()
            .find(|p| p.name != name && p.position == to);

        match anchored {
            None => {
                if self.fits(to, dragged.span, &[name]) {
                    DropOutcome::Move { to }
                } else {
                    DropOutcome::Rejected
                }
            }
            Some(other) => {
                let other_to = dragged.position;
                let both = [name, other.name.as_str()];
                let dragged_after = PlacedPlugin::new(name, to, dragged.span);
                let fits = self.fits(to, dragged.span, &both)
                    && self.fits(other_to, other.span, &both)
                    && !dragged_after.intersects(other_to, other.span);
                if fits {
                    DropOutcome::Swap {
                        other: other.name.clone(),
                        to,
                        other_to,
                    }
                } else {
                    DropOutcome::Rejected
                }
            }
        }
    }

    /// Nudge `name` one cell in `direction`.  Uses the same rules as
    /// [`resolve_drop`](Self::resolve_drop), including the full-span
    /// free-area check.
    pub fn nudge(&self, name: &str, direction: Direction) -> DropOutcome {
        let Some(p) = self.get(name) else {
            return DropOutcome::Rejected;
        };
        let (d_row, d_col) = direction.delta();
        self.resolve_drop(
            name,
            p.position.row as i64 + d_row,
            p.position.col as i64 + d_col,
        )
    }

    /// Commit `outcome` for `name`.  Returns the positions that changed, for
    /// the caller to persist.
    pub fn apply(&mut self, name: &str, outcome: &DropOutcome) -> Vec<(String, GridPosition)> {
        let updates = match outcome {
            DropOutcome::Rejected | DropOutcome::NoChange => return Vec::new(),
            DropOutcome::Move { to } => vec![(name.to_string(), *to)],
            DropOutcome::Swap {
                other,
                to,
                other_to,
            } => vec![(name.to_string(), *to), (other.clone(), *other_to)],
        };
        for (n, pos) in &updates {
            if let Some(p) = self.plugins.iter_mut().find(|p| &p.name == n) {
                p.position = *pos;
            }
        }
        debug!("applied {:?} for {}", outcome, name);
        updates
    }

    /// Place a new plugin at `(find_next_free_row, 0)`.  Returns its anchor.
    pub fn push_below(&mut self, name: impl Into<String>, span: Span) -> GridPosition {
        let pos = GridPosition::new(self.find_next_free_row(), 0);
        self.plugins.push(PlacedPlugin::new(name, pos, span));
        pos
    }

    /// Change the span of `name`.  If the new rectangle no longer fits at the
    /// current anchor the plugin moves below everything else; the new anchor
    /// is returned in that case.
    pub fn resize(&mut self, name: &str, span: Span) -> Option<GridPosition> {
        let idx = self.plugins.iter().position(|p| p.name == name)?;
        let anchor = self.plugins[idx].position;
        let mut plugin = self.plugins.remove(idx);
        plugin.span = span;
        let relocated = if self.fits(anchor, span, &[]) {
            None
        } else {
            plugin.position = GridPosition::new(self.find_next_free_row(), 0);
            Some(plugin.position)
        };
        self.plugins.insert(idx, plugin);
        relocated
    }

    pub fn remove(&mut self, name: &str) -> Option<PlacedPlugin> {
        let idx = self.plugins.iter().position(|p| p.name == name)?;
        Some(self.plugins.remove(idx))
    }

    //  Internal

    fn fits(&self, pos: GridPosition, span: Span, exclude: &[&str]) -> bool {
        !self
            .plugins
            .iter()
            .filter(|p| !exclude.contains(&p.name.as_str()))
            .any(|p| p.intersects(pos, span))
    }
}

/// A placement built from the stored layout, plus the anchors that had to be
/// assigned on the way.
#[derive(Debug, Clone, Default)]
pub struct Arrangement {
    pub placement: Placement,
    /// Plugins that had no usable stored position.  Persist these.
    pub assigned: Vec<(String, GridPosition)>,
}

/// Build a [`Placement`] from the stored layout.
///
/// `span_for` resolves a plugin's effective span and returns `None` for
/// plugins that are not installed; those are skipped.  Enabled plugins with
/// no stored position, an anchor past [`MAX_ANCHOR`], or a stored rectangle
/// that overlaps one placed earlier, are given `(find_next_free_row, 0)` after all valid stored
/// positions are in place.
pub fn arrange(state: &LayoutState, span_for: impl Fn(&str) -> Option<Span>) -> Arrangement {
    let mut placement = Placement::default();
    let mut deferred = Vec::new();

    for name in &state.enabled {
        if placement.get(name).is_some() || deferred.iter().any(|(n, _)| n == name) {
            continue;
        }
        let Some(span) = span_for(name) else {
            debug!("skipping unknown plugin {}", name);
            continue;
        };
        match state.positions.get(name) {
            Some(&pos) if pos.in_bounds() && placement.fits(pos, span, &[]) => {
                placement.plugins.push(PlacedPlugin::new(name.clone(), pos, span));
            }
            _ => deferred.push((name.clone(), span)),
        }
    }

    let assigned = deferred
        .into_iter()
        .map(|(name, span)| {
            let pos = placement.push_below(name.clone(), span);
            (name, pos)
        })
        .collect();

    Arrangement {
        placement,
        assigned,
    }
}

//  Pixel metrics

/// A rectangle in pixels, relative to the grid's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// Cell size and gap, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellMetrics {
    pub cell_size: i32,
    pub spacing: i32,
}

impl Default for CellMetrics {
    fn default() -> Self {
        Self {
            cell_size: 48,
            spacing: 2,
        }
    }
}

/// Saturating conversion for cell counts and pixel metrics.
fn to_i32<T: TryInto<i32>>(value: T) -> i32 {
    value.try_into().unwrap_or(i32::MAX)
}

impl CellMetrics {
    pub fn new(cell_size: u32, spacing: u32) -> Self {
        Self {
            cell_size: to_i32(cell_size.max(1)),
            spacing: to_i32(spacing),
        }
    }

    fn pitch(&self) -> i32 {
        self.cell_size.saturating_add(self.spacing)
    }

    /// Pixel length of `cells` cells with `cells - 1` gaps between them.
    fn extent(&self, cells: i32) -> i32 {
        cells
            .saturating_mul(self.cell_size)
            .saturating_add((cells - 1).max(0).saturating_mul(self.spacing))
    }

    /// Cell under a pointer position, as `(row, col)`, clamped at zero.
    pub fn cell_at(&self, x: f64, y: f64) -> (i64, i64) {
        let pitch = self.pitch() as f64;
        let col = (x / pitch).floor().max(0.0) as i64;
        let row = (y / pitch).floor().max(0.0) as i64;
        (row, col)
    }

    /// Pixel rectangle covered by a rectangle of cells.
    pub fn rect(&self, pos: GridPosition, span: Span) -> PixelRect {
        PixelRect {
            x: to_i32(pos.col).saturating_mul(self.pitch()),
            y: to_i32(pos.row).saturating_mul(self.pitch()),
            width: self.extent(to_i32(span.cols)),
            height: self.extent(to_i32(span.rows)),
        }
    }

    /// `(width, height)` of a grid whose last cell is `(max_row, max_col)`.
    pub fn grid_size(&self, (max_row, max_col): (usize, usize)) -> (i32, i32) {
        (
            self.extent(to_i32(max_col).saturating_add(1)),
            self.extent(to_i32(max_row).saturating_add(1)),
        )
    }
}

//  Tests
