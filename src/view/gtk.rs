//! GTK4 + layer-shell front-end that runs on the **main thread**.
//!
//! # Widget tree
//!
//! ```text
//! window                         (layer-shell, top right)
//! └ .control-surface           (vertical box)
//!     ├ .toolbar               (edit toggle)
//!     ├ gtk4::Overlay
//!     │   ├ .grid              (GtkFixed, tiles at pixel positions)
//!     │   │   └ .plugin-tile   (icon, label, optional slider)
//!     │   └ .drop-highlight    (overlay child, shown while dragging)
//!     └ .power-row             (lock, log out, restart, shut down)
//! ```
//!
//! # CSS selectors
//!
//! | Selector                   | Targets                               |
//! |----------------------------|---------------------------------------|
//! | `.control-surface`         | Window content                        |
//! | `.control-surface.editing` | Same, while edit mode is on           |
//! | `.plugin-tile`             | Every plugin                          |
//! | `.drop-highlight`          | Drop target while dragging            |
//! | `.power-row button`        | Session buttons                       |

use crate::command::Command;
use crate::host::PluginRequest;
use crate::surface::{ControlSurface, GridSnapshot, MenuItem};
use crate::system::PowerAction;
use crate::traits::{PluginView, SurfaceEvent};
use gtk4::prelude::*;
use gtk4::{gdk, glib};
use gtk4_layer_shell::LayerShell;
use log::{debug, info, warn};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::mpsc;
use std::time::Duration;

//  Default CSS

const DEFAULT_CSS: &str = r#"
.control-surface {
    background-color: rgba(30, 30, 30, 0.92);
    border-radius: 12px;
    padding: 2px;
    color: white;
}

.control-surface.editing .plugin-tile {
    border: 1px dashed rgba(255, 255, 255, 0.4);
}

.plugin-tile {
    background-color: rgba(60, 60, 60, 0.7);
    border-radius: 10px;
}

.plugin-tile:hover {
    background-color: rgba(80, 80, 80, 0.8);
}

.drop-highlight {
    background-color: rgba(100, 160, 255, 0.35);
    border: 2px solid rgba(100, 160, 255, 0.9);
    border-radius: 10px;
}

.toolbar, .power-row {
    padding: 4px;
}
"#;

const PRIMARY_BUTTON: u32 = 1;
const SECONDARY_BUTTON: u32 = 3;

type Shared = Rc<RefCell<ControlSurface>>;

//  Tiles

struct TileWidgets {
    root: gtk4::Box,
    image: gtk4::Image,
    label: gtk4::Label,
    scale: gtk4::Scale,
}

impl TileWidgets {
    fn new(name: &str, surface: &Shared) -> Self {
        let root = gtk4::Box::new(gtk4::Orientation::Vertical, 2);
        root.add_css_class("plugin-tile");
        root.set_valign(gtk4::Align::Fill);

        let image = gtk4::Image::new();
        image.set_pixel_size(32);
        image.set_vexpand(true);
        image.set_valign(gtk4::Align::End);

        let label = gtk4::Label::new(None);
        label.set_justify(gtk4::Justification::Center);
        label.set_wrap(true);

        let scale = gtk4::Scale::with_range(gtk4::Orientation::Horizontal, 0.0, 100.0, 1.0);
        scale.set_draw_value(false);
        scale.set_margin_start(6);
        scale.set_margin_end(6);
        {
            let surface = Rc::clone(surface);
            let name = name.to_string();
            scale.connect_change_value(move |_, _, value| {
                if let Ok(mut s) = surface.try_borrow_mut() {
                    s.interact(&name, PluginRequest::SetLevel(value.clamp(0.0, 100.0) as u8));
                }
                glib::Propagation::Proceed
            });
        }

        root.append(&image);
        root.append(&label);
        root.append(&scale);
        Self {
            root,
            image,
            label,
            scale,
        }
    }

    fn apply(&self, view: &PluginView) {
        self.image.set_visible(!view.icon.is_empty());
        self.image.set_icon_name(Some(view.icon.as_str()));
        match &view.text {
            Some(text) => {
                self.label.set_text(text);
                self.label.set_visible(true);
            }
            None => self.label.set_visible(false),
        }
        match view.level {
            Some(level) => {
                self.scale.set_value(f64::from(level));
                self.scale.set_visible(true);
            }
            None => self.scale.set_visible(false),
        }
    }
}

//  Window state owned by the main loop

struct Ui {
    window: gtk4::Window,
    container: gtk4::Box,
    fixed: gtk4::Fixed,
    highlight: gtk4::Box,
    edit_button: gtk4::ToggleButton,
    tiles: HashMap<String, TileWidgets>,
    /// Last view per plugin, reapplied after a rebuild.
    views: HashMap<String, PluginView>,
    surface: Shared,
}

impl Ui {
    fn rebuild(&mut self, snap: &GridSnapshot) {
        for (_, tile) in self.tiles.drain() {
            self.fixed.remove(&tile.root);
        }
        for t in &snap.tiles {
            let tile = TileWidgets::new(&t.name, &self.surface);
            tile.root.set_size_request(t.rect.width, t.rect.height);
            tile.root.set_tooltip_text(Some(t.title.as_str()));
            tile.scale.set_can_target(!snap.edit_mode);
            if let Some(view) = self.views.get(&t.name) {
                tile.apply(view);
            }
            self.fixed
                .put(&tile.root, f64::from(t.rect.x), f64::from(t.rect.y));
            self.tiles.insert(t.name.clone(), tile);
        }
        let (gw, gh) = snap.grid_size;
        self.fixed.set_size_request(gw, gh);
        let (ww, wh) = snap.window_size;
        self.window.set_default_size(ww, wh);
        debug!("rebuilt {} tiles, window {}x{}", snap.tiles.len(), ww, wh);
    }

    fn apply(&mut self, event: SurfaceEvent) {
        match event {
            SurfaceEvent::Rebuild(snap) => self.rebuild(&snap),
            SurfaceEvent::Highlight(Some(rect)) => {
                self.highlight.set_margin_start(rect.x);
                self.highlight.set_margin_top(rect.y);
                self.highlight.set_size_request(rect.width, rect.height);
                self.highlight.set_visible(true);
            }
            SurfaceEvent::Highlight(None) => self.highlight.set_visible(false),
            SurfaceEvent::Visibility(visible) => {
                self.window.set_visible(visible);
                if visible {
                    self.window.present();
                }
            }
            SurfaceEvent::EditMode(on) => {
                if on {
                    self.container.add_css_class("editing");
                } else {
                    self.container.remove_css_class("editing");
                }
                self.edit_button.set_active(on);
                for tile in self.tiles.values() {
                    tile.scale.set_can_target(!on);
                }
            }
            SurfaceEvent::PluginView { name, view } => {
                if let Some(tile) = self.tiles.get(&name) {
                    tile.apply(&view);
                }
                self.views.insert(name, view);
            }
        }
    }
}

//  Public API

/// Run the GTK4 main loop on the **current** (main) thread.
pub fn run_main_loop(
    surface: ControlSurface,
    events: mpsc::Receiver<SurfaceEvent>,
    cmd_rx: mpsc::Receiver<Command>,
    css_path: Option<PathBuf>,
) {
    if let Err(e) = gtk4::init() {
        log::error!("failed to initialise GTK4: {}", e);
        return;
    }
    info!("GTK4 initialised on main thread");

    load_css(&css_path);

    let surface: Shared = Rc::new(RefCell::new(surface));

    //  Layer-shell window
    let window = gtk4::Window::new();
    window.init_layer_shell();
    window.set_layer(gtk4_layer_shell::Layer::Top);
    window.set_namespace("ywidgets");
    window.set_anchor(gtk4_layer_shell::Edge::Top, true);
    window.set_anchor(gtk4_layer_shell::Edge::Right, true);
    window.set_margin(gtk4_layer_shell::Edge::Top, 8);
    window.set_margin(gtk4_layer_shell::Edge::Right, 8);
    window.set_keyboard_mode(gtk4_layer_shell::KeyboardMode::OnDemand);
    window.set_decorated(false);
    window.set_resizable(false);

    let container = gtk4::Box::new(gtk4::Orientation::Vertical, 4);
    container.add_css_class("control-surface");
    window.set_child(Some(&container));

    //  Toolbar
    let toolbar = gtk4::Box::new(gtk4::Orientation::Horizontal, 4);
    toolbar.add_css_class("toolbar");
    let edit_button = gtk4::ToggleButton::with_label("Edit");
    edit_button.set_halign(gtk4::Align::End);
    edit_button.set_hexpand(true);
    {
        let surface = Rc::clone(&surface);
        edit_button.connect_toggled(move |b| {
            if let Ok(mut s) = surface.try_borrow_mut() {
                s.set_edit_mode(b.is_active());
            }
        });
    }
    toolbar.append(&edit_button);
    container.append(&toolbar);

    //  Grid area
    let overlay = gtk4::Overlay::new();
    let fixed = gtk4::Fixed::new();
    fixed.add_css_class("grid");
    overlay.set_child(Some(&fixed));

    let highlight = gtk4::Box::new(gtk4::Orientation::Vertical, 0);
    highlight.add_css_class("drop-highlight");
    highlight.set_halign(gtk4::Align::Start);
    highlight.set_valign(gtk4::Align::Start);
    highlight.set_can_target(false);
    highlight.set_visible(false);
    overlay.add_overlay(&highlight);
    overlay.set_measure_overlay(&highlight, false);
    container.append(&overlay);

    attach_pointer_controllers(&overlay, &surface);

    //  Power row
    let power_row = gtk4::Box::new(gtk4::Orientation::Horizontal, 4);
    power_row.add_css_class("power-row");
    power_row.set_homogeneous(true);
    for action in PowerAction::ALL {
        let button = gtk4::Button::from_icon_name(action.icon());
        button.set_tooltip_text(Some(action.label()));
        let surface = Rc::clone(&surface);
        button.connect_clicked(move |_| {
            if let Ok(s) = surface.try_borrow() {
                s.power(action);
            }
        });
        power_row.append(&button);
    }
    container.append(&power_row);

    //  Hide when focus leaves the window
    {
        let surface = Rc::clone(&surface);
        window.connect_is_active_notify(move |w| {
            if !w.is_active() {
                if let Ok(mut s) = surface.try_borrow_mut() {
                    s.focus_lost();
                }
            }
        });
    }

    let mut ui = Ui {
        window: window.clone(),
        container,
        fixed,
        highlight,
        edit_button,
        tiles: HashMap::new(),
        views: HashMap::new(),
        surface: Rc::clone(&surface),
    };

    // Map the surface once so later shows are instant, then start hidden.
    if let Ok(s) = surface.try_borrow() {
        ui.rebuild(&s.snapshot());
    }
    window.present();
    window.set_visible(false);
    info!("window mapped (hidden)");

    //  Main event loop
    glib::timeout_add_local(Duration::from_millis(16), move || {
        // 1. Drain commands.
        let mut disconnected = false;
        loop {
            match cmd_rx.try_recv() {
                Ok(cmd) => {
                    debug!("command: {:?}", cmd);
                    if let Ok(mut s) = ui.surface.try_borrow_mut() {
                        s.handle(cmd);
                    }
                }
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => {
                    disconnected = true;
                    break;
                }
            }
        }

        // 2. Drain surface events.
        while let Ok(event) = events.try_recv() {
            ui.apply(event);
        }

        if disconnected {
            info!("command source closed, exiting");
            if let Ok(mut s) = ui.surface.try_borrow_mut() {
                s.shutdown();
            }
            return glib::ControlFlow::Break;
        }
        glib::ControlFlow::Continue
    });

    info!("entering GLib main loop");
    let main_loop = glib::MainLoop::new(None, false);
    main_loop.run();
    info!("GLib main loop exited");
}

//  Pointer input

fn attach_pointer_controllers(area: &gtk4::Overlay, surface: &Shared) {
    let pointer = Rc::new(Cell::new((0.0_f64, 0.0_f64)));

    let click = gtk4::GestureClick::new();
    click.set_button(0);
    {
        let surface = Rc::clone(surface);
        let area = area.clone();
        click.connect_pressed(move |gesture, _, x, y| {
            let button = gesture.current_button();
            let Ok(mut s) = surface.try_borrow_mut() else {
                return;
            };
            if button == SECONDARY_BUTTON {
                if s.is_edit_mode() {
                    let items = s.context_menu(x, y);
                    drop(s);
                    if !items.is_empty() {
                        show_menu(&area, &items, x, y, &surface);
                    }
                } else if let Some(name) = s.plugin_at_point(x, y).map(str::to_string) {
                    s.interact(&name, PluginRequest::Secondary);
                }
            } else if button == PRIMARY_BUTTON {
                if s.is_edit_mode() {
                    s.press(x, y);
                } else if let Some(name) = s.plugin_at_point(x, y).map(str::to_string) {
                    s.interact(&name, PluginRequest::Activate);
                }
            }
        });
    }
    {
        let surface = Rc::clone(surface);
        click.connect_released(move |gesture, _, x, y| {
            if gesture.current_button() != PRIMARY_BUTTON {
                return;
            }
            if let Ok(mut s) = surface.try_borrow_mut() {
                s.release(x, y);
            }
        });
    }
    area.add_controller(click);

    let motion = gtk4::EventControllerMotion::new();
    {
        let surface = Rc::clone(surface);
        let pointer = Rc::clone(&pointer);
        motion.connect_motion(move |_, x, y| {
            pointer.set((x, y));
            if let Ok(mut s) = surface.try_borrow_mut() {
                if s.dragging().is_some() {
                    s.motion(x, y);
                }
            }
        });
    }
    area.add_controller(motion);

    let scroll = gtk4::EventControllerScroll::new(gtk4::EventControllerScrollFlags::VERTICAL);
    {
        let surface = Rc::clone(surface);
        scroll.connect_scroll(move |_, _, dy| {
            let (x, y) = pointer.get();
            if let Ok(mut s) = surface.try_borrow_mut() {
                if let Some(name) = s.plugin_at_point(x, y).map(str::to_string) {
                    // Scrolling up is negative dy.
                    let steps = if dy < 0.0 { 1 } else { -1 };
                    s.interact(&name, PluginRequest::Scroll(steps));
                    return glib::Propagation::Stop;
                }
            }
            glib::Propagation::Proceed
        });
    }
    area.add_controller(scroll);
}

//  Context menu

fn show_menu(parent: &gtk4::Overlay, items: &[MenuItem], x: f64, y: f64, surface: &Shared) {
    let popover = gtk4::Popover::new();
    let content = gtk4::Box::new(gtk4::Orientation::Vertical, 0);
    append_items(&content, items, &popover, surface);
    popover.set_child(Some(&content));
    popover.set_parent(parent);
    popover.set_pointing_to(Some(&gdk::Rectangle::new(x as i32, y as i32, 1, 1)));
    popover.connect_closed(|p| {
        let p = p.clone();
        glib::idle_add_local_once(move || p.unparent());
    });
    popover.popup();
}

fn append_items(container: &gtk4::Box, items: &[MenuItem], popover: &gtk4::Popover, surface: &Shared) {
    for item in items {
        match item {
            MenuItem::Action { label, action } => {
                let button = gtk4::Button::with_label(label);
                button.add_css_class("flat");
                let action = action.clone();
                let popover = popover.clone();
                let surface = Rc::clone(surface);
                button.connect_clicked(move |_| {
                    if let Ok(mut s) = surface.try_borrow_mut() {
                        s.perform(action.clone());
                    }
                    popover.popdown();
                });
                container.append(&button);
            }
            MenuItem::Submenu { label, items } => {
                let expander = gtk4::Expander::new(Some(label.as_str()));
                let inner = gtk4::Box::new(gtk4::Orientation::Vertical, 0);
                inner.set_margin_start(8);
                append_items(&inner, items, popover, surface);
                expander.set_child(Some(&inner));
                container.append(&expander);
            }
        }
    }
}

//  CSS loading

fn load_css(css_path: &Option<PathBuf>) {
    let provider = gtk4::CssProvider::new();

    let css_content = match css_path.as_ref().filter(|p| p.exists()) {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(content) => {
                info!("user CSS: {} ({} bytes)", p.display(), content.len());
                content
            }
            Err(e) => {
                warn!("CSS read failed ({}): {}, using built-in", p.display(), e);
                DEFAULT_CSS.to_string()
            }
        },
        None => {
            debug!("no user CSS, using built-in default");
            DEFAULT_CSS.to_string()
        }
    };

    #[allow(deprecated)]
    provider.load_from_data(&css_content);

    match gdk::Display::default() {
        Some(display) => gtk4::style_context_add_provider_for_display(
            &display,
            &provider,
            gtk4::STYLE_PROVIDER_PRIORITY_APPLICATION,
        ),
        None => warn!("no GDK display, CSS will not be applied"),
    }
}
