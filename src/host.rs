//! Runs each plugin on its own worker thread.
//!
//! The surface talks to a worker through an [`mpsc`] request channel; the
//! worker answers every handled request with a fresh
//! [`SurfaceEvent::PluginView`] on the shared event channel.  Periodic
//! refreshes use `recv_timeout` against the plugin's poll interval, so a
//! slow external command only ever stalls its own tile.
//!
//! Dropping the request sender (via [`PluginHost::stop`]) ends the worker
//! after its current request.

use crate::size::SizeClass;
use crate::traits::{CommandRunner, Plugin, SurfaceEvent};
use log::{debug, warn};
use std::collections::HashMap;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

/// Something for a plugin worker to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginRequest {
    Refresh,
    Activate,
    Secondary,
    Scroll(i32),
    SetLevel(u8),
    SizeChanged(SizeClass),
}

struct Worker {
    requests: mpsc::Sender<PluginRequest>,
    handle: JoinHandle<()>,
}

/// Owner of all plugin worker threads.
pub struct PluginHost {
    runner: Arc<dyn CommandRunner>,
    events: mpsc::Sender<SurfaceEvent>,
    workers: HashMap<String, Worker>,
}

impl PluginHost {
    pub fn new(runner: Arc<dyn CommandRunner>, events: mpsc::Sender<SurfaceEvent>) -> Self {
        Self {
            runner,
            events,
            workers: HashMap::new(),
        }
    }

    pub fn runner(&self) -> &Arc<dyn CommandRunner> {
        &self.runner
    }

    pub fn is_running(&self, name: &str) -> bool {
        self.workers.contains_key(name)
    }

    /// Start `plugin` at `size`.  A worker already running under `name` is
    /// stopped first.
    pub fn start(&mut self, name: &str, plugin: Box<dyn Plugin>, size: SizeClass) {
        self.stop(name);
        let (tx, rx) = mpsc::channel();
        let runner = Arc::clone(&self.runner);
        let events = self.events.clone();
        let worker_name = name.to_string();
        let spawned = std::thread::Builder::new()
            .name(format!("plugin-{}", name.to_lowercase()))
            .spawn(move || run_worker(worker_name, plugin, size, runner, rx, events));
        match spawned {
            Ok(handle) => {
                debug!("started plugin {}", name);
                self.workers.insert(
                    name.to_string(),
                    Worker {
                        requests: tx,
                        handle,
                    },
                );
            }
            Err(e) => warn!("failed to start plugin {}: {}", name, e),
        }
    }

    /// Stop the worker for `name`.  Does not wait for it to exit.
    pub fn stop(&mut self, name: &str) {
        if self.workers.remove(name).is_some() {
            debug!("stopped plugin {}", name);
        }
    }

    /// Queue `request` for `name`.  Returns `false` if no such worker is
    /// alive.
    pub fn send(&self, name: &str, request: PluginRequest) -> bool {
        match self.workers.get(name) {
            Some(w) => w.requests.send(request).is_ok(),
            None => false,
        }
    }

    /// Stop every worker and wait for all of them to exit.
    pub fn shutdown(&mut self) {
        for (name, worker) in self.workers.drain() {
            drop(worker.requests);
            if worker.handle.join().is_err() {
                warn!("plugin {} panicked", name);
            }
        }
    }
}

fn run_worker(
    name: String,
    mut plugin: Box<dyn Plugin>,
    size: SizeClass,
    runner: Arc<dyn CommandRunner>,
    requests: mpsc::Receiver<PluginRequest>,
    events: mpsc::Sender<SurfaceEvent>,
) {
    let runner = runner.as_ref();
    plugin.on_size_changed(size);
    plugin.refresh(runner);
    let publish = |plugin: &dyn Plugin| {
        events
            .send(SurfaceEvent::PluginView {
                name: name.clone(),
                view: plugin.view(),
            })
            .is_ok()
    };
    if !publish(plugin.as_ref()) {
        return;
    }

    let interval = plugin.poll_interval();
    let mut next_poll = interval.map(|i| Instant::now() + i);

    loop {
        let request = match next_poll {
            Some(at) => match requests.recv_timeout(at.saturating_duration_since(Instant::now())) {
                Ok(r) => Some(r),
                Err(RecvTimeoutError::Timeout) => None,
                Err(RecvTimeoutError::Disconnected) => break,
            },
            None => match requests.recv() {
                Ok(r) => Some(r),
                Err(_) => break,
            },
        };

        match request {
            None => {
                plugin.refresh(runner);
                next_poll = interval.map(|i| Instant::now() + i);
            }
            Some(PluginRequest::Refresh) => plugin.refresh(runner),
            Some(PluginRequest::Activate) => plugin.activate(runner),
            Some(PluginRequest::Secondary) => plugin.secondary(runner),
            Some(PluginRequest::Scroll(steps)) => plugin.scroll(runner, steps),
            Some(PluginRequest::SetLevel(p)) => plugin.set_level(runner, p),
            Some(PluginRequest::SizeChanged(s)) => plugin.on_size_changed(s),
        }

        if !publish(plugin.as_ref()) {
            break;
        }
    }
    debug!("plugin {} worker exiting", name);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::testing::MockRunner;
    use crate::size::Span;
    use crate::traits::{PluginDescriptor, PluginView};
    use std::time::Duration;

    const DESC: PluginDescriptor = PluginDescriptor {
        name: "Counter",
        title: "Counter",
        default_span: Span::new(1, 1),
        default_size_class: SizeClass::Small,
    };

    /// Counts refreshes and clicks into its label.
    struct Counter {
        refreshes: u32,
        clicks: u32,
        size: SizeClass,
        poll: Option<Duration>,
    }

    impl Counter {
        fn boxed(poll: Option<Duration>) -> Box<dyn Plugin> {
            Box::new(Self {
                refreshes: 0,
                clicks: 0,
                size: SizeClass::Default,
                poll,
            })
        }
    }

    impl Plugin for Counter {
        fn descriptor(&self) -> PluginDescriptor {
            DESC
        }
        fn on_size_changed(&mut self, size: SizeClass) {
            self.size = size;
        }
        fn poll_interval(&self) -> Option<Duration> {
            self.poll
        }
        fn refresh(&mut self, _runner: &dyn CommandRunner) {
            self.refreshes += 1;
        }
        fn view(&self) -> PluginView {
            PluginView::icon(self.size.as_str())
                .with_text(format!("{}/{}", self.refreshes, self.clicks))
        }
        fn activate(&mut self, runner: &dyn CommandRunner) {
            self.clicks += 1;
            let _ = runner.spawn("clicked", &[]);
        }
    }

    fn host() -> (PluginHost, mpsc::Receiver<SurfaceEvent>, Arc<MockRunner>) {
        let runner = Arc::new(MockRunner::new());
        let (tx, rx) = mpsc::channel();
        (PluginHost::new(runner.clone(), tx), rx, runner)
    }

    fn next_view(rx: &mpsc::Receiver<SurfaceEvent>) -> PluginView {
        match rx.recv_timeout(Duration::from_secs(2)).expect("view") {
            SurfaceEvent::PluginView { view, .. } => view,
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn start_publishes_initial_view() {
        let (mut host, rx, _) = host();
        host.start("Counter", Counter::boxed(None), SizeClass::Medium);
        let view = next_view(&rx);
        assert_eq!(view.icon, "Medium");
        assert_eq!(view.text.as_deref(), Some("1/0"));
        host.shutdown();
    }

    #[test]
    fn requests_are_forwarded() {
        let (mut host, rx, runner) = host();
        host.start("Counter", Counter::boxed(None), SizeClass::Normal);
        next_view(&rx);
        assert!(host.send("Counter", PluginRequest::Activate));
        assert_eq!(next_view(&rx).text.as_deref(), Some("1/1"));
        assert!(host.send("Counter", PluginRequest::SizeChanged(SizeClass::Huge)));
        assert_eq!(next_view(&rx).icon, "Huge");
        host.shutdown();
        assert!(runner.called("spawn clicked"));
    }

    #[test]
    fn poll_interval_triggers_refresh() {
        let (mut host, rx, _) = host();
        host.start(
            "Counter",
            Counter::boxed(Some(Duration::from_millis(20))),
            SizeClass::Normal,
        );
        next_view(&rx);
        assert_eq!(next_view(&rx).text.as_deref(), Some("2/0"));
        host.shutdown();
    }

    #[test]
    fn stopped_worker_rejects_requests() {
        let (mut host, rx, _) = host();
        host.start("Counter", Counter::boxed(None), SizeClass::Normal);
        next_view(&rx);
        host.stop("Counter");
        assert!(!host.is_running("Counter"));
        assert!(!host.send("Counter", PluginRequest::Refresh));
    }
}
