//! Pluggable units of game logic, run in registration order by both passes.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Result;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::application::GameContext;
use crate::error::EngineError;
use crate::time::GameTime;

/// A unit of game logic with lifecycle and per-tick hooks.
///
/// `update` runs on the Update thread and `draw` on the Draw thread, so the
/// two may be called back to back from different threads. They never run at
/// the same time for the same component.
pub trait Component: Send {
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    fn initialize(&mut self, _ctx: &GameContext<'_>) -> Result<()> {
        Ok(())
    }

    fn load_content(&mut self, _ctx: &GameContext<'_>) -> Result<()> {
        Ok(())
    }

    fn update(&mut self, _time: &GameTime, _ctx: &GameContext<'_>) -> Result<()> {
        Ok(())
    }

    fn draw(&mut self, _time: &GameTime, _ctx: &GameContext<'_>) -> Result<()> {
        Ok(())
    }

    fn unload_content(&mut self, _ctx: &GameContext<'_>) -> Result<()> {
        Ok(())
    }
}

/// Handle returned when a component is added. Used to remove it again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(u64);

pub type SharedComponent = Arc<Mutex<dyn Component>>;

struct Entry {
    id: ComponentId,
    name: String,
    component: SharedComponent,
}

enum Change {
    Add(Entry),
    Remove(ComponentId),
}

/// Lifecycle hooks a component receives when its addition is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Activation {
    /// The engine runs the lifecycle hooks itself later on.
    Deferred,
    /// Content loading is still to come; only `initialize` runs now.
    Initialize,
    /// The game is running: `initialize` and `load_content` both run now.
    Full,
}

/// Ordered component collection shared by both passes.
///
/// `add` and `remove` never touch the live list. They queue a change that
/// the Update pass applies at the start of its next tick, so a component may
/// add or remove components (itself included) from inside its own hooks.
/// The Draw pass sees an addition from its next frame after that tick; a
/// removal waits for any Draw frame in flight and the removed component is
/// never drawn again.
#[derive(Default)]
pub struct ComponentRegistry {
    entries: RwLock<Vec<Entry>>,
    pending: Mutex<Vec<Change>>,
    next_id: AtomicU64,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<C: Component + 'static>(&self, component: C) -> ComponentId {
        self.add_shared(Arc::new(Mutex::new(component)))
    }

    /// Adds a component the caller keeps a handle to.
    pub fn add_shared(&self, component: SharedComponent) -> ComponentId {
        let id = ComponentId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let name = component.lock().name().to_owned();
        self.pending.lock().push(Change::Add(Entry {
            id,
            name,
            component,
        }));
        id
    }

    pub fn remove(&self, id: ComponentId) {
        self.pending.lock().push(Change::Remove(id));
    }

    /// Number of live components. Queued additions are not counted.
    pub fn len(&self) -> usize {
        self.entries.read_recursive().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read_recursive().is_empty()
    }

    pub fn contains(&self, id: ComponentId) -> bool {
        self.entries
            .read_recursive()
            .iter()
            .any(|entry| entry.id == id)
    }

    /// Live component names in invocation order.
    pub fn names(&self) -> Vec<String> {
        self.entries
            .read_recursive()
            .iter()
            .map(|entry| entry.name.clone())
            .collect()
    }

    pub(crate) fn apply_pending(&self, ctx: &GameContext<'_>, activation: Activation) {
        let changes = std::mem::take(&mut *self.pending.lock());
        if changes.is_empty() {
            return;
        }

        // Hooks run outside the write lock: they may query the registry.
        for change in changes {
            match change {
                Change::Add(entry) => {
                    if activate(&entry, ctx, activation) {
                        debug!("Component {} added as {:?}", entry.name, entry.id);
                        self.entries.write().push(entry);
                    }
                }
                Change::Remove(id) => {
                    let removed = {
                        let mut entries = self.entries.write();
                        entries
                            .iter()
                            .position(|entry| entry.id == id)
                            .map(|index| entries.remove(index))
                    };
                    match removed {
                        // Out of the list already, so no pass can reach it any more.
                        Some(entry) => {
                            debug!("Component {} removed", entry.name);
                            if activation == Activation::Full {
                                warn_on_error(&entry, "unload_content", |c| c.unload_content(ctx));
                            }
                        }
                        None => debug!("Ignoring removal of unknown component {id:?}"),
                    }
                }
            }
        }
    }

    pub(crate) fn initialize_all(&self, ctx: &GameContext<'_>) -> crate::error::Result<()> {
        for entry in self.entries.read_recursive().iter() {
            entry
                .component
                .lock()
                .initialize(ctx)
                .map_err(|err| EngineError::hook(entry.name.clone(), "initialize", &err))?;
        }
        Ok(())
    }

    /// On a failure the components that already loaded are unloaded again,
    /// in registration order, before the error is returned.
    pub(crate) fn load_content_all(&self, ctx: &GameContext<'_>) -> crate::error::Result<()> {
        let entries = self.entries.read_recursive();
        for (index, entry) in entries.iter().enumerate() {
            let result = entry.component.lock().load_content(ctx);
            if let Err(err) = result {
                for loaded in &entries[..index] {
                    warn_on_error(loaded, "unload_content", |c| c.unload_content(ctx));
                }
                return Err(EngineError::hook(entry.name.clone(), "load_content", &err));
            }
        }
        Ok(())
    }

    pub(crate) fn update_all(&self, time: &GameTime, ctx: &GameContext<'_>) {
        for entry in self.entries.read_recursive().iter() {
            warn_on_error(entry, "update", |c| c.update(time, ctx));
        }
    }

    pub(crate) fn draw_all(&self, time: &GameTime, ctx: &GameContext<'_>) {
        for entry in self.entries.read_recursive().iter() {
            warn_on_error(entry, "draw", |c| c.draw(time, ctx));
        }
    }

    /// Unloads and drops every live component. Additions still queued were
    /// never initialized and are dropped without hooks.
    pub(crate) fn unload_all(&self, ctx: &GameContext<'_>) {
        self.pending.lock().clear();
        let entries = std::mem::take(&mut *self.entries.write());
        for entry in &entries {
            warn_on_error(entry, "unload_content", |c| c.unload_content(ctx));
        }
    }
}

fn activate(entry: &Entry, ctx: &GameContext<'_>, activation: Activation) -> bool {
    let mut component = entry.component.lock();
    let result = match activation {
        Activation::Deferred => Ok(()),
        Activation::Initialize => component.initialize(ctx),
        Activation::Full => component
            .initialize(ctx)
            .and_then(|()| component.load_content(ctx)),
    };
    match result {
        Ok(()) => true,
        Err(err) => {
            warn!("Component {} failed to start, dropping it: {err:#}", entry.name);
            false
        }
    }
}

fn warn_on_error(entry: &Entry, stage: &str, hook: impl FnOnce(&mut dyn Component) -> Result<()>) {
    if let Err(err) = hook(&mut *entry.component.lock()) {
        warn!("Component {} {stage} failed: {err:#}", entry.name);
    }
}
