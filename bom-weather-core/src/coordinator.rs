use parking_lot::Mutex;
use std::{
    fmt,
    sync::{Arc, Weak},
};

use crate::{
    collector::Collector,
    error::{EntityError, Result},
};

type Callback = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: Vec<(u64, Callback)>,
}

/// Drives collector refreshes and notifies listeners after each one.
pub struct Coordinator {
    name: String,
    collector: Arc<dyn Collector>,
    listeners: Arc<Mutex<Listeners>>,
}

impl fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Coordinator")
            .field("name", &self.name)
            .field("collector", &self.collector)
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl Coordinator {
    pub fn new(name: impl Into<String>, collector: Arc<dyn Collector>) -> Self {
        Self {
            name: name.into(),
            collector,
            listeners: Arc::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn collector(&self) -> &Arc<dyn Collector> {
        &self.collector
    }

    /// Register a callback fired after every refresh.
    ///
    /// The callback stays registered until the returned handle is dropped.
    pub fn add_listener<F>(&self, callback: F) -> ListenerHandle
    where
        F: Fn() + Send + Sync + 'static,
    {
        let mut listeners = self.listeners.lock();
        let id = listeners.next_id;
        listeners.next_id += 1;
        listeners.entries.push((id, Arc::new(callback)));

        ListenerHandle { id, listeners: Arc::downgrade(&self.listeners) }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().entries.len()
    }

    /// Update the collector, then notify every listener.
    pub async fn async_refresh(&self) -> Result<()> {
        tracing::debug!(coordinator = %self.name, "refreshing collector");

        self.collector.async_update().await.map_err(EntityError::Collector)?;
        self.notify_listeners();

        Ok(())
    }

    /// Notify listeners in registration order without touching the collector.
    pub fn notify_listeners(&self) {
        // Callbacks run outside the lock so a listener may unsubscribe itself.
        let callbacks: Vec<Callback> =
            self.listeners.lock().entries.iter().map(|(_, cb)| Arc::clone(cb)).collect();

        tracing::debug!(coordinator = %self.name, listeners = callbacks.len(), "notifying listeners");

        for callback in callbacks {
            callback();
        }
    }
}

/// Subscription returned by [`Coordinator::add_listener`].
#[must_use = "dropping the handle removes the listener"]
pub struct ListenerHandle {
    id: u64,
    listeners: Weak<Mutex<Listeners>>,
}

impl ListenerHandle {
    /// Unregister the listener now; dropping the handle does the same.
    pub fn remove(self) {
        drop(self);
    }
}

impl fmt::Debug for ListenerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerHandle").field("id", &self.id).finish()
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners.lock().entries.retain(|(id, _)| *id != self.id);
        }
    }
}
