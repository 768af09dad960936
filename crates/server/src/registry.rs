//! Client connection registry
//!
//! Tracks every live connection so graceful shutdown can half-close them
//! all and then block until the service threads have unwound. No
//! correctness dependency on the core beyond orderly thread termination.

use std::net::{Shutdown, TcpStream};
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use parking_lot::{Condvar, Mutex};
use tracing::debug;
use versant_core::Result;

/// Registry of active client connections.
pub struct ClientRegistry {
    connections: DashMap<u64, TcpStream>,
    next_id: AtomicU64,
    count: Mutex<usize>,
    empty: Condvar,
}

impl ClientRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        debug!("initialize client registry");
        ClientRegistry {
            connections: DashMap::new(),
            next_id: AtomicU64::new(0),
            count: Mutex::new(0),
            empty: Condvar::new(),
        }
    }

    /// Register a connection and hand out its id.
    ///
    /// Keeps a second handle to the socket so `shutdown_all` can reach
    /// connections whose service threads are blocked in a read.
    pub fn register(&self, stream: &TcpStream) -> Result<u64> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.connections.insert(id, stream.try_clone()?);
        let mut count = self.count.lock();
        *count += 1;
        debug!(conn = id, total = *count, "register client");
        Ok(id)
    }

    /// Remove a connection; wakes `wait_for_empty` when the last one goes.
    pub fn unregister(&self, id: u64) {
        self.connections.remove(&id);
        let mut count = self.count.lock();
        *count = count.saturating_sub(1);
        debug!(conn = id, total = *count, "unregister client");
        if *count == 0 {
            self.empty.notify_all();
        }
    }

    /// Number of live connections.
    pub fn len(&self) -> usize {
        *self.count.lock()
    }

    /// Whether no connections are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Block until every registered connection has unregistered.
    pub fn wait_for_empty(&self) {
        let mut count = self.count.lock();
        while *count > 0 {
            self.empty.wait(&mut count);
        }
    }

    /// Half-close the read side of every registered connection so the
    /// service threads see EOF and unwind.
    pub fn shutdown_all(&self) {
        for entry in self.connections.iter() {
            debug!(conn = entry.key(), "shutting down client");
            // A connection may be closing concurrently; that's fine.
            let _ = entry.value().shutdown(Shutdown::Read);
        }
    }
}

impl Default for ClientRegistry {
    fn default() -> Self {
        ClientRegistry::new()
    }
}
