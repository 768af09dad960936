//! Listener setup and accept loop
//!
//! `Server` owns the long-lived manager objects (transaction manager,
//! store, client registry) and threads them through every service thread.
//! There are no process-wide singletons; tests bind to port 0 and reach
//! the same state the binary uses.

use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;
use std::thread;

use tracing::{info, warn};

use versant_concurrency::TransactionManager;
use versant_core::Result;
use versant_storage::Store;

use crate::registry::ClientRegistry;
use crate::service::serve_client;

/// A bound Versant server, ready to accept connections.
pub struct Server {
    listener: TcpListener,
    manager: Arc<TransactionManager>,
    store: Arc<Store>,
    registry: Arc<ClientRegistry>,
}

impl Server {
    /// Bind the listener and initialize the manager objects. Port 0 asks
    /// the OS for an ephemeral port; see [`Server::local_addr`].
    pub fn bind(host: &str, port: u16) -> Result<Self> {
        let listener = TcpListener::bind((host, port))?;
        info!(addr = %listener.local_addr()?, "listening");
        Ok(Server {
            listener,
            manager: Arc::new(TransactionManager::new()),
            store: Arc::new(Store::new()),
            registry: Arc::new(ClientRegistry::new()),
        })
    }

    /// The bound address.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// The transaction manager shared by all service threads.
    pub fn manager(&self) -> Arc<TransactionManager> {
        Arc::clone(&self.manager)
    }

    /// The shared store.
    pub fn store(&self) -> Arc<Store> {
        Arc::clone(&self.store)
    }

    /// The client registry, used by graceful shutdown.
    pub fn registry(&self) -> Arc<ClientRegistry> {
        Arc::clone(&self.registry)
    }

    /// Accept connections forever, one service thread per client.
    ///
    /// Returns only if the listener itself fails.
    pub fn run(&self) -> Result<()> {
        loop {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    info!(%peer, "accepted connection");
                    let manager = Arc::clone(&self.manager);
                    let store = Arc::clone(&self.store);
                    let registry = Arc::clone(&self.registry);
                    thread::Builder::new()
                        .name(format!("versant-client-{peer}"))
                        .spawn(move || serve_client(stream, &manager, &store, &registry))?;
                }
                Err(err) => {
                    // Per-connection accept failures are survivable.
                    warn!(%err, "accept failed");
                }
            }
        }
    }

    /// Spawn the accept loop on a background thread and return the handle.
    /// Used by tests and by callers that drive shutdown themselves.
    pub fn spawn(self) -> Result<ServerHandle> {
        let addr = self.local_addr()?;
        let manager = self.manager();
        let store = self.store();
        let registry = self.registry();
        thread::Builder::new()
            .name("versant-accept".to_string())
            .spawn(move || {
                if let Err(err) = self.run() {
                    warn!(%err, "accept loop terminated");
                }
            })?;
        Ok(ServerHandle {
            addr,
            manager,
            store,
            registry,
        })
    }
}

/// Handles to a running server's shared state.
pub struct ServerHandle {
    addr: SocketAddr,
    manager: Arc<TransactionManager>,
    store: Arc<Store>,
    registry: Arc<ClientRegistry>,
}

impl ServerHandle {
    /// The bound address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// The transaction manager.
    pub fn manager(&self) -> &Arc<TransactionManager> {
        &self.manager
    }

    /// The store.
    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    /// The client registry.
    pub fn registry(&self) -> &Arc<ClientRegistry> {
        &self.registry
    }

    /// Graceful shutdown: half-close every client, wait for the service
    /// threads to unwind, then finalize the core state.
    pub fn shutdown(&self) {
        info!("shutting down");
        self.registry.shutdown_all();
        self.registry.wait_for_empty();
        self.store.finalize();
        self.manager.finalize();
        info!("shutdown complete");
    }
}
