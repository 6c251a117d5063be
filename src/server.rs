//! TCP listener and accept loop.
//!
//! Binds the listening socket with an explicit backlog, accepts
//! connections, and submits each one to the worker pool. Accept errors are
//! logged and the loop continues; a bind failure is fatal. Ctrl-C stops
//! the loop and drains in-flight handlers before returning.

use crate::config::Config;
use crate::journal::Journal;
use crate::pool::WorkerPool;
use crate::protocol;
use socket2::{Domain, Socket, Type};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info, info_span, Instrument};

/// Pending-connection backlog for the listening socket.
const LISTEN_BACKLOG: i32 = 100;

/// Server instance
pub struct Server {
    config: Config,
    journal: Option<Arc<Journal>>,
}

impl Server {
    /// Create a server, opening (and initializing if absent) the journal
    /// when the configured mode persists results.
    pub async fn new(config: Config) -> io::Result<Self> {
        let journal = match &config.journal {
            Some(path) => Some(Journal::open(path).await?),
            None => None,
        };
        Ok(Server { config, journal })
    }

    /// Bind the configured address and serve until shutdown.
    pub async fn run(&self) -> io::Result<()> {
        let listener = bind_listener(&self.config.listen)?;
        self.serve(listener).await
    }

    /// Accept loop over an already-bound listener.
    async fn serve(&self, listener: TcpListener) -> io::Result<()> {
        let mut pool = WorkerPool::new(self.config.pool);
        let address = listener.local_addr()?;

        info!(
            address = %address,
            mode = ?self.config.mode,
            pool = ?self.config.pool,
            "Server listening"
        );

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("Shutdown signal received");
                    break;
                }
                accepted = listener.accept() => match accepted {
                    Ok((stream, addr)) => {
                        debug!(peer = %addr, "New connection");

                        let mode = self.config.mode;
                        let journal = self.journal.clone();
                        let task = async move {
                            match protocol::handle_connection(stream, mode, journal).await {
                                Ok(()) => debug!("Connection closed"),
                                Err(e) => debug!(error = %e, "Connection error"),
                            }
                        };
                        pool.submit(task.instrument(info_span!("conn", peer = %addr))).await;
                    }
                    Err(e) => {
                        error!(error = %e, "Failed to accept connection");
                    }
                }
            }
        }

        // Stop accepting before the in-flight handlers drain.
        drop(listener);
        pool.shutdown().await;
        info!("Server closed");
        Ok(())
    }
}

/// Bind `listen` with `SO_REUSEADDR` and a backlog of 100, then hand the
/// socket to tokio. Any failure here is fatal to startup.
fn bind_listener(listen: &str) -> io::Result<TcpListener> {
    let addr: SocketAddr = listen.parse().map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("invalid listen address '{listen}': {e}"),
        )
    })?;

    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, None)?;
    socket.set_reuse_address(true)?;
    socket.bind(&addr.into())?;
    socket.listen(LISTEN_BACKLOG)?;
    socket.set_nonblocking(true)?;

    TcpListener::from_std(socket.into())
}
