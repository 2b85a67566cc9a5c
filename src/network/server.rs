//! TCP Server
//!
//! Accepts connections and serves each one on its own thread.

use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, Receiver};

use crate::config::Config;
use crate::engine::Engine;
use crate::error::{AtlasError, Result};
use crate::protocol::{write_response, Response};

use super::Connection;

/// How long the acceptor sleeps when no connection is pending
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// TCP server for AtlasDoc
pub struct Server {
    /// Server configuration
    config: Config,

    /// Shared storage engine
    engine: Arc<Engine>,

    /// Bound listener (non-blocking, polled by `run`)
    listener: TcpListener,

    /// Set to stop the accept loop
    shutdown: Arc<AtomicBool>,
}

/// Cloneable handle that stops a running server
#[derive(Clone)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandle {
    /// Signal the server to shutdown gracefully
    pub fn shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }
}

/// One of the `max_connections` slots, released on drop
///
/// The slots are a bounded channel: a successful `try_send` takes a slot,
/// receiving one message gives it back.
struct Permit {
    freed: Receiver<()>,
}

impl Drop for Permit {
    fn drop(&mut self) {
        let _ = self.freed.try_recv();
    }
}

/// A connection thread plus a handle on its socket for shutdown
struct LiveConnection {
    handle: JoinHandle<()>,
    control: TcpStream,
}

impl Server {
    /// Bind the listen address from the config
    pub fn bind(config: Config, engine: Arc<Engine>) -> Result<Self> {
        config.validate()?;

        let listener = TcpListener::bind(&config.listen_addr).map_err(|e| {
            AtlasError::Config(format!("cannot listen on {}: {}", config.listen_addr, e))
        })?;
        listener.set_nonblocking(true)?;

        Ok(Self {
            config,
            engine,
            listener,
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Address actually bound (useful with port 0)
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Handle for stopping the server from another thread
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            flag: Arc::clone(&self.shutdown),
        }
    }

    /// Start the server (blocking until shutdown)
    ///
    /// ## Threads
    /// - This thread accepts connections
    /// - Every accepted connection gets its own thread, so idle clients never
    ///   hold up others
    /// - At most `max_connections` are served at once; beyond that new
    ///   clients get an error response and are closed
    ///
    /// On shutdown the read side of every open connection is closed, which
    /// ends its request loop after any in-flight response is written.
    pub fn run(&self) -> Result<()> {
        tracing::info!(
            "Listening on {} (max {} connections)",
            self.local_addr()?,
            self.config.max_connections
        );

        let (slots, freed) = channel::bounded::<()>(self.config.max_connections);
        let mut live: Vec<LiveConnection> = Vec::new();

        while !self.shutdown.load(Ordering::SeqCst) {
            live.retain(|conn| !conn.handle.is_finished());

            match self.listener.accept() {
                Ok((stream, addr)) => {
                    tracing::trace!("Accepted connection from {}", addr);
                    // Accepted sockets may inherit non-blocking mode
                    stream.set_nonblocking(false)?;

                    if slots.try_send(()).is_err() {
                        tracing::warn!("Connection limit reached, rejecting {}", addr);
                        reject(stream);
                        continue;
                    }
                    let permit = Permit {
                        freed: freed.clone(),
                    };

                    match self.spawn_connection(stream, addr, permit) {
                        Ok(conn) => live.push(conn),
                        Err(e) => tracing::warn!("Cannot serve {}: {}", addr, e),
                    }
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
                Err(e) => {
                    tracing::warn!("Accept failed: {}", e);
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
            }
        }

        tracing::info!("Shutting down, closing {} connections", live.len());

        for conn in live {
            let _ = conn.control.shutdown(Shutdown::Read);
            let _ = conn.handle.join();
        }

        Ok(())
    }

    /// Serve one connection on a new thread
    ///
    /// The permit moves into the thread and is released when it exits, or
    /// immediately if the thread cannot be spawned.
    fn spawn_connection(
        &self,
        stream: TcpStream,
        addr: SocketAddr,
        permit: Permit,
    ) -> Result<LiveConnection> {
        let control = stream.try_clone()?;
        let engine = Arc::clone(&self.engine);
        let read_ms = self.config.read_timeout_ms;
        let write_ms = self.config.write_timeout_ms;

        let handle = thread::Builder::new()
            .name(format!("atlasdoc-conn-{}", addr))
            .spawn(move || {
                let _permit = permit;
                let result = Connection::new(stream, engine).and_then(|mut conn| {
                    conn.set_timeouts(read_ms, write_ms)?;
                    conn.handle()
                });

                if let Err(e) = result {
                    tracing::debug!("Connection {} ended with error: {}", addr, e);
                }
            })?;

        Ok(LiveConnection { handle, control })
    }
}

fn reject(mut stream: TcpStream) {
    let _ = write_response(&mut stream, &Response::error("server busy"));
}
