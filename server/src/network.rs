//! UDP dispatch loop: one socket, one task, bounded-wait receives.
//!
//! Each iteration waits up to the configured receive timeout for a single
//! datagram. Traffic or not, the iteration then runs the challenge-end
//! sweep followed by the liveness sweep and flushes whatever the engine
//! queued; the bounded wait is what keeps housekeeping running on an
//! idle socket.

use crate::engine::{Engine, EngineConfig, Outbound};
use log::{error, info};
use std::net::SocketAddr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::net::UdpSocket;
use tokio::sync::watch;
use tokio::time::timeout;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("unable to bind the UDP socket: {0}")]
    Bind(std::io::Error),

    #[error("socket error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    /// Upper bound on one receive wait; the effective tick length on an
    /// idle socket.
    pub recv_timeout: Duration,
    pub recv_buffer: usize,
    pub engine: EngineConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:9999".to_string(),
            recv_timeout: Duration::from_millis(1000),
            recv_buffer: shared::BUFFER_SIZE,
            engine: EngineConfig::default(),
        }
    }
}

/// The running server: a bound socket plus the engine it feeds.
pub struct Server {
    socket: UdpSocket,
    engine: Engine,
    config: ServerConfig,
}

impl Server {
    /// Binds the socket. Startup failures propagate; the process should
    /// die loudly rather than run without a socket.
    pub async fn new(config: ServerConfig) -> Result<Self, ServerError> {
        let socket = UdpSocket::bind(&config.bind_addr)
            .await
            .map_err(ServerError::Bind)?;
        info!("server listening on {}", socket.local_addr()?);

        Ok(Server {
            socket,
            engine: Engine::new(config.engine),
            config,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.socket.local_addr()?)
    }

    /// Runs the dispatch loop until `shutdown` flips. Single task, so no
    /// handler ever observes half-applied state.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) -> Result<(), ServerError> {
        let mut buffer = vec![0u8; self.config.recv_buffer];
        let mut out: Vec<Outbound> = Vec::new();
        info!("server started");

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    info!("shutdown requested");
                    break;
                }
                received = timeout(self.config.recv_timeout, self.socket.recv_from(&mut buffer)) => {
                    let now = epoch_secs();
                    match received {
                        // Bounded wait elapsed: housekeeping only.
                        Err(_) => {}
                        Ok(Err(error)) => error!("error receiving datagram: {error}"),
                        Ok(Ok((len, sender))) => {
                            self.engine.handle_datagram(&buffer[..len], sender, now, &mut out);
                        }
                    }

                    self.engine.sweep_ended_challenges(now, &mut out);
                    self.engine.sweep_liveness(now, &mut out);
                    self.flush(&mut out).await;
                }
            }
        }

        Ok(())
    }

    async fn flush(&self, out: &mut Vec<Outbound>) {
        for Outbound { addr, bytes } in out.drain(..) {
            if let Err(error) = self.socket.send_to(&bytes, addr).await {
                error!("failed to send to {addr}: {error}");
            }
        }
    }
}

/// Wall-clock seconds since the epoch, the clock the engine is fed.
pub fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::from_secs(0))
        .as_secs()
}
