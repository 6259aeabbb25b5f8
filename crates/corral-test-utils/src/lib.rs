//! Shared test utilities for corral integration tests.
//!
//! Provides [`FakeRedis`], an in-process TCP listener that answers the
//! `PING` liveness command. Tests configure its reply script to exercise
//! the probe's retry paths without a real server, and read its counters to
//! assert connection caching and retry counts.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// How the fake server answers `PING`.
#[derive(Debug, Clone)]
pub enum PingScript {
    /// Always `+PONG`.
    Pong,
    /// Always the given raw reply line (e.g. `-LOADING ...`).
    Always(String),
    /// The raw reply line for the first `n` pings, then `+PONG`.
    FailFirst { n: usize, reply: String },
    /// Close the connection as soon as a command arrives.
    Hangup,
}

/// An in-process stand-in for a Redis server's liveness surface.
///
/// Binds an ephemeral loopback port; the accept loop is aborted on drop.
pub struct FakeRedis {
    addr: SocketAddr,
    accepted: Arc<AtomicUsize>,
    pings: Arc<AtomicUsize>,
    accept_loop: JoinHandle<()>,
}

impl FakeRedis {
    /// Start a server that answers every `PING` with `+PONG`.
    pub async fn start() -> Self {
        Self::with_script(PingScript::Pong).await
    }

    /// Start a server with a custom reply script.
    pub async fn with_script(script: PingScript) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind fake redis listener");
        let addr = listener.local_addr().expect("listener has no local addr");
        let accepted = Arc::new(AtomicUsize::new(0));
        let pings = Arc::new(AtomicUsize::new(0));

        let accepted_counter = Arc::clone(&accepted);
        let ping_counter = Arc::clone(&pings);
        let accept_loop = tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                accepted_counter.fetch_add(1, Ordering::SeqCst);
                tokio::spawn(serve_conn(
                    stream,
                    script.clone(),
                    Arc::clone(&ping_counter),
                ));
            }
        });

        Self {
            addr,
            accepted,
            pings,
            accept_loop,
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Connections accepted so far. Lets tests assert connection caching.
    pub fn connections_accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }

    /// Pings answered so far, successful or not.
    pub fn pings_answered(&self) -> usize {
        self.pings.load(Ordering::SeqCst)
    }
}

impl Drop for FakeRedis {
    fn drop(&mut self) {
        self.accept_loop.abort();
    }
}

async fn serve_conn(stream: TcpStream, script: PingScript, pings: Arc<AtomicUsize>) {
    let mut reader = BufReader::new(stream);
    let mut line = String::new();
    loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        if !line.to_ascii_uppercase().contains("PING") {
            continue;
        }

        let answered = pings.fetch_add(1, Ordering::SeqCst);
        let reply = match &script {
            PingScript::Pong => "+PONG\r\n".to_string(),
            PingScript::Always(raw) => format!("{raw}\r\n"),
            PingScript::FailFirst { n, reply } if answered < *n => format!("{reply}\r\n"),
            PingScript::FailFirst { .. } => "+PONG\r\n".to_string(),
            PingScript::Hangup => break,
        };
        if reader.get_mut().write_all(reply.as_bytes()).await.is_err() {
            break;
        }
    }
}

/// A loopback port with nothing listening on it.
///
/// Binds an ephemeral port, reads it, and releases it. Racy by nature but
/// good enough for connection-refused tests.
pub async fn unused_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind probe listener");
    let port = listener.local_addr().expect("listener has no local addr").port();
    drop(listener);
    port
}
