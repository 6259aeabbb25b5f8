//! Minimal liveness probe client for Redis-protocol targets.
//!
//! The probe speaks just enough of the wire protocol to ask `PING` and read
//! one reply line. Dial failures (connection refused while a freshly
//! spawned process is still binding its socket) are retried within their
//! own bounded budget, separately from the liveness budget driven by
//! [`crate::target::RedisProcessTarget`].

use std::io;
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufStream};
use tokio::net::TcpStream;
use tracing::debug;

/// Errors from dialing or probing a target endpoint.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The dial retry budget ran out without an accepted connection.
    #[error("could not connect to {addr} after {attempts} attempts: {source}")]
    Connect {
        addr: String,
        attempts: u32,
        #[source]
        source: io::Error,
    },

    /// An established connection failed mid-probe.
    #[error("i/o error while probing: {0}")]
    Io(#[from] io::Error),

    /// The service answered with a protocol error reply.
    #[error("error reply to PING: {0}")]
    ErrorReply(String),

    /// The service answered with something other than a reply to `PING`.
    #[error("unexpected reply to PING: {0:?}")]
    UnexpectedReply(String),
}

/// A bounded-attempt schedule: `attempts` tries with a fixed `interval`
/// between them. Exhaustion is a hard failure, not a silent partial state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub interval: Duration,
}

impl RetryPolicy {
    /// Default schedule for the dial step. Connection refused immediately
    /// after a spawn is expected and transient.
    pub fn dial() -> Self {
        Self {
            attempts: 10,
            interval: Duration::from_millis(100),
        }
    }

    /// Default schedule for the liveness command itself.
    pub fn ping() -> Self {
        Self {
            attempts: 20,
            interval: Duration::from_millis(200),
        }
    }
}

/// A probe connection to a target endpoint.
///
/// Once established it is meant to be cached and reused for subsequent
/// probes rather than re-dialed each time.
#[derive(Debug)]
pub struct Connection {
    stream: BufStream<TcpStream>,
}

impl Connection {
    /// Dial `addr` within the bounded retry budget of `policy`.
    ///
    /// A zero-attempt policy still gets one try.
    pub async fn dial(addr: &str, policy: &RetryPolicy) -> Result<Self, ProbeError> {
        let attempts = policy.attempts.max(1);
        let mut remaining = attempts;
        loop {
            match TcpStream::connect(addr).await {
                Ok(stream) => {
                    debug!(addr, "probe connection established");
                    return Ok(Self {
                        stream: BufStream::new(stream),
                    });
                }
                Err(err) => {
                    remaining -= 1;
                    if remaining == 0 {
                        return Err(ProbeError::Connect {
                            addr: addr.to_string(),
                            attempts,
                            source: err,
                        });
                    }
                    debug!(addr, remaining, error = %err, "dial failed, retrying");
                    tokio::time::sleep(policy.interval).await;
                }
            }
        }
    }

    /// Issue a `PING` and expect `+PONG`.
    pub async fn ping(&mut self) -> Result<(), ProbeError> {
        self.stream.write_all(b"PING\r\n").await?;
        self.stream.flush().await?;

        let mut reply = String::new();
        let n = self.stream.read_line(&mut reply).await?;
        if n == 0 {
            return Err(ProbeError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "connection closed before reply",
            )));
        }

        let reply = reply.trim_end();
        match reply.as_bytes().first() {
            Some(b'+') if reply.eq_ignore_ascii_case("+PONG") => Ok(()),
            Some(b'-') => Err(ProbeError::ErrorReply(reply[1..].to_string())),
            _ => Err(ProbeError::UnexpectedReply(reply.to_string())),
        }
    }
}
