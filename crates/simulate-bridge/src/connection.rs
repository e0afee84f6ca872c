//! The single controller connection.
//!
//! A dedicated receive thread decodes frames and forwards them over a
//! channel; it never touches simulation state. Sending happens on the
//! caller's (simulation) thread.

use std::fmt;
use std::io::ErrorKind;
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::ProtocolError;
use crate::framing::{read_frame, write_frame};

/// Lifecycle of a [`Connection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Open,
    Closing,
}

/// Events forwarded by the receive thread.
#[derive(Debug)]
pub enum Inbound {
    Frame(Vec<u8>),
    /// The peer closed the stream.
    Closed,
    /// The stream failed or sent an invalid frame.
    Failed(ProtocolError),
}

pub struct Connection {
    stream: Option<TcpStream>,
    inbound: Receiver<Inbound>,
    receiver: Option<JoinHandle<()>>,
    state: ConnectionState,
    peer: Option<SocketAddr>,
}

impl Connection {
    /// Connect to a listening controller.
    pub fn connect(
        addr: impl ToSocketAddrs,
        max_message_size: usize,
    ) -> Result<Self, ProtocolError> {
        debug!(state = ?ConnectionState::Connecting, "connecting");
        let stream = TcpStream::connect(addr)?;
        Self::open(stream, max_message_size)
    }

    /// Wait for one controller to connect to `listener`.
    pub fn accept(
        listener: &TcpListener,
        max_message_size: usize,
    ) -> Result<Self, ProtocolError> {
        debug!(state = ?ConnectionState::Connecting, "waiting for controller");
        let (stream, _addr) = listener.accept()?;
        Self::open(stream, max_message_size)
    }

    fn open(stream: TcpStream, max_message_size: usize) -> Result<Self, ProtocolError> {
        stream.set_nodelay(true)?;
        let peer = stream.peer_addr().ok();
        let mut reader = stream.try_clone()?;
        let (tx, inbound) = mpsc::channel();

        let receiver = thread::Builder::new()
            .name("bridge-recv".into())
            .spawn(move || loop {
                let event = match read_frame(&mut reader, max_message_size) {
                    Ok(frame) => Inbound::Frame(frame),
                    Err(ProtocolError::ConnectionClosed) => Inbound::Closed,
                    Err(ProtocolError::Io(e)) if is_disconnect(&e) => Inbound::Closed,
                    Err(err) => Inbound::Failed(err),
                };
                let last = !matches!(event, Inbound::Frame(_));
                if tx.send(event).is_err() || last {
                    break;
                }
            })?;

        info!(peer = ?peer, "connection open");
        Ok(Self {
            stream: Some(stream),
            inbound,
            receiver: Some(receiver),
            state: ConnectionState::Open,
            peer,
        })
    }

    pub const fn state(&self) -> ConnectionState {
        self.state
    }

    pub const fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer
    }

    /// Wait up to `timeout` for the next inbound event.
    ///
    /// Returns `None` on timeout. Once the receive thread has stopped every
    /// call yields [`Inbound::Closed`].
    pub fn recv_timeout(&self, timeout: Duration) -> Option<Inbound> {
        match self.inbound.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(Inbound::Closed),
        }
    }

    /// Send one framed response.
    pub fn send(&mut self, payload: &[u8]) -> Result<(), ProtocolError> {
        let stream = match (&mut self.stream, self.state) {
            (Some(stream), ConnectionState::Open) => stream,
            _ => return Err(ProtocolError::NotConnected),
        };
        write_frame(stream, payload)
    }

    /// Shut the socket down and join the receive thread. Idempotent.
    pub fn close(&mut self) {
        let Some(stream) = self.stream.take() else {
            return;
        };
        self.state = ConnectionState::Closing;
        if let Err(e) = stream.shutdown(Shutdown::Both) {
            if e.kind() != ErrorKind::NotConnected {
                warn!(error = %e, "socket shutdown failed");
            }
        }
        if let Some(handle) = self.receiver.take() {
            if handle.join().is_err() {
                warn!("receive thread panicked");
            }
        }
        self.state = ConnectionState::Disconnected;
        info!(peer = ?self.peer, "connection closed");
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("state", &self.state)
            .field("peer", &self.peer)
            .finish_non_exhaustive()
    }
}

fn is_disconnect(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        ErrorKind::ConnectionReset | ErrorKind::ConnectionAborted | ErrorKind::BrokenPipe
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
