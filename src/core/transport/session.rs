//! Serial session lifecycle: connect, read loop, write, disconnect.
//!
//! The read loop runs on a blocking worker and reports through a channel.
//! Cancellation is cooperative: `disconnect` raises a flag that the reader
//! checks between reads, and physical ports use a short read timeout so
//! that check happens promptly.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

use super::port::{DeviceLink, PortProvider};
use crate::error::TransportError;

const READ_BUFFER_SIZE: usize = 1024;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// Notifications from a session's reader, tagged with the session generation
#[derive(Debug)]
pub enum LinkEvent {
    /// Decoded text, in arrival order
    Chunk { generation: u64, text: String },
    /// The device closed the stream
    Closed { generation: u64 },
    /// The read failed for a reason other than cancellation
    Failed { generation: u64, error: io::Error },
}

impl LinkEvent {
    pub fn generation(&self) -> u64 {
        match self {
            LinkEvent::Chunk { generation, .. }
            | LinkEvent::Closed { generation }
            | LinkEvent::Failed { generation, .. } => *generation,
        }
    }
}

pub struct TransportSession {
    state: ConnectionState,
    generation: u64,
    port_name: Option<String>,
    connected_since: Option<DateTime<Local>>,
    writer: Option<Box<dyn DeviceLink>>,
    cancel: Option<Arc<AtomicBool>>,
    events_tx: mpsc::Sender<LinkEvent>,
}

impl TransportSession {
    pub fn new(events_tx: mpsc::Sender<LinkEvent>) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            generation: 0,
            port_name: None,
            connected_since: None,
            writer: None,
            cancel: None,
            events_tx,
        }
    }

    /// Open `path` and start reading. Must be called from inside a tokio
    /// runtime. An existing connection is closed first.
    pub fn connect(
        &mut self,
        provider: &dyn PortProvider,
        path: &str,
        baud: u32,
    ) -> Result<(), TransportError> {
        self.disconnect();
        self.state = ConnectionState::Connecting;
        log::info!("Connecting to {} at {} baud", path, baud);

        let link = match provider.open(path, baud) {
            Ok(link) => link,
            Err(e) => {
                self.state = ConnectionState::Disconnected;
                return Err(e);
            }
        };
        let reader = match link.try_clone_link() {
            Ok(reader) => reader,
            Err(e) => {
                self.state = ConnectionState::Disconnected;
                return Err(TransportError::connect_failed(path, e));
            }
        };

        self.generation += 1;
        let cancel = Arc::new(AtomicBool::new(false));
        let generation = self.generation;
        let events_tx = self.events_tx.clone();
        let cancel_for_reader = cancel.clone();

        tokio::task::spawn_blocking(move || {
            read_loop(reader, generation, cancel_for_reader, events_tx)
        });

        self.writer = Some(link);
        self.cancel = Some(cancel);
        self.port_name = Some(path.to_string());
        self.connected_since = Some(Local::now());
        self.state = ConnectionState::Connected;
        log::info!("Connected to {}", path);
        Ok(())
    }

    /// Stop reading and release the port. Safe to call at any time; returns
    /// whether a connection was actually closed.
    pub fn disconnect(&mut self) -> bool {
        if let Some(cancel) = self.cancel.take() {
            cancel.store(true, Ordering::Release);
        }
        let was_connected = self.writer.take().is_some();

        self.state = ConnectionState::Disconnected;
        self.connected_since = None;
        if was_connected {
            log::info!(
                "Disconnected from {}",
                self.port_name.as_deref().unwrap_or("device")
            );
        }
        was_connected
    }

    /// Write `command` followed by a newline. A failed write tears the
    /// session down.
    pub fn send(&mut self, command: &str) -> Result<(), TransportError> {
        let writer = self.writer.as_mut().ok_or(TransportError::NotConnected)?;

        let line = format!("{}\n", command.trim_end());
        let result = writer
            .write_all(line.as_bytes())
            .and_then(|_| writer.flush());

        match result {
            Ok(()) => {
                log::debug!("Sent {:?}", line);
                Ok(())
            }
            Err(e) => {
                self.disconnect();
                Err(TransportError::Write(e))
            }
        }
    }

    /// Whether an event comes from the live session
    pub fn is_current(&self, event: &LinkEvent) -> bool {
        self.state == ConnectionState::Connected && event.generation() == self.generation
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    pub fn port_name(&self) -> Option<&str> {
        self.port_name.as_deref()
    }

    pub fn connected_since(&self) -> Option<DateTime<Local>> {
        self.connected_since
    }
}

impl Drop for TransportSession {
    fn drop(&mut self) {
        self.disconnect();
    }
}

fn read_loop(
    mut link: Box<dyn DeviceLink>,
    generation: u64,
    cancel: Arc<AtomicBool>,
    events_tx: mpsc::Sender<LinkEvent>,
) {
    let mut decoder = Utf8Decoder::default();
    let mut buf = [0u8; READ_BUFFER_SIZE];

    loop {
        if cancel.load(Ordering::Acquire) {
            log::debug!("Reader {} cancelled", generation);
            return;
        }

        let event = match link.read(&mut buf) {
            Ok(0) => LinkEvent::Closed { generation },
            Ok(n) => {
                let text = decoder.decode(&buf[..n]);
                if text.is_empty() {
                    continue;
                }
                LinkEvent::Chunk { generation, text }
            }
            Err(e) if is_idle(&e) => continue,
            Err(error) => LinkEvent::Failed { generation, error },
        };

        // Nothing is delivered after a disconnect, and errors caused by our
        // own teardown are not failures
        if cancel.load(Ordering::Acquire) {
            return;
        }
        let terminal = !matches!(event, LinkEvent::Chunk { .. });
        if events_tx.blocking_send(event).is_err() || terminal {
            return;
        }
    }
}

fn is_idle(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
    )
}

/// Incremental UTF-8 decoding. Multi-byte sequences cut by a read boundary
/// are held until the rest arrives; invalid bytes become U+FFFD.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    pub fn decode(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);
        let mut out = String::new();

        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(text) => {
                    out.push_str(text);
                    self.pending.clear();
                    break;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&self.pending[..valid]));
                    match e.error_len() {
                        // Truncated sequence at the end, wait for more bytes
                        None => {
                            self.pending.drain(..valid);
                            break;
                        }
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            self.pending.drain(..valid + len);
                        }
                    }
                }
            }
        }

        out
    }
}
