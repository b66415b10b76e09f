//! In-memory serial link and port provider shared by the session and
//! runtime suites.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use smartbin::core::transport::{DeviceLink, PortInfo, PortProvider};
use smartbin::TransportError;

/// One scripted outcome of a `read` call
#[derive(Debug)]
pub enum ReadStep {
    Data(Vec<u8>),
    Eof,
    Fail(io::ErrorKind),
}

#[derive(Debug, Default)]
pub struct Wire {
    pub reads: VecDeque<ReadStep>,
    pub written: Vec<u8>,
}

/// Both ends of a fake serial line: the test scripts reads and inspects
/// writes through the shared `Wire`.
#[derive(Debug, Clone, Default)]
pub struct MockLink {
    pub wire: Arc<Mutex<Wire>>,
}

impl MockLink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_text(&self, text: &str) {
        self.wire
            .lock()
            .reads
            .push_back(ReadStep::Data(text.as_bytes().to_vec()));
    }

    pub fn push(&self, step: ReadStep) {
        self.wire.lock().reads.push_back(step);
    }

    pub fn written(&self) -> String {
        String::from_utf8_lossy(&self.wire.lock().written).into_owned()
    }
}

impl Read for MockLink {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let step = self.wire.lock().reads.pop_front();
        match step {
            Some(ReadStep::Data(mut data)) => {
                let n = data.len().min(buf.len());
                buf[..n].copy_from_slice(&data[..n]);
                if n < data.len() {
                    data.drain(..n);
                    self.wire.lock().reads.push_front(ReadStep::Data(data));
                }
                Ok(n)
            }
            Some(ReadStep::Eof) => Ok(0),
            Some(ReadStep::Fail(kind)) => Err(io::Error::new(kind, "scripted failure")),
            None => {
                // Behave like a port with a read timeout
                std::thread::sleep(Duration::from_millis(5));
                Err(io::Error::new(io::ErrorKind::TimedOut, "no data"))
            }
        }
    }
}

impl Write for MockLink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.wire.lock().written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl DeviceLink for MockLink {
    fn try_clone_link(&self) -> io::Result<Box<dyn DeviceLink>> {
        Ok(Box::new(self.clone()))
    }
}

/// Hands out the same link on every open and counts the opens
#[derive(Debug, Default)]
pub struct MockProvider {
    pub link: MockLink,
    pub opens: AtomicUsize,
    pub refuse: bool,
}

impl MockProvider {
    pub fn new(link: MockLink) -> Self {
        Self {
            link,
            opens: AtomicUsize::new(0),
            refuse: false,
        }
    }

    pub fn refusing() -> Self {
        Self {
            refuse: true,
            ..Self::default()
        }
    }

    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

impl PortProvider for MockProvider {
    fn available(&self) -> Result<Vec<PortInfo>, TransportError> {
        Ok(vec![PortInfo {
            name: "/dev/mock0".to_string(),
            description: "USB mock".to_string(),
        }])
    }

    fn open(&self, path: &str, _baud: u32) -> Result<Box<dyn DeviceLink>, TransportError> {
        if self.refuse {
            return Err(TransportError::connect_failed(path, "permission denied"));
        }
        self.opens.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(self.link.clone()))
    }
}
