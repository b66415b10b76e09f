//! Serial transport: port discovery and the session lifecycle.

mod port;
mod session;

pub use port::{DeviceLink, PortInfo, PortProvider, SerialPortProvider, READ_TIMEOUT};
pub use session::{ConnectionState, LinkEvent, TransportSession, Utf8Decoder};
