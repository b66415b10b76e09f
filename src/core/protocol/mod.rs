//! Device wire protocol: line classification, chunk splitting and host commands.

mod classifier;
mod command;
mod splitter;

pub use classifier::{classify, parse_lenient, DeviceEvent, FullReport, PartialReport};
pub use command::DeviceCommand;
pub use splitter::{split_chunk, LineAssembler};
