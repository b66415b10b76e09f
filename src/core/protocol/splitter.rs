//! Splitting of streamed text into classified lines.

use super::classifier::{classify, DeviceEvent};

/// Longest unterminated fragment kept between reads before it is given up on
const MAX_PENDING_BYTES: usize = 4096;

/// Split one chunk on line feeds, trim every piece, drop the empty ones and
/// classify the rest. Event order follows line order.
///
/// The returned events form one batch for [`StateStore::apply_batch`]. On a
/// live link the runtime batches what [`LineAssembler::push`] returns instead,
/// so the last-full-report rule applies to the lines completed by a read, and
/// a line cut by a read boundary joins the batch of the read that ends it.
///
/// [`StateStore::apply_batch`]: crate::core::bin_monitor::StateStore::apply_batch
pub fn split_chunk(chunk: &str) -> Vec<DeviceEvent> {
    chunk
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(classify)
        .collect()
}

/// Reassembles lines that arrive split across several reads.
///
/// Serial reads return whatever bytes happen to be buffered, so a report can
/// be cut anywhere. Only newline-terminated lines are classified; the
/// trailing fragment waits for the next chunk.
#[derive(Debug, Default)]
pub struct LineAssembler {
    pending: String,
}

impl LineAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and return the events of every line it completes,
    /// including a fragment held over from the previous chunk
    pub fn push(&mut self, chunk: &str) -> Vec<DeviceEvent> {
        self.pending.push_str(chunk);

        let Some(last_newline) = self.pending.rfind('\n') else {
            if self.pending.len() > MAX_PENDING_BYTES {
                log::warn!(
                    "Dropping {} bytes of unterminated serial input",
                    self.pending.len()
                );
                return self.flush();
            }
            return Vec::new();
        };

        let tail = self.pending.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.pending, tail);
        split_chunk(&complete)
    }

    /// Classify whatever is still buffered, e.g. when the link closes
    pub fn flush(&mut self) -> Vec<DeviceEvent> {
        let rest = std::mem::take(&mut self.pending);
        split_chunk(&rest)
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.trim().is_empty()
    }
}
