//! Fusion buffer for constant byte runs.
//!
//! Generators append every emission whose bytes are known at generation time
//! here instead of writing it out. The run is flushed as a single literal
//! right before the next runtime-dependent emission, before any control-flow
//! boundary, and at the end of each generated function. Whether runs are
//! merged never changes the bytes the encoder produces; it only changes how
//! many append statements are written.

/// Accumulator for consecutive constant emissions.
#[derive(Debug, Clone, Default)]
pub struct FusionBuffer {
    pending: Vec<u8>,
}

impl FusionBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append constant bytes to the pending run.
    pub fn append(&mut self, bytes: &[u8]) {
        self.pending.extend_from_slice(bytes);
    }

    /// Take the pending run, leaving the buffer empty.
    ///
    /// Returns `None` when nothing is pending.
    pub fn flush(&mut self) -> Option<Vec<u8>> {
        if self.pending.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.pending))
        }
    }

    /// Drop the pending run without emitting it.
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Pending bytes.
    pub fn pending(&self) -> &[u8] {
        &self.pending
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
