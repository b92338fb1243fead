//! Newline splitting with cross-read partial-line carry.
//!
//! Filesystem write bursts do not respect line boundaries: a read cycle can
//! end in the middle of a line, and the rest arrives with the next cycle.
//! [`LineAssembler`] buffers that unterminated tail and prefixes it to the
//! first line of the following push, so the engine never emits fragments.

/// Splits incoming byte chunks into complete lines, carrying an unterminated
/// tail between pushes.
#[derive(Debug, Default)]
pub struct LineAssembler {
    pending: Vec<u8>,
}

impl LineAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed newly read bytes and return every line completed by them, in
    /// order. The trailing `\n` (and a `\r` directly before it) is stripped.
    /// Bytes after the last newline are retained for the next push. Non-UTF-8
    /// bytes are lossily converted.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        let mut start = 0;
        while let Some(pos) = chunk[start..].iter().position(|&b| b == b'\n') {
            let end = start + pos;
            let mut line = std::mem::take(&mut self.pending);
            line.extend_from_slice(&chunk[start..end]);
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            lines.push(String::from_utf8_lossy(&line).into_owned());
            start = end + 1;
        }
        self.pending.extend_from_slice(&chunk[start..]);
        lines
    }

    /// Discard any buffered partial line. Used when the watched file is
    /// truncated: the buffered bytes belong to content that no longer exists.
    pub fn reset(&mut self) {
        self.pending.clear();
    }

    /// Whether an unterminated tail is currently buffered.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
