//! Per-session output buffering and eviction.
//!
//! Output is never blocked on a slow/absent consumer; instead each session
//! keeps a bounded ring of recent chunks so a pane that reattaches after a
//! while (tab switch, window restore) can replay what it missed. When a
//! session's own budget is exceeded, its oldest chunks are dropped. When
//! the process-wide ceiling is exceeded, `Session Host` evicts from
//! non-visible sessions first, oldest-non-visible-session first.

use std::collections::VecDeque;
use std::time::Instant;

pub(crate) struct OutputBuffer {
    chunks: VecDeque<Vec<u8>>,
    bytes: usize,
    max_bytes: usize,
    max_chunks: usize,
    /// Set by the adapter via `Session Host::set_visible`. Used only to
    /// pick eviction order under the process-wide ceiling.
    visible: bool,
    /// When this session last became non-visible (or was created, if it
    /// has never been visible). Used to break ties among non-visible
    /// sessions: the one that has been hidden longest is evicted first.
    non_visible_since: Instant,
}

impl OutputBuffer {
    pub(crate) fn new(max_bytes: usize, max_chunks: usize) -> Self {
        Self { chunks: VecDeque::new(), bytes: 0, max_bytes, max_chunks, visible: true, non_visible_since: Instant::now() }
    }

    pub(crate) fn set_visible(&mut self, visible: bool) {
        if self.visible && !visible {
            self.non_visible_since = Instant::now();
        }
        self.visible = visible;
    }

    pub(crate) fn is_visible(&self) -> bool {
        self.visible
    }

    pub(crate) fn non_visible_since(&self) -> Instant {
        self.non_visible_since
    }

    pub(crate) fn total_bytes(&self) -> usize {
        self.bytes
    }

    /// Append a chunk, evicting the oldest chunks first if the per-session
    /// budget is exceeded. Never reorders what remains.
    pub(crate) fn push(&mut self, chunk: Vec<u8>) {
        self.bytes += chunk.len();
        self.chunks.push_back(chunk);
        self.enforce_local_limits();
    }

    fn enforce_local_limits(&mut self) {
        while self.bytes > self.max_bytes || self.chunks.len() > self.max_chunks {
            match self.chunks.pop_front() {
                Some(dropped) => self.bytes -= dropped.len(),
                None => break,
            }
        }
    }

    /// Drop the single oldest chunk, used by the process-wide eviction
    /// pass. Returns how many bytes were freed.
    pub(crate) fn evict_oldest(&mut self) -> usize {
        match self.chunks.pop_front() {
            Some(dropped) => {
                self.bytes -= dropped.len();
                dropped.len()
            }
            None => 0,
        }
    }

    pub(crate) fn snapshot(&self) -> Vec<u8> {
        self.chunks.iter().flatten().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_drops_oldest_when_byte_budget_exceeded() {
        let mut buf = OutputBuffer::new(10, 1000);
        buf.push(vec![0u8; 6]);
        buf.push(vec![1u8; 6]);
        assert_eq!(buf.total_bytes(), 6);
        assert_eq!(buf.snapshot(), vec![1u8; 6]);
    }

    #[test]
    fn push_drops_oldest_when_chunk_budget_exceeded() {
        let mut buf = OutputBuffer::new(1000, 2);
        buf.push(b"a".to_vec());
        buf.push(b"b".to_vec());
        buf.push(b"c".to_vec());
        assert_eq!(buf.snapshot(), b"bc".to_vec());
    }

    #[test]
    fn eviction_never_reorders_remaining_bytes() {
        let mut buf = OutputBuffer::new(1000, 1000);
        for i in 0..5u8 {
            buf.push(vec![i]);
        }
        assert_eq!(buf.snapshot(), vec![0, 1, 2, 3, 4]);
    }
}
