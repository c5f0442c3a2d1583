//! The buffer shared between the background reader and the consumer.

use std::{
    mem,
    sync::{Mutex, MutexGuard, PoisonError},
};

/// Bytes delivered by one successful device read.
pub type Chunk = Vec<u8>;

/// Ordered, lock-protected list of received chunks.
///
/// The reader thread appends, the consumer swaps the whole list out. The lock
/// is held only for the push or the swap, never across I/O.
#[derive(Debug, Default)]
pub(crate) struct ChunkBuffer {
    chunks: Mutex<Vec<Chunk>>,
}

impl ChunkBuffer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&self, chunk: Chunk) {
        self.lock().push(chunk);
    }

    /// Take everything received so far, leaving the buffer empty.
    pub(crate) fn drain(&self) -> Vec<Chunk> {
        mem::take(&mut *self.lock())
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }

    // A panic while holding the lock cannot leave the list half-written: both
    // `push` and the swap in `drain` complete or do nothing.
    fn lock(&self) -> MutexGuard<'_, Vec<Chunk>> {
        self.chunks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::{sync::Arc, thread};

    #[test]
    fn drain_returns_chunks_in_append_order() {
        let buffer = ChunkBuffer::new();
        buffer.push(b"he".to_vec());
        buffer.push(b"ll".to_vec());
        buffer.push(b"o\n".to_vec());

        let chunks = buffer.drain();
        assert_eq!(chunks, vec![b"he".to_vec(), b"ll".to_vec(), b"o\n".to_vec()]);
        assert_eq!(chunks.concat(), b"hello\n");
        assert!(buffer.drain().is_empty());
        assert!(buffer.is_empty());
    }

    #[test]
    fn drain_between_appends_splits_them() {
        let buffer = ChunkBuffer::new();
        buffer.push(b"A".to_vec());
        let first = buffer.drain();
        buffer.push(b"B".to_vec());
        let second = buffer.drain();

        assert_eq!(first, vec![b"A".to_vec()]);
        assert_eq!(second, vec![b"B".to_vec()]);
    }

    #[test]
    fn concurrent_writer_loses_nothing() {
        let buffer = Arc::new(ChunkBuffer::new());
        let writer = {
            let buffer = Arc::clone(&buffer);
            thread::spawn(move || {
                for i in 0..1000u32 {
                    buffer.push(i.to_le_bytes().to_vec());
                }
            })
        };

        let mut received = Vec::new();
        while !writer.is_finished() {
            received.extend(buffer.drain());
        }
        writer.join().unwrap();
        received.extend(buffer.drain());

        let values: Vec<u32> = received
            .iter()
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        assert_eq!(values, (0..1000).collect::<Vec<_>>());
    }
}
