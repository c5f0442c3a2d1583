//! The background reader draining a device into the shared buffer.

use std::{
    io::{ErrorKind, Read},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, PoisonError,
    },
    thread,
    time::Duration,
};

use hexplay::HexViewBuilder;
use log::{debug, error, log_enabled, trace, Level::Debug};

use super::{buffer::ChunkBuffer, ReadFailure};

/// Largest chunk produced by a single read.
pub(crate) const READ_SIZE: usize = 256;

/// Anything the reader can pull bytes from.
///
/// A configured tty is the usual source. Reads are expected to give up after
/// a bounded time and return `Ok(0)` when nothing arrived.
pub type ByteSource = Box<dyn Read + Send>;

/// State shared by the reader thread and the channel that owns it.
#[derive(Debug)]
pub(crate) struct Shared {
    pub(crate) path: String,
    pub(crate) buffer: ChunkBuffer,
    pub(crate) stop: AtomicBool,
    pub(crate) running: AtomicBool,
    pub(crate) failure: Mutex<Option<ReadFailure>>,
}

impl Shared {
    pub(crate) fn new(path: &str) -> Self {
        Shared {
            path: path.to_owned(),
            buffer: ChunkBuffer::new(),
            stop: AtomicBool::new(false),
            running: AtomicBool::new(true),
            failure: Mutex::new(None),
        }
    }

    fn fail(&self, failure: ReadFailure) {
        *self.failure.lock().unwrap_or_else(PoisonError::into_inner) = Some(failure);
    }
}

/// Read from `source` until asked to stop or until a read fails.
///
/// The source is handed back when the loop ends so that the owner decides
/// when it is released; it is never dropped while a read may be in flight.
pub(crate) fn read_loop(
    mut source: ByteSource,
    shared: Arc<Shared>,
    poll_interval: Duration,
) -> ByteSource {
    let mut buf = [0u8; READ_SIZE];

    while !shared.stop.load(Ordering::Acquire) {
        match source.read(&mut buf) {
            Ok(0) => {}
            Ok(n) => {
                trace!("{} bytes from {}", n, shared.path);
                if log_enabled!(Debug) {
                    let view = HexViewBuilder::new(&buf[..n])
                        .address_offset(0)
                        .row_width(16)
                        .finish();
                    debug!("\n{}", view);
                }
                shared.buffer.push(buf[..n].to_vec());
            }
            Err(ref e) if e.kind() == ErrorKind::Interrupted => {}
            Err(source_err) => {
                error!(
                    "failed to read from serial port {}: {}",
                    shared.path, source_err
                );
                shared.fail(ReadFailure {
                    path: shared.path.clone(),
                    source: source_err,
                });
                break;
            }
        }

        thread::sleep(poll_interval);
    }

    shared.running.store(false, Ordering::Release);
    source
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::{self, Cursor};

    struct Broken;
    impl Read for Broken {
        fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(ErrorKind::BrokenPipe, "unplugged"))
        }
    }

    #[test]
    fn failure_ends_the_loop_and_is_recorded() {
        let shared = Arc::new(Shared::new("/dev/ttyTEST"));
        read_loop(Box::new(Broken), Arc::clone(&shared), Duration::from_millis(1));

        assert!(!shared.running.load(Ordering::Acquire));
        let failure = shared.failure.lock().unwrap().take().unwrap();
        assert_eq!(failure.source.kind(), ErrorKind::BrokenPipe);
        assert_eq!(failure.path, "/dev/ttyTEST");
    }

    #[test]
    fn reads_are_split_into_chunks() {
        struct ThenFail(Cursor<Vec<u8>>);
        impl Read for ThenFail {
            fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
                match self.0.read(buf)? {
                    0 => Err(io::Error::new(ErrorKind::UnexpectedEof, "done")),
                    n => Ok(n),
                }
            }
        }

        let data: Vec<u8> = (0..=255u8).chain(0..10u8).collect();
        let shared = Arc::new(Shared::new("/dev/ttyTEST"));
        read_loop(
            Box::new(ThenFail(Cursor::new(data.clone()))),
            Arc::clone(&shared),
            Duration::from_millis(0),
        );

        let chunks = shared.buffer.drain();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].len(), READ_SIZE);
        assert_eq!(chunks.concat(), data);
    }

    #[test]
    fn stop_flag_prevents_reads() {
        let shared = Arc::new(Shared::new("/dev/ttyTEST"));
        shared.stop.store(true, Ordering::Release);
        // `Broken` would record a failure if it were read.
        read_loop(Box::new(Broken), Arc::clone(&shared), Duration::from_millis(1));
        assert!(shared.failure.lock().unwrap().is_none());
        assert!(shared.buffer.is_empty());
    }
}
