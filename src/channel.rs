//! A serial connection drained by a background reader.
//!
//! Opening a [`SerialChannel`] configures the device for raw transfers and
//! spawns one thread that keeps reading it. Whatever that thread receives is
//! queued, one [`Chunk`] per read, until the consumer collects it with
//! [`SerialChannel::drain`]. The consumer never waits on the device.
//!
//! ```text
//!        open() ok
//!   .--------------.        .-----------.
//!   | Disconnected |------->| Connected |
//!   '--------------'        '-----------'
//!          ^                      |
//!          '----------------------'
//!             close() / drop
//! ```
//!
//! Shutting down always follows the same order: raise the stop flag, join the
//! reader, then release the device. The device is moved into the reader
//! thread and only comes back through the join, so it cannot be released
//! while a read is still in flight.
//!
//! **Example**
//! ```no_run
//! use sesamo::{baud, SerialChannel};
//!
//! let mut channel = SerialChannel::open("/dev/ttyUSB0", baud::lookup("115200")?)?;
//! let text = channel.drain_text();
//! print!("{}", text);
//! channel.close();
//! # Ok::<(), sesamo::ChannelError>(())
//! ```

mod buffer;
mod device;
mod error;
mod reader;

use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, PoisonError,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use log::{info, warn};

use crate::{baud::BaudRate, settings::Settings};

pub use buffer::Chunk;
pub use error::{ChannelError, ReadFailure};
pub use reader::ByteSource;

use reader::{read_loop, Shared};

// =============================================================================
// Public Interface
// =============================================================================

/// Timing knobs for a channel. The defaults match [`Settings`] defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelOptions {
    /// Longest time a single device read waits for the first byte.
    pub read_timeout: Duration,
    /// Pause between two reads of the background reader.
    pub poll_interval: Duration,
}

impl Default for ChannelOptions {
    fn default() -> Self {
        ChannelOptions {
            read_timeout: Duration::from_secs(1),
            poll_interval: Duration::from_millis(1),
        }
    }
}

impl From<&Settings> for ChannelOptions {
    fn from(settings: &Settings) -> Self {
        ChannelOptions {
            read_timeout: settings.read_timeout,
            poll_interval: settings.poll_interval,
        }
    }
}

/// One open serial connection and the thread reading it.
pub struct SerialChannel {
    shared: Arc<Shared>,
    connected: AtomicBool,
    reader: Option<JoinHandle<ByteSource>>,
}

impl SerialChannel {
    /// Open `path` at `baud_rate` with the default [`ChannelOptions`].
    pub fn open(path: &str, baud_rate: BaudRate) -> Result<Self, ChannelError> {
        Self::open_with(path, baud_rate, ChannelOptions::default())
    }

    /// Open `path` at `baud_rate`, put it in raw mode and start reading.
    ///
    /// Either the channel comes back connected or an error is returned and
    /// nothing is left open.
    pub fn open_with(
        path: &str,
        baud_rate: BaudRate,
        options: ChannelOptions,
    ) -> Result<Self, ChannelError> {
        let file = device::open_raw(path, baud_rate, options.read_timeout)?;
        let channel = Self::from_source(path, Box::new(file), options)?;
        info!("Connected to {} at {:?}", path, baud_rate);
        Ok(channel)
    }

    /// Start a channel over an already prepared byte source.
    ///
    /// `name` only identifies the source in logs and errors. If the reader
    /// thread cannot be started, the source is dropped and
    /// [`ChannelError::Spawn`] is returned.
    pub fn from_source(
        name: &str,
        source: ByteSource,
        options: ChannelOptions,
    ) -> Result<Self, ChannelError> {
        Self::start(thread::Builder::new(), name, source, options)
    }

    fn start(
        builder: thread::Builder,
        name: &str,
        source: ByteSource,
        options: ChannelOptions,
    ) -> Result<Self, ChannelError> {
        let shared = Arc::new(Shared::new(name));
        let reader = {
            let shared = Arc::clone(&shared);
            builder
                .name(format!("reader {}", name))
                .spawn(move || read_loop(source, shared, options.poll_interval))
        };

        // A failed spawn drops the closure, and the source with it.
        let reader = reader.map_err(|source| {
            warn!("could not start reader for {}: {}", name, source);
            ChannelError::Spawn {
                path: name.to_owned(),
                source,
            }
        })?;

        Ok(SerialChannel {
            shared,
            connected: AtomicBool::new(true),
            reader: Some(reader),
        })
    }

    /// The device path (or source name) this channel reads from.
    pub fn path(&self) -> &str {
        &self.shared.path
    }

    /// `true` from a successful open until [`close`](Self::close).
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// `true` while the background reader is still producing data.
    ///
    /// A connected channel whose reader hit a read error reports `false`
    /// here; the error itself is available from
    /// [`take_failure`](Self::take_failure).
    pub fn is_receiving(&self) -> bool {
        self.is_connected() && self.shared.running.load(Ordering::Acquire)
    }

    /// `true` if [`drain`](Self::drain) would return something.
    pub fn has_data(&self) -> bool {
        !self.shared.buffer.is_empty()
    }

    /// Take every chunk received since the previous call, oldest first.
    ///
    /// Never waits on the device. An empty result just means nothing new
    /// arrived.
    pub fn drain(&self) -> Vec<Chunk> {
        self.shared.buffer.drain()
    }

    /// [`drain`](Self::drain), concatenated and decoded as UTF-8 (invalid
    /// sequences are replaced).
    pub fn drain_text(&self) -> String {
        String::from_utf8_lossy(&self.drain().concat()).into_owned()
    }

    /// The error that stopped the background reader, if any. Returned once.
    pub fn take_failure(&self) -> Option<ReadFailure> {
        self.shared
            .failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Stop the reader, wait for it, then release the device.
    ///
    /// Blocks for at most about one read timeout. Calling it on a channel
    /// that is already closed does nothing.
    pub fn close(&mut self) {
        if !self.connected.swap(false, Ordering::AcqRel) {
            return;
        }

        self.shared.stop.store(true, Ordering::Release);
        if let Some(reader) = self.reader.take() {
            match reader.join() {
                // Dropping the source closes the device.
                Ok(source) => drop(source),
                Err(_) => warn!("reader for {} panicked", self.shared.path),
            }
        }
        info!("Disconnected from {}", self.shared.path);
    }
}

impl Drop for SerialChannel {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for SerialChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerialChannel")
            .field("path", &self.shared.path)
            .field("connected", &self.is_connected())
            .field("receiving", &self.is_receiving())
            .finish()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::{
        io::{self, ErrorKind, Read},
        sync::{
            atomic::AtomicUsize,
            mpsc::{self, Receiver},
        },
        time::Instant,
    };

    fn quick() -> ChannelOptions {
        ChannelOptions {
            read_timeout: Duration::from_millis(100),
            poll_interval: Duration::from_millis(1),
        }
    }

    /// Hands out whatever the test sends, `Ok(0)` after a short wait when
    /// there is nothing.
    struct Scripted(Receiver<io::Result<Vec<u8>>>);
    impl Read for Scripted {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.0.recv_timeout(Duration::from_millis(20)) {
                Ok(Ok(bytes)) => {
                    buf[..bytes.len()].copy_from_slice(&bytes);
                    Ok(bytes.len())
                }
                Ok(Err(e)) => Err(e),
                Err(_) => Ok(0),
            }
        }
    }

    /// Idle source that records when it is dropped.
    struct Tracked(Arc<AtomicBool>);
    impl Read for Tracked {
        fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
            thread::sleep(Duration::from_millis(5));
            Ok(0)
        }
    }
    impl Drop for Tracked {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    fn wait_for<F: Fn() -> bool>(condition: F) {
        let deadline = Instant::now() + Duration::from_secs(2);
        while !condition() {
            assert!(Instant::now() < deadline, "condition not reached in time");
            thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn drain_after_appends_returns_them_in_order() {
        let (tx, rx) = mpsc::channel();
        let channel = SerialChannel::from_source("scripted", Box::new(Scripted(rx)), quick())
            .unwrap();

        for chunk in [&b"one "[..], &b"two "[..], &b"three"[..]] {
            tx.send(Ok(chunk.to_vec())).unwrap();
        }
        wait_for(|| channel.shared.buffer.len() == 3);

        let chunks = channel.drain();
        assert_eq!(chunks.concat(), b"one two three");
        assert!(channel.drain().is_empty());
    }

    #[test]
    fn drain_between_chunks() {
        let (tx, rx) = mpsc::channel();
        let channel = SerialChannel::from_source("scripted", Box::new(Scripted(rx)), quick())
            .unwrap();

        tx.send(Ok(b"A".to_vec())).unwrap();
        wait_for(|| channel.has_data());
        let first = channel.drain();

        tx.send(Ok(b"B".to_vec())).unwrap();
        wait_for(|| channel.has_data());
        let second = channel.drain();

        assert_eq!(first, vec![b"A".to_vec()]);
        assert_eq!(second, vec![b"B".to_vec()]);
    }

    #[test]
    fn close_twice_is_harmless() {
        let (_tx, rx) = mpsc::channel();
        let mut channel = SerialChannel::from_source("scripted", Box::new(Scripted(rx)), quick())
            .unwrap();
        assert!(channel.is_connected());

        channel.close();
        assert!(!channel.is_connected());
        channel.close();
        assert!(!channel.is_connected());
        assert!(!channel.is_receiving());
    }

    #[test]
    fn no_reads_after_close() {
        struct Counting(Arc<AtomicUsize>);
        impl Read for Counting {
            fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
                self.0.fetch_add(1, Ordering::SeqCst);
                buf[0] = b'x';
                Ok(1)
            }
        }

        let reads = Arc::new(AtomicUsize::new(0));
        let mut channel = SerialChannel::from_source(
            "counting",
            Box::new(Counting(Arc::clone(&reads))),
            quick(),
        )
        .unwrap();
        wait_for(|| reads.load(Ordering::SeqCst) > 3);

        channel.close();
        let after_close = reads.load(Ordering::SeqCst);
        channel.drain();

        thread::sleep(Duration::from_millis(50));
        assert_eq!(reads.load(Ordering::SeqCst), after_close);
        assert!(channel.drain().is_empty());
    }

    #[test]
    fn close_releases_the_source() {
        let dropped = Arc::new(AtomicBool::new(false));
        let channel = SerialChannel::from_source(
            "tracked",
            Box::new(Tracked(Arc::clone(&dropped))),
            quick(),
        )
        .unwrap();
        assert!(!dropped.load(Ordering::SeqCst));
        // Implicit close.
        drop(channel);
        assert!(dropped.load(Ordering::SeqCst));
    }

    #[test]
    fn read_failure_keeps_channel_connected() {
        let (tx, rx) = mpsc::channel();
        let mut channel = SerialChannel::from_source("scripted", Box::new(Scripted(rx)), quick())
            .unwrap();

        tx.send(Ok(b"last words".to_vec())).unwrap();
        tx.send(Err(io::Error::new(ErrorKind::Other, "device gone")))
            .unwrap();
        wait_for(|| !channel.is_receiving());

        assert!(channel.is_connected());
        assert_eq!(channel.drain_text(), "last words");
        let failure = channel.take_failure().unwrap();
        assert_eq!(failure.path, "scripted");
        assert!(channel.take_failure().is_none());

        channel.close();
        assert!(!channel.is_connected());
    }

    #[test]
    fn close_is_bounded_by_the_read_timeout() {
        struct Slow;
        impl Read for Slow {
            fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
                thread::sleep(Duration::from_millis(100));
                Ok(0)
            }
        }

        let mut channel = SerialChannel::from_source("slow", Box::new(Slow), quick()).unwrap();
        thread::sleep(Duration::from_millis(10));
        let start = Instant::now();
        channel.close();
        assert!(start.elapsed() < Duration::from_millis(500));
    }

    // A stack this large cannot be mapped, so the spawn itself fails.
    #[cfg(target_pointer_width = "64")]
    #[test]
    fn failed_spawn_is_an_error_and_releases_the_source() {
        let dropped = Arc::new(AtomicBool::new(false));
        let result = SerialChannel::start(
            thread::Builder::new().stack_size(1 << 62),
            "tracked",
            Box::new(Tracked(Arc::clone(&dropped))),
            quick(),
        );

        match result {
            Err(ChannelError::Spawn { path, .. }) => assert_eq!(path, "tracked"),
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(dropped.load(Ordering::SeqCst));
    }
}
