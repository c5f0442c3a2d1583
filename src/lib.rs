//! Sesamo is a small serial terminal: pick a tty device and a baud rate,
//! connect, and watch whatever the other side sends, optionally with a
//! timestamp in front of every line.
//!
//! The heart of the crate is the [`SerialChannel`]. It opens a character
//! device, switches it to raw mode and keeps a background thread reading it,
//! so that the thread driving the display never waits on the device. The
//! display side collects what arrived at its own pace with
//! [`SerialChannel::drain`] and closes the channel when done.
//!
//! ```no_run
//! use sesamo::{baud, ports, SerialChannel};
//!
//! let devices = ports::list_devices(ports::DEVICE_ROOT)?;
//! let mut channel = SerialChannel::open(&devices[0], baud::lookup("9600")?)?;
//! loop {
//!     print!("{}", channel.drain_text());
//!     if !channel.is_receiving() {
//!         break;
//!     }
//!     std::thread::sleep(std::time::Duration::from_millis(50));
//! }
//! channel.close();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! The interactive front-end, used by the `sesamo` binary, is a
//! [`session`] state machine. State machines here follow a few rules:
//!
//! * They can only be in one state at any time.
//! * Each state can have its own associated data if needed, and some data is
//!   shared between **all** states.
//! * Transitions between states are triggered via typed **events** and are
//!   implemented with `From`, so only transitions that are explicitly defined
//!   compile.
//! * Transitioning from one state to another consumes the original state.
//!   Data moves to the next state by being attached to the transition event.

pub mod baud;
pub mod channel;
pub mod ports;
pub mod session;
pub mod transcript;

mod settings;
mod utils;

#[cfg(test)]
mod tests_support;

pub use channel::{ChannelError, ChannelOptions, Chunk, ReadFailure, SerialChannel};
pub use settings::{Settings, SettingsBuilder};
