//! The fixed table of baud rates offered for selection.
//!
//! Labels are what the operator sees and types; each one resolves to the
//! symbolic speed constant `termios` expects. The table is a plain `static`,
//! so it is built at compile time and never mutated.

pub use nix::sys::termios::BaudRate;

use crate::channel::ChannelError;

// =============================================================================
// Public Interface
// =============================================================================

/// Every selectable baud rate, in ascending order, as `(label, speed)` pairs.
pub static BAUD_RATES: &[(&str, BaudRate)] = &[
    ("0", BaudRate::B0),
    ("50", BaudRate::B50),
    ("75", BaudRate::B75),
    ("110", BaudRate::B110),
    ("134", BaudRate::B134),
    ("150", BaudRate::B150),
    ("200", BaudRate::B200),
    ("300", BaudRate::B300),
    ("600", BaudRate::B600),
    ("1200", BaudRate::B1200),
    ("1800", BaudRate::B1800),
    ("2400", BaudRate::B2400),
    ("4800", BaudRate::B4800),
    ("9600", BaudRate::B9600),
    ("19200", BaudRate::B19200),
    ("38400", BaudRate::B38400),
    ("57600", BaudRate::B57600),
    ("115200", BaudRate::B115200),
    ("230400", BaudRate::B230400),
];

/// The label used when none is configured.
pub const DEFAULT_BAUD_RATE: &str = "9600";

/// Resolve a label from [`BAUD_RATES`] into its speed constant.
///
/// Labels come from user input, so an unknown one is reported as
/// [`ChannelError::UnknownBaudRate`] rather than treated as a bug.
pub fn lookup(label: &str) -> Result<BaudRate, ChannelError> {
    let label = label.trim();
    BAUD_RATES
        .iter()
        .find(|(known, _)| *known == label)
        .map(|(_, speed)| *speed)
        .ok_or_else(|| ChannelError::UnknownBaudRate(label.to_owned()))
}

/// The labels of [`BAUD_RATES`], in table order.
pub fn labels() -> Vec<&'static str> {
    BAUD_RATES.iter().map(|(label, _)| *label).collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[test]
fn lookup_known_label() {
    assert_eq!(lookup("19200").unwrap(), BaudRate::B19200);
    assert_eq!(lookup("0").unwrap(), BaudRate::B0);
}

#[test]
fn lookup_ignores_surrounding_whitespace() {
    assert_eq!(lookup(" 9600\n").unwrap(), BaudRate::B9600);
}

#[test]
fn lookup_unknown_label() {
    match lookup("9601") {
        Err(ChannelError::UnknownBaudRate(label)) => assert_eq!(label, "9601"),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn labels_are_in_ascending_order() {
    let rates: Vec<u32> = labels().iter().map(|l| l.parse().unwrap()).collect();
    let mut sorted = rates.clone();
    sorted.sort_unstable();
    assert_eq!(rates, sorted);
    assert_eq!(labels()[..16].last(), Some(&"38400"));
}

#[test]
fn default_is_in_the_table() {
    assert!(lookup(DEFAULT_BAUD_RATE).is_ok());
}
