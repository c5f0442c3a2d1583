//! Opening a tty device and switching it to raw mode.

use std::{
    fs::{File, OpenOptions},
    os::unix::fs::OpenOptionsExt,
    time::Duration,
};

use log::debug;
use nix::{
    fcntl::OFlag,
    sys::termios::{
        cfsetispeed, cfsetospeed, tcgetattr, tcsetattr, BaudRate, ControlFlags, InputFlags,
        LocalFlags, OutputFlags, SetArg, SpecialCharacterIndices, Termios,
    },
};

use super::ChannelError;

//==============================================================================
// Crate-Public Interface
//==============================================================================

/// Open `path` and configure it for raw 8N1 transfers at `baud_rate`.
///
/// Reads on the returned file wait at most `read_timeout` for the first byte
/// and return `Ok(0)` when nothing arrived. Any error after the `open` itself
/// drops the file before returning, so the descriptor never outlives a failed
/// call.
pub(crate) fn open_raw(
    path: &str,
    baud_rate: BaudRate,
    read_timeout: Duration,
) -> Result<File, ChannelError> {
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .custom_flags((OFlag::O_NOCTTY | OFlag::O_SYNC).bits())
        .open(path)
        .map_err(|source| ChannelError::Open {
            path: path.to_owned(),
            source,
        })?;

    configure(file, path, baud_rate, read_timeout, |file, tty| {
        tcsetattr(file, SetArg::TCSANOW, tty)
    })
}

//==============================================================================
// Private stuff
//==============================================================================

/// Read, adjust and commit the attributes of an open device. `commit` writes
/// the adjusted attributes back. `file` is consumed, so every error return
/// closes it.
fn configure<F>(
    file: File,
    path: &str,
    baud_rate: BaudRate,
    read_timeout: Duration,
    commit: F,
) -> Result<File, ChannelError>
where
    F: FnOnce(&File, &Termios) -> nix::Result<()>,
{
    let mut tty = tcgetattr(&file).map_err(|source| ChannelError::ConfigRead {
        path: path.to_owned(),
        source,
    })?;

    make_raw(&mut tty, baud_rate, read_timeout).map_err(|source| ChannelError::ConfigWrite {
        path: path.to_owned(),
        source,
    })?;

    commit(&file, &tty).map_err(|source| ChannelError::ConfigWrite {
        path: path.to_owned(),
        source,
    })?;

    debug!("baud rate    : {:?}", baud_rate);
    debug!("control      : {:?}", tty.control_flags);
    debug!("VMIN / VTIME : 0 / {}", vtime(read_timeout));

    Ok(file)
}

fn make_raw(tty: &mut Termios, baud_rate: BaudRate, read_timeout: Duration) -> nix::Result<()> {
    cfsetospeed(tty, baud_rate)?;
    cfsetispeed(tty, baud_rate)?;

    // Ignore modem control lines, 8N1, no hardware flow control.
    tty.control_flags |= ControlFlags::CLOCAL | ControlFlags::CREAD;
    tty.control_flags &= !ControlFlags::CSIZE;
    tty.control_flags |= ControlFlags::CS8;
    tty.control_flags &= !ControlFlags::PARENB;
    tty.control_flags &= !ControlFlags::CSTOPB;
    tty.control_flags &= !ControlFlags::CRTSCTS;

    // Non-canonical mode
    tty.input_flags &= !(InputFlags::IGNBRK
        | InputFlags::BRKINT
        | InputFlags::PARMRK
        | InputFlags::ISTRIP
        | InputFlags::INLCR
        | InputFlags::IGNCR
        | InputFlags::ICRNL
        | InputFlags::IXON);
    tty.local_flags &= !(LocalFlags::ECHO
        | LocalFlags::ECHONL
        | LocalFlags::ICANON
        | LocalFlags::ISIG
        | LocalFlags::IEXTEN);
    tty.output_flags &= !OutputFlags::OPOST;

    // Return whatever is there once the inter-byte timer expires.
    tty.control_chars[SpecialCharacterIndices::VMIN as usize] = 0;
    tty.control_chars[SpecialCharacterIndices::VTIME as usize] = vtime(read_timeout);

    Ok(())
}

/// `VTIME` counts tenths of a second in a single byte.
fn vtime(timeout: Duration) -> u8 {
    let deciseconds = timeout.as_millis() / 100;
    deciseconds.min(u128::from(u8::MAX)) as u8
}

//==============================================================================
// Unit Tests
//==============================================================================

#[test]
fn vtime_in_deciseconds() {
    assert_eq!(vtime(Duration::from_secs(1)), 10);
    assert_eq!(vtime(Duration::from_millis(250)), 2);
    assert_eq!(vtime(Duration::from_millis(0)), 0);
}

#[test]
fn vtime_saturates() {
    assert_eq!(vtime(Duration::from_secs(60)), u8::MAX);
}

#[test]
fn missing_device_is_an_open_error() {
    let result = open_raw("/dev/sesamo-does-not-exist", BaudRate::B9600, Duration::from_secs(1));
    assert!(matches!(result, Err(ChannelError::Open { .. })));
}

#[test]
fn non_tty_is_a_config_read_error() {
    let dir = crate::tests_support::Scratch::new();
    let file = dir.touch("not-a-tty");
    let result = open_raw(file.to_str().unwrap(), BaudRate::B9600, Duration::from_secs(1));
    assert!(matches!(result, Err(ChannelError::ConfigRead { .. })));
}

#[cfg(target_os = "linux")]
#[test]
fn pty_is_made_raw() {
    use nix::pty::openpty;

    let pty = openpty(None, None).unwrap();
    let slave = crate::tests_support::pty_path(&pty.slave);
    let file = open_raw(&slave, BaudRate::B19200, Duration::from_secs(1)).unwrap();

    let tty = tcgetattr(&file).unwrap();
    assert!(!tty.local_flags.contains(LocalFlags::ICANON));
    assert!(!tty.local_flags.contains(LocalFlags::ECHO));
    assert!(!tty.output_flags.contains(OutputFlags::OPOST));
    assert!(tty.control_flags.contains(ControlFlags::CS8 | ControlFlags::CREAD));
    assert_eq!(tty.control_chars[SpecialCharacterIndices::VMIN as usize], 0);
    assert_eq!(tty.control_chars[SpecialCharacterIndices::VTIME as usize], 10);
    assert_eq!(nix::sys::termios::cfgetospeed(&tty), BaudRate::B19200);
}

#[cfg(target_os = "linux")]
#[test]
fn rejected_attributes_are_a_config_write_error_and_close_the_device() {
    use nix::{errno::Errno, pty::openpty};

    let pty = openpty(None, None).unwrap();
    let slave = crate::tests_support::pty_path(&pty.slave);
    let handles = || crate::tests_support::open_handles(&slave);
    let before = handles();

    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .custom_flags(OFlag::O_NOCTTY.bits())
        .open(&slave)
        .unwrap();
    assert_eq!(handles(), before + 1);

    let result = configure(file, &slave, BaudRate::B9600, Duration::from_secs(1), |_, _| {
        Err(Errno::EIO)
    });
    match result {
        Err(ChannelError::ConfigWrite { path, source }) => {
            assert_eq!(path, slave);
            assert_eq!(source, Errno::EIO);
        }
        other => panic!("unexpected result: {:?}", other),
    }
    assert_eq!(handles(), before);
}
