//! Listing the serial devices offered for selection.

use std::{fs, io, path::Path};

use log::{debug, trace};

/// Default directory scanned for devices.
pub const DEVICE_ROOT: &str = "/dev";

/// Name prefix every candidate device must carry.
pub const DEVICE_PREFIX: &str = "tty";

/// List the candidate serial devices directly under `root`, sorted.
///
/// A path is kept when it starts with `<root>/tty` and what follows that
/// prefix contains at least one character other than an ASCII digit. So
/// `ttyUSB0` and `ttyS` are listed while `tty0` and a bare `tty` are not.
///
/// An unreadable `root` is an error; a readable one without candidates gives
/// an empty list.
pub fn list_devices<P: AsRef<Path>>(root: P) -> io::Result<Vec<String>> {
    let root = root.as_ref();
    let prefix = root.join(DEVICE_PREFIX).to_string_lossy().into_owned();

    let mut devices = vec![];
    for entry in fs::read_dir(root)? {
        let path = entry?.path().to_string_lossy().into_owned();
        if is_candidate(&path, &prefix) {
            devices.push(path);
        } else {
            trace!("skipping {}", path);
        }
    }
    devices.sort();

    debug!("{} candidate devices under {}", devices.len(), root.display());
    Ok(devices)
}

fn is_candidate(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(suffix) => suffix.chars().any(|c| !c.is_ascii_digit()),
        None => false,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
