//! Settings for the serial terminal.
//!
//! Use the [builder](https://doc.rust-lang.org/1.0.0/style/ownership/builders.html)
//! pattern to set the configurable values.

use std::time::Duration;

use crate::{baud::DEFAULT_BAUD_RATE, ports::DEVICE_ROOT};

// =============================================================================
// Public Interface
// =============================================================================

/// Groups all settings of a `sesamo` session and acts as a
/// [builder](https://doc.rust-lang.org/1.0.0/style/ownership/builders.html)
/// for the settings.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Settings {
    /// The device path. When not set, the user picks one of the devices found
    /// under `device_root`.
    pub path: Option<String>,
    /// The baud rate label, one of [`BAUD_RATES`](crate::baud::BAUD_RATES).
    pub baud_rate: String,
    /// Directory scanned for candidate devices.
    pub device_root: String,
    /// Prefix every displayed line with the time it was displayed.
    pub timestamps: bool,
    /// Longest time a single device read waits for data.
    pub read_timeout: Duration,
    /// Pause between two reads of the background reader.
    pub poll_interval: Duration,
    /// How often the terminal collects received data and checks the keyboard.
    pub tick: Duration,
    /// How many more times to try opening the device after a failure.
    pub open_retries: usize,

    /// Restrict creation of `Settings` instances unless through the
    /// `SettingsBuilder`.
    #[doc(hidden)]
    _private_use_builder: (),
}

/// The builder for the `Settings` values.
///
/// All values are optional and have default values that will be used if not
/// explicitly set.
///
/// **Example**
///
/// ```
/// let settings = sesamo::SettingsBuilder::new()
///     .path("/dev/ttyUSB0")
///     .baud_rate("115200")
///     .finalize();
/// assert_eq!(settings.baud_rate, "115200");
/// ```
#[derive(Default)]
pub struct SettingsBuilder {
    settings: Settings,
}
impl SettingsBuilder {
    /// Start building the settings using default values and no device path.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the path to the serial device
    pub fn path<'a>(mut self, path: impl Into<std::borrow::Cow<'a, str>>) -> Self {
        self.settings.path = Some(path.into().into_owned());
        self
    }

    /// Set the baud rate label
    pub fn baud_rate<'a>(mut self, baud_rate: impl Into<std::borrow::Cow<'a, str>>) -> Self {
        self.settings.baud_rate = baud_rate.into().into_owned();
        self
    }

    /// Set the directory scanned for devices
    pub fn device_root<'a>(mut self, root: impl Into<std::borrow::Cow<'a, str>>) -> Self {
        self.settings.device_root = root.into().into_owned();
        self
    }

    /// Show a timestamp in front of every displayed line
    pub fn timestamps(mut self, timestamps: bool) -> Self {
        self.settings.timestamps = timestamps;
        self
    }

    /// Set the device read timeout (kept to a tenth of a second)
    pub fn read_timeout(mut self, read_timeout: Duration) -> Self {
        self.settings.read_timeout = read_timeout;
        self
    }

    /// Set the pause between two device reads
    pub fn poll_interval(mut self, poll_interval: Duration) -> Self {
        self.settings.poll_interval = poll_interval;
        self
    }

    /// Set the terminal refresh period
    pub fn tick(mut self, tick: Duration) -> Self {
        self.settings.tick = tick;
        self
    }

    /// Set how many extra attempts are made to open the device
    pub fn open_retries(mut self, open_retries: usize) -> Self {
        self.settings.open_retries = open_retries;
        self
    }

    pub fn finalize(self) -> Settings {
        self.settings
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            path: None,
            baud_rate: DEFAULT_BAUD_RATE.to_owned(),
            device_root: DEVICE_ROOT.to_owned(),
            timestamps: false,
            read_timeout: Duration::from_secs(1),
            poll_interval: Duration::from_millis(1),
            tick: Duration::from_millis(50),
            open_retries: 0,
            _private_use_builder: (),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[test]
fn all_default() {
    let settings = SettingsBuilder::new().finalize();
    assert_eq!(
        settings,
        Settings {
            path: None,
            baud_rate: "9600".to_owned(),
            device_root: "/dev".to_owned(),
            timestamps: false,
            read_timeout: Duration::from_secs(1),
            poll_interval: Duration::from_millis(1),
            tick: Duration::from_millis(50),
            open_retries: 0,
            _private_use_builder: (),
        }
    )
}

#[test]
fn path() {
    let settings = SettingsBuilder::new().path("/dev/ttyUSB0").finalize();
    assert_eq!(settings.path.unwrap(), "/dev/ttyUSB0");
}

#[test]
fn baud_rate() {
    let settings = SettingsBuilder::new().baud_rate("19200").finalize();
    assert_eq!(settings.baud_rate, "19200");
}

#[test]
fn device_root() {
    let settings = SettingsBuilder::new().device_root(String::from("/tmp/devs")).finalize();
    assert_eq!(settings.device_root, "/tmp/devs");
}

#[test]
fn timestamps() {
    let settings = SettingsBuilder::new().timestamps(true).finalize();
    assert!(settings.timestamps);
}

#[test]
fn timing() {
    let settings = SettingsBuilder::new()
        .read_timeout(Duration::from_millis(500))
        .poll_interval(Duration::from_millis(2))
        .tick(Duration::from_millis(20))
        .finalize();
    assert_eq!(settings.read_timeout, Duration::from_millis(500));
    assert_eq!(settings.poll_interval, Duration::from_millis(2));
    assert_eq!(settings.tick, Duration::from_millis(20));
}

#[test]
fn open_retries() {
    let settings = SettingsBuilder::new().open_retries(3).finalize();
    assert_eq!(settings.open_retries, 3);
}
