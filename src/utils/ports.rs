//! Serial device selection and opening.

use console::Term;
use log::{debug, info};

use crate::{
    baud::BaudRate,
    channel::{ChannelError, ChannelOptions, SerialChannel},
};

//==============================================================================
// Public Interface
//==============================================================================

/// Present `devices` to the user and return the one picked, if any.
///
/// Hitting `Esc` (or `q`) cancels the selection.
pub(crate) fn select_port(devices: &[String]) -> Option<String> {
    use dialoguer::{theme::ColorfulTheme, Select};

    let term = Term::buffered_stderr();
    let theme = ColorfulTheme::default();

    let mut select = Select::with_theme(&theme);
    select.with_prompt("Select a tty device");
    for item in devices {
        select.item(item);
    }

    match select.default(0).interact_on_opt(&term) {
        Ok(selection) => selection.and_then(|x| devices.get(x).cloned()),
        Err(e) => {
            info!("error: {}", e);
            None
        }
    }
}

/// Open a channel on `path`, trying again up to `retries` more times, one
/// second apart.
pub(crate) fn open_with_retries(
    path: &str,
    baud_rate: BaudRate,
    options: ChannelOptions,
    retries: usize,
) -> Result<SerialChannel, ChannelError> {
    use retry::{delay, retry_with_index};

    let result = retry_with_index(
        delay::Fixed::from_millis(1000).take(retries),
        |index| -> Result<SerialChannel, ChannelError> {
            debug!("Trying to connect {}", index);
            SerialChannel::open_with(path, baud_rate, options)
        },
    );
    match result {
        Ok(channel) => Ok(channel),
        Err(retry::Error::Operation {
            error,
            total_delay,
            tries,
        }) => {
            info!(
                "Failed to open the port after {:?} and {} tries: {}",
                total_delay, tries, error,
            );
            Err(error)
        }
        Err(retry::Error::Internal(message)) => {
            info!("Internal retry error while opening port: {}", message);
            Err(ChannelError::Open {
                path: path.to_owned(),
                source: std::io::Error::new(std::io::ErrorKind::Other, message),
            })
        }
    }
}

//==============================================================================
// Unit Tests
//==============================================================================

#[test]
fn retries_then_reports_the_last_error() {
    let start = std::time::Instant::now();
    let result = open_with_retries(
        "/dev/sesamo-does-not-exist",
        BaudRate::B9600,
        ChannelOptions::default(),
        1,
    );
    assert!(matches!(result, Err(ChannelError::Open { .. })));
    assert!(start.elapsed() >= std::time::Duration::from_millis(900));
}

#[test]
fn no_retries_fails_immediately() {
    let start = std::time::Instant::now();
    let result = open_with_retries(
        "/dev/sesamo-does-not-exist",
        BaudRate::B9600,
        ChannelOptions::default(),
        0,
    );
    assert!(matches!(result, Err(ChannelError::Open { .. })));
    assert!(start.elapsed() < std::time::Duration::from_millis(900));
}
