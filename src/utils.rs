//! Helper functions for the interactive terminal.

mod keyboard;
mod ports;

pub(crate) use keyboard::{clear_screen, poll_command, Command};
pub(crate) use ports::{open_with_retries, select_port};
