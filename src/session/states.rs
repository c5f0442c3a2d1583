//! States for the terminal session state machine.
//!
//! This modules is private and restricted to the [`session`](crate::session)
//! scope. The public interface of the state machine is provided by
//! [`session`](crate::session).
//!
//! Refer to the [`state_machine`](super::state_machine) module for an overview
//! of states, events and transitions.

use std::{
    fmt,
    io::{self, Write},
};

use chrono::Local;
use console::style;
use log::{info, trace, warn};

use super::events::*;
use crate::{
    baud,
    channel::{ChannelOptions, SerialChannel},
    ports,
    transcript::Transcript,
    utils::{self, Command},
};

// =============================================================================
// Crate-Public Interface
// =============================================================================

/// Trait adding the ability for a state to be `run` after a transition into it.
pub(crate) trait Runnable {
    /// A state implements this method so it can be `run` after the state
    /// machine transitions into it.
    ///
    /// During this call, the state can do any work that needs to be done and
    /// when finished, requests a transition to a `new state` by returning the
    /// appropriate `event`.
    fn run(&mut self, context: &Context) -> Event;
}

// Init State ==================================================================

/// The initial state of the session.
///
///  * **[`ConnectEvent`] => [`ConnectState`]** when a device path was
///    provided in the settings,
///  * **[`SelectPortEvent`] => [`SelectPortState`]** otherwise.
#[derive(Debug)]
pub(crate) struct InitState {}
impl Runnable for InitState {
    fn run(&mut self, context: &Context) -> Event {
        info!("=> Init");
        match context.settings.path {
            Some(_) => Event::Connect(ConnectEvent {
                context: context.clone(),
            }),
            None => Event::SelectPort(SelectPortEvent {
                context: context.clone(),
            }),
        }
    }
}

// SelectPort State ============================================================

/// Lists the candidate devices and lets the user pick one.
///
///  * **[`ConnectEvent`] => [`ConnectState`]** with the picked path,
///  * **[`DoneEvent`] => [`DoneState`]** when there is nothing to pick from
///    (with errors) or the user cancelled the selection (without).
#[derive(Debug)]
pub(crate) struct SelectPortState {}
impl Runnable for SelectPortState {
    fn run(&mut self, context: &Context) -> Event {
        info!("=> SelectPort");
        let root = &context.settings.device_root;

        let done = |with_errors| {
            Event::Done(DoneEvent {
                context: context.clone(),
                with_errors,
            })
        };

        let devices = match ports::list_devices(root) {
            Ok(devices) => devices,
            Err(e) => {
                println!(
                    "{} cannot list devices under {}: {}",
                    style("[SE] 💥").red(),
                    style(root).cyan(),
                    e
                );
                return done(true);
            }
        };
        if devices.is_empty() {
            println!(
                "{} no serial device found under {}",
                style("[SE] 💥").red(),
                style(root).cyan()
            );
            return done(true);
        }
        if context.shutdown_requested() {
            return done(false);
        }

        match utils::select_port(&devices) {
            Some(path) => {
                let mut context = context.clone();
                context.settings.path = Some(path);
                Event::Connect(ConnectEvent { context })
            }
            None => done(false),
        }
    }
}

// Connect State ===============================================================

/// Opens the selected device at the configured baud rate.
///
///  * **[`ConnectedEvent`] => [`MonitorState`]** with the open channel,
///  * **[`DoneEvent`] => [`DoneState`]** when the baud rate is unknown or the
///    device cannot be opened.
#[derive(Debug)]
pub(crate) struct ConnectState {}
impl Runnable for ConnectState {
    fn run(&mut self, context: &Context) -> Event {
        info!("=> Connect");
        let settings = &context.settings;
        let path = match &settings.path {
            Some(path) => path.as_str(),
            None => unreachable!("connecting without a device path"),
        };

        let opened = baud::lookup(&settings.baud_rate).and_then(|baud_rate| {
            utils::open_with_retries(
                path,
                baud_rate,
                ChannelOptions::from(settings),
                settings.open_retries,
            )
        });

        match opened {
            Ok(channel) => {
                println!(
                    "[SE] 🔌 Connected to {} at {} baud (q to quit, Ctrl+L to clear, t for timestamps)",
                    style(path).green(),
                    settings.baud_rate
                );
                Event::Connected(ConnectedEvent {
                    context: context.clone(),
                    channel,
                })
            }
            Err(e) => {
                println!("{} {}", style("[SE] 💥").red(), e);
                Event::Done(DoneEvent {
                    context: context.clone(),
                    with_errors: true,
                })
            }
        }
    }
}

// Monitor State ===============================================================

/// Shows what the device sends until the user quits.
///
/// Every tick the keyboard is polled, the channel drained and the received
/// text printed (with timestamps if enabled).
///
///  * **[`DoneEvent`] => [`DoneState`]** when the user quits or a shutdown is
///    requested,
///  * **[`SelectPortEvent`] => [`SelectPortState`]** when the device stopped
///    delivering data because of a read error.
pub(crate) struct MonitorState {
    /// The open channel. Taken, and closed, when leaving the state.
    pub channel: Option<SerialChannel>,
    pub transcript: Transcript,
}
impl MonitorState {
    pub fn new(channel: SerialChannel, timestamps: bool) -> Self {
        MonitorState {
            channel: Some(channel),
            transcript: Transcript::new(timestamps),
        }
    }

    fn show(&mut self, channel: &SerialChannel) {
        let text = channel.drain_text();
        if text.is_empty() {
            return;
        }
        let shown = self.transcript.append(&text, Local::now());
        let mut stdout = io::stdout();
        if let Err(e) = stdout.write_all(shown.as_bytes()).and_then(|_| stdout.flush()) {
            warn!("cannot write to stdout: {}", e);
        }
    }
}
impl Runnable for MonitorState {
    fn run(&mut self, context: &Context) -> Event {
        info!("=> Monitor");
        let tick = context.settings.tick;

        if let Some(mut channel) = self.channel.take() {
            loop {
                if context.shutdown_requested() {
                    break;
                }

                match utils::poll_command(tick) {
                    Ok(Some(Command::Quit)) => break,
                    Ok(Some(Command::Clear)) => {
                        self.transcript.clear();
                        if let Err(e) = utils::clear_screen() {
                            trace!("cannot clear the screen: {}", e);
                        }
                    }
                    Ok(Some(Command::ToggleTimestamps)) => {
                        let timestamps = !self.transcript.timestamps();
                        self.transcript.set_timestamps(timestamps);
                        info!("timestamps {}", if timestamps { "on" } else { "off" });
                    }
                    Ok(None) => {}
                    // Not a terminal (e.g. piped input): keep the pace without
                    // the keyboard.
                    Err(e) => {
                        trace!("keyboard poll failed: {}", e);
                        std::thread::sleep(tick);
                    }
                }

                // The reader stores its failure only after its last chunk, so
                // draining after taking it loses nothing.
                let failure = channel.take_failure();
                self.show(&channel);

                if let Some(failure) = failure {
                    println!("{} {}", style("[SE] 💥").red(), failure);
                    println!("[SE] 🔌 Pick a device to reconnect");
                    channel.close();
                    let mut context = context.clone();
                    context.settings.path = None;
                    return Event::SelectPort(SelectPortEvent { context });
                }
            }

            channel.close();
            return Event::Done(DoneEvent {
                context: context.clone(),
                with_errors: false,
            });
        }

        // We should never reach here!
        unreachable!()
    }
}
impl fmt::Debug for MonitorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.channel {
            Some(channel) => fmt::Debug::fmt(channel, f),
            None => f.debug_tuple("MonitorState").finish(),
        }
    }
}

// Done State ==================================================================

/// Reached when the session completes and is about to terminate (normally or
/// abnormally).
///
/// This state goes into a 2-phase execution. During the initial phase, it runs
/// like any other state to report how the session ended. It then triggers the
/// [`ExitEvent`] to cause the event loop to terminate.
#[derive(Debug, Copy, Clone)]
pub(crate) struct DoneState {
    /// When `true`, indicates an abnormal completion caused by an error.
    pub with_error: bool,
    /// When `true` instructs the event loop to exit.
    pub should_exit: bool,
}
impl Runnable for DoneState {
    fn run(&mut self, context: &Context) -> Event {
        info!(
            "=> Done with{}errors",
            if self.with_error { " " } else { " no " }
        );
        Event::Exit(ExitEvent {
            context: context.clone(),
            with_error: self.with_error,
        })
    }
}
