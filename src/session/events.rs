//! Events for the terminal session state machine.
//!
//! This modules is private and restricted to the [`session`](crate::session)
//! scope. The public interface of the state machine is provided by
//! [`session`](crate::session).
//!
//! Refer to the [`state_machine`](super::state_machine) module for an overview
//! of states, events and transitions.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use crate::{channel::SerialChannel, settings::Settings};

// =============================================================================
// Crate-Public Interface
// =============================================================================

/// Data shared by every state and carried from one state to the next.
#[derive(Debug, Clone)]
pub(crate) struct Context {
    pub settings: Settings,
    /// Raised from outside the event loop (e.g. by a `Ctrl+C` handler) to
    /// request an orderly shutdown.
    pub shutdown: Arc<AtomicBool>,
}
impl Context {
    pub fn shutdown_requested(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }
}

// SelectPortEvent =============================================================

/// Event fired to trigger the transition to the `SelectPort` state.
///
/// This event can happen under one of the following circumstances:
///
///  1. No device path was provided in the settings.
///  2. The device being monitored stopped delivering data because of a read
///     error. The path is cleared so that a device can be picked again.
#[derive(Debug)]
pub(crate) struct SelectPortEvent {
    pub context: Context,
}

// ConnectEvent ================================================================

/// Event fired when a device path is known, either from the settings or from
/// the selection, and the device should now be opened.
#[derive(Debug)]
pub(crate) struct ConnectEvent {
    pub context: Context,
}

// ConnectedEvent ==============================================================

/// Event fired once the channel is open. It moves the channel into the
/// `Monitor` state.
#[derive(Debug)]
pub(crate) struct ConnectedEvent {
    pub context: Context,
    pub channel: SerialChannel,
}

// DoneEvent ===================================================================

/// Event fired when the session completes and is about to terminate. It
/// triggers a transition to the `Done` state.
///
/// This event can happen at any state due to normal termination (the user
/// quits), or abnormal termination (no device to pick, the device cannot be
/// opened).
#[derive(Debug)]
pub(crate) struct DoneEvent {
    pub context: Context,
    pub with_errors: bool,
}

// ExitEvent ===================================================================

/// The last event of a session. The event loop terminates and hands the exit
/// status back to its caller.
#[derive(Debug)]
pub(crate) struct ExitEvent {
    pub context: Context,
    pub with_error: bool,
}

// Events enum ==================================================================

/// Events that can be triggered within the session state machine.
///
/// Each possible value holds an `event`, which in turn may hold additional data
/// for the state transition. Such data is passed by the origin state for
/// potential use by the target state.
#[derive(Debug)]
pub(crate) enum Event {
    SelectPort(SelectPortEvent),
    Connect(ConnectEvent),
    Connected(ConnectedEvent),
    Done(DoneEvent),
    Exit(ExitEvent),
}
