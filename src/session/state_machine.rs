//! Terminal session state machine.
//!
//! A session picks a device, opens it and then shows whatever the device
//! sends until the user quits. The following state diagram summarizes the
//! states and transitions:
//!
//! ```text
//!                       START
//!                         |
//!                         v
//!                     .-------.
//!                     | Init  |
//!                     '-------'
//!                         |
//!               no  .----------.  yes
//!             .----( port_name? )----.
//!             |     '----------'     |
//!             v                      v
//!      .------------.  picked   .---------.
//!  .-->| SelectPort |---------->| Connect |
//!  |   '------------'           '---------'
//!  |         |                       |
//!  |      cancel /                 opened
//!  |     no devices                  v
//!  |         |                  .---------.
//!  |         |                  | Monitor |
//!  |         |                  '---------'
//!  |         |                    |     |
//!  '-------- | ------ read error -'    quit
//!            |                          |
//!            v                          v
//!          .--------------------------------.
//!          |              Done              |<--- open failed
//!          '--------------------------------'
//!                          |
//!                          v
//!                         END
//! ```

use std::sync::{atomic::AtomicBool, Arc};

use super::events::*;
use super::states::*;
use crate::settings::Settings;

// =============================================================================
// Public Interface
// =============================================================================

/// Represents a terminal session. Use the [`factory()`] function to get an
/// instance then run it by calling its [`run()`](Session::run) method.
pub struct Session {
    shutdown: Arc<AtomicBool>,
    sm: SessionStates,
}
impl Session {
    /// The session event loop runs until the `Done` state is reached and its
    /// `should_exit` flag is set. At such point, the event loop terminates and
    /// returns an exit code indicating no errors when equal to **`0`**;
    /// otherwise a termination with error.
    pub fn run(&mut self) -> i8 {
        loop {
            self.sm = self.sm.step();
            if let SessionStates::Done(sm) = &self.sm {
                if sm.state.should_exit {
                    return if sm.state.with_error { 1 } else { 0 };
                }
            }
        }
    }

    /// A flag that, once raised, makes the session close the device and
    /// finish at its next tick. Safe to raise from a signal handler thread.
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }
}

/// Factory function for the terminal session state machine.
pub fn factory(settings: Settings) -> Session {
    let shutdown = Arc::new(AtomicBool::new(false));
    Session {
        sm: SessionStates::Init(SessionSM::new(Context {
            settings,
            shutdown: Arc::clone(&shutdown),
        })),
        shutdown,
    }
}

// =============================================================================
// Private stuff
// =============================================================================

/// The raw state machine implementing the terminal session.
///
/// Note that using a generic type that holds the current state serves two
/// purposes. It allows for also having shared data by all states that is not
/// really part of state data. Additionally, it's nicer when debugging to see
/// the state machine and the current state it is holding at any time.
#[derive(Debug)]
struct SessionSM<S: Runnable> {
    context: Context,
    state: S,
}
impl<S: Runnable> SessionSM<S> {
    fn run(&mut self) -> Event {
        self.state.run(&self.context)
    }
}

/// The state machine starts in the `InitState`.
impl SessionSM<InitState> {
    fn new(context: Context) -> Self {
        SessionSM {
            context,
            state: InitState {},
        }
    }
}

/// An enum wrapper around the states of the session state machine.
enum SessionStates {
    Init(SessionSM<InitState>),
    SelectPort(SessionSM<SelectPortState>),
    Connect(SessionSM<ConnectState>),
    Monitor(SessionSM<MonitorState>),
    Done(SessionSM<DoneState>),
}
impl SessionStates {
    /// The unit of work in the state machine event loop. It runs the current
    /// state and decides the next transition from the event it returns.
    /// Transitions are implemented with `From`/`Into`, so a transition that is
    /// not implemented does not compile.
    fn step(&mut self) -> Self {
        match self {
            SessionStates::Init(sm) => {
                let event = sm.run();
                match event {
                    Event::SelectPort(ev) => SessionStates::SelectPort(ev.into()),
                    Event::Connect(ev) => SessionStates::Connect(ev.into()),
                    _ => unreachable!("illegal event {:#?} at current state {:#?}", event, sm),
                }
            }
            SessionStates::SelectPort(sm) => {
                let event = sm.run();
                match event {
                    Event::Connect(ev) => SessionStates::Connect(ev.into()),
                    Event::Done(ev) => SessionStates::Done(ev.into()),
                    _ => unreachable!("illegal event {:#?} at current state {:#?}", event, sm),
                }
            }
            SessionStates::Connect(sm) => {
                let event = sm.run();
                match event {
                    Event::Connected(ev) => SessionStates::Monitor(ev.into()),
                    Event::Done(ev) => SessionStates::Done(ev.into()),
                    _ => unreachable!("illegal event {:#?} at current state {:#?}", event, sm),
                }
            }
            SessionStates::Monitor(sm) => {
                let event = sm.run();
                match event {
                    Event::SelectPort(ev) => SessionStates::SelectPort(ev.into()),
                    Event::Done(ev) => SessionStates::Done(ev.into()),
                    _ => unreachable!("illegal event {:#?} at current state {:#?}", event, sm),
                }
            }
            SessionStates::Done(sm) => {
                let event = sm.run();
                match event {
                    Event::Exit(ev) => SessionStates::Done(ev.into()),
                    _ => unreachable!("illegal event {:#?} at current state {:#?}", event, sm),
                }
            }
        }
    }
}

// -----------------------------------------------------------------------------
// State from Event transitions
// -----------------------------------------------------------------------------

impl From<SelectPortEvent> for SessionSM<SelectPortState> {
    fn from(event: SelectPortEvent) -> SessionSM<SelectPortState> {
        SessionSM {
            context: event.context,
            state: SelectPortState {},
        }
    }
}

impl From<ConnectEvent> for SessionSM<ConnectState> {
    fn from(event: ConnectEvent) -> SessionSM<ConnectState> {
        SessionSM {
            context: event.context,
            state: ConnectState {},
        }
    }
}

impl From<ConnectedEvent> for SessionSM<MonitorState> {
    fn from(event: ConnectedEvent) -> SessionSM<MonitorState> {
        let timestamps = event.context.settings.timestamps;
        SessionSM {
            context: event.context,
            state: MonitorState::new(event.channel, timestamps),
        }
    }
}

impl From<DoneEvent> for SessionSM<DoneState> {
    fn from(event: DoneEvent) -> SessionSM<DoneState> {
        SessionSM {
            context: event.context,
            state: DoneState {
                with_error: event.with_errors,
                should_exit: false,
            },
        }
    }
}
impl From<ExitEvent> for SessionSM<DoneState> {
    fn from(event: ExitEvent) -> SessionSM<DoneState> {
        SessionSM {
            context: event.context,
            state: DoneState {
                with_error: event.with_error,
                should_exit: true,
            },
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::{tests_support::Scratch, SettingsBuilder};

    #[test]
    fn missing_device_root_ends_with_error() {
        let dir = Scratch::new();
        let settings = SettingsBuilder::new()
            .device_root(dir.path().join("missing").to_string_lossy())
            .finalize();
        assert_eq!(factory(settings).run(), 1);
    }

    #[test]
    fn no_candidates_ends_with_error() {
        let dir = Scratch::new();
        let settings = SettingsBuilder::new()
            .device_root(dir.path().to_string_lossy())
            .finalize();
        assert_eq!(factory(settings).run(), 1);
    }

    #[test]
    fn unknown_baud_rate_ends_with_error() {
        let settings = SettingsBuilder::new()
            .path("/dev/null")
            .baud_rate("12345")
            .finalize();
        assert_eq!(factory(settings).run(), 1);
    }

    #[test]
    fn open_failure_ends_with_error() {
        let settings = SettingsBuilder::new()
            .path("/dev/sesamo-does-not-exist")
            .finalize();
        assert_eq!(factory(settings).run(), 1);
    }

    #[test]
    fn shutdown_flag_is_shared() {
        let session = factory(SettingsBuilder::new().finalize());
        let flag = session.shutdown_flag();
        flag.store(true, std::sync::atomic::Ordering::Release);
        assert!(session.shutdown_flag().load(std::sync::atomic::Ordering::Acquire));
    }
}
