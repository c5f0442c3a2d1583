//! The interactive terminal session.
//!
//! **Example** - Executing the state machine event loop:
//! ```no_run
//! use sesamo::{self as se, session};
//!
//! let settings = se::SettingsBuilder::new().timestamps(true).finalize();
//! let mut session = session::factory(settings);
//! let status = session.run(); // status code returned after the `Exit` event
//! std::process::exit(status.into());
//! ```

mod events;
mod state_machine;
mod states;

pub use state_machine::{factory, Session};
