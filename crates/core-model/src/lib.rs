//! Session object and deterministic runtime.
//!
//! `EditorSession` owns everything one live text field needs: the edge
//! detector, the repeat scheduler, the editing state and its observers. Hosts
//! feed it `Event`s together with their key oracle and timer host; nothing is
//! global, so any number of sessions can coexist.
//!
//! `SimulatedRuntime` drives a session on a virtual clock. It plays the role
//! of a host loop (frame ticks, observation ticks, repeat timers) with exact,
//! reproducible timing and is what tests and `livekey replay` run on.

mod session;
mod sim;

pub use session::{EditorSession, TextObserver};
pub use sim::SimulatedRuntime;
