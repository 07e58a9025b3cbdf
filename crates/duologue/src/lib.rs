//! Two language models in a staged debate, shown on the console and on
//! serial displays.

#[macro_use]
extern crate tracing;

pub mod prompt;
mod session;
pub mod settings;
pub mod sink;
pub mod transport;

pub use session::{Session, Waiting};

/// Re-exports of the debate engine.
pub mod core {
    pub use duologue_core::*;
}
