//! An abstraction layer for text-generation services.
//!
//! This crate establishes a unified protocol for the debate engine to
//! interact with various chat-completion providers, so that each agent
//! can be backed by a different service without touching the engine.
//!
//! Types in this crate don't define any behavior, instead they are the
//! constraints that the implementors should adhere to.

#![deny(missing_docs)]

mod error;
mod provider;
mod request;
mod response;

pub use error::*;
pub use provider::*;
pub use request::*;
pub use response::*;
