//! Core logic of a two-agent debate: conversations, transcripts, the
//! turn-taking engine and the snapshots it produces.

#![deny(missing_docs)]
#![deny(clippy::missing_safety_doc)]

#[macro_use]
extern crate tracing;

pub mod conversation;
mod debate;
mod error;
mod model_client;
pub mod transcript;
mod translate;

pub use debate::{
    CONCLUSION_TAG, Debate, DebateBuilder, DebateRun, FIELD_LABELS, Prompts,
    Snapshot, SnapshotLayout,
};
pub use error::{Agent, ConfigurationError, DebateError, GenerationError, Stage};
pub use model_client::{ModelClient, ModelClientResponse};
pub use translate::Translator;
