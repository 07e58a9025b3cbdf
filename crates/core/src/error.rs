//! Error taxonomy of a debate run.

use std::fmt::{self, Display, Formatter};

use duologue_model::ErrorKind;
use thiserror::Error;

/// One of the two debating agents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Agent {
    /// The agent that always speaks first in a round.
    First,
    /// The agent that answers.
    Second,
}

impl Agent {
    /// Both agents, in speaking order.
    pub const BOTH: [Agent; 2] = [Agent::First, Agent::Second];

    #[inline]
    pub(crate) fn index(self) -> usize {
        match self {
            Agent::First => 0,
            Agent::Second => 1,
        }
    }
}

impl Display for Agent {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "agent {}", self.index() + 1)
    }
}

/// Where in the run a snapshot was taken or an error occurred.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Seeds are being refined, before any round.
    Opening,
    /// The 1-based round.
    Round(u32),
    /// Both agents summarize the debate.
    Conclusion,
    /// A standalone translation, outside of any debate.
    Translation,
}

impl Display for Stage {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Opening => write!(f, "opening"),
            Stage::Round(round) => write!(f, "round {round}"),
            Stage::Conclusion => write!(f, "conclusion"),
            Stage::Translation => write!(f, "translation"),
        }
    }
}

/// The text-generation service failed or returned unusable content.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// The provider reported an error.
    #[error("{message} ({kind})")]
    Provider {
        /// The provider's classification of the error.
        kind: ErrorKind,
        /// The provider's error message.
        message: String,
    },
    /// The provider answered with no text at all.
    #[error("the model returned an empty response")]
    EmptyResponse,
    /// A request without messages was about to be sent.
    #[error("refusing to send a request without messages")]
    EmptyRequest,
}

/// The run was misconfigured and never started.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// A seed statement is empty or only whitespace.
    #[error("the starting statement for {0} is empty")]
    EmptySeed(Agent),
    /// The round count is missing or not a non-negative integer.
    #[error("invalid number of rounds: {0:?}")]
    InvalidRounds(String),
    /// A required setting was not provided.
    #[error("{0} is not set")]
    MissingSetting(&'static str),
}

/// An error that ends a debate run.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DebateError {
    /// The run was rejected before the first round.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    /// A generation call failed, which aborts the run.
    #[error("{stage}: {agent} failed to generate a reply: {source}")]
    Generation {
        /// The stage the failing call belonged to.
        stage: Stage,
        /// The agent whose call failed.
        agent: Agent,
        /// The underlying cause.
        #[source]
        source: GenerationError,
    },
}

impl DebateError {
    /// Returns the 1-based round that failed, if the failure happened
    /// inside a round.
    #[inline]
    pub fn round(&self) -> Option<u32> {
        match self {
            DebateError::Generation {
                stage: Stage::Round(round),
                ..
            } => Some(*round),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = DebateError::Generation {
            stage: Stage::Round(3),
            agent: Agent::Second,
            source: GenerationError::EmptyResponse,
        };
        assert_eq!(err.round(), Some(3));
        assert_eq!(
            err.to_string(),
            "round 3: agent 2 failed to generate a reply: the model returned an empty response"
        );

        let err = DebateError::from(ConfigurationError::EmptySeed(Agent::First));
        assert_eq!(err.round(), None);
        assert_eq!(err.to_string(), "the starting statement for agent 1 is empty");
    }
}
