//! Command-line and environment settings.

use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use duologue_core::{Agent, ConfigurationError, SnapshotLayout};
use duologue_openai_model::{DEFAULT_MODEL, OpenAIConfigBuilder, OpenAIProvider};

use crate::transport::DEFAULT_BAUD_RATE;

/// Stage a debate between two language models.
#[derive(Debug, Parser)]
#[command(name = "duologue", version)]
pub struct Cli {
    #[command(flatten)]
    pub model: ModelArgs,

    #[command(flatten)]
    pub display: DisplayArgs,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Let two agents argue for a number of rounds (the default).
    Debate(DebateArgs),
    /// Translate two inputs and show them on four channels.
    Translate(TranslateArgs),
}

impl Default for Command {
    fn default() -> Self {
        Command::Debate(DebateArgs::default())
    }
}

#[derive(Debug, Args)]
pub struct ModelArgs {
    /// API key for agent 1.
    #[arg(long, env = "OPENAI_API_KEY_1", hide_env_values = true)]
    pub api_key_1: Option<String>,

    /// API key for agent 2.
    #[arg(long, env = "OPENAI_API_KEY_2", hide_env_values = true)]
    pub api_key_2: Option<String>,

    /// API key used when an agent has no key of its own.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Base URL of an OpenAI-compatible API.
    #[arg(long, env = "OPENAI_BASE_URL")]
    pub base_url: Option<String>,

    /// Model identifier.
    #[arg(long, env = "OPENAI_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,
}

impl ModelArgs {
    /// Returns the key for `agent`, falling back to the shared key.
    pub fn api_key_for(&self, agent: Agent) -> Result<&str, ConfigurationError> {
        let own = match agent {
            Agent::First => self.api_key_1.as_deref(),
            Agent::Second => self.api_key_2.as_deref(),
        };
        own.or(self.api_key.as_deref())
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigurationError::MissingSetting(match agent {
                Agent::First => "OPENAI_API_KEY_1 (or OPENAI_API_KEY)",
                Agent::Second => "OPENAI_API_KEY_2 (or OPENAI_API_KEY)",
            }))
    }

    /// Creates the provider `agent` talks to.
    pub fn provider_for(
        &self,
        agent: Agent,
    ) -> Result<OpenAIProvider, ConfigurationError> {
        let mut builder = OpenAIConfigBuilder::with_api_key(self.api_key_for(agent)?)
            .with_model(&self.model);
        if let Some(base_url) = &self.base_url {
            builder = builder.with_base_url(base_url);
        }
        Ok(OpenAIProvider::new(builder.build()))
    }
}

#[derive(Debug, Args)]
pub struct DisplayArgs {
    /// Serial ports that mirror the four display fields, in field order.
    #[arg(long = "port", env = "DUOLOGUE_PORTS", value_delimiter = ',')]
    pub ports: Vec<String>,

    /// Baud rate of the serial ports.
    #[arg(long, env = "DUOLOGUE_BAUD", default_value_t = DEFAULT_BAUD_RATE)]
    pub baud: u32,

    /// End every relayed field with a newline.
    #[arg(long)]
    pub newline: bool,

    /// Pause after each displayed snapshot, in milliseconds.
    #[arg(long, default_value_t = 1000)]
    pub pace_ms: u64,
}

impl DisplayArgs {
    #[inline]
    pub fn pace(&self) -> Duration {
        Duration::from_millis(self.pace_ms)
    }
}

#[derive(Debug, Default, Args)]
pub struct DebateArgs {
    /// Number of rounds; asked for when omitted.
    #[arg(long)]
    pub rounds: Option<String>,

    /// Starting statement for agent 1; asked for when omitted.
    #[arg(long)]
    pub agent1: Option<String>,

    /// Starting statement for agent 2; asked for when omitted.
    #[arg(long)]
    pub agent2: Option<String>,

    /// Use the starting statements as they are, without refinement.
    #[arg(long)]
    pub no_refine: bool,

    /// Ask the model to end every response with this marker.
    #[arg(long)]
    pub terminator: Option<String>,

    /// What the per-round display fields show.
    #[arg(long, value_enum, default_value_t)]
    pub layout: Layout,

    /// Print agent 1's full conversation after the debate.
    #[arg(long)]
    pub show_conversation: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum Layout {
    /// Each agent's stance next to the line it just heard.
    #[default]
    FacingOpponent,
    /// Each agent's stance next to its own newest line.
    OwnLatest,
}

impl From<Layout> for SnapshotLayout {
    fn from(layout: Layout) -> Self {
        match layout {
            Layout::FacingOpponent => SnapshotLayout::FacingOpponent,
            Layout::OwnLatest => SnapshotLayout::OwnLatest,
        }
    }
}

#[derive(Debug, Args)]
pub struct TranslateArgs {
    /// First input; asked for when omitted.
    #[arg(long)]
    pub first: Option<String>,

    /// Second input; asked for when omitted.
    #[arg(long)]
    pub second: Option<String>,

    #[arg(long, default_value = "English")]
    pub first_language: String,

    #[arg(long, default_value = "French")]
    pub second_language: String,
}

/// Parses a round count typed by a user.
pub fn parse_rounds(input: &str) -> Result<u32, ConfigurationError> {
    let input = input.trim();
    input
        .parse()
        .map_err(|_| ConfigurationError::InvalidRounds(input.to_owned()))
}
