use duologue_model::ModelProvider;

use super::{Debate, Prompts, SnapshotLayout};
use crate::model_client::ModelClient;

/// [`Debate`] builder.
pub struct DebateBuilder {
    pub(crate) clients: [ModelClient; 2],
    pub(crate) prompts: Prompts,
    pub(crate) layout: SnapshotLayout,
    pub(crate) refine_seeds: bool,
}

impl DebateBuilder {
    /// Creates a builder where both agents share one model provider.
    #[inline]
    pub fn with_model_provider<P: ModelProvider + 'static>(
        provider: P,
    ) -> Self {
        let client = ModelClient::new(provider);
        Self::with_model_clients(client.clone(), client)
    }

    /// Creates a builder with a dedicated model provider per agent.
    #[inline]
    pub fn with_model_providers<P1, P2>(first: P1, second: P2) -> Self
    where
        P1: ModelProvider + 'static,
        P2: ModelProvider + 'static,
    {
        Self::with_model_clients(
            ModelClient::new(first),
            ModelClient::new(second),
        )
    }

    /// Creates a builder from already wrapped clients.
    #[inline]
    pub fn with_model_clients(first: ModelClient, second: ModelClient) -> Self {
        Self {
            clients: [first, second],
            prompts: Prompts::default(),
            layout: SnapshotLayout::default(),
            refine_seeds: true,
        }
    }

    /// Replaces the system instructions.
    #[inline]
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    /// Chooses how per-round snapshots are filled.
    #[inline]
    pub fn with_layout(mut self, layout: SnapshotLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Whether seeds go through a refinement call before the first round.
    /// Enabled by default.
    #[inline]
    pub fn refine_seeds(mut self, refine: bool) -> Self {
        self.refine_seeds = refine;
        self
    }

    /// Builds the debate.
    #[inline]
    pub fn build(self) -> Debate {
        Debate::from_builder(self)
    }
}
