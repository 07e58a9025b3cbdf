//! The turn-taking debate between two agents.

mod builder;
mod prompts;
mod snapshot;
#[cfg(test)]
mod tests;

use duologue_model::ModelMessage;

pub use builder::DebateBuilder;
pub use prompts::{CONCLUSION_TAG, Prompts};
pub use snapshot::{FIELD_LABELS, Snapshot, SnapshotLayout};

use crate::conversation::Conversation;
use crate::error::{Agent, ConfigurationError, DebateError, Stage};
use crate::model_client::ModelClient;
use crate::transcript::Transcript;

/// A configured debate, which can be run any number of times.
///
/// Each agent owns its conversation. Within a round the first agent
/// always speaks before the second, and the second agent always answers
/// with the first agent's newest line already in its history.
pub struct Debate {
    clients: [ModelClient; 2],
    prompts: Prompts,
    layout: SnapshotLayout,
    refine_seeds: bool,
}

impl Debate {
    fn from_builder(builder: DebateBuilder) -> Self {
        let DebateBuilder {
            clients,
            prompts,
            layout,
            refine_seeds,
        } = builder;
        Self {
            clients,
            prompts,
            layout,
            refine_seeds,
        }
    }

    /// Validates the seeds, refines them and returns a run positioned
    /// before the first round.
    pub async fn start(
        &self,
        seed1: &str,
        seed2: &str,
        rounds: u32,
    ) -> Result<DebateRun, DebateError> {
        let seeds = [seed1.trim(), seed2.trim()];
        for agent in Agent::BOTH {
            if seeds[agent.index()].is_empty() {
                return Err(ConfigurationError::EmptySeed(agent).into());
            }
        }

        let sides = [
            self.open_side(Agent::First, seeds[0]).await?,
            self.open_side(Agent::Second, seeds[1]).await?,
        ];

        Ok(DebateRun {
            clients: self.clients.clone(),
            prompts: self.prompts.clone(),
            layout: self.layout,
            sides,
            rounds,
            completed_rounds: 0,
            finished: false,
        })
    }

    /// Runs a whole debate, invoking `on_snapshot` for every round and for
    /// the conclusion, and returns the finished run.
    pub async fn run(
        &self,
        seed1: &str,
        seed2: &str,
        rounds: u32,
        mut on_snapshot: impl FnMut(&Snapshot),
    ) -> Result<DebateRun, DebateError> {
        let mut run = self.start(seed1, seed2, rounds).await?;
        while let Some(snapshot) = run.next_snapshot().await {
            on_snapshot(&snapshot?);
        }
        Ok(run)
    }

    async fn open_side(
        &self,
        agent: Agent,
        seed: &str,
    ) -> Result<Side, DebateError> {
        let stance = if self.refine_seeds {
            generate(
                &self.clients[agent.index()],
                Stage::Opening,
                agent,
                vec![
                    ModelMessage::System(self.prompts.refine_instruction()),
                    ModelMessage::User(seed.to_owned()),
                ],
            )
            .await?
        } else {
            seed.to_owned()
        };
        debug!("{agent} takes the stance: {stance}");

        Ok(Side {
            seed: seed.to_owned(),
            conversation: Conversation::new(
                self.prompts.debater_instruction(),
                stance.clone(),
            ),
            transcript: Transcript::new(stance),
            conclusion: None,
        })
    }
}

struct Side {
    seed: String,
    conversation: Conversation,
    transcript: Transcript,
    conclusion: Option<String>,
}

/// A single pass through a debate.
///
/// Snapshots are pulled with [`DebateRun::next_snapshot`]: one per round,
/// then one with the conclusions. The sequence is finite and cannot be
/// restarted; once it ends, or once an error has been returned, every
/// further call returns `None`.
pub struct DebateRun {
    clients: [ModelClient; 2],
    prompts: Prompts,
    layout: SnapshotLayout,
    sides: [Side; 2],
    rounds: u32,
    completed_rounds: u32,
    finished: bool,
}

impl DebateRun {
    /// Returns the state before the first round: each agent's raw seed
    /// next to the stance it will defend.
    pub fn opening(&self) -> Snapshot {
        let [first, second] = &self.sides;
        Snapshot::new(
            Stage::Opening,
            [
                first.seed.clone(),
                first.transcript.points()[0].clone(),
                second.seed.clone(),
                second.transcript.points()[0].clone(),
            ],
        )
    }

    /// Plays the next round, or concludes the debate after the last one.
    pub async fn next_snapshot(
        &mut self,
    ) -> Option<Result<Snapshot, DebateError>> {
        if self.finished {
            return None;
        }
        let concluding = self.completed_rounds >= self.rounds;
        let result = if concluding {
            self.conclude().await
        } else {
            self.play_round().await
        };
        if concluding || result.is_err() {
            self.finished = true;
        }
        Some(result)
    }

    /// Returns the number of rounds this run was started with.
    #[inline]
    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    /// Returns how many rounds have been played so far.
    #[inline]
    pub fn completed_rounds(&self) -> u32 {
        self.completed_rounds
    }

    /// Returns `true` once the run will not yield further snapshots.
    #[inline]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Returns the agent's utterances so far, stance first.
    #[inline]
    pub fn transcript(&self, agent: Agent) -> &Transcript {
        &self.sides[agent.index()].transcript
    }

    /// Returns the message history the agent's model has seen.
    #[inline]
    pub fn conversation(&self, agent: Agent) -> &Conversation {
        &self.sides[agent.index()].conversation
    }

    /// Returns the agent's verdict, once the debate has concluded.
    #[inline]
    pub fn conclusion(&self, agent: Agent) -> Option<&str> {
        self.sides[agent.index()].conclusion.as_deref()
    }

    async fn play_round(&mut self) -> Result<Snapshot, DebateError> {
        let round = self.completed_rounds + 1;
        let stage = Stage::Round(round);
        debug!("playing {stage} of {}", self.rounds);

        let [first, second] = &self.sides;
        let first_line = generate(
            &self.clients[0],
            stage,
            Agent::First,
            first.conversation.messages().to_vec(),
        )
        .await?;

        // The second agent answers with the first agent's line already in
        // its history. Nothing is committed until both lines exist, so a
        // failed round leaves no trace.
        let mut second_messages = second.conversation.messages().to_vec();
        second_messages.push(ModelMessage::User(first_line.clone()));
        let second_line =
            generate(&self.clients[1], stage, Agent::Second, second_messages)
                .await?;

        let [first, second] = &mut self.sides;
        first.conversation.push_assistant(first_line.clone());
        second.conversation.push_user(first_line.clone());
        first.transcript.push(first_line.clone());

        second.conversation.push_assistant(second_line.clone());
        first.conversation.push_user(second_line.clone());
        second.transcript.push(second_line.clone());

        self.completed_rounds = round;

        let stance1 = first.transcript.points()[0].clone();
        let stance2 = second.transcript.points()[0].clone();
        let fields = match self.layout {
            SnapshotLayout::FacingOpponent => {
                [stance1, second_line, stance2, first_line]
            }
            SnapshotLayout::OwnLatest => {
                [stance1, first_line, stance2, second_line]
            }
        };
        Ok(Snapshot::new(stage, fields))
    }

    async fn conclude(&mut self) -> Result<Snapshot, DebateError> {
        let conclusion1 = self.conclusion_of(Agent::First).await?;
        let conclusion2 = self.conclusion_of(Agent::Second).await?;

        let [first, second] = &mut self.sides;
        first.conclusion = Some(conclusion1.clone());
        second.conclusion = Some(conclusion2.clone());
        Ok(Snapshot::new(
            Stage::Conclusion,
            [
                conclusion1,
                first.transcript.to_string(),
                conclusion2,
                second.transcript.to_string(),
            ],
        ))
    }

    async fn conclusion_of(&self, agent: Agent) -> Result<String, DebateError> {
        let side = &self.sides[agent.index()];
        let conclusion = generate(
            &self.clients[agent.index()],
            Stage::Conclusion,
            agent,
            vec![
                ModelMessage::System(self.prompts.conclusion_instruction()),
                ModelMessage::User(side.transcript.joined()),
            ],
        )
        .await?;
        if !conclusion.trim_start().starts_with(CONCLUSION_TAG) {
            debug!("{agent} concluded without the {CONCLUSION_TAG} tag");
        }
        Ok(conclusion)
    }
}

async fn generate(
    client: &ModelClient,
    stage: Stage,
    agent: Agent,
    messages: Vec<ModelMessage>,
) -> Result<String, DebateError> {
    client.generate(messages).await.map_err(|source| {
        debug!("{stage}: {agent} failed: {source}");
        DebateError::Generation {
            stage,
            agent,
            source,
        }
    })
}
