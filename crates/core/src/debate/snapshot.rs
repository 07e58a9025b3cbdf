use crate::error::Stage;

/// Which texts fill the two per-round fields of each agent.
///
/// Opening and conclusion snapshots have fixed contents; only the rounds
/// in between are affected.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SnapshotLayout {
    /// Front shows the agent's own stance, back shows the line it has
    /// just heard from the opponent.
    #[default]
    FacingOpponent,
    /// Front shows the agent's own stance, back shows its own newest line.
    OwnLatest,
}

/// The four display strings describing the run at one point in time.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Snapshot {
    /// When the snapshot was taken.
    pub stage: Stage,
    #[allow(missing_docs)]
    pub agent1_front: String,
    #[allow(missing_docs)]
    pub agent1_back: String,
    #[allow(missing_docs)]
    pub agent2_front: String,
    #[allow(missing_docs)]
    pub agent2_back: String,
}

impl Snapshot {
    /// Creates a snapshot from its fields in display order.
    pub fn new(stage: Stage, fields: [String; 4]) -> Self {
        let [agent1_front, agent1_back, agent2_front, agent2_back] = fields;
        Self {
            stage,
            agent1_front,
            agent1_back,
            agent2_front,
            agent2_back,
        }
    }

    /// Returns the fields in display order.
    #[inline]
    pub fn fields(&self) -> [&str; 4] {
        [
            &self.agent1_front,
            &self.agent1_back,
            &self.agent2_front,
            &self.agent2_back,
        ]
    }
}

/// Labels matching [`Snapshot::fields`].
pub const FIELD_LABELS: [&str; 4] = [
    "Agent 1 Front",
    "Agent 1 Back",
    "Agent 2 Front",
    "Agent 2 Back",
];
