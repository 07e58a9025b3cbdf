use std::time::Duration;

use duologue_core::{Debate, DebateError, DebateRun, Snapshot, Translator};
use tokio::time::sleep;

use crate::sink::PresentationSink;

/// A staged run, like a stage with displays in front of the audience.
///
/// The session shows every snapshot on its sink and pauses for a moment
/// afterwards, so people can read along.
pub struct Session<S> {
    sink: S,
    pace: Duration,
}

impl<S: PresentationSink> Session<S> {
    /// Creates a session that shows snapshots on `sink`.
    #[inline]
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            pace: Duration::ZERO,
        }
    }

    /// Sets the pause after each displayed snapshot.
    #[inline]
    pub fn with_pace(mut self, pace: Duration) -> Self {
        self.pace = pace;
        self
    }

    /// Returns the sink.
    #[inline]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Runs a debate and shows its opening, every round and the
    /// conclusion. `on_wait` is called before every model round trip.
    pub async fn debate(
        &self,
        debate: &Debate,
        seeds: [&str; 2],
        rounds: u32,
        mut on_wait: impl FnMut(Waiting),
    ) -> Result<DebateRun, DebateError> {
        on_wait(Waiting::Refining);
        let mut run = debate.start(seeds[0], seeds[1], rounds).await?;
        self.present(&run.opening()).await;

        while !run.is_finished() {
            on_wait(if run.completed_rounds() < run.rounds() {
                Waiting::Round(run.completed_rounds() + 1)
            } else {
                Waiting::Concluding
            });
            let Some(snapshot) = run.next_snapshot().await else {
                break;
            };
            self.present(&snapshot?).await;
        }
        Ok(run)
    }

    /// Translates two inputs and shows them on the four channels.
    pub async fn translate(
        &self,
        translator: &Translator,
        inputs: [&str; 2],
        targets: [&str; 2],
    ) -> Result<Snapshot, DebateError> {
        let snapshot = translator.translate_pair(inputs, targets).await?;
        self.present(&snapshot).await;
        Ok(snapshot)
    }

    async fn present(&self, snapshot: &Snapshot) {
        self.sink.show(snapshot).await;
        if !self.pace.is_zero() {
            sleep(self.pace).await;
        }
    }
}

/// What the session is about to wait for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Waiting {
    /// Seeds are being refined.
    Refining,
    /// The given 1-based round is being played.
    Round(u32),
    /// The agents are writing their conclusions.
    Concluding,
}
