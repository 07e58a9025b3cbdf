use std::io;
use std::sync::{Arc, Mutex};

use duologue_model::{ModelMessage, Role};
use duologue_test_model::{PresetResponse, TestModelProvider};

use crate::error::{Agent, ConfigurationError, DebateError, GenerationError, Stage};
use crate::transcript::parse_transcript;
use crate::{DebateBuilder, Prompts, Snapshot, SnapshotLayout};

const CATS: &str = "Cats are better pets.";
const DOGS: &str = "Dogs are better pets.";

fn reply_to(text: &str) -> String {
    format!("assistant-reply-to:{text}")
}

async fn collect(
    provider: TestModelProvider,
    rounds: u32,
) -> (crate::DebateRun, Vec<Snapshot>) {
    let debate = DebateBuilder::with_model_provider(provider).build();
    let mut snapshots = vec![];
    let run = debate
        .run(CATS, DOGS, rounds, |snapshot| snapshots.push(snapshot.clone()))
        .await
        .unwrap();
    (run, snapshots)
}

#[tokio::test]
async fn test_echo_scenario() {
    let (run, snapshots) = collect(TestModelProvider::echo(), 1).await;

    let refined1 = reply_to(CATS);
    let refined2 = reply_to(DOGS);
    let line1 = reply_to(&refined1);
    let line2 = reply_to(&line1);
    assert_eq!(
        run.transcript(Agent::First).points(),
        [refined1.clone(), line1.clone()]
    );
    assert_eq!(
        run.transcript(Agent::Second).points(),
        [refined2.clone(), line2.clone()]
    );

    assert_eq!(snapshots.len(), 2);
    assert_eq!(
        snapshots[0],
        Snapshot::new(
            Stage::Round(1),
            [refined1.clone(), line2.clone(), refined2.clone(), line1.clone()]
        )
    );

    let last = &snapshots[1];
    assert_eq!(last.stage, Stage::Conclusion);
    assert_eq!(
        last.agent1_front,
        reply_to(&format!("{refined1} {line1}"))
    );
    assert_eq!(
        last.agent1_back,
        format!("Point 1: {refined1}\nPoint 2: {line1}")
    );
    assert_eq!(
        last.agent2_front,
        reply_to(&format!("{refined2} {line2}"))
    );
    assert_eq!(parse_transcript(&last.agent2_back), [refined2, line2]);
    assert_eq!(run.conclusion(Agent::First), Some(last.agent1_front.as_str()));
    assert!(run.is_finished());
}

#[tokio::test]
async fn test_snapshot_and_transcript_counts() {
    for rounds in 0..4 {
        let (run, snapshots) = collect(TestModelProvider::echo(), rounds).await;
        assert_eq!(snapshots.len(), rounds as usize + 1);
        for (idx, snapshot) in snapshots[..rounds as usize].iter().enumerate() {
            assert_eq!(snapshot.stage, Stage::Round(idx as u32 + 1));
        }
        assert_eq!(snapshots.last().unwrap().stage, Stage::Conclusion);
        for agent in Agent::BOTH {
            assert_eq!(run.transcript(agent).len(), rounds as usize + 1);
        }
        assert_eq!(run.completed_rounds(), rounds);
    }
}

#[tokio::test]
async fn test_zero_rounds_concludes_on_seeds() {
    let provider = TestModelProvider::echo();
    let observer = provider.clone();
    let (run, snapshots) = collect(provider, 0).await;

    assert_eq!(snapshots.len(), 1);
    assert_eq!(snapshots[0].stage, Stage::Conclusion);
    assert_eq!(run.transcript(Agent::First).points(), [reply_to(CATS)]);
    assert_eq!(run.transcript(Agent::Second).points(), [reply_to(DOGS)]);
    // Two refinements and two conclusions, nothing else.
    assert_eq!(observer.requests().len(), 4);
}

#[tokio::test]
async fn test_conversations_match_transcripts() {
    let (run, _) = collect(TestModelProvider::echo(), 3).await;

    for agent in Agent::BOTH {
        let conversation = run.conversation(agent);
        let assistant_turns: Vec<_> = conversation.assistant_turns().collect();
        assert_eq!(assistant_turns, run.transcript(agent).points()[1..]);

        let roles: Vec<_> =
            conversation.messages().iter().map(ModelMessage::role).collect();
        assert_eq!(roles[0], Role::System);
        for pair in roles.windows(2) {
            assert!(pair != [Role::Assistant, Role::Assistant]);
        }
    }

    // Each agent's lines reach the opponent verbatim as user messages.
    let first = run.conversation(Agent::First).messages();
    let second = run.conversation(Agent::Second).messages();
    let heard_by_second: Vec<_> = second[2..]
        .iter()
        .filter(|msg| msg.role() == Role::User)
        .map(ModelMessage::content)
        .collect();
    let said_by_first: Vec<_> =
        run.conversation(Agent::First).assistant_turns().collect();
    assert_eq!(heard_by_second, said_by_first);
    assert_eq!(first.len(), 2 + 2 * 3);
}

#[tokio::test]
async fn test_second_agent_sees_fresh_line() {
    let provider = TestModelProvider::echo();
    let observer = provider.clone();
    collect(provider, 2).await;

    // Requests: refine 1, refine 2, then per round agent 1 and agent 2.
    let requests = observer.requests();
    for round in 0..2 {
        let first_request = &requests[2 + round * 2];
        let second_request = &requests[3 + round * 2];
        let first_line = reply_to(first_request.messages.last().unwrap().content());
        assert_eq!(
            second_request.messages.last(),
            Some(&ModelMessage::User(first_line))
        );
    }
}

#[tokio::test]
async fn test_failure_aborts_round() {
    // Two refinements come first, so round `k` starts at request 2k + 1.
    for (fail_on, round) in [(3, 1), (4, 1), (6, 2), (8, 3)] {
        let mut provider = TestModelProvider::echo();
        provider.fail_on_request(fail_on);
        let debate = DebateBuilder::with_model_provider(provider).build();
        let mut run = debate.start(CATS, DOGS, 5).await.unwrap();

        let mut snapshots = vec![];
        let err = loop {
            match run.next_snapshot().await {
                Some(Ok(snapshot)) => snapshots.push(snapshot),
                Some(Err(err)) => break err,
                None => panic!("run ended without an error"),
            }
        };
        assert_eq!(err.round(), Some(round));
        assert_eq!(snapshots.len() as u32, round - 1);
        assert!(snapshots.iter().all(|s| s.stage != Stage::Round(round)));
        assert!(run.next_snapshot().await.is_none());

        // The failing round left nothing behind.
        assert_eq!(run.completed_rounds(), round - 1);
        for agent in Agent::BOTH {
            assert_eq!(run.transcript(agent).len(), round as usize);
        }
    }
}

#[tokio::test]
async fn test_refinement_and_conclusion_failures() {
    let mut provider = TestModelProvider::echo();
    provider.fail_on_request(2);
    let debate = DebateBuilder::with_model_provider(provider).build();
    let err = debate.start(CATS, DOGS, 1).await.err().unwrap();
    assert!(matches!(
        err,
        DebateError::Generation {
            stage: Stage::Opening,
            agent: Agent::Second,
            ..
        }
    ));
    assert_eq!(err.round(), None);

    let mut provider = TestModelProvider::echo();
    // refine x2, round 1 x2, then the second conclusion.
    provider.fail_on_request(6);
    let debate = DebateBuilder::with_model_provider(provider).build();
    let err = debate.run(CATS, DOGS, 1, |_| {}).await.err().unwrap();
    assert!(matches!(
        err,
        DebateError::Generation {
            stage: Stage::Conclusion,
            agent: Agent::Second,
            ..
        }
    ));
}

#[derive(Clone, Default)]
struct CapturedLog(Arc<Mutex<Vec<u8>>>);

impl io::Write for CapturedLog {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn test_failure_is_left_to_the_caller_to_report() {
    let log = CapturedLog::default();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_writer({
            let log = log.clone();
            move || log.clone()
        })
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let mut provider = TestModelProvider::echo();
    // refine x2, round 1 x2, then agent 1 in round 2.
    provider.fail_on_request(5);
    let debate = DebateBuilder::with_model_provider(provider).build();
    let err = debate.run(CATS, DOGS, 3, |_| {}).await.err().unwrap();
    assert_eq!(err.round(), Some(2));

    let log = String::from_utf8(log.0.lock().unwrap().clone()).unwrap();
    assert!(log.contains("round 2: agent 1 failed"), "{log}");
    assert!(!log.contains("ERROR"), "{log}");
}

#[tokio::test]
async fn test_empty_response_is_a_failure() {
    let mut provider = TestModelProvider::default();
    provider.add_response(PresetResponse::with_text(CATS));
    provider.add_response(PresetResponse::with_text(DOGS));
    provider.add_response(PresetResponse::with_text("   "));
    let debate = DebateBuilder::with_model_provider(provider).build();

    let err = debate.run(CATS, DOGS, 1, |_| {}).await.err().unwrap();
    assert_eq!(err.round(), Some(1));
    assert!(matches!(
        err,
        DebateError::Generation {
            source: GenerationError::EmptyResponse,
            ..
        }
    ));
}

#[tokio::test]
async fn test_empty_seed_is_rejected() {
    let provider = TestModelProvider::echo();
    let observer = provider.clone();
    let debate = DebateBuilder::with_model_provider(provider).build();

    let err = debate.start(CATS, " \n", 2).await.err().unwrap();
    assert_eq!(
        err,
        DebateError::Configuration(ConfigurationError::EmptySeed(Agent::Second))
    );
    assert!(observer.requests().is_empty());
}

#[tokio::test]
async fn test_options() {
    let first = TestModelProvider::echo();
    let second = TestModelProvider::echo();
    let first_log = first.clone();
    let second_log = second.clone();
    let debate = DebateBuilder::with_model_providers(first, second)
        .refine_seeds(false)
        .with_layout(SnapshotLayout::OwnLatest)
        .with_prompts(Prompts::default().with_terminator("_"))
        .build();

    let mut run = debate.start(CATS, DOGS, 1).await.unwrap();
    assert_eq!(
        run.opening().fields(),
        [CATS, CATS, DOGS, DOGS]
    );
    let snapshot = run.next_snapshot().await.unwrap().unwrap();
    let line1 = reply_to(CATS);
    let line2 = reply_to(&line1);
    assert_eq!(snapshot.fields(), [CATS, line1.as_str(), DOGS, line2.as_str()]);

    // Each agent only talks to its own provider.
    let first_requests = first_log.requests();
    assert_eq!(first_requests.len(), 1);
    assert!(
        first_requests[0].messages[0]
            .content()
            .ends_with("YOU MUST END YOUR RESPONSE WITH _")
    );
    assert_eq!(second_log.requests().len(), 1);
}

#[tokio::test]
async fn test_opening_shows_raw_and_refined() {
    let debate =
        DebateBuilder::with_model_provider(TestModelProvider::echo()).build();
    let run = debate.start("  cats rule ", "dogs rule", 0).await.unwrap();
    assert_eq!(
        run.opening(),
        Snapshot::new(
            Stage::Opening,
            [
                "cats rule".to_owned(),
                reply_to("cats rule"),
                "dogs rule".to_owned(),
                reply_to("dogs rule"),
            ]
        )
    );
}
