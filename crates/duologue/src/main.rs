//! Stages a debate between two language models.

#[macro_use]
extern crate tracing;

use std::process::ExitCode;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use clap::Parser;
use duologue::core::{
    Agent, DebateBuilder, DebateError, Prompts, Snapshot, Translator,
};
use duologue::prompt::Prompter;
use duologue::settings::{
    Cli, Command, DebateArgs, DisplayArgs, ModelArgs, TranslateArgs,
    parse_rounds,
};
use duologue::sink::{ConsoleSink, PresentationSink, RelaySink};
use duologue::transport::SerialTransport;
use duologue::{Session, Waiting};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

type Screens = (ConsoleSink, Option<RelaySink<SerialTransport>>);

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    // Fatal errors are reported once, on exit. Without `RUST_LOG` only
    // warnings such as skipped relay writes are logged.
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let Cli {
        model,
        display,
        command,
    } = Cli::parse();

    let result = match command.unwrap_or_default() {
        Command::Debate(args) => debate(&model, &display, args).await,
        Command::Translate(args) => translate(&model, &display, args).await,
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

async fn debate(
    model: &ModelArgs,
    display: &DisplayArgs,
    args: DebateArgs,
) -> Result<(), DebateError> {
    let mut prompter = Prompter::stdin();
    let rounds = prompter
        .ask_unless(args.rounds, "Number of rounds: ", "--rounds")
        .await?;
    let rounds = parse_rounds(&rounds)?;
    let seed1 = prompter
        .ask_unless(args.agent1, "Starting statement for Agent 1: ", "--agent1")
        .await?;
    let seed2 = prompter
        .ask_unless(args.agent2, "Starting statement for Agent 2: ", "--agent2")
        .await?;

    let mut prompts = Prompts::default();
    if let Some(terminator) = args.terminator {
        prompts = prompts.with_terminator(terminator);
    }
    let debate = DebateBuilder::with_model_providers(
        model.provider_for(Agent::First)?,
        model.provider_for(Agent::Second)?,
    )
    .with_prompts(prompts)
    .with_layout(args.layout.into())
    .refine_seeds(!args.no_refine)
    .build();

    let spinner = Spinner::default();
    let session = Session::new(Attended {
        spinner: spinner.clone(),
        sink: display_sink(display),
    })
    .with_pace(display.pace());

    let run = session
        .debate(&debate, [seed1.as_str(), seed2.as_str()], rounds, |waiting| {
            spinner.wait(match waiting {
                Waiting::Refining => "🤔 Preparing the opening...".to_owned(),
                Waiting::Round(round) => format!("🤔 Round {round}..."),
                Waiting::Concluding => "🤔 Concluding...".to_owned(),
            })
        })
        .await;
    spinner.clear();
    report_relay(&session.sink().sink);
    let run = run?;

    if args.show_conversation {
        print!("{}", run.conversation(Agent::First).render());
    }
    Ok(())
}

async fn translate(
    model: &ModelArgs,
    display: &DisplayArgs,
    args: TranslateArgs,
) -> Result<(), DebateError> {
    let mut prompter = Prompter::stdin();
    let first = prompter.ask_unless(args.first, "Input 1: ", "--first").await?;
    let second = prompter
        .ask_unless(args.second, "Input 2: ", "--second")
        .await?;

    let translator =
        Translator::with_model_provider(model.provider_for(Agent::First)?);
    let spinner = Spinner::default();
    let session = Session::new(Attended {
        spinner: spinner.clone(),
        sink: display_sink(display),
    });

    spinner.wait("🤔 Translating...".to_owned());
    let result = session
        .translate(
            &translator,
            [first.as_str(), second.as_str()],
            [args.first_language.as_str(), args.second_language.as_str()],
        )
        .await;
    spinner.clear();
    report_relay(&session.sink().sink);
    result.map(|_| ())
}

fn display_sink(display: &DisplayArgs) -> Screens {
    let relay = (!display.ports.is_empty()).then(|| {
        let relay = RelaySink::new(
            SerialTransport::new(display.baud),
            display.ports.clone(),
        );
        if display.newline {
            relay.with_line_ending("\n")
        } else {
            relay
        }
    });
    (ConsoleSink::new(), relay)
}

fn report_relay(screens: &Screens) {
    if let Some(relay) = &screens.1 {
        let failures = relay.failures();
        if failures > 0 {
            warn!("{failures} relay write(s) failed during this run");
        }
    }
}

/// A spinner shown while the models think.
#[derive(Clone, Default)]
struct Spinner(Arc<Mutex<Option<ProgressBar>>>);

impl Spinner {
    fn wait(&self, message: String) {
        let progress_bar = ProgressBar::new_spinner();
        progress_bar.set_style(
            ProgressStyle::default_spinner().tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );
        progress_bar.set_message(message);
        progress_bar.enable_steady_tick(Duration::from_millis(100));

        let mut slot = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(old) = slot.replace(progress_bar) {
            old.finish_and_clear();
        }
    }

    fn clear(&self) {
        let old = self.0.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(progress_bar) = old {
            progress_bar.finish_and_clear();
        }
    }
}

/// Clears the spinner before anything is displayed.
struct Attended<S> {
    spinner: Spinner,
    sink: S,
}

impl<S: PresentationSink> PresentationSink for Attended<S> {
    async fn show(&self, snapshot: &Snapshot) {
        self.spinner.clear();
        self.sink.show(snapshot).await;
    }
}
