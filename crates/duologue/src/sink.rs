//! Where snapshots go: the console, serial devices, or both.

use std::io::{IsTerminal, Write as _};
use std::sync::atomic::{AtomicU64, Ordering};

use duologue_core::{FIELD_LABELS, Snapshot, Stage};
use futures_util::future::join_all;
use owo_colors::OwoColorize;

use crate::transport::Transport;

/// Displays snapshots.
///
/// Showing a snapshot never fails: problems on the way to a display are
/// reported and skipped, so the debate itself is never interrupted.
pub trait PresentationSink: Send + Sync {
    /// Shows `snapshot`.
    fn show(&self, snapshot: &Snapshot) -> impl Future<Output = ()> + Send;
}

impl<A: PresentationSink, B: PresentationSink> PresentationSink for (A, B) {
    async fn show(&self, snapshot: &Snapshot) {
        self.0.show(snapshot).await;
        self.1.show(snapshot).await;
    }
}

impl<S: PresentationSink> PresentationSink for Option<S> {
    async fn show(&self, snapshot: &Snapshot) {
        if let Some(sink) = self {
            sink.show(snapshot).await;
        }
    }
}

/// Renders a snapshot as labelled lines followed by a blank line.
pub fn render(snapshot: &Snapshot, colored: bool) -> String {
    let mut out = String::new();
    let heading = match snapshot.stage {
        Stage::Opening | Stage::Translation => None,
        Stage::Round(round) => Some(format!("Round {round}")),
        Stage::Conclusion => Some("Conclusion".to_owned()),
    };
    if let Some(heading) = heading {
        if colored {
            out.push_str(&format!("{}\n", heading.bright_yellow().bold()));
        } else {
            out.push_str(&format!("{heading}\n"));
        }
    }
    let fields = FIELD_LABELS.iter().zip(snapshot.fields());
    for (idx, (label, field)) in fields.enumerate() {
        let label = match snapshot.stage {
            Stage::Translation => format!("Channel {}", idx + 1),
            _ => (*label).to_owned(),
        };
        if colored {
            out.push_str(&format!("{}: {field}\n", label.bright_cyan()));
        } else {
            out.push_str(&format!("{label}: {field}\n"));
        }
    }
    out.push('\n');
    out
}

/// Prints snapshots to standard output.
#[derive(Debug)]
pub struct ConsoleSink {
    colored: bool,
}

impl ConsoleSink {
    /// Creates a console sink that colors its output when standard
    /// output is a terminal.
    #[inline]
    pub fn new() -> Self {
        Self {
            colored: std::io::stdout().is_terminal(),
        }
    }
}

impl Default for ConsoleSink {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl PresentationSink for ConsoleSink {
    async fn show(&self, snapshot: &Snapshot) {
        let text = render(snapshot, self.colored);
        let mut stdout = std::io::stdout().lock();
        if let Err(err) = stdout.write_all(text.as_bytes()).and_then(|_| stdout.flush()) {
            warn!("cannot print snapshot: {err}");
        }
    }
}

/// Mirrors snapshot fields to ports, field `i` to port `i`.
///
/// Extra fields or extra ports are left alone. Writes for one snapshot
/// are issued together, and a failed write is logged and skipped.
pub struct RelaySink<T> {
    transport: T,
    ports: Vec<String>,
    line_ending: Option<String>,
    failures: AtomicU64,
}

impl<T: Transport> RelaySink<T> {
    /// Creates a relay over `transport` to `ports`, in field order.
    #[inline]
    pub fn new(transport: T, ports: Vec<String>) -> Self {
        Self {
            transport,
            ports,
            line_ending: None,
            failures: AtomicU64::new(0),
        }
    }

    /// Appends `line_ending` to every relayed field.
    #[inline]
    pub fn with_line_ending<S: Into<String>>(mut self, line_ending: S) -> Self {
        self.line_ending = Some(line_ending.into());
        self
    }

    /// Returns how many writes have failed so far.
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }
}

impl<T: Transport> PresentationSink for RelaySink<T> {
    async fn show(&self, snapshot: &Snapshot) {
        let writes = self.ports.iter().zip(snapshot.fields()).map(|(port, field)| {
            let mut payload = field.to_owned();
            if let Some(line_ending) = &self.line_ending {
                payload.push_str(line_ending);
            }
            let write = self.transport.write(port, payload.into_bytes());
            async move { (port, write.await) }
        });

        for (port, result) in join_all(writes).await {
            match result {
                Ok(()) => debug!("relayed {} to {port}", snapshot.stage),
                Err(err) => {
                    warn!("relay skipped: {err}");
                    self.failures.fetch_add(1, Ordering::Relaxed);
                }
            }
        }
    }
}
