//! A local fake model for testing purpose.

mod preset;

use std::collections::VecDeque;
use std::error::Error as StdError;
use std::fmt::{self, Display, Formatter};
use std::future::ready;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll, ready};
use std::time::Duration;

use duologue_model::{
    ErrorKind, ModelFinishReason, ModelProvider, ModelProviderError,
    ModelRequest, ModelResponse, ModelResponseEvent, Role,
};
use tokio::time::{Sleep, sleep};

pub use preset::*;

/// Pause before every streamed event.
const STREAM_DELAY: Duration = Duration::from_millis(1);

#[derive(Debug)]
pub struct Error {
    message: &'static str,
    kind: ErrorKind,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.message)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

pub struct TestModelResponse {
    events: VecDeque<PresetEvent>,
    completed: bool,
    delay: Duration,
    sleep: Option<Pin<Box<Sleep>>>,
}

impl ModelResponse for TestModelResponse {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        let this = self.get_mut();

        if let Some(sleep) = &mut this.sleep {
            ready!(sleep.as_mut().poll(cx));
            this.sleep = None;

            return Poll::Ready(match this.events.pop_front() {
                Some(PresetEvent::MessageDelta(msg)) => {
                    Ok(Some(ModelResponseEvent::MessageDelta(msg)))
                }
                Some(PresetEvent::StreamError) => {
                    this.events.clear();
                    this.completed = true;
                    Err(Error {
                        message: "stream broken",
                        kind: ErrorKind::Other,
                    })
                }
                None if !this.completed => {
                    this.completed = true;
                    Ok(Some(ModelResponseEvent::Completed(
                        ModelFinishReason::Stop,
                    )))
                }
                // In case this method is called after completion.
                None => Ok(None),
            });
        }
        if this.completed && this.events.is_empty() {
            return Poll::Ready(Ok(None));
        }
        this.sleep = Some(Box::pin(sleep(this.delay)));
        Pin::new(this).poll_next_event(cx)
    }
}

#[derive(Default)]
enum Script {
    /// Answers every request with `"<role>-reply-to:<last content>"`.
    Echo,
    /// Serves preset responses in order.
    #[default]
    Preset,
}

#[derive(Default)]
struct State {
    script: Script,
    presets: VecDeque<PresetResponse>,
    requests: Vec<ModelRequest>,
    fail_on: Option<usize>,
}

/// A local fake model for testing purpose.
///
/// The provider either echoes the last message of every request, or serves
/// a queue of preset responses in order. If the queue runs dry, an error is
/// returned. Clones share the same script and request log, so a test can
/// keep a clone around to inspect what the code under test has sent.
///
/// # Note
///
/// This type is not optimized for production use, there are heavy memory
/// copies involved. You should only use it for testing.
#[derive(Clone, Default)]
pub struct TestModelProvider {
    state: Arc<Mutex<State>>,
}

impl TestModelProvider {
    /// Creates a provider that replies to every request with the role it
    /// answers as, followed by `-reply-to:` and the content of the last
    /// message in the request.
    #[inline]
    pub fn echo() -> Self {
        let provider = Self::default();
        provider.lock().script = Script::Echo;
        provider
    }

    #[inline]
    pub fn add_response(&mut self, preset: PresetResponse) {
        self.lock().presets.push_back(preset);
    }

    /// Makes the `n`-th request (1-based, counted across all clones) fail.
    #[inline]
    pub fn fail_on_request(&mut self, n: usize) {
        self.lock().fail_on = Some(n);
    }

    /// Returns every request received so far, in arrival order.
    pub fn requests(&self) -> Vec<ModelRequest> {
        self.lock().requests.clone()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A panicking test thread must not hide the log from the others.
        self.state.lock().unwrap_or_else(|err| err.into_inner())
    }
}

impl ModelProvider for TestModelProvider {
    type Error = crate::Error;
    type Response = TestModelResponse;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        let mut state = self.lock();
        state.requests.push(req.clone());
        let request_no = state.requests.len();

        let result = 'blk: {
            if state.fail_on == Some(request_no) {
                break 'blk Err(Error {
                    message: "scripted failure",
                    kind: ErrorKind::Other,
                });
            }

            let preset = match state.script {
                Script::Echo => {
                    let Some(last) = req.messages.last() else {
                        break 'blk Err(Error {
                            message: "empty request",
                            kind: ErrorKind::Other,
                        });
                    };
                    PresetResponse::with_text(format!(
                        "{}-reply-to:{}",
                        Role::Assistant,
                        last.content()
                    ))
                }
                Script::Preset => match state.presets.pop_front() {
                    Some(preset) => preset,
                    None => {
                        break 'blk Err(Error {
                            message: "no enough steps",
                            kind: ErrorKind::RateLimitExceeded,
                        });
                    }
                },
            };
            if preset.rejected {
                break 'blk Err(Error {
                    message: "rejected",
                    kind: ErrorKind::Moderated,
                });
            }

            Ok(TestModelResponse {
                events: preset.events.into(),
                completed: false,
                delay: STREAM_DELAY,
                sleep: None,
            })
        };
        ready(result)
    }
}
