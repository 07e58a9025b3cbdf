//! Interactive questions for settings missing from the command line.

use std::io::Write as _;

use duologue_core::ConfigurationError;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin, stdin};

/// Asks questions on standard output and reads the answers line by line.
///
/// One prompter owns the input for the whole run. Answers that arrive
/// together, e.g. from a pipe, are kept for the questions that follow.
pub struct Prompter<R> {
    lines: Lines<R>,
}

impl Prompter<BufReader<Stdin>> {
    /// Creates a prompter reading standard input.
    pub fn stdin() -> Self {
        Self::new(BufReader::new(stdin()))
    }
}

impl<R: AsyncBufRead + Unpin> Prompter<R> {
    /// Creates a prompter reading `reader`.
    #[inline]
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
        }
    }

    /// Prints `prompt` and returns the trimmed answer.
    ///
    /// Running out of input means the value was never given, which is
    /// reported as the missing `setting`.
    pub async fn ask(
        &mut self,
        prompt: &str,
        setting: &'static str,
    ) -> Result<String, ConfigurationError> {
        print!("{prompt}");
        std::io::stdout().flush().ok();

        match self.lines.next_line().await {
            Ok(Some(line)) => Ok(line.trim().to_owned()),
            Ok(None) => Err(ConfigurationError::MissingSetting(setting)),
            Err(err) => {
                warn!("error reading input: {}", err);
                Err(ConfigurationError::MissingSetting(setting))
            }
        }
    }

    /// Returns `given` if present, otherwise asks for it.
    pub async fn ask_unless(
        &mut self,
        given: Option<String>,
        prompt: &str,
        setting: &'static str,
    ) -> Result<String, ConfigurationError> {
        match given {
            Some(value) => Ok(value),
            None => self.ask(prompt, setting).await,
        }
    }
}
