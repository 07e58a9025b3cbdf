/// The literal tag every conclusion is asked to start with.
pub const CONCLUSION_TAG: &str = "[Summarize]";

const DEFAULT_REFINE: &str =
    "Refine this into a professional debate statement, limit to 15 words.";
const DEFAULT_DEBATER: &str = "You are a debater, limit to 15 words.";
const DEFAULT_CONCLUSION: &str = "Output Start with [Summarize], Summarize \
    the debate from your argument in 15 words, did you lose?";

/// System instructions used at each step of a debate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Prompts {
    /// Turns a raw seed into a short, professional statement.
    pub refine: String,
    /// Steers every debating turn.
    pub debater: String,
    /// Asks for the one-line verdict.
    pub conclusion: String,
    terminator: Option<String>,
}

impl Default for Prompts {
    fn default() -> Self {
        Self {
            refine: DEFAULT_REFINE.to_owned(),
            debater: DEFAULT_DEBATER.to_owned(),
            conclusion: DEFAULT_CONCLUSION.to_owned(),
            terminator: None,
        }
    }
}

impl Prompts {
    /// Asks the model to end every response with `terminator`, so a
    /// device reading the relayed text can tell where a message ends.
    #[inline]
    pub fn with_terminator<S: Into<String>>(mut self, terminator: S) -> Self {
        self.terminator = Some(terminator.into());
        self
    }

    /// Returns the configured response terminator.
    #[inline]
    pub fn terminator(&self) -> Option<&str> {
        self.terminator.as_deref()
    }

    pub(crate) fn refine_instruction(&self) -> String {
        self.finish(&self.refine)
    }

    pub(crate) fn debater_instruction(&self) -> String {
        self.finish(&self.debater)
    }

    pub(crate) fn conclusion_instruction(&self) -> String {
        self.finish(&self.conclusion)
    }

    fn finish(&self, instruction: &str) -> String {
        match &self.terminator {
            Some(terminator) => format!(
                "{instruction} YOU MUST END YOUR RESPONSE WITH {terminator}"
            ),
            None => instruction.to_owned(),
        }
    }
}
