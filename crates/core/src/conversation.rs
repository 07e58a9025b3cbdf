//! Conversation-related types.

use duologue_model::{ModelMessage, Role};

/// The role-tagged message history one agent sends to its model.
///
/// A conversation starts with the system instructions and the agent's
/// stance, and then only grows: the opponent's lines are appended as
/// `user` messages and the agent's own lines as `assistant` messages.
#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub struct Conversation {
    messages: Vec<ModelMessage>,
}

impl Conversation {
    /// Starts a conversation with system instructions and an opening
    /// user message.
    pub fn new(instructions: impl Into<String>, opening: impl Into<String>) -> Self {
        Self {
            messages: vec![
                ModelMessage::System(instructions.into()),
                ModelMessage::User(opening.into()),
            ],
        }
    }

    /// Appends a line heard from the other side.
    #[inline]
    pub(crate) fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(ModelMessage::User(content.into()));
    }

    /// Appends a line this agent generated.
    #[inline]
    pub(crate) fn push_assistant(&mut self, content: impl Into<String>) {
        debug_assert_ne!(
            self.messages.last().map(ModelMessage::role),
            Some(Role::Assistant),
            "two consecutive assistant messages"
        );
        self.messages.push(ModelMessage::Assistant(content.into()));
    }

    /// Returns all messages in order.
    #[inline]
    pub fn messages(&self) -> &[ModelMessage] {
        &self.messages
    }

    /// Returns the contents of the `assistant` messages in order.
    pub fn assistant_turns(&self) -> impl Iterator<Item = &str> {
        self.messages
            .iter()
            .filter(|msg| msg.role() == Role::Assistant)
            .map(ModelMessage::content)
    }

    /// Renders the dialogue part of the conversation, one
    /// `Role: content` paragraph per message. System instructions are
    /// left out.
    pub fn render(&self) -> String {
        self.messages
            .iter()
            .filter_map(|msg| {
                let label = match msg.role() {
                    Role::System => return None,
                    Role::User => "User",
                    Role::Assistant => "Assistant",
                };
                Some(format!("{label}: {}\n", msg.content()))
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
