//! Append-only conversation history owned by the dialogue engine.

use super::message::Message;

/// Ordered model context.
///
/// The only mutation is [`Conversation::push`]; re-initialization builds a new
/// value and replaces the old one wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    /// Build the `[system, user]` seed conversation
    pub fn seeded(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(system), Message::user(user)],
        }
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn extend(&mut self, messages: impl IntoIterator<Item = Message>) {
        self.messages.extend(messages);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dialogue::Role;

    #[test]
    fn test_seeded_conversation_has_two_messages() {
        let conversation = Conversation::seeded("persona", "rules");
        assert_eq!(conversation.len(), 2);
        assert_eq!(conversation.messages()[0].role, Role::System);
        assert_eq!(conversation.messages()[1].role, Role::User);
        assert_eq!(conversation.messages()[0].content, "persona");
    }

    #[test]
    fn test_push_preserves_insertion_order() {
        let mut conversation = Conversation::seeded("s", "u");
        conversation.push(Message::user("first"));
        conversation.push(Message::assistant("second"));

        let contents: Vec<&str> = conversation
            .messages()
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(contents, vec!["s", "u", "first", "second"]);
    }
}
