//! Follow-up conversation about a suggested career.

use std::sync::Arc;
use tracing::instrument;

use crate::generation::{ChatMessage, GenerationProvider};

/// Acknowledgement the model is seeded with after the preamble.
pub const ACKNOWLEDGEMENT: &str = "Understood. Accessing database. Ready for query.";
/// Reply recorded when the provider call fails.
pub const FAILURE_REPLY: &str = "Connection unstable. Data packet lost.";

pub fn preamble(title: &str) -> String {
    format!(
        "You are Nexus AI. We are discussing my potential career as a {}. Be concise, futuristic, and helpful.",
        title
    )
}

/// A multi-turn conversation scoped to one career title.
///
/// The first two turns of the history are the preamble and the model
/// acknowledgement; [`CareerChat::messages`] hides them.
pub struct CareerChat {
    provider: Arc<dyn GenerationProvider>,
    title: String,
    history: Vec<ChatMessage>,
}

impl CareerChat {
    pub fn new(provider: Arc<dyn GenerationProvider>, title: impl Into<String>) -> Self {
        let title = title.into();
        let history = vec![
            ChatMessage::user().content(preamble(&title)).build(),
            ChatMessage::model().content(ACKNOWLEDGEMENT).build(),
        ];
        Self {
            provider,
            title,
            history,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Turns exchanged after the seed.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.history[2..]
    }

    /// Sends `input` and returns the model reply. Blank input is ignored
    /// and returns `None`; a failed call yields [`FAILURE_REPLY`].
    #[instrument(name = "career_chat.send", skip_all, fields(title = %self.title))]
    pub async fn send(&mut self, input: &str) -> Option<String> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }
        self.history.push(ChatMessage::user().content(input).build());

        let reply = match self.provider.chat(&self.history).await {
            Ok(text) => text,
            Err(e) => {
                log::warn!("career chat call failed: {}", e);
                FAILURE_REPLY.to_string()
            }
        };
        self.history
            .push(ChatMessage::model().content(reply.clone()).build());
        Some(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AstraError;
    use crate::generation::ChatRole;
    use crate::test_utils::MockGenerationProvider;

    #[tokio::test]
    async fn test_history_is_seeded_and_sent() {
        let mut provider = MockGenerationProvider::new();
        provider
            .expect_chat()
            .times(1)
            .withf(|messages| {
                messages.len() == 3
                    && messages[0].content
                        == "You are Nexus AI. We are discussing my potential career as a Bio-Architect. Be concise, futuristic, and helpful."
                    && messages[1].role == ChatRole::Model
                    && messages[1].content == ACKNOWLEDGEMENT
                    && messages[2].content == "What should I study?"
            })
            .returning(|_| Ok("Synthetic biology.".to_string()));

        let mut chat = CareerChat::new(Arc::new(provider), "Bio-Architect");
        let reply = chat.send("  What should I study? ").await;
        assert_eq!(reply.as_deref(), Some("Synthetic biology."));
        assert_eq!(chat.messages().len(), 2);
        assert_eq!(chat.messages()[1].role, ChatRole::Model);
    }

    #[tokio::test]
    async fn test_failure_reply_is_recorded() {
        let mut provider = MockGenerationProvider::new();
        provider
            .expect_chat()
            .times(1)
            .returning(|_| Err(AstraError::HttpError("connection reset".into())));

        let mut chat = CareerChat::new(Arc::new(provider), "Quantum Physicist");
        let reply = chat.send("Salary?").await;
        assert_eq!(reply.as_deref(), Some(FAILURE_REPLY));
        assert_eq!(chat.messages()[1].content, FAILURE_REPLY);
    }

    #[tokio::test]
    async fn test_blank_input_is_ignored() {
        let mut provider = MockGenerationProvider::new();
        provider.expect_chat().never();

        let mut chat = CareerChat::new(Arc::new(provider), "Bio-Architect");
        assert_eq!(chat.send("   ").await, None);
        assert!(chat.messages().is_empty());
    }
}
