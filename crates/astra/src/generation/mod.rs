use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AstraError;

pub mod http;

/// Role of a participant in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatRole {
    /// The human participant
    User,
    /// The generative model
    Model,
}

/// The supported MIME type of an inline attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum MediaMime {
    /// JPEG image
    JPEG,
    /// PNG image
    PNG,
    /// GIF image
    GIF,
    /// WebP image
    WEBP,
    /// PDF document
    PDF,
}

impl MediaMime {
    pub fn mime_type(&self) -> &'static str {
        match self {
            MediaMime::JPEG => "image/jpeg",
            MediaMime::PNG => "image/png",
            MediaMime::GIF => "image/gif",
            MediaMime::WEBP => "image/webp",
            MediaMime::PDF => "application/pdf",
        }
    }

    /// Sniffs the media type from the leading magic bytes.
    pub fn detect(data: &[u8]) -> Option<Self> {
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(MediaMime::JPEG)
        } else if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            Some(MediaMime::PNG)
        } else if data.starts_with(&[0x47, 0x49, 0x46]) {
            Some(MediaMime::GIF)
        } else if data.len() >= 12 && &data[..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            Some(MediaMime::WEBP)
        } else if data.starts_with(b"%PDF") {
            Some(MediaMime::PDF)
        } else {
            None
        }
    }
}

/// One piece of a prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PromptPart {
    /// Plain text instructions
    Text(String),
    /// Binary attachment sent inline next to the text
    InlineData { mime: MediaMime, data: Vec<u8> },
}

/// Content sent to a generation provider in a single call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Prompt {
    /// Ordered prompt parts
    pub parts: Vec<PromptPart>,
    /// JSON schema the provider should constrain its answer to, if it supports it
    pub response_schema: Option<Value>,
}

impl Prompt {
    /// Shorthand for a text-only prompt.
    pub fn text(text: impl Into<String>) -> Self {
        Prompt::builder().text(text).build()
    }

    pub fn builder() -> PromptBuilder {
        PromptBuilder::default()
    }

    /// Concatenated text parts, attachments skipped.
    pub fn text_content(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                PromptPart::Text(t) => Some(t.as_str()),
                PromptPart::InlineData { .. } => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Builder for Prompt
#[derive(Debug, Default)]
pub struct PromptBuilder {
    parts: Vec<PromptPart>,
    response_schema: Option<Value>,
}

impl PromptBuilder {
    /// Append a text part
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.parts.push(PromptPart::Text(text.into()));
        self
    }

    /// Append an inline binary part
    pub fn inline(mut self, mime: MediaMime, data: Vec<u8>) -> Self {
        self.parts.push(PromptPart::InlineData { mime, data });
        self
    }

    /// Ask the provider for JSON matching this schema
    pub fn response_schema(mut self, schema: Value) -> Self {
        self.response_schema = Some(schema);
        self
    }

    pub fn build(self) -> Prompt {
        Prompt {
            parts: self.parts,
            response_schema: self.response_schema,
        }
    }
}

/// A single turn in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Who sent this turn
    pub role: ChatRole,
    /// The text of the turn
    pub content: String,
}

impl ChatMessage {
    /// Create a new builder for a user message
    pub fn user() -> ChatMessageBuilder {
        ChatMessageBuilder::new(ChatRole::User)
    }

    /// Create a new builder for a model message
    pub fn model() -> ChatMessageBuilder {
        ChatMessageBuilder::new(ChatRole::Model)
    }
}

/// Builder for ChatMessage
#[derive(Debug)]
pub struct ChatMessageBuilder {
    role: ChatRole,
    content: String,
}

impl ChatMessageBuilder {
    pub fn new(role: ChatRole) -> Self {
        Self {
            role,
            content: String::new(),
        }
    }

    /// Set the message content
    pub fn content<S: Into<String>>(mut self, content: S) -> Self {
        self.content = content.into();
        self
    }

    pub fn build(self) -> ChatMessage {
        ChatMessage {
            role: self.role,
            content: self.content,
        }
    }
}

/// The text/vision generation capability the rest of the crate depends on.
///
/// Implementations make exactly one upstream call per method invocation and
/// report failures as [`AstraError`]; retry and fallback policy belongs to
/// the caller (see [`crate::task::TaskController`]).
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Generate a text answer for a single prompt.
    async fn generate(&self, prompt: &Prompt) -> Result<String, AstraError>;

    /// Continue a multi-turn conversation and return the model's next turn.
    ///
    /// The default implementation flattens the history into one prompt,
    /// which is enough for providers without a native chat endpoint.
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String, AstraError> {
        let transcript = messages
            .iter()
            .map(|m| match m.role {
                ChatRole::User => format!("User: {}", m.content),
                ChatRole::Model => format!("Model: {}", m.content),
            })
            .collect::<Vec<_>>()
            .join("\n");
        self.generate(&Prompt::text(transcript)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_media() {
        assert_eq!(MediaMime::detect(&[0xFF, 0xD8, 0xFF, 0xE0]), Some(MediaMime::JPEG));
        assert_eq!(
            MediaMime::detect(&[0x89, 0x50, 0x4E, 0x47, 0x0D]),
            Some(MediaMime::PNG)
        );
        assert_eq!(MediaMime::detect(b"%PDF-1.7"), Some(MediaMime::PDF));
        assert_eq!(MediaMime::detect(b"RIFF\0\0\0\0WEBPVP8 "), Some(MediaMime::WEBP));
        assert_eq!(MediaMime::detect(b"plain text"), None);
    }

    #[test]
    fn test_prompt_builder() {
        let prompt = Prompt::builder()
            .text("Analyze this")
            .inline(MediaMime::PNG, vec![1, 2, 3])
            .text("Return JSON")
            .build();
        assert_eq!(prompt.parts.len(), 3);
        assert_eq!(prompt.text_content(), "Analyze this\nReturn JSON");
        assert!(prompt.response_schema.is_none());
    }
}
