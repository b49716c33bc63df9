use crate::{
    error::AstraError,
    generation::{ChatMessage, Prompt},
};
use http::{Request, Response};

/// A generation provider expressed as pure request building and response
/// parsing, leaving the transport to [`crate::adapters::GenerationFromHTTP`].
pub trait HTTPGenerationProvider: Send + Sync {
    fn generate_request(&self, prompt: &Prompt) -> Result<Request<Vec<u8>>, AstraError>;

    fn chat_request(&self, messages: &[ChatMessage]) -> Result<Request<Vec<u8>>, AstraError>;

    /// Extract the answer text. Non-success statuses must surface as
    /// [`AstraError::Status`] so callers can tell quota exhaustion apart.
    fn parse_generate(&self, resp: Response<Vec<u8>>) -> Result<String, AstraError>;
}
