//! Google Gemini implementation of the ASTRA generation capability.
//!
//! [`Google`] builds `generateContent` requests and parses their responses;
//! the transport is supplied by `astra::adapters::GenerationFromHTTP`.
//!
//! # Example
//! ```no_run
//! use std::sync::Arc;
//! use astra::adapters::GenerationFromHTTP;
//! use astra::generation::{GenerationProvider, Prompt};
//! use astra_google::Google;
//!
//! #[tokio::main]
//! async fn main() {
//!     let google = Google::new("your-api-key", None);
//!     let provider = GenerationFromHTTP::new(Arc::new(google));
//!     let answer = provider.generate(&Prompt::text("Hello?")).await.unwrap();
//!     println!("{}", answer);
//! }
//! ```

use astra::{
    error::AstraError,
    generation::{ChatMessage, ChatRole, Prompt, PromptPart, http::HTTPGenerationProvider},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use http::{Method, Request, Response, header::CONTENT_TYPE};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
/// Environment variable conventionally holding the key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/";

/// Schema keywords Gemini's `responseSchema` rejects.
const UNSUPPORTED_SCHEMA_KEYS: &[&str] = &[
    "$schema",
    "title",
    "format",
    "additionalProperties",
    "minimum",
    "maximum",
    "definitions",
];

/// Client configuration for Google's Gemini API.
#[derive(Debug, Clone, Deserialize, JsonSchema, Serialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct Google {
    /// API key for authentication with Google's API
    pub api_key: String,
    /// Model identifier (e.g. "gemini-2.0-flash")
    pub model: String,
    /// API root, defaults to the public v1beta endpoint
    #[schemars(with = "Option<String>")]
    pub base_url: Option<Url>,
    /// Maximum number of tokens to generate in responses
    pub max_tokens: Option<u32>,
    /// Sampling temperature between 0.0 and 1.0
    pub temperature: Option<f32>,
    /// Optional system instruction
    pub system: Option<String>,
}

/// Request body for `:generateContent`
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GoogleGenerateRequest<'a> {
    contents: Vec<GoogleContent<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GoogleSystemInstruction<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GoogleGenerationConfig>,
}

#[derive(Serialize)]
struct GoogleSystemInstruction<'a> {
    parts: Vec<GoogleContentPart<'a>>,
}

/// One turn of the conversation
#[derive(Serialize)]
struct GoogleContent<'a> {
    /// "user" or "model"
    role: &'a str,
    parts: Vec<GoogleContentPart<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
enum GoogleContentPart<'a> {
    Text(&'a str),
    InlineData(GoogleInlineData),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GoogleInlineData {
    mime_type: &'static str,
    data: String,
}

#[derive(Serialize, Default)]
#[serde(rename_all = "camelCase")]
struct GoogleGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<Value>,
}

/// Response from `:generateContent`
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GoogleGenerateResponse {
    #[serde(default)]
    candidates: Vec<GoogleCandidate>,
    prompt_feedback: Option<GooglePromptFeedback>,
}

#[derive(Deserialize, Debug)]
struct GoogleCandidate {
    content: Option<GoogleResponseContent>,
}

#[derive(Deserialize, Debug)]
struct GoogleResponseContent {
    #[serde(default)]
    parts: Vec<GoogleResponsePart>,
}

#[derive(Deserialize, Debug)]
struct GoogleResponsePart {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GooglePromptFeedback {
    block_reason: Option<String>,
}

/// Error envelope Google returns with non-2xx statuses
#[derive(Deserialize, Debug)]
struct GoogleErrorEnvelope {
    error: GoogleErrorBody,
}

#[derive(Deserialize, Debug)]
struct GoogleErrorBody {
    #[serde(default)]
    message: String,
    status: Option<String>,
}

impl Google {
    pub fn new(api_key: impl Into<String>, model: Option<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: None,
            max_tokens: None,
            temperature: None,
            system: None,
        }
    }

    fn default_base_url() -> Url {
        Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid")
    }

    fn base_url(&self) -> Url {
        self.base_url.clone().unwrap_or_else(Self::default_base_url)
    }

    fn check_key(&self) -> Result<(), AstraError> {
        if self.api_key.trim().is_empty() {
            return Err(AstraError::AuthError("Missing Google API key".into()));
        }
        Ok(())
    }

    fn generate_url(&self) -> Result<Url, AstraError> {
        let mut url = self
            .base_url()
            .join(&format!("models/{}:generateContent", self.model))?;
        url.set_query(Some(&format!("key={}", self.api_key)));
        Ok(url)
    }

    fn post(&self, body: &GoogleGenerateRequest<'_>) -> Result<Request<Vec<u8>>, AstraError> {
        let json_body = serde_json::to_vec(body)?;
        Ok(Request::builder()
            .method(Method::POST)
            .uri(self.generate_url()?.as_str())
            .header(CONTENT_TYPE, "application/json")
            .body(json_body)?)
    }

    fn system_instruction(&self) -> Option<GoogleSystemInstruction<'_>> {
        self.system.as_deref().map(|system| GoogleSystemInstruction {
            parts: vec![GoogleContentPart::Text(system)],
        })
    }

    fn generation_config(&self, schema: Option<&Value>) -> Option<GoogleGenerationConfig> {
        let config = GoogleGenerationConfig {
            max_output_tokens: self.max_tokens,
            temperature: self.temperature,
            response_mime_type: schema.map(|_| "application/json"),
            response_schema: schema.map(|s| sanitize_schema(s.clone())),
        };
        let empty = config.max_output_tokens.is_none()
            && config.temperature.is_none()
            && config.response_mime_type.is_none();
        (!empty).then_some(config)
    }

    /// `GET {base}/models?key=...`
    pub fn list_models_request(&self) -> Result<Request<Vec<u8>>, AstraError> {
        self.check_key()?;
        let mut url = self.base_url().join("models")?;
        url.set_query(Some(&format!("key={}", self.api_key)));
        Ok(Request::builder()
            .method(Method::GET)
            .header(CONTENT_TYPE, "application/json")
            .uri(url.as_str())
            .body(Vec::new())?)
    }

    /// Model ids from a listing response, without the `models/` prefix.
    pub fn parse_list_models(&self, resp: Response<Vec<u8>>) -> Result<Vec<String>, AstraError> {
        let resp = check_status(resp)?;
        let resp_json: Value = serde_json::from_slice(resp.body())?;
        let arr = resp_json
            .get("models")
            .and_then(Value::as_array)
            .ok_or_else(|| AstraError::ResponseFormatError {
                message: "`models` missing or not an array".into(),
                raw_response: resp_json.to_string(),
            })?;

        let names = arr
            .iter()
            .filter_map(|m| m.get("name"))
            .filter_map(Value::as_str)
            .map(|v| v.strip_prefix("models/").unwrap_or(v).to_string())
            .collect();
        Ok(names)
    }
}

/// Drops schema keywords Gemini does not accept, recursively. Keys of a
/// `properties` map are field names and are kept.
pub fn sanitize_schema(mut schema: Value) -> Value {
    fn walk(value: &mut Value, field_map: bool) {
        match value {
            Value::Object(map) => {
                if !field_map {
                    for key in UNSUPPORTED_SCHEMA_KEYS {
                        map.remove(*key);
                    }
                }
                for (key, child) in map.iter_mut() {
                    walk(child, !field_map && key == "properties");
                }
            }
            Value::Array(items) => items.iter_mut().for_each(|item| walk(item, false)),
            _ => {}
        }
    }
    walk(&mut schema, false);
    schema
}

/// Turns a non-success response into [`AstraError::Status`], keeping the
/// Google status string (e.g. `RESOURCE_EXHAUSTED`) in the message.
fn check_status(resp: Response<Vec<u8>>) -> Result<Response<Vec<u8>>, AstraError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.into_body();
    let message = match serde_json::from_slice::<GoogleErrorEnvelope>(&body) {
        Ok(GoogleErrorEnvelope { error }) => match error.status {
            Some(kind) => format!("{}: {}", kind, error.message),
            None => error.message,
        },
        Err(_) => {
            let text = String::from_utf8_lossy(&body).trim().to_string();
            if text.is_empty() {
                status.canonical_reason().unwrap_or("error").to_string()
            } else {
                text
            }
        }
    };
    log::debug!("google returned {}: {}", status, message);
    Err(AstraError::Status {
        code: status.as_u16(),
        message,
    })
}

impl HTTPGenerationProvider for Google {
    fn generate_request(&self, prompt: &Prompt) -> Result<Request<Vec<u8>>, AstraError> {
        self.check_key()?;
        let parts = prompt
            .parts
            .iter()
            .map(|part| match part {
                PromptPart::Text(text) => GoogleContentPart::Text(text),
                PromptPart::InlineData { mime, data } => {
                    GoogleContentPart::InlineData(GoogleInlineData {
                        mime_type: mime.mime_type(),
                        data: BASE64.encode(data),
                    })
                }
            })
            .collect();

        let body = GoogleGenerateRequest {
            contents: vec![GoogleContent {
                role: "user",
                parts,
            }],
            system_instruction: self.system_instruction(),
            generation_config: self.generation_config(prompt.response_schema.as_ref()),
        };
        self.post(&body)
    }

    fn chat_request(&self, messages: &[ChatMessage]) -> Result<Request<Vec<u8>>, AstraError> {
        self.check_key()?;
        let contents = messages
            .iter()
            .map(|msg| GoogleContent {
                role: match msg.role {
                    ChatRole::User => "user",
                    ChatRole::Model => "model",
                },
                parts: vec![GoogleContentPart::Text(&msg.content)],
            })
            .collect();

        let body = GoogleGenerateRequest {
            contents,
            system_instruction: self.system_instruction(),
            generation_config: self.generation_config(None),
        };
        self.post(&body)
    }

    fn parse_generate(&self, resp: Response<Vec<u8>>) -> Result<String, AstraError> {
        let resp = check_status(resp)?;
        let parsed: GoogleGenerateResponse =
            serde_json::from_slice(resp.body()).map_err(|e| AstraError::ResponseFormatError {
                message: format!("Failed to decode Google API response: {}", e),
                raw_response: String::from_utf8_lossy(resp.body()).into_owned(),
            })?;

        let text: Option<String> = parsed
            .candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| content.parts.iter().map(|p| p.text.as_str()).collect());

        match text {
            Some(text) if !text.is_empty() => Ok(text),
            _ => {
                let reason = parsed
                    .prompt_feedback
                    .and_then(|f| f.block_reason)
                    .map(|r| format!("prompt blocked: {}", r))
                    .unwrap_or_else(|| "No answer returned by Google".to_string());
                Err(AstraError::ProviderError(reason))
            }
        }
    }
}
