//! One-shot generation tasks with typed output and quota fallback.
//!
//! A [`TaskController`] runs a [`TaskRequest`] against the configured
//! [`GenerationProvider`] exactly once and always resolves to a
//! [`TaskResult`]:
//!
//! ```text
//! Idle -> Calling -> Success
//!                 -> Failure            (parse error, timeout, auth, other)
//!                 -> SimulatedFallback  (quota / rate limit only)
//! ```
//!
//! The controller never retries. Retrying is a new `execute` call.

use once_cell::sync::Lazy;
use regex::Regex;
use schemars::JsonSchema;
use schemars::generate::SchemaSettings;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

use crate::config::AstraConfig;
use crate::generation::{GenerationProvider, Prompt};

static CODE_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)```(?:json)?").expect("code fence pattern is valid"));

/// Removes markdown code-fence markers (```` ```json ```` / ```` ``` ````)
/// wherever they appear and trims the remainder.
pub fn strip_code_fences(text: &str) -> String {
    CODE_FENCE.replace_all(text, "").trim().to_string()
}

/// JSON schema of `T` with every subschema inlined.
pub fn schema_for<T: JsonSchema>() -> Value {
    let schema = SchemaSettings::draft07()
        .with(|s| s.inline_subschemas = true)
        .into_generator()
        .into_root_schema_for::<T>();
    serde_json::to_value(&schema).unwrap_or(Value::Null)
}

/// A generation request whose answer must parse into `T`.
#[derive(Debug, Clone)]
pub struct TaskRequest<T> {
    /// Short name used in logs, e.g. `"trivia"`.
    pub label: String,
    pub prompt: Prompt,
    validate: Option<fn(&T) -> Result<(), String>>,
    shape: PhantomData<fn() -> T>,
}

impl<T> TaskRequest<T>
where
    T: DeserializeOwned + JsonSchema,
{
    pub fn new(label: impl Into<String>, prompt: Prompt) -> Self {
        Self {
            label: label.into(),
            prompt,
            validate: None,
            shape: PhantomData,
        }
    }

    /// The expected output shape as JSON schema.
    pub fn schema(&self) -> Value {
        schema_for::<T>()
    }

    /// Attach the output schema to the prompt so providers that support
    /// constrained decoding can enforce it.
    pub fn with_schema_hint(mut self) -> Self {
        self.prompt.response_schema = Some(self.schema());
        self
    }

    /// Checks applied after deserialising. A rejected answer parses as an
    /// error carrying the returned message.
    pub fn with_validator(mut self, validate: fn(&T) -> Result<(), String>) -> Self {
        self.validate = Some(validate);
        self
    }

    /// Parses a raw model answer into `T`.
    pub fn parse(&self, raw: &str) -> Result<T, serde_json::Error> {
        let data = serde_json::from_str(&strip_code_fences(raw))?;
        if let Some(validate) = self.validate {
            validate(&data).map_err(<serde_json::Error as serde::de::Error>::custom)?;
        }
        Ok(data)
    }
}

/// Why a task failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// No usable generation capability (missing or rejected key).
    Configuration,
    /// The call succeeded but the answer did not match the expected shape.
    Parse,
    /// The call did not finish within the configured timeout.
    Timeout,
    /// Any other provider or transport failure.
    Provider,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFailure {
    pub kind: FailureKind,
    pub reason: String,
}

impl TaskFailure {
    pub fn new(kind: FailureKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for TaskFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reason)
    }
}

/// Terminal outcome of [`TaskController::execute`].
#[derive(Debug, Clone, PartialEq)]
pub enum TaskResult<T> {
    /// The provider answered and the answer parsed.
    Success(T),
    /// The provider reported a quota/rate limit; this is the caller's
    /// simulated data, unmodified.
    SimulatedFallback(T),
    Failure(TaskFailure),
}

impl<T> TaskResult<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, TaskResult::Success(_))
    }

    pub fn is_simulated(&self) -> bool {
        matches!(self, TaskResult::SimulatedFallback(_))
    }

    /// The payload of either a real or a simulated answer.
    pub fn data(&self) -> Option<&T> {
        match self {
            TaskResult::Success(data) | TaskResult::SimulatedFallback(data) => Some(data),
            TaskResult::Failure(_) => None,
        }
    }

    pub fn into_data(self) -> Option<T> {
        match self {
            TaskResult::Success(data) | TaskResult::SimulatedFallback(data) => Some(data),
            TaskResult::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&TaskFailure> {
        match self {
            TaskResult::Failure(failure) => Some(failure),
            _ => None,
        }
    }
}

/// Timing knobs for [`TaskController`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskConfig {
    /// Upper bound for one provider call. `None` waits forever.
    pub timeout: Option<Duration>,
    /// Pause before delivering simulated data after a quota signal.
    pub fallback_delay: Duration,
}

impl TaskConfig {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
    pub const DEFAULT_FALLBACK_DELAY: Duration = Duration::from_millis(1500);
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            timeout: Some(Self::DEFAULT_TIMEOUT),
            fallback_delay: Self::DEFAULT_FALLBACK_DELAY,
        }
    }
}

impl From<&AstraConfig> for TaskConfig {
    fn from(cfg: &AstraConfig) -> Self {
        Self {
            timeout: cfg.timeout(),
            fallback_delay: cfg.fallback_delay(),
        }
    }
}

/// Executes [`TaskRequest`]s against an optional generation provider.
#[derive(Clone)]
pub struct TaskController {
    provider: Option<Arc<dyn GenerationProvider>>,
    config: TaskConfig,
}

impl TaskController {
    pub fn new(provider: Arc<dyn GenerationProvider>) -> Self {
        Self {
            provider: Some(provider),
            config: TaskConfig::default(),
        }
    }

    /// A controller with no provider; every task fails with
    /// [`FailureKind::Configuration`].
    pub fn unconfigured() -> Self {
        Self {
            provider: None,
            config: TaskConfig::default(),
        }
    }

    pub fn with_config(mut self, config: TaskConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &TaskConfig {
        &self.config
    }

    pub fn is_configured(&self) -> bool {
        self.provider.is_some()
    }

    pub fn provider(&self) -> Option<&Arc<dyn GenerationProvider>> {
        self.provider.as_ref()
    }

    /// Runs `request` once.
    ///
    /// `simulated` is returned untouched as [`TaskResult::SimulatedFallback`]
    /// when, and only when, the provider signals an exhausted quota.
    #[instrument(name = "task.execute", skip_all, fields(task = %request.label))]
    pub async fn execute<T>(&self, request: TaskRequest<T>, simulated: T) -> TaskResult<T>
    where
        T: DeserializeOwned + JsonSchema + Send,
    {
        let Some(provider) = &self.provider else {
            log::warn!("{}: no generation provider configured", request.label);
            return TaskResult::Failure(TaskFailure::new(
                FailureKind::Configuration,
                "no generation provider configured",
            ));
        };

        let call = provider.generate(&request.prompt);
        let outcome = match self.config.timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    log::warn!("{}: provider call timed out after {:?}", request.label, limit);
                    return TaskResult::Failure(TaskFailure::new(FailureKind::Timeout, "timeout"));
                }
            },
            None => call.await,
        };

        match outcome {
            Ok(raw) => match request.parse(&raw) {
                Ok(data) => {
                    log::debug!("{}: parsed provider answer", request.label);
                    TaskResult::Success(data)
                }
                Err(e) => {
                    log::warn!("{}: unparsable answer: {}", request.label, e);
                    TaskResult::Failure(TaskFailure::new(
                        FailureKind::Parse,
                        format!("parse error: {}", e),
                    ))
                }
            },
            Err(err) if err.is_quota_exceeded() => {
                log::warn!(
                    "{}: quota exhausted ({}), serving simulated data",
                    request.label,
                    err
                );
                tokio::time::sleep(self.config.fallback_delay).await;
                TaskResult::SimulatedFallback(simulated)
            }
            Err(err) if err.is_auth() => {
                TaskResult::Failure(TaskFailure::new(FailureKind::Configuration, err.to_string()))
            }
            Err(err) => {
                log::warn!("{}: provider call failed: {}", request.label, err);
                TaskResult::Failure(TaskFailure::new(FailureKind::Provider, err.to_string()))
            }
        }
    }
}
