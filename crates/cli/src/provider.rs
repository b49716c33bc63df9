use astra::{
    AstraConfig, TaskConfig, TaskController, adapters::GenerationFromHTTP,
    generation::GenerationProvider,
};
use astra_google::{API_KEY_ENV, Google};
use std::path::Path;
use std::sync::Arc;

/// Key name looked up in the working directory's `.env`.
pub const DOTENV_KEY: &str = "VITE_GEMINI_API_KEY";

/// Reads `VITE_GEMINI_API_KEY` from `dotenv`, without touching the process
/// environment. Blank values count as missing.
pub fn key_from_dotenv(dotenv: &Path) -> Option<String> {
    let iter = dotenvy::from_path_iter(dotenv).ok()?;
    iter.filter_map(|item| item.ok())
        .find(|(name, _)| name == DOTENV_KEY)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Try to resolve the Gemini API key
///
/// Priority order:
/// 1. `VITE_GEMINI_API_KEY` in `./.env`
/// 2. `GEMINI_API_KEY` environment variable
pub fn get_api_key() -> Option<String> {
    key_from_dotenv(Path::new(".env")).or_else(|| {
        std::env::var(API_KEY_ENV)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    })
}

/// `AIzaS...x9Qk` style preview of a key.
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 9 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..5].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

pub fn google(api_key: &str, model: &str) -> Google {
    Google::new(api_key, Some(model.to_string()))
}

pub fn generation_provider(api_key: &str, model: &str) -> Arc<dyn GenerationProvider> {
    Arc::new(GenerationFromHTTP::new(Arc::new(google(api_key, model))))
}

/// Task controller for the configured model. Without a key the controller
/// is unconfigured and every task reports a configuration failure.
pub fn task_controller(config: &AstraConfig) -> TaskController {
    let controller = match get_api_key() {
        Some(key) => TaskController::new(generation_provider(&key, config.model())),
        None => {
            log::warn!("no Gemini API key found in .env or {}", API_KEY_ENV);
            TaskController::unconfigured()
        }
    };
    controller.with_config(TaskConfig::from(config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_key_from_dotenv() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "OTHER=1\nVITE_GEMINI_API_KEY=AIzaSyExample1234\n").unwrap();
        assert_eq!(key_from_dotenv(&path).as_deref(), Some("AIzaSyExample1234"));
    }

    #[test]
    fn test_key_missing_or_blank() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".env");
        assert_eq!(key_from_dotenv(&path), None);
        std::fs::write(&path, "VITE_GEMINI_API_KEY=\n").unwrap();
        assert_eq!(key_from_dotenv(&path), None);
    }

    #[test]
    fn test_mask_key() {
        assert_eq!(mask_key("AIzaSyExample1234"), "AIzaS...1234");
        assert_eq!(mask_key("short"), "*****");
    }
}
