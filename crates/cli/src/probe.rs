//! Gemini model diagnostics: listing, availability probe and connectivity test.

use anyhow::Result;
use astra::{AstraError, Prompt, outbound::call_outbound};
use colored::*;
use std::io::{self, Write};

use crate::provider::{generation_provider, get_api_key, google, mask_key};
use crate::utils::print_separator;

/// Candidates for `astra probe`, in order.
pub const PROBE_CANDIDATES: &[&str] = &[
    "gemini-1.5-flash",
    "gemini-1.5-flash-latest",
    "gemini-1.5-pro",
    "gemini-pro",
    "gemini-1.5-flash-8b",
    "gemini-2.0-flash-exp",
];

/// Candidates for `astra connectivity`, in order.
pub const CONNECTIVITY_CANDIDATES: &[&str] = &[
    "gemini-2.0-flash-exp",
    "gemini-1.5-flash",
    "gemini-1.5-flash-latest",
    "gemini-1.5-pro",
    "gemini-1.5-pro-latest",
    "gemini-1.0-pro",
    "gemini-pro",
    "gemini-pro-vision",
];

/// How a single candidate answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Available,
    NotFound,
    Error(String),
}

impl ProbeOutcome {
    pub fn from_result(result: &Result<String, AstraError>) -> Self {
        match result {
            Ok(_) => ProbeOutcome::Available,
            Err(e) if is_not_found(e) => ProbeOutcome::NotFound,
            Err(e) => ProbeOutcome::Error(error_summary(e)),
        }
    }
}

fn is_not_found(err: &AstraError) -> bool {
    err.status_code() == Some(404) || err.to_string().contains("404")
}

/// Short human message for an error, without bracketed detail.
pub fn error_summary(err: &AstraError) -> String {
    let text = match err {
        AstraError::Status { message, .. } => message.clone(),
        other => other.to_string(),
    };
    text.split('[').next().unwrap_or_default().trim().to_string()
}

/// One `astra probe` line.
pub fn probe_line(name: &str, outcome: &ProbeOutcome) -> String {
    match outcome {
        ProbeOutcome::Available => format!("✅ {}: AVAILABLE", name),
        ProbeOutcome::NotFound => format!("❌ {}: NOT FOUND (404)", name),
        ProbeOutcome::Error(msg) => format!("⚠️ {}: ERROR ({})", name, msg),
    }
}

/// Prefix printed before a connectivity attempt.
pub fn connectivity_prefix(name: &str) -> String {
    format!("Testing: {:<25} ", name)
}

/// Verdict printed after a connectivity attempt.
pub fn connectivity_verdict(outcome: &ProbeOutcome) -> String {
    match outcome {
        ProbeOutcome::Available => "✅ OK".to_string(),
        ProbeOutcome::NotFound => "❌ 404 (Not Found)".to_string(),
        ProbeOutcome::Error(msg) => format!("⚠️ Error: {}", msg),
    }
}

/// Final connectivity line given the first working model, if any.
pub fn recommendation(working: Option<&str>) -> String {
    match working {
        Some(model) => format!("RECOMMENDATION: Use \"{}\"", model),
        None => {
            "CRITICAL: No working models found. Check API Key permissions or quota.".to_string()
        }
    }
}

/// Keeps Gemini models when there are any, else everything.
pub fn gemini_models(models: Vec<String>) -> (bool, Vec<String>) {
    let gemini: Vec<String> = models
        .iter()
        .filter(|m| m.contains("gemini"))
        .cloned()
        .collect();
    if gemini.is_empty() {
        (false, models)
    } else {
        (true, gemini)
    }
}

fn require_key(missing_message: &str) -> String {
    match get_api_key() {
        Some(key) => key,
        None => {
            eprintln!("{}", missing_message);
            std::process::exit(1);
        }
    }
}

async fn try_model(api_key: &str, name: &str, prompt: &str) -> ProbeOutcome {
    let provider = generation_provider(api_key, name);
    let result = provider.generate(&Prompt::text(prompt)).await;
    if let Err(e) = &result {
        log::debug!("probe {} failed: {}", name, e);
    }
    ProbeOutcome::from_result(&result)
}

/// `astra models`
pub async fn list_models() -> Result<()> {
    let api_key = require_key("No API Key");
    let google = google(&api_key, astra_google::DEFAULT_MODEL);
    let resp = call_outbound(google.list_models_request()?).await?;
    match google.parse_list_models(resp) {
        Ok(models) if models.is_empty() => println!("No models found in response"),
        Ok(models) => {
            println!("AVAILABLE MODELS:");
            let (only_gemini, models) = gemini_models(models);
            if !only_gemini {
                println!("No 'gemini' models found. Listing all:");
            }
            for model in models {
                println!("- {}", model);
            }
        }
        Err(e) => eprintln!("{} {}", "API ERROR:".bright_red(), error_summary(&e)),
    }
    Ok(())
}

/// `astra probe`
pub async fn probe() -> Result<()> {
    let api_key = require_key("Could not find API Key in .env");
    println!("Using Key: {}", mask_key(&api_key));
    println!("\nTesting Model Availability...");
    for name in PROBE_CANDIDATES {
        let outcome = try_model(&api_key, name, "Test.").await;
        println!("{}", probe_line(name, &outcome));
    }
    Ok(())
}

/// `astra connectivity`
pub async fn connectivity() -> Result<()> {
    let api_key = require_key("FATAL: No API Key found in .env");
    println!("Key Found: {}", mask_key(&api_key));
    println!("Starting Connectivity Test...\n");

    let mut working: Option<&str> = None;
    for name in CONNECTIVITY_CANDIDATES {
        print!("{}", connectivity_prefix(name));
        io::stdout().flush().ok();
        let outcome = try_model(&api_key, name, "Hello?").await;
        println!("{}", connectivity_verdict(&outcome));
        if outcome == ProbeOutcome::Available && working.is_none() {
            working = Some(*name);
        }
    }

    println!();
    print_separator();
    println!("{}", recommendation(working));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_lines() {
        assert_eq!(
            probe_line("gemini-1.5-flash", &ProbeOutcome::Available),
            "✅ gemini-1.5-flash: AVAILABLE"
        );
        assert_eq!(
            probe_line("gemini-pro", &ProbeOutcome::NotFound),
            "❌ gemini-pro: NOT FOUND (404)"
        );
        assert_eq!(
            probe_line("gemini-1.5-pro", &ProbeOutcome::Error("quota".into())),
            "⚠️ gemini-1.5-pro: ERROR (quota)"
        );
    }

    #[test]
    fn test_outcome_classification() {
        let not_found: Result<String, AstraError> = Err(AstraError::Status {
            code: 404,
            message: "NOT_FOUND: models/gemini-pro is not found".into(),
        });
        assert_eq!(ProbeOutcome::from_result(&not_found), ProbeOutcome::NotFound);

        let quota: Result<String, AstraError> = Err(AstraError::Status {
            code: 429,
            message: "RESOURCE_EXHAUSTED: Quota exceeded [retry in 3s]".into(),
        });
        assert_eq!(
            ProbeOutcome::from_result(&quota),
            ProbeOutcome::Error("RESOURCE_EXHAUSTED: Quota exceeded".into())
        );

        let ok: Result<String, AstraError> = Ok("Hi".into());
        assert_eq!(ProbeOutcome::from_result(&ok), ProbeOutcome::Available);
    }

    #[test]
    fn test_connectivity_formatting() {
        assert_eq!(
            connectivity_prefix("gemini-pro"),
            format!("Testing: gemini-pro{} ", " ".repeat(15))
        );
        assert_eq!(
            recommendation(Some("gemini-1.5-flash")),
            "RECOMMENDATION: Use \"gemini-1.5-flash\""
        );
        assert!(recommendation(None).starts_with("CRITICAL:"));
    }

    #[test]
    fn test_gemini_filter() {
        let (only, models) = gemini_models(vec!["gemini-2.0-flash".into(), "embedding-001".into()]);
        assert!(only);
        assert_eq!(models, vec!["gemini-2.0-flash".to_string()]);

        let (only, models) = gemini_models(vec!["embedding-001".into()]);
        assert!(!only);
        assert_eq!(models.len(), 1);
    }
}
