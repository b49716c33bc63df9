use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::generation::{MediaMime, Prompt};
use crate::task::TaskRequest;

const SCAN_PROMPT: &str = r#"Analyze this document/image in detail.
Act as a specialized sci-fi scanner.
Return a valid JSON object ONLY, with no code blocks or markdown, with this structure:
{
    "type": "Specific Type (e.g. Schematic, Invoice, Code)",
    "confidence": "Percentage String",
    "keywords": ["Array", "Of", "Keywords"],
    "summary": "A detailed technical summary of what is seen.",
    "author": "Inferred Author or Entity",
    "date": "Inferred Date or \"Unknown\""
}"#;

/// What the scanner reports about a document or image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ScanReport {
    #[serde(rename = "type")]
    pub kind: String,
    pub confidence: String,
    pub keywords: Vec<String>,
    pub summary: String,
    pub author: String,
    pub date: String,
}

pub fn scan_request(mime: MediaMime, data: Vec<u8>) -> TaskRequest<ScanReport> {
    let prompt = Prompt::builder().text(SCAN_PROMPT).inline(mime, data).build();
    TaskRequest::new("scan", prompt).with_schema_hint()
}

/// Offline report served when the provider is out of quota.
pub fn simulated_report() -> ScanReport {
    ScanReport {
        kind: "Encrypted Schematic (SIMULATED)".into(),
        confidence: "98.4%".into(),
        keywords: vec![
            "Simulation".into(),
            "Bypass".into(),
            "Offline".into(),
            "Neural_Link".into(),
        ],
        summary: "OFFLINE MODE: This object appears to be a high-density data crystal. \
                  Pattern recognition algorithms suggest it contains schematics for a quantum \
                  stabilizer. (Generated because API usage limit was reached)"
            .into(),
        author: "Unknown Architect".into(),
        date: "Est. 2140".into(),
    }
}
