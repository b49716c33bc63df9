use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::generation::Prompt;
use crate::progression::{ProgressionEngine, ProgressionError};
use crate::task::{TaskController, TaskRequest, TaskResult};

/// XP granted for a completed (non-simulated) career analysis.
pub const ANALYSIS_XP: u64 = 150;
pub const ANALYSIS_REASON: &str = "Career Analysis";

/// What the user tells the career architect about themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CareerProfile {
    pub subjects: String,
    pub interests: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AptitudePoint {
    pub subject: String,
    #[serde(rename = "A")]
    pub score: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CareerReport {
    pub title: String,
    pub desc: String,
    pub salary: String,
    pub growth: String,
    /// Match confidence in percent
    pub xp: u32,
    #[serde(rename = "chartData")]
    pub chart_data: Vec<AptitudePoint>,
}

impl CareerReport {
    /// Opening line of the follow-up conversation.
    pub fn greeting(&self, simulated: bool) -> String {
        if simulated {
            format!(
                "[OFFLINE BACKUP] Connection unstable. Using local heuristics. Suggested role: {}.",
                self.title
            )
        } else {
            format!(
                "Analysis complete. I have calculated a {}% probability match for {}. Initializing dialogue protocol.",
                self.xp, self.title
            )
        }
    }
}

fn proven_skills(skills: &BTreeMap<String, u64>) -> String {
    if skills.is_empty() {
        return "None yet".to_string();
    }
    skills
        .iter()
        .map(|(topic, xp)| format!("{}: {}XP", topic, xp))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn career_request(
    profile: &CareerProfile,
    skills: &BTreeMap<String, u64>,
) -> TaskRequest<CareerReport> {
    let prompt = format!(
        r#"Act as a futuristic Career Architect AI from the year 2150.
Analyze this profile:
- Subjects: {subjects}
- Interests: {interests}
- PROVEN SKILLS (from Arcade Simulations): {skills}

Suggest ONE specific, high-tech career title (futuristic but realistic, e.g. Quantum Physicist, Bio-Architect).
Provide a JSON response strictly in this format:
{{
    "title": "Career Title",
    "desc": "A 1-sentence inspiring description.",
    "salary": "$XXXk",
    "growth": "+XX% / yr",
    "xp": 95,
    "chartData": [
        {{ "subject": "Logic", "A": 90 }},
        {{ "subject": "Creativity", "A": 80 }},
        {{ "subject": "Tech", "A": 85 }},
        {{ "subject": "Lead", "A": 70 }},
        {{ "subject": "Speed", "A": 75 }}
    ]
}}"#,
        subjects = profile.subjects,
        interests = profile.interests,
        skills = proven_skills(skills),
    );
    TaskRequest::new("career", Prompt::text(prompt)).with_schema_hint()
}

fn point(subject: &str, score: u32) -> AptitudePoint {
    AptitudePoint {
        subject: subject.to_string(),
        score,
    }
}

/// Offline report served when the provider is out of quota.
pub fn simulated_report() -> CareerReport {
    CareerReport {
        title: "Cybernetic Systems Architect (SIMULATED)".into(),
        desc: "Designing neural interfaces for the next generation of synthetic humans. \
               (Offline Mode Active)"
            .into(),
        salary: "$180k".into(),
        growth: "+450%".into(),
        xp: 88,
        chart_data: vec![
            point("Logic", 95),
            point("Creativity", 70),
            point("Tech", 99),
            point("Lead", 60),
            point("Speed", 85),
        ],
    }
}

/// Runs a career analysis with the engine's current skills and awards
/// [`ANALYSIS_XP`] when the provider produced a real answer.
pub async fn analyze(
    controller: &TaskController,
    engine: &ProgressionEngine,
    profile: &CareerProfile,
) -> Result<TaskResult<CareerReport>, ProgressionError> {
    let skills = engine.state().skills;
    let result = controller
        .execute(career_request(profile, &skills), simulated_report())
        .await;
    if result.is_success() {
        engine.add_xp(ANALYSIS_XP, ANALYSIS_REASON)?;
    }
    Ok(result)
}
