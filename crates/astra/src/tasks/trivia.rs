use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::generation::Prompt;
use crate::task::TaskRequest;

/// Number of questions asked per round.
pub const QUESTIONS_PER_ROUND: usize = 5;
/// Topic used when the player does not pick one.
pub const DEFAULT_TOPIC: &str = "Science & Tech";
/// Answer options offered per question.
pub const OPTIONS_PER_QUESTION: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TriviaQuestion {
    pub id: u32,
    pub question: String,
    pub options: Vec<String>,
    /// Index into `options` of the correct answer
    pub answer: usize,
}

pub fn trivia_request(topic: &str) -> TaskRequest<Vec<TriviaQuestion>> {
    let prompt = format!(
        r#"Generate {count} difficult, rapid-fire trivia questions about {topic}.
Return ONLY valid JSON array with this structure:
[
    {{
        "id": 1,
        "question": "Question text?",
        "options": ["Op1", "Op2", "Op3", "Op4"],
        "answer": 0
    }}
]
"answer" is the index of the correct option."#,
        count = QUESTIONS_PER_ROUND,
        topic = topic,
    );
    TaskRequest::new("trivia", Prompt::text(prompt))
        .with_schema_hint()
        .with_validator(|questions| validate_round(questions))
}

/// A round needs at least one question, each with exactly four options and
/// an answer index that points at one of them.
pub fn validate_round(questions: &[TriviaQuestion]) -> Result<(), String> {
    if questions.is_empty() {
        return Err("trivia round has no questions".to_string());
    }
    for q in questions {
        if q.options.len() != OPTIONS_PER_QUESTION {
            return Err(format!(
                "question {} has {} options, expected {}",
                q.id,
                q.options.len(),
                OPTIONS_PER_QUESTION
            ));
        }
        if q.answer >= q.options.len() {
            return Err(format!("question {} answer index {} out of range", q.id, q.answer));
        }
    }
    Ok(())
}

fn question(id: u32, question: &str, options: [&str; 4], answer: usize) -> TriviaQuestion {
    TriviaQuestion {
        id,
        question: question.to_string(),
        options: options.iter().map(|o| o.to_string()).collect(),
        answer,
    }
}

/// Offline round served when the provider is out of quota.
pub fn simulated_questions() -> Vec<TriviaQuestion> {
    vec![
        question(
            1,
            "[SIMULATION] What is the primary function of a Neural Network?",
            ["Pattern Recognition", "Making Coffee", "Storage", "Rendering"],
            0,
        ),
        question(
            2,
            "[SIMULATION] Which element is commonly used in semi-conductors?",
            ["Gold", "Silicon", "Iron", "Oxygen"],
            1,
        ),
        question(
            3,
            "[SIMULATION] What does CPU stand for?",
            [
                "Cool Processing Unit",
                "Central Processing Unit",
                "Computer Power Unit",
                "Core Port",
            ],
            1,
        ),
        question(
            4,
            "[SIMULATION] The speed of light is approx?",
            ["300,000 km/s", "100 km/h", "Sound Speed", "Infinite"],
            0,
        ),
        question(
            5,
            "[SIMULATION] Which planet is known as the Red Planet?",
            ["Venus", "Mars", "Jupiter", "Saturn"],
            1,
        ),
    ]
}
