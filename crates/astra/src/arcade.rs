//! Timed trivia rounds that feed skill XP into the progression engine.

use std::sync::Arc;

use crate::progression::{Notification, ProgressionEngine, ProgressionError};
use crate::tasks::trivia::TriviaQuestion;

/// Seconds on the clock for each question.
pub const SECONDS_PER_QUESTION: u64 = 15;
pub const BASE_POINTS: u64 = 100;
pub const STREAK_BONUS: u64 = 50;
pub const TIME_BONUS: u64 = 10;

#[derive(Debug, thiserror::Error)]
pub enum ArcadeError {
    #[error("the round has no questions")]
    EmptyRound,
    #[error("the round is already finished")]
    Finished,
    #[error(transparent)]
    Progression(#[from] ProgressionError),
}

/// Points for a correct answer given the streak before it and the seconds
/// left on the clock.
pub fn points_for(streak: u64, time_left: u64) -> u64 {
    BASE_POINTS + streak * STREAK_BONUS + time_left.min(SECONDS_PER_QUESTION) * TIME_BONUS
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnswerOutcome {
    pub correct: bool,
    /// Points scored by this answer, `0` when wrong.
    pub points: u64,
    pub correct_index: usize,
    /// Award notification for a correct answer.
    pub notification: Option<Notification>,
}

pub struct QuizSession {
    topic: String,
    questions: Vec<TriviaQuestion>,
    engine: Arc<ProgressionEngine>,
    current: usize,
    score: u64,
    streak: u64,
}

impl QuizSession {
    pub fn new(
        topic: impl Into<String>,
        questions: Vec<TriviaQuestion>,
        engine: Arc<ProgressionEngine>,
    ) -> Result<Self, ArcadeError> {
        let topic = topic.into();
        if topic.trim().is_empty() {
            return Err(ProgressionError::EmptyTopic.into());
        }
        if questions.is_empty() {
            return Err(ArcadeError::EmptyRound);
        }
        Ok(Self {
            topic,
            questions,
            engine,
            current: 0,
            score: 0,
            streak: 0,
        })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// The question waiting for an answer, `None` once the round is over.
    pub fn current(&self) -> Option<&TriviaQuestion> {
        self.questions.get(self.current)
    }

    /// Zero-based index of the current question.
    pub fn position(&self) -> usize {
        self.current
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn streak(&self) -> u64 {
        self.streak
    }

    pub fn is_finished(&self) -> bool {
        self.current >= self.questions.len()
    }

    /// Answers the current question and moves to the next one.
    ///
    /// `choice` is `None` when the clock ran out. A correct answer scores
    /// [`points_for`] the current streak and credits the same amount as skill
    /// XP for the round topic; anything else resets the streak.
    pub fn answer(
        &mut self,
        choice: Option<usize>,
        time_left: u64,
    ) -> Result<AnswerOutcome, ArcadeError> {
        let question = self.current().ok_or(ArcadeError::Finished)?;
        let correct_index = question.answer;
        let correct = choice == Some(correct_index);

        let outcome = if correct {
            let points = points_for(self.streak, time_left);
            let notification = self.engine.add_skill_xp(&self.topic, points)?;
            self.score += points;
            self.streak += 1;
            AnswerOutcome {
                correct,
                points,
                correct_index,
                notification: Some(notification),
            }
        } else {
            self.streak = 0;
            AnswerOutcome {
                correct,
                points: 0,
                correct_index,
                notification: None,
            }
        };
        log::debug!(
            "arcade {}: q{} correct={} score={} streak={}",
            self.topic,
            self.current + 1,
            correct,
            self.score,
            self.streak
        );
        self.current += 1;
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use crate::tasks::trivia::simulated_questions;
    use crate::test_utils::read_only_store;

    fn session() -> (QuizSession, Arc<ProgressionEngine>) {
        let engine = Arc::new(ProgressionEngine::load(Arc::new(InMemoryStore::new())).unwrap());
        let session = QuizSession::new("Science & Tech", simulated_questions(), engine.clone()).unwrap();
        (session, engine)
    }

    #[test]
    fn test_points_formula() {
        assert_eq!(points_for(0, 15), 250);
        assert_eq!(points_for(2, 7), 100 + 100 + 70);
        assert_eq!(points_for(0, 0), 100);
        // time left never exceeds the per-question clock
        assert_eq!(points_for(0, 99), 250);
    }

    #[test]
    fn test_correct_answers_build_streak_and_award_skill_xp() {
        let (mut session, engine) = session();

        let first = session.answer(Some(0), 10).unwrap();
        assert!(first.correct);
        assert_eq!(first.points, 200);

        let second = session.answer(Some(1), 5).unwrap();
        assert_eq!(second.points, 100 + 50 + 50);
        assert_eq!(session.streak(), 2);
        assert_eq!(session.score(), 400);

        let state = engine.state();
        assert_eq!(state.skills.get("Science & Tech"), Some(&400));
        assert_eq!(state.xp, 400);
    }

    #[test]
    fn test_wrong_answer_and_timeout_reset_streak() {
        let (mut session, engine) = session();
        session.answer(Some(0), 15).unwrap();
        assert_eq!(session.streak(), 1);

        let wrong = session.answer(Some(3), 15).unwrap();
        assert!(!wrong.correct);
        assert_eq!(wrong.points, 0);
        assert_eq!(wrong.correct_index, 1);
        assert_eq!(session.streak(), 0);

        session.answer(Some(1), 15).unwrap();
        let timed_out = session.answer(None, 0).unwrap();
        assert!(timed_out.notification.is_none());
        assert_eq!(session.streak(), 0);

        assert_eq!(engine.state().xp, 250 + 250);
    }

    #[test]
    fn test_answering_after_last_question_is_an_error() {
        let (mut session, _engine) = session();
        for _ in 0..session.len() {
            session.answer(None, 0).unwrap();
        }
        assert!(session.is_finished());
        assert!(session.current().is_none());
        assert!(matches!(session.answer(Some(0), 3), Err(ArcadeError::Finished)));
    }

    #[test]
    fn test_rejects_empty_round_and_topic() {
        let engine = Arc::new(ProgressionEngine::load(Arc::new(InMemoryStore::new())).unwrap());
        assert!(matches!(
            QuizSession::new("Math", Vec::new(), engine.clone()),
            Err(ArcadeError::EmptyRound)
        ));
        assert!(matches!(
            QuizSession::new("  ", simulated_questions(), engine),
            Err(ArcadeError::Progression(ProgressionError::EmptyTopic))
        ));
    }

    #[test]
    fn test_failed_award_keeps_question_open() {
        let engine = Arc::new(ProgressionEngine::load(Arc::new(read_only_store())).unwrap());
        let mut session =
            QuizSession::new("Science & Tech", simulated_questions(), engine.clone()).unwrap();

        assert!(matches!(
            session.answer(Some(0), 15),
            Err(ArcadeError::Progression(_))
        ));
        assert_eq!(session.position(), 0);
        assert_eq!(session.score(), 0);
        assert_eq!(session.streak(), 0);
        assert_eq!(engine.state().xp, 0);
    }
}
