use chrono::{DateTime, Utc};
use std::fmt;
use thiserror::Error;

use crate::geo::Distance;
use crate::model::{Coordinate, GuessAttempt, Question};
use crate::scoring::Score;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("no questions available for this level")]
    NoQuestions,

    #[error("select a point on the map first")]
    NoMarker,

    #[error("cannot {action} while {state}")]
    InvalidTransition {
        state: &'static str,
        action: &'static str,
    },
}

//
// ─── STATE ─────────────────────────────────────────────────────────────────────
//

/// Where a quiz run currently stands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QuizState {
    /// Questions have not arrived yet.
    Loading,
    /// Question `index` is shown; the player may place or move a marker.
    Active {
        index: usize,
        marker: Option<Coordinate>,
    },
    /// Question `index` has been scored and is waiting for the advance action.
    Checked { index: usize },
    /// Every question has been answered.
    Results,
}

impl QuizState {
    fn name(&self) -> &'static str {
        match self {
            QuizState::Loading => "loading",
            QuizState::Active { .. } => "active",
            QuizState::Checked { .. } => "checked",
            QuizState::Results => "showing results",
        }
    }
}

/// Aggregated view of quiz progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizProgress {
    pub total: usize,
    pub answered: usize,
    pub remaining: usize,
    pub is_complete: bool,
}

//
// ─── QUIZ ──────────────────────────────────────────────────────────────────────
//

/// Sequential run through a level's questions.
///
/// The index only ever moves forward. Every check appends exactly one
/// [`GuessAttempt`], so a finished quiz holds one attempt per question.
#[derive(Clone)]
pub struct Quiz {
    state: QuizState,
    questions: Vec<Question>,
    attempts: Vec<GuessAttempt>,
    question_shown_at: Option<DateTime<Utc>>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
}

impl Default for Quiz {
    fn default() -> Self {
        Self::new()
    }
}

impl Quiz {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: QuizState::Loading,
            questions: Vec::new(),
            attempts: Vec::new(),
            question_shown_at: None,
            started_at: None,
            completed_at: None,
        }
    }

    /// Hand the fetched questions to the quiz and show the first one.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NoQuestions` for an empty list (the quiz stays loading).
    /// Returns `QuizError::InvalidTransition` if questions were already loaded.
    pub fn load(&mut self, questions: Vec<Question>, now: DateTime<Utc>) -> Result<(), QuizError> {
        if !matches!(self.state, QuizState::Loading) {
            return Err(self.invalid("load questions"));
        }
        if questions.is_empty() {
            return Err(QuizError::NoQuestions);
        }

        self.questions = questions;
        self.state = QuizState::Active {
            index: 0,
            marker: None,
        };
        self.question_shown_at = Some(now);
        self.started_at = Some(now);
        Ok(())
    }

    /// Drop or move the guess marker on the current question.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InvalidTransition` unless a question is active.
    pub fn place_marker(&mut self, at: Coordinate) -> Result<(), QuizError> {
        if let QuizState::Active { marker, .. } = &mut self.state {
            *marker = Some(at);
            return Ok(());
        }
        Err(self.invalid("place a marker"))
    }

    /// Score the placed marker against the current question.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NoMarker` if nothing has been placed yet.
    /// Returns `QuizError::InvalidTransition` unless a question is active.
    pub fn check(&mut self, now: DateTime<Utc>) -> Result<&GuessAttempt, QuizError> {
        let (index, guess) = match self.state {
            QuizState::Active {
                index,
                marker: Some(guess),
            } => (index, guess),
            QuizState::Active { marker: None, .. } => return Err(QuizError::NoMarker),
            _ => return Err(self.invalid("check a guess")),
        };

        let question = &self.questions[index];
        let target = question.target();
        let distance = Distance::between(guess, target);
        let elapsed_secs = self
            .question_shown_at
            .map_or(0.0, |shown| seconds_between(shown, now));
        let score = Score::compute(distance, elapsed_secs);

        self.attempts.push(GuessAttempt {
            question_id: question.id().clone(),
            question_title: question.title().to_owned(),
            guess,
            target,
            distance,
            elapsed_secs,
            score,
        });
        self.state = QuizState::Checked { index };

        self.attempts
            .last()
            .ok_or(QuizError::InvalidTransition {
                state: "checked",
                action: "read the attempt",
            })
    }

    /// Place `guess` and check it in one step.
    ///
    /// # Errors
    ///
    /// Same as [`Quiz::place_marker`] and [`Quiz::check`].
    pub fn submit_guess(
        &mut self,
        guess: Coordinate,
        now: DateTime<Utc>,
    ) -> Result<&GuessAttempt, QuizError> {
        self.place_marker(guess)?;
        self.check(now)
    }

    /// Move past a checked question: on to the next one, or to the results.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InvalidTransition` unless the current question was checked.
    pub fn advance(&mut self, now: DateTime<Utc>) -> Result<&QuizState, QuizError> {
        let QuizState::Checked { index } = self.state else {
            return Err(self.invalid("advance"));
        };

        let next = index + 1;
        if next < self.questions.len() {
            self.state = QuizState::Active {
                index: next,
                marker: None,
            };
            self.question_shown_at = Some(now);
        } else {
            self.state = QuizState::Results;
            self.question_shown_at = None;
            self.completed_at = Some(now);
        }
        Ok(&self.state)
    }

    #[must_use]
    pub fn state(&self) -> &QuizState {
        &self.state
    }

    /// The question on screen, if any; still set while `Checked`.
    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        match self.state {
            QuizState::Active { index, .. } | QuizState::Checked { index } => {
                self.questions.get(index)
            }
            QuizState::Loading | QuizState::Results => None,
        }
    }

    #[must_use]
    pub fn current_index(&self) -> Option<usize> {
        match self.state {
            QuizState::Active { index, .. } | QuizState::Checked { index } => Some(index),
            QuizState::Loading | QuizState::Results => None,
        }
    }

    #[must_use]
    pub fn marker(&self) -> Option<Coordinate> {
        match self.state {
            QuizState::Active { marker, .. } => marker,
            QuizState::Checked { .. } => self.attempts.last().map(|a| a.guess),
            QuizState::Loading | QuizState::Results => None,
        }
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn attempts(&self) -> &[GuessAttempt] {
        &self.attempts
    }

    /// Sum of all attempt scores so far.
    #[must_use]
    pub fn total_score(&self) -> u32 {
        self.attempts
            .iter()
            .map(|a| u32::from(a.score.value()))
            .sum()
    }

    #[must_use]
    pub fn progress(&self) -> QuizProgress {
        let total = self.questions.len();
        let answered = self.attempts.len();
        QuizProgress {
            total,
            answered,
            remaining: total.saturating_sub(answered),
            is_complete: self.is_complete(),
        }
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        matches!(self.state, QuizState::Results)
    }

    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    fn invalid(&self, action: &'static str) -> QuizError {
        QuizError::InvalidTransition {
            state: self.state.name(),
            action,
        }
    }
}

impl fmt::Debug for Quiz {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Quiz")
            .field("state", &self.state)
            .field("questions_len", &self.questions.len())
            .field("attempts_len", &self.attempts.len())
            .field("started_at", &self.started_at)
            .field("completed_at", &self.completed_at)
            .finish_non_exhaustive()
    }
}

#[allow(clippy::cast_precision_loss)]
fn seconds_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    let millis = (to - from).num_milliseconds().max(0);
    millis as f64 / 1000.0
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::QuestionId;
    use crate::time::fixed_now;
    use chrono::Duration;

    fn question(id: &str, lat: f64, lon: f64) -> Question {
        Question::new(
            QuestionId::new(id),
            id.to_uppercase(),
            format!("Where is {id}?"),
            Coordinate::new(lat, lon).unwrap(),
        )
    }

    fn three_questions() -> Vec<Question> {
        vec![
            question("madrid", 40.4168, -3.7038),
            question("paris", 48.8566, 2.3522),
            question("rome", 41.9028, 12.4964),
        ]
    }

    #[test]
    fn starts_loading_and_rejects_empty_load() {
        let mut quiz = Quiz::new();
        assert_eq!(quiz.state(), &QuizState::Loading);
        assert_eq!(quiz.load(Vec::new(), fixed_now()), Err(QuizError::NoQuestions));
        assert_eq!(quiz.state(), &QuizState::Loading);
        assert!(quiz.current_question().is_none());
    }

    #[test]
    fn load_twice_is_rejected() {
        let mut quiz = Quiz::new();
        quiz.load(three_questions(), fixed_now()).unwrap();
        let err = quiz.load(three_questions(), fixed_now()).unwrap_err();
        assert!(matches!(err, QuizError::InvalidTransition { .. }));
    }

    #[test]
    fn check_without_marker_keeps_question_active() {
        let mut quiz = Quiz::new();
        quiz.load(three_questions(), fixed_now()).unwrap();
        assert_eq!(quiz.check(fixed_now()).unwrap_err(), QuizError::NoMarker);
        assert!(matches!(quiz.state(), QuizState::Active { index: 0, .. }));
        assert!(quiz.attempts().is_empty());
    }

    #[test]
    fn second_tap_moves_marker() {
        let mut quiz = Quiz::new();
        quiz.load(three_questions(), fixed_now()).unwrap();
        quiz.place_marker(Coordinate::new(10.0, 10.0).unwrap()).unwrap();
        quiz.place_marker(Coordinate::new(40.4168, -3.7038).unwrap())
            .unwrap();

        let attempt = quiz.check(fixed_now()).unwrap();
        assert_eq!(attempt.distance, Distance::ZERO);
        assert_eq!(attempt.score, Score::MAX);
    }

    #[test]
    fn elapsed_time_is_measured_per_question() {
        let start = fixed_now();
        let mut quiz = Quiz::new();
        quiz.load(three_questions(), start).unwrap();

        let shown = start;
        let checked = shown + Duration::seconds(100);
        let attempt = quiz
            .submit_guess(Coordinate::new(40.4168, -3.7038).unwrap(), checked)
            .unwrap();
        assert!((attempt.elapsed_secs - 100.0).abs() < f64::EPSILON);
        assert_eq!(attempt.score.value(), 90);

        let next_shown = checked + Duration::seconds(3);
        quiz.advance(next_shown).unwrap();
        let attempt = quiz
            .submit_guess(
                Coordinate::new(48.8566, 2.3522).unwrap(),
                next_shown + Duration::seconds(20),
            )
            .unwrap();
        assert!((attempt.elapsed_secs - 20.0).abs() < f64::EPSILON);
        assert_eq!(attempt.score.value(), 98);
    }

    #[test]
    fn cannot_check_twice_or_move_marker_after_check() {
        let mut quiz = Quiz::new();
        quiz.load(three_questions(), fixed_now()).unwrap();
        quiz.submit_guess(Coordinate::origin(), fixed_now()).unwrap();

        assert!(matches!(
            quiz.check(fixed_now()),
            Err(QuizError::InvalidTransition { .. })
        ));
        assert!(matches!(
            quiz.place_marker(Coordinate::origin()),
            Err(QuizError::InvalidTransition { .. })
        ));
        assert_eq!(quiz.attempts().len(), 1);
        assert_eq!(quiz.marker(), Some(Coordinate::origin()));
    }

    #[test]
    fn advance_requires_a_check() {
        let mut quiz = Quiz::new();
        assert!(quiz.advance(fixed_now()).is_err());
        quiz.load(three_questions(), fixed_now()).unwrap();
        assert!(matches!(
            quiz.advance(fixed_now()),
            Err(QuizError::InvalidTransition { state: "active", .. })
        ));
    }

    #[test]
    fn three_cycles_reach_results_with_three_records() {
        let mut now = fixed_now();
        let mut quiz = Quiz::new();
        quiz.load(three_questions(), now).unwrap();

        let mut seen = Vec::new();
        for _ in 0..3 {
            seen.push(quiz.current_index().unwrap());
            now += Duration::seconds(5);
            quiz.submit_guess(Coordinate::origin(), now).unwrap();
            now += Duration::seconds(3);
            quiz.advance(now).unwrap();
        }

        assert_eq!(seen, vec![0, 1, 2]);
        assert_eq!(quiz.state(), &QuizState::Results);
        assert_eq!(quiz.attempts().len(), 3);
        assert!(quiz.is_complete());
        assert_eq!(quiz.completed_at(), Some(now));
        assert_eq!(
            quiz.progress(),
            QuizProgress {
                total: 3,
                answered: 3,
                remaining: 0,
                is_complete: true,
            }
        );
    }

    #[test]
    fn results_is_terminal() {
        let mut quiz = Quiz::new();
        quiz.load(vec![question("lisbon", 38.7223, -9.1393)], fixed_now())
            .unwrap();
        quiz.submit_guess(Coordinate::new(38.7223, -9.1393).unwrap(), fixed_now())
            .unwrap();
        assert_eq!(quiz.advance(fixed_now()).unwrap(), &QuizState::Results);

        assert!(quiz.advance(fixed_now()).is_err());
        assert!(quiz.place_marker(Coordinate::origin()).is_err());
        assert!(quiz.check(fixed_now()).is_err());
        assert!(quiz.load(three_questions(), fixed_now()).is_err());
        assert_eq!(quiz.total_score(), 100);
        assert!(quiz.current_question().is_none());
    }
}
