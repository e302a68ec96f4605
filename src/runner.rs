use crate::models::{QuestionJson, QuestionType};
use std::time::Duration;

/// How long the wrong-answer feedback stays on screen before the session
/// returns to plain "presented".
pub const WRONG_FEEDBACK_DURATION: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Answered,
    Revealed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Presented,
    Finalized(Outcome),
}

/// Result of a guess, as seen by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guess {
    Correct,
    Wrong,
    /// Empty input, wrong question type, or the session is already over.
    Ignored,
}

/// Countdown that only moves when explicitly started and pauses at zero
/// instead of revealing anything.
#[derive(Debug)]
pub struct Countdown {
    duration: Duration,
    remaining: Duration,
    running: bool,
}

impl Countdown {
    fn new(duration: Duration) -> Countdown {
        Countdown {
            duration,
            remaining: duration,
            running: false,
        }
    }

    pub fn start(&mut self) {
        if self.remaining.as_nanos() == 0 {
            self.remaining = self.duration;
        }
        self.running = true;
    }

    pub fn pause(&mut self) {
        self.running = false;
    }

    pub fn reset(&mut self) {
        self.running = false;
        self.remaining = self.duration;
    }

    pub fn tick(&mut self, dt: Duration) {
        if !self.running {
            return;
        }
        self.remaining = self.remaining.checked_sub(dt).unwrap_or_default();
        if self.remaining.as_nanos() == 0 {
            self.running = false;
        }
    }

    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}

/// One question on screen. Loading and consumption live in the driver:
/// it draws a question, runs a session over it, and once the session is
/// finalized it marks the question used before drawing the next one.
#[derive(Debug)]
pub struct Session {
    question: QuestionJson,
    phase: Phase,
    timer: Countdown,
    wrong_feedback: Option<Duration>,
}

impl Session {
    pub fn new(question: QuestionJson, timer_duration: Duration) -> Session {
        Session {
            question,
            phase: Phase::Presented,
            timer: Countdown::new(timer_duration),
            wrong_feedback: None,
        }
    }

    pub fn question(&self) -> &QuestionJson {
        &self.question
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn timer(&self) -> &Countdown {
        &self.timer
    }

    pub fn timer_mut(&mut self) -> &mut Countdown {
        &mut self.timer
    }

    pub fn wrong_feedback_active(&self) -> bool {
        self.wrong_feedback.is_some()
    }

    pub fn is_finalized(&self) -> bool {
        matches!(self.phase, Phase::Finalized(_))
    }

    /// A question is consumed only after it was answered or revealed.
    pub fn should_consume(&self) -> bool {
        self.is_finalized()
    }

    pub fn tick(&mut self, dt: Duration) {
        self.timer.tick(dt);
        if let Some(left) = self.wrong_feedback {
            self.wrong_feedback = left.checked_sub(dt).filter(|d| d.as_nanos() > 0);
        }
    }

    /// Free-text guess for open-answer questions: trimmed, case-insensitive
    /// exact match, no fuzzy matching.
    pub fn submit_answer(&mut self, guess: &str) -> Guess {
        if self.is_finalized()
            || self.question.type_ != QuestionType::Open
            || guess.trim().is_empty()
        {
            return Guess::Ignored;
        }
        if normalize(guess) == normalize(&self.question.answer) {
            self.finalize(Outcome::Answered);
            Guess::Correct
        } else {
            self.wrong_feedback = Some(WRONG_FEEDBACK_DURATION);
            Guess::Wrong
        }
    }

    /// Option pick for MCQ questions. Rows without a stored index (legacy
    /// data) fall back to comparing the option text with the answer.
    pub fn pick_option(&mut self, index: usize) -> Guess {
        if self.is_finalized() || self.question.type_ != QuestionType::Mcq || index > 3 {
            return Guess::Ignored;
        }
        let correct = match self.question.correct_index {
            Some(ci) => index as i32 == ci,
            None => {
                let picked = self
                    .question
                    .options
                    .as_ref()
                    .and_then(|opts| opts.get(index))
                    .map(|o| normalize(o));
                picked.as_deref() == Some(normalize(&self.question.answer).as_str())
            }
        };
        if correct {
            self.finalize(Outcome::Answered);
            Guess::Correct
        } else {
            self.wrong_feedback = Some(WRONG_FEEDBACK_DURATION);
            Guess::Wrong
        }
    }

    pub fn reveal(&mut self) {
        if !self.is_finalized() {
            self.finalize(Outcome::Revealed);
        }
    }

    /// Display form of the correct answer; MCQ answers carry their letter
    /// label ("C) ...").
    pub fn correct_answer_text(&self) -> String {
        if self.question.type_ == QuestionType::Mcq {
            if let (Some(ci), Some(opts)) = (self.question.correct_index, &self.question.options) {
                if let Some(option) = opts.get(ci as usize) {
                    let label = (b'A' + ci as u8) as char;
                    return format!("{}) {}", label, option);
                }
            }
        }
        self.question.answer.clone()
    }

    fn finalize(&mut self, outcome: Outcome) {
        self.phase = Phase::Finalized(outcome);
        self.timer.pause();
        self.wrong_feedback = None;
    }
}

fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Difficulty;
    use chrono::Utc;

    fn open_question(answer: &str) -> QuestionJson {
        QuestionJson {
            id: 1,
            text: "Explain HTML.".into(),
            difficulty: Difficulty::Medio.as_str().into(),
            type_: QuestionType::Open,
            answer: answer.into(),
            options: None,
            correct_index: None,
            created_at: Utc::now(),
            used_at: None,
        }
    }

    fn mcq_question(correct_index: Option<i32>) -> QuestionJson {
        QuestionJson {
            id: 2,
            text: "What is the capital of Brazil?".into(),
            difficulty: Difficulty::Facil.as_str().into(),
            type_: QuestionType::Mcq,
            answer: "C".into(),
            options: Some(vec!["A".into(), "B".into(), "C".into(), "D".into()]),
            correct_index,
            created_at: Utc::now(),
            used_at: None,
        }
    }

    const TIMER: Duration = Duration::from_secs(10);

    #[test]
    fn open_answer_is_case_insensitive_and_trimmed() {
        let mut session = Session::new(open_question("Brasília"), TIMER);
        assert_eq!(session.submit_answer("  brasília "), Guess::Correct);
        assert_eq!(session.phase(), Phase::Finalized(Outcome::Answered));
    }

    #[test]
    fn wrong_guess_gives_transient_feedback_without_consuming() {
        let mut session = Session::new(open_question("Brasília"), TIMER);
        assert_eq!(session.submit_answer("Rio"), Guess::Wrong);
        assert_eq!(session.phase(), Phase::Presented);
        assert!(session.wrong_feedback_active());
        assert!(!session.should_consume());

        session.tick(Duration::from_millis(1000));
        assert!(session.wrong_feedback_active());
        session.tick(Duration::from_millis(500));
        assert!(!session.wrong_feedback_active());
        assert_eq!(session.phase(), Phase::Presented);
    }

    #[test]
    fn empty_guess_is_ignored() {
        let mut session = Session::new(open_question("42"), TIMER);
        assert_eq!(session.submit_answer("   "), Guess::Ignored);
        assert!(!session.wrong_feedback_active());
    }

    #[test]
    fn guesses_after_finalize_are_ignored() {
        let mut session = Session::new(open_question("42"), TIMER);
        session.reveal();
        assert_eq!(session.submit_answer("42"), Guess::Ignored);
        assert_eq!(session.phase(), Phase::Finalized(Outcome::Revealed));
    }

    #[test]
    fn mcq_correct_index_wins() {
        let mut session = Session::new(mcq_question(Some(2)), TIMER);
        assert_eq!(session.pick_option(2), Guess::Correct);
        assert_eq!(session.phase(), Phase::Finalized(Outcome::Answered));
    }

    #[test]
    fn mcq_wrong_pick_is_transient() {
        let mut session = Session::new(mcq_question(Some(2)), TIMER);
        assert_eq!(session.pick_option(0), Guess::Wrong);
        assert_eq!(session.phase(), Phase::Presented);
        session.tick(WRONG_FEEDBACK_DURATION);
        assert!(!session.wrong_feedback_active());
        // still answerable
        assert_eq!(session.pick_option(2), Guess::Correct);
    }

    #[test]
    fn mcq_without_index_falls_back_to_answer_text() {
        let mut session = Session::new(mcq_question(None), TIMER);
        assert_eq!(session.pick_option(1), Guess::Wrong);
        let mut session = Session::new(mcq_question(None), TIMER);
        assert_eq!(session.pick_option(2), Guess::Correct);
    }

    #[test]
    fn open_session_ignores_option_picks() {
        let mut session = Session::new(open_question("42"), TIMER);
        assert_eq!(session.pick_option(0), Guess::Ignored);
    }

    #[test]
    fn timer_only_runs_when_started() {
        let mut session = Session::new(open_question("42"), TIMER);
        assert!(!session.timer().is_running());
        session.tick(Duration::from_secs(5));
        assert_eq!(session.timer().remaining(), TIMER);

        session.timer_mut().start();
        session.tick(Duration::from_secs(4));
        assert_eq!(session.timer().remaining(), Duration::from_secs(6));
    }

    #[test]
    fn timer_pauses_at_zero_without_revealing() {
        let mut session = Session::new(open_question("42"), TIMER);
        session.timer_mut().start();
        session.tick(Duration::from_secs(30));
        assert_eq!(session.timer().remaining(), Duration::from_secs(0));
        assert!(!session.timer().is_running());
        assert_eq!(session.phase(), Phase::Presented);

        // starting again after hitting zero restarts from the full duration
        session.timer_mut().start();
        assert_eq!(session.timer().remaining(), TIMER);
        assert!(session.timer().is_running());
    }

    #[test]
    fn correct_answer_finalizes_and_stops_timer() {
        let mut session = Session::new(mcq_question(Some(2)), TIMER);
        session.timer_mut().start();
        session.pick_option(2);
        assert!(!session.timer().is_running());
        assert!(session.should_consume());
    }

    #[test]
    fn mcq_answer_text_is_labelled() {
        let session = Session::new(mcq_question(Some(2)), TIMER);
        assert_eq!(session.correct_answer_text(), "C) C");
        let session = Session::new(open_question("Brasília"), TIMER);
        assert_eq!(session.correct_answer_text(), "Brasília");
    }
}
