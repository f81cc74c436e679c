#![allow(dead_code)]

//! Question/Answer Cycle — the per-session state machine.
//!
//! Flow: new (intake → calibrate) → begin (first question) →
//!       submit_answer (evaluate → adjust → follow-up), repeated →
//!       finish (aggregate → final report).
//!
//! The context log is append-only and strictly alternates interviewer/candidate
//! entries after the first. `submit_answer` computes the whole exchange (both
//! LLM calls) before touching the log, so a failed call leaves the cycle in
//! exactly the state it was in — no partial mutation, ever.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::interview::difficulty::{
    adjust_difficulty, difficulty_band, initial_difficulty, DifficultyBand,
};
use crate::interview::prompts::{
    EVALUATION_PROMPT_TEMPLATE, EVALUATION_SYSTEM, QUESTION_PROMPT_TEMPLATE, QUESTION_SYSTEM,
};
use crate::interview::summary::{build_report, recommend, FinalReport};
use crate::llm_client::{generate_json, LlmError, TextModel};
use crate::models::candidate::Candidate;

/// Lifecycle of one interview session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    NotStarted,
    AwaitingAnswer,
    Ended,
}

/// Structured evaluation of one answer, produced by the model and validated
/// before it enters the context log. Never mutated afterward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evaluation {
    pub score: f64,
    pub clarity_score: f64,
    pub strength_points: Vec<String>,
    pub weakness_points: Vec<String>,
    pub missing_topics: Vec<String>,
}

impl Evaluation {
    /// Both scores must land in [0, 100]; anything else is a schema violation
    /// surfaced as an error, never clamped or defaulted.
    fn validate(&self) -> Result<(), LlmError> {
        for (name, value) in [("score", self.score), ("clarity_score", self.clarity_score)] {
            if !value.is_finite() || !(0.0..=100.0).contains(&value) {
                return Err(LlmError::Schema(format!(
                    "{name} must be within [0, 100], got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// One generated question with the metadata the evaluator needs later.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedQuestion {
    pub question: String,
    pub expected_topics: Vec<String>,
    pub evaluation_criteria: Vec<String>,
}

/// A tagged entry in the session's append-only context log.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum ContextEntry {
    Interviewer {
        question: String,
        topic: String,
        difficulty: f64,
        band: DifficultyBand,
        expected_topics: Vec<String>,
        evaluation_criteria: Vec<String>,
    },
    Candidate {
        answer: String,
        evaluation: Evaluation,
    },
}

/// Running metrics snapshot, zeroed at session start.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionMetrics {
    pub questions_answered: u32,
    pub average_score: f64,
    pub topic_coverage: BTreeMap<String, u32>,
}

/// A fully computed exchange, ready to be applied to the log. Both model
/// calls have already succeeded by the time one of these exists.
#[derive(Debug, Clone)]
pub struct Exchange {
    pub answer: String,
    pub evaluation: Evaluation,
    pub next_question: GeneratedQuestion,
    pub next_topic: String,
    pub new_difficulty: f64,
}

/// Result of applying an exchange, returned to the API layer.
#[derive(Debug, Clone, Serialize)]
pub struct AnswerOutcome {
    pub evaluation: Evaluation,
    pub next_question: GeneratedQuestion,
    pub difficulty: f64,
    pub band: DifficultyBand,
}

/// One interview session's cycle. Owns the context log exclusively for the
/// session's lifetime; callers serialize access per session id (see registry).
pub struct InterviewCycle {
    session_id: Uuid,
    candidate: Candidate,
    position_level: String,
    technologies: Vec<String>,
    state: SessionState,
    difficulty: f64,
    /// One value per calibration/adjustment, starting with the initial value.
    difficulty_progression: Vec<f64>,
    /// Evaluation scores in answer order; the adjustment window reads this.
    score_history: Vec<f64>,
    context: Vec<ContextEntry>,
    metrics: SessionMetrics,
}

impl InterviewCycle {
    /// Builds a calibrated but not-yet-started cycle. The technology list must
    /// be non-empty; its first element seeds the opening topic.
    pub fn new(
        candidate: Candidate,
        position_level: String,
        technologies: Vec<String>,
    ) -> Result<Self, AppError> {
        if technologies.is_empty() {
            return Err(AppError::Validation(
                "technologies must not be empty".to_string(),
            ));
        }

        let difficulty = initial_difficulty(&candidate);
        Ok(InterviewCycle {
            session_id: Uuid::new_v4(),
            candidate,
            position_level,
            technologies,
            state: SessionState::NotStarted,
            difficulty,
            difficulty_progression: vec![difficulty],
            score_history: Vec::new(),
            context: Vec::new(),
            metrics: SessionMetrics::default(),
        })
    }

    /// Starts the session: asks the model for the opening question on the
    /// first technology and appends the first interviewer entry. A malformed
    /// model reply fails the whole operation with the log still empty, so
    /// callers can safely persist nothing.
    pub async fn begin(&mut self, model: &dyn TextModel) -> Result<GeneratedQuestion, AppError> {
        if self.state != SessionState::NotStarted {
            return Err(AppError::InvalidState(
                "session has already started".to_string(),
            ));
        }

        let topic = self.technologies[0].clone();
        let question =
            request_question(model, &topic, self.difficulty, &self.position_level, &[]).await?;

        self.push_interviewer_entry(topic, question.clone());
        self.state = SessionState::AwaitingAnswer;
        info!(
            "Session {} started for candidate {} at difficulty {:.2}",
            self.session_id, self.candidate.id, self.difficulty
        );
        Ok(question)
    }

    /// Computes one full exchange without mutating anything: evaluates the
    /// answer, adjusts difficulty from the parsed score, and generates the
    /// follow-up question at the new difficulty. Either both model calls
    /// succeed or the cycle is untouched.
    pub async fn propose_exchange(
        &self,
        answer: &str,
        model: &dyn TextModel,
    ) -> Result<Exchange, AppError> {
        if self.state != SessionState::AwaitingAnswer {
            return Err(AppError::InvalidState(
                "session is not awaiting an answer".to_string(),
            ));
        }
        let pending = self.pending_question().ok_or_else(|| {
            AppError::InvalidState("no question is pending in the context log".to_string())
        })?;

        let prompt = EVALUATION_PROMPT_TEMPLATE
            .replace("{question}", pending.question)
            .replace("{expected_topics}", &pending.expected_topics.join(", "))
            .replace(
                "{evaluation_criteria}",
                &pending.evaluation_criteria.join(", "),
            )
            .replace("{answer}", answer);
        let evaluation: Evaluation = generate_json(model, &prompt, EVALUATION_SYSTEM).await?;
        evaluation.validate()?;

        let new_difficulty =
            adjust_difficulty(self.difficulty, &self.score_history, evaluation.score);

        // Topics rotate through the requested technology list.
        let questions_asked = self.asked_questions().count();
        let next_topic = self.technologies[questions_asked % self.technologies.len()].clone();

        let previous: Vec<String> = self.asked_questions().map(str::to_string).collect();
        let next_question = request_question(
            model,
            &next_topic,
            new_difficulty,
            &self.position_level,
            &previous,
        )
        .await?;

        Ok(Exchange {
            answer: answer.to_string(),
            evaluation,
            next_question,
            next_topic,
            new_difficulty,
        })
    }

    /// Applies a computed exchange: appends the candidate entry then the next
    /// interviewer entry (the log strictly alternates), records the score, and
    /// moves difficulty to the adjusted value.
    pub fn apply_exchange(&mut self, exchange: Exchange) -> AnswerOutcome {
        let Exchange {
            answer,
            evaluation,
            next_question,
            next_topic,
            new_difficulty,
        } = exchange;

        self.score_history.push(evaluation.score);
        self.metrics.questions_answered += 1;
        self.metrics.average_score =
            self.score_history.iter().sum::<f64>() / self.score_history.len() as f64;

        self.context.push(ContextEntry::Candidate {
            answer,
            evaluation: evaluation.clone(),
        });
        self.difficulty = new_difficulty;
        self.difficulty_progression.push(new_difficulty);
        self.push_interviewer_entry(next_topic, next_question.clone());

        AnswerOutcome {
            evaluation,
            next_question,
            difficulty: new_difficulty,
            band: difficulty_band(new_difficulty),
        }
    }

    /// Convenience for callers that do not interleave persistence:
    /// propose + apply in one step.
    pub async fn submit_answer(
        &mut self,
        answer: &str,
        model: &dyn TextModel,
    ) -> Result<AnswerOutcome, AppError> {
        let exchange = self.propose_exchange(answer, model).await?;
        Ok(self.apply_exchange(exchange))
    }

    /// Folds the context log into the final report without changing state,
    /// so callers can persist the outcome before locking the session. The
    /// recommendation model call is skipped when no weaknesses were recorded.
    pub async fn prepare_report(&self, model: &dyn TextModel) -> Result<FinalReport, AppError> {
        if self.state == SessionState::Ended {
            return Err(AppError::InvalidState(
                "session has already ended".to_string(),
            ));
        }

        let mut report = build_report(&self.context, &self.difficulty_progression)?;
        report.recommendations = recommend(&report.weaknesses, model).await?;
        Ok(report)
    }

    /// Locks the cycle against further answers.
    pub fn mark_ended(&mut self) {
        self.state = SessionState::Ended;
    }

    /// Ends the session: report, then lock. A failed aggregation leaves the
    /// session answerable.
    pub async fn finish(&mut self, model: &dyn TextModel) -> Result<FinalReport, AppError> {
        let report = self.prepare_report(model).await?;
        self.mark_ended();
        info!(
            "Session {} ended: overall {:.1} over {} questions",
            self.session_id, report.overall_score, report.question_count
        );
        Ok(report)
    }

    fn push_interviewer_entry(&mut self, topic: String, question: GeneratedQuestion) {
        *self.metrics.topic_coverage.entry(topic.clone()).or_insert(0) += 1;
        self.context.push(ContextEntry::Interviewer {
            question: question.question,
            topic,
            difficulty: self.difficulty,
            band: difficulty_band(self.difficulty),
            expected_topics: question.expected_topics,
            evaluation_criteria: question.evaluation_criteria,
        });
    }

    /// The interviewer entry awaiting an answer — always the last log entry
    /// while the session is active.
    fn pending_question(&self) -> Option<PendingQuestion<'_>> {
        match self.context.last()? {
            ContextEntry::Interviewer {
                question,
                expected_topics,
                evaluation_criteria,
                ..
            } => Some(PendingQuestion {
                question,
                expected_topics,
                evaluation_criteria,
            }),
            ContextEntry::Candidate { .. } => None,
        }
    }

    fn asked_questions(&self) -> impl Iterator<Item = &str> {
        self.context.iter().filter_map(|entry| match entry {
            ContextEntry::Interviewer { question, .. } => Some(question.as_str()),
            ContextEntry::Candidate { .. } => None,
        })
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn candidate_id(&self) -> Uuid {
        self.candidate.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn difficulty(&self) -> f64 {
        self.difficulty
    }

    pub fn band(&self) -> DifficultyBand {
        difficulty_band(self.difficulty)
    }

    pub fn context(&self) -> &[ContextEntry] {
        &self.context
    }

    pub fn metrics(&self) -> &SessionMetrics {
        &self.metrics
    }

    pub fn position_level(&self) -> &str {
        &self.position_level
    }

    pub fn technologies(&self) -> &[String] {
        &self.technologies
    }
}

struct PendingQuestion<'a> {
    question: &'a str,
    expected_topics: &'a [String],
    evaluation_criteria: &'a [String],
}

/// Asks the model for one question and decodes the reply into the expected
/// shape. Decode failure is a hard error at every call site.
async fn request_question(
    model: &dyn TextModel,
    topic: &str,
    difficulty: f64,
    position_level: &str,
    previous_questions: &[String],
) -> Result<GeneratedQuestion, AppError> {
    let previous = if previous_questions.is_empty() {
        "(none yet)".to_string()
    } else {
        previous_questions
            .iter()
            .map(|q| format!("- {q}"))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let prompt = QUESTION_PROMPT_TEMPLATE
        .replace("{topic}", topic)
        .replace("{band}", difficulty_band(difficulty).as_str())
        .replace("{position_level}", position_level)
        .replace("{previous_questions}", &previous);

    let question: GeneratedQuestion = generate_json(model, &prompt, QUESTION_SYSTEM).await?;
    if question.question.trim().is_empty() {
        return Err(AppError::Llm(LlmError::Schema(
            "generated question text is empty".to_string(),
        )));
    }
    Ok(question)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::candidate::CandidateLevel;
    use async_trait::async_trait;
    use std::collections::{BTreeMap, VecDeque};
    use std::sync::Mutex;

    /// A scripted model: pops one canned reply per call.
    struct ScriptedModel {
        replies: Mutex<VecDeque<Result<String, ()>>>,
    }

    impl ScriptedModel {
        fn new(replies: Vec<Result<String, ()>>) -> Self {
            Self {
                replies: Mutex::new(replies.into_iter().collect()),
            }
        }

        fn remaining(&self) -> usize {
            self.replies.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl TextModel for ScriptedModel {
        async fn generate(&self, _prompt: &str, _system: &str) -> Result<String, LlmError> {
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .expect("scripted model ran out of replies")
                .map_err(|_| LlmError::Api {
                    status: 500,
                    message: "scripted failure".to_string(),
                })
        }
    }

    fn candidate() -> Candidate {
        Candidate {
            id: Uuid::new_v4(),
            name: "Ada".to_string(),
            years_experience: 2.0,
            skills: BTreeMap::new(),
            education: "BSc".to_string(),
            level: CandidateLevel::Intermediate,
            past_scores: vec![],
        }
    }

    fn question_reply(text: &str) -> String {
        format!(
            r#"{{"question": "{text}", "expected_topics": ["a", "b"], "evaluation_criteria": ["depth"]}}"#
        )
    }

    fn evaluation_reply(score: f64, clarity: f64) -> String {
        format!(
            r#"{{"score": {score}, "clarity_score": {clarity}, "strength_points": ["solid basics"], "weakness_points": ["no edge cases"], "missing_topics": []}}"#
        )
    }

    async fn started_cycle(model: &ScriptedModel) -> InterviewCycle {
        let mut cycle = InterviewCycle::new(
            candidate(),
            "intermediate".to_string(),
            vec!["rust".to_string(), "sql".to_string()],
        )
        .unwrap();
        cycle.begin(model).await.unwrap();
        cycle
    }

    #[tokio::test]
    async fn test_begin_seeds_first_technology_and_one_entry() {
        let model = ScriptedModel::new(vec![Ok(question_reply("What is ownership?"))]);
        let cycle = started_cycle(&model).await;

        assert_eq!(cycle.state(), SessionState::AwaitingAnswer);
        assert_eq!(cycle.context().len(), 1);
        match &cycle.context()[0] {
            ContextEntry::Interviewer { topic, .. } => assert_eq!(topic, "rust"),
            _ => panic!("first entry must be an interviewer entry"),
        }
        assert_eq!(cycle.metrics().questions_answered, 0);
        assert_eq!(cycle.metrics().average_score, 0.0);
    }

    #[test]
    fn test_new_rejects_empty_technologies() {
        let result = InterviewCycle::new(candidate(), "junior".to_string(), vec![]);
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_begin_fails_hard_on_malformed_reply() {
        let model = ScriptedModel::new(vec![Ok(
            "Sure, let me think about a good question...".to_string()
        )]);
        let mut cycle = InterviewCycle::new(
            candidate(),
            "junior".to_string(),
            vec!["rust".to_string()],
        )
        .unwrap();

        let result = cycle.begin(&model).await;
        assert!(matches!(result, Err(AppError::Llm(_))));
        // Nothing entered the log; the session never started.
        assert!(cycle.context().is_empty());
        assert_eq!(cycle.state(), SessionState::NotStarted);
    }

    #[tokio::test]
    async fn test_submit_answer_before_start_is_invalid_state() {
        let model = ScriptedModel::new(vec![]);
        let mut cycle = InterviewCycle::new(
            candidate(),
            "junior".to_string(),
            vec!["rust".to_string()],
        )
        .unwrap();

        let result = cycle.submit_answer("eager answer", &model).await;
        assert!(matches!(result, Err(AppError::InvalidState(_))));
        // The model must not even be consulted.
        assert_eq!(model.remaining(), 0);
    }

    #[tokio::test]
    async fn test_submit_answer_appends_two_alternating_entries() {
        let model = ScriptedModel::new(vec![
            Ok(question_reply("Q1")),
            Ok(evaluation_reply(70.0, 80.0)),
            Ok(question_reply("Q2")),
        ]);
        let mut cycle = started_cycle(&model).await;
        let outcome = cycle.submit_answer("an answer", &model).await.unwrap();

        assert_eq!(cycle.context().len(), 3);
        assert!(matches!(cycle.context()[1], ContextEntry::Candidate { .. }));
        assert!(matches!(
            cycle.context()[2],
            ContextEntry::Interviewer { .. }
        ));
        assert_eq!(outcome.evaluation.score, 70.0);
        assert_eq!(cycle.metrics().questions_answered, 1);
        assert_eq!(cycle.metrics().average_score, 70.0);
    }

    #[tokio::test]
    async fn test_log_is_2n_plus_1_after_n_answers() {
        let n = 3;
        let mut replies = vec![Ok(question_reply("Q0"))];
        for i in 0..n {
            replies.push(Ok(evaluation_reply(70.0, 75.0)));
            replies.push(Ok(question_reply(&format!("Q{}", i + 1))));
        }
        let model = ScriptedModel::new(replies);
        let mut cycle = started_cycle(&model).await;

        for i in 0..n {
            cycle
                .submit_answer(&format!("answer {i}"), &model)
                .await
                .unwrap();
        }

        assert_eq!(cycle.context().len(), 2 * n + 1);
        for (i, entry) in cycle.context().iter().enumerate() {
            match entry {
                ContextEntry::Interviewer { .. } => assert_eq!(i % 2, 0),
                ContextEntry::Candidate { .. } => assert_eq!(i % 2, 1),
            }
        }
        // Starts and ends on an interviewer entry.
        assert!(matches!(
            cycle.context().last().unwrap(),
            ContextEntry::Interviewer { .. }
        ));
    }

    #[tokio::test]
    async fn test_failed_followup_leaves_log_untouched() {
        let model = ScriptedModel::new(vec![
            Ok(question_reply("Q1")),
            Ok(evaluation_reply(90.0, 90.0)),
            Err(()), // follow-up question call fails
        ]);
        let mut cycle = started_cycle(&model).await;
        let difficulty_before = cycle.difficulty();

        let result = cycle.submit_answer("an answer", &model).await;
        assert!(matches!(result, Err(AppError::Llm(_))));
        assert_eq!(cycle.context().len(), 1);
        assert_eq!(cycle.difficulty(), difficulty_before);
        assert_eq!(cycle.metrics().questions_answered, 0);
        assert_eq!(cycle.state(), SessionState::AwaitingAnswer);
    }

    #[tokio::test]
    async fn test_out_of_range_score_is_schema_error() {
        let model = ScriptedModel::new(vec![
            Ok(question_reply("Q1")),
            Ok(evaluation_reply(130.0, 80.0)),
        ]);
        let mut cycle = started_cycle(&model).await;
        let result = cycle.submit_answer("an answer", &model).await;
        assert!(matches!(result, Err(AppError::Llm(LlmError::Schema(_)))));
        assert_eq!(cycle.context().len(), 1);
    }

    #[tokio::test]
    async fn test_high_scores_raise_difficulty() {
        let model = ScriptedModel::new(vec![
            Ok(question_reply("Q1")),
            Ok(evaluation_reply(95.0, 90.0)),
            Ok(question_reply("Q2")),
        ]);
        let mut cycle = started_cycle(&model).await;
        let before = cycle.difficulty();
        let outcome = cycle.submit_answer("great answer", &model).await.unwrap();
        assert!(outcome.difficulty > before);
    }

    #[tokio::test]
    async fn test_topics_rotate_through_technologies() {
        let model = ScriptedModel::new(vec![
            Ok(question_reply("Q1")),
            Ok(evaluation_reply(70.0, 70.0)),
            Ok(question_reply("Q2")),
        ]);
        let mut cycle = started_cycle(&model).await;
        cycle.submit_answer("an answer", &model).await.unwrap();

        match cycle.context().last().unwrap() {
            ContextEntry::Interviewer { topic, .. } => assert_eq!(topic, "sql"),
            _ => panic!("expected interviewer entry"),
        }
        assert_eq!(cycle.metrics().topic_coverage.get("rust"), Some(&1));
        assert_eq!(cycle.metrics().topic_coverage.get("sql"), Some(&1));
    }

    #[tokio::test]
    async fn test_finish_locks_the_session() {
        let model = ScriptedModel::new(vec![
            Ok(question_reply("Q1")),
            Ok(evaluation_reply(70.0, 80.0)),
            Ok(question_reply("Q2")),
            Ok(r#"{"recommendations": ["study indexing"]}"#.to_string()),
        ]);
        let mut cycle = started_cycle(&model).await;
        cycle.submit_answer("an answer", &model).await.unwrap();

        let report = cycle.finish(&model).await.unwrap();
        assert_eq!(cycle.state(), SessionState::Ended);
        assert_eq!(report.question_count, 1);
        assert_eq!(report.overall_score, 70.0);

        let after_end = cycle.submit_answer("another", &model).await;
        assert!(matches!(after_end, Err(AppError::InvalidState(_))));
        let finish_again = cycle.finish(&model).await;
        assert!(matches!(finish_again, Err(AppError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_finish_with_no_answers_is_no_evaluations() {
        let model = ScriptedModel::new(vec![Ok(question_reply("Q1"))]);
        let mut cycle = started_cycle(&model).await;
        let result = cycle.finish(&model).await;
        assert!(matches!(result, Err(AppError::NoEvaluations)));
        // A failed finish must not lock the session.
        assert_eq!(cycle.state(), SessionState::AwaitingAnswer);
    }
}
