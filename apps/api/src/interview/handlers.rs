//! Axum route handlers for the candidate and interview API.
//!
//! Persistence discipline: every logical operation (session start, each
//! answer, session end) runs its writes inside one transaction, and the
//! in-memory cycle is only advanced after that transaction commits. The store
//! therefore never reflects a half-completed exchange, and a failed request
//! leaves both the store and the cycle where they were.

use std::collections::BTreeMap;

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::errors::AppError;
use crate::interview::engine::{
    AnswerOutcome, ContextEntry, Exchange, GeneratedQuestion, InterviewCycle,
};
use crate::interview::summary::FinalReport;
use crate::models::candidate::{CandidateLevel, CandidateRow};
use crate::models::session::{InterviewRecordRow, SessionRow, SESSION_ACTIVE, SESSION_ENDED};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateCandidateRequest {
    pub name: String,
    pub years_experience: f64,
    #[serde(default)]
    pub skills: BTreeMap<String, f64>,
    #[serde(default)]
    pub education: String,
    pub level: CandidateLevel,
    #[serde(default)]
    pub past_scores: Vec<f64>,
}

#[derive(Debug, Deserialize)]
pub struct StartInterviewRequest {
    pub candidate_id: Uuid,
    pub position_level: String,
    pub technologies: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct StartInterviewResponse {
    pub session_id: Uuid,
    pub question: GeneratedQuestion,
    pub difficulty: f64,
    pub band: String,
    pub context: Vec<ContextEntry>,
}

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub answer: String,
}

#[derive(Debug, Serialize)]
pub struct AnswerResponse {
    #[serde(flatten)]
    pub outcome: AnswerOutcome,
    pub context: Vec<ContextEntry>,
}

#[derive(Debug, Serialize)]
pub struct SessionDetailResponse {
    pub session: SessionRow,
    pub records: Vec<InterviewRecordRow>,
}

// ────────────────────────────────────────────────────────────────────────────
// Candidate handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/candidates
pub async fn handle_create_candidate(
    State(state): State<AppState>,
    Json(request): Json<CreateCandidateRequest>,
) -> Result<Json<CandidateRow>, AppError> {
    if request.name.trim().is_empty() {
        return Err(AppError::Validation("name cannot be empty".to_string()));
    }
    if request.years_experience < 0.0 || !request.years_experience.is_finite() {
        return Err(AppError::Validation(
            "years_experience must be a non-negative number".to_string(),
        ));
    }
    if let Some((skill, value)) = request
        .skills
        .iter()
        .find(|(_, v)| !(0.0..=1.0).contains(*v))
    {
        return Err(AppError::Validation(format!(
            "skill '{skill}' proficiency {value} is outside [0, 1]"
        )));
    }
    if let Some(score) = request
        .past_scores
        .iter()
        .find(|s| !(0.0..=100.0).contains(*s))
    {
        return Err(AppError::Validation(format!(
            "past score {score} is outside [0, 100]"
        )));
    }

    let skills = serde_json::to_value(&request.skills)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize skills: {e}")))?;

    let row = sqlx::query_as::<_, CandidateRow>(
        r#"
        INSERT INTO candidates (id, name, years_experience, skills, education, level, past_scores)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&request.name)
    .bind(request.years_experience)
    .bind(&skills)
    .bind(&request.education)
    .bind(request.level.as_str())
    .bind(&request.past_scores)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(row))
}

/// GET /api/v1/candidates/:id
pub async fn handle_get_candidate(
    State(state): State<AppState>,
    Path(candidate_id): Path<Uuid>,
) -> Result<Json<CandidateRow>, AppError> {
    let row = fetch_candidate(&state, candidate_id).await?;
    Ok(Json(row))
}

// ────────────────────────────────────────────────────────────────────────────
// Interview handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/interviews/start
///
/// Calibrates difficulty from the candidate profile, asks the model for the
/// opening question, persists the session, and registers the live cycle.
/// If the model reply is malformed, no session row is created.
pub async fn handle_start_interview(
    State(state): State<AppState>,
    Json(request): Json<StartInterviewRequest>,
) -> Result<Json<StartInterviewResponse>, AppError> {
    let candidate = fetch_candidate(&state, request.candidate_id)
        .await?
        .into_candidate()
        .map_err(AppError::Internal)?;

    let mut cycle = InterviewCycle::new(candidate, request.position_level, request.technologies)?;
    let question = cycle.begin(state.llm.as_ref()).await?;

    let coverage = serde_json::to_value(&cycle.metrics().topic_coverage)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize coverage: {e}")))?;

    let mut tx = state.db.begin().await?;
    sqlx::query(
        r#"
        INSERT INTO sessions
            (id, candidate_id, position_level, technologies, difficulty,
             questions_asked, average_score, topic_coverage, status)
        VALUES ($1, $2, $3, $4, $5, 0, 0.0, $6, $7)
        "#,
    )
    .bind(cycle.session_id())
    .bind(cycle.candidate_id())
    .bind(cycle.position_level())
    .bind(cycle.technologies())
    .bind(cycle.difficulty())
    .bind(&coverage)
    .bind(SESSION_ACTIVE)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "INSERT INTO interview_records (id, session_id, question, difficulty) VALUES ($1, $2, $3, $4)",
    )
    .bind(Uuid::new_v4())
    .bind(cycle.session_id())
    .bind(&question.question)
    .bind(cycle.difficulty())
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;

    let response = StartInterviewResponse {
        session_id: cycle.session_id(),
        difficulty: cycle.difficulty(),
        band: cycle.band().as_str().to_string(),
        context: cycle.context().to_vec(),
        question,
    };
    state.sessions.insert(cycle);

    Ok(Json(response))
}

/// POST /api/v1/interviews/:id/answer
///
/// Evaluates the answer and produces the follow-up question. The exchange is
/// fully computed (both model calls) before anything is written or applied;
/// the session lock serializes concurrent answers to the same session.
pub async fn handle_submit_answer(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<AnswerRequest>,
) -> Result<Json<AnswerResponse>, AppError> {
    if request.answer.trim().is_empty() {
        return Err(AppError::Validation("answer cannot be empty".to_string()));
    }

    let shared = state.sessions.get(session_id)?;
    let mut cycle = shared.lock().await;

    let exchange = cycle
        .propose_exchange(&request.answer, state.llm.as_ref())
        .await?;

    persist_exchange(&state, &cycle, &exchange).await?;

    let outcome = cycle.apply_exchange(exchange);
    Ok(Json(AnswerResponse {
        outcome,
        context: cycle.context().to_vec(),
    }))
}

/// POST /api/v1/interviews/:id/end
///
/// Aggregates the session into a final report, finalizes the session row,
/// and drops the live cycle from the registry.
pub async fn handle_end_interview(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<FinalReport>, AppError> {
    let shared = state.sessions.get(session_id)?;
    let mut cycle = shared.lock().await;

    let report = cycle.prepare_report(state.llm.as_ref()).await?;

    let mut tx = state.db.begin().await?;
    sqlx::query(
        "UPDATE sessions SET status = $1, ended_at = $2, overall_score = $3 WHERE id = $4",
    )
    .bind(SESSION_ENDED)
    .bind(Utc::now())
    .bind(report.overall_score)
    .bind(session_id)
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;

    cycle.mark_ended();
    drop(cycle);
    state.sessions.remove(session_id);

    Ok(Json(report))
}

/// GET /api/v1/interviews/:id
///
/// Returns the persisted session row and its interview records.
pub async fn handle_get_interview(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionDetailResponse>, AppError> {
    let session = sqlx::query_as::<_, SessionRow>("SELECT * FROM sessions WHERE id = $1")
        .bind(session_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Session {session_id} not found")))?;

    let records = sqlx::query_as::<_, InterviewRecordRow>(
        "SELECT * FROM interview_records WHERE session_id = $1 ORDER BY created_at ASC",
    )
    .bind(session_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(SessionDetailResponse { session, records }))
}

// ────────────────────────────────────────────────────────────────────────────
// Persistence helpers
// ────────────────────────────────────────────────────────────────────────────

async fn fetch_candidate(state: &AppState, candidate_id: Uuid) -> Result<CandidateRow, AppError> {
    sqlx::query_as::<_, CandidateRow>("SELECT * FROM candidates WHERE id = $1")
        .bind(candidate_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Candidate {candidate_id} not found")))
}

/// Writes one exchange in a single transaction: fills in the pending record's
/// answer and evaluation, inserts the next question's record, and refreshes
/// the session metrics snapshot. Values are the post-apply state, computed
/// from the exchange so the cycle itself is only mutated after commit.
async fn persist_exchange(
    state: &AppState,
    cycle: &InterviewCycle,
    exchange: &Exchange,
) -> Result<(), AppError> {
    let evaluation: Value = serde_json::to_value(&exchange.evaluation)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize evaluation: {e}")))?;

    let answered = cycle.metrics().questions_answered as i64;
    let new_average = (cycle.metrics().average_score * answered as f64 + exchange.evaluation.score)
        / (answered + 1) as f64;
    let mut coverage = cycle.metrics().topic_coverage.clone();
    *coverage.entry(exchange.next_topic.clone()).or_insert(0) += 1;
    let coverage = serde_json::to_value(&coverage)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize coverage: {e}")))?;

    let mut tx = state.db.begin().await?;
    sqlx::query(
        "UPDATE interview_records SET answer = $1, evaluation = $2 \
         WHERE session_id = $3 AND answer IS NULL",
    )
    .bind(&exchange.answer)
    .bind(&evaluation)
    .bind(cycle.session_id())
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "INSERT INTO interview_records (id, session_id, question, difficulty) VALUES ($1, $2, $3, $4)",
    )
    .bind(Uuid::new_v4())
    .bind(cycle.session_id())
    .bind(&exchange.next_question.question)
    .bind(exchange.new_difficulty)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "UPDATE sessions SET difficulty = $1, questions_asked = $2, \
         average_score = $3, topic_coverage = $4 WHERE id = $5",
    )
    .bind(exchange.new_difficulty)
    .bind(answered + 1)
    .bind(new_average)
    .bind(&coverage)
    .bind(cycle.session_id())
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;

    Ok(())
}
