use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// One interview session. Mutated once per exchange, finalized at end.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SessionRow {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub position_level: String,
    /// Requested technologies, order significant: the first seeds the opening topic.
    pub technologies: Vec<String>,
    /// Current difficulty, always within [0.5, 2.5].
    pub difficulty: f64,
    pub questions_asked: i32,
    pub average_score: f64,
    /// Topic → number of questions asked on it.
    pub topic_coverage: Value,
    pub status: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub overall_score: Option<f64>,
}

/// One question row; answer and evaluation are filled by the answer step.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InterviewRecordRow {
    pub id: Uuid,
    pub session_id: Uuid,
    pub question: String,
    pub answer: Option<String>,
    pub evaluation: Option<Value>,
    pub difficulty: f64,
    pub created_at: DateTime<Utc>,
}

pub const SESSION_ACTIVE: &str = "active";
pub const SESSION_ENDED: &str = "ended";
