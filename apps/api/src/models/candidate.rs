use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// Seniority level of a candidate. Drives the base value of the initial
/// difficulty calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateLevel {
    Junior,
    Intermediate,
    Senior,
}

impl CandidateLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            CandidateLevel::Junior => "junior",
            CandidateLevel::Intermediate => "intermediate",
            CandidateLevel::Senior => "senior",
        }
    }
}

impl FromStr for CandidateLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "junior" => Ok(CandidateLevel::Junior),
            "intermediate" => Ok(CandidateLevel::Intermediate),
            "senior" => Ok(CandidateLevel::Senior),
            other => Err(format!("unknown candidate level '{other}'")),
        }
    }
}

/// Candidate profile as read by the difficulty calibrator.
/// Immutable for the duration of a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub id: Uuid,
    pub name: String,
    pub years_experience: f64,
    /// Skill name → self-reported proficiency in [0.0, 1.0].
    pub skills: BTreeMap<String, f64>,
    pub education: String,
    pub level: CandidateLevel,
    /// Overall scores from past sessions, oldest first.
    pub past_scores: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CandidateRow {
    pub id: Uuid,
    pub name: String,
    pub years_experience: f64,
    pub skills: Value,
    pub education: String,
    pub level: String,
    pub past_scores: Vec<f64>,
    pub created_at: DateTime<Utc>,
}

impl CandidateRow {
    /// Converts the stored row into the typed candidate profile.
    /// Fails if the persisted level string is not a known level.
    pub fn into_candidate(self) -> anyhow::Result<Candidate> {
        let level = CandidateLevel::from_str(&self.level).map_err(anyhow::Error::msg)?;
        let skills: BTreeMap<String, f64> = serde_json::from_value(self.skills)?;
        Ok(Candidate {
            id: self.id,
            name: self.name,
            years_experience: self.years_experience,
            skills,
            education: self.education,
            level,
            past_scores: self.past_scores,
        })
    }
}
