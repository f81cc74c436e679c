//! Session aggregation — folds a complete context log into the final report.
//!
//! Aggregation never invents data: an empty log or a log with no evaluated
//! answers is an error, not a zero-score report.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::interview::engine::{ContextEntry, Evaluation};
use crate::interview::prompts::{
    NO_WEAKNESS_RECOMMENDATION, RECOMMENDATION_PROMPT_TEMPLATE, RECOMMENDATION_SYSTEM,
};
use crate::llm_client::{generate_json, TextModel};

/// Direction of the candidate's score trajectory over the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Improving,
    Steady,
    Declining,
}

/// The final report computed once at session end from the full context log.
#[derive(Debug, Clone, Serialize)]
pub struct FinalReport {
    pub overall_score: f64,
    pub communication_score: f64,
    pub difficulty_progression: Vec<f64>,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub question_count: usize,
    pub trend: Trend,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RecommendationReply {
    recommendations: Vec<String>,
}

/// Builds the report body from the context log. `recommendations` is left
/// empty; callers fill it via [`recommend`].
pub fn build_report(
    context: &[ContextEntry],
    difficulty_progression: &[f64],
) -> Result<FinalReport, AppError> {
    if context.is_empty() {
        return Err(AppError::EmptySession);
    }

    let evaluations: Vec<&Evaluation> = context
        .iter()
        .filter_map(|entry| match entry {
            ContextEntry::Candidate { evaluation, .. } => Some(evaluation),
            ContextEntry::Interviewer { .. } => None,
        })
        .collect();

    if evaluations.is_empty() {
        return Err(AppError::NoEvaluations);
    }

    let scores: Vec<f64> = evaluations.iter().map(|e| e.score).collect();
    let clarity: Vec<f64> = evaluations.iter().map(|e| e.clarity_score).collect();

    let overall_score = mean(&scores);
    let communication_score = mean(&clarity);

    let strengths = dedup_preserving_order(
        evaluations
            .iter()
            .flat_map(|e| e.strength_points.iter().cloned()),
    );
    let weaknesses = dedup_preserving_order(
        evaluations
            .iter()
            .flat_map(|e| e.weakness_points.iter().cloned()),
    );

    Ok(FinalReport {
        overall_score,
        communication_score,
        difficulty_progression: difficulty_progression.to_vec(),
        strengths,
        weaknesses,
        question_count: evaluations.len(),
        trend: classify_trend(&scores),
        recommendations: Vec::new(),
    })
}

/// Generates study recommendations from the deduplicated weakness set.
/// The empty-weakness case deliberately short-circuits to a static
/// recommendation without consulting the model.
pub async fn recommend(
    weaknesses: &[String],
    model: &dyn TextModel,
) -> Result<Vec<String>, AppError> {
    if weaknesses.is_empty() {
        return Ok(vec![NO_WEAKNESS_RECOMMENDATION.to_string()]);
    }

    let listed = weaknesses
        .iter()
        .map(|w| format!("- {w}"))
        .collect::<Vec<_>>()
        .join("\n");
    let prompt = RECOMMENDATION_PROMPT_TEMPLATE.replace("{weaknesses}", &listed);
    let reply: RecommendationReply =
        generate_json(model, &prompt, RECOMMENDATION_SYSTEM).await?;
    Ok(reply.recommendations)
}

/// Compares the last two scores. Fewer than two data points is Steady by
/// convention — a one-sample "trend" has no direction.
fn classify_trend(scores: &[f64]) -> Trend {
    if scores.len() < 2 {
        return Trend::Steady;
    }
    let delta = scores[scores.len() - 1] - scores[scores.len() - 2];
    if delta > 0.0 {
        Trend::Improving
    } else if delta < 0.0 {
        Trend::Declining
    } else {
        Trend::Steady
    }
}

fn dedup_preserving_order(items: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items.filter(|item| seen.insert(item.clone())).collect()
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}
