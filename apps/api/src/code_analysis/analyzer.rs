//! Typed wrappers over the code analysis prompts.
//!
//! Stateless: every function is one model call, decoded strictly. A reply
//! that does not match the schema is an error, never a defaulted report.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::code_analysis::prompts::{
    ANALYZE_PROMPT_TEMPLATE, CODE_SYSTEM, EXPLAIN_PROMPT_TEMPLATE, OPTIMIZE_PROMPT_TEMPLATE,
    SECURITY_PROMPT_TEMPLATE,
};
use crate::errors::AppError;
use crate::llm_client::{generate_json, TextModel};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplexityEstimate {
    pub time_complexity: String,
    pub space_complexity: String,
}

/// Complexity and quality report for one code submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeAnalysis {
    pub complexity: ComplexityEstimate,
    pub best_practices: Vec<String>,
    pub potential_issues: Vec<String>,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeOptimization {
    pub optimized_code: String,
    pub changes: Vec<String>,
    pub expected_impact: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeExplanation {
    pub summary: String,
    pub walkthrough: Vec<String>,
    pub key_concepts: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityFinding {
    pub severity: Severity,
    pub description: String,
    pub remediation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityReview {
    pub findings: Vec<SecurityFinding>,
    pub overall_risk: Severity,
}

pub async fn analyze(
    code: &str,
    language: &str,
    model: &dyn TextModel,
) -> Result<CodeAnalysis, AppError> {
    run(ANALYZE_PROMPT_TEMPLATE, code, language, model).await
}

pub async fn optimize(
    code: &str,
    language: &str,
    model: &dyn TextModel,
) -> Result<CodeOptimization, AppError> {
    run(OPTIMIZE_PROMPT_TEMPLATE, code, language, model).await
}

pub async fn explain(
    code: &str,
    language: &str,
    model: &dyn TextModel,
) -> Result<CodeExplanation, AppError> {
    run(EXPLAIN_PROMPT_TEMPLATE, code, language, model).await
}

pub async fn security_review(
    code: &str,
    language: &str,
    model: &dyn TextModel,
) -> Result<SecurityReview, AppError> {
    run(SECURITY_PROMPT_TEMPLATE, code, language, model).await
}

/// Fills a code analysis template and decodes the reply. All four endpoints
/// share this path, so they share the retry and fence-stripping behavior of
/// the model client.
async fn run<T: DeserializeOwned>(
    template: &str,
    code: &str,
    language: &str,
    model: &dyn TextModel,
) -> Result<T, AppError> {
    let prompt = template
        .replace("{language}", language)
        .replace("{code}", code);
    let reply = generate_json(model, &prompt, CODE_SYSTEM).await?;
    Ok(reply)
}
