//! Axum route handlers for the code analysis API.
//!
//! These endpoints are stateless prompt wrappers: no session, no storage,
//! one model call per request.

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::code_analysis::analyzer::{
    self, CodeAnalysis, CodeExplanation, CodeOptimization, SecurityReview,
};
use crate::errors::AppError;
use crate::state::AppState;

/// Shared request body for all four code endpoints.
#[derive(Debug, Deserialize)]
pub struct CodeRequest {
    pub code: String,
    pub language: String,
}

impl CodeRequest {
    fn validate(&self) -> Result<(), AppError> {
        if self.code.trim().is_empty() {
            return Err(AppError::Validation("code cannot be empty".to_string()));
        }
        if self.language.trim().is_empty() {
            return Err(AppError::Validation(
                "language cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// POST /api/v1/code/analyze
pub async fn handle_analyze_code(
    State(state): State<AppState>,
    Json(request): Json<CodeRequest>,
) -> Result<Json<CodeAnalysis>, AppError> {
    request.validate()?;
    let report = analyzer::analyze(&request.code, &request.language, state.llm.as_ref()).await?;
    Ok(Json(report))
}

/// POST /api/v1/code/optimize
pub async fn handle_optimize_code(
    State(state): State<AppState>,
    Json(request): Json<CodeRequest>,
) -> Result<Json<CodeOptimization>, AppError> {
    request.validate()?;
    let result = analyzer::optimize(&request.code, &request.language, state.llm.as_ref()).await?;
    Ok(Json(result))
}

/// POST /api/v1/code/explain
pub async fn handle_explain_code(
    State(state): State<AppState>,
    Json(request): Json<CodeRequest>,
) -> Result<Json<CodeExplanation>, AppError> {
    request.validate()?;
    let result = analyzer::explain(&request.code, &request.language, state.llm.as_ref()).await?;
    Ok(Json(result))
}

/// POST /api/v1/code/security
pub async fn handle_security_review(
    State(state): State<AppState>,
    Json(request): Json<CodeRequest>,
) -> Result<Json<SecurityReview>, AppError> {
    request.validate()?;
    let review =
        analyzer::security_review(&request.code, &request.language, state.llm.as_ref()).await?;
    Ok(Json(review))
}
