// Adaptive interview engine.
// Implements: difficulty calibration, the question/answer cycle, session
// aggregation, and the per-session registry.
// All LLM calls go through llm_client — no direct API calls here.

pub mod difficulty;
pub mod engine;
pub mod handlers;
pub mod prompts;
pub mod registry;
pub mod summary;
