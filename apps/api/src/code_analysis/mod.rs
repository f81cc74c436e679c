//! Code analysis — stateless model-backed code review endpoints.
//!
//! Four operations (analyze, optimize, explain, security review) that wrap
//! one prompt each. They share the interview engine's model seam but none of
//! its session state.

pub mod analyzer;
pub mod handlers;
pub mod prompts;
