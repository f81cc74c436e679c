// All LLM prompt constants for the interview engine.
// Every prompt demands JSON-only output matching an exact schema; replies
// are decoded into typed structs and rejected on mismatch.

/// System prompt for question generation — enforces JSON-only output.
pub const QUESTION_SYSTEM: &str = "You are an experienced IT technical interviewer \
    conducting an adaptive interview. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Question generation prompt template.
/// Replace: {topic}, {band}, {position_level}, {previous_questions}
pub const QUESTION_PROMPT_TEMPLATE: &str = r#"Generate one technical interview question.

Topic: {topic}
Difficulty: {band}
Position level: {position_level}

Questions already asked this session (do NOT repeat or closely paraphrase them):
{previous_questions}

Return a JSON object with this EXACT schema (no extra fields):
{
  "question": "The question text, specific and self-contained",
  "expected_topics": ["concepts a complete answer should touch"],
  "evaluation_criteria": ["what distinguishes a strong answer from a weak one"]
}

Rules:
- The question must genuinely match the "{band}" difficulty: basic questions test
  recall, intermediate test application, advanced test trade-off reasoning,
  expert test design judgment under constraints.
- expected_topics must list 2-5 entries; evaluation_criteria must list 2-4.
- Ask about {topic} specifically, not the candidate's background in general."#;

/// System prompt for answer evaluation — enforces JSON-only output.
pub const EVALUATION_SYSTEM: &str = "You are a rigorous technical interviewer \
    scoring a candidate's answer against stated criteria. \
    Score strictly and consistently. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences.";

/// Answer evaluation prompt template.
/// Replace: {question}, {expected_topics}, {evaluation_criteria}, {answer}
pub const EVALUATION_PROMPT_TEMPLATE: &str = r#"Evaluate this interview answer.

Question: {question}
Expected topics: {expected_topics}
Evaluation criteria: {evaluation_criteria}

Candidate's answer:
{answer}

Return a JSON object with this EXACT schema (no extra fields):
{
  "score": 72.5,
  "clarity_score": 80.0,
  "strength_points": ["specific things the answer got right"],
  "weakness_points": ["specific gaps or errors"],
  "missing_topics": ["expected topics the answer never addressed"]
}

Rules:
- score and clarity_score are numbers from 0 to 100, NOT strings.
- score measures technical correctness and depth against the criteria.
- clarity_score measures structure and communication only.
- Every strength and weakness must reference something actually in the answer.
- missing_topics may only contain entries from the expected topics list."#;

/// System prompt for recommendation generation.
pub const RECOMMENDATION_SYSTEM: &str = "You are a technical mentor writing \
    concrete study recommendations after an interview. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences.";

/// Recommendation prompt template. Replace: {weaknesses}
pub const RECOMMENDATION_PROMPT_TEMPLATE: &str = r#"A candidate showed these weaknesses across an interview:
{weaknesses}

Return a JSON object with this EXACT schema:
{
  "recommendations": ["3-5 concrete, actionable study recommendations"]
}

Each recommendation must target a listed weakness and name a specific
topic or practice activity, not generic encouragement."#;

/// Fallback recommendation used when a session surfaced no weaknesses.
/// This branch deliberately skips the LLM call.
pub const NO_WEAKNESS_RECOMMENDATION: &str =
    "No significant weaknesses were identified. Keep practicing at the current level \
     and consider interviewing for a harder difficulty band.";
