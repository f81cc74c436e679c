// Prompt constants for the code analysis API. Same contract as the
// interview prompts: JSON-only replies decoded into typed structs.

/// Shared system prompt for all code analysis endpoints.
pub const CODE_SYSTEM: &str = "You are a senior software engineer reviewing \
    code submitted during a technical interview. \
    Be precise and concrete; reference the submitted code directly. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences.";

/// Complexity/quality analysis template. Replace: {language}, {code}
pub const ANALYZE_PROMPT_TEMPLATE: &str = r#"Analyze this {language} code:

```{language}
{code}
```

Return a JSON object with this EXACT schema (no extra fields):
{
  "complexity": {
    "time_complexity": "Big O notation with a one-line explanation",
    "space_complexity": "Big O notation with a one-line explanation"
  },
  "best_practices": ["practices the code follows or violates, stated as such"],
  "potential_issues": ["bugs, edge cases, or concerns present in the code"],
  "suggestions": ["specific, actionable improvements"]
}

Rules:
- Complexity must describe the code as written, not an idealized version.
- Every issue and suggestion must point at something actually in the code."#;

/// Optimization template. Replace: {language}, {code}
pub const OPTIMIZE_PROMPT_TEMPLATE: &str = r#"Optimize this {language} code:

```{language}
{code}
```

Return a JSON object with this EXACT schema (no extra fields):
{
  "optimized_code": "the full rewritten code as one string",
  "changes": ["each change made and what it improves"],
  "expected_impact": "one sentence on the overall performance or clarity gain"
}

Rules:
- optimized_code must be complete and runnable {language}, not a fragment.
- Preserve the observable behavior of the original code.
- If no meaningful optimization exists, return the code unchanged and say so
  in expected_impact."#;

/// Explanation template. Replace: {language}, {code}
pub const EXPLAIN_PROMPT_TEMPLATE: &str = r#"Explain this {language} code:

```{language}
{code}
```

Return a JSON object with this EXACT schema (no extra fields):
{
  "summary": "one or two sentences on what the code does overall",
  "walkthrough": ["step-by-step explanation, one entry per logical section"],
  "key_concepts": ["language features or algorithms the code relies on"]
}

Rules:
- Write for an interviewer assessing the candidate, not for a beginner.
- walkthrough entries must follow the code's actual order."#;

/// Security review template. Replace: {language}, {code}
pub const SECURITY_PROMPT_TEMPLATE: &str = r#"Review this {language} code for security problems:

```{language}
{code}
```

Return a JSON object with this EXACT schema (no extra fields):
{
  "findings": [
    {
      "severity": "low",
      "description": "what is vulnerable and how it could be exploited",
      "remediation": "how to fix it"
    }
  ],
  "overall_risk": "low"
}

Rules:
- severity and overall_risk must be one of: "low", "medium", "high", "critical".
- findings may be empty when the code has no security problems; overall_risk
  is then "low".
- Only report problems present in the submitted code, not hypothetical ones
  about code that is not shown."#;
