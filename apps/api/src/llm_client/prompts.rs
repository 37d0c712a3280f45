// Shared prompt fragments.
// Each service that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_INSTRUCTION: &str = "IMPORTANT: Return ONLY valid JSON. \
    Do NOT use markdown code fences. \
    Do NOT include any text outside the JSON object.";
