// Shared prompt fragments. Each service that calls the LLM keeps its own
// prompts.rs alongside it; this file holds the cross-cutting pieces.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Appended to extraction prompts so the model never invents facts.
pub const NO_INVENTION_INSTRUCTION: &str = "\
    Only extract information that is explicitly present in the document. \
    Use null or an empty list when a field is not stated. \
    Never guess dates, clients or skills.";
