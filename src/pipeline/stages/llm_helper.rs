//! Shared plumbing for stage LLM calls
//!
//! Every stage makes exactly one synthesis call through [`invoke`]; a
//! call failure propagates to the controller as a stage failure. Parse
//! failures are a different animal: [`parse_stage_response`] is as
//! forgiving as it can be (fence stripping, then contiguous-object
//! extraction), and when it still fails the stage substitutes its own
//! fallback value instead of erroring.

use crate::pipeline::context::StageContext;
use crate::search::EvidenceItem;
use anyhow::{Context, Result};
use tracing::debug;

/// Calls the model once with the stage's structured prompt.
pub async fn invoke(ctx: &StageContext, prompt: String, stage: &str) -> Result<String> {
    let request = crate::llm::LLMRequest::user(prompt)
        .with_temperature(ctx.config.temperature)
        .with_max_tokens(ctx.config.max_output_tokens);

    let response = ctx
        .llm
        .chat(request)
        .await
        .with_context(|| format!("LLM call failed in {}", stage))?;

    debug!(
        stage,
        response_ms = response.response_time.as_millis() as u64,
        chars = response.content.len(),
        "stage synthesis call"
    );

    Ok(response.content)
}

/// Parses a stage response into its declared schema.
///
/// Models wrap JSON in code fences or pad it with prose often enough
/// that both cases are handled here: first parse after fence stripping,
/// then fall back to the first balanced `{...}` substring.
pub fn parse_stage_response<T: serde::de::DeserializeOwned>(content: &str) -> Result<T> {
    let stripped = extract_json_from_markdown(content);
    match serde_json::from_str(stripped) {
        Ok(parsed) => Ok(parsed),
        Err(first_error) => {
            if let Some(object) = extract_json_object(content) {
                if let Ok(parsed) = serde_json::from_str(object) {
                    return Ok(parsed);
                }
            }
            Err(first_error).with_context(|| format!("unparseable stage response: {}", stripped))
        }
    }
}

fn extract_json_from_markdown(content: &str) -> &str {
    let trimmed = content.trim();

    if let Some(start_idx) = trimmed.find("```json") {
        let after_fence = &trimmed[start_idx + 7..];
        if let Some(end_idx) = after_fence.find("```") {
            return after_fence[..end_idx].trim();
        }
    }

    if let Some(start_idx) = trimmed.find("```") {
        let after_fence = &trimmed[start_idx + 3..];
        if let Some(end_idx) = after_fence.find("```") {
            return after_fence[..end_idx].trim();
        }
    }

    trimmed
}

/// Finds the first balanced top-level JSON object in `content`.
/// Brace counting skips braces inside string literals.
pub fn extract_json_object(content: &str) -> Option<&str> {
    let start = content.find('{')?;
    let bytes = content.as_bytes();

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &byte) in bytes[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }

        match byte {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&content[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Formats filtered evidence as numbered entries, truncated to the
/// configured character budget (counted in characters, cut on a char
/// boundary so multibyte text stays valid).
pub fn format_evidence(items: &[EvidenceItem], char_budget: usize) -> String {
    let mut lines = Vec::new();

    for (i, item) in items.iter().enumerate() {
        let mut entry = format!("{}. {}", i + 1, item.title);
        if let Some(url) = &item.source_url {
            entry.push_str(&format!("\n   URL: {}", url));
        }
        entry.push_str(&format!("\n   {}", item.snippet));
        lines.push(entry);
    }

    let text = lines.join("\n");
    truncate_chars(&text, char_budget).to_string()
}

/// Cuts `s` after `max_chars` characters, on a character boundary.
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
