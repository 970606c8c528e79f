//! LLM response parsing into typed oracle responses.
//!
//! Models are asked for bare JSON but routinely wrap it in markdown fences,
//! lead with a sentence of prose, or leave trailing commas. Each parser runs
//! the same recovery strategies before giving up:
//! 1. Direct `serde_json` deserialization
//! 2. Extract JSON from a markdown code block
//! 3. Take the outermost `{ ... }` span
//! 4. Strip trailing commas from each candidate and retry

use serde::de::DeserializeOwned;

use hearth_types::{Priority, StrategicResponse, TacticalResponse};

use crate::error::LlmError;

/// Strategic answer as the model writes it.
#[derive(Debug, serde::Deserialize)]
struct RawStrategic {
    goal: String,
    #[serde(default)]
    priority: Option<String>,
    #[serde(default)]
    reasoning: Option<String>,
}

/// Tactical answer as the model writes it. Some models say `steps`.
#[derive(Debug, serde::Deserialize)]
struct RawTactical {
    #[serde(default)]
    thought: Option<String>,
    #[serde(default, alias = "steps")]
    plan: Vec<serde_json::Value>,
}

/// Parse a strategic answer.
///
/// The goal name is normalized to `UPPER_SNAKE`; an unknown or missing
/// priority becomes [`Priority::Medium`].
///
/// # Errors
///
/// Returns [`LlmError::Parse`] if no strategy yields a JSON object with a
/// non-empty `goal`.
pub fn parse_strategic(raw: &str) -> Result<StrategicResponse, LlmError> {
    let parsed: RawStrategic = parse_json(raw)?;
    let goal = normalize_goal(&parsed.goal);
    if goal.is_empty() {
        return Err(LlmError::Parse("strategic answer has an empty goal".to_owned()));
    }
    Ok(StrategicResponse {
        goal,
        priority: parsed
            .priority
            .as_deref()
            .map_or(Priority::Medium, Priority::from_label),
        reasoning: parsed.reasoning.unwrap_or_default().trim().to_owned(),
    })
}

/// Parse a tactical answer. An empty plan is valid and means "nothing to do
/// right now".
///
/// # Errors
///
/// Returns [`LlmError::Parse`] if no strategy yields a JSON object.
pub fn parse_tactical(raw: &str) -> Result<TacticalResponse, LlmError> {
    let parsed: RawTactical = parse_json(raw)?;
    let steps = parsed
        .plan
        .iter()
        .filter_map(|step| match step {
            serde_json::Value::String(s) => Some(s.trim().to_owned()),
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        })
        .filter(|s| !s.is_empty())
        .collect();
    Ok(TacticalResponse {
        steps,
        thought: parsed.thought.unwrap_or_default(),
    })
}

fn normalize_goal(goal: &str) -> String {
    goal.trim()
        .split(|c: char| c.is_whitespace() || c == '-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
        .to_ascii_uppercase()
}

/// Run every recovery strategy until one deserializes into `T`.
fn parse_json<T: DeserializeOwned>(raw: &str) -> Result<T, LlmError> {
    let trimmed = raw.trim();

    let candidates = [
        Some(trimmed),
        extract_json_from_codeblock(trimmed),
        extract_outer_object(trimmed),
    ];

    for candidate in candidates.iter().flatten() {
        if let Ok(parsed) = serde_json::from_str::<T>(candidate) {
            return Ok(parsed);
        }
    }
    for candidate in candidates.iter().flatten() {
        if let Ok(parsed) = serde_json::from_str::<T>(&strip_trailing_commas(candidate)) {
            return Ok(parsed);
        }
    }

    Err(LlmError::Parse(format!(
        "all parse strategies failed for: {trimmed}"
    )))
}

/// Extract the body of the first markdown code block, if any.
fn extract_json_from_codeblock(text: &str) -> Option<&str> {
    let fence = text.find("```")?;
    let after_fence = text.get(fence.checked_add(3)?..)?;
    // Skip the info string (`json`, `JSON`, nothing) up to the newline.
    let body_start = after_fence.find('\n').and_then(|nl| nl.checked_add(1))?;
    let body = after_fence.get(body_start..)?;
    let end = body.find("```")?;
    body.get(..end).map(str::trim)
}

/// The span from the first `{` to the last `}`.
fn extract_outer_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    text.get(start..=end)
}

/// Strip trailing commas before closing braces and brackets.
fn strip_trailing_commas(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == ',' && matches!(chars.clone().find(|n| !n.is_whitespace()), Some('}' | ']')) {
            continue;
        }
        result.push(c);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_clean_strategic() {
        let raw = r#"{"goal": "BUILD_CAMPFIRE", "priority": "HIGH", "reasoning": "Cold."}"#;
        let response = parse_strategic(raw);
        assert!(response.is_ok());
        let Ok(response) = response else { return };
        assert_eq!(response.goal, "BUILD_CAMPFIRE");
        assert_eq!(response.priority, Priority::High);
        assert_eq!(response.reasoning, "Cold.");
    }

    #[test]
    fn strategic_goal_is_normalized() {
        let raw = r#"{"goal": " gather wood ", "priority": "whenever"}"#;
        let Ok(response) = parse_strategic(raw) else {
            return;
        };
        assert_eq!(response.goal, "GATHER_WOOD");
        assert_eq!(response.priority, Priority::Medium);
        assert!(response.reasoning.is_empty());
    }

    #[test]
    fn strategic_in_code_block_with_trailing_comma() {
        let raw = "Here is my decision:\n```json\n{\"goal\": \"EAT\", \"priority\": \"urgent\",}\n```";
        let response = parse_strategic(raw);
        assert_eq!(response.map(|r| (r.goal, r.priority)).ok(), Some(("EAT".to_owned(), Priority::Urgent)));
    }

    #[test]
    fn strategic_after_leading_prose() {
        let raw = "I think Luna should rest. {\"goal\": \"REST\", \"priority\": \"LOW\"} Hope that helps.";
        assert_eq!(parse_strategic(raw).map(|r| r.goal).ok().as_deref(), Some("REST"));
    }

    #[test]
    fn empty_or_missing_goal_is_an_error() {
        assert!(matches!(parse_strategic(r#"{"goal": "  "}"#), Err(LlmError::Parse(_))));
        assert!(matches!(parse_strategic(r#"{"priority": "HIGH"}"#), Err(LlmError::Parse(_))));
        assert!(matches!(parse_strategic("I cannot decide."), Err(LlmError::Parse(_))));
    }

    #[test]
    fn parse_tactical_plan() {
        let raw = r#"{"thought": "Wood first.", "plan": ["MOVE_TO tree_1", "HARVEST tree_1", "BUILD campfire"]}"#;
        let response = parse_tactical(raw);
        assert!(response.is_ok());
        let Ok(response) = response else { return };
        assert_eq!(response.thought, "Wood first.");
        assert_eq!(response.steps, vec!["MOVE_TO tree_1", "HARVEST tree_1", "BUILD campfire"]);
    }

    #[test]
    fn tactical_accepts_steps_alias_and_empty_plan() {
        let aliased = parse_tactical(r#"{"steps": ["EAT", "", null]}"#);
        assert_eq!(aliased.map(|r| r.steps).ok(), Some(vec!["EAT".to_owned()]));

        let empty = parse_tactical(r#"{"thought": "Nothing to do."}"#);
        assert_eq!(empty.map(|r| r.steps.len()).ok(), Some(0));
    }

    #[test]
    fn tactical_garbage_is_an_error() {
        assert!(matches!(parse_tactical("MOVE_TO tree_1 then HARVEST"), Err(LlmError::Parse(_))));
    }

    #[test]
    fn strip_trailing_commas_basic() {
        assert_eq!(strip_trailing_commas(r#"{"a": 1, "b": [2, 3, ],}"#), r#"{"a": 1, "b": [2, 3 ]}"#);
    }

    #[test]
    fn codeblock_without_language_tag() {
        let raw = "```\n{\"goal\": \"SURVIVE\"}\n```";
        assert_eq!(extract_json_from_codeblock(raw), Some("{\"goal\": \"SURVIVE\"}"));
    }
}
