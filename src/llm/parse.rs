use std::collections::HashSet;

use crate::error::ForgeError;
use crate::types::plan::Plan;

/// Turn the model's JSON-ish text into a usable `Plan`.
///
/// The model is instructed to return bare JSON but routinely wraps it in
/// markdown fences or leading prose, so parsing proceeds in stages:
/// fence stripping, a straight parse, then a brace-matched slice retry.
/// Whatever deserializes is then normalized (renumbered stories, synthesized
/// task ids). A plan with nothing usable in it is an error.
pub fn parse_plan(raw: &str) -> Result<Plan, ForgeError> {
    let text = strip_code_fences(raw);

    let plan: Plan = match serde_json::from_str(text) {
        Ok(plan) => plan,
        Err(first_err) => {
            let Some(slice) = extract_json_object(text) else {
                return Err(ForgeError::LlmParse(first_err.to_string()));
            };
            serde_json::from_str(slice).map_err(|e| ForgeError::LlmParse(e.to_string()))?
        }
    };

    let plan = normalize_plan(plan);
    if plan.user_stories.is_empty() && plan.engineering_tasks.is_empty() {
        return Err(ForgeError::LlmParse(
            "response contained no user stories or engineering tasks".to_string(),
        ));
    }
    Ok(plan)
}

/// Strip a single surrounding markdown code fence, with or without an info
/// string (```json). Returns the input unchanged when no fence is present.
fn strip_code_fences(s: &str) -> &str {
    let s = s.trim();
    let Some(rest) = s.strip_prefix("```") else {
        return s;
    };
    // Drop the info string line ("json", "JSON", or empty).
    let Some(newline) = rest.find('\n') else {
        return s;
    };
    let body = rest[newline + 1..].trim_end();
    body.strip_suffix("```").map(str::trim_end).unwrap_or(body).trim_start()
}

/// Slice from the first `{` to its matching closing brace.
fn extract_json_object(s: &str) -> Option<&str> {
    let start = s.find('{')?;
    let tail = &s[start..];
    let end = find_matching_brace(tail)?;
    Some(&tail[..=end])
}

/// Find the byte position of the brace matching the one that opens `s`.
/// Braces inside JSON string literals are ignored.
fn find_matching_brace(s: &str) -> Option<usize> {
    let mut depth: i32 = 0;
    let mut in_string = false;
    let mut escaped = false;
    for (byte_pos, c) in s.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(byte_pos);
                }
            }
            _ => {}
        }
    }
    None
}

/// Post-parse cleanup so downstream consumers can rely on the plan's shape:
/// stories keep a 1..n numbering, every task carries a unique non-empty id
/// and a group.
fn normalize_plan(mut plan: Plan) -> Plan {
    plan.user_stories.retain(|s| !s.title.trim().is_empty());

    let mut seen_numbers = HashSet::new();
    let needs_renumber = plan
        .user_stories
        .iter()
        .any(|s| s.number == 0 || !seen_numbers.insert(s.number));
    if needs_renumber {
        for (i, story) in plan.user_stories.iter_mut().enumerate() {
            story.number = (i + 1) as u32;
        }
    }

    plan.engineering_tasks.retain(|t| !t.title.trim().is_empty());

    let mut seen_ids: HashSet<String> = HashSet::new();
    for (i, task) in plan.engineering_tasks.iter_mut().enumerate() {
        let trimmed = task.id.trim();
        if trimmed.is_empty() || seen_ids.contains(trimmed) {
            let mut n = i + 1;
            let mut fresh = format!("task-{n}");
            while seen_ids.contains(&fresh) {
                n += 1;
                fresh = format!("task-{n}");
            }
            task.id = fresh;
        } else {
            task.id = trimmed.to_string();
        }
        seen_ids.insert(task.id.clone());

        if task.group.trim().is_empty() {
            task.group = "General".to_string();
        }
        if task.description.as_deref().is_some_and(|d| d.trim().is_empty()) {
            task.description = None;
        }
    }

    plan
}
