//! Parsing helpers for provider responses
//!
//! Models wrap their payload in prose, markdown fences or a stray JSON
//! object. These functions dig the usable part out and map it onto the
//! output types; none of them call a provider.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::models::{Category, Insight, InsightType};

use super::ProviderId;

/// Find the first complete JSON array of objects in free text
///
/// Bracket matching is string-aware, so `]` inside a quoted message does not
/// end the array early. Candidates that do not parse, or that hold only
/// scalars (footnote markers like `[1]`), are skipped. An empty array counts.
pub fn extract_json_array(text: &str) -> Option<&str> {
    let mut search_from = 0;

    while let Some(offset) = text[search_from..].find('[') {
        let start = search_from + offset;
        if let Some(end) = matching_bracket(&text[start..]) {
            let candidate = &text[start..start + end + 1];
            if let Ok(items) = serde_json::from_str::<Vec<Value>>(candidate) {
                if items.is_empty() || items.iter().any(Value::is_object) {
                    return Some(candidate);
                }
            }
        }
        search_from = start + 1;
    }

    None
}

/// Byte offset of the `]` closing the `[` at position 0
fn matching_bracket(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '[' | '{' => depth += 1,
            ']' | '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return (c == ']').then_some(i);
                }
            }
            _ => {}
        }
    }

    None
}

/// Parse provider text into insights
///
/// Returns an empty vec when no array is found or nothing usable is in it;
/// the caller decides whether that counts as a failure.
pub fn parse_insights(text: &str, provider: ProviderId) -> Vec<Insight> {
    let Some(json) = extract_json_array(text) else {
        return Vec::new();
    };
    let Ok(items) = serde_json::from_str::<Vec<Value>>(json) else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let mut insights = Vec::new();

    for item in items {
        let Value::Object(obj) = item else {
            continue;
        };
        let (Some(title), Some(message)) = (text_field(&obj, "title"), text_field(&obj, "message"))
        else {
            continue;
        };

        let insight_type = text_field(&obj, "type")
            .map(|t| InsightType::from_lenient(&t))
            .unwrap_or(InsightType::Info);
        let confidence =
            number_field(&obj, "confidence").unwrap_or_else(|| provider.default_confidence());

        let id = match id_field(&obj) {
            Some(id) if !seen.contains(&id) => id,
            _ => generated_id(provider, insights.len() + 1, &seen),
        };
        seen.insert(id.clone());

        let mut insight = Insight::new(id, insight_type, title, message, confidence);
        insight.action = text_field(&obj, "action");
        insight.category = text_field(&obj, "category");
        insight.amount = number_field(&obj, "amount");
        insights.push(insight);
    }

    insights
}

fn text_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Numbers and numeric strings; NaN and infinities are rejected
fn number_field(obj: &Map<String, Value>, key: &str) -> Option<f64> {
    let value = match obj.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    value.is_finite().then_some(value)
}

fn id_field(obj: &Map<String, Value>) -> Option<String> {
    match obj.get("id")? {
        Value::Number(n) => Some(n.to_string()),
        _ => text_field(obj, "id"),
    }
}

fn generated_id(provider: ProviderId, mut index: usize, seen: &HashSet<String>) -> String {
    loop {
        let id = format!("{}-{}", provider.as_str(), index);
        if !seen.contains(&id) {
            return id;
        }
        index += 1;
    }
}

fn fence_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"```[A-Za-z]*\n?").expect("valid regex"))
}

fn label_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^\s*(answer|response|advice)\s*:\s*").expect("valid regex"))
}

fn blank_lines_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n\s*\n(\s*\n)+").expect("valid regex"))
}

/// Clean a free-text answer; `None` when nothing readable is left
pub fn clean_answer(text: &str) -> Option<String> {
    let without_fences = fence_re().replace_all(text.trim(), "");
    let mut cleaned = without_fences.trim().to_string();

    if cleaned.starts_with('{') && cleaned.ends_with('}') {
        if let Ok(Value::Object(obj)) = serde_json::from_str::<Value>(&cleaned) {
            if let Some(inner) = ["answer", "text", "response"]
                .iter()
                .find_map(|key| text_field(&obj, key))
            {
                cleaned = inner;
            }
        }
    }

    let cleaned = label_re().replace(&cleaned, "");
    let cleaned = blank_lines_re().replace_all(&cleaned, "\n\n");
    let cleaned = cleaned.trim();

    (!cleaned.is_empty()).then(|| cleaned.to_string())
}

/// Map a classifier reply onto the closed label set; unknown labels become `Other`
pub fn parse_category(text: &str) -> Category {
    let line = text.trim().lines().next().unwrap_or_default();
    let line = line
        .trim()
        .strip_prefix("Category:")
        .or_else(|| line.trim().strip_prefix("category:"))
        .unwrap_or(line);
    let label = line.trim_matches(|c: char| !c.is_alphanumeric());

    label.parse().unwrap_or(Category::Other)
}
