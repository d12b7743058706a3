//! Default prompt context and request merging.

use serde_json::{Map, Value};

/// Values used for any placeholder the caller does not supply.
pub const DEFAULTS: &[(&str, &str)] = &[
    ("user_name", "User"),
    ("track_theme", "General Productivity"),
    ("current_level", "1"),
    ("time_of_day", "Day"),
    ("available_time", "flexible"),
    ("recent_tasks", "None"),
    ("pending_tasks", "None"),
    ("patterns", "None"),
    ("accomplishments", "None"),
    ("recent_accomplishments", "None"),
    ("reflection", "None"),
    ("reflection_snippet", "None"),
    ("highlights", "None"),
    ("challenges", "None"),
    ("next_focus", "None"),
    ("mood", "Neutral"),
    ("streak_days", "0"),
    ("tasks_completed_today", "0"),
    ("recent_wins", "None"),
    ("stumbling_blocks", "None"),
    ("challenge_category", "General"),
    ("difficulty", "Easy"),
    ("tasks_completed", "None"),
    ("challenges_faced", "None"),
    ("performance_trend", "Stable"),
    ("availability", "Flexible"),
];

const CONTEXT_KEY: &str = "context";

/// Build the prompt context for a request body.
///
/// Non-object bodies count as empty; a string body is decoded once more in
/// case the client double-encoded its JSON. Precedence, lowest first:
/// defaults, the body's `context` object, top-level body fields. The
/// `context` key itself is dropped.
pub fn merge_context(body: Value) -> Map<String, Value> {
    let body = match body {
        Value::String(s) => serde_json::from_str(&s).unwrap_or(Value::Null),
        other => other,
    };
    let mut data = match body {
        Value::Object(map) => map,
        _ => Map::new(),
    };

    let client_context = match data.remove(CONTEXT_KEY) {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    };

    let mut context: Map<String, Value> = DEFAULTS
        .iter()
        .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
        .collect();
    context.extend(client_context);
    context.extend(data);
    context
}
