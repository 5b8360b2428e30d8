//! Backend payload normalization
//!
//! The chat backend is loosely typed: replies arrive as bare strings or as
//! objects whose fields vary between deployments. Each concern (text,
//! actions, usage) is resolved by probing an ordered list of field names and
//! taking the first one that yields a usable value. Nothing here fails; every
//! input produces a [`CanonicalResponse`].

use super::types::{ActionGroup, CanonicalResponse, CtaItem, Usage, VideoLink};
use serde_json::{Map, Value};

/// Reply text used when a payload has no recognizable shape
pub const FALLBACK_TEXT: &str = "I received an unexpected response format. Please try again.";

const TEXT_FIELDS: &[&str] = &["response", "message", "reply"];
const ACTION_FIELDS: &[&str] = &["CTAResponse", "ctaResponse", "actions"];
const USAGE_FIELDS: &[&str] = &["usages", "usage"];

const CTA_FIELDS: &[&str] = &["cta", "buttons"];
const VIDEO_FIELDS: &[&str] = &["videoLinks", "video_links", "videos"];
const LABEL_FIELDS: &[&str] = &["name", "label"];
const URL_FIELDS: &[&str] = &["url", "value"];

const INPUT_TOKEN_FIELDS: &[&str] = &["inputTokens", "input_tokens", "inputtoken"];
const OUTPUT_TOKEN_FIELDS: &[&str] = &[
    "outputTokens",
    "output_tokens",
    "outputtoken",
    "outputtikem",
];
const COST_FIELDS: &[&str] = &["cost"];
const DURATION_FIELDS: &[&str] = &["durationMs", "duration_ms", "duration"];
const ESTIMATED_FIELDS: &[&str] = &["isEstimated", "is_estimated"];

/// Reduce any backend payload to a canonical reply.
pub fn normalize(payload: &Value) -> CanonicalResponse {
    match payload {
        Value::String(text) if !text.trim().is_empty() => CanonicalResponse::text(text.clone()),
        Value::Object(fields) => normalize_object(fields),
        other => {
            tracing::debug!(kind = value_kind(other), "Unrecognized reply payload");
            CanonicalResponse::fallback()
        }
    }
}

fn normalize_object(fields: &Map<String, Value>) -> CanonicalResponse {
    // Serializing the whole object keeps the text non-empty even when the
    // backend omits every known text field.
    let text = first_match(fields, TEXT_FIELDS, non_blank_string)
        .unwrap_or_else(|| Value::Object(fields.clone()).to_string());
    let actions = first_match(fields, ACTION_FIELDS, action_groups).unwrap_or_default();
    let usage = first_match(fields, USAGE_FIELDS, usage).unwrap_or_default();

    CanonicalResponse::new(text, actions, usage)
}

/// Evaluate `extract` against each named field in priority order.
fn first_match<T>(
    fields: &Map<String, Value>,
    names: &[&str],
    extract: impl Fn(&Value) -> Option<T>,
) -> Option<T> {
    names
        .iter()
        .filter_map(|name| fields.get(*name))
        .find_map(extract)
}

fn non_blank_string(value: &Value) -> Option<String> {
    value
        .as_str()
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}

fn action_groups(value: &Value) -> Option<Vec<ActionGroup>> {
    match value {
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(Value::as_object)
                .map(action_group)
                .filter(|group| !group.is_empty())
                .collect(),
        ),
        // A lone group object is accepted as a one-element list
        Value::Object(group) => {
            let group = action_group(group);
            Some(if group.is_empty() { vec![] } else { vec![group] })
        }
        _ => None,
    }
}

fn action_group(fields: &Map<String, Value>) -> ActionGroup {
    let cta: Vec<CtaItem> = first_match(fields, CTA_FIELDS, |v| {
        v.as_array().map(|items| items.iter().filter_map(cta_item).collect())
    })
    .unwrap_or_default();
    let video_links: Vec<VideoLink> = first_match(fields, VIDEO_FIELDS, |v| {
        v.as_array().map(|items| items.iter().filter_map(video_link).collect())
    })
    .unwrap_or_default();

    ActionGroup { cta, video_links }
}

fn cta_item(value: &Value) -> Option<CtaItem> {
    let fields = value.as_object()?;
    let label = first_match(fields, LABEL_FIELDS, non_blank_string)?;
    let value = first_match(fields, &["value"], non_blank_string)?;
    Some(CtaItem { label, value })
}

fn video_link(value: &Value) -> Option<VideoLink> {
    let fields = value.as_object()?;
    let label = first_match(fields, LABEL_FIELDS, non_blank_string)?;
    let url = first_match(fields, URL_FIELDS, non_blank_string)?;
    Some(VideoLink { label, url })
}

fn usage(value: &Value) -> Option<Usage> {
    let fields = value.as_object()?;
    let defaults = Usage::default();

    Some(Usage {
        input_tokens: first_match(fields, INPUT_TOKEN_FIELDS, count)
            .unwrap_or(defaults.input_tokens),
        output_tokens: first_match(fields, OUTPUT_TOKEN_FIELDS, count)
            .unwrap_or(defaults.output_tokens),
        cost: first_match(fields, COST_FIELDS, amount).unwrap_or(defaults.cost),
        duration_ms: first_match(fields, DURATION_FIELDS, count).unwrap_or(defaults.duration_ms),
        is_estimated: first_match(fields, ESTIMATED_FIELDS, Value::as_bool)
            .unwrap_or(defaults.is_estimated),
    })
}

/// Non-negative integer, accepting whole floats the backend sometimes sends
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn count(value: &Value) -> Option<u64> {
    value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|n| n.is_finite() && *n >= 0.0)
            .map(|n| n.round() as u64)
    })
}

fn amount(value: &Value) -> Option<f64> {
    value.as_f64().filter(|n| n.is_finite())
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
