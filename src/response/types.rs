//! Types making up a canonical reply

use super::normalize::FALLBACK_TEXT;
use super::segments::split;
use serde::{Deserialize, Serialize};

/// A clickable button attached to a reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CtaItem {
    pub label: String,
    /// Action token interpreted by the presentation layer
    pub value: String,
}

impl CtaItem {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// A video link attached to a reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoLink {
    pub label: String,
    pub url: String,
}

impl VideoLink {
    pub fn new(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            url: url.into(),
        }
    }
}

/// Bundle of buttons and/or video links
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionGroup {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cta: Vec<CtaItem>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub video_links: Vec<VideoLink>,
}

impl ActionGroup {
    pub fn buttons(cta: Vec<CtaItem>) -> Self {
        Self {
            cta,
            video_links: vec![],
        }
    }

    pub fn with_videos(mut self, video_links: Vec<VideoLink>) -> Self {
        self.video_links = video_links;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.cta.is_empty() && self.video_links.is_empty()
    }
}

/// Usage statistics reported with a reply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cost: f64,
    pub duration_ms: u64,
    pub is_estimated: bool,
}

impl Default for Usage {
    fn default() -> Self {
        Self {
            input_tokens: 0,
            output_tokens: 0,
            cost: 0.0,
            duration_ms: 0,
            is_estimated: true,
        }
    }
}

/// The single reply shape every backend payload collapses into
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalResponse {
    pub text: String,
    pub actions: Vec<ActionGroup>,
    pub usage: Usage,
    /// Derived from `text`, one entry per chat bubble
    pub segments: Vec<String>,
}

impl CanonicalResponse {
    pub fn new(text: impl Into<String>, actions: Vec<ActionGroup>, usage: Usage) -> Self {
        let text = text.into();
        let segments = split(&text);
        Self {
            text,
            actions,
            usage,
            segments,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new(text, vec![], Usage::default())
    }

    /// Reply used when the backend payload could not be understood
    pub fn fallback() -> Self {
        Self::text(FALLBACK_TEXT)
    }

    /// All buttons across every action group, in order
    pub fn buttons(&self) -> impl Iterator<Item = &CtaItem> {
        self.actions.iter().flat_map(|group| group.cta.iter())
    }

    /// All video links across every action group, in order
    pub fn video_links(&self) -> impl Iterator<Item = &VideoLink> {
        self.actions.iter().flat_map(|group| group.video_links.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segments_derived_from_text() {
        let response = CanonicalResponse::text("Hello | world");
        assert_eq!(response.segments, vec!["Hello", "world"]);
    }

    #[test]
    fn test_default_usage_is_estimated() {
        let usage = Usage::default();
        assert!(usage.is_estimated);
        assert_eq!(usage.input_tokens, 0);
        assert_eq!(usage.duration_ms, 0);
    }

    #[test]
    fn test_action_group_serializes_camel_case() {
        let group = ActionGroup::buttons(vec![CtaItem::new("More", "more_info")])
            .with_videos(vec![VideoLink::new("Intro", "https://example.com/v")]);
        let json = serde_json::to_value(&group).unwrap();
        assert_eq!(json["cta"][0]["value"], "more_info");
        assert_eq!(json["videoLinks"][0]["url"], "https://example.com/v");
    }

    #[test]
    fn test_empty_group_omits_fields() {
        let json = serde_json::to_value(ActionGroup::default()).unwrap();
        assert_eq!(json, serde_json::json!({}));
    }

    #[test]
    fn test_buttons_flatten_groups() {
        let response = CanonicalResponse::new(
            "text",
            vec![
                ActionGroup::buttons(vec![CtaItem::new("A", "a")]),
                ActionGroup::buttons(vec![CtaItem::new("B", "b"), CtaItem::new("C", "c")]),
            ],
            Usage::default(),
        );
        let values: Vec<_> = response.buttons().map(|b| b.value.as_str()).collect();
        assert_eq!(values, vec!["a", "b", "c"]);
    }
}
