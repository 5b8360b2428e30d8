//! Property-based tests for reply normalization and segmentation
//!
//! - Splitting never yields blank segments
//! - Text without a delimiter splits into itself
//! - Normalization is total and always yields usable text

use super::*;
use proptest::prelude::*;
use serde_json::{json, Value};

/// Arbitrary JSON, a few levels deep
fn arb_json() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| json!(n)),
        any::<f64>().prop_map(|n| json!(n)),
        ".{0,40}".prop_map(Value::String),
    ];
    leaf.prop_recursive(3, 32, 6, |inner| {
        prop_oneof![
            proptest::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            proptest::collection::hash_map(
                prop_oneof![
                    Just("response".to_string()),
                    Just("message".to_string()),
                    Just("reply".to_string()),
                    Just("CTAResponse".to_string()),
                    Just("actions".to_string()),
                    Just("usage".to_string()),
                    Just("usages".to_string()),
                    "[a-z]{1,8}",
                ],
                inner,
                0..6,
            )
            .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

proptest! {
    #[test]
    fn split_never_yields_blank_segments(text in ".{0,200}") {
        for segment in split(&text) {
            prop_assert!(!segment.trim().is_empty());
            prop_assert_eq!(segment.trim(), segment.as_str());
        }
    }

    #[test]
    fn split_without_delimiter_is_trimmed_input(text in "[^|]{0,100}") {
        let trimmed = text.trim();
        let expected: Vec<String> = if trimmed.is_empty() {
            vec![]
        } else {
            vec![trimmed.to_string()]
        };
        prop_assert_eq!(split(&text), expected);
    }

    #[test]
    fn split_segment_count_bounded_by_delimiters(text in "[a-z |]{0,100}") {
        let pieces = text.matches(SEGMENT_DELIMITER).count() + 1;
        prop_assert!(split(&text).len() <= pieces);
    }

    #[test]
    fn normalize_is_total(payload in arb_json()) {
        let response = normalize(&payload);
        prop_assert!(!response.text.trim().is_empty());
        prop_assert_eq!(&response.segments, &split(&response.text));
        prop_assert!(response.actions.iter().all(|group| !group.is_empty()));
    }

    #[test]
    fn text_field_priority_holds(text in "[a-zA-Z0-9 ]{0,20}[a-zA-Z0-9]", other in "[a-z]{1,10}") {
        let by_message = normalize(&json!({ "message": text.clone(), "reply": other.clone() }));
        let by_response = normalize(&json!({ "response": text, "reply": other }));
        prop_assert_eq!(by_message, by_response);
    }
}
