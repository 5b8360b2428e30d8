//! Property-based tests for the state machine
//!
//! These tests verify key invariants hold across all possible inputs.

use super::transition::*;
use super::*;
use crate::failure::{DispatchError, FailureKind};
use crate::response::CanonicalResponse;
use proptest::prelude::*;
use serde_json::{json, Value};

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_state() -> impl Strategy<Value = SessionState> {
    prop_oneof![
        Just(SessionState::Idle),
        "[a-zA-Z ]{1,30}".prop_map(|pending| SessionState::AwaitingReply { pending }),
    ]
}

fn arb_failure_kind() -> impl Strategy<Value = FailureKind> {
    prop_oneof![
        Just(FailureKind::Connectivity),
        Just(FailureKind::RateLimited),
        Just(FailureKind::ServerFault),
        Just(FailureKind::AuthRequired),
        Just(FailureKind::Other),
    ]
}

fn arb_payload() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        "[a-z |]{0,40}".prop_map(Value::String),
        "[a-z |]{0,40}".prop_map(|text| json!({ "response": text })),
        (0i64..100).prop_map(|n| json!(n)),
    ]
}

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        "[a-zA-Z ]{0,20}".prop_map(|text| Event::UserMessage { text }),
        arb_payload().prop_map(|payload| Event::ReplyReceived { payload }),
        arb_failure_kind().prop_map(|kind| Event::DispatchFailed {
            error: DispatchError::new(kind, "failed"),
        }),
        "[a-z|]{1,20}".prop_map(|text| Event::SimulatedReply {
            response: CanonicalResponse::text(text),
        }),
        Just(Event::Reset),
    ]
}

fn appended_replies(result: &TransitionResult) -> usize {
    result
        .effects
        .iter()
        .filter(|e| matches!(e, Effect::AppendAssistantMessage { .. }))
        .count()
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn busy_state_rejects_every_user_message(
        pending in "[a-z]{1,10}",
        text in "[a-zA-Z ]{0,20}",
        simulated in any::<bool>(),
    ) {
        let result = transition(
            &SessionState::AwaitingReply { pending },
            &SessionContext::new(simulated),
            Event::UserMessage { text },
        );
        prop_assert!(matches!(
            result,
            Err(TransitionError::Busy | TransitionError::EmptyMessage)
        ));
    }

    #[test]
    fn assistant_reply_implies_idle(
        state in arb_state(),
        event in arb_event(),
        simulated in any::<bool>(),
    ) {
        if let Ok(result) = transition(&state, &SessionContext::new(simulated), event) {
            let replies = appended_replies(&result);
            prop_assert!(replies <= 1);
            if replies == 1 {
                prop_assert_eq!(&result.new_state, &SessionState::Idle);
                prop_assert_eq!(result.effects.last(), Some(&Effect::notify_idle()));
            }
        }
    }

    #[test]
    fn failures_always_produce_a_reply_or_simulation(
        pending in "[a-z]{1,10}",
        kind in arb_failure_kind(),
        simulated in any::<bool>(),
    ) {
        let result = transition(
            &SessionState::AwaitingReply { pending: pending.clone() },
            &SessionContext::new(simulated),
            Event::DispatchFailed { error: DispatchError::new(kind, "failed") },
        ).unwrap();

        if simulated {
            prop_assert_eq!(result.effects, vec![Effect::Simulate { text: pending }]);
        } else {
            prop_assert_eq!(appended_replies(&result), 1);
        }
    }

    #[test]
    fn appended_replies_have_usable_text(
        payload in arb_payload(),
    ) {
        let result = transition(
            &SessionState::AwaitingReply { pending: "q".to_string() },
            &SessionContext::default(),
            Event::ReplyReceived { payload },
        ).unwrap();

        for effect in &result.effects {
            if let Effect::AppendAssistantMessage { response } = effect {
                prop_assert!(!response.text.trim().is_empty());
            }
        }
    }

    #[test]
    fn reset_always_lands_idle(state in arb_state()) {
        let result = transition(&state, &SessionContext::default(), Event::Reset).unwrap();
        prop_assert_eq!(result.new_state, SessionState::Idle);
    }
}
