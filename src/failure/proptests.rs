//! Property-based tests for failure classification

use super::classify::{
    AUTH_REQUIRED_MESSAGE, CONNECTIVITY_MESSAGE, GENERIC_MESSAGE, RATE_LIMITED_MESSAGE,
    SERVER_FAULT_MESSAGE,
};
use super::*;
use proptest::prelude::*;

const ALL_MESSAGES: [&str; 5] = [
    CONNECTIVITY_MESSAGE,
    RATE_LIMITED_MESSAGE,
    SERVER_FAULT_MESSAGE,
    AUTH_REQUIRED_MESSAGE,
    GENERIC_MESSAGE,
];

proptest! {
    #[test]
    fn every_status_maps_to_a_known_row(status in any::<u16>(), body in ".{0,40}") {
        let classification = classify(&DispatchError::from_status(status, body));
        prop_assert!(ALL_MESSAGES.contains(&classification.user_message));
        prop_assert_eq!(classification.actions.len(), 1);
        prop_assert!(!classification.actions[0].cta.is_empty());
        for item in &classification.actions[0].cta {
            prop_assert!(RecoveryAction::from_token(&item.value).is_some());
        }
    }

    #[test]
    fn server_errors_share_one_row(status in 500u16..600) {
        prop_assert_eq!(
            classify(&DispatchError::from_status(status, "")).user_message,
            SERVER_FAULT_MESSAGE
        );
    }
}
