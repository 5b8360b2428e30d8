//! Dispatch failures and their conversational classification

pub mod classify;
mod error;

#[cfg(test)]
mod proptests;

pub use classify::{classify, classify_kind, FailureClassification, RecoveryAction};
pub use error::{DispatchError, FailureKind};
