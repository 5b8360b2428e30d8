//! Chat assistant client core
//!
//! Turns free-form user messages into multi-part assistant replies while
//! tolerating an unreliable, loosely typed backend: payloads are normalized
//! into one canonical reply shape, failures become conversational replies,
//! and a session manager owns identity, history and the busy flag.

pub mod config;
pub mod dispatch;
pub mod failure;
pub mod response;
pub mod session;
pub mod simulate;
pub mod state_machine;
pub mod store;

pub use config::{AssistantConfig, ClientConfig};
pub use dispatch::{Dispatcher, HttpDispatcher, LoggingDispatcher};
pub use failure::{classify, DispatchError, FailureClassification, FailureKind};
pub use response::{normalize, split, ActionGroup, CanonicalResponse, CtaItem, Usage, VideoLink};
pub use session::{Message, SendOutcome, SessionEvent, SessionManager};
pub use simulate::Simulator;
pub use store::{JsonFileStore, KeyValueStore, MemoryStore};
