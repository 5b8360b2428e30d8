//! Session id generation and persistence

use crate::store::KeyValueStore;
use uuid::Uuid;

/// Store key holding the current session id
pub const SESSION_ID_KEY: &str = "chat_session_id";

pub fn generate_session_id() -> String {
    format!("session_{}", Uuid::new_v4().simple())
}

/// Reuse the stored session id, creating one if none is stored.
pub fn load_or_create(store: &dyn KeyValueStore) -> String {
    match store.get(SESSION_ID_KEY) {
        Some(id) if !id.trim().is_empty() => id,
        _ => regenerate(store),
    }
}

/// Replace the stored session id with a fresh one.
pub fn regenerate(store: &dyn KeyValueStore) -> String {
    let id = generate_session_id();
    store.set(SESSION_ID_KEY, &id);
    id
}
