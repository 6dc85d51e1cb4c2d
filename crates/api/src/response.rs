//! Shared response bodies.
//!
//! List endpoints return bare JSON arrays; mutations answer with a
//! `{ "message": ... }` body, plus the new id when one was created.

use serde::Serialize;

/// `{ "message": "..." }`.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

impl MessageResponse {
    pub fn new(message: &'static str) -> Self {
        Self { message }
    }
}
