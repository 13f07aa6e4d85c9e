//! Request and response bodies
//!
//! JSON field names are camelCase. Money values serialize as decimal
//! strings with two places.

pub mod billing;
pub mod lab;
pub mod patient;
pub mod pharmacy;

use serde::Serialize;

/// Success envelope: a `message` next to the flattened payload
#[derive(Debug, Serialize)]
pub struct MessageResponse<T> {
    pub message: String,
    #[serde(flatten)]
    pub body: T,
}

impl<T> MessageResponse<T> {
    pub fn new(message: impl Into<String>, body: T) -> Self {
        Self {
            message: message.into(),
            body,
        }
    }
}
