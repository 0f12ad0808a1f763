// src/error.rs
// The closed set of error kinds a local-origination request can fail with.
// Admission of externally-received artifacts never produces one of these —
// it silently drops instead (see admission.rs).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("precondition violation: {0}")]
    Precondition(String),
}
