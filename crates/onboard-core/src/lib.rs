//! # onboard-core
//!
//! Shared vocabulary for the onboarding backend:
//!
//! - **Client IDs**: [`ClientId`], the UUID identity a websocket client supplies
//! - **Envelope**: [`Envelope`] with an `action` tag and a polymorphic [`Payload`]
//! - **Validation**: [`validate`] turns raw text frames into typed envelopes
//! - **Errors**: [`ConnectionError`] for registry operations
//! - **Logging**: `tracing` subscriber setup

#![deny(unsafe_code)]

pub mod envelope;
pub mod errors;
pub mod ids;
pub mod logging;
pub mod validation;

pub use envelope::{
    Action, AppEmailCode, AppEmployeeInformation, AppError, AppStats, AppUpdate, Envelope,
    Payload, Token,
};
pub use errors::ConnectionError;
pub use ids::ClientId;
pub use validation::{ValidationFailure, validate};
