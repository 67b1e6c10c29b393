//! Inbound action dispatch.
//!
//! Each known `action` maps to an [`ActionHandler`]. Handlers reply to the
//! originating session only; broadcasts go through presence.

pub mod context;
pub mod email;
pub mod employee;
pub mod errors;
pub mod registry;
pub mod stats;
pub mod token;

pub use context::{ActionContext, ServerContext};
pub use errors::ActionError;
pub use registry::{ActionHandler, ActionRegistry};

use onboard_core::Action;

/// Register every built-in action handler.
pub fn register_all(registry: &mut ActionRegistry) {
    registry.register(Action::ServerStats, stats::ServerStatsHandler);
    registry.register(Action::TokenData, token::TokenDataHandler);
    registry.register(Action::EmployeeInfo, employee::EmployeeInfoHandler);
    registry.register(Action::EmailVerification, email::EmailVerificationHandler);
}
