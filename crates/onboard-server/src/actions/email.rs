//! `email_verification`: check the code mailed by `employee_info`.

use async_trait::async_trait;
use onboard_auth::WEBSOCKETS;
use onboard_core::{AppEmailCode, AppUpdate, Envelope, Payload};
use onboard_employees::EmployeeDirectory;
use tracing::info;

use super::context::ActionContext;
use super::errors::ActionError;
use super::registry::ActionHandler;

/// Validates a code against the employee bound to the session.
pub struct EmailVerificationHandler;

#[async_trait]
impl ActionHandler for EmailVerificationHandler {
    fn required_scopes(&self) -> &'static [&'static str] {
        &[WEBSOCKETS]
    }

    async fn handle(
        &self,
        data: Option<Payload>,
        ctx: &ActionContext<'_>,
    ) -> Result<Option<Envelope>, ActionError> {
        let Some(Payload::EmailCode(AppEmailCode { email_code })) = data else {
            return Err(ActionError::InvalidData("email_code is required".into()));
        };
        let verification = ctx
            .services
            .verification
            .as_ref()
            .ok_or(ActionError::Unavailable("email verification"))?;
        let employee = ctx.session.employee().ok_or(ActionError::NoEmployee)?;

        let validated = verification.validate_code(&employee, &email_code)?;
        let state = verification.directory().state(&employee)?;
        info!(
            client_id = %ctx.session.id(),
            internal_id = %employee.internal_id,
            validated,
            "email code checked"
        );

        Ok(Some(Envelope::update(AppUpdate {
            email_code_sent: state.email_code_sent,
            email_code_validated: state.email_code_validated,
            ..AppUpdate::default()
        })))
    }
}
