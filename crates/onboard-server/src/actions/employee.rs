//! `employee_info`: look up the employee being onboarded and mail their
//! verification code.

use async_trait::async_trait;
use onboard_auth::WEBSOCKETS;
use onboard_core::{AppEmployeeInformation, AppUpdate, Envelope, Payload};
use onboard_employees::{EmployeeAttribute, EmployeeDirectory, EmployeeIdentifier};
use tracing::info;

use super::context::ActionContext;
use super::errors::ActionError;
use super::registry::ActionHandler;

/// Resolves an employee by number or email and binds it to the session.
///
/// A hit sends the verification mail and replies with the resulting
/// progress flags. A miss clears any employee previously bound to the
/// session and replies with the matching `*_exists: false` flag.
pub struct EmployeeInfoHandler;

#[async_trait]
impl ActionHandler for EmployeeInfoHandler {
    fn required_scopes(&self) -> &'static [&'static str] {
        &[WEBSOCKETS]
    }

    async fn handle(
        &self,
        data: Option<Payload>,
        ctx: &ActionContext<'_>,
    ) -> Result<Option<Envelope>, ActionError> {
        let Some(Payload::EmployeeInformation(AppEmployeeInformation {
            employee_id,
            employee_email,
        })) = data
        else {
            return Err(ActionError::InvalidData(
                "employee_id or employee_email is required".into(),
            ));
        };
        let identifier =
            EmployeeIdentifier::from_parts(employee_id.as_deref(), employee_email.as_deref())?;
        let verification = ctx
            .services
            .verification
            .as_ref()
            .ok_or(ActionError::Unavailable("employee lookup"))?;

        let employee = match verification
            .directory()
            .get_by_attribute(identifier.attribute(), identifier.value())
        {
            Ok(employee) => employee,
            Err(e) if e.is_not_found() => {
                ctx.session.set_employee(None);
                return Ok(Some(Envelope::update(exists_update(&identifier, false))));
            }
            Err(e) => return Err(e.into()),
        };

        let state = verification.generate_and_send(&employee).await?;
        info!(
            client_id = %ctx.session.id(),
            internal_id = %employee.internal_id,
            email_code_sent = state.email_code_sent,
            "employee bound to session"
        );
        ctx.session.set_employee(Some(employee));

        Ok(Some(Envelope::update(AppUpdate {
            email_code_sent: state.email_code_sent,
            email_code_validated: state.email_code_validated,
            ..exists_update(&identifier, true)
        })))
    }
}

fn exists_update(identifier: &EmployeeIdentifier, exists: bool) -> AppUpdate {
    match identifier.attribute() {
        EmployeeAttribute::Email => AppUpdate {
            email_exists: Some(exists),
            ..AppUpdate::default()
        },
        EmployeeAttribute::InternalId | EmployeeAttribute::Id => AppUpdate {
            employee_id_exists: Some(exists),
            ..AppUpdate::default()
        },
    }
}
