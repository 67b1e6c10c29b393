//! Email verification codes.
//!
//! The code is the last two characters of the employee number followed by
//! the last four hex digits of its MD5 digest, so it can be recomputed
//! at check time instead of being stored.

use std::sync::Arc;

use md5::{Digest, Md5};
use tracing::{info, warn};

use crate::directory::EmployeeDirectory;
use crate::email::{EmailSender, create_email};
use crate::errors::Result;
use crate::model::{Employee, EmployeeState};

/// Verification code for an employee number.
pub fn compute_email_code(internal_id: &str) -> String {
    let digest = format!("{:x}", Md5::digest(internal_id.as_bytes()));

    let chars: Vec<char> = internal_id.chars().collect();
    let prefix: String = chars[chars.len().saturating_sub(2)..].iter().collect();
    format!("{prefix}{}", &digest[digest.len() - 4..])
}

/// Sends and checks verification codes, recording progress in the directory.
#[derive(Clone)]
pub struct EmailVerificationService {
    directory: Arc<dyn EmployeeDirectory>,
    sender: Arc<dyn EmailSender>,
    from_address: String,
}

impl EmailVerificationService {
    /// Create a service sending from `from_address`.
    pub fn new(
        directory: Arc<dyn EmployeeDirectory>,
        sender: Arc<dyn EmailSender>,
        from_address: impl Into<String>,
    ) -> Self {
        Self {
            directory,
            sender,
            from_address: from_address.into(),
        }
    }

    /// The directory progress is recorded in.
    pub fn directory(&self) -> &Arc<dyn EmployeeDirectory> {
        &self.directory
    }

    /// Mail the code to the employee.
    ///
    /// Delivery failure is not an error: it is logged and leaves
    /// `email_code_sent` false.
    pub async fn generate_and_send(&self, employee: &Employee) -> Result<EmployeeState> {
        let code = compute_email_code(&employee.internal_id);
        let message = create_email(&self.from_address, &employee.email, &code);
        let mut state = self.directory.ensure_state(employee)?;

        match self.sender.send(&message).await {
            Ok(()) => {
                info!(internal_id = %employee.internal_id, "verification code sent");
                state.email_code_sent = true;
            }
            Err(e) => {
                warn!(internal_id = %employee.internal_id, error = %e, "verification code not sent");
                state.email_code_sent = false;
            }
        }
        self.directory.update_state(employee, &state)
    }

    /// Check `input` against the employee's code.
    ///
    /// A match marks the state validated. A mismatch leaves the state as is.
    pub fn validate_code(&self, employee: &Employee, input: &str) -> Result<bool> {
        let expected = compute_email_code(&employee.internal_id);
        let mut state = self.directory.ensure_state(employee)?;
        if input.trim() != expected {
            return Ok(false);
        }
        state.email_code_validated = true;
        let _ = self.directory.update_state(employee, &state)?;
        Ok(true)
    }
}
