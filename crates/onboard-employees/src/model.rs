//! Employee records and lookup keys.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::EmployeeError;

/// A stored employee.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    /// Directory key.
    pub id: Uuid,
    /// Company-issued employee number.
    pub internal_id: String,
    /// Work email address.
    pub email: String,
    /// Code printed on the employee badge.
    pub code_to_print: String,
    /// Family name.
    pub surname: String,
    /// Given name.
    pub firstname: String,
}

/// Fields supplied when creating or replacing an employee.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEmployee {
    /// Company-issued employee number.
    pub internal_id: String,
    /// Work email address.
    pub email: String,
    /// Code printed on the employee badge.
    pub code_to_print: String,
    /// Family name.
    pub surname: String,
    /// Given name.
    pub firstname: String,
}

impl NewEmployee {
    /// Materialize with a fresh directory key.
    pub fn into_employee(self) -> Employee {
        Employee {
            id: Uuid::new_v4(),
            internal_id: self.internal_id,
            email: self.email,
            code_to_print: self.code_to_print,
            surname: self.surname,
            firstname: self.firstname,
        }
    }
}

/// Onboarding progress, keyed by `internal_id`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeState {
    /// Owning employee.
    pub internal_id: String,
    /// Badge code copied from the employee.
    pub code_to_print: String,
    /// Verification mail was delivered.
    pub email_code_sent: bool,
    /// Employee entered the right code.
    pub email_code_validated: bool,
}

impl EmployeeState {
    /// Initial state for `employee`.
    pub fn for_employee(employee: &Employee) -> Self {
        Self {
            internal_id: employee.internal_id.clone(),
            code_to_print: employee.code_to_print.clone(),
            email_code_sent: false,
            email_code_validated: false,
        }
    }
}

/// Field an employee can be looked up by.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EmployeeAttribute {
    /// Directory UUID.
    Id,
    /// Employee number.
    InternalId,
    /// Email address.
    Email,
}

impl EmployeeAttribute {
    /// Attribute name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::InternalId => "internal_id",
            Self::Email => "email",
        }
    }

    /// Whether `employee` has `value` for this attribute.
    pub fn matches(self, employee: &Employee, value: &str) -> bool {
        match self {
            Self::Id => Uuid::parse_str(value).is_ok_and(|id| id == employee.id),
            Self::InternalId => employee.internal_id == value,
            Self::Email => employee.email.eq_ignore_ascii_case(value),
        }
    }
}

impl std::fmt::Display for EmployeeAttribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exactly one way of naming an employee, as submitted by a client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EmployeeIdentifier {
    /// By employee number.
    InternalId(String),
    /// By email address.
    Email(String),
}

impl EmployeeIdentifier {
    /// Build from the two optional client fields. Exactly one must be set.
    pub fn from_parts(
        employee_id: Option<&str>,
        employee_email: Option<&str>,
    ) -> Result<Self, EmployeeError> {
        let id = employee_id.map(str::trim).filter(|s| !s.is_empty());
        let email = employee_email.map(str::trim).filter(|s| !s.is_empty());
        match (id, email) {
            (Some(id), None) => Ok(Self::InternalId(id.to_owned())),
            (None, Some(email)) if is_plausible_email(email) => Ok(Self::Email(email.to_owned())),
            (None, Some(email)) => Err(EmployeeError::InvalidIdentifier(format!(
                "'{email}' is not a valid email address"
            ))),
            (Some(_), Some(_)) => Err(EmployeeError::InvalidIdentifier(
                "only one of employee_id or employee_email should be provided".into(),
            )),
            (None, None) => Err(EmployeeError::InvalidIdentifier(
                "either employee_id or employee_email must be provided".into(),
            )),
        }
    }

    /// Lookup attribute.
    pub fn attribute(&self) -> EmployeeAttribute {
        match self {
            Self::InternalId(_) => EmployeeAttribute::InternalId,
            Self::Email(_) => EmployeeAttribute::Email,
        }
    }

    /// Lookup value.
    pub fn value(&self) -> &str {
        match self {
            Self::InternalId(v) | Self::Email(v) => v,
        }
    }
}

fn is_plausible_email(s: &str) -> bool {
    let mut parts = s.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty() && !domain.is_empty() && !s.contains(char::is_whitespace)
        }
        _ => false,
    }
}
