//! # onboard-employees
//!
//! Employee records and the email-verification step of onboarding.
//!
//! - [`model`]: [`Employee`], [`EmployeeState`], lookup keys
//! - [`directory`]: [`EmployeeDirectory`] trait and an in-memory store
//! - [`email`]: [`EmailSender`] trait and message construction
//! - [`verification`]: code derivation and [`EmailVerificationService`]

#![deny(unsafe_code)]

pub mod directory;
pub mod email;
pub mod errors;
pub mod model;
pub mod verification;

pub use directory::{EmployeeDirectory, InMemoryEmployeeDirectory};
pub use email::{EmailError, EmailMessage, EmailSender, LogEmailSender, create_email};
pub use errors::{EmployeeError, Result};
pub use model::{Employee, EmployeeAttribute, EmployeeIdentifier, EmployeeState, NewEmployee};
pub use verification::{EmailVerificationService, compute_email_code};
