//! # onboard-settings
//!
//! Configuration for the onboarding backend, loaded in three layers (in
//! priority order):
//! 1. **Compiled defaults**: [`OnboardSettings::default()`]
//! 2. **Settings file**: JSON, deep-merged over defaults
//! 3. **Environment variables**: `ONBOARD_*` overrides (highest priority)
//!
//! Settings are loaded once in the binary and handed down by value; there is
//! no global instance.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{apply_env_overrides, deep_merge, load_settings, load_settings_from_path};
pub use types::*;
