//! Settings resolution: compiled defaults, then the JSON file laid over
//! them, then `ONBOARD_*` variables, then validation.

use std::ops::RangeInclusive;
use std::path::Path;
use std::str::FromStr;

use serde_json::Value;
use tracing::debug;

use crate::errors::{Result, SettingsError};
use crate::types::OnboardSettings;

/// Load settings from an optional file, then apply `ONBOARD_*` env overrides.
pub fn load_settings(path: Option<&Path>) -> Result<OnboardSettings> {
    match path {
        Some(p) => load_settings_from_path(p),
        None => {
            let mut settings = OnboardSettings::default();
            apply_env_overrides(&mut settings);
            validate(&settings)?;
            Ok(settings)
        }
    }
}

/// Load settings from a specific path with env var overrides.
///
/// A missing file yields defaults. Invalid JSON is an error.
pub fn load_settings_from_path(path: &Path) -> Result<OnboardSettings> {
    let defaults = serde_json::to_value(OnboardSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: OnboardSettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings);
    validate(&settings)?;
    Ok(settings)
}

/// Overlay `overlay` onto `base`.
///
/// Only objects merge; anything else in the overlay replaces the base value
/// wholesale. A `null` key in the overlay keeps the base value.
pub fn deep_merge(mut base: Value, overlay: Value) -> Value {
    merge_into(&mut base, overlay);
    base
}

fn merge_into(base: &mut Value, overlay: Value) {
    let Value::Object(fields) = overlay else {
        *base = overlay;
        return;
    };
    match base {
        Value::Object(base_fields) => {
            for (key, value) in fields.into_iter().filter(|(_, v)| !v.is_null()) {
                match base_fields.get_mut(&key) {
                    Some(slot) => merge_into(slot, value),
                    None => {
                        let _ = base_fields.insert(key, value);
                    }
                }
            }
        }
        other => *other = Value::Object(fields),
    }
}

fn validate(settings: &OnboardSettings) -> Result<()> {
    if settings.server.send_queue_capacity == 0 {
        return Err(SettingsError::InvalidValue(
            "server.sendQueueCapacity must be at least 1".into(),
        ));
    }
    if !matches!(settings.auth.algorithm.as_str(), "HS256" | "HS384" | "HS512") {
        return Err(SettingsError::InvalidValue(format!(
            "unsupported JWT algorithm '{}'",
            settings.auth.algorithm
        )));
    }
    Ok(())
}

/// Apply process environment overrides to loaded settings.
pub fn apply_env_overrides(settings: &mut OnboardSettings) {
    apply_overrides_from(settings, |name| std::env::var(name).ok());
}

/// Apply overrides read through `lookup`.
///
/// Each variable has strict parsing rules; invalid values are logged and
/// ignored so the file/default value stays in effect.
pub fn apply_overrides_from(
    settings: &mut OnboardSettings,
    lookup: impl Fn(&str) -> Option<String>,
) {
    let env = EnvReader { lookup };

    // ── Server ──────────────────────────────────────────────────────
    if let Some(v) = env.string("ONBOARD_HOST") {
        settings.server.host = v;
    }
    if let Some(v) = env.number::<u16>("ONBOARD_PORT", 0..=65535) {
        settings.server.port = v;
    }
    if let Some(v) = env.number("ONBOARD_MAX_CONNECTIONS", 1..=1_000_000) {
        settings.server.max_connections = v;
    }
    if let Some(v) = env.bool("ONBOARD_REQUIRE_AUTH") {
        settings.server.require_auth = v;
    }
    if let Some(v) = env.number("ONBOARD_PING_INTERVAL_SECS", 1..=3600) {
        settings.server.ping_interval_secs = v;
    }
    if let Some(v) = env.number("ONBOARD_HANDLER_TIMEOUT_SECS", 1..=3600) {
        settings.server.handler_timeout_secs = v;
    }
    if let Some(v) = env.string("ONBOARD_ORIGINS") {
        match serde_json::from_str::<Vec<String>>(&v) {
            Ok(origins) => settings.server.origins = origins,
            Err(_) => {
                tracing::warn!(key = "ONBOARD_ORIGINS", value = %v, "origins must be a JSON array, ignoring");
            }
        }
    }

    // ── Auth ────────────────────────────────────────────────────────
    if let Some(v) = env.string("ONBOARD_SECRET_KEY") {
        settings.auth.secret_key = v;
    }
    if let Some(v) = env.string("ONBOARD_JWT_ALGORITHM") {
        settings.auth.algorithm = v;
    }
    if let Some(v) = env.number("ONBOARD_TOKEN_EXPIRE_MINUTES", 1..=525_600) {
        settings.auth.access_token_expire_minutes = v;
    }

    // ── SMTP ────────────────────────────────────────────────────────
    if let Some(v) = env.string("ONBOARD_SMTP_SERVER_ADDRESS") {
        settings.smtp.server_address = v;
    }
    if let Some(v) = env.number("ONBOARD_SMTP_PORT", 1..=65535) {
        settings.smtp.port = v;
    }
    if let Some(v) = env.string("ONBOARD_SMTP_EMAIL_ADDRESS") {
        settings.smtp.email_address = v;
    }
    if let Some(v) = env.string("ONBOARD_SMTP_PASSWORD") {
        settings.smtp.password = Some(v);
    }
    if let Some(v) = env.bool("ONBOARD_SMTP_SECURE") {
        settings.smtp.secure = v;
    }

    // ── Misc ────────────────────────────────────────────────────────
    if let Some(v) = env.string("ONBOARD_LOG_LEVEL") {
        settings.logging.level = v;
    }
    if let Some(v) = env.string("ONBOARD_EMPLOYEES_FILE") {
        settings.employees.seed_file = Some(v);
    }
}

// ── Value parsing ───────────────────────────────────────────────────

/// Boolean spellings accepted in `ONBOARD_*` flags, any case:
/// `true`, `1`, `yes`, `on` and their opposites.
pub fn parse_bool(val: &str) -> Option<bool> {
    const TRUTHY: [&str; 4] = ["true", "1", "yes", "on"];
    const FALSY: [&str; 4] = ["false", "0", "no", "off"];
    let val = val.trim();
    if TRUTHY.iter().any(|t| t.eq_ignore_ascii_case(val)) {
        Some(true)
    } else if FALSY.iter().any(|f| f.eq_ignore_ascii_case(val)) {
        Some(false)
    } else {
        None
    }
}

/// A number inside `bounds`, or `None`.
pub fn parse_in_range<T>(val: &str, bounds: RangeInclusive<T>) -> Option<T>
where
    T: FromStr + PartialOrd,
{
    val.trim().parse().ok().filter(|n| bounds.contains(n))
}

struct EnvReader<F> {
    lookup: F,
}

impl<F: Fn(&str) -> Option<String>> EnvReader<F> {
    fn string(&self, name: &str) -> Option<String> {
        (self.lookup)(name).filter(|v| !v.is_empty())
    }

    fn bool(&self, name: &str) -> Option<bool> {
        let raw = (self.lookup)(name)?;
        parse_bool(&raw).or_else(|| {
            tracing::warn!(key = name, value = %raw, "not a boolean, ignoring");
            None
        })
    }

    fn number<T>(&self, name: &str, bounds: RangeInclusive<T>) -> Option<T>
    where
        T: FromStr + PartialOrd + std::fmt::Display,
    {
        let raw = (self.lookup)(name)?;
        let (lo, hi) = (bounds.start().to_string(), bounds.end().to_string());
        parse_in_range(&raw, bounds).or_else(|| {
            tracing::warn!(key = name, value = %raw, min = %lo, max = %hi, "number out of range, ignoring");
            None
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn overrides(pairs: &[(&str, &str)]) -> OnboardSettings {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        let mut settings = OnboardSettings::default();
        apply_overrides_from(&mut settings, |name| vars.get(name).cloned());
        settings
    }

    // ── deep_merge ──────────────────────────────────────────────────

    #[test]
    fn merge_nested_override() {
        let target = serde_json::json!({"server": {"port": 8000, "host": "0.0.0.0"}});
        let source = serde_json::json!({"server": {"port": 9090}});
        let merged = deep_merge(target, source);
        assert_eq!(merged["server"]["port"], 9090);
        assert_eq!(merged["server"]["host"], "0.0.0.0");
    }

    #[test]
    fn merge_array_replace() {
        let target = serde_json::json!({"origins": ["a", "b"]});
        let source = serde_json::json!({"origins": ["c"]});
        let merged = deep_merge(target, source);
        assert_eq!(merged["origins"], serde_json::json!(["c"]));
    }

    #[test]
    fn merge_null_preserves_target() {
        let target = serde_json::json!({"a": 1, "b": 2});
        let source = serde_json::json!({"a": null});
        let merged = deep_merge(target, source);
        assert_eq!(merged["a"], 1);
        assert_eq!(merged["b"], 2);
    }

    #[test]
    fn merge_object_replaces_primitive() {
        let target = serde_json::json!({"a": 1});
        let source = serde_json::json!({"a": {"nested": true}});
        assert_eq!(deep_merge(target, source)["a"]["nested"], true);
    }

    #[test]
    fn merge_primitive_replaces_object() {
        let target = serde_json::json!({"a": {"nested": true}});
        let source = serde_json::json!({"a": 42});
        assert_eq!(deep_merge(target, source)["a"], 42);
    }

    // ── load_settings_from_path ─────────────────────────────────────

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load_settings_from_path(&dir.path().join("nope.json")).unwrap();
        assert_eq!(settings.server.port, OnboardSettings::default().server.port);
    }

    #[test]
    fn file_values_merge_over_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"server": {"port": 9100, "origins": ["http://localhost:5173"]}, "auth": {"secretKey": "s3cret"}}"#,
        )
        .unwrap();
        let settings = load_settings_from_path(&path).unwrap();
        assert_eq!(settings.server.port, 9100);
        assert_eq!(settings.server.origins, vec!["http://localhost:5173".to_string()]);
        assert_eq!(settings.auth.secret_key, "s3cret");
        assert_eq!(settings.auth.algorithm, "HS256");
    }

    #[test]
    fn invalid_json_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = load_settings_from_path(&path).unwrap_err();
        assert!(matches!(err, SettingsError::Json(_)));
    }

    #[test]
    fn unsupported_algorithm_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"auth": {"algorithm": "RS256"}}"#).unwrap();
        let err = load_settings_from_path(&path).unwrap_err();
        assert!(matches!(err, SettingsError::InvalidValue(_)));
    }

    #[test]
    fn zero_queue_capacity_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"server": {"sendQueueCapacity": 0}}"#).unwrap();
        assert!(load_settings_from_path(&path).is_err());
    }

    // ── env overrides ───────────────────────────────────────────────

    #[test]
    fn env_overrides_apply() {
        let s = overrides(&[
            ("ONBOARD_HOST", "127.0.0.1"),
            ("ONBOARD_PORT", "9999"),
            ("ONBOARD_REQUIRE_AUTH", "off"),
            ("ONBOARD_SECRET_KEY", "k"),
            ("ONBOARD_TOKEN_EXPIRE_MINUTES", "60"),
            ("ONBOARD_ORIGINS", r#"["http://a", "http://b"]"#),
            ("ONBOARD_SMTP_PASSWORD", "pw"),
            ("ONBOARD_EMPLOYEES_FILE", "/tmp/employees.json"),
            ("ONBOARD_PING_INTERVAL_SECS", "5"),
            ("ONBOARD_HANDLER_TIMEOUT_SECS", "12"),
        ]);
        assert_eq!(s.server.host, "127.0.0.1");
        assert_eq!(s.server.port, 9999);
        assert!(!s.server.require_auth);
        assert_eq!(s.auth.secret_key, "k");
        assert_eq!(s.auth.access_token_expire_minutes, 60);
        assert_eq!(s.server.origins.len(), 2);
        assert_eq!(s.smtp.password.as_deref(), Some("pw"));
        assert_eq!(s.employees.seed_file.as_deref(), Some("/tmp/employees.json"));
        assert_eq!(s.server.ping_interval_secs, 5);
        assert_eq!(s.server.handler_timeout_secs, 12);
    }

    #[test]
    fn invalid_env_values_ignored() {
        let s = overrides(&[
            ("ONBOARD_PORT", "not-a-port"),
            ("ONBOARD_REQUIRE_AUTH", "maybe"),
            ("ONBOARD_TOKEN_EXPIRE_MINUTES", "0"),
            ("ONBOARD_ORIGINS", "http://a"),
            ("ONBOARD_HOST", ""),
            ("ONBOARD_PING_INTERVAL_SECS", "0"),
        ]);
        let d = OnboardSettings::default();
        assert_eq!(s.server.port, d.server.port);
        assert_eq!(s.server.require_auth, d.server.require_auth);
        assert_eq!(s.auth.access_token_expire_minutes, 15);
        assert!(s.server.origins.is_empty());
        assert_eq!(s.server.host, d.server.host);
        assert_eq!(s.server.ping_interval_secs, d.server.ping_interval_secs);
    }

    // ── parsing ─────────────────────────────────────────────────────

    #[test]
    fn parse_bool_variants() {
        for v in ["true", "1", "YES", "On"] {
            assert_eq!(parse_bool(v), Some(true));
        }
        for v in ["false", "0", "no", "OFF"] {
            assert_eq!(parse_bool(v), Some(false));
        }
        assert_eq!(parse_bool("2"), None);
    }

    #[test]
    fn parse_ranges() {
        assert_eq!(parse_in_range::<u16>("80", 1..=65535), Some(80));
        assert_eq!(parse_in_range::<u16>("0", 1..=65535), None);
        assert_eq!(parse_in_range::<u16>("70000", 1..=65535), None);
        assert_eq!(parse_in_range::<u64>("10", 1..=5), None);
        assert_eq!(parse_in_range::<usize>(" 3 ", 1..=5), Some(3));
        assert_eq!(parse_in_range::<usize>("-3", 1..=5), None);
    }
}
