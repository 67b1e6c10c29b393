//! OAuth2 scope catalogue.

/// Access to the realtime websocket.
pub const WEBSOCKETS: &str = "websockets";

/// Full access; satisfies every other scope.
pub const ADMIN: &str = "admin";

/// Every scope a token may carry, with its description.
pub const OAUTH_SCOPES: &[(&str, &str)] = &[
    ("user.create", "The ability to create a new user."),
    ("user:own", "Read only access to the current user's information."),
    ("user:own.write", "The ability to change the current user's information."),
    ("user:others", "Read only access to other users' information."),
    ("user:others.write", "The ability to change other users' information."),
    ("employee.create", "The ability to create a new employee."),
    ("employee:own", "Read only access to the current employee's information."),
    (
        "employee:own.write",
        "The ability to change the current employee's information.",
    ),
    ("employee:others", "Read only access to other employees' information."),
    (
        "employee:others.write",
        "The ability to change other employees' information.",
    ),
    (WEBSOCKETS, "Access to the websocket."),
    (ADMIN, "Full access to all information."),
];

/// Roles granted to a freshly registered user.
pub const DEFAULT_USER_ROLES: &[&str] = &["user.create", "user:own", "user:own.write"];

/// Whether `scope` is in the catalogue.
pub fn is_known_scope(scope: &str) -> bool {
    OAUTH_SCOPES.iter().any(|(name, _)| *name == scope)
}

/// Description of a scope.
pub fn describe(scope: &str) -> Option<&'static str> {
    OAUTH_SCOPES
        .iter()
        .find(|(name, _)| *name == scope)
        .map(|(_, desc)| *desc)
}

/// Split a space-separated role string, skipping empty segments.
pub fn parse_roles(roles: &str) -> Vec<String> {
    roles.split_whitespace().map(str::to_owned).collect()
}
