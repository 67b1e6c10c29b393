//! # onboard-agent
//!
//! Onboarding backend binary. Loads settings, wires the auth and employee
//! collaborators, and starts the HTTP/WebSocket server.

#![deny(unsafe_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use onboard_auth::{ADMIN, InMemoryUserDirectory, JwtIdentityProvider, TokenIssuer, User, WEBSOCKETS};
use onboard_employees::{EmailVerificationService, InMemoryEmployeeDirectory, LogEmailSender};
use onboard_server::actions::ServerContext;
use onboard_server::config::ServerConfig;
use onboard_server::server::OnboardServer;
use onboard_settings::OnboardSettings;
use tracing::{info, warn};

/// Onboarding backend server.
#[derive(Parser, Debug)]
#[command(name = "onboard-agent", about = "Onboarding backend server")]
struct Cli {
    /// Settings file (JSON). Missing file means defaults.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Host to bind (overrides settings).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind, 0 for auto-assign (overrides settings).
    #[arg(long)]
    port: Option<u16>,

    /// Name of the seeded administrator account.
    #[arg(long, default_value = "admin")]
    admin: String,

    /// Extra accounts allowed on the websocket (repeatable).
    #[arg(long = "user")]
    users: Vec<String>,

    /// Print an access token for a seeded account and exit.
    #[arg(long, value_name = "USERNAME")]
    issue_token: Option<String>,
}

fn seed_users(admin: &str, extra: &[String]) -> Result<(InMemoryUserDirectory, Vec<User>)> {
    let directory = InMemoryUserDirectory::new();
    let mut seeded = vec![User {
        username: admin.to_owned(),
        roles: vec![ADMIN.to_owned()],
    }];
    for name in extra {
        let mut user = User::with_default_roles(name.as_str());
        user.roles.push(WEBSOCKETS.to_owned());
        seeded.push(user);
    }
    for user in &seeded {
        directory
            .insert(user.clone())
            .with_context(|| format!("failed to seed user '{}'", user.username))?;
    }
    Ok((directory, seeded))
}

fn token_issuer(settings: &OnboardSettings) -> Result<TokenIssuer> {
    let secret = if settings.auth.secret_key.is_empty() {
        warn!("no secret key configured; using an ephemeral key, issued tokens die with the process");
        uuid::Uuid::new_v4().simple().to_string()
    } else {
        settings.auth.secret_key.clone()
    };
    TokenIssuer::new(
        &secret,
        &settings.auth.algorithm,
        settings.auth.access_token_expire_minutes,
    )
    .context("invalid auth settings")
}

/// Mint a token for a seeded account. Needs a configured secret, since an
/// ephemeral key would not match the one a later server run generates.
fn issue_token(settings: &OnboardSettings, seeded: &[User], username: &str) -> Result<String> {
    if settings.auth.secret_key.is_empty() {
        bail!("--issue-token needs auth.secretKey (or ONBOARD_SECRET_KEY) to be set");
    }
    let Some(user) = seeded.iter().find(|u| u.username == username) else {
        bail!("unknown user '{username}'");
    };
    let issuer = token_issuer(settings)?;
    Ok(issuer.create_access_token(&user.username, &user.roles, None)?)
}

fn employee_directory(seed_file: Option<&str>) -> Result<InMemoryEmployeeDirectory> {
    match seed_file {
        Some(path) => InMemoryEmployeeDirectory::from_json_file(Path::new(path))
            .with_context(|| format!("failed to load employees from {path}")),
        None => {
            info!("no employee seed file configured; directory starts empty");
            Ok(InMemoryEmployeeDirectory::new())
        }
    }
}

fn server_config(settings: &OnboardSettings, cli: &Cli) -> ServerConfig {
    let mut config = ServerConfig::from_settings(&settings.server);
    if let Some(host) = &cli.host {
        config.host.clone_from(host);
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    config
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = onboard_settings::load_settings(cli.settings.as_deref())
        .context("failed to load settings")?;
    if settings.logging.json {
        onboard_core::logging::init_json_subscriber(&settings.logging.level);
    } else {
        onboard_core::logging::init_subscriber(&settings.logging.level);
    }

    let (users, seeded) = seed_users(&cli.admin, &cli.users)?;

    if let Some(username) = &cli.issue_token {
        println!("{}", issue_token(&settings, &seeded, username)?);
        return Ok(());
    }

    let issuer = token_issuer(&settings)?;

    let employees = Arc::new(employee_directory(settings.employees.seed_file.as_deref())?);
    let services = ServerContext::default()
        .with_identity(Arc::new(JwtIdentityProvider::new(issuer, Arc::new(users))))
        .with_verification(EmailVerificationService::new(
            employees,
            Arc::new(LogEmailSender),
            settings.smtp.email_address.clone(),
        ));

    let metrics = onboard_server::metrics::install_recorder();
    let server =
        OnboardServer::new(server_config(&settings, &cli), services).with_metrics(metrics);
    let shutdown = Arc::clone(server.shutdown());

    let (addr, handle) = server.listen().await.context("failed to bind server")?;
    info!(%addr, "onboard-agent ready");

    shutdown.shutdown_on_ctrl_c().await;
    handle.await.context("server task failed")?;
    info!("onboard-agent stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn cli_defaults() {
        let cli = Cli::try_parse_from(["onboard-agent"]).unwrap();
        assert_eq!(cli.admin, "admin");
        assert!(cli.settings.is_none());
        assert!(cli.users.is_empty());
        assert!(cli.issue_token.is_none());
    }

    #[test]
    fn cli_overrides_settings() {
        let cli = Cli::try_parse_from(["onboard-agent", "--host", "127.0.0.1", "--port", "0"])
            .unwrap();
        let config = server_config(&OnboardSettings::default(), &cli);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 0);
        assert_eq!(config.max_connections, 1024);
    }

    #[test]
    fn seeds_admin_and_users() {
        let (dir, seeded) = seed_users("root", &["kim".to_owned()]).unwrap();
        assert_eq!(dir.len(), 2);
        assert_eq!(seeded[0].roles, vec!["admin"]);
        assert!(seeded[1].has_role("websockets"));
        assert!(seeded[1].has_role("user:own"));
    }

    #[test]
    fn duplicate_seed_user_fails() {
        assert!(seed_users("root", &["root".to_owned()]).is_err());
    }

    #[test]
    fn empty_secret_gets_ephemeral_key() {
        let issuer = token_issuer(&OnboardSettings::default()).unwrap();
        let token = issuer
            .create_access_token("root", &["admin".to_owned()], None)
            .unwrap();
        assert_eq!(issuer.decode(&token).unwrap().username, "root");
    }

    #[test]
    fn issue_token_requires_configured_secret() {
        let (_, seeded) = seed_users("root", &[]).unwrap();
        let err = issue_token(&OnboardSettings::default(), &seeded, "root").unwrap_err();
        assert!(err.to_string().contains("secretKey"));
    }

    #[test]
    fn issued_token_verifies_with_configured_secret() {
        let (_, seeded) = seed_users("root", &["kim".to_owned()]).unwrap();
        let mut settings = OnboardSettings::default();
        settings.auth.secret_key = "shared-secret".into();

        let token = issue_token(&settings, &seeded, "kim").unwrap();
        let decoded = token_issuer(&settings).unwrap().decode(&token).unwrap();
        assert_eq!(decoded.username, "kim");
        assert!(issue_token(&settings, &seeded, "nobody").is_err());
    }

    #[test]
    fn employees_from_seed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"internal_id":"7","email":"a@b.c","code_to_print":"X","surname":"S","firstname":"F"}}]"#
        )
        .unwrap();
        let dir = employee_directory(file.path().to_str()).unwrap();
        assert_eq!(dir.len(), 1);
        assert!(employee_directory(Some("/nonexistent/employees.json")).is_err());
        assert!(employee_directory(None).unwrap().is_empty());
    }
}
