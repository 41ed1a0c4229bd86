//! Registry Authz - command-line evaluator
//!
//! Evaluates requested token scopes for a principal and prints the
//! decisions together with the resulting `access` claim.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use registry_authz::{evaluate_session, granted_access, AccessDecision, AccessEntry, PolicyConfig, Principal};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Registry Authz CLI
#[derive(Parser, Debug)]
#[command(name = "registry-authz")]
#[command(about = "Evaluate container-registry token scopes for a principal")]
#[command(version)]
struct Cli {
    /// Login name of the principal
    #[arg(short, long, env = "REGISTRY_AUTHZ_USERNAME", required_unless_present = "principal")]
    username: Option<String>,

    /// Email address of the principal
    #[arg(short, long)]
    email: Option<String>,

    /// Client role (repeatable)
    #[arg(short, long = "role")]
    roles: Vec<String>,

    /// Group membership (repeatable)
    #[arg(short, long = "group")]
    groups: Vec<String>,

    /// JSON document describing the principal
    #[arg(short, long)]
    principal: Option<PathBuf>,

    /// Policy file; the environment is used when absent
    #[arg(short, long, env = "REGISTRY_AUTHZ_CONFIG")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Json)]
    format: Format,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Requested scopes, e.g. `repository:team/app:pull,push`
    #[arg(required = true)]
    scopes: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Json,
    Text,
}

/// JSON report printed by the evaluator
#[derive(Debug, Serialize)]
struct Report<'a> {
    decisions: &'a [AccessDecision],
    access: Vec<AccessEntry>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays machine-readable
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| log_level.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let principal = load_principal(&cli)?;
    let config = load_config(cli.config.as_deref())?;
    debug!("Evaluating with policy {:?}", config);

    let scope_param = cli.scopes.join(" ");
    let decisions = evaluate_session(&principal, Some(scope_param.as_str()), &config);
    info!(
        "Evaluated {} scope(s) for '{}', {} granted",
        decisions.len(),
        principal.username,
        decisions.iter().filter(|d| d.granted).count()
    );

    println!("{}", render(&decisions, cli.format)?);
    Ok(())
}

/// Build the principal from the JSON document and/or the flags
///
/// Flags extend a principal loaded from a document; `--username` and
/// `--email` replace its values.
fn load_principal(cli: &Cli) -> Result<Principal> {
    let mut principal = match &cli.principal {
        Some(path) => read_principal(path)?,
        None => Principal::default(),
    };

    if let Some(username) = &cli.username {
        principal.username = username.clone();
    }
    if let Some(email) = &cli.email {
        principal = principal.with_email(email.as_str());
    }

    Ok(principal.with_roles(&cli.roles).with_groups(&cli.groups))
}

fn read_principal(path: &Path) -> Result<Principal> {
    let principal = Principal::from_file(path)
        .with_context(|| format!("Failed to load principal from {}", path.display()))?;
    debug!("Loaded principal '{}' from {:?}", principal.username, path);
    Ok(principal)
}

fn load_config(path: Option<&Path>) -> Result<PolicyConfig> {
    match path {
        Some(path) => {
            let config = PolicyConfig::from_file(path)
                .with_context(|| format!("Failed to load policy from {}", path.display()))?;
            info!("Loaded policy from {:?}", path);
            Ok(config)
        }
        None => Ok(PolicyConfig::from_env()),
    }
}

fn render(decisions: &[AccessDecision], format: Format) -> Result<String> {
    match format {
        Format::Json => {
            let report = Report {
                decisions,
                access: granted_access(decisions),
            };
            Ok(serde_json::to_string_pretty(&report)?)
        }
        Format::Text => Ok(decisions.iter().map(render_line).collect::<Vec<_>>().join("\n")),
    }
}

fn render_line(decision: &AccessDecision) -> String {
    if decision.granted {
        format!(
            "GRANT {} [{}]: {}",
            decision.raw_scope, decision.effective_actions, decision.reason
        )
    } else {
        format!("DENY  {}: {}", decision.raw_scope, decision.reason)
    }
}
