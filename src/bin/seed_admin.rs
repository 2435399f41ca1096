use anyhow::Context;

use taskhub::config::Config;
use taskhub::services::IdentityService;
use taskhub::state::AppState;

/// Bootstraps the first admin account. The last-admin guard makes admins
/// undeletable below one, so something has to create admin number one.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;

    tracing::info!("Connecting to database...");
    let state = AppState::new(config)
        .await
        .context("Failed to initialize application state")?;

    let name = std::env::var("SEED_ADMIN_NAME").unwrap_or_else(|_| "Admin".to_string());
    let email = std::env::var("SEED_ADMIN_EMAIL").context("SEED_ADMIN_EMAIL must be set")?;
    let password =
        std::env::var("SEED_ADMIN_PASSWORD").context("SEED_ADMIN_PASSWORD must be set")?;

    let created = IdentityService::seed_admin(state.users.as_ref(), &name, &email, &password)
        .await
        .context("Failed to seed admin account")?;

    if created {
        tracing::info!(email, "admin account created");
    } else {
        tracing::info!(email, "admin account already exists, nothing to do");
    }
    Ok(())
}
