use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;

use epicevents_auth::{
    AuthConfig, AuthService, FileSessionStore, InMemoryUserDirectory, NewUser, Role,
};
use epicevents_core::DomainError;
use epicevents_crm::{CrmService, NewClient};

fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    epicevents_observability::init();

    let config = AuthConfig::from_env();
    let users = Arc::new(InMemoryUserDirectory::new());
    let auth = AuthService::new(
        Arc::clone(&users),
        FileSessionStore::new(&config.token_file),
        &config,
    );
    let crm = CrmService::new(users);

    let registration = NewUser {
        employee_number: "EMP001".to_string(),
        full_name: "Jean Dupont".to_string(),
        email: "jean@epic.com".to_string(),
        password: "password123".to_string(),
        role: Role::Sales,
    };
    match auth.register(registration, Utc::now()) {
        Ok(user) => tracing::info!(user_id = %user.id, "demo user created"),
        Err(e) if matches!(DomainError::from(e.clone()), DomainError::Conflict(_)) => {
            tracing::info!(reason = %e, "demo user already exists")
        }
        Err(e) => return Err(e).context("registering demo user"),
    }

    let (user, _token) = auth
        .login("jean@epic.com", "password123", Utc::now())
        .context("logging in")?;
    tracing::info!(user = %user.full_name, "logged in");

    let current = auth
        .resolve_current(Utc::now())
        .context("resolving persisted session")?;
    tracing::info!(user = %current.full_name, token_file = %config.token_file.display(), "session active");

    let client = crm
        .create_client(
            &current.principal(),
            NewClient {
                full_name: "Kevin Casey".to_string(),
                email: "kevin@startup.io".to_string(),
                phone: Some("+678 123 456 78".to_string()),
                company_name: Some("Cool Startup LLC".to_string()),
            },
            Utc::now(),
        )
        .context("creating demo client")?;
    tracing::info!(client_id = %client.id, company = ?client.company_name, "demo client created");

    auth.logout().context("logging out")?;
    tracing::info!("demo finished");
    Ok(())
}
