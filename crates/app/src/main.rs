use anyhow::Context;

use malldir_app::AppConfig;
use malldir_auth::Role;
use malldir_directory::ListFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("invalid configuration")?;
    malldir_observability::init_with(&config.tracing());

    let directory = malldir_app::build_in_memory(&config);
    directory.start().await.context("auth gate failed to start")?;

    match (
        std::env::var("MALLDIR_ADMIN_EMAIL"),
        std::env::var("MALLDIR_ADMIN_PASSWORD"),
    ) {
        (Ok(email), Ok(password)) => {
            let admin = directory
                .gate()
                .sign_up(&email, &password, Role::Admin)
                .await
                .context("failed to create the admin account")?;
            tracing::info!(user = %admin.id, "signed in as admin");
        }
        _ => {
            tracing::warn!(
                "MALLDIR_ADMIN_EMAIL / MALLDIR_ADMIN_PASSWORD not set; seeding anonymously"
            );
        }
    }

    let created = directory.seed_reference_data().await?;
    let floors = directory.floors().list(ListFilter::new()).await?;
    let categories = directory.categories().list(ListFilter::new()).await?;
    tracing::info!(
        created,
        floors = floors.len(),
        categories = categories.len(),
        audit_collection = %directory.logger().collection(),
        "mall directory ready"
    );

    Ok(())
}
