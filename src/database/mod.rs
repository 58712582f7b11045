// 数据库连接、迁移和初始管理员

use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Executor;

use crate::config::Config;
use crate::routes::user::User;

pub async fn connect(config: &Config) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                conn.execute("SET application_name = 'subcult_api';").await?;
                Ok(())
            })
        })
        .connect(&config.database_url)
        .await
}

pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// Creates the configured admin account when the users table is empty.
pub async fn seed_admin(pool: &PgPool, config: &Config) -> Result<(), sqlx::Error> {
    if User::count(pool).await? > 0 {
        return Ok(());
    }

    let Some(password) = config.admin_password.as_deref() else {
        tracing::warn!("No users exist and ADMIN_PASSWORD is unset, skipping admin seed");
        return Ok(());
    };

    let user = User::create_admin(pool, &config.admin_username, &config.admin_email, password).await?;
    tracing::info!(username = %user.username, "Seeded default admin user");
    Ok(())
}
