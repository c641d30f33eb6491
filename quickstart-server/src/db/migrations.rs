//! Schema bootstrap for the users table

use sqlx::PgPool;

/// Create the users table if it does not exist yet.
///
/// Email uniqueness lives here as a constraint; the application never
/// checks for duplicates before inserting.
pub async fn run(pool: &PgPool) -> Result<(), sqlx::Error> {
    tracing::info!("Running schema migrations...");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id SERIAL PRIMARY KEY,
            name VARCHAR(255) NOT NULL,
            email VARCHAR(255) NOT NULL,
            CONSTRAINT users_email_key UNIQUE (email)
        )
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!("Schema migrations complete");
    Ok(())
}
