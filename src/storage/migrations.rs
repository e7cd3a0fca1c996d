//! # Database Migration Management
//!
//! Schema migrations are embedded in the binary and executed automatically on
//! startup when `auto_migrate` is enabled. Each migration runs at most once;
//! applied versions are recorded in the `schema_migrations` table.

use crate::errors::{Error, Result};
use crate::storage::DbPool;
use tracing::info;

/// Ordered list of embedded migrations as (version, description, sql).
const MIGRATIONS: &[(i64, &str, &str)] = &[(
    1,
    "create accounts table",
    r#"
    CREATE TABLE IF NOT EXISTS accounts (
        id TEXT PRIMARY KEY,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        name TEXT NOT NULL,
        role TEXT NOT NULL,
        approval_state TEXT NOT NULL DEFAULT 'none',
        current_refresh_token TEXT,
        family_id TEXT,
        school_name TEXT,
        grade INTEGER,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    );

    CREATE INDEX IF NOT EXISTS idx_accounts_email ON accounts (email);
    CREATE INDEX IF NOT EXISTS idx_accounts_role_approval
        ON accounts (role, approval_state);
    "#,
)];

/// Run all pending migrations against the given pool.
pub async fn run_migrations(pool: &DbPool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            description TEXT NOT NULL,
            installed_on TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| Error::Database {
        source: e,
        context: "Failed to create schema_migrations table".to_string(),
    })?;

    for (version, description, sql) in MIGRATIONS {
        let applied: Option<i64> =
            sqlx::query_scalar("SELECT version FROM schema_migrations WHERE version = $1")
                .bind(version)
                .fetch_optional(pool)
                .await
                .map_err(|e| Error::Database {
                    source: e,
                    context: format!("Failed to check migration version {}", version),
                })?;

        if applied.is_some() {
            continue;
        }

        sqlx::raw_sql(sql).execute(pool).await.map_err(|e| Error::Database {
            source: e,
            context: format!("Failed to apply migration {} ({})", version, description),
        })?;

        sqlx::query("INSERT INTO schema_migrations (version, description) VALUES ($1, $2)")
            .bind(version)
            .bind(description)
            .execute(pool)
            .await
            .map_err(|e| Error::Database {
                source: e,
                context: format!("Failed to record migration version {}", version),
            })?;

        info!(version, description, "Applied database migration");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::storage::create_pool;

    async fn memory_pool() -> DbPool {
        // A single connection keeps every query on the same in-memory database.
        let config = DatabaseConfig {
            url: "sqlite://:memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
            auto_migrate: false,
            ..Default::default()
        };
        create_pool(&config).await.unwrap()
    }

    #[tokio::test]
    async fn migrations_create_accounts_table() {
        let pool = memory_pool().await;
        run_migrations(&pool).await.unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM accounts")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn migrations_are_idempotent() {
        let pool = memory_pool().await;
        run_migrations(&pool).await.unwrap();
        run_migrations(&pool).await.unwrap();

        let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM schema_migrations")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(applied, MIGRATIONS.len() as i64);
    }

    #[tokio::test]
    async fn email_uniqueness_is_enforced() {
        let pool = memory_pool().await;
        run_migrations(&pool).await.unwrap();

        let insert = "INSERT INTO accounts (id, email, password_hash, name, role) \
                      VALUES ($1, $2, 'hash', 'Name', 'student')";
        sqlx::query(insert).bind("id-1").bind("dup@example.com").execute(&pool).await.unwrap();

        let err =
            sqlx::query(insert).bind("id-2").bind("dup@example.com").execute(&pool).await;
        assert!(err.is_err());
    }
}
