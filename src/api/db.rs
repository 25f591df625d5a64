//! Postgres pool setup and schema bootstrap.

use anyhow::{Context, Result};
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use tracing::{debug, info};

const SCHEMA_SQL: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/sql/schema.sql"));

/// Connect to Postgres.
///
/// # Errors
/// Returns an error if the database is unreachable.
pub async fn connect(dsn: &str) -> Result<PgPool> {
    PgPoolOptions::new()
        .min_connections(1)
        .max_connections(5)
        .max_lifetime(Duration::from_secs(60 * 2))
        .test_before_acquire(true)
        .connect(dsn)
        .await
        .context("Failed to connect to database")
}

/// Create the `users` and `sessions` tables if they are missing.
///
/// # Errors
/// Returns an error if any schema statement fails.
pub async fn apply_schema(pool: &PgPool) -> Result<()> {
    for (index, statement) in split_sql_statements(SCHEMA_SQL).iter().enumerate() {
        debug!("Applying schema statement {}", index + 1);
        sqlx::query(statement)
            .execute(pool)
            .await
            .with_context(|| format!("failed to execute schema statement {}", index + 1))?;
    }
    info!("Database schema is up to date");
    Ok(())
}

/// Split a SQL script into statements on lines ending with `;`, dropping
/// `--` comment lines.
fn split_sql_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();

    for line in sql.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("--") {
            continue;
        }
        current.push_str(line);
        current.push('\n');

        if trimmed.ends_with(';') {
            let statement = current.trim();
            if !statement.is_empty() {
                statements.push(statement.to_string());
            }
            current.clear();
        }
    }

    let leftover = current.trim();
    if !leftover.is_empty() {
        statements.push(leftover.to_string());
    }

    statements
}

/// Pool for Postgres-backed tests; `None` unless `AUTHGATE_TEST_DSN` is set.
#[cfg(test)]
pub(crate) async fn test_pool() -> Result<Option<PgPool>> {
    let Ok(dsn) = std::env::var("AUTHGATE_TEST_DSN") else {
        return Ok(None);
    };
    let pool = connect(&dsn).await?;
    apply_schema(&pool).await?;
    Ok(Some(pool))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_sql_statements_skips_comments() {
        let sql = "-- header\nCREATE TABLE a (\n  id INT\n);\n\n-- note\nCREATE INDEX b ON a (id);\n";
        let statements = split_sql_statements(sql);
        assert_eq!(statements.len(), 2);
        assert!(statements[0].starts_with("CREATE TABLE a"));
        assert_eq!(statements[1], "CREATE INDEX b ON a (id);");
    }

    #[test]
    fn bundled_schema_has_users_and_sessions() {
        let statements = split_sql_statements(SCHEMA_SQL);
        assert_eq!(statements.len(), 3);
        assert!(statements.iter().any(|s| s.contains("CREATE TABLE IF NOT EXISTS users")));
        assert!(statements.iter().any(|s| s.contains("CREATE TABLE IF NOT EXISTS sessions")));
    }

    #[test]
    fn split_sql_statements_keeps_unterminated_tail() {
        let statements = split_sql_statements("SELECT 1;\nSELECT 2");
        assert_eq!(statements, vec!["SELECT 1;".to_string(), "SELECT 2".to_string()]);
    }
}
