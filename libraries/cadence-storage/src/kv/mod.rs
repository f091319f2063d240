//! Key/value records
//!
//! Player state is stored as string values (JSON in practice) under flat
//! string keys such as `player:snapshot` or `progress:<trackId>`.
//!
//! # Example
//!
//! ```rust,no_run
//! use cadence_storage::kv;
//! # async fn example(pool: &sqlx::SqlitePool) -> Result<(), Box<dyn std::error::Error>> {
//! kv::set(pool, "progress:004Z8Ihr0JIu5s", r#"{"t":42.0,"ts":1715000000000}"#).await?;
//!
//! let keys = kv::keys_with_prefix(pool, "progress:").await?;
//! assert_eq!(keys.len(), 1);
//! # Ok(())
//! # }
//! ```

use crate::error::Result;
use chrono::{DateTime, TimeZone, Utc};
use sqlx::{Row, SqlitePool};

/// A stored record
#[derive(Debug, Clone, PartialEq)]
pub struct KvEntry {
    pub key: String,
    pub value: String,
    pub updated_at: DateTime<Utc>,
}

/// Get the value stored under `key`
///
/// # Returns
///
/// Returns `Ok(Some(value))` if the key exists, `Ok(None)` if not found
pub async fn get(pool: &SqlitePool, key: &str) -> Result<Option<String>> {
    let row = sqlx::query("SELECT value FROM kv_store WHERE key = ?")
        .bind(key)
        .fetch_optional(pool)
        .await?;

    row.map(|row| row.try_get::<String, _>("value"))
        .transpose()
        .map_err(Into::into)
}

/// Get the full record stored under `key`
pub async fn get_entry(pool: &SqlitePool, key: &str) -> Result<Option<KvEntry>> {
    let row = sqlx::query("SELECT key, value, updated_at FROM kv_store WHERE key = ?")
        .bind(key)
        .fetch_optional(pool)
        .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let updated_at: i64 = row.try_get("updated_at")?;
    Ok(Some(KvEntry {
        key: row.try_get("key")?,
        value: row.try_get("value")?,
        updated_at: Utc
            .timestamp_millis_opt(updated_at)
            .single()
            .unwrap_or_default(),
    }))
}

/// Insert or replace the value stored under `key`
pub async fn set(pool: &SqlitePool, key: &str, value: &str) -> Result<()> {
    let now = Utc::now().timestamp_millis();

    sqlx::query(
        r"
        INSERT INTO kv_store (key, value, updated_at)
        VALUES (?, ?, ?)
        ON CONFLICT(key) DO UPDATE SET
            value = excluded.value,
            updated_at = excluded.updated_at
        ",
    )
    .bind(key)
    .bind(value)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(())
}

/// Delete `key`
///
/// Returns whether a record was deleted; deleting a missing key is not an error.
pub async fn remove(pool: &SqlitePool, key: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM kv_store WHERE key = ?")
        .bind(key)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// All keys starting with `prefix`, sorted
pub async fn keys_with_prefix(pool: &SqlitePool, prefix: &str) -> Result<Vec<String>> {
    let pattern = format!("{}%", escape_like(prefix));

    let rows = sqlx::query("SELECT key FROM kv_store WHERE key LIKE ? ESCAPE '\\' ORDER BY key")
        .bind(pattern)
        .fetch_all(pool)
        .await?;

    rows.iter()
        .map(|row| row.try_get::<String, _>("key"))
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(Into::into)
}

/// Escape LIKE wildcards so `prefix` matches literally
fn escape_like(prefix: &str) -> String {
    let mut escaped = String::with_capacity(prefix.len());
    for c in prefix.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("progress:"), "progress:");
        assert_eq!(escape_like("a_b%c"), "a\\_b\\%c");
        assert_eq!(escape_like("x\\y"), "x\\\\y");
    }
}
