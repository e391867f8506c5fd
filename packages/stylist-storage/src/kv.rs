//! Key/value primitives on Postgres: JSON entries with TTL, bounded lists, and string hashes.
//!
//! Expired rows are invisible to reads as soon as `expires_at` passes; `purge_expired` removes
//! them physically.

use std::collections::HashMap;

use serde_json::Value;
use sqlx::{PgPool, Row};
use time::OffsetDateTime;

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeReport {
	pub entries: u64,
	pub list_items: u64,
	pub lists: u64,
}
impl PurgeReport {
	pub fn total(&self) -> u64 {
		self.entries + self.list_items + self.lists
	}
}

pub async fn get_json(pool: &PgPool, key: &str, now: OffsetDateTime) -> Result<Option<Value>> {
	let row = sqlx::query(
		"\
SELECT value
FROM kv_entries
WHERE entry_key = $1
	AND (expires_at IS NULL OR expires_at > $2)",
	)
	.bind(key)
	.bind(now)
	.fetch_optional(pool)
	.await?;
	let Some(row) = row else {
		return Ok(None);
	};

	Ok(Some(row.try_get("value")?))
}

pub async fn set_json(
	pool: &PgPool,
	key: &str,
	value: &Value,
	now: OffsetDateTime,
	expires_at: Option<OffsetDateTime>,
) -> Result<()> {
	sqlx::query(
		"\
INSERT INTO kv_entries (entry_key, value, created_at, updated_at, expires_at)
VALUES ($1, $2, $3, $3, $4)
ON CONFLICT (entry_key) DO UPDATE SET
	value = EXCLUDED.value,
	updated_at = EXCLUDED.updated_at,
	expires_at = EXCLUDED.expires_at",
	)
	.bind(key)
	.bind(value)
	.bind(now)
	.bind(expires_at)
	.execute(pool)
	.await?;

	Ok(())
}

/// Returns the live items of a list, oldest first.
pub async fn list_range(pool: &PgPool, key: &str, now: OffsetDateTime) -> Result<Vec<Value>> {
	let rows = sqlx::query(
		"\
SELECT l.item
FROM kv_lists l
WHERE l.list_key = $1
	AND NOT EXISTS (
		SELECT 1
		FROM kv_list_expiry e
		WHERE e.list_key = l.list_key
			AND e.expires_at <= $2
	)
ORDER BY l.position ASC",
	)
	.bind(key)
	.bind(now)
	.fetch_all(pool)
	.await?;

	rows.into_iter().map(|row| row.try_get("item").map_err(Error::from)).collect()
}

/// Appends `items`, keeps only the newest `max_len`, and resets the list expiry, all in one
/// transaction. Returns the stored length.
pub async fn list_push_trim_expire(
	pool: &PgPool,
	key: &str,
	items: &[Value],
	max_len: u32,
	now: OffsetDateTime,
	expires_at: OffsetDateTime,
) -> Result<u64> {
	if max_len == 0 {
		return Err(Error::InvalidArgument("List length cap must be greater than zero.".to_string()));
	}

	let mut tx = pool.begin().await?;

	// Serializes concurrent appends to the same list.
	sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))").bind(key).execute(&mut *tx).await?;
	sqlx::query(
		"\
DELETE FROM kv_lists
WHERE list_key = $1
	AND EXISTS (
		SELECT 1
		FROM kv_list_expiry
		WHERE list_key = $1
			AND expires_at <= $2
	)",
	)
	.bind(key)
	.bind(now)
	.execute(&mut *tx)
	.await?;

	let last: i64 =
		sqlx::query_scalar("SELECT COALESCE(MAX(position), 0) FROM kv_lists WHERE list_key = $1")
			.bind(key)
			.fetch_one(&mut *tx)
			.await?;

	for (offset, item) in items.iter().enumerate() {
		sqlx::query(
			"\
INSERT INTO kv_lists (list_key, position, item, created_at)
VALUES ($1, $2, $3, $4)",
		)
		.bind(key)
		.bind(last + offset as i64 + 1)
		.bind(item)
		.bind(now)
		.execute(&mut *tx)
		.await?;
	}

	sqlx::query(
		"\
DELETE FROM kv_lists
WHERE list_key = $1
	AND position <= (SELECT MAX(position) FROM kv_lists WHERE list_key = $1) - $2",
	)
	.bind(key)
	.bind(i64::from(max_len))
	.execute(&mut *tx)
	.await?;
	sqlx::query(
		"\
INSERT INTO kv_list_expiry (list_key, expires_at)
VALUES ($1, $2)
ON CONFLICT (list_key) DO UPDATE SET expires_at = EXCLUDED.expires_at",
	)
	.bind(key)
	.bind(expires_at)
	.execute(&mut *tx)
	.await?;

	let len: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM kv_lists WHERE list_key = $1")
		.bind(key)
		.fetch_one(&mut *tx)
		.await?;

	tx.commit().await?;

	Ok(len as u64)
}

pub async fn hash_get_all(pool: &PgPool, key: &str) -> Result<HashMap<String, String>> {
	let rows = sqlx::query("SELECT field, value FROM kv_hashes WHERE hash_key = $1")
		.bind(key)
		.fetch_all(pool)
		.await?;
	let mut out = HashMap::with_capacity(rows.len());

	for row in rows {
		out.insert(row.try_get("field")?, row.try_get("value")?);
	}

	Ok(out)
}

pub async fn hash_set_all(pool: &PgPool, key: &str, fields: &[(String, String)]) -> Result<()> {
	let mut tx = pool.begin().await?;

	for (field, value) in fields {
		sqlx::query(
			"\
INSERT INTO kv_hashes (hash_key, field, value, updated_at)
VALUES ($1, $2, $3, now())
ON CONFLICT (hash_key, field) DO UPDATE SET
	value = EXCLUDED.value,
	updated_at = EXCLUDED.updated_at",
		)
		.bind(key)
		.bind(field)
		.bind(value)
		.execute(&mut *tx)
		.await?;
	}

	tx.commit().await?;

	Ok(())
}

pub async fn purge_expired(pool: &PgPool, now: OffsetDateTime) -> Result<PurgeReport> {
	let mut tx = pool.begin().await?;
	let entries = sqlx::query("DELETE FROM kv_entries WHERE expires_at IS NOT NULL AND expires_at <= $1")
		.bind(now)
		.execute(&mut *tx)
		.await?
		.rows_affected();
	let list_items = sqlx::query(
		"\
DELETE FROM kv_lists l
USING kv_list_expiry e
WHERE e.list_key = l.list_key
	AND e.expires_at <= $1",
	)
	.bind(now)
	.execute(&mut *tx)
	.await?
	.rows_affected();
	let lists = sqlx::query("DELETE FROM kv_list_expiry WHERE expires_at <= $1")
		.bind(now)
		.execute(&mut *tx)
		.await?
		.rows_affected();

	tx.commit().await?;

	Ok(PurgeReport { entries, list_items, lists })
}
