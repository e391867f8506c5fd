use std::time::Duration;

use sqlx::PgPool;
use time::OffsetDateTime;

use stylist_storage::kv;

/// Deletes expired store rows forever, one pass per `every`.
pub async fn run_purge_loop(pool: PgPool, every: Duration) {
	loop {
		tokio::time::sleep(every).await;

		match kv::purge_expired(&pool, OffsetDateTime::now_utc()).await {
			Ok(report) if report.total() > 0 => tracing::info!(
				entries = report.entries,
				list_items = report.list_items,
				lists = report.lists,
				"Expired store rows purged."
			),
			Ok(_) => {},
			Err(err) => tracing::error!(error = %err, "Store purge failed."),
		}
	}
}
