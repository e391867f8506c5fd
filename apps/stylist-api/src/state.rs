use std::sync::Arc;

use color_eyre::eyre;
use sqlx::PgPool;

use stylist_config::Config;
use stylist_service::{Context, Orchestrator, Providers, catalog};
use stylist_storage::{db::Db, qdrant::QdrantStore};

#[derive(Clone)]
pub struct AppState {
	pub orchestrator: Arc<Orchestrator>,
}
impl AppState {
	pub fn new(ctx: Arc<Context>) -> Self {
		Self { orchestrator: Arc::new(Orchestrator::new(ctx)) }
	}

	/// Connects the production backends. The returned pool drives the purge loop.
	pub async fn connect(config: Config) -> color_eyre::Result<(Self, PgPool)> {
		let db = Arc::new(Db::connect(&config.storage.postgres).await?);

		db.ensure_schema().await?;

		let qdrant = QdrantStore::new(&config.storage.qdrant)?;

		if !qdrant.collection_exists().await? {
			return Err(eyre::eyre!(
				"Qdrant collection {:?} does not exist.",
				config.storage.qdrant.collection
			));
		}

		let categories = catalog::load_category_map(db.as_ref(), &config).await;
		let pool = db.pool.clone();
		let ctx = Context::new(config, Providers::http()?, Arc::new(qdrant), db, categories);

		Ok((Self::new(Arc::new(ctx)), pool))
	}
}
