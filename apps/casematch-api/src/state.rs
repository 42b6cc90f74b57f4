use std::sync::Arc;

use casematch_service::CasematchService;
use casematch_storage::db::Db;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<CasematchService>,
}
impl AppState {
	/// Store connection and schema bootstrap failures here are fatal: without
	/// the analytical store the service cannot answer anything.
	pub async fn new(config: casematch_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;

		db.ensure_schema().await?;

		let service = CasematchService::new(config, db);

		Ok(Self { service: Arc::new(service) })
	}

	pub fn with_service(service: CasematchService) -> Self {
		Self { service: Arc::new(service) }
	}
}
