use std::{path::Path, sync::Arc};

use scout_catalog::InMemoryCatalog;
use scout_service::ScoutService;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<ScoutService>,
}
impl AppState {
	pub fn new(config: scout_config::Config) -> color_eyre::Result<Self> {
		let catalog = InMemoryCatalog::from_json_file(Path::new(&config.catalog.path))?;

		tracing::info!(items = catalog.len(), "Catalog loaded.");

		let service = ScoutService::new(config, Arc::new(catalog));

		Ok(Self { service: Arc::new(service) })
	}

	pub fn with_service(service: ScoutService) -> Self {
		Self { service: Arc::new(service) }
	}
}
