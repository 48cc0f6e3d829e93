use std::sync::Arc;

use vigil_service::VigilService;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<VigilService>,
}
impl AppState {
	pub fn new(config: vigil_config::Config) -> color_eyre::Result<Self> {
		let service = VigilService::connect(config)?;

		Ok(Self::from_service(service))
	}

	pub fn from_service(service: VigilService) -> Self {
		Self { service: Arc::new(service) }
	}
}
