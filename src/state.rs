use std::sync::Arc;

use crate::services::collector_service::CollectorService;
use crate::services::loader_service::LoaderService;

#[derive(Clone)]
pub struct AppState {
    pub collector: Arc<CollectorService>,
    pub loader: Arc<LoaderService>,
}
