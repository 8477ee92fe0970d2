use crate::services::Backend;
use crate::storage::ReportStore;

#[derive(Clone)]
pub struct AppState {
    pub backend: Backend,
    pub reports: ReportStore,
}

impl AppState {
    pub fn new(backend: Backend, reports: ReportStore) -> Self {
        Self { backend, reports }
    }
}
