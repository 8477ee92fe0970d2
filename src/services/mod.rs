mod auth;
mod locations;
mod volunteers;

pub use auth::AuthService;
pub use locations::LocationService;
pub use volunteers::VolunteerService;

use crate::api::{ApiClient, ApiError};
use crate::models::{EvaluationFilter, EvaluationPage, Location, RegionalStatistic, Volunteer};
use crate::report::ReportSource;

/// Every backend-facing service, sharing one client and credential store.
#[derive(Clone)]
pub struct Backend {
    pub auth: AuthService,
    pub locations: LocationService,
    pub volunteers: VolunteerService,
}

impl Backend {
    pub fn new(api: ApiClient) -> Self {
        Self {
            auth: AuthService::new(api.clone()),
            locations: LocationService::new(api.clone()),
            volunteers: VolunteerService::new(api),
        }
    }
}

impl ReportSource for Backend {
    async fn locations(&self) -> Result<Vec<Location>, ApiError> {
        self.locations.list_locations().await
    }

    async fn evaluations(&self, filter: &EvaluationFilter) -> Result<EvaluationPage, ApiError> {
        self.locations.list_complete_evaluations(filter).await
    }

    async fn volunteers(&self) -> Result<Vec<Volunteer>, ApiError> {
        self.volunteers.list_volunteers().await
    }

    async fn regional_statistics(&self) -> Result<Vec<RegionalStatistic>, ApiError> {
        self.volunteers.regional_statistics().await
    }
}
