use crate::api::{ApiClient, ApiError};
use crate::models::{RegionalStatistic, Volunteer};
use serde::Deserialize;
use tracing::info;

pub const UNKNOWN_REGION: &str = "Unknown";

#[derive(Debug, Deserialize)]
struct VolunteerList {
    #[serde(default, rename = "arrVoluntario")]
    volunteers: Option<Vec<Volunteer>>,
}

#[derive(Debug, Deserialize)]
struct VolunteerEnvelope {
    #[serde(rename = "voluntario")]
    volunteer: Volunteer,
}

#[derive(Debug, Deserialize)]
struct RegionalStatisticList {
    #[serde(default, rename = "estatisticas")]
    statistics: Option<Vec<RegionalStatisticDto>>,
}

#[derive(Debug, Deserialize)]
struct RegionalStatisticDto {
    #[serde(default, rename = "regiao")]
    region: Option<String>,
    #[serde(default, rename = "quantidade")]
    count: u64,
    #[serde(default, rename = "percentualDisponivel")]
    percent_available: f64,
    #[serde(default, rename = "avaliacaoMedia")]
    average_rating: f64,
}

impl From<RegionalStatisticDto> for RegionalStatistic {
    fn from(dto: RegionalStatisticDto) -> Self {
        Self {
            region: normalize_region(dto.region),
            count: dto.count,
            percent_available: dto.percent_available,
            average_rating: dto.average_rating,
        }
    }
}

fn normalize_region(region: Option<String>) -> String {
    match region {
        Some(label) if !label.trim().is_empty() => label,
        _ => UNKNOWN_REGION.to_string(),
    }
}

#[derive(Clone)]
pub struct VolunteerService {
    api: ApiClient,
}

impl VolunteerService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn list_volunteers(&self) -> Result<Vec<Volunteer>, ApiError> {
        let list: VolunteerList = self.api.get_json("/Voluntario").await?;
        let volunteers = list.volunteers.unwrap_or_default();
        info!("loaded {} volunteers", volunteers.len());
        Ok(volunteers)
    }

    pub async fn get_volunteer(&self, user_id: i64) -> Result<Volunteer, ApiError> {
        let envelope: VolunteerEnvelope =
            self.api.get_json(&format!("/Voluntario/{user_id}")).await?;
        Ok(envelope.volunteer)
    }

    pub async fn set_availability(&self, user_id: i64, available: bool) -> Result<(), ApiError> {
        self.api
            .put_json(&format!("/Voluntario/{user_id}/disponibilidade"), &available)
            .await?;
        info!("volunteer {user_id} availability set to {available}");
        Ok(())
    }

    pub async fn regional_statistics(&self) -> Result<Vec<RegionalStatistic>, ApiError> {
        let list: RegionalStatisticList =
            self.api.get_json("/Voluntario/EstatisticasPorRegiao").await?;
        let statistics: Vec<RegionalStatistic> = list
            .statistics
            .unwrap_or_default()
            .into_iter()
            .map(RegionalStatistic::from)
            .collect();
        info!("loaded {} regional statistics", statistics.len());
        Ok(statistics)
    }
}
