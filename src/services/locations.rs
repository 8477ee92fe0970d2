use crate::api::{ApiClient, ApiError};
use crate::models::{EvaluationFilter, EvaluationPage, EvaluationRecord, Location, NewEvaluation};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Deserialize)]
struct LocationList {
    #[serde(default, rename = "arrLocal")]
    locations: Option<Vec<Location>>,
}

#[derive(Debug, Deserialize)]
struct LocationEnvelope {
    #[serde(rename = "local")]
    location: Location,
}

#[derive(Debug, Deserialize)]
struct EvaluationList {
    #[serde(default, rename = "arrAvaliacaoLocal")]
    evaluations: Option<Vec<EvaluationRecord>>,
}

#[derive(Debug, Deserialize)]
struct EvaluationEnvelope {
    #[serde(rename = "avaliacaoLocal")]
    evaluation: EvaluationRecord,
}

#[derive(Debug, Serialize)]
struct LocationQuery {
    #[serde(rename = "IdLocal", skip_serializing_if = "Option::is_none")]
    id: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InsertEvaluation<'a> {
    id_local: i64,
    #[serde(rename = "acessivel")]
    accessible: bool,
    #[serde(rename = "observacao", skip_serializing_if = "Option::is_none")]
    note: Option<&'a str>,
    timestamp: i64,
}

#[derive(Clone)]
pub struct LocationService {
    api: ApiClient,
}

impl LocationService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn list_locations(&self) -> Result<Vec<Location>, ApiError> {
        let list: LocationList = self.api.get_json("/Local/ListarLocal").await?;
        let locations = list.locations.unwrap_or_default();
        info!("loaded {} locations", locations.len());
        Ok(locations)
    }

    pub async fn get_location(&self, id: i64) -> Result<Location, ApiError> {
        let envelope: LocationEnvelope = self
            .api
            .get_json_with_query("/Local/ObterLocal", &LocationQuery { id: Some(id) })
            .await?;
        Ok(envelope.location)
    }

    pub async fn list_evaluations(
        &self,
        location_id: Option<i64>,
    ) -> Result<Vec<EvaluationRecord>, ApiError> {
        let list: EvaluationList = self
            .api
            .get_json_with_query(
                "/AvaliacaoLocal/ListarAvaliacaoLocal",
                &LocationQuery { id: location_id },
            )
            .await?;
        let evaluations = list.evaluations.unwrap_or_default();
        info!("loaded {} evaluations", evaluations.len());
        Ok(evaluations)
    }

    pub async fn list_complete_evaluations(
        &self,
        filter: &EvaluationFilter,
    ) -> Result<EvaluationPage, ApiError> {
        let page: EvaluationPage = self
            .api
            .get_json_with_query("/AvaliacaoLocal/ListarAvaliacoesCompletas", filter)
            .await?;
        info!(
            "loaded evaluation page {} ({} rows, {} total)",
            page.page,
            page.evaluations.len(),
            page.total
        );
        Ok(page)
    }

    pub async fn create_evaluation(&self, new: &NewEvaluation) -> Result<EvaluationRecord, ApiError> {
        let body = InsertEvaluation {
            id_local: new.location_id,
            accessible: new.accessible,
            note: new.note.as_deref(),
            timestamp: Utc::now().timestamp(),
        };
        let envelope: EvaluationEnvelope = self
            .api
            .post_json("/AvaliacaoLocal/InserirAvaliacaoLocal", &body)
            .await?;
        info!("created evaluation {}", envelope.evaluation.id);
        Ok(envelope.evaluation)
    }
}
