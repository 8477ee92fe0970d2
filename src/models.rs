use serde::{Deserialize, Serialize};

/// Ratings at or above this are accessible.
pub const ACCESSIBLE_THRESHOLD: f64 = 4.0;
/// Ratings at or above this (and below [`ACCESSIBLE_THRESHOLD`]) are partially accessible.
pub const PARTIAL_THRESHOLD: f64 = 3.0;

// Backend payloads use Portuguese camelCase keys; aliases accept them while
// everything this service emits uses the field names.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(alias = "idLocal")]
    pub id: i64,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, alias = "descricao")]
    pub description: Option<String>,
    #[serde(alias = "avaliacaoAcessibilidade")]
    pub rating: f64,
}

impl Location {
    pub fn label(&self) -> String {
        match self.description.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => text.to_string(),
            _ => format!("Location {}", self.id),
        }
    }

    pub fn accessibility(&self) -> AccessibilityLevel {
        AccessibilityLevel::from_rating(self.rating)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessibilityLevel {
    Accessible,
    Partial,
    NotAccessible,
}

impl AccessibilityLevel {
    pub fn from_rating(rating: f64) -> Self {
        if rating >= ACCESSIBLE_THRESHOLD {
            Self::Accessible
        } else if rating >= PARTIAL_THRESHOLD {
            Self::Partial
        } else {
            Self::NotAccessible
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Self::Accessible => "#10B981",
            Self::Partial => "#F59E0B",
            Self::NotAccessible => "#EF4444",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Accessible => "Accessible",
            Self::Partial => "Partially accessible",
            Self::NotAccessible => "Not accessible",
        }
    }

    pub fn badge_class(self) -> &'static str {
        match self {
            Self::Accessible => "badge-green",
            Self::Partial => "badge-yellow",
            Self::NotAccessible => "badge-red",
        }
    }
}

/// A single evaluation as returned by the per-location listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    #[serde(alias = "idAvaliacaoLocal")]
    pub id: i64,
    #[serde(alias = "idLocal")]
    pub location_id: i64,
    #[serde(alias = "acessivel")]
    pub accessible: bool,
    #[serde(default, alias = "observacao")]
    pub note: Option<String>,
    /// Unix seconds.
    #[serde(default)]
    pub timestamp: i64,
}

/// An evaluation joined with its location and author.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub id: i64,
    #[serde(alias = "localId")]
    pub location_id: i64,
    #[serde(default, alias = "acessivel")]
    pub accessible: bool,
    #[serde(default, alias = "observacoes")]
    pub note: Option<String>,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default, alias = "local")]
    pub location: EvaluatedLocation,
    #[serde(default, alias = "usuario")]
    pub user: EvaluationAuthor,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluatedLocation {
    #[serde(default, alias = "idLocal")]
    pub id: i64,
    #[serde(default, alias = "descricao")]
    pub description: Option<String>,
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
    #[serde(default, alias = "avaliacaoAcessibilidade")]
    pub rating: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationAuthor {
    #[serde(default, alias = "idUsuario")]
    pub id: i64,
    #[serde(default, alias = "nome")]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, alias = "telefone")]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationPage {
    #[serde(default, alias = "avaliacoesCompletas")]
    pub evaluations: Vec<Evaluation>,
    #[serde(default)]
    pub total: u64,
    #[serde(default, alias = "paginaAtual")]
    pub page: u32,
    #[serde(default, alias = "tamanhoPagina")]
    pub page_size: u32,
    #[serde(default, alias = "temProximaPagina")]
    pub has_next_page: bool,
}

impl EvaluationPage {
    /// The backend total, or the number of rows actually returned when the total is missing.
    pub fn count(&self) -> u64 {
        self.total.max(self.evaluations.len() as u64)
    }
}

/// Query filter for the joined evaluation listing. Deserializes from this
/// service's query strings and serializes to the backend's parameter names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationFilter {
    #[serde(rename(serialize = "pagina"), skip_serializing_if = "Option::is_none", default)]
    pub page: Option<u32>,
    #[serde(rename(serialize = "tamanhoPagina"), skip_serializing_if = "Option::is_none", default)]
    pub page_size: Option<u32>,
    #[serde(rename(serialize = "localId"), skip_serializing_if = "Option::is_none", default)]
    pub location_id: Option<i64>,
    #[serde(rename(serialize = "usuarioId"), skip_serializing_if = "Option::is_none", default)]
    pub user_id: Option<i64>,
    #[serde(rename(serialize = "acessivel"), skip_serializing_if = "Option::is_none", default)]
    pub accessible: Option<bool>,
    #[serde(rename(serialize = "dataInicio"), skip_serializing_if = "Option::is_none", default)]
    pub start_date: Option<String>,
    #[serde(rename(serialize = "dataFim"), skip_serializing_if = "Option::is_none", default)]
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEvaluation {
    pub location_id: i64,
    pub accessible: bool,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Volunteer {
    #[serde(alias = "idUsuario")]
    pub id: i64,
    #[serde(alias = "disponivel")]
    pub available: bool,
    #[serde(alias = "avaliacao")]
    pub rating: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionalStatistic {
    pub region: String,
    pub count: u64,
    pub percent_available: f64,
    pub average_rating: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: i64,
    #[serde(default, alias = "nome")]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, alias = "telefone")]
    pub phone: Option<String>,
    #[serde(default, alias = "tipoUsuario")]
    pub user_type: Option<String>,
    #[serde(default, alias = "voluntario")]
    pub volunteer: Option<VolunteerProfile>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolunteerProfile {
    #[serde(alias = "disponivel")]
    pub available: bool,
    #[serde(alias = "avaliacao")]
    pub rating: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityRequest {
    pub available: bool,
}
