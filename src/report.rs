use crate::api::ApiError;
use crate::models::{EvaluationFilter, EvaluationPage, Location, RegionalStatistic, Volunteer};
use crate::render::render_report;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::str::FromStr;
use tracing::{error, info};

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("invalid report request: {0}")]
    InvalidRequest(String),
    #[error("report generation failed")]
    GenerationFailed(#[source] ApiError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportType {
    Accessibility,
    Volunteers,
    Full,
}

impl ReportType {
    pub fn title(self) -> &'static str {
        match self {
            Self::Accessibility => "Accessibility Report",
            Self::Volunteers => "Volunteers Report",
            Self::Full => "Full System Report",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Accessibility => "accessibility",
            Self::Volunteers => "volunteers",
            Self::Full => "full",
        }
    }
}

impl FromStr for ReportType {
    type Err = ReportError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "accessibility" => Ok(Self::Accessibility),
            "volunteers" => Ok(Self::Volunteers),
            "full" => Ok(Self::Full),
            other => Err(ReportError::InvalidRequest(format!(
                "unknown report type {other:?}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportOptions {
    pub include_accessible_locations: bool,
    pub include_non_accessible_locations: bool,
    pub include_heatmap: bool,
    pub include_regional_stats: bool,
    pub include_ranking: bool,
    pub include_availability_history: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRequest {
    #[serde(rename = "type")]
    pub report_type: ReportType,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub options: ReportOptions,
}

impl ReportRequest {
    pub fn new(report_type: ReportType) -> Self {
        Self {
            report_type,
            start_date: None,
            end_date: None,
            options: ReportOptions::default(),
        }
    }

    /// Drops blank dates and checks the remaining ones form a valid range.
    pub fn normalized(&self) -> Result<Self, ReportError> {
        let start_date = non_blank(&self.start_date);
        let end_date = non_blank(&self.end_date);

        let start = start_date.as_deref().map(parse_date).transpose()?;
        let end = end_date.as_deref().map(parse_date).transpose()?;
        if let (Some(start), Some(end)) = (start, end) {
            if start > end {
                return Err(ReportError::InvalidRequest(format!(
                    "start date {start} is after end date {end}"
                )));
            }
        }

        Ok(Self {
            report_type: self.report_type,
            start_date,
            end_date,
            options: self.options.clone(),
        })
    }

    fn evaluation_filter(&self) -> EvaluationFilter {
        EvaluationFilter {
            start_date: self.start_date.clone(),
            end_date: self.end_date.clone(),
            ..EvaluationFilter::default()
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn parse_date(value: &str) -> Result<NaiveDate, ReportError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|_| ReportError::InvalidRequest(format!("{value:?} is not a YYYY-MM-DD date")))
}

/// The data a report pulls from the backend.
pub trait ReportSource {
    fn locations(&self) -> impl Future<Output = Result<Vec<Location>, ApiError>> + Send;
    fn evaluations(
        &self,
        filter: &EvaluationFilter,
    ) -> impl Future<Output = Result<EvaluationPage, ApiError>> + Send;
    fn volunteers(&self) -> impl Future<Output = Result<Vec<Volunteer>, ApiError>> + Send;
    fn regional_statistics(
        &self,
    ) -> impl Future<Output = Result<Vec<RegionalStatistic>, ApiError>> + Send;
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccessibilityData {
    pub locations: Vec<Location>,
    pub evaluations: EvaluationPage,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VolunteerData {
    pub volunteers: Vec<Volunteer>,
    pub regions: Vec<RegionalStatistic>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReportData {
    Accessibility(AccessibilityData),
    Volunteers(VolunteerData),
    Full {
        accessibility: AccessibilityData,
        volunteers: VolunteerData,
    },
}

impl ReportData {
    pub fn accessibility(&self) -> Option<&AccessibilityData> {
        match self {
            Self::Accessibility(data) | Self::Full { accessibility: data, .. } => Some(data),
            Self::Volunteers(_) => None,
        }
    }

    pub fn volunteers(&self) -> Option<&VolunteerData> {
        match self {
            Self::Volunteers(data) | Self::Full { volunteers: data, .. } => Some(data),
            Self::Accessibility(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedReport {
    pub id: String,
    pub report_type: ReportType,
    pub title: String,
    pub generated_at: DateTime<Utc>,
    pub size_kb: u64,
    pub content: String,
}

pub async fn collect<S: ReportSource>(
    source: &S,
    request: &ReportRequest,
) -> Result<ReportData, ApiError> {
    Ok(match request.report_type {
        ReportType::Accessibility => {
            ReportData::Accessibility(collect_accessibility(source, request).await?)
        }
        ReportType::Volunteers => ReportData::Volunteers(collect_volunteers(source).await?),
        ReportType::Full => ReportData::Full {
            accessibility: collect_accessibility(source, request).await?,
            volunteers: collect_volunteers(source).await?,
        },
    })
}

async fn collect_accessibility<S: ReportSource>(
    source: &S,
    request: &ReportRequest,
) -> Result<AccessibilityData, ApiError> {
    let filter = request.evaluation_filter();
    let (locations, evaluations) =
        tokio::try_join!(source.locations(), source.evaluations(&filter))?;
    Ok(AccessibilityData {
        locations,
        evaluations,
    })
}

async fn collect_volunteers<S: ReportSource>(source: &S) -> Result<VolunteerData, ApiError> {
    let (volunteers, regions) =
        tokio::try_join!(source.volunteers(), source.regional_statistics())?;
    Ok(VolunteerData {
        volunteers,
        regions,
    })
}

pub async fn generate<S: ReportSource>(
    source: &S,
    request: &ReportRequest,
) -> Result<GeneratedReport, ReportError> {
    generate_at(source, request, Utc::now()).await
}

pub async fn generate_at<S: ReportSource>(
    source: &S,
    request: &ReportRequest,
    now: DateTime<Utc>,
) -> Result<GeneratedReport, ReportError> {
    let request = request.normalized()?;
    info!("generating {} report", request.report_type.as_str());

    let data = collect(source, &request).await.map_err(|err| {
        error!("collecting report data failed: {err}");
        ReportError::GenerationFailed(err)
    })?;

    let content = render_report(&request, &data, now);
    let report = GeneratedReport {
        id: format!("rel_{}", now.timestamp_micros()),
        report_type: request.report_type,
        title: request.report_type.title().to_string(),
        generated_at: now,
        size_kb: (content.len() as f64 / 1024.0).round() as u64,
        content,
    };
    info!("generated report {} ({} KB)", report.id, report.size_kb);
    Ok(report)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::{EvaluatedLocation, Evaluation, EvaluationAuthor};
    use chrono::TimeZone;
    use std::sync::Mutex;

    #[derive(Default)]
    pub(crate) struct FakeSource {
        pub locations: Vec<Location>,
        pub evaluations: EvaluationPage,
        pub volunteers: Vec<Volunteer>,
        pub regions: Vec<RegionalStatistic>,
        pub fail_volunteers: bool,
        pub calls: Mutex<Vec<&'static str>>,
        pub last_filter: Mutex<Option<EvaluationFilter>>,
    }

    impl FakeSource {
        fn record(&self, call: &'static str) {
            self.calls.lock().unwrap().push(call);
        }
    }

    impl ReportSource for FakeSource {
        async fn locations(&self) -> Result<Vec<Location>, ApiError> {
            self.record("locations");
            Ok(self.locations.clone())
        }

        async fn evaluations(&self, filter: &EvaluationFilter) -> Result<EvaluationPage, ApiError> {
            self.record("evaluations");
            *self.last_filter.lock().unwrap() = Some(filter.clone());
            Ok(self.evaluations.clone())
        }

        async fn volunteers(&self) -> Result<Vec<Volunteer>, ApiError> {
            self.record("volunteers");
            if self.fail_volunteers {
                return Err(ApiError::Status {
                    status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
                    path: "/Voluntario".into(),
                });
            }
            Ok(self.volunteers.clone())
        }

        async fn regional_statistics(&self) -> Result<Vec<RegionalStatistic>, ApiError> {
            self.record("regions");
            Ok(self.regions.clone())
        }
    }

    pub(crate) fn location(id: i64, rating: f64) -> Location {
        Location {
            id,
            latitude: -23.55 + id as f64 * 0.01,
            longitude: -46.63,
            description: Some(format!("Place {id}")),
            rating,
        }
    }

    pub(crate) fn evaluation(id: i64, accessible: bool) -> Evaluation {
        Evaluation {
            id,
            location_id: 1,
            accessible,
            note: None,
            timestamp: "2026-03-04T10:00:00Z".into(),
            location: EvaluatedLocation {
                id: 1,
                description: Some("Place 1".into()),
                ..EvaluatedLocation::default()
            },
            user: EvaluationAuthor {
                id: 9,
                name: Some("Ana".into()),
                ..EvaluationAuthor::default()
            },
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn accessibility_report_skips_volunteer_sources() {
        let source = FakeSource {
            locations: vec![location(1, 5.0), location(2, 3.0), location(3, 2.0)],
            ..FakeSource::default()
        };
        let report = generate_at(&source, &ReportRequest::new(ReportType::Accessibility), now())
            .await
            .unwrap();

        let calls = source.calls.lock().unwrap().clone();
        assert!(calls.contains(&"locations"));
        assert!(calls.contains(&"evaluations"));
        assert!(!calls.contains(&"volunteers"));
        assert!(!calls.contains(&"regions"));
        assert_eq!(report.title, "Accessibility Report");
        assert_eq!(report.id, format!("rel_{}", now().timestamp_micros()));
        assert_eq!(report.generated_at, now());
    }

    #[tokio::test]
    async fn date_range_reaches_evaluation_filter() {
        let source = FakeSource::default();
        let mut request = ReportRequest::new(ReportType::Full);
        request.start_date = Some("2026-01-01".into());
        request.end_date = Some("  ".into());

        generate_at(&source, &request, now()).await.unwrap();

        let filter = source.last_filter.lock().unwrap().clone().unwrap();
        assert_eq!(filter.start_date.as_deref(), Some("2026-01-01"));
        assert_eq!(filter.end_date, None);
    }

    #[tokio::test]
    async fn failed_fetch_aborts_generation() {
        let source = FakeSource {
            fail_volunteers: true,
            ..FakeSource::default()
        };
        let err = generate_at(&source, &ReportRequest::new(ReportType::Full), now())
            .await
            .unwrap_err();
        assert!(matches!(err, ReportError::GenerationFailed(_)));
        assert_eq!(err.to_string(), "report generation failed");
    }

    #[test]
    fn reversed_date_range_is_rejected() {
        let mut request = ReportRequest::new(ReportType::Accessibility);
        request.start_date = Some("2026-05-01".into());
        request.end_date = Some("2026-04-01".into());
        assert!(matches!(request.normalized(), Err(ReportError::InvalidRequest(_))));

        request.end_date = Some("May 5".into());
        assert!(matches!(request.normalized(), Err(ReportError::InvalidRequest(_))));
    }

    #[test]
    fn request_decodes_with_default_options() {
        let request: ReportRequest =
            serde_json::from_value(serde_json::json!({ "type": "volunteers" })).unwrap();
        assert_eq!(request.report_type, ReportType::Volunteers);
        assert!(!request.options.include_heatmap);
        assert_eq!("full".parse::<ReportType>().unwrap(), ReportType::Full);
        assert!("weekly".parse::<ReportType>().is_err());
    }

    #[tokio::test]
    async fn size_is_rounded_kilobytes() {
        let source = FakeSource {
            locations: (1..=20).map(|id| location(id, 4.0)).collect(),
            evaluations: EvaluationPage {
                evaluations: (1..=15).map(|id| evaluation(id, id % 2 == 0)).collect(),
                total: 15,
                ..EvaluationPage::default()
            },
            ..FakeSource::default()
        };
        let report = generate_at(&source, &ReportRequest::new(ReportType::Accessibility), now())
            .await
            .unwrap();
        let expected = (report.content.len() as f64 / 1024.0).round() as u64;
        assert_eq!(report.size_kb, expected);
        assert!(report.size_kb > 0);
    }
}
