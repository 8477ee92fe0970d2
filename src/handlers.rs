use crate::errors::AppError;
use crate::models::{
    AvailabilityRequest, Credentials, EvaluationFilter, EvaluationPage, EvaluationRecord, Location,
    NewEvaluation, RegionalStatistic, UserInfo, Volunteer,
};
use crate::report::{ReportError, ReportOptions, ReportRequest, ReportType, generate};
use crate::state::AppState;
use crate::stats::{DashboardSummary, build_dashboard};
use crate::storage::ReportSummary;
use crate::ui::{render_dashboard, render_login, render_reports};
use axum::{
    Form, Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{info, warn};

#[derive(Debug, Default, Deserialize)]
pub struct GenerateForm {
    pub report_type: String,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub include_accessible_locations: Option<String>,
    #[serde(default)]
    pub include_non_accessible_locations: Option<String>,
    #[serde(default)]
    pub include_heatmap: Option<String>,
    #[serde(default)]
    pub include_regional_stats: Option<String>,
    #[serde(default)]
    pub include_ranking: Option<String>,
    #[serde(default)]
    pub include_availability_history: Option<String>,
}

impl GenerateForm {
    pub fn into_request(self) -> Result<ReportRequest, ReportError> {
        let checked = |value: &Option<String>| value.is_some();
        Ok(ReportRequest {
            report_type: self.report_type.parse::<ReportType>()?,
            options: ReportOptions {
                include_accessible_locations: checked(&self.include_accessible_locations),
                include_non_accessible_locations: checked(&self.include_non_accessible_locations),
                include_heatmap: checked(&self.include_heatmap),
                include_regional_stats: checked(&self.include_regional_stats),
                include_ranking: checked(&self.include_ranking),
                include_availability_history: checked(&self.include_availability_history),
            },
            start_date: self.start_date,
            end_date: self.end_date,
        })
    }
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

// Views

pub async fn index(State(state): State<AppState>) -> Response {
    view(async {
        require_session(&state).await?;
        let summary = dashboard_summary(&state).await?;
        let user = display_name(state.backend.auth.current_user().await);
        Ok::<_, AppError>(Html(render_dashboard(&user, &summary)))
    }
    .await)
}

pub async fn login_page() -> Html<String> {
    Html(render_login(None))
}

pub async fn login(State(state): State<AppState>, Form(form): Form<Credentials>) -> Response {
    match state.backend.auth.login(&form.email, &form.password).await {
        Ok(_) => Redirect::to("/").into_response(),
        Err(err) => {
            let err = AppError::from(err);
            let message = if err.is_unauthorized() {
                "Invalid email or password"
            } else {
                "The accessibility backend is unavailable, try again later"
            };
            (err.status, Html(render_login(Some(message)))).into_response()
        }
    }
}

pub async fn logout(State(state): State<AppState>) -> Redirect {
    state.backend.auth.logout().await;
    Redirect::to("/login")
}

#[derive(Debug, Default, Deserialize)]
pub struct ReportsQuery {
    #[serde(default)]
    pub notice: Option<String>,
}

pub async fn reports_page(
    State(state): State<AppState>,
    Query(query): Query<ReportsQuery>,
) -> Response {
    view(async {
        require_session(&state).await?;
        let reports = state.reports.list().await;
        let flash = query.notice.as_deref().and_then(notice_message);
        Ok::<_, AppError>(Html(render_reports(&reports, flash)))
    }
    .await)
}

/// Only known notices are shown; anything else in the query is ignored.
fn notice_message(notice: &str) -> Option<&'static str> {
    match notice {
        "generated" => Some("Report generated."),
        "deleted" => Some("Report deleted."),
        _ => None,
    }
}

pub async fn generate_report_form(
    State(state): State<AppState>,
    Form(form): Form<GenerateForm>,
) -> Response {
    let result = async {
        require_session(&state).await?;
        let request = form.into_request()?;
        let report = generate(&state.backend, &request).await?;
        state.reports.save(report).await?;
        Ok::<_, AppError>(Redirect::to("/reports?notice=generated"))
    }
    .await;
    view(result)
}

pub async fn delete_report_form(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let result = async {
        require_session(&state).await?;
        state.reports.delete(&id).await?;
        Ok::<_, AppError>(Redirect::to("/reports?notice=deleted"))
    }
    .await;
    view(result)
}

// JSON API

pub async fn api_login(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Result<Json<UserInfo>, AppError> {
    let user = state
        .backend
        .auth
        .login(&credentials.email, &credentials.password)
        .await?;
    Ok(Json(user))
}

pub async fn api_logout(State(state): State<AppState>) -> StatusCode {
    state.backend.auth.logout().await;
    StatusCode::NO_CONTENT
}

pub async fn api_me(State(state): State<AppState>) -> Result<Json<UserInfo>, AppError> {
    require_session(&state).await?;
    Ok(Json(state.backend.auth.me().await?))
}

pub async fn api_dashboard(State(state): State<AppState>) -> Result<Json<DashboardSummary>, AppError> {
    require_session(&state).await?;
    Ok(Json(dashboard_summary(&state).await?))
}

pub async fn api_locations(State(state): State<AppState>) -> Result<Json<Vec<Location>>, AppError> {
    require_session(&state).await?;
    Ok(Json(state.backend.locations.list_locations().await?))
}

pub async fn api_location(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Location>, AppError> {
    require_session(&state).await?;
    Ok(Json(state.backend.locations.get_location(id).await?))
}

pub async fn api_location_evaluations(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<EvaluationRecord>>, AppError> {
    require_session(&state).await?;
    Ok(Json(state.backend.locations.list_evaluations(Some(id)).await?))
}

pub async fn api_evaluations(
    State(state): State<AppState>,
    Query(filter): Query<EvaluationFilter>,
) -> Result<Json<EvaluationPage>, AppError> {
    require_session(&state).await?;
    Ok(Json(
        state
            .backend
            .locations
            .list_complete_evaluations(&filter)
            .await?,
    ))
}

pub async fn api_create_evaluation(
    State(state): State<AppState>,
    Json(new): Json<NewEvaluation>,
) -> Result<(StatusCode, Json<EvaluationRecord>), AppError> {
    require_session(&state).await?;
    let record = state.backend.locations.create_evaluation(&new).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn api_volunteers(State(state): State<AppState>) -> Result<Json<Vec<Volunteer>>, AppError> {
    require_session(&state).await?;
    Ok(Json(state.backend.volunteers.list_volunteers().await?))
}

pub async fn api_volunteer(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Volunteer>, AppError> {
    require_session(&state).await?;
    Ok(Json(state.backend.volunteers.get_volunteer(id).await?))
}

pub async fn api_set_availability(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<AvailabilityRequest>,
) -> Result<StatusCode, AppError> {
    require_session(&state).await?;
    state
        .backend
        .volunteers
        .set_availability(id, payload.available)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn api_regions(
    State(state): State<AppState>,
) -> Result<Json<Vec<RegionalStatistic>>, AppError> {
    require_session(&state).await?;
    Ok(Json(state.backend.volunteers.regional_statistics().await?))
}

pub async fn api_list_reports(
    State(state): State<AppState>,
) -> Result<Json<Vec<ReportSummary>>, AppError> {
    require_session(&state).await?;
    Ok(Json(state.reports.list().await))
}

pub async fn api_generate_report(
    State(state): State<AppState>,
    Json(request): Json<ReportRequest>,
) -> Result<(StatusCode, Json<ReportSummary>), AppError> {
    require_session(&state).await?;
    let report = generate(&state.backend, &request).await?;
    let summary = state.reports.save(report).await?;
    Ok((StatusCode::CREATED, Json(summary)))
}

pub async fn api_download_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    require_session(&state).await?;
    let download = state.reports.download(&id).await?;
    info!("downloading report {id} as {}", download.file_name);
    let disposition = format!("attachment; filename=\"{}\"", download.file_name);
    Ok((
        [
            (header::CONTENT_TYPE, "text/html; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        download.content,
    )
        .into_response())
}

pub async fn api_delete_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    require_session(&state).await?;
    state.reports.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn require_session(state: &AppState) -> Result<(), AppError> {
    if state.backend.auth.is_authenticated().await {
        Ok(())
    } else {
        Err(AppError::unauthorized())
    }
}

async fn dashboard_summary(state: &AppState) -> Result<DashboardSummary, AppError> {
    let backend = &state.backend;
    let (locations, volunteers, regions) = tokio::try_join!(
        backend.locations.list_locations(),
        backend.volunteers.list_volunteers(),
        backend.volunteers.regional_statistics(),
    )?;
    Ok(build_dashboard(&locations, &volunteers, regions))
}

/// HTML views send unauthenticated visitors to the login page.
fn view<T: IntoResponse>(result: Result<T, AppError>) -> Response {
    match result {
        Ok(response) => response.into_response(),
        Err(err) if err.is_unauthorized() => {
            warn!("session missing or expired; redirecting to login");
            Redirect::to("/login").into_response()
        }
        Err(err) => err.into_response(),
    }
}

fn display_name(user: Option<UserInfo>) -> String {
    user.and_then(|u| u.name.or(u.email))
        .unwrap_or_else(|| "administrator".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_checkboxes_become_flags() {
        let form = GenerateForm {
            report_type: "full".into(),
            start_date: Some(String::new()),
            include_heatmap: Some("on".into()),
            ..GenerateForm::default()
        };
        let request = form.into_request().unwrap();
        assert_eq!(request.report_type, ReportType::Full);
        assert!(request.options.include_heatmap);
        assert!(!request.options.include_ranking);
        assert_eq!(request.normalized().unwrap().start_date, None);
    }

    #[test]
    fn only_known_notices_are_flashed() {
        assert_eq!(notice_message("generated"), Some("Report generated."));
        assert_eq!(notice_message("deleted"), Some("Report deleted."));
        assert_eq!(notice_message("<script>"), None);
    }

    #[test]
    fn unknown_form_type_is_rejected() {
        let form = GenerateForm {
            report_type: "weekly".into(),
            ..GenerateForm::default()
        };
        assert!(matches!(form.into_request(), Err(ReportError::InvalidRequest(_))));
    }
}
