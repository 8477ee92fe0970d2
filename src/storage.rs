use crate::report::{GeneratedReport, ReportType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::{fs, sync::Mutex};
use tracing::{error, info};

pub const MAX_REPORTS: usize = 10;
const PREVIEW_CHARS: usize = 200;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("report store I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("report store encoding failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("report {0} not found")]
    NotFound(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredReport {
    pub id: String,
    pub report_type: ReportType,
    pub title: String,
    pub generated_at: DateTime<Utc>,
    pub size_kb: u64,
    pub preview: String,
    #[serde(default)]
    pub content: Option<String>,
}

impl From<GeneratedReport> for StoredReport {
    fn from(report: GeneratedReport) -> Self {
        Self {
            preview: preview(&report.content),
            id: report.id,
            report_type: report.report_type,
            title: report.title,
            generated_at: report.generated_at,
            size_kb: report.size_kb,
            content: Some(report.content),
        }
    }
}

/// Listing view of a stored report, without its HTML body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSummary {
    pub id: String,
    pub report_type: ReportType,
    pub title: String,
    pub generated_at: DateTime<Utc>,
    pub size_kb: u64,
    pub preview: String,
}

impl From<&StoredReport> for ReportSummary {
    fn from(report: &StoredReport) -> Self {
        Self {
            id: report.id.clone(),
            report_type: report.report_type,
            title: report.title.clone(),
            generated_at: report.generated_at,
            size_kb: report.size_kb,
            preview: report.preview.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportDownload {
    pub file_name: String,
    pub content: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    reports: Vec<StoredReport>,
}

/// Generated reports persisted as one JSON document. Every mutation rewrites
/// the whole file while the lock is held, and memory only changes once the
/// write has succeeded.
#[derive(Clone)]
pub struct ReportStore {
    path: PathBuf,
    reports: Arc<Mutex<Vec<StoredReport>>>,
}

impl ReportStore {
    pub async fn load(path: PathBuf) -> Self {
        let reports = load_reports(&path).await;
        info!("report store loaded {} reports from {}", reports.len(), path.display());
        Self {
            path,
            reports: Arc::new(Mutex::new(reports)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends a report, evicting the oldest entries beyond [`MAX_REPORTS`].
    pub async fn save(&self, report: GeneratedReport) -> Result<ReportSummary, StoreError> {
        let stored = StoredReport::from(report);
        let summary = ReportSummary::from(&stored);

        let mut reports = self.reports.lock().await;
        let mut next = reports.clone();
        next.push(stored);
        let excess = next.len().saturating_sub(MAX_REPORTS);
        let evicted: Vec<String> = next.drain(..excess).map(|r| r.id).collect();

        persist_reports(&self.path, &next).await?;
        if !evicted.is_empty() {
            info!("evicted reports {evicted:?}");
        }
        *reports = next;
        info!("saved report {} ({} stored)", summary.id, reports.len());

        Ok(summary)
    }

    /// Stored reports, most recently generated first.
    pub async fn list(&self) -> Vec<ReportSummary> {
        let reports = self.reports.lock().await;
        let mut summaries: Vec<ReportSummary> = reports.iter().map(ReportSummary::from).collect();
        summaries.sort_by(|a, b| b.generated_at.cmp(&a.generated_at));
        summaries
    }

    pub async fn download(&self, id: &str) -> Result<ReportDownload, StoreError> {
        let reports = self.reports.lock().await;
        let report = reports
            .iter()
            .find(|r| r.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let content = report
            .content
            .clone()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        Ok(ReportDownload {
            file_name: download_name(&report.title, &report.id),
            content,
        })
    }

    /// Removes a report; unknown ids are ignored.
    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let mut reports = self.reports.lock().await;
        if !reports.iter().any(|r| r.id == id) {
            return Ok(());
        }
        let next: Vec<StoredReport> = reports.iter().filter(|r| r.id != id).cloned().collect();
        persist_reports(&self.path, &next).await?;
        *reports = next;
        info!("deleted report {id} ({} stored)", reports.len());
        Ok(())
    }
}

async fn load_reports(path: &Path) -> Vec<StoredReport> {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice::<StoreFile>(&bytes) {
            Ok(file) => file.reports,
            Err(err) => {
                error!("failed to parse report store: {err}");
                Vec::new()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Vec::new(),
        Err(err) => {
            error!("failed to read report store: {err}");
            Vec::new()
        }
    }
}

async fn persist_reports(path: &Path, reports: &[StoredReport]) -> Result<(), StoreError> {
    #[derive(Serialize)]
    struct StoreFileRef<'a> {
        reports: &'a [StoredReport],
    }

    let payload = serde_json::to_vec_pretty(&StoreFileRef { reports })?;
    fs::write(path, payload).await?;
    Ok(())
}

fn preview(content: &str) -> String {
    let mut preview: String = content.chars().take(PREVIEW_CHARS).collect();
    preview.push_str("...");
    preview
}

fn download_name(title: &str, id: &str) -> String {
    let title = title.split_whitespace().collect::<Vec<_>>().join("_");
    format!("{title}_{id}.html")
}
