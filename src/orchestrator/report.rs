use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

use crate::error::ExportError;
use crate::services::llm::types::{RiskAssessment, RiskBand, SpeechArtifact};

/// Everything the orchestrator holds after a successful risk score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreeningReport {
    pub id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub risk: RiskAssessment,
    pub risk_band: RiskBand,
    pub speech: SpeechArtifact,
    pub cognitive_task_performance: String,
}

impl ScreeningReport {
    pub fn new(risk: RiskAssessment, speech: SpeechArtifact, cognitive_task_performance: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            generated_at: Utc::now(),
            risk_band: risk.band(),
            risk,
            speech,
            cognitive_task_performance,
        }
    }

    pub fn file_name(&self) -> String {
        format!("cogscreen-report-{}.json", self.id)
    }
}

/// Turns a report into a document somewhere. Returns where it went.
pub trait ReportRenderer {
    fn render(&self, report: &ScreeningReport) -> Result<PathBuf, ExportError>;
}

/// Pretty-printed JSON, one file per report.
#[derive(Debug, Clone)]
pub struct JsonReportRenderer {
    dir: PathBuf,
}

impl JsonReportRenderer {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ReportRenderer for JsonReportRenderer {
    fn render(&self, report: &ScreeningReport) -> Result<PathBuf, ExportError> {
        fs::create_dir_all(&self.dir).map_err(io_error(&self.dir))?;
        let path = self.dir.join(report.file_name());
        let json = serde_json::to_string_pretty(report)?;
        fs::write(&path, json).map_err(io_error(&path))?;

        info!(report = %report.id, path = %path.display(), "report written");
        Ok(path)
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> ExportError {
    let path = path.to_path_buf();
    move |source| ExportError::Io { path, source }
}
