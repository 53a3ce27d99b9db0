use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_VIDEO_JOB_STATUS: &str = "queued";

/// Trabajo de procesamiento de video de un proyecto. `camera_id` es texto a
/// propósito: lo escribe el ingestor tal como le llega.
///
/// Los rangos `*_og` son los solicitados; los `*_exact` los que el video
/// realmente cubre.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoJob {
    pub project_id: i64,
    pub job_id: String,
    pub camera_id: Option<String>,
    pub timestamp_from_og: Option<DateTime<Utc>>,
    pub timestamp_to_og: Option<DateTime<Utc>>,
    pub timestamp_from_exact: Option<DateTime<Utc>>,
    pub timestamp_to_exact: Option<DateTime<Utc>>,
    pub status: Option<String>,
    pub objects_found: Option<i32>,
    pub order_number: Option<i32>,
}

/// Alta de un trabajo; los campos `None` toman el valor por defecto del
/// servidor (`status = 'queued'`, contadores en 0).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewVideoJob {
    pub project_id: i64,
    pub job_id: String,
    pub camera_id: Option<String>,
    pub timestamp_from_og: Option<DateTime<Utc>>,
    pub timestamp_to_og: Option<DateTime<Utc>>,
    pub order_number: Option<i32>,
}

impl NewVideoJob {
    pub fn new(project_id: i64, job_id: impl Into<String>) -> Self {
        Self { project_id, job_id: job_id.into(), ..Default::default() }
    }
}
