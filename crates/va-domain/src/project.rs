//! Proyecto: raíz de la jerarquía proyecto → cámara → rango de cámara.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PROJECT_STATUS: &str = "in_progress";
pub const DEFAULT_DELETION_STATUS: &str = "-";
/// Días entre `created_at` y el `expiration_time` por defecto.
pub const PROJECT_RETENTION_DAYS: i64 = 5;

/// Fila completa de `project_table`.
///
/// Las columnas con valor por defecto en el servidor son anulables en el
/// layout almacenado, por eso se modelan como `Option`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub project_id: i64,
    pub case_title: Option<String>,
    pub progress: Option<f64>,
    pub objects_found: Option<i32>,
    pub video_jobs_count: Option<i32>,
    pub deletion_status: Option<String>,
    pub status: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub expiration_time: Option<DateTime<Utc>>,
}

impl Project {
    pub fn default_expiration(created_at: DateTime<Utc>) -> DateTime<Utc> {
        created_at + Duration::days(PROJECT_RETENTION_DAYS)
    }

    /// Sólo informa; la política de borrado vive fuera de esta capa.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiration_time.is_some_and(|t| t <= now)
    }
}

/// Datos de alta. Sin `project_id` la secuencia del backend asigna uno.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewProject {
    pub project_id: Option<i64>,
    pub case_title: Option<String>,
}

impl NewProject {
    pub fn with_id(project_id: i64) -> Self {
        Self { project_id: Some(project_id), case_title: None }
    }

    pub fn titled(mut self, case_title: impl Into<String>) -> Self {
        self.case_title = Some(case_title.into());
        self
    }
}
