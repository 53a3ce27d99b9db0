use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Cámara asignada a un proyecto; clave `(project_id, camera_id)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Camera {
    pub project_id: i64,
    pub camera_id: i32,
}

/// Un intervalo de cobertura de una cámara dentro de un proyecto. Una cámara
/// puede tener varios (cobertura no contigua); la clave incluye
/// `timestamp_from`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CameraTimestampRange {
    pub project_id: i64,
    pub camera_id: i32,
    pub timestamp_from: DateTime<Utc>,
    pub timestamp_to: DateTime<Utc>,
}

impl CameraTimestampRange {
    pub fn camera(&self) -> Camera {
        Camera { project_id: self.project_id, camera_id: self.camera_id }
    }

    /// Intervalo cerrado `[timestamp_from, timestamp_to]`.
    pub fn covers(&self, instant: DateTime<Utc>) -> bool {
        self.timestamp_from <= instant && instant <= self.timestamp_to
    }
}
