use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geometry::BoundingPolygon;

/// Clave primaria de `detections_gis`: el instante va primero para que la
/// poda de chunks por tiempo funcione.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DetectionKey {
    pub timestamp: DateTime<Utc>,
    pub object_id: i64,
}

/// Una detección puntual de un objeto en un frame. Las filas sólo se
/// agregan; nunca se actualizan en sitio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub object_id: i64,
    pub timestamp: DateTime<Utc>,
    pub frame_idx: Option<i32>,
    pub bbox: BoundingPolygon,
    pub confidence: Option<f64>,
}

impl Detection {
    pub fn new(object_id: i64, timestamp: DateTime<Utc>, bbox: BoundingPolygon) -> Self {
        Self { object_id, timestamp, frame_idx: None, bbox, confidence: None }
    }

    pub fn with_frame(mut self, frame_idx: i32) -> Self {
        self.frame_idx = Some(frame_idx);
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn key(&self) -> DetectionKey {
        DetectionKey { timestamp: self.timestamp, object_id: self.object_id }
    }
}
