//! Objetos únicos: consolidación de detecciones con atributos libres.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UniqueObjectKey {
    pub object_id: i64,
    pub project_id: i32,
}

/// `image_uri` queda vacío hasta que un escaneo posterior elige la mejor
/// imagen del objeto.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UniqueObject {
    pub object_id: i64,
    pub project_id: i32,
    pub camera_id: Option<i32>,
    pub job_id: Option<String>,
    pub class_name: Option<String>,
    pub image_uri: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub start_frame_idx: Option<i32>,
    pub end_frame_idx: Option<i32>,
}

impl UniqueObject {
    pub fn new(object_id: i64, project_id: i32) -> Self {
        Self { object_id, project_id, ..Default::default() }
    }

    pub fn key(&self) -> UniqueObjectKey {
        UniqueObjectKey { object_id: self.object_id, project_id: self.project_id }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniqueObjectAttribute {
    pub attribute_id: i64,
    pub object_id: i64,
    pub project_id: i32,
    pub name: String,
    pub value: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl UniqueObjectAttribute {
    pub fn owner(&self) -> UniqueObjectKey {
        UniqueObjectKey { object_id: self.object_id, project_id: self.project_id }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewUniqueObjectAttribute {
    pub owner: UniqueObjectKey,
    pub name: String,
    pub value: Option<String>,
}

impl NewUniqueObjectAttribute {
    pub fn new(owner: UniqueObjectKey, name: impl Into<String>, value: Option<String>) -> Self {
        Self { owner, name: name.into(), value }
    }
}
