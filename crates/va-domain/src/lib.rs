// va-domain library entry point
//
// Tipos de entidad puros (sin dependencia de base de datos). El mapeo a filas
// vive en `va-persistence`.
pub mod camera;
pub mod detection;
pub mod error;
pub mod geometry;
pub mod project;
pub mod unique_object;
pub mod video_job;

pub use camera::{Camera, CameraTimestampRange};
pub use detection::{Detection, DetectionKey};
pub use error::DomainError;
pub use geometry::{BoundingPolygon, Point, BBOX_SRID};
pub use project::{NewProject, Project, DEFAULT_DELETION_STATUS, DEFAULT_PROJECT_STATUS, PROJECT_RETENTION_DAYS};
pub use unique_object::{NewUniqueObjectAttribute, UniqueObject, UniqueObjectAttribute, UniqueObjectKey};
pub use video_job::{NewVideoJob, VideoJob, DEFAULT_VIDEO_JOB_STATUS};
