//! Trabajos de procesamiento de video.

use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use log::debug;
use va_domain::{NewVideoJob, VideoJob};

use super::ConnectionProvider;
use crate::error::PersistenceError;
use crate::schema::video_jobs;

#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = video_jobs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct VideoJobRow {
    project_id: i64,
    camera_id: Option<String>,
    job_id: String,
    timestamp_from_og: Option<DateTime<Utc>>,
    timestamp_to_og: Option<DateTime<Utc>>,
    timestamp_from_exact: Option<DateTime<Utc>>,
    timestamp_to_exact: Option<DateTime<Utc>>,
    status: Option<String>,
    objects_found: Option<i32>,
    order_number: Option<i32>,
}

impl From<VideoJobRow> for VideoJob {
    fn from(r: VideoJobRow) -> Self {
        VideoJob { project_id: r.project_id,
                   job_id: r.job_id,
                   camera_id: r.camera_id,
                   timestamp_from_og: r.timestamp_from_og,
                   timestamp_to_og: r.timestamp_to_og,
                   timestamp_from_exact: r.timestamp_from_exact,
                   timestamp_to_exact: r.timestamp_to_exact,
                   status: r.status,
                   objects_found: r.objects_found,
                   order_number: r.order_number }
    }
}

#[derive(Insertable, Debug)]
#[diesel(table_name = video_jobs)]
struct NewVideoJobRow<'a> {
    project_id: i64,
    job_id: &'a str,
    camera_id: Option<&'a str>,
    timestamp_from_og: Option<DateTime<Utc>>,
    timestamp_to_og: Option<DateTime<Utc>>,
    order_number: Option<i32>,
}

/// Cambios de estado que reporta el procesador; los `None` no se tocan.
#[derive(AsChangeset, Debug, Clone, Default, PartialEq)]
#[diesel(table_name = video_jobs)]
pub struct VideoJobUpdate {
    pub status: Option<String>,
    pub objects_found: Option<i32>,
    pub timestamp_from_exact: Option<DateTime<Utc>>,
    pub timestamp_to_exact: Option<DateTime<Utc>>,
}

impl VideoJobUpdate {
    pub fn status(status: impl Into<String>) -> Self {
        Self { status: Some(status.into()), ..Default::default() }
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none()
        && self.objects_found.is_none()
        && self.timestamp_from_exact.is_none()
        && self.timestamp_to_exact.is_none()
    }
}

pub fn create_video_job(conn: &mut PgConnection, new: &NewVideoJob) -> Result<VideoJob, PersistenceError> {
    debug!("video_jobs:create project_id={} job_id={}", new.project_id, new.job_id);
    let row = diesel::insert_into(video_jobs::table).values(NewVideoJobRow { project_id: new.project_id,
                                                                             job_id: &new.job_id,
                                                                             camera_id: new.camera_id.as_deref(),
                                                                             timestamp_from_og: new.timestamp_from_og,
                                                                             timestamp_to_og: new.timestamp_to_og,
                                                                             order_number: new.order_number })
                                                    .returning(VideoJobRow::as_returning())
                                                    .get_result(conn)?;
    Ok(row.into())
}

pub fn get_video_job(conn: &mut PgConnection, project_id: i64, job_id: &str) -> Result<Option<VideoJob>, PersistenceError> {
    let row = video_jobs::table.find((project_id, job_id))
                               .select(VideoJobRow::as_select())
                               .first(conn)
                               .optional()?;
    Ok(row.map(VideoJob::from))
}

/// `NotFound` si el trabajo no existe.
pub fn update_video_job_status(conn: &mut PgConnection,
                               project_id: i64,
                               job_id: &str,
                               changes: &VideoJobUpdate)
                               -> Result<VideoJob, PersistenceError> {
    if changes.is_empty() {
        return get_video_job(conn, project_id, job_id)?.ok_or(PersistenceError::NotFound);
    }
    debug!("video_jobs:update project_id={project_id} job_id={job_id} status={:?}", changes.status);
    let row = diesel::update(video_jobs::table.find((project_id, job_id))).set(changes)
                                                                          .returning(VideoJobRow::as_returning())
                                                                          .get_result(conn)?;
    Ok(row.into())
}

/// Trabajos de un proyecto en orden de ejecución.
pub fn list_video_jobs(conn: &mut PgConnection, project_id: i64) -> Result<Vec<VideoJob>, PersistenceError> {
    let rows = video_jobs::table.filter(video_jobs::project_id.eq(project_id))
                                .order((video_jobs::order_number.asc(), video_jobs::job_id.asc()))
                                .select(VideoJobRow::as_select())
                                .load(conn)?;
    Ok(rows.into_iter().map(VideoJob::from).collect())
}

pub fn delete_video_job(conn: &mut PgConnection, project_id: i64, job_id: &str) -> Result<usize, PersistenceError> {
    Ok(diesel::delete(video_jobs::table.find((project_id, job_id))).execute(conn)?)
}

pub struct PgVideoJobStore<P: ConnectionProvider> {
    pub provider: P,
}

impl<P: ConnectionProvider> PgVideoJobStore<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn create(&self, new: &NewVideoJob) -> Result<VideoJob, PersistenceError> {
        create_video_job(&mut *self.provider.connection()?, new)
    }

    pub fn get(&self, project_id: i64, job_id: &str) -> Result<Option<VideoJob>, PersistenceError> {
        get_video_job(&mut *self.provider.connection()?, project_id, job_id)
    }

    pub fn update_status(&self, project_id: i64, job_id: &str, changes: &VideoJobUpdate) -> Result<VideoJob, PersistenceError> {
        update_video_job_status(&mut *self.provider.connection()?, project_id, job_id, changes)
    }

    pub fn list(&self, project_id: i64) -> Result<Vec<VideoJob>, PersistenceError> {
        list_video_jobs(&mut *self.provider.connection()?, project_id)
    }

    pub fn delete(&self, project_id: i64, job_id: &str) -> Result<usize, PersistenceError> {
        delete_video_job(&mut *self.provider.connection()?, project_id, job_id)
    }
}
