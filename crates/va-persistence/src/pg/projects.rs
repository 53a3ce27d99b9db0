//! Proyectos, cámaras y rangos de cobertura de cámara.
//!
//! Borrar un proyecto elimina sus cámaras y los rangos de éstas por las FK
//! `ON DELETE CASCADE`; aquí nunca se leen los hijos antes de borrar.

use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use log::debug;
use va_domain::{Camera, CameraTimestampRange, NewProject, Project};

use super::ConnectionProvider;
use crate::error::PersistenceError;
use crate::schema::{project_camera, project_camera_timestamps, project_table};

#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = project_table)]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct ProjectRow {
    project_id: i64,
    case_title: Option<String>,
    progress: Option<f64>,
    objects_found: Option<i32>,
    video_jobs_count: Option<i32>,
    deletion_status: Option<String>,
    status: Option<String>,
    created_at: Option<DateTime<Utc>>,
    expiration_time: Option<DateTime<Utc>>,
}

impl From<ProjectRow> for Project {
    fn from(r: ProjectRow) -> Self {
        Project { project_id: r.project_id,
                  case_title: r.case_title,
                  progress: r.progress,
                  objects_found: r.objects_found,
                  video_jobs_count: r.video_jobs_count,
                  deletion_status: r.deletion_status,
                  status: r.status,
                  created_at: r.created_at,
                  expiration_time: r.expiration_time }
    }
}

/// Los `None` se insertan como DEFAULT: la secuencia asigna el id y el
/// servidor completa progreso, estado y fechas.
#[derive(Insertable, Debug)]
#[diesel(table_name = project_table)]
struct NewProjectRow<'a> {
    project_id: Option<i64>,
    case_title: Option<&'a str>,
}

/// Actualización parcial de avance; los campos `None` no se tocan.
#[derive(AsChangeset, Debug, Clone, Default, PartialEq)]
#[diesel(table_name = project_table)]
pub struct ProjectProgress {
    pub progress: Option<f64>,
    pub objects_found: Option<i32>,
    pub video_jobs_count: Option<i32>,
    pub status: Option<String>,
}

impl ProjectProgress {
    pub fn is_empty(&self) -> bool {
        self.progress.is_none() && self.objects_found.is_none() && self.video_jobs_count.is_none() && self.status.is_none()
    }
}

#[derive(Queryable, Selectable, Insertable, Debug)]
#[diesel(table_name = project_camera)]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct CameraRow {
    project_id: i64,
    camera_id: i32,
}

#[derive(Queryable, Selectable, Insertable, Debug)]
#[diesel(table_name = project_camera_timestamps)]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct CameraRangeRow {
    project_id: i64,
    camera_id: i32,
    timestamp_from: DateTime<Utc>,
    timestamp_to: DateTime<Utc>,
}

impl From<CameraRangeRow> for CameraTimestampRange {
    fn from(r: CameraRangeRow) -> Self {
        CameraTimestampRange { project_id: r.project_id,
                               camera_id: r.camera_id,
                               timestamp_from: r.timestamp_from,
                               timestamp_to: r.timestamp_to }
    }
}

pub fn create_project(conn: &mut PgConnection, new: &NewProject) -> Result<Project, PersistenceError> {
    debug!("projects:create project_id={:?}", new.project_id);
    let row = diesel::insert_into(project_table::table).values(NewProjectRow { project_id: new.project_id,
                                                                               case_title: new.case_title.as_deref() })
                                                       .returning(ProjectRow::as_returning())
                                                       .get_result(conn)?;
    Ok(row.into())
}

pub fn get_project(conn: &mut PgConnection, project_id: i64) -> Result<Option<Project>, PersistenceError> {
    let row = project_table::table.find(project_id)
                                  .select(ProjectRow::as_select())
                                  .first(conn)
                                  .optional()?;
    Ok(row.map(Project::from))
}

/// `NotFound` si el proyecto no existe. Una actualización vacía sólo relee la
/// fila.
pub fn update_progress(conn: &mut PgConnection, project_id: i64, changes: &ProjectProgress) -> Result<Project, PersistenceError> {
    if changes.is_empty() {
        return get_project(conn, project_id)?.ok_or(PersistenceError::NotFound);
    }
    let row = diesel::update(project_table::table.find(project_id)).set(changes)
                                                                   .returning(ProjectRow::as_returning())
                                                                   .get_result(conn)?;
    Ok(row.into())
}

pub fn set_status(conn: &mut PgConnection, project_id: i64, status: &str) -> Result<(), PersistenceError> {
    let n = diesel::update(project_table::table.find(project_id)).set(project_table::status.eq(status))
                                                                 .execute(conn)?;
    if n == 0 { Err(PersistenceError::NotFound) } else { Ok(()) }
}

/// Marca de borrado lógico; el borrado físico lo decide una política externa.
pub fn set_deletion_status(conn: &mut PgConnection, project_id: i64, deletion_status: &str) -> Result<(), PersistenceError> {
    let n = diesel::update(project_table::table.find(project_id)).set(project_table::deletion_status.eq(deletion_status))
                                                                 .execute(conn)?;
    if n == 0 { Err(PersistenceError::NotFound) } else { Ok(()) }
}

/// Devuelve cuántos proyectos se borraron (0 o 1).
pub fn delete_project(conn: &mut PgConnection, project_id: i64) -> Result<usize, PersistenceError> {
    debug!("projects:delete project_id={project_id}");
    Ok(diesel::delete(project_table::table.find(project_id)).execute(conn)?)
}

pub fn add_camera(conn: &mut PgConnection, camera: &Camera) -> Result<(), PersistenceError> {
    diesel::insert_into(project_camera::table).values(CameraRow { project_id: camera.project_id,
                                                                  camera_id: camera.camera_id })
                                              .execute(conn)?;
    Ok(())
}

pub fn list_cameras(conn: &mut PgConnection, project_id: i64) -> Result<Vec<Camera>, PersistenceError> {
    let rows = project_camera::table.filter(project_camera::project_id.eq(project_id))
                                    .order(project_camera::camera_id.asc())
                                    .select(CameraRow::as_select())
                                    .load(conn)?;
    Ok(rows.into_iter()
           .map(|r| Camera { project_id: r.project_id, camera_id: r.camera_id })
           .collect())
}

pub fn add_camera_range(conn: &mut PgConnection, range: &CameraTimestampRange) -> Result<(), PersistenceError> {
    diesel::insert_into(project_camera_timestamps::table).values(CameraRangeRow { project_id: range.project_id,
                                                                                  camera_id: range.camera_id,
                                                                                  timestamp_from: range.timestamp_from,
                                                                                  timestamp_to: range.timestamp_to })
                                                         .execute(conn)?;
    Ok(())
}

/// Rangos de un proyecto, opcionalmente de una sola cámara, ordenados por
/// cámara e inicio.
pub fn list_camera_ranges(conn: &mut PgConnection,
                          project_id: i64,
                          camera_id: Option<i32>)
                          -> Result<Vec<CameraTimestampRange>, PersistenceError> {
    let mut query = project_camera_timestamps::table.filter(project_camera_timestamps::project_id.eq(project_id))
                                                    .into_boxed();
    if let Some(camera_id) = camera_id {
        query = query.filter(project_camera_timestamps::camera_id.eq(camera_id));
    }
    let rows = query.order((project_camera_timestamps::camera_id.asc(), project_camera_timestamps::timestamp_from.asc()))
                    .select(CameraRangeRow::as_select())
                    .load(conn)?;
    Ok(rows.into_iter().map(CameraTimestampRange::from).collect())
}

/// Store de proyectos (y su jerarquía de cámaras) sobre un
/// `ConnectionProvider`.
pub struct PgProjectStore<P: ConnectionProvider> {
    pub provider: P,
}

impl<P: ConnectionProvider> PgProjectStore<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn create_project(&self, new: &NewProject) -> Result<Project, PersistenceError> {
        create_project(&mut *self.provider.connection()?, new)
    }

    pub fn get_project(&self, project_id: i64) -> Result<Option<Project>, PersistenceError> {
        get_project(&mut *self.provider.connection()?, project_id)
    }

    pub fn update_progress(&self, project_id: i64, changes: &ProjectProgress) -> Result<Project, PersistenceError> {
        update_progress(&mut *self.provider.connection()?, project_id, changes)
    }

    pub fn set_status(&self, project_id: i64, status: &str) -> Result<(), PersistenceError> {
        set_status(&mut *self.provider.connection()?, project_id, status)
    }

    pub fn set_deletion_status(&self, project_id: i64, deletion_status: &str) -> Result<(), PersistenceError> {
        set_deletion_status(&mut *self.provider.connection()?, project_id, deletion_status)
    }

    pub fn delete_project(&self, project_id: i64) -> Result<usize, PersistenceError> {
        delete_project(&mut *self.provider.connection()?, project_id)
    }

    pub fn add_camera(&self, camera: &Camera) -> Result<(), PersistenceError> {
        add_camera(&mut *self.provider.connection()?, camera)
    }

    pub fn list_cameras(&self, project_id: i64) -> Result<Vec<Camera>, PersistenceError> {
        list_cameras(&mut *self.provider.connection()?, project_id)
    }

    pub fn add_camera_range(&self, range: &CameraTimestampRange) -> Result<(), PersistenceError> {
        add_camera_range(&mut *self.provider.connection()?, range)
    }

    pub fn list_camera_ranges(&self, project_id: i64, camera_id: Option<i32>) -> Result<Vec<CameraTimestampRange>, PersistenceError> {
        list_camera_ranges(&mut *self.provider.connection()?, project_id, camera_id)
    }
}
