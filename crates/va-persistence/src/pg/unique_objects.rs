//! Objetos únicos y su tabla lateral de atributos.
//!
//! Los atributos cuelgan de `(object_id, project_id)` con `ON DELETE CASCADE`.

use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use log::debug;
use va_domain::{NewUniqueObjectAttribute, UniqueObject, UniqueObjectAttribute, UniqueObjectKey};

use super::ConnectionProvider;
use crate::error::PersistenceError;
use crate::schema::{unique_object_attributes, unique_objects};

/// Fila completa. Como changeset excluye la clave y escribe los `None` como
/// NULL: un upsert reemplaza la fila entera.
#[derive(Queryable, Selectable, Insertable, AsChangeset, Debug)]
#[diesel(table_name = unique_objects)]
#[diesel(primary_key(object_id, project_id))]
#[diesel(treat_none_as_null = true)]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct UniqueObjectRow {
    object_id: i64,
    project_id: i32,
    camera_id: Option<i32>,
    job_id: Option<String>,
    class_name: Option<String>,
    image_uri: Option<String>,
    start_time: Option<DateTime<Utc>>,
    end_time: Option<DateTime<Utc>>,
    start_frame_idx: Option<i32>,
    end_frame_idx: Option<i32>,
}

impl From<&UniqueObject> for UniqueObjectRow {
    fn from(o: &UniqueObject) -> Self {
        UniqueObjectRow { object_id: o.object_id,
                          project_id: o.project_id,
                          camera_id: o.camera_id,
                          job_id: o.job_id.clone(),
                          class_name: o.class_name.clone(),
                          image_uri: o.image_uri.clone(),
                          start_time: o.start_time,
                          end_time: o.end_time,
                          start_frame_idx: o.start_frame_idx,
                          end_frame_idx: o.end_frame_idx }
    }
}

impl From<UniqueObjectRow> for UniqueObject {
    fn from(r: UniqueObjectRow) -> Self {
        UniqueObject { object_id: r.object_id,
                       project_id: r.project_id,
                       camera_id: r.camera_id,
                       job_id: r.job_id,
                       class_name: r.class_name,
                       image_uri: r.image_uri,
                       start_time: r.start_time,
                       end_time: r.end_time,
                       start_frame_idx: r.start_frame_idx,
                       end_frame_idx: r.end_frame_idx }
    }
}

#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = unique_object_attributes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct AttributeRow {
    attribute_id: i64,
    object_id: i64,
    project_id: i32,
    name: String,
    value: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<AttributeRow> for UniqueObjectAttribute {
    fn from(r: AttributeRow) -> Self {
        UniqueObjectAttribute { attribute_id: r.attribute_id,
                                object_id: r.object_id,
                                project_id: r.project_id,
                                name: r.name,
                                value: r.value,
                                created_at: r.created_at }
    }
}

// attribute_id y created_at los asigna el servidor.
#[derive(Insertable, Debug)]
#[diesel(table_name = unique_object_attributes)]
struct NewAttributeRow<'a> {
    object_id: i64,
    project_id: i32,
    name: &'a str,
    value: Option<&'a str>,
}

fn by_key(key: UniqueObjectKey) -> diesel::dsl::Find<unique_objects::table, (i64, i32)> {
    unique_objects::table.find((key.object_id, key.project_id))
}

/// Inserta o reemplaza el objeto identificado por `(object_id, project_id)`.
pub fn upsert_unique_object(conn: &mut PgConnection, object: &UniqueObject) -> Result<UniqueObject, PersistenceError> {
    debug!("unique_objects:upsert object_id={} project_id={}", object.object_id, object.project_id);
    let row = UniqueObjectRow::from(object);
    let stored = diesel::insert_into(unique_objects::table).values(&row)
                                                           .on_conflict((unique_objects::object_id, unique_objects::project_id))
                                                           .do_update()
                                                           .set(&row)
                                                           .returning(UniqueObjectRow::as_returning())
                                                           .get_result(conn)?;
    Ok(stored.into())
}

pub fn get_unique_object(conn: &mut PgConnection, key: UniqueObjectKey) -> Result<Option<UniqueObject>, PersistenceError> {
    let row = by_key(key).select(UniqueObjectRow::as_select())
                         .first(conn)
                         .optional()?;
    Ok(row.map(UniqueObject::from))
}

/// Registra la imagen elegida para el objeto. `NotFound` si no existe.
pub fn set_image_uri(conn: &mut PgConnection, key: UniqueObjectKey, image_uri: &str) -> Result<(), PersistenceError> {
    let n = diesel::update(by_key(key)).set(unique_objects::image_uri.eq(image_uri))
                                       .execute(conn)?;
    if n == 0 { Err(PersistenceError::NotFound) } else { Ok(()) }
}

/// Borra el objeto; sus atributos caen en cascada.
pub fn delete_unique_object(conn: &mut PgConnection, key: UniqueObjectKey) -> Result<usize, PersistenceError> {
    debug!("unique_objects:delete object_id={} project_id={}", key.object_id, key.project_id);
    Ok(diesel::delete(by_key(key)).execute(conn)?)
}

/// Un atributo sin objeto dueño falla con `ForeignKeyViolation`.
pub fn add_attribute(conn: &mut PgConnection, attr: &NewUniqueObjectAttribute) -> Result<UniqueObjectAttribute, PersistenceError> {
    let row = diesel::insert_into(unique_object_attributes::table).values(NewAttributeRow { object_id: attr.owner.object_id,
                                                                                            project_id: attr.owner.project_id,
                                                                                            name: &attr.name,
                                                                                            value: attr.value.as_deref() })
                                                                  .returning(AttributeRow::as_returning())
                                                                  .get_result(conn)?;
    Ok(row.into())
}

/// Atributos de un objeto en orden de alta.
pub fn list_attributes(conn: &mut PgConnection, owner: UniqueObjectKey) -> Result<Vec<UniqueObjectAttribute>, PersistenceError> {
    let rows = unique_object_attributes::table.filter(unique_object_attributes::object_id.eq(owner.object_id))
                                              .filter(unique_object_attributes::project_id.eq(owner.project_id))
                                              .order(unique_object_attributes::attribute_id.asc())
                                              .select(AttributeRow::as_select())
                                              .load(conn)?;
    Ok(rows.into_iter().map(UniqueObjectAttribute::from).collect())
}

/// Atributos con un nombre dado dentro de un proyecto (usa `idx_uo_attr_name`).
pub fn find_attributes_by_name(conn: &mut PgConnection,
                               project_id: i32,
                               name: &str)
                               -> Result<Vec<UniqueObjectAttribute>, PersistenceError> {
    let rows = unique_object_attributes::table.filter(unique_object_attributes::project_id.eq(project_id))
                                              .filter(unique_object_attributes::name.eq(name))
                                              .order((unique_object_attributes::object_id.asc(),
                                                      unique_object_attributes::attribute_id.asc()))
                                              .select(AttributeRow::as_select())
                                              .load(conn)?;
    Ok(rows.into_iter().map(UniqueObjectAttribute::from).collect())
}

pub struct PgUniqueObjectStore<P: ConnectionProvider> {
    pub provider: P,
}

impl<P: ConnectionProvider> PgUniqueObjectStore<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn upsert(&self, object: &UniqueObject) -> Result<UniqueObject, PersistenceError> {
        upsert_unique_object(&mut *self.provider.connection()?, object)
    }

    pub fn get(&self, key: UniqueObjectKey) -> Result<Option<UniqueObject>, PersistenceError> {
        get_unique_object(&mut *self.provider.connection()?, key)
    }

    pub fn set_image_uri(&self, key: UniqueObjectKey, image_uri: &str) -> Result<(), PersistenceError> {
        set_image_uri(&mut *self.provider.connection()?, key, image_uri)
    }

    pub fn delete(&self, key: UniqueObjectKey) -> Result<usize, PersistenceError> {
        delete_unique_object(&mut *self.provider.connection()?, key)
    }

    pub fn add_attribute(&self, attr: &NewUniqueObjectAttribute) -> Result<UniqueObjectAttribute, PersistenceError> {
        add_attribute(&mut *self.provider.connection()?, attr)
    }

    pub fn list_attributes(&self, owner: UniqueObjectKey) -> Result<Vec<UniqueObjectAttribute>, PersistenceError> {
        list_attributes(&mut *self.provider.connection()?, owner)
    }

    pub fn find_attributes_by_name(&self, project_id: i32, name: &str) -> Result<Vec<UniqueObjectAttribute>, PersistenceError> {
        find_attributes_by_name(&mut *self.provider.connection()?, project_id, name)
    }
}
