//! Detecciones (`detections_gis`, hypertable).
//!
//! La geometría viaja como WKB en ambos sentidos (`ST_GeomFromWKB` /
//! `ST_AsBinary`): lo que se lee es bit a bit lo que se escribió. Los
//! instantes se guardan con precisión de microsegundos.

use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::sql_query;
use diesel::sql_types::{BigInt, Binary, Double, Integer, Nullable, Timestamptz};
use log::debug;
use va_domain::{BoundingPolygon, Detection, DetectionKey, DomainError, BBOX_SRID};

use super::ConnectionProvider;
use crate::error::PersistenceError;
use crate::schema::detections_gis;

const INSERT_SQL: &str = r#"INSERT INTO public.detections_gis (object_id, "timestamp", frame_idx, bbox, confidence)
VALUES ($1, $2, $3, ST_GeomFromWKB($4, $5), $6)"#;

const SELECT_BY_KEY_SQL: &str = r#"SELECT object_id, "timestamp", frame_idx, ST_AsBinary(bbox) AS bbox_wkb, confidence
FROM public.detections_gis WHERE "timestamp" = $1 AND object_id = $2"#;

/// Fila leída con SQL crudo (la geometría llega como WKB).
#[derive(QueryableByName, Debug)]
struct DetectionRow {
    #[diesel(sql_type = BigInt)]
    object_id: i64,
    #[diesel(sql_type = Timestamptz)]
    timestamp: DateTime<Utc>,
    #[diesel(sql_type = Nullable<Integer>)]
    frame_idx: Option<i32>,
    #[diesel(sql_type = Binary)]
    bbox_wkb: Vec<u8>,
    #[diesel(sql_type = Nullable<Double>)]
    confidence: Option<f64>,
}

impl TryFrom<DetectionRow> for Detection {
    type Error = DomainError;
    fn try_from(row: DetectionRow) -> Result<Self, Self::Error> {
        Ok(Detection { object_id: row.object_id,
                       timestamp: row.timestamp,
                       frame_idx: row.frame_idx,
                       bbox: BoundingPolygon::from_wkb(&row.bbox_wkb)?,
                       confidence: row.confidence })
    }
}

fn insert_row(conn: &mut PgConnection, d: &Detection) -> QueryResult<usize> {
    sql_query(INSERT_SQL).bind::<BigInt, _>(d.object_id)
                         .bind::<Timestamptz, _>(d.timestamp)
                         .bind::<Nullable<Integer>, _>(d.frame_idx)
                         .bind::<Binary, _>(d.bbox.to_wkb())
                         .bind::<Integer, _>(BBOX_SRID)
                         .bind::<Nullable<Double>, _>(d.confidence)
                         .execute(conn)
}

pub fn insert(conn: &mut PgConnection, d: &Detection) -> Result<(), PersistenceError> {
    debug!("detections:insert object_id={} ts={}", d.object_id, d.timestamp);
    insert_row(conn, d)?;
    Ok(())
}

/// Inserta todas las detecciones en una sola transacción: o entran todas o
/// ninguna.
pub fn insert_batch(conn: &mut PgConnection, detections: &[Detection]) -> Result<usize, PersistenceError> {
    debug!("detections:insert_batch count={}", detections.len());
    conn.transaction(|tx| {
            for d in detections {
                insert_row(tx, d)?;
            }
            Ok::<usize, diesel::result::Error>(detections.len())
        })
        .map_err(PersistenceError::from)
}

pub fn get(conn: &mut PgConnection, key: &DetectionKey) -> Result<Option<Detection>, PersistenceError> {
    let row = sql_query(SELECT_BY_KEY_SQL).bind::<Timestamptz, _>(key.timestamp)
                                          .bind::<BigInt, _>(key.object_id)
                                          .get_result::<DetectionRow>(conn)
                                          .optional()?;
    Ok(row.map(Detection::try_from).transpose()?)
}

pub fn count(conn: &mut PgConnection) -> Result<i64, PersistenceError> {
    Ok(detections_gis::table.count().get_result(conn)?)
}

pub fn count_for_object(conn: &mut PgConnection, object_id: i64) -> Result<i64, PersistenceError> {
    Ok(detections_gis::table.filter(detections_gis::object_id.eq(object_id))
                            .count()
                            .get_result(conn)?)
}

/// Store de detecciones sobre un `ConnectionProvider`.
pub struct PgDetectionStore<P: ConnectionProvider> {
    pub provider: P,
}

impl<P: ConnectionProvider> PgDetectionStore<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn insert(&self, d: &Detection) -> Result<(), PersistenceError> {
        insert(&mut *self.provider.connection()?, d)
    }

    pub fn insert_batch(&self, detections: &[Detection]) -> Result<usize, PersistenceError> {
        insert_batch(&mut *self.provider.connection()?, detections)
    }

    pub fn get(&self, key: &DetectionKey) -> Result<Option<Detection>, PersistenceError> {
        get(&mut *self.provider.connection()?, key)
    }

    pub fn count(&self) -> Result<i64, PersistenceError> {
        count(&mut *self.provider.connection()?)
    }

    pub fn count_for_object(&self, object_id: i64) -> Result<i64, PersistenceError> {
        count_for_object(&mut *self.provider.connection()?, object_id)
    }
}
