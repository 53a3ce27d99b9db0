//! Soporte compartido de los tests de integración (requieren DATABASE_URL).
#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use uuid::Uuid;
use va_domain::{BoundingPolygon, Detection};
use va_persistence::config::DbConfig;
use va_persistence::pg::{build_pool, PgPool};
use va_persistence::provisioning::init_db;

/// Pool de test sobre un backend ya aprovisionado; `None` si no hay
/// DATABASE_URL o el backend no responde.
pub static TEST_POOL: Lazy<Option<PgPool>> = Lazy::new(|| {
    if std::env::var("DATABASE_URL").is_err() {
        return None;
    }
    let mut cfg = match DbConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("configuración de test inválida: {e}");
            return None;
        }
    };
    if let Err(e) = init_db(&cfg.url) {
        eprintln!("no se pudo aprovisionar el backend de test: {e}");
        return None;
    }
    cfg.pool_size = 2;
    cfg.max_overflow = 14;
    match build_pool(&cfg) {
        Ok(p) => Some(p),
        Err(e) => {
            eprintln!("No se pudo construir pool de test: {e}");
            None
        }
    }
});

pub fn pool() -> Option<&'static PgPool> {
    let pool = TEST_POOL.as_ref();
    if pool.is_none() {
        eprintln!("skip (no DATABASE_URL)");
    }
    pool
}

/// Id positivo que cabe tanto en BIGINT como en INTEGER.
pub fn unique_id() -> i64 {
    (Uuid::new_v4().as_u64_pair().0 >> 33) as i64
}

pub fn unique_id_i32() -> i32 {
    unique_id() as i32
}

/// Instante en segundos enteros (el backend guarda microsegundos).
pub fn ts(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).single().unwrap()
}

pub fn square(x: f64, y: f64, side: f64) -> BoundingPolygon {
    BoundingPolygon::rectangle(x, y, x + side, y + side).unwrap()
}

pub fn detection(object_id: i64, secs: i64) -> Detection {
    Detection::new(object_id, ts(secs), square(secs as f64, 0.0, 10.0))
}
