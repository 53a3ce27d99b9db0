//! Acceso a Postgres (Diesel + r2d2).
//!
//! - `PgPool` / `ConnectionProvider`: obtención de conexiones, inyectable en
//!   los stores.
//! - `session`: fábrica de sesiones transaccionales independientes.
//! - Un módulo por grupo de entidades (`detections`, `projects`,
//!   `unique_objects`, `video_jobs`). Cada operación existe como función libre
//!   sobre `&mut PgConnection` (para usarse dentro de una `Session`) y como
//!   método del store genérico sobre `ConnectionProvider`.
//!
//! Esta capa no reintenta ni traduce errores del backend: las violaciones de
//! restricciones llegan al llamador tal como las reporta Postgres.

use diesel::connection::{Instrumentation, InstrumentationEvent};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::ConnectionManager;
use log::info;

use crate::config::DbConfig;
use crate::error::PersistenceError;

pub mod detections;
pub mod projects;
pub mod session;
pub mod unique_objects;
pub mod video_jobs;

pub use detections::PgDetectionStore;
pub use projects::PgProjectStore;
pub use session::{Session, SessionFactory, SessionOptions};
pub use unique_objects::PgUniqueObjectStore;
pub use video_jobs::PgVideoJobStore;

/// Alias de tipo para el pool r2d2 de conexiones Postgres.
///
/// - `min_idle` = `pool_size` (conexiones mantenidas abiertas).
/// - `max_size` = `pool_size + max_overflow`.
pub type PgPool = r2d2::Pool<ConnectionManager<PgConnection>>;
pub type PooledPg = r2d2::PooledConnection<ConnectionManager<PgConnection>>;

/// Proveedor abstracto de conexiones.
///
/// Permite inyectar un pool real (producción/tests de integración) o una
/// fábrica de sesiones sin acoplar los stores a r2d2.
pub trait ConnectionProvider: Send + Sync + 'static {
    fn connection(&self) -> Result<PooledPg, PersistenceError>;
}

/// Implementación concreta de `ConnectionProvider` respaldada por un `PgPool`.
#[derive(Clone)]
pub struct PoolProvider {
    pub pool: PgPool,
}

impl ConnectionProvider for PoolProvider {
    fn connection(&self) -> Result<PooledPg, PersistenceError> {
        checkout(&self.pool)
    }
}

pub(crate) fn checkout(pool: &PgPool) -> Result<PooledPg, PersistenceError> {
    pool.get().map_err(|e| PersistenceError::TransientIo(format!("pool error: {e}")))
}

/// Registra cada sentencia antes de ejecutarla (`DATABASE_ECHO`).
#[derive(Debug, Default)]
struct StatementEcho;

impl Instrumentation for StatementEcho {
    fn on_connection_event(&mut self, event: InstrumentationEvent<'_>) {
        if let InstrumentationEvent::StartQuery { query, .. } = event {
            info!(target: "va_persistence::sql", "{query}");
        }
    }
}

#[derive(Debug)]
struct EchoCustomizer;

impl r2d2::CustomizeConnection<PgConnection, diesel::r2d2::Error> for EchoCustomizer {
    fn on_acquire(&self, conn: &mut PgConnection) -> Result<(), diesel::r2d2::Error> {
        conn.set_instrumentation(StatementEcho);
        Ok(())
    }
}

/// Construye un pool Postgres r2d2 a partir de la configuración.
///
/// No aprovisiona el esquema: eso es responsabilidad de
/// `provisioning::init_db`, que se ejecuta una vez al desplegar.
pub fn build_pool(cfg: &DbConfig) -> Result<PgPool, PersistenceError> {
    let pool_size = cfg.pool_size.max(1);
    let max_size = cfg.max_connections().max(pool_size);
    let manager = ConnectionManager::<PgConnection>::new(cfg.url.as_str());
    let mut builder = r2d2::Pool::builder().min_idle(Some(pool_size)).max_size(max_size);
    if cfg.echo {
        builder = builder.connection_customizer(Box::new(EchoCustomizer));
    }
    builder.build(manager)
           .map_err(|e| PersistenceError::TransientIo(format!("pool build: {e}")))
}

/// Helper de desarrollo: carga `.env`, lee configuración y construye el pool.
pub fn build_dev_pool_from_env() -> Result<PgPool, PersistenceError> {
    crate::config::init_dotenv();
    let cfg = DbConfig::from_env()?;
    build_pool(&cfg)
}
