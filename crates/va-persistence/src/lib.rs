//! va-persistence
//!
//! Capa de persistencia de analítica de video sobre Postgres + PostGIS +
//! TimescaleDB (Diesel, r2d2).
//!
//! Módulos:
//! - `manifest`: catálogo declarativo de tablas, índices y hypertables.
//! - `provisioning`: protocolo idempotente que lleva un backend al estado
//!   listo (`init_db`).
//! - `catalog`: verificación y huella del esquema instalado.
//! - `pg`: pool, sesiones transaccionales y stores por entidad.
//! - `config`: carga de configuración desde .env / entorno.
//! - `schema`: tablas Diesel declaradas para compilar queries.

pub mod catalog;
pub mod config;
pub mod error;
pub mod manifest;
pub mod pg;
pub mod provisioning;
pub mod schema;

pub use catalog::{schema_fingerprint, verify_database, verify_schema, SchemaReport};
pub use config::{init_dotenv, DbConfig, DbParams};
pub use error::{PersistenceError, ProvisioningError, ProvisioningStep};
pub use manifest::{SchemaManifest, SCHEMA_MANIFEST};
pub use pg::projects::ProjectProgress;
pub use pg::video_jobs::VideoJobUpdate;
pub use pg::{build_dev_pool_from_env, build_pool, ConnectionProvider, PgDetectionStore, PgPool, PgProjectStore,
             PgUniqueObjectStore, PgVideoJobStore, PoolProvider, PooledPg, Session, SessionFactory, SessionOptions};
pub use provisioning::{init_db, provision, ProvisioningReport, DEFAULT_DATABASE_URL};
