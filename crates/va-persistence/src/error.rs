//! Errores de persistencia.
//! Mapea errores de Diesel / conexión a variantes semánticas. El mensaje del
//! backend se conserva tal cual; esta capa no traduce violaciones de
//! restricciones, sólo las clasifica.

use diesel::result::{ConnectionError, DatabaseErrorKind, Error as DieselError};
use thiserror::Error;
use va_domain::DomainError;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("unique violation: {0}")]
    UniqueViolation(String),
    #[error("check violation: {0}")]
    CheckViolation(String),
    #[error("foreign key violation: {0}")]
    ForeignKeyViolation(String),
    #[error("not null violation: {0}")]
    NotNullViolation(String),
    #[error("not found")]
    NotFound,
    #[error("serialization conflict (retryable)")]
    SerializationConflict,
    #[error("transient IO / connection pool error: {0}")]
    TransientIo(String),
    #[error("connection error: {0}")]
    Connection(#[from] ConnectionError),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),
    #[error("unknown database error: {0}")]
    Unknown(String),
}

impl PersistenceError {
    /// Verdadero para las violaciones que el backend levanta por las
    /// restricciones del esquema (clave duplicada, FK, NOT NULL, CHECK).
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self,
                 Self::UniqueViolation(_)
                 | Self::ForeignKeyViolation(_)
                 | Self::NotNullViolation(_)
                 | Self::CheckViolation(_))
    }
}

impl From<DieselError> for PersistenceError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => Self::NotFound,
            DieselError::DatabaseError(kind, info) => match kind {
                DatabaseErrorKind::UniqueViolation => Self::UniqueViolation(info.message().to_string()),
                DatabaseErrorKind::CheckViolation => Self::CheckViolation(info.message().to_string()),
                DatabaseErrorKind::ForeignKeyViolation => Self::ForeignKeyViolation(info.message().to_string()),
                DatabaseErrorKind::NotNullViolation => Self::NotNullViolation(info.message().to_string()),
                DatabaseErrorKind::SerializationFailure => Self::SerializationConflict,
                DatabaseErrorKind::ClosedConnection => Self::TransientIo(info.message().to_string()),
                other => Self::Unknown(format!("db error kind {:?}: {}", other, info.message())),
            },
            DieselError::DeserializationError(e) => Self::Unknown(format!("deser: {e}")),
            DieselError::SerializationError(e) => Self::Unknown(format!("ser: {e}")),
            DieselError::AlreadyInTransaction => Self::Unknown("already in transaction".into()),
            DieselError::RollbackErrorOnCommit { rollback_error, commit_error } => {
                Self::Unknown(format!("rollback={rollback_error}; commit={commit_error}"))
            }
            DieselError::BrokenTransactionManager => Self::TransientIo("broken transaction manager".into()),
            DieselError::QueryBuilderError(e) => Self::Unknown(format!("query builder: {e}")),
            DieselError::RollbackTransaction => Self::Unknown("rollback transaction".into()),
            DieselError::NotInTransaction => Self::Unknown("not in transaction".into()),
            other => Self::Unknown(format!("unhandled diesel error: {other:?}")),
        }
    }
}

/// Paso del protocolo de aprovisionamiento, en orden de ejecución.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProvisioningStep {
    Extensions,
    Namespace,
    Structures,
    Partitioning,
}

impl std::fmt::Display for ProvisioningStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Extensions => "extension enablement",
            Self::Namespace => "namespace ensure",
            Self::Structures => "structure creation",
            Self::Partitioning => "partition conversion",
        };
        f.write_str(name)
    }
}

/// Error fatal del aprovisionamiento. Sólo la activación de extensiones se
/// envuelve con contexto adicional; el resto conserva el error original y
/// nombra el paso que falló.
#[derive(Debug, Error)]
pub enum ProvisioningError {
    #[error("could not connect to provisioning target: {0}")]
    Connection(#[from] ConnectionError),
    #[error("failed to create required extension '{extension}' (postgis/timescaledb). Ensure you are connected as a \
             superuser and that TimescaleDB is installed & shared_preload_libraries includes 'timescaledb': {source}")]
    Extension {
        extension: String,
        #[source]
        source: PersistenceError,
    },
    #[error("provisioning step '{step}' failed: {source}")]
    Step {
        step: ProvisioningStep,
        #[source]
        source: PersistenceError,
    },
}

impl ProvisioningError {
    pub fn step(&self) -> Option<ProvisioningStep> {
        match self {
            Self::Connection(_) => None,
            Self::Extension { .. } => Some(ProvisioningStep::Extensions),
            Self::Step { step, .. } => Some(*step),
        }
    }

    pub(crate) fn at(step: ProvisioningStep) -> impl FnOnce(DieselError) -> Self {
        move |e| Self::Step { step, source: e.into() }
    }
}
