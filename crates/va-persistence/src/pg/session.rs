//! Fábrica de sesiones transaccionales.
//!
//! Cada `Session` toma su propia conexión del pool, de modo que varias
//! sesiones son independientes entre sí. Sin `autocommit`, la sesión abre una
//! transacción al crearse y tras cada `commit`/`rollback`; lo no confirmado se
//! revierte al soltarla.

use diesel::connection::{AnsiTransactionManager, TransactionManager};
use diesel::pg::PgConnection;
use log::{debug, error, warn};

use super::{build_pool, checkout, ConnectionProvider, PgPool, PooledPg};
use crate::config::DbConfig;
use crate::error::PersistenceError;

/// Opciones de una `Session`.
///
/// Sólo `autocommit` es configurable. Diesel envía cada sentencia al servidor
/// en el momento en que se ejecuta, sin caché de escrituras pendientes: el
/// equivalente a `autoflush` está siempre activo, y toda lectura posterior
/// dentro de la misma sesión ve lo escrito aunque no se haya confirmado.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionOptions {
    /// Cada sentencia se confirma al ejecutarse.
    pub autocommit: bool,
}

pub struct SessionFactory {
    pool: PgPool,
    defaults: SessionOptions,
}

impl SessionFactory {
    pub fn new(cfg: &DbConfig) -> Result<Self, PersistenceError> {
        Ok(Self::from_pool(build_pool(cfg)?))
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool, defaults: SessionOptions::default() }
    }

    /// Cambia las opciones que usa `session()`.
    pub fn with_defaults(mut self, defaults: SessionOptions) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn session(&self) -> Result<Session, PersistenceError> {
        self.session_with(self.defaults)
    }

    pub fn session_with(&self, options: SessionOptions) -> Result<Session, PersistenceError> {
        let conn = checkout(&self.pool)?;
        let mut session = Session { conn, options, in_transaction: false };
        session.begin()?;
        Ok(session)
    }
}

impl ConnectionProvider for SessionFactory {
    fn connection(&self) -> Result<PooledPg, PersistenceError> {
        checkout(&self.pool)
    }
}

pub struct Session {
    conn: PooledPg,
    options: SessionOptions,
    in_transaction: bool,
}

impl Session {
    pub fn options(&self) -> SessionOptions {
        self.options
    }

    pub fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    /// Conexión subyacente, para las funciones libres de los stores.
    pub fn conn(&mut self) -> &mut PgConnection {
        &mut self.conn
    }

    /// Confirma la transacción en curso y abre la siguiente. Sin efecto en
    /// modo autocommit.
    pub fn commit(&mut self) -> Result<(), PersistenceError> {
        if self.in_transaction {
            self.in_transaction = false;
            AnsiTransactionManager::commit_transaction(&mut *self.conn)?;
            debug!("session:commit");
        }
        self.begin()
    }

    /// Descarta la transacción en curso y abre la siguiente. Sin efecto en
    /// modo autocommit.
    pub fn rollback(&mut self) -> Result<(), PersistenceError> {
        if self.in_transaction {
            self.in_transaction = false;
            AnsiTransactionManager::rollback_transaction(&mut *self.conn)?;
            debug!("session:rollback");
        }
        self.begin()
    }

    /// Cierra la sesión revirtiendo lo no confirmado.
    pub fn close(mut self) -> Result<(), PersistenceError> {
        if self.in_transaction {
            self.in_transaction = false;
            AnsiTransactionManager::rollback_transaction(&mut *self.conn)?;
        }
        Ok(())
    }

    fn begin(&mut self) -> Result<(), PersistenceError> {
        if !self.options.autocommit && !self.in_transaction {
            AnsiTransactionManager::begin_transaction(&mut *self.conn)?;
            self.in_transaction = true;
        }
        Ok(())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.in_transaction {
            warn!("session:drop with open transaction, rolling back");
            if let Err(e) = AnsiTransactionManager::rollback_transaction(&mut *self.conn) {
                error!("session:drop rollback failed err={e}");
            }
        }
    }
}
