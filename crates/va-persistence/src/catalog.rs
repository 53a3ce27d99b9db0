//! Inspección del catálogo de Postgres contra el manifiesto.
//!
//! - `verify_schema`: qué falta (extensiones, tablas, índices, hypertables).
//! - `schema_fingerprint`: descripción ordenada de columnas, restricciones e
//!   índices; dos backends con la misma huella tienen el mismo esquema.

use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::sql_query;
use diesel::sql_types::{Array, Bool, Text};
use serde::Serialize;

use crate::error::PersistenceError;
use crate::manifest::{SchemaManifest, SCHEMA_MANIFEST};

#[derive(QueryableByName)]
struct Flag {
    #[diesel(sql_type = Bool)]
    present: bool,
}

#[derive(QueryableByName)]
struct Line {
    #[diesel(sql_type = Text)]
    line: String,
}

/// `to_regclass` sirve tanto para tablas como para índices.
pub fn relation_exists(conn: &mut PgConnection, qualified_name: &str) -> QueryResult<bool> {
    sql_query("SELECT to_regclass($1) IS NOT NULL AS present").bind::<Text, _>(qualified_name)
                                                              .get_result::<Flag>(conn)
                                                              .map(|f| f.present)
}

pub fn extension_enabled(conn: &mut PgConnection, extension: &str) -> QueryResult<bool> {
    sql_query("SELECT EXISTS (SELECT 1 FROM pg_extension WHERE extname = $1) AS present").bind::<Text, _>(extension)
                                                                                        .get_result::<Flag>(conn)
                                                                                        .map(|f| f.present)
}

pub fn namespace_exists(conn: &mut PgConnection, namespace: &str) -> QueryResult<bool> {
    sql_query("SELECT EXISTS (SELECT 1 FROM pg_namespace WHERE nspname = $1) AS present").bind::<Text, _>(namespace)
                                                                                         .get_result::<Flag>(conn)
                                                                                         .map(|f| f.present)
}

/// Falso (sin error) si timescaledb no está activa: la vista de información
/// no existe en ese caso.
pub fn is_hypertable(conn: &mut PgConnection, namespace: &str, table: &str) -> QueryResult<bool> {
    if !extension_enabled(conn, "timescaledb")? {
        return Ok(false);
    }
    sql_query("SELECT EXISTS (SELECT 1 FROM timescaledb_information.hypertables \
               WHERE hypertable_schema = $1 AND hypertable_name = $2) AS present")
        .bind::<Text, _>(namespace)
        .bind::<Text, _>(table)
        .get_result::<Flag>(conn)
        .map(|f| f.present)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchemaReport {
    pub namespace_present: bool,
    pub missing_extensions: Vec<String>,
    pub missing_tables: Vec<String>,
    pub missing_indexes: Vec<String>,
    pub missing_hypertables: Vec<String>,
}

impl SchemaReport {
    pub fn is_complete(&self) -> bool {
        self.namespace_present
        && self.missing_extensions.is_empty()
        && self.missing_tables.is_empty()
        && self.missing_indexes.is_empty()
        && self.missing_hypertables.is_empty()
    }
}

pub fn verify_schema(conn: &mut PgConnection, manifest: &SchemaManifest) -> QueryResult<SchemaReport> {
    let mut report = SchemaReport { namespace_present: namespace_exists(conn, manifest.namespace)?,
                                    ..Default::default() };
    for ext in manifest.extensions {
        if !extension_enabled(conn, ext)? {
            report.missing_extensions.push(ext.to_string());
        }
    }
    for table in manifest.tables {
        if !relation_exists(conn, &manifest.qualified(table.name))? {
            report.missing_tables.push(table.name.to_string());
        }
        for idx in table.indexes {
            if !relation_exists(conn, &manifest.qualified(idx.name))? {
                report.missing_indexes.push(idx.name.to_string());
            }
        }
    }
    for ht in manifest.hypertables {
        if !is_hypertable(conn, manifest.namespace, ht.table)? {
            report.missing_hypertables.push(ht.table.to_string());
        }
    }
    Ok(report)
}

/// Abre una conexión dedicada y verifica `SCHEMA_MANIFEST`.
pub fn verify_database(database_url: &str) -> Result<SchemaReport, PersistenceError> {
    let mut conn = PgConnection::establish(database_url)?;
    Ok(verify_schema(&mut conn, &SCHEMA_MANIFEST)?)
}

pub fn schema_fingerprint(conn: &mut PgConnection, manifest: &SchemaManifest) -> QueryResult<Vec<String>> {
    let tables: Vec<String> = manifest.tables.iter().map(|t| t.name.to_string()).collect();
    let mut lines = Vec::new();

    let columns = sql_query("SELECT 'column ' || table_name || '.' || column_name || ' ' || data_type \
                             || ' nullable=' || is_nullable || ' default=' || COALESCE(column_default, '') AS line \
                             FROM information_schema.columns WHERE table_schema = $1 AND table_name = ANY($2)")
        .bind::<Text, _>(manifest.namespace)
        .bind::<Array<Text>, _>(&tables)
        .load::<Line>(conn)?;
    lines.extend(columns.into_iter().map(|l| l.line));

    let constraints = sql_query("SELECT 'constraint ' || cl.relname || ' ' || co.conname || ' ' \
                                 || pg_get_constraintdef(co.oid) AS line \
                                 FROM pg_constraint co JOIN pg_class cl ON cl.oid = co.conrelid \
                                 JOIN pg_namespace ns ON ns.oid = cl.relnamespace \
                                 WHERE ns.nspname = $1 AND cl.relname = ANY($2)")
        .bind::<Text, _>(manifest.namespace)
        .bind::<Array<Text>, _>(&tables)
        .load::<Line>(conn)?;
    lines.extend(constraints.into_iter().map(|l| l.line));

    let indexes = sql_query("SELECT 'index ' || tablename || ' ' || indexname || ' ' || indexdef AS line \
                             FROM pg_indexes WHERE schemaname = $1 AND tablename = ANY($2)")
        .bind::<Text, _>(manifest.namespace)
        .bind::<Array<Text>, _>(&tables)
        .load::<Line>(conn)?;
    lines.extend(indexes.into_iter().map(|l| l.line));

    if extension_enabled(conn, "timescaledb")? {
        let dims = sql_query("SELECT 'dimension ' || hypertable_name || ' ' || column_name AS line \
                              FROM timescaledb_information.dimensions \
                              WHERE hypertable_schema = $1 AND hypertable_name = ANY($2)")
            .bind::<Text, _>(manifest.namespace)
            .bind::<Array<Text>, _>(&tables)
            .load::<Line>(conn)?;
        lines.extend(dims.into_iter().map(|l| l.line));
    }

    lines.sort();
    Ok(lines)
}
