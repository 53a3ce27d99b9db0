//! Manifiesto explícito del esquema.
//!
//! Lista enumerable de todas las tablas, índices e hypertables que el
//! aprovisionamiento crea, en orden seguro respecto a las FK. Es también el
//! contrato contra el que `catalog::verify_schema` valida un backend vivo.
//!
//! Todas las sentencias son idempotentes (`IF NOT EXISTS`). Las tres
//! relaciones de pertenencia declaran `ON DELETE CASCADE`: el borrado en
//! cascada lo ejecuta el backend, nunca se cargan los hijos en memoria.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndexDef {
    pub name: &'static str,
    #[serde(skip)]
    pub ddl: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TableDef {
    pub name: &'static str,
    #[serde(skip)]
    pub ddl: &'static str,
    /// Tablas referenciadas por FK desde esta tabla.
    pub references: &'static [&'static str],
    pub indexes: &'static [IndexDef],
}

/// Tabla a convertir en hypertable particionada por `time_column`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HypertableDef {
    pub table: &'static str,
    pub time_column: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SchemaManifest {
    pub namespace: &'static str,
    /// Extensiones requeridas, en orden de activación.
    pub extensions: &'static [&'static str],
    pub tables: &'static [TableDef],
    pub hypertables: &'static [HypertableDef],
}

impl SchemaManifest {
    pub fn table(&self, name: &str) -> Option<&TableDef> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn index_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.tables.iter().flat_map(|t| t.indexes.iter().map(|i| i.name))
    }

    /// Nombre calificado con el namespace (`public.tabla`).
    pub fn qualified(&self, name: &str) -> String {
        format!("{}.{}", self.namespace, name)
    }
}

pub const DETECTIONS_GIS: TableDef = TableDef {
    name: "detections_gis",
    ddl: r#"
CREATE TABLE IF NOT EXISTS public.detections_gis (
    object_id   BIGINT NOT NULL,
    "timestamp" TIMESTAMP WITH TIME ZONE NOT NULL,
    frame_idx   INTEGER,
    bbox        geometry(POLYGON, 0) NOT NULL,
    confidence  DOUBLE PRECISION,
    CONSTRAINT detections_gis_pkey PRIMARY KEY ("timestamp", object_id)
);"#,
    references: &[],
    indexes: &[
        IndexDef { name: "ix_detections_gis_ts",
                   ddl: r#"CREATE INDEX IF NOT EXISTS ix_detections_gis_ts ON public.detections_gis ("timestamp");"# },
        IndexDef { name: "ix_detections_gis_object_id",
                   ddl: "CREATE INDEX IF NOT EXISTS ix_detections_gis_object_id ON public.detections_gis (object_id);" },
        IndexDef { name: "idx_detections_gis_bbox_gist",
                   ddl: "CREATE INDEX IF NOT EXISTS idx_detections_gis_bbox_gist ON public.detections_gis USING gist (bbox);" },
    ],
};

pub const PROJECT_TABLE: TableDef = TableDef {
    name: "project_table",
    ddl: r#"
CREATE TABLE IF NOT EXISTS public.project_table (
    project_id       BIGSERIAL NOT NULL,
    case_title       TEXT,
    progress         DOUBLE PRECISION DEFAULT 0,
    objects_found    INTEGER DEFAULT 0,
    video_jobs_count INTEGER DEFAULT 0,
    deletion_status  TEXT DEFAULT '-',
    status           TEXT DEFAULT 'in_progress',
    created_at       TIMESTAMP WITH TIME ZONE DEFAULT CURRENT_TIMESTAMP,
    expiration_time  TIMESTAMP WITH TIME ZONE DEFAULT (CURRENT_TIMESTAMP + '5 days'::interval),
    PRIMARY KEY (project_id)
);"#,
    references: &[],
    indexes: &[],
};

pub const PROJECT_CAMERA: TableDef = TableDef {
    name: "project_camera",
    ddl: r#"
CREATE TABLE IF NOT EXISTS public.project_camera (
    project_id BIGINT NOT NULL,
    camera_id  INTEGER NOT NULL,
    CONSTRAINT project_camera_pkey PRIMARY KEY (project_id, camera_id),
    FOREIGN KEY (project_id) REFERENCES public.project_table (project_id) ON DELETE CASCADE
);"#,
    references: &["project_table"],
    indexes: &[],
};

pub const PROJECT_CAMERA_TIMESTAMPS: TableDef = TableDef {
    name: "project_camera_timestamps",
    ddl: r#"
CREATE TABLE IF NOT EXISTS public.project_camera_timestamps (
    project_id     BIGINT NOT NULL,
    camera_id      INTEGER NOT NULL,
    timestamp_from TIMESTAMP WITH TIME ZONE NOT NULL,
    timestamp_to   TIMESTAMP WITH TIME ZONE NOT NULL,
    CONSTRAINT pctime_pkey PRIMARY KEY (project_id, camera_id, timestamp_from),
    FOREIGN KEY (project_id, camera_id)
        REFERENCES public.project_camera (project_id, camera_id) ON DELETE CASCADE
);"#,
    references: &["project_camera"],
    indexes: &[],
};

pub const UNIQUE_OBJECTS: TableDef = TableDef {
    name: "unique_objects",
    ddl: r#"
CREATE TABLE IF NOT EXISTS public.unique_objects (
    object_id       BIGINT NOT NULL,
    project_id      INTEGER NOT NULL,
    camera_id       INTEGER,
    job_id          TEXT,
    class_name      TEXT,
    image_uri       TEXT,
    start_time      TIMESTAMP WITH TIME ZONE,
    end_time        TIMESTAMP WITH TIME ZONE,
    start_frame_idx INTEGER,
    end_frame_idx   INTEGER,
    PRIMARY KEY (object_id, project_id)
);"#,
    references: &[],
    indexes: &[],
};

pub const UNIQUE_OBJECT_ATTRIBUTES: TableDef = TableDef {
    name: "unique_object_attributes",
    ddl: r#"
CREATE TABLE IF NOT EXISTS public.unique_object_attributes (
    attribute_id BIGSERIAL NOT NULL,
    object_id    BIGINT NOT NULL,
    project_id   INTEGER NOT NULL,
    name         TEXT NOT NULL,
    value        TEXT,
    created_at   TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT CURRENT_TIMESTAMP,
    PRIMARY KEY (attribute_id),
    FOREIGN KEY (object_id, project_id)
        REFERENCES public.unique_objects (object_id, project_id) ON DELETE CASCADE
);"#,
    references: &["unique_objects"],
    indexes: &[
        IndexDef { name: "idx_uo_attr_object",
                   ddl: "CREATE INDEX IF NOT EXISTS idx_uo_attr_object ON public.unique_object_attributes (object_id, project_id);" },
        IndexDef { name: "idx_uo_attr_name",
                   ddl: "CREATE INDEX IF NOT EXISTS idx_uo_attr_name ON public.unique_object_attributes (name);" },
    ],
};

pub const VIDEO_JOBS: TableDef = TableDef {
    name: "video_jobs",
    ddl: r#"
CREATE TABLE IF NOT EXISTS public.video_jobs (
    project_id           BIGINT NOT NULL,
    camera_id            TEXT,
    job_id               TEXT NOT NULL,
    timestamp_from_og    TIMESTAMP WITH TIME ZONE,
    timestamp_to_og      TIMESTAMP WITH TIME ZONE,
    timestamp_from_exact TIMESTAMP WITH TIME ZONE,
    timestamp_to_exact   TIMESTAMP WITH TIME ZONE,
    status               TEXT DEFAULT 'queued',
    objects_found        INTEGER DEFAULT 0,
    order_number         INTEGER DEFAULT 0,
    PRIMARY KEY (project_id, job_id)
);"#,
    references: &[],
    indexes: &[],
};

pub const SCHEMA_MANIFEST: SchemaManifest = SchemaManifest {
    namespace: "public",
    extensions: &["postgis", "timescaledb"],
    tables: &[DETECTIONS_GIS,
              PROJECT_TABLE,
              PROJECT_CAMERA,
              PROJECT_CAMERA_TIMESTAMPS,
              UNIQUE_OBJECTS,
              UNIQUE_OBJECT_ATTRIBUTES,
              VIDEO_JOBS],
    hypertables: &[HypertableDef { table: "detections_gis", time_column: "timestamp" }],
};
