//! Esquema Diesel (escrito a mano, equivalente a `diesel print-schema`).
//! Debe coincidir con las DDL de `manifest::SCHEMA_MANIFEST`.

pub mod sql_types {
    /// Tipo `geometry` de PostGIS. Sólo se lee/escribe vía WKT en SQL crudo.
    #[derive(diesel::query_builder::QueryId, Clone, diesel::sql_types::SqlType)]
    #[diesel(postgres_type(name = "geometry"))]
    pub struct Geometry;
}

diesel::table! {
    use diesel::sql_types::*;
    use super::sql_types::Geometry;

    detections_gis (timestamp, object_id) {
        object_id -> BigInt,
        timestamp -> Timestamptz,
        frame_idx -> Nullable<Integer>,
        bbox -> Geometry,
        confidence -> Nullable<Double>,
    }
}

diesel::table! {
    project_table (project_id) {
        project_id -> BigInt,
        case_title -> Nullable<Text>,
        progress -> Nullable<Double>,
        objects_found -> Nullable<Integer>,
        video_jobs_count -> Nullable<Integer>,
        deletion_status -> Nullable<Text>,
        status -> Nullable<Text>,
        created_at -> Nullable<Timestamptz>,
        expiration_time -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    project_camera (project_id, camera_id) {
        project_id -> BigInt,
        camera_id -> Integer,
    }
}

diesel::table! {
    project_camera_timestamps (project_id, camera_id, timestamp_from) {
        project_id -> BigInt,
        camera_id -> Integer,
        timestamp_from -> Timestamptz,
        timestamp_to -> Timestamptz,
    }
}

diesel::table! {
    unique_objects (object_id, project_id) {
        object_id -> BigInt,
        project_id -> Integer,
        camera_id -> Nullable<Integer>,
        job_id -> Nullable<Text>,
        class_name -> Nullable<Text>,
        image_uri -> Nullable<Text>,
        start_time -> Nullable<Timestamptz>,
        end_time -> Nullable<Timestamptz>,
        start_frame_idx -> Nullable<Integer>,
        end_frame_idx -> Nullable<Integer>,
    }
}

diesel::table! {
    unique_object_attributes (attribute_id) {
        attribute_id -> BigInt,
        object_id -> BigInt,
        project_id -> Integer,
        name -> Text,
        value -> Nullable<Text>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    video_jobs (project_id, job_id) {
        project_id -> BigInt,
        camera_id -> Nullable<Text>,
        job_id -> Text,
        timestamp_from_og -> Nullable<Timestamptz>,
        timestamp_to_og -> Nullable<Timestamptz>,
        timestamp_from_exact -> Nullable<Timestamptz>,
        timestamp_to_exact -> Nullable<Timestamptz>,
        status -> Nullable<Text>,
        objects_found -> Nullable<Integer>,
        order_number -> Nullable<Integer>,
    }
}

// Sólo las FK de una columna se pueden declarar; las compuestas se resuelven
// con filtros explícitos.
diesel::joinable!(project_camera -> project_table (project_id));

diesel::allow_tables_to_appear_in_same_query!(
    detections_gis,
    project_table,
    project_camera,
    project_camera_timestamps,
    unique_objects,
    unique_object_attributes,
    video_jobs,
);
