//! Pruebas básicas de configuración y pool (requiere DATABASE_URL válido en entorno).

mod test_support;

use diesel::connection::SimpleConnection;
use test_support::{detection, unique_id, unique_id_i32};
use va_domain::{NewUniqueObjectAttribute, NewVideoJob, UniqueObject};
use va_persistence::config::DbConfig;
use va_persistence::pg::{build_pool, PgDetectionStore, PgUniqueObjectStore, PgVideoJobStore, PoolProvider,
                         SessionFactory};
use va_persistence::VideoJobUpdate;

#[test]
fn create_pool_from_env() {
    if std::env::var("DATABASE_URL").is_err() { eprintln!("DATABASE_URL no definido: omitiendo test"); return; }
    let mut cfg = DbConfig::from_env().expect("config");
    cfg.pool_size = 1;
    cfg.max_overflow = 1;
    cfg.echo = true;
    let pool = build_pool(&cfg).expect("pool");
    assert_eq!(pool.max_size(), 2);
    let mut conn = pool.get().expect("conn");
    conn.batch_execute("SELECT 1;").expect("select 1");
}

#[test]
fn session_factory_from_config() {
    if std::env::var("DATABASE_URL").is_err() { eprintln!("DATABASE_URL no definido: omitiendo test"); return; }
    let mut cfg = DbConfig::from_env().expect("config");
    cfg.pool_size = 1;
    cfg.max_overflow = 2;
    let factory = SessionFactory::new(&cfg).expect("factory");
    let mut a = factory.session().expect("a");
    let mut b = factory.session().expect("b");
    a.conn().batch_execute("SELECT 1;").expect("a select");
    b.conn().batch_execute("SELECT 1;").expect("b select");
}

#[test]
fn store_uses_provider_connections() {
    let Some(pool) = test_support::pool() else { return };
    let store = PgDetectionStore::new(PoolProvider { pool: pool.clone() });
    let object_id = unique_id();
    let batch: Vec<_> = (0..5).map(|i| detection(object_id, i)).collect();
    assert_eq!(store.insert_batch(&batch).expect("batch"), 5);
    assert_eq!(store.count_for_object(object_id).expect("count"), 5);
    assert!(store.count().expect("count all") >= 5);
    let back = store.get(&batch[3].key()).expect("get").expect("present");
    assert_eq!(back, batch[3]);
}

#[test]
fn object_and_job_stores_use_provider_connections() {
    let Some(pool) = test_support::pool() else { return };
    let objects = PgUniqueObjectStore::new(PoolProvider { pool: pool.clone() });
    let mut object = UniqueObject::new(unique_id(), unique_id_i32());
    object.class_name = Some("person".into());
    let stored = objects.upsert(&object).expect("upsert");
    assert_eq!(stored, object);
    objects.set_image_uri(object.key(), "s3://bucket/crop.jpg").expect("image uri");
    let attr = objects.add_attribute(&NewUniqueObjectAttribute::new(object.key(), "color", Some("red".into())))
                      .expect("attribute");
    assert_eq!(objects.list_attributes(object.key()).expect("list"), vec![attr.clone()]);
    assert!(objects.find_attributes_by_name(object.project_id, "color").expect("find").contains(&attr));
    let back = objects.get(object.key()).expect("get").expect("present");
    assert_eq!(back.image_uri.as_deref(), Some("s3://bucket/crop.jpg"));
    assert_eq!(objects.delete(object.key()).expect("delete"), 1);
    assert!(objects.list_attributes(object.key()).expect("list").is_empty());

    let jobs = PgVideoJobStore::new(PoolProvider { pool: pool.clone() });
    let pid = unique_id();
    jobs.create(&NewVideoJob::new(pid, "job-1")).expect("create");
    let done = jobs.update_status(pid, "job-1", &VideoJobUpdate::status("done")).expect("update");
    assert_eq!(done.status.as_deref(), Some("done"));
    assert_eq!(jobs.get(pid, "job-1").expect("get"), Some(done));
    assert_eq!(jobs.list(pid).expect("list").len(), 1);
    assert_eq!(jobs.delete(pid, "job-1").expect("delete"), 1);
    assert!(jobs.list(pid).expect("list").is_empty());
}
