//! Sesiones independientes con transacción explícita o autocommit.

mod test_support;

use test_support::{detection, unique_id};
use va_domain::NewProject;
use va_persistence::pg::{detections, projects, SessionFactory, SessionOptions};

fn factory() -> Option<SessionFactory> {
    test_support::pool().map(|pool| SessionFactory::from_pool(pool.clone()))
}

#[test]
fn uncommitted_writes_are_invisible_to_other_sessions() {
    let Some(factory) = factory() else { return };
    let mut writer = factory.session().expect("writer");
    let mut reader = factory.session().expect("reader");
    assert!(writer.in_transaction());

    let d = detection(unique_id(), 100);
    detections::insert(writer.conn(), &d).expect("insert");
    assert!(detections::get(writer.conn(), &d.key()).expect("own read").is_some());
    assert!(detections::get(reader.conn(), &d.key()).expect("other read").is_none());

    writer.commit().expect("commit");
    assert!(writer.in_transaction(), "commit abre la siguiente transacción");
    // el lector tiene su propia transacción en READ COMMITTED: ve lo confirmado
    assert!(detections::get(reader.conn(), &d.key()).expect("other read").is_some());
}

#[test]
fn pending_writes_reach_the_server_without_an_explicit_flush() {
    let Some(factory) = factory() else { return };
    assert!(!SessionOptions::default().autocommit);
    let mut session = factory.session().expect("session");
    let object_id = unique_id();
    let batch: Vec<_> = (0..3).map(|i| detection(object_id, 200 + i)).collect();
    detections::insert_batch(session.conn(), &batch).expect("batch");
    // el recuento agregado ya ve las filas sin confirmar de esta sesión
    assert_eq!(detections::count_for_object(session.conn(), object_id).expect("count"), 3);
    session.rollback().expect("rollback");
    assert_eq!(detections::count_for_object(session.conn(), object_id).expect("count"), 0);
}

#[test]
fn rollback_discards_pending_writes() {
    let Some(factory) = factory() else { return };
    let mut session = factory.session().expect("session");
    let project = projects::create_project(session.conn(), &NewProject::default()).expect("project");
    session.rollback().expect("rollback");
    assert!(projects::get_project(session.conn(), project.project_id).expect("get").is_none());
}

#[test]
fn dropping_a_session_rolls_back() {
    let Some(factory) = factory() else { return };
    let d = detection(unique_id(), 200);
    {
        let mut session = factory.session().expect("session");
        detections::insert(session.conn(), &d).expect("insert");
    }
    let mut check = factory.session().expect("check");
    assert!(detections::get(check.conn(), &d.key()).expect("get").is_none());

    let mut closing = factory.session().expect("closing");
    detections::insert(closing.conn(), &d).expect("insert");
    closing.close().expect("close");
    assert!(detections::get(check.conn(), &d.key()).expect("get").is_none());
}

#[test]
fn autocommit_sessions_publish_each_statement() {
    let Some(factory) = factory() else { return };
    let factory = factory.with_defaults(SessionOptions { autocommit: true });
    let mut writer = factory.session().expect("writer");
    assert!(!writer.in_transaction());
    let mut reader = factory.session_with(SessionOptions::default()).expect("reader");
    assert!(!reader.options().autocommit);

    let d = detection(unique_id(), 300);
    detections::insert(writer.conn(), &d).expect("insert");
    assert!(detections::get(reader.conn(), &d.key()).expect("read").is_some());
    // sin efecto en autocommit
    writer.commit().expect("commit");
    writer.rollback().expect("rollback");
    assert!(!writer.in_transaction());
}

#[test]
fn failed_statement_requires_rollback_before_reuse() {
    let Some(factory) = factory() else { return };
    let mut session = factory.session().expect("session");
    let d = detection(unique_id(), 400);
    detections::insert(session.conn(), &d).expect("insert");
    assert!(detections::insert(session.conn(), &d).is_err());
    session.rollback().expect("rollback");
    assert!(detections::get(session.conn(), &d.key()).expect("get after rollback").is_none());
    detections::insert(session.conn(), &d).expect("insert after rollback");
    session.commit().expect("commit");
}
