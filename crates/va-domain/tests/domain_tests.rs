use chrono::{Duration, TimeZone, Utc};
use va_domain::{BoundingPolygon, CameraTimestampRange, Detection, NewProject, Project, UniqueObject};

#[test]
fn test_default_expiration_is_five_days_after_creation() {
    let created = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    let expected = Utc.with_ymd_and_hms(2024, 3, 6, 12, 0, 0).unwrap();
    assert_eq!(Project::default_expiration(created), expected);
}

#[test]
fn test_project_expiry_check() {
    let now = Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap();
    let mut p = Project { project_id: 1,
                          case_title: None,
                          progress: Some(0.0),
                          objects_found: Some(0),
                          video_jobs_count: Some(0),
                          deletion_status: Some("-".into()),
                          status: Some("in_progress".into()),
                          created_at: None,
                          expiration_time: None };
    assert!(!p.is_expired(now));
    p.expiration_time = Some(now - Duration::seconds(1));
    assert!(p.is_expired(now));
}

#[test]
fn test_new_project_builder() {
    let p = NewProject::with_id(7).titled("robo en bodega");
    assert_eq!(p.project_id, Some(7));
    assert_eq!(p.case_title.as_deref(), Some("robo en bodega"));
    assert_eq!(NewProject::default().project_id, None);
}

#[test]
fn test_camera_range_cover_is_inclusive() {
    let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap();
    let t1 = t0 + Duration::hours(2);
    let r = CameraTimestampRange { project_id: 1, camera_id: 10, timestamp_from: t0, timestamp_to: t1 };
    assert!(r.covers(t0));
    assert!(r.covers(t1));
    assert!(!r.covers(t1 + Duration::seconds(1)));
    assert_eq!(r.camera().camera_id, 10);
}

#[test]
fn test_detection_serializes_bbox_as_wkt() {
    let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let d = Detection::new(42, ts, BoundingPolygon::rectangle(1.0, 2.0, 3.0, 4.0).unwrap()).with_frame(9)
                                                                                        .with_confidence(0.87);
    let json = serde_json::to_value(&d).unwrap();
    assert_eq!(json["bbox"], "POLYGON((1 2,3 2,3 4,1 4,1 2))");
    let back: Detection = serde_json::from_value(json).unwrap();
    assert_eq!(back, d);
    assert_eq!(back.key().object_id, 42);
}

#[test]
fn test_detection_rejects_invalid_wkt_on_deserialize() {
    let json = serde_json::json!({
        "object_id": 1,
        "timestamp": "2024-01-01T00:00:00Z",
        "frame_idx": null,
        "bbox": "LINESTRING(0 0,1 1)",
        "confidence": null
    });
    assert!(serde_json::from_value::<Detection>(json).is_err());
}

#[test]
fn test_unique_object_key() {
    let o = UniqueObject::new(5, 3);
    assert_eq!(o.key().object_id, 5);
    assert_eq!(o.key().project_id, 3);
    assert!(o.image_uri.is_none());
}
