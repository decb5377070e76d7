mod helpers;

use axum::http::StatusCode;
use db::models::event;
use helpers::make_test_app;
use serde_json::json;

#[tokio::test]
async fn create_event_with_associations() {
    let app = make_test_app().await;
    let admin = app.admin_token().await;
    let (cs, sections) = app.course_with_sections("CS", &["A", "B"]).await;

    let (status, json) = app
        .send(
            "POST",
            "/api/events",
            Some(&admin),
            Some(json!({
                "name": "Orientation",
                "date": "2025-10-01",
                "time": "09:00",
                "associations": [
                    { "course_id": cs.id, "section_id": sections[0].id },
                    { "course_id": cs.id, "section_id": sections[1].id }
                ]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["data"]["event"]["is_active"], true);
    assert_eq!(json["data"]["event"]["time"], "09:00:00");
    assert_eq!(json["data"]["associations"].as_array().unwrap().len(), 2);

    let payload = json["data"]["event"]["qr_payload"].as_str().unwrap();
    let decoded = event::QrPayload::decode(payload).unwrap();
    assert_eq!(json["data"]["event"]["id"], decoded.event_id);
}

#[tokio::test]
async fn section_outside_course_rejects_the_whole_event() {
    let app = make_test_app().await;
    let admin = app.admin_token().await;
    let (cs, cs_sections) = app.course_with_sections("CS", &["A"]).await;
    let (_, it_sections) = app.course_with_sections("IT", &["A"]).await;

    let (status, _) = app
        .send(
            "POST",
            "/api/events",
            Some(&admin),
            Some(json!({
                "name": "Broken",
                "date": "2025-10-01",
                "time": "09:00",
                "associations": [
                    { "course_id": cs.id, "section_id": cs_sections[0].id },
                    { "course_id": cs.id, "section_id": it_sections[0].id }
                ]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, json) = app.send("GET", "/api/events", Some(&admin), None).await;
    assert!(json["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn bad_time_is_a_validation_error() {
    let app = make_test_app().await;
    let admin = app.admin_token().await;

    let (status, json) = app
        .send(
            "POST",
            "/api/events",
            Some(&admin),
            Some(json!({ "name": "E", "date": "2025-10-01", "time": "9 o'clock" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "Time must be HH:MM or HH:MM:SS");
}

#[tokio::test]
async fn students_see_only_events_for_their_exact_section() {
    let app = make_test_app().await;
    let (cs, sections) = app.course_with_sections("CS", &["A", "B"]).await;
    let (_, s1) = app.student_with_token("S1", cs.id, sections[0].id).await;
    let (_, s2) = app.student_with_token("S2", cs.id, sections[1].id).await;
    let event = app.event_for("E", &[(cs.id, sections[0].id)], true).await;

    let (status, json) = app.send("GET", "/api/me/events", Some(&s1), None).await;
    assert_eq!(status, StatusCode::OK);
    let events = json["data"].as_array().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["event"]["id"], event.id);
    assert!(events[0]["attendance"].is_null());

    let (_, json) = app.send("GET", "/api/me/events", Some(&s2), None).await;
    assert!(json["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn moving_a_student_changes_what_they_see() {
    let app = make_test_app().await;
    let admin = app.admin_token().await;
    let (cs, cs_sections) = app.course_with_sections("CS", &["A"]).await;
    let (it, it_sections) = app.course_with_sections("IT", &["A"]).await;
    let (record, token) = app.student_with_token("S1", cs.id, cs_sections[0].id).await;
    app.event_for("E", &[(cs.id, cs_sections[0].id)], true).await;

    let (status, _) = app
        .send(
            "PUT",
            &format!("/api/students/{}", record.id),
            Some(&admin),
            Some(json!({
                "student_id": "S1",
                "name": "Moved",
                "course_id": it.id,
                "section_id": it_sections[0].id
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, json) = app.send("GET", "/api/me/events", Some(&token), None).await;
    assert!(json["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn update_keeps_qr_and_delete_removes_event() {
    let app = make_test_app().await;
    let admin = app.admin_token().await;
    let (cs, sections) = app.course_with_sections("CS", &["A"]).await;
    let event = app.event_for("E", &[(cs.id, sections[0].id)], true).await;

    let (status, json) = app
        .send(
            "PUT",
            &format!("/api/events/{}", event.id),
            Some(&admin),
            Some(json!({
                "name": "Renamed",
                "date": "2025-11-01",
                "time": "10:30:00",
                "is_active": false,
                "associations": []
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["event"]["name"], "Renamed");
    assert_eq!(json["data"]["event"]["qr_payload"], event.qr_payload);
    assert!(json["data"]["associations"].as_array().unwrap().is_empty());

    let (status, _) = app
        .send("DELETE", &format!("/api/events/{}", event.id), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .send("GET", &format!("/api/events/{}", event.id), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
