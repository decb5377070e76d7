mod helpers;

use axum::http::StatusCode;
use db::models::attendance;
use helpers::make_test_app;
use serde_json::json;

#[tokio::test]
async fn qr_check_in_goes_in_then_out_then_conflicts() {
    let app = make_test_app().await;
    let (cs, sections) = app.course_with_sections("CS", &["A"]).await;
    let (student, token) = app.student_with_token("S1", cs.id, sections[0].id).await;
    let event = app.event_for("Assembly", &[(cs.id, sections[0].id)], true).await;
    let body = json!({ "qr_payload": event.qr_payload });

    let (status, json) = app
        .send("POST", "/api/attendance/checkin", Some(&token), Some(body.clone()))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["state"], "in");
    assert!(json["data"]["record"]["time_out"].is_null());
    let time_in = json["data"]["record"]["time_in"].clone();

    let (status, json) = app
        .send("POST", "/api/attendance/checkin", Some(&token), Some(body.clone()))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["state"], "out");
    assert_eq!(json["data"]["record"]["time_in"], time_in);
    assert!(!json["data"]["record"]["time_out"].is_null());

    let (status, json) = app
        .send("POST", "/api/attendance/checkin", Some(&token), Some(body))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["message"], "Attendance already completed for this event");

    let stored = attendance::Model::find(&app.db, event.id, student.id).await.unwrap();
    assert!(stored.unwrap().time_out.is_some());
}

#[tokio::test]
async fn superseded_qr_code_is_refused() {
    let app = make_test_app().await;
    let admin = app.admin_token().await;
    let (cs, sections) = app.course_with_sections("CS", &["A"]).await;
    let (_, token) = app.student_with_token("S1", cs.id, sections[0].id).await;
    let event = app.event_for("Assembly", &[(cs.id, sections[0].id)], true).await;

    let (status, json) = app
        .send("POST", &format!("/api/events/{}/qr", event.id), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let fresh = json["data"]["qr_payload"].as_str().unwrap().to_owned();
    assert_ne!(fresh, event.qr_payload);

    let (status, _) = app
        .send(
            "POST",
            "/api/attendance/checkin",
            Some(&token),
            Some(json!({ "qr_payload": event.qr_payload })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, json) = app
        .send(
            "POST",
            "/api/attendance/checkin",
            Some(&token),
            Some(json!({ "qr_payload": fresh })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["state"], "in");
}

#[tokio::test]
async fn manual_check_in_is_admin_only() {
    let app = make_test_app().await;
    let admin = app.admin_token().await;
    let (cs, sections) = app.course_with_sections("CS", &["A"]).await;
    let (_, token) = app.student_with_token("S1", cs.id, sections[0].id).await;
    let event = app.event_for("Assembly", &[(cs.id, sections[0].id)], true).await;
    let manual = json!({ "student_id": "S1", "event_id": event.id });

    let (status, _) = app
        .send("POST", "/api/attendance/checkin", Some(&token), Some(manual.clone()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, json) = app
        .send("POST", "/api/attendance/checkin", Some(&admin), Some(manual))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["state"], "in");

    let (status, _) = app
        .send(
            "POST",
            "/api/attendance/checkin",
            Some(&admin),
            Some(json!({ "qr_payload": event.qr_payload })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .send(
            "POST",
            "/api/attendance/checkin",
            Some(&admin),
            Some(json!({ "student_id": "nobody", "event_id": event.id })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn students_outside_the_event_scope_cannot_check_in() {
    let app = make_test_app().await;
    let (cs, sections) = app.course_with_sections("CS", &["A", "B"]).await;
    let (_, outsider) = app.student_with_token("S2", cs.id, sections[1].id).await;
    let event = app.event_for("Assembly", &[(cs.id, sections[0].id)], true).await;

    let (status, json) = app
        .send(
            "POST",
            "/api/attendance/checkin",
            Some(&outsider),
            Some(json!({ "qr_payload": event.qr_payload })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["message"], "Student is not eligible for this event");
}

#[tokio::test]
async fn inactive_events_refuse_check_in() {
    let app = make_test_app().await;
    let (cs, sections) = app.course_with_sections("CS", &["A"]).await;
    let (_, token) = app.student_with_token("S1", cs.id, sections[0].id).await;
    let event = app.event_for("Closed", &[(cs.id, sections[0].id)], false).await;

    let (status, json) = app
        .send(
            "POST",
            "/api/attendance/checkin",
            Some(&token),
            Some(json!({ "qr_payload": event.qr_payload })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["message"], "Event is not active");
}

#[tokio::test]
async fn disabling_qr_blocks_scans_but_not_manual_entry() {
    let app = make_test_app().await;
    let admin = app.admin_token().await;
    let (cs, sections) = app.course_with_sections("CS", &["A"]).await;
    let (_, token) = app.student_with_token("S1", cs.id, sections[0].id).await;
    let event = app.event_for("Assembly", &[(cs.id, sections[0].id)], true).await;

    let (status, _) = app
        .send("PUT", "/api/settings", Some(&admin), Some(json!({ "qr_code_enabled": false })))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = app
        .send(
            "POST",
            "/api/attendance/checkin",
            Some(&token),
            Some(json!({ "qr_payload": event.qr_payload })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["message"], "QR code check-in is disabled");

    let (status, _) = app
        .send(
            "POST",
            "/api/attendance/checkin",
            Some(&admin),
            Some(json!({ "student_id": "S1", "event_id": event.id })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn roster_and_history_reflect_check_ins() {
    let app = make_test_app().await;
    let admin = app.admin_token().await;
    let (cs, sections) = app.course_with_sections("CS", &["A"]).await;
    let (_, token) = app.student_with_token("S1", cs.id, sections[0].id).await;
    let event = app.event_for("Assembly", &[(cs.id, sections[0].id)], true).await;

    app.send(
        "POST",
        "/api/attendance/checkin",
        Some(&token),
        Some(json!({ "qr_payload": event.qr_payload })),
    )
    .await;

    let (status, json) = app
        .send("GET", &format!("/api/events/{}/attendance", event.id), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
    assert_eq!(json["data"][0]["student"]["student_id"], "S1");

    let (status, json) = app.send("GET", "/api/me/attendance", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"][0]["event"]["name"], "Assembly");

    let (status, json) = app.send("GET", "/api/me/stats", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["visible_events"], 1);
    assert_eq!(json["data"]["checked_in"], 1);
    assert_eq!(json["data"]["completed"], 0);
}
