mod helpers;

use axum::http::StatusCode;
use helpers::make_test_app;
use serde_json::json;

#[tokio::test]
async fn register_then_login_as_pre_registered_student() {
    let app = make_test_app().await;
    let (cs, sections) = app.course_with_sections("BSCS", &["A"]).await;
    app.pre_register("2024-0001", cs.id, sections[0].id).await;

    let (status, json) = app
        .send(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({
                "student_id": "2024-0001",
                "email": "Ada@Example.com",
                "password": "strongpassword",
                "age": 20,
                "birthday": "2004-12-10"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["email"], "ada@example.com");
    assert_eq!(json["data"]["role"], "student");
    assert_eq!(json["data"]["student_id"], "2024-0001");
    assert!(json["data"]["token"].as_str().is_some());
    assert!(json["data"].get("password_hash").is_none());

    let (status, json) = app
        .send(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": "ada@example.com", "password": "strongpassword" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Login successful");

    let token = json["data"]["token"].as_str().unwrap().to_owned();
    let (status, json) = app.send("GET", "/api/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["student"]["age"], 20);
    assert_eq!(json["data"]["course"]["name"], "BSCS");
    assert_eq!(json["data"]["section"]["name"], "A");
}

#[tokio::test]
async fn register_with_unknown_student_id_is_not_found() {
    let app = make_test_app().await;

    let (status, json) = app
        .send(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({
                "student_id": "ghost",
                "email": "ghost@example.com",
                "password": "strongpassword"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["success"], false);
}

#[tokio::test]
async fn register_with_used_email_is_a_conflict() {
    let app = make_test_app().await;
    let (cs, sections) = app.course_with_sections("BSCS", &["A"]).await;
    app.student_with_token("S1", cs.id, sections[0].id).await;
    app.pre_register("S2", cs.id, sections[0].id).await;

    let (status, json) = app
        .send(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({ "student_id": "S2", "email": "s1@test.com", "password": "strongpassword" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["message"], "A user with this email already exists");
}

#[tokio::test]
async fn register_validates_input() {
    let app = make_test_app().await;

    let (status, json) = app
        .send(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({ "student_id": "S1", "email": "not-an-email", "password": "short" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        json["message"],
        "Invalid email format; Password must be at least 8 characters"
    );
}

#[tokio::test]
async fn wrong_password_and_unknown_email_look_the_same() {
    let app = make_test_app().await;
    let (cs, sections) = app.course_with_sections("BSCS", &["A"]).await;
    app.student_with_token("S1", cs.id, sections[0].id).await;

    let wrong_password = app
        .send(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": "s1@test.com", "password": "not-the-password" })),
        )
        .await;
    let unknown_email = app
        .send(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": "nobody@test.com", "password": "not-the-password" })),
        )
        .await;

    assert_eq!(wrong_password.0, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password, unknown_email);
}
