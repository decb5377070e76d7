use api::auth::generate_jwt;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use chrono::{NaiveDate, NaiveTime};
use db::models::{
    course,
    event::{self, CourseSection, EventInput},
    section, student,
    student::StudentInput,
    user::{self, Registration, Role},
};
use db::test_utils::setup_test_db;
use sea_orm::DatabaseConnection;
use serde_json::Value;
use tower::ServiceExt;
use util::{config::AppConfig, state::AppState};

pub const TEST_JWT_SECRET: &str = "integration-test-secret";
pub const STUDENT_PASSWORD: &str = "student-pass-123";

pub struct TestApp {
    pub router: Router,
    pub db: DatabaseConnection,
}

/// Fresh in-memory database behind the full application router.
pub async fn make_test_app() -> TestApp {
    AppConfig::set_jwt_secret(TEST_JWT_SECRET);
    let db = setup_test_db().await;
    let router = api::app(AppState::new(db.clone()));
    TestApp { router, db }
}

impl TestApp {
    /// Sends one request and returns the status with the parsed JSON body.
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let req = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    pub async fn admin_token(&self) -> String {
        let admin = user::Model::create(&self.db, "admin@test.com", "admin-pass-123", Role::Admin, None)
            .await
            .unwrap();
        generate_jwt(admin.id).unwrap().0
    }

    pub async fn course_with_sections(&self, name: &str, sections: &[&str]) -> (course::Model, Vec<section::Model>) {
        let course = course::Model::create(&self.db, name, None).await.unwrap();
        let mut created = Vec::new();
        for s in sections {
            created.push(section::Model::create(&self.db, course.id, s).await.unwrap());
        }
        (course, created)
    }

    pub async fn pre_register(&self, student_id: &str, course_id: i64, section_id: i64) -> student::Model {
        student::Model::create(
            &self.db,
            StudentInput {
                student_id: student_id.into(),
                name: format!("Student {student_id}"),
                course_id,
                section_id,
            },
        )
        .await
        .unwrap()
    }

    /// Pre-registers and registers a student, returning the record and a bearer token.
    pub async fn student_with_token(
        &self,
        student_id: &str,
        course_id: i64,
        section_id: i64,
    ) -> (student::Model, String) {
        self.pre_register(student_id, course_id, section_id).await;
        let (account, student) = user::Model::register(
            &self.db,
            Registration {
                student_id: student_id.into(),
                email: format!("{}@test.com", student_id.to_lowercase()),
                password: STUDENT_PASSWORD.into(),
                age: None,
                birthday: None,
                profile_picture: None,
            },
        )
        .await
        .unwrap();
        (student, generate_jwt(account.id).unwrap().0)
    }

    pub async fn event_for(&self, name: &str, pairs: &[(i64, i64)], is_active: bool) -> event::Model {
        event::Model::create(
            &self.db,
            EventInput {
                name: name.into(),
                description: None,
                date: NaiveDate::from_ymd_opt(2025, 10, 1).unwrap(),
                time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                is_active,
                associations: pairs
                    .iter()
                    .map(|&(course_id, section_id)| CourseSection {
                        course_id,
                        section_id,
                    })
                    .collect(),
            },
        )
        .await
        .unwrap()
        .event
    }
}
