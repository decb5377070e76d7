use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseConnection, DbErr, IntoActiveModel, JoinType,
    QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::{attendance, course, event_course_section, section, student};

/// An attendable event. Visibility is decided by its course/section associations.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "events")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub time: NaiveTime,
    /// Current opaque check-in payload. See [`QrPayload`].
    pub qr_payload: String,
    /// `data:` URL of the rendered payload.
    pub qr_image: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::event_course_section::Entity")]
    Associations,
    #[sea_orm(has_many = "super::attendance::Entity")]
    Attendance,
}

impl Related<super::event_course_section::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Associations.def()
    }
}

impl Related<super::attendance::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Attendance.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// What a check-in QR code carries.
///
/// Serialized as URL-safe base64 over JSON. `issued_at` is in microseconds and strictly
/// increases on every regeneration, so a regenerated payload never equals an older one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QrPayload {
    pub event_id: i64,
    pub issued_at: i64,
}

impl QrPayload {
    /// A fresh payload for `event_id`, ordered after `previous` if one decodes.
    pub fn issue(event_id: i64, previous: Option<&str>) -> Self {
        let now = Utc::now().timestamp_micros();
        let floor = previous
            .and_then(Self::decode)
            .map(|p| p.issued_at + 1)
            .unwrap_or(i64::MIN);
        Self {
            event_id,
            issued_at: now.max(floor),
        }
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        Ok(URL_SAFE_NO_PAD.encode(serde_json::to_vec(self)?))
    }

    /// `None` for anything that is not a payload this system produced.
    pub fn decode(raw: &str) -> Option<Self> {
        let bytes = URL_SAFE_NO_PAD.decode(raw.trim()).ok()?;
        serde_json::from_slice(&bytes).ok()
    }
}

/// A (course, section) pair an event is opened to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CourseSection {
    pub course_id: i64,
    pub section_id: i64,
}

#[derive(Debug, Clone)]
pub struct EventInput {
    pub name: String,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub is_active: bool,
    pub associations: Vec<CourseSection>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EventWithAssociations {
    pub event: Model,
    pub associations: Vec<event_course_section::Model>,
}

/// An event as seen by one student, with that student's attendance row if any.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EventWithAttendance {
    pub event: Model,
    pub attendance: Option<attendance::Model>,
}

#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("Course {0} not found")]
    UnknownCourse(i64),

    #[error("Section {section_id} does not belong to course {course_id}")]
    SectionNotInCourse { course_id: i64, section_id: i64 },

    #[error("Failed to render QR code: {0}")]
    Qr(#[from] util::qr::QrError),

    #[error("Failed to serialize QR payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

async fn check_pairs<C: ConnectionTrait>(db: &C, pairs: &[CourseSection]) -> Result<(), EventError> {
    for pair in pairs {
        if course::Entity::find_by_id(pair.course_id).one(db).await?.is_none() {
            return Err(EventError::UnknownCourse(pair.course_id));
        }
        if section::Model::find_in_course(db, pair.course_id, pair.section_id)
            .await?
            .is_none()
        {
            return Err(EventError::SectionNotInCourse {
                course_id: pair.course_id,
                section_id: pair.section_id,
            });
        }
    }
    Ok(())
}

fn as_tuples(pairs: &[CourseSection]) -> Vec<(i64, i64)> {
    pairs.iter().map(|p| (p.course_id, p.section_id)).collect()
}

impl Model {
    /// Creates the event, its first QR code and its associations in one transaction.
    pub async fn create(
        db: &DatabaseConnection,
        input: EventInput,
    ) -> Result<EventWithAssociations, EventError> {
        let txn = db.begin().await?;
        check_pairs(&txn, &input.associations).await?;

        let now = Utc::now();
        // The payload embeds the id, so the row goes in first and the code second.
        let event = ActiveModel {
            name: Set(input.name.trim().to_owned()),
            description: Set(input.description),
            date: Set(input.date),
            time: Set(input.time),
            qr_payload: Set(String::new()),
            qr_image: Set(String::new()),
            is_active: Set(input.is_active),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let event = event.issue_qr(&txn).await?;
        let associations = event_course_section::Model::replace_for_event(
            &txn,
            event.id,
            &as_tuples(&input.associations),
        )
        .await?;

        txn.commit().await?;
        tracing::info!(event_id = event.id, pairs = associations.len(), "Event created");
        Ok(EventWithAssociations { event, associations })
    }

    /// Rewrites the event's fields and swaps its association set atomically.
    ///
    /// The QR payload is left alone; use [`Model::regenerate_qr`] for that.
    pub async fn update(
        self,
        db: &DatabaseConnection,
        input: EventInput,
    ) -> Result<EventWithAssociations, EventError> {
        let txn = db.begin().await?;
        check_pairs(&txn, &input.associations).await?;

        let mut active = self.into_active_model();
        active.name = Set(input.name.trim().to_owned());
        active.description = Set(input.description);
        active.date = Set(input.date);
        active.time = Set(input.time);
        active.is_active = Set(input.is_active);
        active.updated_at = Set(Utc::now());
        let event = active.update(&txn).await?;

        let associations = event_course_section::Model::replace_for_event(
            &txn,
            event.id,
            &as_tuples(&input.associations),
        )
        .await?;

        txn.commit().await?;
        Ok(EventWithAssociations { event, associations })
    }

    /// Issues a new payload and image. Existing attendance rows are untouched; the old
    /// payload stops working for new check-ins.
    pub async fn regenerate_qr(self, db: &DatabaseConnection) -> Result<Self, EventError> {
        let event = self.issue_qr(db).await?;
        tracing::info!(event_id = event.id, "QR code regenerated");
        Ok(event)
    }

    async fn issue_qr<C: ConnectionTrait>(self, db: &C) -> Result<Self, EventError> {
        let payload = QrPayload::issue(self.id, Some(&self.qr_payload)).encode()?;
        let image = util::qr::render_data_url(&payload)?;

        let mut active = self.into_active_model();
        active.qr_payload = Set(payload);
        active.qr_image = Set(image);
        active.updated_at = Set(Utc::now());
        Ok(active.update(db).await?)
    }

    pub async fn find<C: ConnectionTrait>(db: &C, id: i64) -> Result<Option<Self>, DbErr> {
        Entity::find_by_id(id).one(db).await
    }

    pub async fn find_with_associations(
        db: &DatabaseConnection,
        id: i64,
    ) -> Result<Option<EventWithAssociations>, DbErr> {
        let Some(event) = Self::find(db, id).await? else {
            return Ok(None);
        };
        let associations = event_course_section::Model::find_event_associations(db, id).await?;
        Ok(Some(EventWithAssociations { event, associations }))
    }

    /// All events, newest first.
    pub async fn list(db: &DatabaseConnection) -> Result<Vec<Self>, DbErr> {
        Entity::find()
            .order_by_desc(Column::Date)
            .order_by_desc(Column::Time)
            .order_by_desc(Column::Id)
            .all(db)
            .await
    }

    pub async fn delete_by_id(db: &DatabaseConnection, id: i64) -> Result<bool, DbErr> {
        let res = Entity::delete_by_id(id).exec(db).await?;
        Ok(res.rows_affected > 0)
    }

    /// Events a student may see: those associated with the student's exact
    /// (course, section). `is_active` plays no part.
    pub async fn visible_to(
        db: &DatabaseConnection,
        student: &student::Model,
    ) -> Result<Vec<EventWithAttendance>, DbErr> {
        let events = Entity::find()
            .join(JoinType::InnerJoin, Relation::Associations.def())
            .filter(event_course_section::Column::CourseId.eq(student.course_id))
            .filter(event_course_section::Column::SectionId.eq(student.section_id))
            .distinct()
            .order_by_desc(Column::Date)
            .order_by_desc(Column::Time)
            .order_by_desc(Column::Id)
            .all(db)
            .await?;

        if events.is_empty() {
            return Ok(Vec::new());
        }

        let mut records: HashMap<i64, attendance::Model> = attendance::Entity::find()
            .filter(attendance::Column::StudentId.eq(student.id))
            .filter(attendance::Column::EventId.is_in(events.iter().map(|e| e.id)))
            .all(db)
            .await?
            .into_iter()
            .map(|a| (a.event_id, a))
            .collect();

        Ok(events
            .into_iter()
            .map(|event| {
                let attendance = records.remove(&event.id);
                EventWithAttendance { event, attendance }
            })
            .collect())
    }

    /// Whether `student` is in one of the event's (course, section) pairs.
    pub async fn is_visible_to<C: ConnectionTrait>(
        db: &C,
        event_id: i64,
        student: &student::Model,
    ) -> Result<bool, DbErr> {
        let hit = event_course_section::Entity::find()
            .filter(event_course_section::Column::EventId.eq(event_id))
            .filter(event_course_section::Column::CourseId.eq(student.course_id))
            .filter(event_course_section::Column::SectionId.eq(student.section_id))
            .one(db)
            .await?;
        Ok(hit.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::student::StudentInput;
    use crate::test_utils::setup_test_db;

    struct Fixture {
        cs: course::Model,
        a: section::Model,
        b: section::Model,
        it: course::Model,
        it_a: section::Model,
    }

    async fn fixture(db: &DatabaseConnection) -> Fixture {
        let cs = course::Model::create(db, "CS", None).await.unwrap();
        let a = section::Model::create(db, cs.id, "A").await.unwrap();
        let b = section::Model::create(db, cs.id, "B").await.unwrap();
        let it = course::Model::create(db, "IT", None).await.unwrap();
        let it_a = section::Model::create(db, it.id, "A").await.unwrap();
        Fixture { cs, a, b, it, it_a }
    }

    async fn enroll(db: &DatabaseConnection, id: &str, course_id: i64, section_id: i64) -> student::Model {
        student::Model::create(
            db,
            StudentInput {
                student_id: id.into(),
                name: format!("Student {id}"),
                course_id,
                section_id,
            },
        )
        .await
        .unwrap()
    }

    fn input(name: &str, pairs: Vec<CourseSection>) -> EventInput {
        EventInput {
            name: name.into(),
            description: None,
            date: NaiveDate::from_ymd_opt(2025, 10, 1).unwrap(),
            time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            is_active: true,
            associations: pairs,
        }
    }

    fn pair(course_id: i64, section_id: i64) -> CourseSection {
        CourseSection {
            course_id,
            section_id,
        }
    }

    #[tokio::test]
    async fn create_issues_a_decodable_qr_code() {
        let db = setup_test_db().await;
        let f = fixture(&db).await;

        let created = Model::create(&db, input("Orientation", vec![pair(f.cs.id, f.a.id)]))
            .await
            .unwrap();

        let payload = QrPayload::decode(&created.event.qr_payload).unwrap();
        assert_eq!(payload.event_id, created.event.id);
        assert!(created.event.qr_image.starts_with("data:image/svg+xml;base64,"));
        assert_eq!(created.associations.len(), 1);
    }

    #[tokio::test]
    async fn regenerating_changes_the_payload() {
        let db = setup_test_db().await;
        let f = fixture(&db).await;
        let created = Model::create(&db, input("Orientation", vec![pair(f.cs.id, f.a.id)]))
            .await
            .unwrap();
        let old = created.event.qr_payload.clone();

        let regenerated = created.event.regenerate_qr(&db).await.unwrap();
        assert_ne!(regenerated.qr_payload, old);

        let before = QrPayload::decode(&old).unwrap();
        let after = QrPayload::decode(&regenerated.qr_payload).unwrap();
        assert_eq!(after.event_id, before.event_id);
        assert!(after.issued_at > before.issued_at);
    }

    #[test]
    fn garbage_payloads_do_not_decode() {
        assert!(QrPayload::decode("not base64 !!").is_none());
        assert!(QrPayload::decode(&URL_SAFE_NO_PAD.encode(b"{\"foo\":1}")).is_none());
    }

    #[tokio::test]
    async fn visibility_requires_exact_course_and_section() {
        let db = setup_test_db().await;
        let f = fixture(&db).await;
        let e = Model::create(&db, input("E", vec![pair(f.cs.id, f.a.id)]))
            .await
            .unwrap()
            .event;

        let s1 = enroll(&db, "S1", f.cs.id, f.a.id).await;
        let s2 = enroll(&db, "S2", f.cs.id, f.b.id).await;
        let s3 = enroll(&db, "S3", f.it.id, f.it_a.id).await;

        let seen = Model::visible_to(&db, &s1).await.unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].event.id, e.id);
        assert!(seen[0].attendance.is_none());

        assert!(Model::visible_to(&db, &s2).await.unwrap().is_empty());
        assert!(Model::visible_to(&db, &s3).await.unwrap().is_empty());
        assert!(Model::is_visible_to(&db, e.id, &s1).await.unwrap());
        assert!(!Model::is_visible_to(&db, e.id, &s2).await.unwrap());
    }

    #[tokio::test]
    async fn events_without_associations_are_invisible() {
        let db = setup_test_db().await;
        let f = fixture(&db).await;
        Model::create(&db, input("Nobody", vec![])).await.unwrap();
        let s = enroll(&db, "S1", f.cs.id, f.a.id).await;

        assert!(Model::visible_to(&db, &s).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn visibility_ignores_is_active() {
        let db = setup_test_db().await;
        let f = fixture(&db).await;
        let mut inactive = input("Closed", vec![pair(f.cs.id, f.a.id)]);
        inactive.is_active = false;
        Model::create(&db, inactive).await.unwrap();
        let s = enroll(&db, "S1", f.cs.id, f.a.id).await;

        assert_eq!(Model::visible_to(&db, &s).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn mismatched_pair_rolls_back_the_whole_create() {
        let db = setup_test_db().await;
        let f = fixture(&db).await;

        let err = Model::create(
            &db,
            input("Broken", vec![pair(f.cs.id, f.a.id), pair(f.cs.id, f.it_a.id)]),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, EventError::SectionNotInCourse { .. }));
        assert!(Model::list(&db).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_replaces_associations() {
        let db = setup_test_db().await;
        let f = fixture(&db).await;
        let created = Model::create(&db, input("E", vec![pair(f.cs.id, f.a.id)]))
            .await
            .unwrap();
        let payload = created.event.qr_payload.clone();

        let updated = created
            .event
            .update(&db, input("E2", vec![pair(f.cs.id, f.b.id), pair(f.cs.id, f.b.id)]))
            .await
            .unwrap();

        assert_eq!(updated.event.name, "E2");
        assert_eq!(updated.event.qr_payload, payload);
        assert_eq!(updated.associations.len(), 1);
        assert_eq!(updated.associations[0].section_id, f.b.id);

        let a_student = enroll(&db, "S1", f.cs.id, f.a.id).await;
        assert!(Model::visible_to(&db, &a_student).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_update_keeps_old_associations() {
        let db = setup_test_db().await;
        let f = fixture(&db).await;
        let created = Model::create(&db, input("E", vec![pair(f.cs.id, f.a.id)]))
            .await
            .unwrap();
        let id = created.event.id;

        let err = created
            .event
            .update(&db, input("E2", vec![pair(9999, f.a.id)]))
            .await
            .unwrap_err();
        assert!(matches!(err, EventError::UnknownCourse(9999)));

        let reloaded = Model::find_with_associations(&db, id).await.unwrap().unwrap();
        assert_eq!(reloaded.event.name, "E");
        assert_eq!(reloaded.associations.len(), 1);
    }
}
