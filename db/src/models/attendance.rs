use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseConnection, DbErr, QueryOrder, Set, SqlErr,
};
use serde::Serialize;

use crate::models::{event, student, system_settings};

/// One student's presence at one event. At most one row per (event, student).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "attendance")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub event_id: i64,
    /// Internal student id, not the human-assigned one.
    pub student_id: i64,
    pub time_in: Option<DateTime<Utc>>,
    /// Written once. A row with `time_out` set never changes again.
    pub time_out: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::event::Entity",
        from = "Column::EventId",
        to = "super::event::Column::Id"
    )]
    Event,
    #[sea_orm(
        belongs_to = "super::student::Entity",
        from = "Column::StudentId",
        to = "super::student::Column::Id"
    )]
    Student,
}

impl Related<super::event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Event.def()
    }
}

impl Related<super::student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Where a check-in left the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckInState {
    In,
    Out,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckInOutcome {
    pub state: CheckInState,
    pub record: Model,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AttendanceWithStudent {
    pub attendance: Model,
    pub student: student::Model,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AttendanceWithEvent {
    pub attendance: Model,
    pub event: event::Model,
}

/// Per-student attendance figures.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StudentStats {
    pub visible_events: u64,
    pub checked_in: u64,
    pub completed: u64,
    /// `checked_in / visible_events`, or 0 when nothing is visible.
    pub attendance_rate: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum CheckInError {
    #[error("Attendance already completed for this event")]
    AlreadyComplete,

    #[error("Event {0} not found")]
    EventNotFound(i64),

    #[error("Student {0} not found")]
    UnknownStudentId(String),

    #[error("Event is not active")]
    EventInactive,

    #[error("Student is not eligible for this event")]
    NotEligible,

    #[error("Invalid QR code")]
    InvalidQrCode,

    #[error("QR code has expired, scan the current one")]
    StaleQrCode,

    #[error("QR code check-in is disabled")]
    QrDisabled,

    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl Model {
    pub async fn find<C: ConnectionTrait>(
        db: &C,
        event_id: i64,
        student_id: i64,
    ) -> Result<Option<Self>, DbErr> {
        Entity::find()
            .filter(Column::EventId.eq(event_id))
            .filter(Column::StudentId.eq(student_id))
            .one(db)
            .await
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        event_id: i64,
        student_id: i64,
        time_in: DateTime<Utc>,
    ) -> Result<Self, DbErr> {
        ActiveModel {
            event_id: Set(event_id),
            student_id: Set(student_id),
            time_in: Set(Some(time_in)),
            time_out: Set(None),
            ..Default::default()
        }
        .insert(db)
        .await
    }

    /// Sets `time_out` only if it is still unset.
    ///
    /// Returns `None` when another writer closed the record first.
    pub async fn close<C: ConnectionTrait>(
        self,
        db: &C,
        time_out: DateTime<Utc>,
    ) -> Result<Option<Self>, DbErr> {
        let res = Entity::update_many()
            .col_expr(Column::TimeOut, Expr::value(time_out))
            .filter(Column::Id.eq(self.id))
            .filter(Column::TimeOut.is_null())
            .exec(db)
            .await?;

        Ok((res.rows_affected == 1).then(|| Self {
            time_out: Some(time_out),
            ..self
        }))
    }

    /// Advances the (event, student) record one step: absent to in, in to out.
    ///
    /// A concurrent first check-in that loses the insert race falls through to the
    /// update branch once.
    pub async fn check_in<C: ConnectionTrait>(
        db: &C,
        event_id: i64,
        student_id: i64,
    ) -> Result<CheckInOutcome, CheckInError> {
        let now = Utc::now();

        let existing = match Self::find(db, event_id, student_id).await? {
            Some(record) => record,
            None => match Self::create(db, event_id, student_id, now).await {
                Ok(record) => {
                    tracing::info!(event_id, student_id, "Checked in");
                    return Ok(CheckInOutcome {
                        state: CheckInState::In,
                        record,
                    });
                }
                Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                    tracing::debug!(event_id, student_id, "Lost first check-in race, retrying as update");
                    Self::find(db, event_id, student_id)
                        .await?
                        .ok_or(CheckInError::Database(err))?
                }
                Err(err) => return Err(err.into()),
            },
        };

        if existing.time_out.is_some() {
            return Err(CheckInError::AlreadyComplete);
        }
        let record = existing
            .close(db, now)
            .await?
            .ok_or(CheckInError::AlreadyComplete)?;

        tracing::info!(event_id, student_id, "Checked out");
        Ok(CheckInOutcome {
            state: CheckInState::Out,
            record,
        })
    }

    /// Student path. The event comes from the payload, the student from the session.
    pub async fn check_in_by_qr(
        db: &DatabaseConnection,
        raw_payload: &str,
        student: &student::Model,
    ) -> Result<CheckInOutcome, CheckInError> {
        if !system_settings::Model::qr_enabled(db).await? {
            return Err(CheckInError::QrDisabled);
        }

        let payload = event::QrPayload::decode(raw_payload).ok_or(CheckInError::InvalidQrCode)?;
        let event = event::Model::find(db, payload.event_id)
            .await?
            .ok_or(CheckInError::EventNotFound(payload.event_id))?;
        if event.qr_payload != raw_payload.trim() {
            return Err(CheckInError::StaleQrCode);
        }

        Self::admit(db, &event, student).await
    }

    /// Admin path: a human-assigned student id and an event id.
    pub async fn check_in_manual(
        db: &DatabaseConnection,
        human_student_id: &str,
        event_id: i64,
    ) -> Result<CheckInOutcome, CheckInError> {
        let student = student::Model::find_by_human_id(db, human_student_id)
            .await?
            .ok_or_else(|| CheckInError::UnknownStudentId(human_student_id.trim().to_owned()))?;
        let event = event::Model::find(db, event_id)
            .await?
            .ok_or(CheckInError::EventNotFound(event_id))?;

        Self::admit(db, &event, &student).await
    }

    async fn admit(
        db: &DatabaseConnection,
        event: &event::Model,
        student: &student::Model,
    ) -> Result<CheckInOutcome, CheckInError> {
        if !event.is_active {
            return Err(CheckInError::EventInactive);
        }
        if !event::Model::is_visible_to(db, event.id, student).await? {
            return Err(CheckInError::NotEligible);
        }
        Self::check_in(db, event.id, student.id).await
    }

    /// Roster of an event in arrival order.
    pub async fn roster(
        db: &DatabaseConnection,
        event_id: i64,
    ) -> Result<Vec<AttendanceWithStudent>, DbErr> {
        let rows = Entity::find()
            .filter(Column::EventId.eq(event_id))
            .find_also_related(student::Entity)
            .order_by_asc(Column::TimeIn)
            .all(db)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(attendance, student)| {
                student.map(|student| AttendanceWithStudent {
                    attendance,
                    student,
                })
            })
            .collect())
    }

    /// A student's attendance history, most recent first.
    pub async fn history(
        db: &DatabaseConnection,
        student_id: i64,
    ) -> Result<Vec<AttendanceWithEvent>, DbErr> {
        let rows = Entity::find()
            .filter(Column::StudentId.eq(student_id))
            .find_also_related(event::Entity)
            .order_by_desc(Column::TimeIn)
            .all(db)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(attendance, event)| {
                event.map(|event| AttendanceWithEvent { attendance, event })
            })
            .collect())
    }

    pub async fn stats_for(
        db: &DatabaseConnection,
        student: &student::Model,
    ) -> Result<StudentStats, DbErr> {
        let visible = event::Model::visible_to(db, student).await?;
        let visible_events = visible.len() as u64;
        let checked_in = visible
            .iter()
            .filter(|e| e.attendance.as_ref().is_some_and(|a| a.time_in.is_some()))
            .count() as u64;
        let completed = visible
            .iter()
            .filter(|e| e.attendance.as_ref().is_some_and(|a| a.time_out.is_some()))
            .count() as u64;

        let attendance_rate = if visible_events == 0 {
            0.0
        } else {
            checked_in as f64 / visible_events as f64
        };

        Ok(StudentStats {
            visible_events,
            checked_in,
            completed,
            attendance_rate,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::event::{CourseSection, EventInput};
    use crate::models::student::StudentInput;
    use crate::models::system_settings::SettingsUpdate;
    use crate::models::{course, section};
    use crate::test_utils::setup_test_db;
    use chrono::{NaiveDate, NaiveTime};

    struct Fixture {
        event: event::Model,
        student: student::Model,
        outsider: student::Model,
    }

    async fn fixture(db: &DatabaseConnection) -> Fixture {
        let cs = course::Model::create(db, "CS", None).await.unwrap();
        let a = section::Model::create(db, cs.id, "A").await.unwrap();
        let b = section::Model::create(db, cs.id, "B").await.unwrap();

        let event = event::Model::create(
            db,
            EventInput {
                name: "Assembly".into(),
                description: None,
                date: NaiveDate::from_ymd_opt(2025, 10, 1).unwrap(),
                time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
                is_active: true,
                associations: vec![CourseSection {
                    course_id: cs.id,
                    section_id: a.id,
                }],
            },
        )
        .await
        .unwrap()
        .event;

        let enroll = |id: &str, section_id| StudentInput {
            student_id: id.into(),
            name: format!("Student {id}"),
            course_id: cs.id,
            section_id,
        };
        let student = student::Model::create(db, enroll("S1", a.id)).await.unwrap();
        let outsider = student::Model::create(db, enroll("S2", b.id)).await.unwrap();

        Fixture {
            event,
            student,
            outsider,
        }
    }

    #[tokio::test]
    async fn three_step_state_machine() {
        let db = setup_test_db().await;
        let f = fixture(&db).await;

        let first = Model::check_in(&db, f.event.id, f.student.id).await.unwrap();
        assert_eq!(first.state, CheckInState::In);
        assert!(first.record.time_in.is_some());
        assert!(first.record.time_out.is_none());

        let second = Model::check_in(&db, f.event.id, f.student.id).await.unwrap();
        assert_eq!(second.state, CheckInState::Out);
        assert_eq!(second.record.id, first.record.id);
        assert_eq!(second.record.time_in, first.record.time_in);
        assert!(second.record.time_out.is_some());

        let third = Model::check_in(&db, f.event.id, f.student.id).await.unwrap_err();
        assert!(matches!(third, CheckInError::AlreadyComplete));

        let stored = Model::find(&db, f.event.id, f.student.id).await.unwrap().unwrap();
        assert_eq!(stored.time_out, second.record.time_out);
    }

    #[tokio::test]
    async fn concurrent_first_check_ins_produce_one_row() {
        let db = setup_test_db().await;
        let f = fixture(&db).await;

        let (a, b) = tokio::join!(
            Model::check_in(&db, f.event.id, f.student.id),
            Model::check_in(&db, f.event.id, f.student.id),
        );
        let mut states = vec![a.unwrap().state, b.unwrap().state];
        states.sort();
        assert_eq!(states, vec![CheckInState::In, CheckInState::Out]);

        let rows = Entity::find()
            .filter(Column::EventId.eq(f.event.id))
            .all(&db)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn close_only_writes_once() {
        let db = setup_test_db().await;
        let f = fixture(&db).await;
        let record = Model::create(&db, f.event.id, f.student.id, Utc::now()).await.unwrap();

        assert!(record.clone().close(&db, Utc::now()).await.unwrap().is_some());
        assert!(record.close(&db, Utc::now()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn qr_path_uses_current_payload_only() {
        let db = setup_test_db().await;
        let f = fixture(&db).await;
        let old = f.event.qr_payload.clone();

        let out = Model::check_in_by_qr(&db, &old, &f.student).await.unwrap();
        assert_eq!(out.state, CheckInState::In);

        let event = f.event.regenerate_qr(&db).await.unwrap();
        let err = Model::check_in_by_qr(&db, &old, &f.student).await.unwrap_err();
        assert!(matches!(err, CheckInError::StaleQrCode));

        // The earlier row survives regeneration and the new code advances it.
        let out = Model::check_in_by_qr(&db, &event.qr_payload, &f.student).await.unwrap();
        assert_eq!(out.state, CheckInState::Out);
    }

    #[tokio::test]
    async fn qr_path_rejects_garbage_and_outsiders() {
        let db = setup_test_db().await;
        let f = fixture(&db).await;

        let err = Model::check_in_by_qr(&db, "garbage", &f.student).await.unwrap_err();
        assert!(matches!(err, CheckInError::InvalidQrCode));

        let err = Model::check_in_by_qr(&db, &f.event.qr_payload, &f.outsider)
            .await
            .unwrap_err();
        assert!(matches!(err, CheckInError::NotEligible));
    }

    #[tokio::test]
    async fn qr_switch_blocks_only_the_qr_path() {
        let db = setup_test_db().await;
        let f = fixture(&db).await;
        system_settings::Model::upsert(
            &db,
            SettingsUpdate {
                system_name: None,
                qr_code_enabled: Some(false),
            },
        )
        .await
        .unwrap();

        let err = Model::check_in_by_qr(&db, &f.event.qr_payload, &f.student)
            .await
            .unwrap_err();
        assert!(matches!(err, CheckInError::QrDisabled));

        let out = Model::check_in_manual(&db, "S1", f.event.id).await.unwrap();
        assert_eq!(out.state, CheckInState::In);
    }

    #[tokio::test]
    async fn manual_path_resolves_human_ids() {
        let db = setup_test_db().await;
        let f = fixture(&db).await;

        let err = Model::check_in_manual(&db, "nobody", f.event.id).await.unwrap_err();
        assert!(matches!(err, CheckInError::UnknownStudentId(id) if id == "nobody"));

        let err = Model::check_in_manual(&db, "S1", 9999).await.unwrap_err();
        assert!(matches!(err, CheckInError::EventNotFound(9999)));

        let out = Model::check_in_manual(&db, " S1 ", f.event.id).await.unwrap();
        assert_eq!(out.record.student_id, f.student.id);
    }

    #[tokio::test]
    async fn inactive_events_refuse_check_in() {
        let db = setup_test_db().await;
        let f = fixture(&db).await;
        let event_id = f.event.id;
        let input = EventInput {
            name: f.event.name.clone(),
            description: None,
            date: f.event.date,
            time: f.event.time,
            is_active: false,
            associations: event_course_section_pairs(&db, event_id).await,
        };
        f.event.update(&db, input).await.unwrap();

        let err = Model::check_in_manual(&db, "S1", event_id).await.unwrap_err();
        assert!(matches!(err, CheckInError::EventInactive));
    }

    async fn event_course_section_pairs(db: &DatabaseConnection, event_id: i64) -> Vec<CourseSection> {
        crate::models::event_course_section::Model::find_event_associations(db, event_id)
            .await
            .unwrap()
            .into_iter()
            .map(|a| CourseSection {
                course_id: a.course_id,
                section_id: a.section_id,
            })
            .collect()
    }

    #[tokio::test]
    async fn roster_history_and_stats() {
        let db = setup_test_db().await;
        let f = fixture(&db).await;
        Model::check_in(&db, f.event.id, f.student.id).await.unwrap();

        let roster = Model::roster(&db, f.event.id).await.unwrap();
        assert_eq!(roster.len(), 1);
        assert_eq!(roster[0].student.student_id, "S1");

        let history = Model::history(&db, f.student.id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].event.id, f.event.id);

        let stats = Model::stats_for(&db, &f.student).await.unwrap();
        assert_eq!(stats.visible_events, 1);
        assert_eq!(stats.checked_in, 1);
        assert_eq!(stats.completed, 0);
        assert!((stats.attendance_rate - 1.0).abs() < f64::EPSILON);

        let outsider = Model::stats_for(&db, &f.outsider).await.unwrap();
        assert_eq!(outsider.visible_events, 0);
        assert_eq!(outsider.attendance_rate, 0.0);
    }
}
