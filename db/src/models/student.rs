use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseConnection, DbErr, IntoActiveModel, QueryOrder, Set,
    SqlErr,
};
use serde::Serialize;
use std::collections::HashMap;

use crate::models::{course, section};

/// A student record, pre-registered by an admin and enriched on self-registration.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "students")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Human-assigned identifier printed on the student's card.
    #[sea_orm(unique)]
    pub student_id: String,
    pub name: String,
    pub course_id: i64,
    pub section_id: i64,
    pub age: Option<i32>,
    pub email: Option<String>,
    pub birthday: Option<NaiveDate>,
    /// Opaque reference (URL or storage key) to the profile picture.
    pub profile_picture: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::course::Entity",
        from = "Column::CourseId",
        to = "super::course::Column::Id"
    )]
    Course,
    #[sea_orm(
        belongs_to = "super::section::Entity",
        from = "Column::SectionId",
        to = "super::section::Column::Id"
    )]
    Section,
    #[sea_orm(has_many = "super::attendance::Entity")]
    Attendance,
}

impl Related<super::course::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Course.def()
    }
}

impl Related<super::section::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Section.def()
    }
}

impl Related<super::attendance::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Attendance.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// A student together with the course and section they are enrolled in.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StudentWithEnrollment {
    pub student: Model,
    pub course: course::Model,
    pub section: section::Model,
}

#[derive(Debug, thiserror::Error)]
pub enum StudentError {
    #[error("Course {0} not found")]
    UnknownCourse(i64),

    #[error("Section {section_id} does not belong to course {course_id}")]
    SectionNotInCourse { course_id: i64, section_id: i64 },

    #[error("Student ID {0} is already taken")]
    DuplicateStudentId(String),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Admin-side fields for creating or re-assigning a student.
#[derive(Debug, Clone)]
pub struct StudentInput {
    pub student_id: String,
    pub name: String,
    pub course_id: i64,
    pub section_id: i64,
}

/// Self-service fields a student may fill in about themselves.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub age: Option<i32>,
    pub email: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub profile_picture: Option<String>,
}

/// Ensures `section_id` exists inside `course_id`.
async fn check_enrollment<C: ConnectionTrait>(
    db: &C,
    course_id: i64,
    section_id: i64,
) -> Result<(), StudentError> {
    if course::Entity::find_by_id(course_id).one(db).await?.is_none() {
        return Err(StudentError::UnknownCourse(course_id));
    }
    if section::Model::find_in_course(db, course_id, section_id)
        .await?
        .is_none()
    {
        return Err(StudentError::SectionNotInCourse {
            course_id,
            section_id,
        });
    }
    Ok(())
}

fn map_unique(err: DbErr, student_id: &str) -> StudentError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            StudentError::DuplicateStudentId(student_id.to_owned())
        }
        _ => StudentError::Database(err),
    }
}

impl Model {
    /// Pre-registers a student. The section must belong to the given course.
    pub async fn create(db: &DatabaseConnection, input: StudentInput) -> Result<Self, StudentError> {
        check_enrollment(db, input.course_id, input.section_id).await?;

        let student_id = input.student_id.trim().to_owned();
        let now = Utc::now();
        ActiveModel {
            student_id: Set(student_id.clone()),
            name: Set(input.name.trim().to_owned()),
            course_id: Set(input.course_id),
            section_id: Set(input.section_id),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await
        .map_err(|e| map_unique(e, &student_id))
    }

    pub async fn find(db: &DatabaseConnection, id: i64) -> Result<Option<Self>, DbErr> {
        Entity::find_by_id(id).one(db).await
    }

    /// Resolves the human-assigned student id to the stored record.
    pub async fn find_by_human_id<C: ConnectionTrait>(
        db: &C,
        student_id: &str,
    ) -> Result<Option<Self>, DbErr> {
        Entity::find()
            .filter(Column::StudentId.eq(student_id.trim()))
            .one(db)
            .await
    }

    /// Loads the student with their course and section.
    pub async fn find_enrollment(
        db: &DatabaseConnection,
        id: i64,
    ) -> Result<Option<StudentWithEnrollment>, DbErr> {
        let Some(student) = Entity::find_by_id(id).one(db).await? else {
            return Ok(None);
        };
        student.with_enrollment(db).await
    }

    /// Attaches course and section to an already-loaded student.
    ///
    /// Returns `None` only if the enrollment rows vanished underneath the student.
    pub async fn with_enrollment(
        self,
        db: &DatabaseConnection,
    ) -> Result<Option<StudentWithEnrollment>, DbErr> {
        let course = course::Entity::find_by_id(self.course_id).one(db).await?;
        let section = section::Entity::find_by_id(self.section_id).one(db).await?;
        Ok(match (course, section) {
            (Some(course), Some(section)) => Some(StudentWithEnrollment {
                student: self,
                course,
                section,
            }),
            _ => None,
        })
    }

    /// Lists students with their enrollment, optionally narrowed to one course/section.
    pub async fn list_with_enrollment(
        db: &DatabaseConnection,
        course_id: Option<i64>,
        section_id: Option<i64>,
    ) -> Result<Vec<StudentWithEnrollment>, DbErr> {
        let mut query = Entity::find().order_by_asc(Column::Name);
        if let Some(course_id) = course_id {
            query = query.filter(Column::CourseId.eq(course_id));
        }
        if let Some(section_id) = section_id {
            query = query.filter(Column::SectionId.eq(section_id));
        }
        let students = query.all(db).await?;

        let courses: HashMap<i64, course::Model> = course::Entity::find()
            .all(db)
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();
        let sections: HashMap<i64, section::Model> = section::Entity::find()
            .all(db)
            .await?
            .into_iter()
            .map(|s| (s.id, s))
            .collect();

        Ok(students
            .into_iter()
            .filter_map(|student| {
                let course = courses.get(&student.course_id)?.clone();
                let section = sections.get(&student.section_id)?.clone();
                Some(StudentWithEnrollment {
                    student,
                    course,
                    section,
                })
            })
            .collect())
    }

    /// Admin edit: identity and enrollment.
    pub async fn reassign(
        self,
        db: &DatabaseConnection,
        input: StudentInput,
    ) -> Result<Self, StudentError> {
        check_enrollment(db, input.course_id, input.section_id).await?;

        let student_id = input.student_id.trim().to_owned();
        let mut active = self.into_active_model();
        active.student_id = Set(student_id.clone());
        active.name = Set(input.name.trim().to_owned());
        active.course_id = Set(input.course_id);
        active.section_id = Set(input.section_id);
        active.updated_at = Set(Utc::now());
        active
            .update(db)
            .await
            .map_err(|e| map_unique(e, &student_id))
    }

    /// Self-service edit. Only fields present in `update` are written.
    pub async fn update_profile<C: ConnectionTrait>(
        self,
        db: &C,
        update: ProfileUpdate,
    ) -> Result<Self, DbErr> {
        let mut active = self.into_active_model();
        if let Some(age) = update.age {
            active.age = Set(Some(age));
        }
        if let Some(email) = update.email {
            active.email = Set(Some(email));
        }
        if let Some(birthday) = update.birthday {
            active.birthday = Set(Some(birthday));
        }
        if let Some(picture) = update.profile_picture {
            active.profile_picture = Set(Some(picture));
        }
        active.updated_at = Set(Utc::now());
        active.update(db).await
    }

    /// Removes the student; their account and attendance rows go with them.
    pub async fn delete_by_id(db: &DatabaseConnection, id: i64) -> Result<bool, DbErr> {
        let res = Entity::delete_by_id(id).exec(db).await?;
        Ok(res.rows_affected > 0)
    }
}
