use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, IntoActiveModel, QueryOrder, Set};
use serde::Serialize;

/// A section (class block) within a course, e.g. "A" of "BSCS".
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "sections")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub course_id: i64,
    /// Unique within the owning course.
    pub name: String,
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
}

impl Related<super::course::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Course.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub async fn create(db: &DatabaseConnection, course_id: i64, name: &str) -> Result<Self, DbErr> {
        let now = Utc::now();
        ActiveModel {
            course_id: Set(course_id),
            name: Set(name.trim().to_owned()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await
    }

    /// Looks up a section only if it belongs to `course_id`.
    pub async fn find_in_course<C>(
        db: &C,
        course_id: i64,
        section_id: i64,
    ) -> Result<Option<Self>, DbErr>
    where
        C: ConnectionTrait,
    {
        Entity::find_by_id(section_id)
            .filter(Column::CourseId.eq(course_id))
            .one(db)
            .await
    }

    pub async fn list_for_course(db: &DatabaseConnection, course_id: i64) -> Result<Vec<Self>, DbErr> {
        Entity::find()
            .filter(Column::CourseId.eq(course_id))
            .order_by_asc(Column::Name)
            .all(db)
            .await
    }

    pub async fn rename(self, db: &DatabaseConnection, name: &str) -> Result<Self, DbErr> {
        let mut active = self.into_active_model();
        active.name = Set(name.trim().to_owned());
        active.updated_at = Set(Utc::now());
        active.update(db).await
    }

    pub async fn delete_by_id(db: &DatabaseConnection, id: i64) -> Result<bool, DbErr> {
        let res = Entity::delete_by_id(id).exec(db).await?;
        Ok(res.rows_affected > 0)
    }
}
