use sea_orm::entity::prelude::*;
use sea_orm::{ActiveModelTrait, DbErr, QueryOrder, Set};
use serde::Serialize;

/// One (course, section) pair allowed to attend an event.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "event_course_sections")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub event_id: i64,
    pub course_id: i64,
    pub section_id: i64,
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
}

impl Related<super::event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Event.def()
    }
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

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Associations of an event, ordered for stable output. Empty if the event has none.
    pub async fn find_event_associations<C: ConnectionTrait>(
        db: &C,
        event_id: i64,
    ) -> Result<Vec<Self>, DbErr> {
        Entity::find()
            .filter(Column::EventId.eq(event_id))
            .order_by_asc(Column::CourseId)
            .order_by_asc(Column::SectionId)
            .all(db)
            .await
    }

    /// Replaces the whole association set of an event.
    ///
    /// Meant to run inside the caller's transaction; duplicate pairs in `pairs` are
    /// written once.
    pub async fn replace_for_event<C: ConnectionTrait>(
        db: &C,
        event_id: i64,
        pairs: &[(i64, i64)],
    ) -> Result<Vec<Self>, DbErr> {
        Entity::delete_many()
            .filter(Column::EventId.eq(event_id))
            .exec(db)
            .await?;

        let mut seen = std::collections::HashSet::new();
        let mut rows = Vec::with_capacity(pairs.len());
        for &(course_id, section_id) in pairs {
            if !seen.insert((course_id, section_id)) {
                continue;
            }
            let row = ActiveModel {
                event_id: Set(event_id),
                course_id: Set(course_id),
                section_id: Set(section_id),
                ..Default::default()
            }
            .insert(db)
            .await?;
            rows.push(row);
        }
        Ok(rows)
    }
}
