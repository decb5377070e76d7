//! Admin dashboard figures.

use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter};
use serde::Serialize;

use crate::models::{attendance, course, event, section, student};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Overview {
    pub students: u64,
    pub courses: u64,
    pub sections: u64,
    pub events: u64,
    pub active_events: u64,
    pub attendance_records: u64,
}

pub async fn overview(db: &DatabaseConnection) -> Result<Overview, DbErr> {
    Ok(Overview {
        students: student::Entity::find().count(db).await?,
        courses: course::Entity::find().count(db).await?,
        sections: section::Entity::find().count(db).await?,
        events: event::Entity::find().count(db).await?,
        active_events: event::Entity::find()
            .filter(event::Column::IsActive.eq(true))
            .count(db)
            .await?,
        attendance_records: attendance::Entity::find().count(db).await?,
    })
}
