use crate::seed::{SeedError, Seeder};
use async_trait::async_trait;
use chrono::{Duration, NaiveTime, Utc};
use db::models::{
    course,
    event::{self, CourseSection, EventInput},
    section,
};
use sea_orm::DatabaseConnection;

pub struct EventSeeder;

#[async_trait]
impl Seeder for EventSeeder {
    async fn seed(&self, db: &DatabaseConnection) -> Result<(), SeedError> {
        if !event::Model::list(db).await?.is_empty() {
            return Ok(());
        }

        // Opens to the first section of every course.
        let mut associations = Vec::new();
        for course in course::Model::list(db).await? {
            if let Some(first) = section::Model::list_for_course(db, course.id).await?.into_iter().next() {
                associations.push(CourseSection {
                    course_id: course.id,
                    section_id: first.id,
                });
            }
        }

        event::Model::create(
            db,
            EventInput {
                name: "Freshman Orientation".into(),
                description: Some("Welcome assembly for first-year students".into()),
                date: (Utc::now() + Duration::days(7)).date_naive(),
                time: NaiveTime::from_hms_opt(9, 0, 0).ok_or("invalid time")?,
                is_active: true,
                associations,
            },
        )
        .await?;
        Ok(())
    }
}
