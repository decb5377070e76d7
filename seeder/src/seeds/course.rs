use crate::seed::{SeedError, Seeder};
use async_trait::async_trait;
use db::models::{course, section};
use sea_orm::DatabaseConnection;

pub struct CourseSeeder;

const COURSES: [(&str, &str); 3] = [
    ("BSCS", "Bachelor of Science in Computer Science"),
    ("BSIT", "Bachelor of Science in Information Technology"),
    ("BSIS", "Bachelor of Science in Information Systems"),
];

const SECTIONS: [&str; 3] = ["1A", "1B", "2A"];

#[async_trait]
impl Seeder for CourseSeeder {
    async fn seed(&self, db: &DatabaseConnection) -> Result<(), SeedError> {
        if !course::Model::list(db).await?.is_empty() {
            return Ok(());
        }
        for (name, description) in COURSES {
            let course = course::Model::create(db, name, Some(description)).await?;
            for s in SECTIONS {
                section::Model::create(db, course.id, s).await?;
            }
        }
        Ok(())
    }
}
