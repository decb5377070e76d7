use crate::seed::{SeedError, Seeder};
use async_trait::async_trait;
use db::models::{
    course, section,
    student::{self, StudentError, StudentInput},
};
use fake::{Fake, faker::name::en::Name};
use sea_orm::DatabaseConnection;

pub struct StudentSeeder;

const PER_SECTION: usize = 5;

#[async_trait]
impl Seeder for StudentSeeder {
    async fn seed(&self, db: &DatabaseConnection) -> Result<(), SeedError> {
        for course in course::Model::list(db).await? {
            for section in section::Model::list_for_course(db, course.id).await? {
                for _ in 0..PER_SECTION {
                    let input = StudentInput {
                        student_id: format!("2025-{:05}", fastrand::u32(..100_000)),
                        name: Name().fake(),
                        course_id: course.id,
                        section_id: section.id,
                    };
                    match student::Model::create(db, input).await {
                        // Random ids collide now and then.
                        Ok(_) | Err(StudentError::DuplicateStudentId(_)) => {}
                        Err(e) => return Err(e.into()),
                    }
                }
            }
        }
        Ok(())
    }
}
