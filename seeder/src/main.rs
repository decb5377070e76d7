use crate::seed::{Seeder, run_seeder};
use crate::seeds::{admin::AdminSeeder, course::CourseSeeder, event::EventSeeder, student::StudentSeeder};
use migration::{Migrator, MigratorTrait};

mod seed;
mod seeds;

#[tokio::main]
async fn main() {
    let db = match db::connect().await {
        Ok(db) => db,
        Err(e) => {
            eprintln!("Failed to connect to database: {e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = Migrator::up(&db, None).await {
        eprintln!("Failed to run migrations: {e}");
        std::process::exit(1);
    }

    for (seeder, name) in [
        (Box::new(AdminSeeder) as Box<dyn Seeder + Send + Sync>, "Admin"),
        (Box::new(CourseSeeder), "Course"),
        (Box::new(StudentSeeder), "Student"),
        (Box::new(EventSeeder), "Event"),
    ] {
        run_seeder(&*seeder, name, &db).await;
    }
}
