use crate::seed::{SeedError, Seeder};
use async_trait::async_trait;
use db::models::user::{Model, Role};
use sea_orm::DatabaseConnection;
use util::config;

pub struct AdminSeeder;

#[async_trait]
impl Seeder for AdminSeeder {
    async fn seed(&self, db: &DatabaseConnection) -> Result<(), SeedError> {
        let email = config::admin_email();
        if Model::find_by_email(db, &email).await?.is_some() {
            return Ok(());
        }
        Model::create(db, &email, &config::admin_password(), Role::Admin, None).await?;
        Ok(())
    }
}
