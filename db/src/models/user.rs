use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use chrono::{DateTime, NaiveDate, Utc};
use rand::rngs::OsRng;
use sea_orm::entity::prelude::*;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
    SqlErr, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::models::student::{self, ProfileUpdate};

/// Represents an account in the `users` table.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Primary key ID (auto-incremented).
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Unique, lower-cased login email.
    #[sea_orm(unique)]
    pub email: String,
    /// Argon2 PHC string. Never serialized.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Fixed at creation.
    pub role: Role,
    /// Human-assigned student id for student accounts.
    pub student_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The two kinds of account. Authorization matches on this exactly.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Role {
    #[sea_orm(string_value = "admin")]
    Admin,

    #[sea_orm(string_value = "student")]
    Student,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::student::Entity",
        from = "Column::StudentId",
        to = "super::student::Column::StudentId"
    )]
    Student,
}

impl Related<super::student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Debug, thiserror::Error)]
pub enum RegisterError {
    #[error("No student with ID {0} has been registered by an administrator")]
    UnknownStudentId(String),

    #[error("A user with this email already exists")]
    EmailAlreadyRegistered,

    #[error("Student {0} already has an account")]
    StudentAlreadyRegistered(String),

    #[error("Failed to hash password")]
    Hashing,

    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Covers both unknown email and wrong password.
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Self-registration request for a pre-registered student.
#[derive(Debug, Clone)]
pub struct Registration {
    pub student_id: String,
    pub email: String,
    pub password: String,
    pub age: Option<i32>,
    pub birthday: Option<NaiveDate>,
    pub profile_picture: Option<String>,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl Model {
    /// Hashes a plaintext password into an Argon2 PHC string.
    pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
        let salt = SaltString::generate(&mut OsRng);
        Ok(Argon2::default()
            .hash_password(password.as_bytes(), &salt)?
            .to_string())
    }

    /// Checks `password` against this user's stored hash.
    pub fn verify_password(&self, password: &str) -> bool {
        match PasswordHash::new(&self.password_hash) {
            Ok(parsed) => Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }

    /// Inserts an account. Used by the seeder for admins and by [`Model::register`].
    pub async fn create<C: ConnectionTrait>(
        db: &C,
        email: &str,
        password: &str,
        role: Role,
        student_id: Option<&str>,
    ) -> Result<Self, DbErr> {
        let hash = Self::hash_password(password)
            .map_err(|e| DbErr::Custom(format!("Password hashing failed: {e}")))?;
        let now = Utc::now();

        ActiveModel {
            email: Set(normalize_email(email)),
            password_hash: Set(hash),
            role: Set(role),
            student_id: Set(student_id.map(str::to_owned)),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await
    }

    pub async fn find(db: &DatabaseConnection, id: i64) -> Result<Option<Self>, DbErr> {
        Entity::find_by_id(id).one(db).await
    }

    pub async fn find_by_email<C: ConnectionTrait>(
        db: &C,
        email: &str,
    ) -> Result<Option<Self>, DbErr> {
        Entity::find()
            .filter(Column::Email.eq(normalize_email(email)))
            .one(db)
            .await
    }

    /// Creates a student account against an admin-created student record.
    ///
    /// The account insert and the profile enrichment commit together.
    pub async fn register(
        db: &DatabaseConnection,
        reg: Registration,
    ) -> Result<(Self, student::Model), RegisterError> {
        let human_id = reg.student_id.trim().to_owned();

        let Some(student) = student::Model::find_by_human_id(db, &human_id).await? else {
            return Err(RegisterError::UnknownStudentId(human_id));
        };
        if Self::find_by_email(db, &reg.email).await?.is_some() {
            return Err(RegisterError::EmailAlreadyRegistered);
        }
        if Entity::find()
            .filter(Column::StudentId.eq(human_id.as_str()))
            .one(db)
            .await?
            .is_some()
        {
            return Err(RegisterError::StudentAlreadyRegistered(human_id));
        }

        let email = normalize_email(&reg.email);
        let txn = db.begin().await?;

        let user = match Self::create(&txn, &email, &reg.password, Role::Student, Some(&human_id))
            .await
        {
            Ok(user) => user,
            // Lost a race with a concurrent registration.
            Err(e) => {
                txn.rollback().await?;
                return Err(match e.sql_err() {
                    Some(SqlErr::UniqueConstraintViolation(msg)) if msg.contains("email") => {
                        RegisterError::EmailAlreadyRegistered
                    }
                    Some(SqlErr::UniqueConstraintViolation(_)) => {
                        RegisterError::StudentAlreadyRegistered(human_id)
                    }
                    _ if matches!(e, DbErr::Custom(_)) => RegisterError::Hashing,
                    _ => RegisterError::Database(e),
                });
            }
        };

        let student = student
            .update_profile(
                &txn,
                ProfileUpdate {
                    age: reg.age,
                    email: Some(email),
                    birthday: reg.birthday,
                    profile_picture: reg.profile_picture,
                },
            )
            .await?;

        txn.commit().await?;
        tracing::info!(user_id = user.id, student_id = %student.student_id, "Student registered");
        Ok((user, student))
    }

    /// Verifies login credentials.
    ///
    /// Unknown email and wrong password both produce [`AuthError::InvalidCredentials`].
    pub async fn verify_credentials(
        db: &DatabaseConnection,
        email: &str,
        password: &str,
    ) -> Result<Self, AuthError> {
        match Self::find_by_email(db, email).await? {
            Some(user) if user.verify_password(password) => Ok(user),
            _ => Err(AuthError::InvalidCredentials),
        }
    }

    /// The student record behind a student account.
    pub async fn student(&self, db: &DatabaseConnection) -> Result<Option<student::Model>, DbErr> {
        match &self.student_id {
            Some(id) => student::Model::find_by_human_id(db, id).await,
            None => Ok(None),
        }
    }
}
