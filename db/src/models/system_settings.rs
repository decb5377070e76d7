use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::OnConflict;
use sea_orm::{DatabaseConnection, DbErr, Set};
use serde::Serialize;

/// Name shown before an admin has saved any settings.
pub const DEFAULT_SYSTEM_NAME: &str = "Attendance Tracker";

/// Primary key of the only settings row.
pub const SETTINGS_ID: i64 = 1;

/// Singleton row of system-wide settings. Absent until the first write.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "system_settings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i64,
    pub system_name: String,
    pub qr_code_enabled: bool,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Partial settings write; `None` keeps the stored (or default) value.
#[derive(Debug, Clone, Default)]
pub struct SettingsUpdate {
    pub system_name: Option<String>,
    pub qr_code_enabled: Option<bool>,
}

impl Model {
    /// The settings row, if one has been written.
    pub async fn get(db: &DatabaseConnection) -> Result<Option<Self>, DbErr> {
        Entity::find_by_id(SETTINGS_ID).one(db).await
    }

    /// Creates the row on first call, updates it in place afterwards.
    ///
    /// A single `INSERT .. ON CONFLICT (id) DO UPDATE` on the fixed id, so concurrent
    /// first writes still leave one row. On conflict only the fields present in `update`
    /// are overwritten.
    pub async fn upsert(db: &DatabaseConnection, update: SettingsUpdate) -> Result<Self, DbErr> {
        let mut changed = vec![Column::UpdatedAt];
        if update.system_name.is_some() {
            changed.push(Column::SystemName);
        }
        if update.qr_code_enabled.is_some() {
            changed.push(Column::QrCodeEnabled);
        }

        let row = ActiveModel {
            id: Set(SETTINGS_ID),
            system_name: Set(update
                .system_name
                .map(|n| n.trim().to_owned())
                .unwrap_or_else(|| DEFAULT_SYSTEM_NAME.to_owned())),
            qr_code_enabled: Set(update.qr_code_enabled.unwrap_or(true)),
            updated_at: Set(Utc::now()),
        };

        Entity::insert(row)
            .on_conflict(OnConflict::column(Column::Id).update_columns(changed).to_owned())
            .exec(db)
            .await?;

        Self::get(db)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound("system_settings".into()))
    }

    /// QR check-in is on unless an admin has switched it off.
    pub async fn qr_enabled(db: &DatabaseConnection) -> Result<bool, DbErr> {
        Ok(Self::get(db).await?.is_none_or(|s| s.qr_code_enabled))
    }
}
