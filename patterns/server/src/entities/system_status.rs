use super::sea_orm_active_enums::ServiceStatus;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "system_statuses")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub service_name: String,
    pub status: ServiceStatus,
    pub response_time_ms: i32,
    #[sea_orm(column_type = "Double")]
    pub uptime_percentage: f64,
    pub last_check: DateTimeUtc,
    #[sea_orm(column_type = "Text")]
    pub message: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
