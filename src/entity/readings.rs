use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "readings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub uplink_id: Uuid,
    pub received_at: DateTimeWithTimeZone,
    pub device: String,
    pub recorded_at: DateTimeWithTimeZone,
    pub frame_version: i16,
    pub hardware: i16,
    pub uptime: i64,
    pub temperature: f32,
    pub temperature_cal: f32,
    pub temperature_is_cal: bool,
    pub humidity: f32,
    pub pressure: f32,
    pub ccs811_status: i16,
    pub co2: i32,
    pub tvoc: i32,
    pub voltage: i16,
    pub gps_fix: bool,
    pub satellites: i16,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::uplinks::Entity",
        from = "Column::UplinkId",
        to = "super::uplinks::Column::Id"
    )]
    Uplink,
}

impl Related<super::uplinks::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Uplink.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
