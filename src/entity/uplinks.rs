use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "uplinks")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub app_id: String,
    pub dev_id: String,
    pub hw_serial: String,
    pub port: i32,
    pub counter: i64,
    pub is_retry: bool,
    pub is_confirmed: bool,
    #[sea_orm(column_type = "Text")]
    pub payload_raw: String,
    pub uplink_time: DateTimeWithTimeZone,
    pub frequency: f32,
    pub modulation: String,
    pub data_rate: String,
    pub bit_rate: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::readings::Entity")]
    Reading,
}

impl Related<super::readings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reading.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
