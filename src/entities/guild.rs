use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "guilds")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub guild_id: String,
    pub name: String,
    pub description: Option<String>,
    pub enabled: bool,
    pub logging_enabled: bool,
    pub councillor_role_id: Option<String>,
    pub chancellor_role_id: Option<String>,
    pub minister_role_id: Option<String>,
    pub president_role_id: Option<String>,
    pub vice_president_role_id: Option<String>,
    pub judiciary_role_id: Option<String>,
    pub citizen_role_id: Option<String>,
    pub voting_channel_id: Option<String>,
    pub announcement_channel_id: Option<String>,
    pub days_requirement: i32,
    pub max_councillors: i32,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::council::Entity")]
    Council,
}

impl Related<super::council::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Council.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
