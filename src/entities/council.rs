use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "councils")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub council_id: String,
    pub guild_id: String,
    pub chancellor_id: Option<i64>,
    pub election_in_progress: bool,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::guild::Entity",
        from = "Column::GuildId",
        to = "super::guild::Column::GuildId"
    )]
    Guild,
    #[sea_orm(has_many = "super::councillor::Entity")]
    Councillor,
    #[sea_orm(has_many = "super::voting::Entity")]
    Voting,
}

impl Related<super::guild::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Guild.def()
    }
}

impl Related<super::councillor::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Councillor.def()
    }
}

impl Related<super::voting::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Voting.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
