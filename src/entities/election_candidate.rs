use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "election_candidates")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub voting_id: i64,
    pub discord_id: String,
    pub name: String,
    pub registered_at: DateTimeWithTimeZone,
    pub vote_count: i32,
    pub elected: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::voting::Entity",
        from = "Column::VotingId",
        to = "super::voting::Column::Id"
    )]
    Voting,
    #[sea_orm(has_many = "super::vote::Entity")]
    Vote,
}

impl Related<super::voting::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Voting.def()
    }
}

impl Related<super::vote::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Vote.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
