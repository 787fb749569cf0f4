use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "votings")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub council_id: String,
    pub kind: String,
    pub status: String,
    pub title: String,
    pub description: String,
    pub proposer_id: Option<String>,
    pub message_id: Option<String>,
    pub voting_start: Option<DateTimeWithTimeZone>,
    pub voting_end: DateTimeWithTimeZone,
    pub required_percentage: f64,
    pub result_announced: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::council::Entity",
        from = "Column::CouncilId",
        to = "super::council::Column::CouncilId"
    )]
    Council,
    #[sea_orm(has_many = "super::vote::Entity")]
    Vote,
    #[sea_orm(has_many = "super::election_candidate::Entity")]
    ElectionCandidate,
    #[sea_orm(has_many = "super::registered_voter::Entity")]
    RegisteredVoter,
}

impl Related<super::council::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Council.def()
    }
}

impl Related<super::vote::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Vote.def()
    }
}

impl Related<super::election_candidate::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ElectionCandidate.def()
    }
}

impl Related<super::registered_voter::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RegisteredVoter.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
