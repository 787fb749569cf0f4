use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "votes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub voting_id: i64,
    pub voter_id: String,
    pub stance: bool,
    pub candidate_id: Option<i64>,
    pub voted_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::voting::Entity",
        from = "Column::VotingId",
        to = "super::voting::Column::Id"
    )]
    Voting,
    #[sea_orm(
        belongs_to = "super::election_candidate::Entity",
        from = "Column::CandidateId",
        to = "super::election_candidate::Column::Id"
    )]
    ElectionCandidate,
}

impl Related<super::voting::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Voting.def()
    }
}

impl Related<super::election_candidate::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ElectionCandidate.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
