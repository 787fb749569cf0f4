use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_query::Expr;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Votings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Votings::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Votings::CouncilId).string_len(40).not_null())
                    .col(ColumnDef::new(Votings::Kind).string_len(32).not_null())
                    .col(ColumnDef::new(Votings::Status).string_len(16).not_null())
                    .col(ColumnDef::new(Votings::Title).string_len(256).not_null())
                    .col(ColumnDef::new(Votings::Description).text().not_null())
                    .col(ColumnDef::new(Votings::ProposerId).string_len(32).null())
                    .col(ColumnDef::new(Votings::MessageId).string_len(32).null())
                    .col(
                        ColumnDef::new(Votings::VotingStart)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Votings::VotingEnd)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Votings::RequiredPercentage)
                            .double()
                            .not_null()
                            .default(0.5),
                    )
                    .col(
                        ColumnDef::new(Votings::ResultAnnounced)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Votings::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Votings::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    // The resolver scans on (status, voting_end)
                    .index(
                        Index::create()
                            .name("idx_votings_status_end")
                            .col(Votings::Status)
                            .col(Votings::VotingEnd),
                    )
                    .index(
                        Index::create()
                            .name("idx_votings_council_status")
                            .col(Votings::CouncilId)
                            .col(Votings::Status),
                    )
                    // Button callbacks look votings up by originating message
                    .index(
                        Index::create()
                            .name("idx_votings_message")
                            .col(Votings::MessageId)
                            .unique(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Votes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Votes::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Votes::VotingId).big_integer().not_null())
                    .col(ColumnDef::new(Votes::VoterId).string_len(32).not_null())
                    .col(ColumnDef::new(Votes::Stance).boolean().not_null())
                    .col(ColumnDef::new(Votes::CandidateId).big_integer().null())
                    .col(
                        ColumnDef::new(Votes::VotedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    // One ballot per voter per voting; vote changes are upserts
                    .index(
                        Index::create()
                            .name("idx_votes_voting_voter")
                            .col(Votes::VotingId)
                            .col(Votes::VoterId)
                            .unique(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_votes_voting")
                            .from(Votes::Table, Votes::VotingId)
                            .to(Votings::Table, Votings::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Votes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Votings::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Votings {
    Table,
    Id,
    CouncilId,
    Kind,
    Status,
    Title,
    Description,
    ProposerId,
    MessageId,
    VotingStart,
    VotingEnd,
    RequiredPercentage,
    ResultAnnounced,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Votes {
    Table,
    Id,
    VotingId,
    VoterId,
    Stance,
    CandidateId,
    VotedAt,
}
