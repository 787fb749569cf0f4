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
                    .table(ElectionCandidates::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ElectionCandidates::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ElectionCandidates::VotingId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ElectionCandidates::DiscordId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ElectionCandidates::Name)
                            .string_len(256)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ElectionCandidates::RegisteredAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(ElectionCandidates::VoteCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ElectionCandidates::Elected)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .index(
                        Index::create()
                            .name("idx_candidates_voting_discord")
                            .col(ElectionCandidates::VotingId)
                            .col(ElectionCandidates::DiscordId)
                            .unique(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(RegisteredVoters::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RegisteredVoters::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(RegisteredVoters::VotingId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RegisteredVoters::DiscordId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RegisteredVoters::Name)
                            .string_len(256)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RegisteredVoters::RegisteredAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(RegisteredVoters::HasVoted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .index(
                        Index::create()
                            .name("idx_voters_voting_discord")
                            .col(RegisteredVoters::VotingId)
                            .col(RegisteredVoters::DiscordId)
                            .unique(),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RegisteredVoters::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ElectionCandidates::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ElectionCandidates {
    Table,
    Id,
    VotingId,
    DiscordId,
    Name,
    RegisteredAt,
    VoteCount,
    Elected,
}

#[derive(DeriveIden)]
enum RegisteredVoters {
    Table,
    Id,
    VotingId,
    DiscordId,
    Name,
    RegisteredAt,
    HasVoted,
}
