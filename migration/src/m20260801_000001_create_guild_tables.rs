use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_query::Expr;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Per-guild configuration, keyed by the Discord snowflake
        manager
            .create_table(
                Table::create()
                    .table(Guilds::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Guilds::GuildId)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Guilds::Name).string_len(256).not_null())
                    .col(ColumnDef::new(Guilds::Description).text().null())
                    .col(
                        ColumnDef::new(Guilds::Enabled)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Guilds::LoggingEnabled)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Guilds::CouncillorRoleId).string_len(32).null())
                    .col(ColumnDef::new(Guilds::ChancellorRoleId).string_len(32).null())
                    .col(ColumnDef::new(Guilds::MinisterRoleId).string_len(32).null())
                    .col(ColumnDef::new(Guilds::PresidentRoleId).string_len(32).null())
                    .col(
                        ColumnDef::new(Guilds::VicePresidentRoleId)
                            .string_len(32)
                            .null(),
                    )
                    .col(ColumnDef::new(Guilds::JudiciaryRoleId).string_len(32).null())
                    .col(ColumnDef::new(Guilds::CitizenRoleId).string_len(32).null())
                    .col(ColumnDef::new(Guilds::VotingChannelId).string_len(32).null())
                    .col(
                        ColumnDef::new(Guilds::AnnouncementChannelId)
                            .string_len(32)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Guilds::DaysRequirement)
                            .integer()
                            .not_null()
                            .default(180),
                    )
                    .col(
                        ColumnDef::new(Guilds::MaxCouncillors)
                            .integer()
                            .not_null()
                            .default(9),
                    )
                    .col(
                        ColumnDef::new(Guilds::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Guilds::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // One council per guild; council_id is "{guild_id}_c"
        manager
            .create_table(
                Table::create()
                    .table(Councils::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Councils::CouncilId)
                            .string_len(40)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Councils::GuildId).string_len(32).not_null())
                    .col(ColumnDef::new(Councils::ChancellorId).big_integer().null())
                    .col(
                        ColumnDef::new(Councils::ElectionInProgress)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Councils::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .index(
                        Index::create()
                            .name("idx_councils_guild")
                            .col(Councils::GuildId)
                            .unique(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Councillors::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Councillors::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Councillors::DiscordId).string_len(32).not_null())
                    .col(ColumnDef::new(Councillors::Name).string_len(256).not_null())
                    .col(ColumnDef::new(Councillors::CouncilId).string_len(40).not_null())
                    .col(
                        ColumnDef::new(Councillors::JoinedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Councillors::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Councillors::IsChancellor)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    // Seat lookups filter on council + active
                    .index(
                        Index::create()
                            .name("idx_councillors_council_active")
                            .col(Councillors::CouncilId)
                            .col(Councillors::Active),
                    )
                    .index(
                        Index::create()
                            .name("idx_councillors_discord")
                            .col(Councillors::DiscordId),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Councillors::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Councils::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Guilds::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Guilds {
    Table,
    GuildId,
    Name,
    Description,
    Enabled,
    LoggingEnabled,
    CouncillorRoleId,
    ChancellorRoleId,
    MinisterRoleId,
    PresidentRoleId,
    VicePresidentRoleId,
    JudiciaryRoleId,
    CitizenRoleId,
    VotingChannelId,
    AnnouncementChannelId,
    DaysRequirement,
    MaxCouncillors,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Councils {
    Table,
    CouncilId,
    GuildId,
    ChancellorId,
    ElectionInProgress,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Councillors {
    Table,
    Id,
    DiscordId,
    Name,
    CouncilId,
    JoinedAt,
    Active,
    IsChancellor,
}
