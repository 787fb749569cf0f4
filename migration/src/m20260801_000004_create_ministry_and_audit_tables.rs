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
                    .table(Ministries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Ministries::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Ministries::CouncilId).string_len(40).not_null())
                    .col(ColumnDef::new(Ministries::Name).string_len(128).not_null())
                    .col(ColumnDef::new(Ministries::Description).text().not_null())
                    .col(
                        ColumnDef::new(Ministries::MinisterDiscordId)
                            .string_len(32)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Ministries::DeputyDiscordId)
                            .string_len(32)
                            .null(),
                    )
                    .col(ColumnDef::new(Ministries::RoleId).string_len(32).null())
                    .col(ColumnDef::new(Ministries::CreatedBy).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Ministries::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Ministries::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .index(
                        Index::create()
                            .name("idx_ministries_council_active")
                            .col(Ministries::CouncilId)
                            .col(Ministries::Active),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AuditLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AuditLogs::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AuditLogs::GuildId).string_len(32).not_null())
                    .col(ColumnDef::new(AuditLogs::Kind).string_len(32).not_null())
                    .col(ColumnDef::new(AuditLogs::Action).string_len(128).not_null())
                    .col(ColumnDef::new(AuditLogs::ActorId).string_len(32).null())
                    .col(ColumnDef::new(AuditLogs::Details).json_binary().null())
                    .col(
                        ColumnDef::new(AuditLogs::Severity)
                            .string_len(16)
                            .not_null()
                            .default("info"),
                    )
                    .col(
                        ColumnDef::new(AuditLogs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .index(
                        Index::create()
                            .name("idx_audit_guild_time")
                            .col(AuditLogs::GuildId)
                            .col(AuditLogs::CreatedAt),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AuditLogs::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Ministries::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Ministries {
    Table,
    Id,
    CouncilId,
    Name,
    Description,
    MinisterDiscordId,
    DeputyDiscordId,
    RoleId,
    CreatedBy,
    Active,
    CreatedAt,
}

#[derive(DeriveIden)]
enum AuditLogs {
    Table,
    Id,
    GuildId,
    Kind,
    Action,
    ActorId,
    Details,
    Severity,
    CreatedAt,
}
