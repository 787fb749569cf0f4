pub use sea_orm_migration::prelude::*;

mod m20260801_000001_create_guild_tables;
mod m20260801_000002_create_voting_tables;
mod m20260801_000003_create_election_tables;
mod m20260801_000004_create_ministry_and_audit_tables;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260801_000001_create_guild_tables::Migration),
            Box::new(m20260801_000002_create_voting_tables::Migration),
            Box::new(m20260801_000003_create_election_tables::Migration),
            Box::new(m20260801_000004_create_ministry_and_audit_tables::Migration),
        ]
    }
}
