use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::config::ResolverConfig;
use crate::entities::{council, councillor, election_candidate, guild, vote, voting};
use crate::gateway::{GatewayClient, SyncReport, reassign_role};
use crate::governance::{VotingKind, VotingStatus};
use crate::models::governance::Announcement;
use crate::schedule::{fixed_now, next_daily_run, to_fixed_offset};
use crate::tally::{RankedCandidate, StanceTally, chancellor_winner, select_winners};

mod announce;

const MAX_DUE_VOTINGS_PER_TICK: usize = 10_000;

/// The scheduled job that finds expired open votings, tallies them, and
/// commits their terminal status. One pass runs at a time; the loop only
/// re-arms after the previous pass finishes, so an overrun skips ticks
/// rather than queueing them.
pub struct VotingResolver {
    database: DatabaseConnection,
    gateway: GatewayClient,
    config: ResolverConfig,
}

impl VotingResolver {
    pub fn new(database: DatabaseConnection, gateway: GatewayClient, config: ResolverConfig) -> Self {
        Self {
            database,
            gateway,
            config,
        }
    }

    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        info!("Starting voting resolution loop");

        loop {
            let wait = if self.config.debug_mode {
                self.config.debug_poll_interval()
            } else {
                next_daily_run(Utc::now(), self.config.run_hour, self.config.run_minute)
            };
            debug!("Next voting resolution pass in {}s", wait.as_secs());

            tokio::select! {
                changed = shutdown.changed() => {
                    match changed {
                        Ok(_) => {
                            if *shutdown.borrow() {
                                info!("Resolver shutdown signal received");
                                break;
                            }
                        }
                        Err(_) => {
                            warn!("Shutdown channel closed unexpectedly. Exiting resolver loop");
                            break;
                        }
                    }
                }
                _ = sleep(wait) => {
                    if let Err(err) = self.tick(Utc::now()).await {
                        error!("Voting resolution pass failed: {err:#}");
                    }
                }
            }
        }

        Ok(())
    }

    /// One resolution pass. Each due voting is handled independently; a
    /// failure is logged and the voting is re-selected on the next pass
    /// because its status was never advanced.
    async fn tick(&self, now: DateTime<Utc>) -> Result<()> {
        let due = voting::Entity::find()
            .filter(voting::Column::Status.eq(VotingStatus::Voting.as_str()))
            .filter(voting::Column::VotingEnd.lte(to_fixed_offset(now)))
            .order_by_asc(voting::Column::VotingEnd)
            .all(&self.database)
            .await
            .context("Failed to scan for expired votings")?;

        assert!(
            due.len() <= MAX_DUE_VOTINGS_PER_TICK,
            "Expired voting batch exceeds defensive bound"
        );
        info!("Found {} votings to resolve", due.len());

        for record in due {
            let voting_id = record.id;
            if let Err(err) = resolve_voting(&self.database, &self.gateway, record).await {
                error!("Failed to resolve voting {voting_id}: {err:#}");
            }
        }

        Ok(())
    }
}

/// Resolves one voting and commits its terminal status. Shared by the
/// scheduled job and the manual conclude operation; an already-resolved
/// voting is a no-op.
pub async fn resolve_voting(
    database: &DatabaseConnection,
    gateway: &GatewayClient,
    record: voting::Model,
) -> Result<()> {
    let status = VotingStatus::parse(&record.status)?;
    if status != VotingStatus::Voting {
        debug!("Voting {} already resolved ({})", record.id, record.status);
        return Ok(());
    }

    let kind = VotingKind::parse(&record.kind)?;
    let council = council::Entity::find_by_id(record.council_id.clone())
        .one(database)
        .await?
        .ok_or_else(|| anyhow!("Council {} not found", record.council_id))?;
    let guild = guild::Entity::find_by_id(council.guild_id.clone())
        .one(database)
        .await?
        .ok_or_else(|| anyhow!("Guild {} not found", council.guild_id))?;

    match kind {
        VotingKind::Election => resolve_election(database, gateway, record, council, guild).await,
        VotingKind::ChancellorElection => {
            resolve_chancellor_election(database, gateway, record, council, guild).await
        }
        _ => resolve_proposal(database, gateway, record, guild).await,
    }
}

async fn resolve_proposal(
    database: &DatabaseConnection,
    gateway: &GatewayClient,
    record: voting::Model,
    guild: guild::Model,
) -> Result<()> {
    let votes = vote::Entity::find()
        .filter(vote::Column::VotingId.eq(record.id))
        .all(database)
        .await
        .context("Failed to load ballots")?;

    let tally = StanceTally::from_stances(votes.iter().map(|ballot| ballot.stance));
    let next = proposal_disposition(tally, record.required_percentage);
    let passed = next == VotingStatus::Passed;

    let announcement = announce::proposal_result(
        &record.title,
        &record.description,
        tally,
        record.required_percentage,
        passed,
        record.proposer_id.as_deref(),
    );
    post_result(gateway, &guild, false, &announcement).await?;

    let voting_id = record.id;
    commit_status(database, record, next).await?;
    info!(
        "Resolved proposal voting {voting_id}: {}",
        next.as_str().to_uppercase()
    );
    Ok(())
}

async fn resolve_election(
    database: &DatabaseConnection,
    gateway: &GatewayClient,
    record: voting::Model,
    council: council::Model,
    guild: guild::Model,
) -> Result<()> {
    let mut ranked = load_ranked_candidates(database, record.id).await?;
    let seats = usize::try_from(guild.max_councillors.max(1))
        .map_err(|_| anyhow!("Seat count {} out of range", guild.max_councillors))?;
    let winners = select_winners(&mut ranked, seats);
    let total_votes = vote::Entity::find()
        .filter(vote::Column::VotingId.eq(record.id))
        .count(database)
        .await
        .context("Failed to count ballots")?;

    let sync = if winners.is_empty() {
        clear_election_flag(database, council).await?;
        SyncReport::default()
    } else {
        let outgoing = seat_winners(database, &record, council, &winners).await?;
        let incoming: Vec<String> = winners
            .iter()
            .map(|winner| winner.discord_id.clone())
            .collect();
        reassign_role(
            gateway,
            &guild.guild_id,
            guild.councillor_role_id.as_deref(),
            &outgoing,
            &incoming,
            "Council election resolved",
        )
        .await
    };

    let announcement = announce::election_result(&record.title, &winners, total_votes, &sync);
    post_result(gateway, &guild, true, &announcement).await?;

    let voting_id = record.id;
    let next = election_disposition(winners.len());
    commit_status(database, record, next).await?;
    info!(
        "Resolved council election {voting_id}: {} councillors seated",
        winners.len()
    );
    Ok(())
}

/// Rotates the council inside one transaction: every sitting councillor is
/// deactivated and the winners are seated. Re-running after a partial
/// failure converges on the same active seat set.
async fn seat_winners(
    database: &DatabaseConnection,
    record: &voting::Model,
    council: council::Model,
    winners: &[RankedCandidate],
) -> Result<Vec<String>> {
    assert!(!winners.is_empty(), "Seat rotation requires winners");

    let sitting = councillor::Entity::find()
        .filter(councillor::Column::CouncilId.eq(council.council_id.clone()))
        .filter(councillor::Column::Active.eq(true))
        .all(database)
        .await
        .context("Failed to load sitting councillors")?;
    let outgoing: Vec<String> = sitting
        .iter()
        .map(|member| member.discord_id.clone())
        .collect();

    let txn = database.begin().await?;

    councillor::Entity::update_many()
        .col_expr(councillor::Column::Active, Expr::value(false))
        .col_expr(councillor::Column::IsChancellor, Expr::value(false))
        .filter(councillor::Column::CouncilId.eq(council.council_id.clone()))
        .filter(councillor::Column::Active.eq(true))
        .exec(&txn)
        .await
        .context("Failed to deactivate outgoing councillors")?;

    let now = fixed_now();
    let seats: Vec<councillor::ActiveModel> = winners
        .iter()
        .map(|winner| councillor::ActiveModel {
            discord_id: Set(winner.discord_id.clone()),
            name: Set(winner.name.clone()),
            council_id: Set(council.council_id.clone()),
            joined_at: Set(now),
            active: Set(true),
            is_chancellor: Set(false),
            ..Default::default()
        })
        .collect();
    councillor::Entity::insert_many(seats)
        .exec(&txn)
        .await
        .context("Failed to seat elected councillors")?;

    let winner_ids: Vec<i64> = winners.iter().map(|winner| winner.id).collect();
    election_candidate::Entity::update_many()
        .col_expr(election_candidate::Column::Elected, Expr::value(true))
        .filter(election_candidate::Column::VotingId.eq(record.id))
        .filter(election_candidate::Column::Id.is_in(winner_ids))
        .exec(&txn)
        .await
        .context("Failed to mark elected candidates")?;

    // A full rotation unseats the chancellor with everyone else.
    let mut council = council.into_active_model();
    council.chancellor_id = Set(None);
    council.election_in_progress = Set(false);
    council.updated_at = Set(now);
    council
        .update(&txn)
        .await
        .context("Failed to clear election flag")?;

    txn.commit().await?;
    Ok(outgoing)
}

async fn resolve_chancellor_election(
    database: &DatabaseConnection,
    gateway: &GatewayClient,
    record: voting::Model,
    council: council::Model,
    guild: guild::Model,
) -> Result<()> {
    let mut ranked = load_ranked_candidates(database, record.id).await?;
    let winner = chancellor_winner(&mut ranked);

    let sync = match &winner {
        None => {
            clear_election_flag(database, council).await?;
            SyncReport::default()
        }
        Some(winner) => {
            let outgoing = promote_chancellor(database, council, winner).await?;
            reassign_role(
                gateway,
                &guild.guild_id,
                guild.chancellor_role_id.as_deref(),
                &outgoing,
                std::slice::from_ref(&winner.discord_id),
                "Chancellor election resolved",
            )
            .await
        }
    };

    let announcement = announce::chancellor_result(&record.title, winner.as_ref(), &sync);
    post_result(gateway, &guild, true, &announcement).await?;

    let voting_id = record.id;
    let next = if winner.is_some() {
        VotingStatus::Passed
    } else {
        VotingStatus::Failed
    };
    commit_status(database, record, next).await?;
    info!(
        "Resolved chancellor election {voting_id}: {}",
        next.as_str().to_uppercase()
    );
    Ok(())
}

/// Demotes the previous chancellor and promotes the winner inside one
/// transaction. Returns the demoted chancellor's discord id, if any.
async fn promote_chancellor(
    database: &DatabaseConnection,
    council: council::Model,
    winner: &RankedCandidate,
) -> Result<Vec<String>> {
    let previous = councillor::Entity::find()
        .filter(councillor::Column::CouncilId.eq(council.council_id.clone()))
        .filter(councillor::Column::IsChancellor.eq(true))
        .filter(councillor::Column::Active.eq(true))
        .one(database)
        .await
        .context("Failed to load sitting chancellor")?;

    let seat = councillor::Entity::find()
        .filter(councillor::Column::CouncilId.eq(council.council_id.clone()))
        .filter(councillor::Column::DiscordId.eq(winner.discord_id.clone()))
        .filter(councillor::Column::Active.eq(true))
        .one(database)
        .await
        .context("Failed to load winner's council seat")?
        .ok_or_else(|| {
            anyhow!(
                "Chancellor winner {} holds no active council seat",
                winner.discord_id
            )
        })?;

    let txn = database.begin().await?;
    let now = fixed_now();

    councillor::Entity::update_many()
        .col_expr(councillor::Column::IsChancellor, Expr::value(false))
        .filter(councillor::Column::CouncilId.eq(council.council_id.clone()))
        .filter(councillor::Column::IsChancellor.eq(true))
        .exec(&txn)
        .await
        .context("Failed to demote previous chancellor")?;

    let seat_id = seat.id;
    let mut promoted = seat.into_active_model();
    promoted.is_chancellor = Set(true);
    promoted
        .update(&txn)
        .await
        .context("Failed to promote chancellor")?;

    let mut council = council.into_active_model();
    council.chancellor_id = Set(Some(seat_id));
    council.election_in_progress = Set(false);
    council.updated_at = Set(now);
    council
        .update(&txn)
        .await
        .context("Failed to update council chancellor reference")?;

    txn.commit().await?;

    Ok(previous
        .into_iter()
        .map(|chancellor| chancellor.discord_id)
        .collect())
}

async fn load_ranked_candidates(
    database: &DatabaseConnection,
    voting_id: i64,
) -> Result<Vec<RankedCandidate>> {
    let candidates = election_candidate::Entity::find()
        .filter(election_candidate::Column::VotingId.eq(voting_id))
        .all(database)
        .await
        .context("Failed to load election candidates")?;
    assert!(
        candidates.len() <= 1_000,
        "Candidate batch exceeds defensive bound"
    );

    Ok(candidates
        .into_iter()
        .map(|candidate| RankedCandidate {
            id: candidate.id,
            discord_id: candidate.discord_id,
            name: candidate.name,
            votes: candidate.vote_count,
            registered_at: candidate.registered_at,
        })
        .collect())
}

async fn clear_election_flag(database: &DatabaseConnection, council: council::Model) -> Result<()> {
    let mut council = council.into_active_model();
    council.election_in_progress = Set(false);
    council.updated_at = Set(fixed_now());
    council
        .update(database)
        .await
        .context("Failed to clear election flag")?;
    Ok(())
}

/// Posts a result to the guild's configured channel. Elections prefer the
/// announcement channel, proposals the voting channel. A guild with
/// neither configured is skipped with a warning; the status flip still
/// proceeds.
async fn post_result(
    gateway: &GatewayClient,
    guild: &guild::Model,
    prefer_announcement: bool,
    announcement: &Announcement,
) -> Result<()> {
    let channel = if prefer_announcement {
        guild
            .announcement_channel_id
            .as_ref()
            .or(guild.voting_channel_id.as_ref())
    } else {
        guild
            .voting_channel_id
            .as_ref()
            .or(guild.announcement_channel_id.as_ref())
    };

    let Some(channel_id) = channel else {
        warn!(
            "Guild {} has no result channel configured; skipping announcement",
            guild.guild_id
        );
        return Ok(());
    };

    gateway
        .post_announcement(channel_id, None, announcement)
        .await?;
    Ok(())
}

/// Passed iff the yes share strictly exceeds the threshold; a voting
/// with no ballots fails.
fn proposal_disposition(tally: StanceTally, required_percentage: f64) -> VotingStatus {
    if tally.passes(required_percentage) {
        VotingStatus::Passed
    } else {
        VotingStatus::Failed
    }
}

/// An election with no seated winner fails.
fn election_disposition(winner_count: usize) -> VotingStatus {
    if winner_count == 0 {
        VotingStatus::Failed
    } else {
        VotingStatus::Passed
    }
}

/// The commit point: flips the status exactly once. The transition table
/// rejects a second flip, so a re-run can never overwrite a terminal state.
async fn commit_status(
    database: &DatabaseConnection,
    record: voting::Model,
    next: VotingStatus,
) -> Result<()> {
    let current = VotingStatus::parse(&record.status)?;
    if !current.can_transition(next) {
        return Err(anyhow!(
            "Illegal voting transition {} -> {}",
            current.as_str(),
            next.as_str()
        ));
    }

    let mut active = record.into_active_model();
    active.status = Set(next.as_str().to_string());
    active.result_announced = Set(true);
    active.updated_at = Set(fixed_now());
    active
        .update(database)
        .await
        .context("Failed to commit voting status")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_of_three_passes_at_half() {
        let tally = StanceTally { yes: 2, no: 1 };
        assert_eq!(proposal_disposition(tally, 0.5), VotingStatus::Passed);
    }

    #[test]
    fn exactly_half_fails() {
        let tally = StanceTally { yes: 1, no: 1 };
        assert_eq!(proposal_disposition(tally, 0.5), VotingStatus::Failed);
    }

    #[test]
    fn no_ballots_fails_even_at_zero_threshold() {
        let tally = StanceTally { yes: 0, no: 0 };
        assert_eq!(proposal_disposition(tally, 0.0), VotingStatus::Failed);
    }

    #[test]
    fn elections_fail_without_winners() {
        assert_eq!(election_disposition(0), VotingStatus::Failed);
        assert_eq!(election_disposition(3), VotingStatus::Passed);
    }
}
