pub mod audit_log;
pub mod council;
pub mod councillor;
pub mod election_candidate;
pub mod guild;
pub mod ministry;
pub mod prelude;
pub mod registered_voter;
pub mod vote;
pub mod voting;
