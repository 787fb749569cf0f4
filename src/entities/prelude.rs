#![allow(unused_imports)]

pub use super::audit_log::Entity as AuditLog;
pub use super::council::Entity as Council;
pub use super::councillor::Entity as Councillor;
pub use super::election_candidate::Entity as ElectionCandidate;
pub use super::guild::Entity as Guild;
pub use super::ministry::Entity as Ministry;
pub use super::registered_voter::Entity as RegisteredVoter;
pub use super::vote::Entity as Vote;
pub use super::voting::Entity as Voting;
