//! Core of the Councillor governance bot: the data model, command
//! operations, and the scheduled voting resolution job. The Discord
//! interaction frontend links this crate and calls into [`ops`]; the
//! `councillord` binary runs the resolution daemon.

pub mod config;
pub mod entities;
pub mod gateway;
pub mod governance;
pub mod models;
pub mod ops;
pub mod resolver;
pub mod schedule;
pub mod state;
pub mod tally;
