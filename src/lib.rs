//! Outage ticket tracking: tickets, subtickets and their lifecycle rules.
//!
//! [`engine`] holds the pure state machine, [`db`] the persistence
//! collaborator, [`server`] the HTTP surface tying both together.

pub mod api;
pub mod config;
pub mod db;
pub mod engine;
pub mod runner;
pub mod server;

pub use self::config::Config;
