//! JSON shapes exchanged over HTTP.

pub mod log;
pub mod subticket;
pub mod ticket;
pub mod user;

pub use self::{
    log::ActionLog, subticket::Subticket, ticket::Ticket, user::User,
};
