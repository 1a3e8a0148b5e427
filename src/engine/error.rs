use derive_more::{Display, From};

use crate::db::{subticket, ticket};

use super::Permission;

/// Why a lifecycle operation was refused. All variants are recoverable and
/// meant to be shown to the operator.
#[derive(Clone, Debug, Display, Eq, From, PartialEq)]
pub enum Error {
    /// Target state equals the current one.
    #[display("nothing to change")]
    NoChange,

    #[display("putting a ticket on hold requires a reason")]
    MissingReason,

    /// Solved requested while this many subtickets are still pending.
    #[display("{_0} subticket(s) must be closed before solving the ticket")]
    OpenSubtickets(usize),

    #[display("{_0}")]
    #[from]
    Validation(ValidationError),

    #[display("missing permission `{_0}`")]
    Forbidden(Permission),

    #[display("ticket {_0} not found")]
    TicketNotFound(ticket::Id),

    #[display("subticket {_0} not found")]
    SubticketNotFound(subticket::Id),

    #[display("ticket is archived")]
    Archived,

    /// The parent ticket is solved, so no subticket may become pending.
    #[display("ticket is solved")]
    TicketSolved,

    #[display("subticket is already closed")]
    SubticketClosed,

    #[display("no pending subtickets to close")]
    NoPendingSubtickets,
}

impl std::error::Error for Error {}

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum ValidationError {
    #[display("timestamp is in the future")]
    FutureTimestamp,

    /// Timestamp precedes something already recorded on the ticket.
    #[display("timestamp precedes the ticket's recorded history")]
    OutOfOrder,

    #[display("event end precedes event start")]
    EndBeforeStart,

    #[display("`{_0}` is required")]
    MissingField(&'static str),

    #[display("`{_0}` must not be negative")]
    Negative(&'static str),
}

impl std::error::Error for ValidationError {}
