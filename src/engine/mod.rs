//! Ticket lifecycle rules.
//!
//! Everything here is synchronous and side-effect free: operations take the
//! current records plus the current time and either refuse with an [`Error`]
//! or return new records. Persisting them is left to [`crate::runner`].

mod edit;
mod error;
mod gate;
mod permission;
mod state;
mod subticket;
mod transition;

pub use self::{
    edit::{edit_subticket, edit_ticket, SubticketDetails, TicketDetails},
    error::{Error, ValidationError},
    gate::{can_close, close_ticket},
    permission::{authorize, Operator, Permission},
    state::{BatchItem, Command, Effect, Reduced, State},
    subticket::{
        admit_subticket, admit_ticket, close_subticket, reopen_subticket,
        Closing,
    },
    transition::{compute_transition, ChangeStatus, Transition},
};
