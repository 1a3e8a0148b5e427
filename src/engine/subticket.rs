use time::OffsetDateTime;

use crate::db::{
    subticket::{self, Closure, Subticket},
    ticket, user,
};

use super::{Error, ValidationError};

/// Closure data entered by the operator.
#[derive(Clone, Debug, PartialEq)]
pub struct Closing {
    pub event_end_date: OffsetDateTime,
    pub root_cause: String,
    pub bad_praxis: Option<bool>,
    pub solution: String,
    pub status_post_sla: Option<String>,
    pub comment: Option<String>,
    pub event_responsible: String,
}

/// Closes a pending subticket, recording `advisor` as the closing operator.
pub fn close_subticket(
    subticket: &Subticket,
    closing: &Closing,
    advisor: user::Id,
    now: OffsetDateTime,
) -> Result<Subticket, Error> {
    if subticket.status() == subticket::Status::Closed {
        return Err(Error::SubticketClosed);
    }

    let root_cause = required("rootCause", &closing.root_cause)?;
    let solution = required("solution", &closing.solution)?;
    let event_responsible =
        required("eventResponsible", &closing.event_responsible)?;

    if closing.event_end_date < subticket.event_start_date {
        return Err(ValidationError::EndBeforeStart.into());
    }
    if closing.event_end_date > now {
        return Err(ValidationError::FutureTimestamp.into());
    }

    Ok(Subticket {
        closure: Some(Closure {
            closing_advisor: advisor,
            event_end_date: closing.event_end_date,
            root_cause,
            bad_praxis: closing.bad_praxis,
            solution,
            status_post_sla: optional(closing.status_post_sla.as_deref()),
            comment: optional(closing.comment.as_deref()),
            event_responsible,
        }),
        ..subticket.clone()
    })
}

/// Returns `subticket` pending again with every closure field cleared,
/// whatever it held before.
pub fn reopen_subticket(subticket: &Subticket) -> Subticket {
    Subticket {
        closure: None,
        ..subticket.clone()
    }
}

/// Checks operator-entered ticket data before the repository stores it.
pub fn admit_ticket(
    new: &ticket::New,
    now: OffsetDateTime,
) -> Result<(), Error> {
    required("reportedBy", &new.reported_by)?;
    required("node", &new.node)?;
    required("olt", &new.olt)?;
    if new.creation_date > now {
        return Err(ValidationError::FutureTimestamp.into());
    }
    Ok(())
}

/// Checks operator-entered subticket data against its parent ticket.
pub fn admit_subticket(
    new: &subticket::New,
    parent: &ticket::Ticket,
    now: OffsetDateTime,
) -> Result<(), Error> {
    if parent.archived {
        return Err(Error::Archived);
    }
    if parent.status == ticket::Status::Solved {
        return Err(Error::TicketSolved);
    }
    required("cto", &new.cto)?;
    for (field, value) in [
        ("card", i32::from(new.card)),
        ("port", i32::from(new.port)),
        ("clientCount", new.client_count),
    ] {
        if value < 0 {
            return Err(ValidationError::Negative(field).into());
        }
    }
    if new.event_start_date > now || new.reported_to_pext_date > now {
        return Err(ValidationError::FutureTimestamp.into());
    }
    Ok(())
}

pub(super) fn required(
    field: &'static str,
    value: &str,
) -> Result<String, Error> {
    match value.trim() {
        "" => Err(ValidationError::MissingField(field).into()),
        value => Ok(value.to_owned()),
    }
}

fn optional(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_owned)
}
