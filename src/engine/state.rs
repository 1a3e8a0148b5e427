use std::collections::BTreeMap;

use time::OffsetDateTime;

use crate::db::{
    log,
    subticket::{self, Subticket},
    ticket::{self, Status},
    Ticket,
};

use super::{
    close_subticket, close_ticket, compute_transition, edit_subticket,
    edit_ticket, reopen_subticket, ChangeStatus, Closing, Error, Operator,
    Permission, SubticketDetails, TicketDetails,
};

/// Mutation requested by an operator.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    ChangeStatus {
        ticket: ticket::Id,
        change: ChangeStatus,
    },
    CloseSubticket {
        subticket: subticket::Id,
        closing: Closing,
    },
    ReopenSubticket {
        subticket: subticket::Id,
    },
    EditTicket {
        ticket: ticket::Id,
        details: TicketDetails,
    },
    EditSubticket {
        subticket: subticket::Id,
        details: SubticketDetails,
    },
    Archive {
        ticket: ticket::Id,
    },
    Restore {
        ticket: ticket::Id,
    },
}

impl Command {
    /// Capability the operator must hold to issue this command.
    pub fn permission(&self) -> Permission {
        match self {
            Self::ChangeStatus { .. }
            | Self::CloseSubticket { .. }
            | Self::ReopenSubticket { .. }
            | Self::EditTicket { .. }
            | Self::EditSubticket { .. } => Permission::TicketEdit,
            Self::Archive { .. } => Permission::TicketDelete,
            Self::Restore { .. } => Permission::ArchivedEdit,
        }
    }
}

/// Write the persistence collaborator has to perform.
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    WriteTicket(Ticket),
    WriteSubticket(Subticket),
    Log(log::Entry),
}

/// Outcome of a successful dispatch: the state after the command and the
/// effects that make it durable.
#[derive(Clone, Debug)]
pub struct Reduced {
    pub state: State,
    pub effects: Vec<Effect>,
}

/// One pending subticket of a batch close, reduced independently.
#[derive(Debug)]
pub struct BatchItem {
    pub subticket: subticket::Id,
    pub code: String,
    pub reduced: Result<Reduced, Error>,
}

/// Tickets and subtickets known to the caller, keyed by id.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct State {
    tickets: BTreeMap<ticket::Id, Ticket>,
    subtickets: BTreeMap<subticket::Id, Subticket>,
}

impl State {
    pub fn new(
        tickets: impl IntoIterator<Item = Ticket>,
        subtickets: impl IntoIterator<Item = Subticket>,
    ) -> Self {
        Self {
            tickets: tickets.into_iter().map(|t| (t.id, t)).collect(),
            subtickets: subtickets.into_iter().map(|s| (s.id, s)).collect(),
        }
    }

    pub fn ticket(&self, id: ticket::Id) -> Result<&Ticket, Error> {
        self.tickets.get(&id).ok_or(Error::TicketNotFound(id))
    }

    pub fn subticket(&self, id: subticket::Id) -> Result<&Subticket, Error> {
        self.subtickets.get(&id).ok_or(Error::SubticketNotFound(id))
    }

    pub fn subtickets_of(
        &self,
        ticket_id: ticket::Id,
    ) -> impl Iterator<Item = &Subticket> {
        self.subtickets
            .values()
            .filter(move |s| s.ticket_id == ticket_id)
    }

    /// Replaces the ticket with the same id, or adds it.
    pub fn merge_ticket(&mut self, ticket: Ticket) {
        self.tickets.insert(ticket.id, ticket);
    }

    /// Replaces the subticket with the same id, or adds it.
    pub fn merge_subticket(&mut self, subticket: Subticket) {
        self.subtickets.insert(subticket.id, subticket);
    }

    /// Applies `command` on behalf of `operator` without touching `self`.
    pub fn dispatch<O: Operator + ?Sized>(
        &self,
        operator: &O,
        command: Command,
        now: OffsetDateTime,
    ) -> Result<Reduced, Error> {
        super::authorize(operator, command.permission())?;

        let mut next = self.clone();
        let mut effects = Vec::with_capacity(2);
        let (ticket, action) = match command {
            Command::ChangeStatus { ticket, change } => {
                let current = self.ticket(ticket)?;
                if current.archived {
                    return Err(Error::Archived);
                }
                let transition = match change.status {
                    Status::Solved => close_ticket(
                        current,
                        self.subtickets_of(ticket),
                        change.at,
                        now,
                    )?,
                    _ => compute_transition(current, &change, now)?,
                };
                let updated = transition.apply(current);

                let action = match change.status {
                    Status::OnHold => format!(
                        "Status changed to {} (reason: {})",
                        change.status,
                        updated
                            .pause_history
                            .open_segment()
                            .map(|p| p.reason.as_str())
                            .unwrap_or_default(),
                    ),
                    Status::Solved => "Ticket marked as solved.".to_owned(),
                    _ => format!("Status changed to {}", change.status),
                };
                effects.push(Effect::WriteTicket(updated.clone()));
                next.merge_ticket(updated.clone());
                (updated, action)
            }
            Command::CloseSubticket { subticket, closing } => {
                let current = self.subticket(subticket)?;
                let parent = self.ticket(current.ticket_id)?;
                if parent.archived {
                    return Err(Error::Archived);
                }
                let closed =
                    close_subticket(current, &closing, operator.id(), now)?;

                let action = format!("Subticket {} closed.", closed.code);
                effects.push(Effect::WriteSubticket(closed.clone()));
                next.merge_subticket(closed);
                (parent.clone(), action)
            }
            Command::ReopenSubticket { subticket } => {
                let current = self.subticket(subticket)?;
                let parent = self.ticket(current.ticket_id)?;
                if parent.archived {
                    return Err(Error::Archived);
                }
                if parent.status == Status::Solved {
                    return Err(Error::TicketSolved);
                }
                let reopened = reopen_subticket(current);

                let action = format!("Subticket {} reopened.", reopened.code);
                effects.push(Effect::WriteSubticket(reopened.clone()));
                next.merge_subticket(reopened);
                (parent.clone(), action)
            }
            Command::EditTicket { ticket, details } => {
                let current = self.ticket(ticket)?;
                if current.archived {
                    return Err(Error::Archived);
                }
                let edited = edit_ticket(current, &details)?;

                effects.push(Effect::WriteTicket(edited.clone()));
                next.merge_ticket(edited.clone());
                (edited, "Ticket details updated.".to_owned())
            }
            Command::EditSubticket { subticket, details } => {
                let current = self.subticket(subticket)?;
                let parent = self.ticket(current.ticket_id)?;
                if parent.archived {
                    return Err(Error::Archived);
                }
                let edited = edit_subticket(current, &details)?;

                let action = format!("Subticket {} updated.", edited.code);
                effects.push(Effect::WriteSubticket(edited.clone()));
                next.merge_subticket(edited);
                (parent.clone(), action)
            }
            Command::Archive { ticket } => {
                let current = self.ticket(ticket)?;
                if current.archived {
                    return Err(Error::NoChange);
                }
                let archived = Ticket {
                    archived: true,
                    ..current.clone()
                };

                effects.push(Effect::WriteTicket(archived.clone()));
                next.merge_ticket(archived.clone());
                (archived, "Ticket archived.".to_owned())
            }
            Command::Restore { ticket } => {
                let current = self.ticket(ticket)?;
                if !current.archived {
                    return Err(Error::NoChange);
                }
                let restored = Ticket {
                    archived: false,
                    ..current.clone()
                };

                effects.push(Effect::WriteTicket(restored.clone()));
                next.merge_ticket(restored.clone());
                (restored, "Ticket restored.".to_owned())
            }
        };

        effects.push(Effect::Log(log::Entry {
            ticket_id: ticket.id,
            ticket_code: ticket.code,
            action,
            user: operator.name().to_owned(),
            timestamp: now,
        }));

        Ok(Reduced {
            state: next,
            effects,
        })
    }

    /// Reduces a close of every pending subticket of `ticket_id`, each item
    /// independently of the others. Items come in event start order.
    pub fn plan_close_all<O: Operator + ?Sized>(
        &self,
        operator: &O,
        ticket_id: ticket::Id,
        closing: &Closing,
        now: OffsetDateTime,
    ) -> Result<Vec<BatchItem>, Error> {
        super::authorize(operator, Permission::TicketEdit)?;

        let ticket = self.ticket(ticket_id)?;
        if ticket.archived {
            return Err(Error::Archived);
        }

        let mut pending = self
            .subtickets_of(ticket_id)
            .filter(|s| s.status() == subticket::Status::Pending)
            .collect::<Vec<_>>();
        pending.sort_by(|a, b| {
            (a.event_start_date, a.code.len(), &a.code).cmp(&(
                b.event_start_date,
                b.code.len(),
                &b.code,
            ))
        });

        let items = pending
            .into_iter()
            .map(|s| BatchItem {
                subticket: s.id,
                code: s.code.clone(),
                reduced: self.dispatch(
                    operator,
                    Command::CloseSubticket {
                        subticket: s.id,
                        closing: closing.clone(),
                    },
                    now,
                ),
            })
            .collect::<Vec<_>>();

        if items.is_empty() {
            return Err(Error::NoPendingSubtickets);
        }
        Ok(items)
    }
}
